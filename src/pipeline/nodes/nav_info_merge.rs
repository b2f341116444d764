//! GnssNavInfoMergeNode — merges several stores into one.
//!
//! Upstream stores are append-only, so the node keeps a per-input,
//! per-satellite cursor and copies only the records it has not seen yet.
//! Header-level information (systems, corrections, leap seconds) is unioned.

use crate::gnss::{SatId, SharedNavInfo};
use crate::pipeline::error::{PipelineError, PipelineResult};
use crate::pipeline::node::{NodeAction, NodeContext, NodeStats};
use crate::pipeline::params::NodeParams;
use crate::pipeline::pin::{PinKind, PinValue};
use crate::pipeline::port::PortDescriptor;
use std::collections::HashMap;

/// Default number of inputs.
pub const DEFAULT_MERGE_INPUTS: usize = 2;

/// Upper bound on the `inputs` parameter.
const MAX_MERGE_INPUTS: i64 = 64;

/// Read position in one upstream store.
#[derive(Default)]
struct InputCursor {
    /// Store the cursor refers to; a different handle resets it
    source: Option<SharedNavInfo>,
    consumed: HashMap<SatId, usize>,
}

/// Merge node with `N` store inputs and one store output.
pub struct GnssNavInfoMergeNode {
    ports: Vec<PortDescriptor>,
    cursors: Vec<InputCursor>,
    store: SharedNavInfo,
    merged: u64,
}

impl GnssNavInfoMergeNode {
    pub fn new(inputs: usize) -> Self {
        let mut ports: Vec<PortDescriptor> = (0..inputs)
            .map(|i| PortDescriptor::numbered_input("GnssNavInfo", i, PinKind::NavInfo))
            .collect();
        ports.push(PortDescriptor::output("GnssNavInfo", PinKind::NavInfo));
        Self {
            ports,
            cursors: (0..inputs).map(|_| InputCursor::default()).collect(),
            store: SharedNavInfo::default(),
            merged: 0,
        }
    }

    pub fn from_params(params: &NodeParams) -> PipelineResult<Self> {
        const TYPE: &str = "GnssNavInfoMerge";
        params.expect_only(TYPE, &["inputs"])?;
        let inputs = params.int_or(TYPE, "inputs", DEFAULT_MERGE_INPUTS as i64)?;
        if !(1..=MAX_MERGE_INPUTS).contains(&inputs) {
            return Err(PipelineError::MalformedGraph(format!(
                "{} inputs must be between 1 and {}, got {}",
                TYPE, MAX_MERGE_INPUTS, inputs
            )));
        }
        Ok(Self::new(inputs as usize))
    }

    pub fn name(&self) -> &str {
        "GnssNavInfoMerge"
    }

    pub fn ports(&self) -> &[PortDescriptor] {
        &self.ports
    }

    pub fn input_count(&self) -> usize {
        self.cursors.len()
    }

    pub fn on_activate(&mut self, ctx: &mut NodeContext) -> PipelineResult<()> {
        ctx.write(0, PinValue::NavInfo(self.store.clone()));
        Ok(())
    }

    pub fn on_input_updated(&mut self, port: usize, ctx: &mut NodeContext) -> NodeAction {
        let Some(source) = ctx.input(port).and_then(PinValue::as_nav_info) else {
            return NodeAction::NoOutputYet;
        };
        let Some(cursor) = self.cursors.get_mut(port) else {
            return NodeAction::NoOutputYet;
        };
        if source.ptr_eq(&self.store) {
            return NodeAction::NoOutputYet;
        }
        if !cursor.source.as_ref().is_some_and(|s| s.ptr_eq(source)) {
            cursor.source = Some(source.clone());
            cursor.consumed.clear();
        }

        let appended = {
            let upstream = source.read();
            let mut merged = self.store.write();
            merged.merge_header(&upstream);
            let mut appended = 0u64;
            for (sat, records) in upstream.iter() {
                let seen = cursor.consumed.entry(*sat).or_insert(0);
                for record in records.iter().skip(*seen) {
                    merged.insert(record.clone());
                    appended += 1;
                }
                *seen = records.len();
            }
            appended
        };

        if appended == 0 {
            return NodeAction::NoOutputYet;
        }
        self.merged += appended;
        ctx.write(0, PinValue::NavInfo(self.store.clone()));
        NodeAction::Produced
    }

    pub fn stats(&self) -> NodeStats {
        NodeStats {
            records: self.merged,
            warnings: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gnss::{Constellation, Ephemeris, EphemerisData, Epoch, SbasEphemeris, TimeSystem};
    use crate::pipeline::id::{NodeId, PinId};
    use crate::pipeline::params::ConfigValue;
    use crate::pipeline::pin::{InputPin, OutputPin};
    use chrono::NaiveDate;

    fn record(prn: u16, minute: u32) -> Ephemeris {
        let time = NaiveDate::from_ymd_opt(2022, 6, 1)
            .unwrap()
            .and_hms_opt(12, minute, 0)
            .unwrap();
        Ephemeris {
            sat: SatId::new(Constellation::Sbas, prn),
            toc: Epoch::new(time, TimeSystem::Gpst),
            data: EphemerisData::Sbas(SbasEphemeris::default()),
        }
    }

    fn pins(node: &GnssNavInfoMergeNode) -> (Vec<InputPin>, Vec<OutputPin>) {
        let inputs = node
            .ports()
            .iter()
            .take(node.input_count())
            .enumerate()
            .map(|(i, port)| {
                InputPin::new(PinId(i as u32 + 1), port.name.clone(), PinKind::NavInfo)
            })
            .collect();
        let outputs = vec![OutputPin::new(PinId(99), "GnssNavInfo", PinKind::NavInfo)];
        (inputs, outputs)
    }

    fn update(
        node: &mut GnssNavInfoMergeNode,
        inputs: &[InputPin],
        outputs: &mut [OutputPin],
        port: usize,
    ) -> NodeAction {
        let mut ctx = NodeContext {
            node: NodeId(0),
            handle: "merge",
            inputs,
            outputs,
        };
        node.on_input_updated(port, &mut ctx)
    }

    #[test]
    fn test_copies_only_new_records() {
        let mut node = GnssNavInfoMergeNode::new(2);
        let (mut inputs, mut outputs) = pins(&node);
        let a = SharedNavInfo::default();
        let b = SharedNavInfo::default();
        inputs[0].set(PinValue::NavInfo(a.clone()));
        inputs[1].set(PinValue::NavInfo(b.clone()));

        a.write().insert(record(20, 0));
        a.write().leap_seconds = Some(18);
        assert_eq!(update(&mut node, &inputs, &mut outputs, 0), NodeAction::Produced);

        a.write().insert(record(20, 2));
        b.write().insert(record(23, 0));
        assert_eq!(update(&mut node, &inputs, &mut outputs, 0), NodeAction::Produced);
        assert_eq!(update(&mut node, &inputs, &mut outputs, 1), NodeAction::Produced);
        assert_eq!(update(&mut node, &inputs, &mut outputs, 1), NodeAction::NoOutputYet);

        {
            let merged = node.store.read();
            assert_eq!(merged.message_count(), 3);
            assert_eq!(merged.ephemerides(SatId::new(Constellation::Sbas, 20)).len(), 2);
            assert_eq!(merged.leap_seconds, Some(18));
        }
        assert_eq!(node.stats().records, 3);
        assert_eq!(outputs[0].write_count(), 3);
    }

    #[test]
    fn test_new_upstream_store_resets_cursor() {
        let mut node = GnssNavInfoMergeNode::new(1);
        let (mut inputs, mut outputs) = pins(&node);

        let first = SharedNavInfo::default();
        first.write().insert(record(36, 0));
        inputs[0].set(PinValue::NavInfo(first));
        update(&mut node, &inputs, &mut outputs, 0);

        let second = SharedNavInfo::default();
        second.write().insert(record(36, 4));
        inputs[0].set(PinValue::NavInfo(second));
        assert_eq!(update(&mut node, &inputs, &mut outputs, 0), NodeAction::Produced);
        assert_eq!(node.store.read().message_count(), 2);
    }

    #[test]
    fn test_inputs_param() {
        let params = NodeParams::new().with("inputs", ConfigValue::Int(3));
        let node = GnssNavInfoMergeNode::from_params(&params).unwrap();
        assert_eq!(node.input_count(), 3);
        assert_eq!(node.ports()[2].name, "GnssNavInfo2");
        assert!(GnssNavInfoMergeNode::from_params(&NodeParams::new().with("mode", "union".into()))
            .is_err());
    }
}
