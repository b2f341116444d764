//! EphemerisCollectorNode — aggregates a record stream into a store.

use crate::gnss::SharedNavInfo;
use crate::pipeline::error::PipelineResult;
use crate::pipeline::node::{NodeAction, NodeContext, NodeStats};
use crate::pipeline::pin::{PinKind, PinValue};
use crate::pipeline::port::PortDescriptor;

static PORTS: &[PortDescriptor] = &[
    PortDescriptor::input("Ephemeris", PinKind::Ephemeris),
    PortDescriptor::output("GnssNavInfo", PinKind::NavInfo),
];

/// Collects every incoming ephemeris into its own store.
pub struct EphemerisCollectorNode {
    store: SharedNavInfo,
    collected: u64,
}

impl EphemerisCollectorNode {
    pub fn new() -> Self {
        Self {
            store: SharedNavInfo::default(),
            collected: 0,
        }
    }

    pub fn name(&self) -> &str {
        "EphemerisCollector"
    }

    pub fn ports(&self) -> &[PortDescriptor] {
        PORTS
    }

    pub fn store(&self) -> &SharedNavInfo {
        &self.store
    }

    pub fn on_activate(&mut self, ctx: &mut NodeContext) -> PipelineResult<()> {
        ctx.write(0, PinValue::NavInfo(self.store.clone()));
        Ok(())
    }

    pub fn on_input_updated(&mut self, _port: usize, ctx: &mut NodeContext) -> NodeAction {
        let Some(ephemeris) = ctx.input(0).and_then(PinValue::as_ephemeris) else {
            return NodeAction::NoOutputYet;
        };
        self.store.write().insert(ephemeris.as_ref().clone());
        self.collected += 1;
        ctx.write(0, PinValue::NavInfo(self.store.clone()));
        NodeAction::Produced
    }

    pub fn stats(&self) -> NodeStats {
        NodeStats {
            records: self.collected,
            warnings: Vec::new(),
        }
    }
}

impl Default for EphemerisCollectorNode {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gnss::{
        Constellation, Ephemeris, EphemerisData, Epoch, SatId, SbasEphemeris, TimeSystem,
    };
    use crate::pipeline::id::{NodeId, PinId};
    use crate::pipeline::pin::{InputPin, OutputPin};
    use std::sync::Arc;

    #[test]
    fn test_collects_in_arrival_order() {
        let mut node = EphemerisCollectorNode::new();
        let mut inputs = vec![InputPin::new(PinId(1), "Ephemeris", PinKind::Ephemeris)];
        let mut outputs = vec![OutputPin::new(PinId(2), "GnssNavInfo", PinKind::NavInfo)];
        let sat = SatId::new(Constellation::Sbas, 23);

        for minute in [4, 0, 2] {
            let time = chrono::NaiveDate::from_ymd_opt(2022, 6, 1)
                .unwrap()
                .and_hms_opt(12, minute, 0)
                .unwrap();
            inputs[0].set(PinValue::Ephemeris(Arc::new(Ephemeris {
                sat,
                toc: Epoch::new(time, TimeSystem::Gpst),
                data: EphemerisData::Sbas(SbasEphemeris::default()),
            })));
            let mut ctx = NodeContext {
                node: NodeId(0),
                handle: "collect",
                inputs: &inputs,
                outputs: &mut outputs,
            };
            assert_eq!(node.on_input_updated(0, &mut ctx), NodeAction::Produced);
        }

        let store = node.store().read();
        let minutes: Vec<u32> = store
            .ephemerides(sat)
            .iter()
            .map(|e| chrono::Timelike::minute(&e.toc.time))
            .collect();
        assert_eq!(minutes, vec![4, 0, 2]);
        assert_eq!(node.stats().records, 3);
        let published = outputs[0].value().and_then(PinValue::as_nav_info).unwrap();
        assert!(published.ptr_eq(node.store()));
    }
}
