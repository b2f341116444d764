//! SatelliteFilterNode — ephemeris filtering node.
//!
//! Filters broadcast messages by constellation or satellite. When both lists
//! are empty, all records pass through (passthrough mode). Otherwise only
//! records matching either list pass (or those matching neither, if inverted).

use crate::gnss::{Constellation, SatId};
use crate::pipeline::error::{PipelineError, PipelineResult};
use crate::pipeline::node::{NodeAction, NodeContext, NodeStats};
use crate::pipeline::params::NodeParams;
use crate::pipeline::pin::{PinKind, PinValue};
use crate::pipeline::port::PortDescriptor;
use std::collections::HashSet;

static PORTS: &[PortDescriptor] = &[
    PortDescriptor::input("Ephemeris", PinKind::Ephemeris),
    PortDescriptor::output("Ephemeris", PinKind::Ephemeris),
];

/// Filter node — passes ephemerides of selected satellites.
pub struct SatelliteFilterNode {
    constellations: HashSet<Constellation>,
    satellites: HashSet<SatId>,
    /// If true, block listed satellites instead of allowing them.
    invert: bool,
    passed: u64,
    dropped: u64,
}

impl SatelliteFilterNode {
    pub fn new() -> Self {
        Self {
            constellations: HashSet::new(),
            satellites: HashSet::new(),
            invert: false,
            passed: 0,
            dropped: 0,
        }
    }

    /// Build from description parameters.
    ///
    /// `constellations` is a comma-separated list of RINEX system letters
    /// (`"G,E"`), `satellites` a comma-separated list of ids (`"G01,R24"`).
    pub fn from_params(params: &NodeParams) -> PipelineResult<Self> {
        const TYPE: &str = "SatelliteFilter";
        params.expect_only(TYPE, &["constellations", "satellites", "invert"])?;
        let mut node = Self::new();
        if let Some(list) = params.str_or(TYPE, "constellations", None)? {
            let parsed = Constellation::parse_list(list).map_err(|e| {
                PipelineError::MalformedGraph(format!("{} constellations: {}", TYPE, e))
            })?;
            node.constellations.extend(parsed);
        }
        if let Some(list) = params.str_or(TYPE, "satellites", None)? {
            for part in list.split(',').map(str::trim).filter(|p| !p.is_empty()) {
                let sat = part.parse::<SatId>().map_err(|e| {
                    PipelineError::MalformedGraph(format!("{} satellites: {}", TYPE, e))
                })?;
                node.satellites.insert(sat);
            }
        }
        node.invert = params.bool_or(TYPE, "invert", false)?;
        Ok(node)
    }

    pub fn with_constellations(mut self, list: impl IntoIterator<Item = Constellation>) -> Self {
        self.constellations.extend(list);
        self
    }

    pub fn with_satellites(mut self, list: impl IntoIterator<Item = SatId>) -> Self {
        self.satellites.extend(list);
        self
    }

    pub fn inverted(mut self, invert: bool) -> Self {
        self.invert = invert;
        self
    }

    pub fn name(&self) -> &str {
        "SatelliteFilter"
    }

    pub fn ports(&self) -> &[PortDescriptor] {
        PORTS
    }

    pub fn on_activate(&mut self, _ctx: &mut NodeContext) -> PipelineResult<()> {
        Ok(())
    }

    /// Check if in passthrough mode (no filtering).
    pub fn is_passthrough(&self) -> bool {
        self.constellations.is_empty() && self.satellites.is_empty()
    }

    /// Whether a record of `sat` passes the filter.
    pub fn accepts(&self, sat: SatId) -> bool {
        if self.is_passthrough() {
            return true;
        }
        let listed =
            self.constellations.contains(&sat.constellation) || self.satellites.contains(&sat);
        // Pass if: (listed AND !invert) OR (!listed AND invert)
        listed != self.invert
    }

    pub fn on_input_updated(&mut self, _port: usize, ctx: &mut NodeContext) -> NodeAction {
        let Some(ephemeris) = ctx.input(0).and_then(PinValue::as_ephemeris).cloned() else {
            return NodeAction::NoOutputYet;
        };
        if self.accepts(ephemeris.sat) {
            self.passed += 1;
            ctx.write(0, PinValue::Ephemeris(ephemeris));
            NodeAction::Produced
        } else {
            self.dropped += 1;
            NodeAction::NoOutputYet
        }
    }

    /// Records dropped by the filter.
    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    pub fn stats(&self) -> NodeStats {
        NodeStats {
            records: self.passed,
            warnings: Vec::new(),
        }
    }
}

impl Default for SatelliteFilterNode {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn sat(s: &str) -> SatId {
        s.parse().unwrap()
    }

    #[test]
    fn test_passthrough_by_default() {
        let node = SatelliteFilterNode::new();
        assert!(node.is_passthrough());
        assert!(node.accepts(sat("G01")));
        assert!(node.accepts(sat("S20")));
    }

    #[test]
    fn test_constellation_and_satellite_lists() {
        let params = NodeParams::new()
            .with("constellations", "E".into())
            .with("satellites", "G05, R24".into());
        let node = SatelliteFilterNode::from_params(&params).unwrap();
        assert!(node.accepts(sat("E11")));
        assert!(node.accepts(sat("G05")));
        assert!(node.accepts(sat("R24")));
        assert!(!node.accepts(sat("G01")));
    }

    #[test]
    fn test_bad_satellite_is_malformed() {
        let params = NodeParams::new().with("satellites", "X99".into());
        assert!(matches!(
            SatelliteFilterNode::from_params(&params),
            Err(PipelineError::MalformedGraph(_))
        ));
    }

    #[test]
    fn test_reaction_counts_passed_and_dropped() {
        use crate::gnss::{Ephemeris, EphemerisData, Epoch, SbasEphemeris, TimeSystem};
        use crate::pipeline::id::{NodeId, PinId};
        use crate::pipeline::pin::{InputPin, OutputPin};
        use std::sync::Arc;

        let mut node = SatelliteFilterNode::new().with_constellations([Constellation::Sbas]);
        let mut inputs = vec![InputPin::new(PinId(1), "Ephemeris", PinKind::Ephemeris)];
        let mut outputs = vec![OutputPin::new(PinId(2), "Ephemeris", PinKind::Ephemeris)];

        for id in ["S20", "G01", "S36"] {
            let time = chrono::NaiveDate::from_ymd_opt(2022, 6, 1)
                .unwrap()
                .and_hms_opt(12, 0, 0)
                .unwrap();
            inputs[0].set(PinValue::Ephemeris(Arc::new(Ephemeris {
                sat: sat(id),
                toc: Epoch::new(time, TimeSystem::Gpst),
                data: EphemerisData::Sbas(SbasEphemeris::default()),
            })));
            let mut ctx = NodeContext {
                node: NodeId(0),
                handle: "filter",
                inputs: &inputs,
                outputs: &mut outputs,
            };
            node.on_input_updated(0, &mut ctx);
        }

        assert_eq!(node.stats().records, 2);
        assert_eq!(node.dropped(), 1);
        assert_eq!(outputs[0].write_count(), 2);
        let last = outputs[0].value().and_then(PinValue::as_ephemeris).unwrap();
        assert_eq!(last.sat, sat("S36"));
    }

    proptest! {
        #[test]
        fn test_invert_is_complement(prn in 1u16..40, listed in 1u16..40) {
            let gps = |p| SatId::new(Constellation::Gps, p);
            let normal = SatelliteFilterNode::new().with_satellites([gps(listed)]);
            let inverted = SatelliteFilterNode::new()
                .with_satellites([gps(listed)])
                .inverted(true);

            // Property: exactly one of the two filters accepts any record
            prop_assert_ne!(normal.accepts(gps(prn)), inverted.accepts(gps(prn)));
        }
    }
}
