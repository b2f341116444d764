//! Test data builders for graph descriptions

use navflow::pipeline::{
    ConfigValue, GraphDescription, LinkDescription, NodeDescription, NodeParams, PinId,
};

/// Builder for creating graph descriptions in code
#[derive(Default)]
pub struct FlowBuilder {
    description: GraphDescription,
}

impl FlowBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            description: GraphDescription {
                name: Some(name.to_string()),
                ..Default::default()
            },
        }
    }

    /// Add a `RinexNavFile` source with explicit output pins.
    pub fn source(self, id: &str, path: &str, outputs: [u32; 2]) -> Self {
        let params = NodeParams::new().with("path", ConfigValue::from(path));
        self.node(id, "RinexNavFile", params, &[], &outputs)
    }

    pub fn node(
        mut self,
        id: &str,
        node_type: &str,
        params: NodeParams,
        inputs: &[u32],
        outputs: &[u32],
    ) -> Self {
        let pins = |list: &[u32]| -> Option<Vec<PinId>> {
            (!list.is_empty()).then(|| list.iter().copied().map(PinId).collect())
        };
        self.description.nodes.push(NodeDescription {
            id: id.to_string(),
            node_type: node_type.to_string(),
            label: None,
            params,
            inputs: pins(inputs),
            outputs: pins(outputs),
        });
        self
    }

    pub fn link(mut self, from: u32, to: u32) -> Self {
        self.description.links.push(LinkDescription {
            from: PinId(from),
            to: PinId(to),
        });
        self
    }

    pub fn build(self) -> GraphDescription {
        self.description
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flow_builder() {
        let description = FlowBuilder::new("test")
            .source("gps", "gps.rnx", [1, 2])
            .node("out", "EphemerisCollector", NodeParams::new(), &[3], &[])
            .link(2, 3)
            .build();

        assert_eq!(description.name.as_deref(), Some("test"));
        assert_eq!(description.nodes.len(), 2);
        assert_eq!(description.nodes[0].outputs, Some(vec![PinId(1), PinId(2)]));
        assert_eq!(description.nodes[1].outputs, None);
        assert_eq!(description.links[0].to, PinId(3));
    }
}
