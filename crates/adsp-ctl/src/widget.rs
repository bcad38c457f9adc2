use std::collections::BTreeMap;

/// Type tag of a node in the static audio-processing graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WidgetType {
    Mixer,
    /// Processing / gain stage.
    Pga,
    /// Signal generator.
    SigGen,
    /// Routing point.
    Mux,
    Dai,
}

/// Read-only view of the widget graph, populated at topology load.
pub trait WidgetGraph {
    /// Widget type of the component a control is attached to, or `None`
    /// for a standalone control with no owning widget.
    fn widget_type_for(&self, comp_id: u32) -> Option<WidgetType>;
}

/// Widget graph backed by a plain component-id map.
#[derive(Debug, Default)]
pub struct StaticWidgetGraph {
    widgets: BTreeMap<u32, WidgetType>,
}

impl StaticWidgetGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, comp_id: u32, widget_type: WidgetType) {
        self.widgets.insert(comp_id, widget_type);
    }
}

impl WidgetGraph for StaticWidgetGraph {
    fn widget_type_for(&self, comp_id: u32) -> Option<WidgetType> {
        self.widgets.get(&comp_id).copied()
    }
}

/// How a switch put treats its channels, resolved once per call from
/// the owning widget's type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SwitchPolicy {
    /// Every channel's value is independent.
    PerChannel,
    /// Channel 0 is authoritative and the switch drives the signal
    /// generator pipeline.
    Generator,
    /// Channel 0 is authoritative (routing or standalone control).
    Shared,
}

impl SwitchPolicy {
    pub(crate) fn resolve(graph: &dyn WidgetGraph, comp_id: u32) -> Self {
        match graph.widget_type_for(comp_id) {
            Some(WidgetType::Pga) => SwitchPolicy::PerChannel,
            Some(WidgetType::SigGen) => SwitchPolicy::Generator,
            _ => SwitchPolicy::Shared,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn policy_resolution_follows_widget_type() {
        let mut graph = StaticWidgetGraph::new();
        graph.insert(1, WidgetType::Pga);
        graph.insert(2, WidgetType::SigGen);
        graph.insert(3, WidgetType::Mux);

        assert_eq!(SwitchPolicy::resolve(&graph, 1), SwitchPolicy::PerChannel);
        assert_eq!(SwitchPolicy::resolve(&graph, 2), SwitchPolicy::Generator);
        assert_eq!(SwitchPolicy::resolve(&graph, 3), SwitchPolicy::Shared);
        // A standalone control with no owning widget.
        assert_eq!(SwitchPolicy::resolve(&graph, 99), SwitchPolicy::Shared);
    }
}
