//! Selection and expansion state of the navigation panel

use serde::Serialize;
use std::collections::BTreeMap;

use super::{node_ids, NavNode, COMPANIES_ID, HOME_ID};

/// Selected node plus per-node expansion flags. The two are independent;
/// `reconcile` keeps both pointing at nodes that still exist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NavState {
    selected: String,
    expanded: BTreeMap<String, bool>,
}

impl Default for NavState {
    fn default() -> Self {
        Self {
            selected: HOME_ID.to_string(),
            expanded: BTreeMap::new(),
        }
    }
}

impl NavState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selected(&self) -> &str {
        &self.selected
    }

    pub fn select(&mut self, id: impl Into<String>) {
        self.selected = id.into();
    }

    pub fn is_expanded(&self, id: &str) -> bool {
        self.expanded.get(id).copied().unwrap_or(false)
    }

    pub fn expand(&mut self, id: &str) {
        self.expanded.insert(id.to_string(), true);
    }

    pub fn collapse(&mut self, id: &str) {
        self.expanded.insert(id.to_string(), false);
    }

    pub fn toggle(&mut self, id: &str) {
        let next = !self.is_expanded(id);
        self.expanded.insert(id.to_string(), next);
    }

    /// Select a freshly created or edited node and open the path to it
    pub fn highlight(&mut self, id: &str) {
        self.expand(COMPANIES_ID);
        if id.starts_with("c-") {
            self.expand(id);
        }
        self.select(id);
    }

    /// Align the state with a rebuilt tree. A selection that disappeared
    /// falls back to home; expansion flags for missing nodes are dropped.
    pub fn reconcile(&mut self, tree: &[NavNode]) {
        let ids = node_ids(tree);
        if !ids.iter().any(|id| *id == self.selected) {
            tracing::debug!(selected = %self.selected, "Selected node no longer visible");
            self.selected = HOME_ID.to_string();
        }
        self.expanded.retain(|id, _| ids.contains(id));
    }
}
