//! Node scope filters
//!
//! A filter is a pure predicate over normalized nodes. Each dimension is
//! match-any and case-insensitive; an empty dimension matches everything.

use std::collections::BTreeSet;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::node::Node;

/// Restricts which nodes take part in a planning run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct NodeFilter {
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub states: BTreeSet<String>,

    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub districts: BTreeSet<String>,

    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub types: BTreeSet<String>,

    /// Matches either the node code or the node identity
    #[serde(default, alias = "nodeIds", skip_serializing_if = "BTreeSet::is_empty")]
    pub node_ids: BTreeSet<String>,

    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub regions: BTreeSet<String>,
}

impl NodeFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse the loose `filters` object of a request payload.
    ///
    /// Each key may hold a scalar or a list. Values are trimmed and
    /// lowercased; blanks are dropped. Anything that is not an object
    /// yields an empty filter.
    pub fn from_value(raw: &Value) -> Self {
        let Some(map) = raw.as_object() else {
            return Self::default();
        };
        let read = |key: &str| -> BTreeSet<String> {
            match map.get(key) {
                Some(Value::Array(items)) => items.iter().filter_map(normalize).collect(),
                Some(other) => normalize(other).into_iter().collect(),
                None => BTreeSet::new(),
            }
        };

        let mut node_ids = read("node_ids");
        node_ids.extend(read("nodeIds"));

        Self {
            states: read("states"),
            districts: read("districts"),
            types: read("types"),
            node_ids,
            regions: read("regions"),
        }
    }

    pub fn with_states<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.states.extend(lowercase_all(values));
        self
    }

    pub fn with_districts<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.districts.extend(lowercase_all(values));
        self
    }

    pub fn with_types<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.types.extend(lowercase_all(values));
        self
    }

    pub fn with_node_ids<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.node_ids.extend(lowercase_all(values));
        self
    }

    pub fn with_regions<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.regions.extend(lowercase_all(values));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
            && self.districts.is_empty()
            && self.types.is_empty()
            && self.node_ids.is_empty()
            && self.regions.is_empty()
    }

    /// Check whether a node is in scope.
    pub fn matches(&self, node: &Node) -> bool {
        if !dimension_matches(&self.states, node.state.as_deref()) {
            return false;
        }
        if !dimension_matches(&self.districts, node.district.as_deref()) {
            return false;
        }
        if !dimension_matches(&self.types, node.type_label.as_deref()) {
            return false;
        }
        if !dimension_matches(&self.regions, node.region_id.as_deref()) {
            return false;
        }
        if !self.node_ids.is_empty() {
            let by_code = node
                .code
                .as_deref()
                .is_some_and(|code| self.node_ids.contains(&code.to_lowercase()));
            let by_id = self.node_ids.contains(&node.id.as_str().to_lowercase());
            if !by_code && !by_id {
                return false;
            }
        }
        true
    }
}

fn dimension_matches(allowed: &BTreeSet<String>, value: Option<&str>) -> bool {
    allowed.is_empty() || allowed.contains(&value.unwrap_or_default().to_lowercase())
}

fn normalize(value: &Value) -> Option<String> {
    let text = match value {
        Value::String(s) => s.trim().to_lowercase(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => return None,
    };
    (!text.is_empty()).then_some(text)
}

fn lowercase_all<I, S>(values: I) -> impl Iterator<Item = String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    values
        .into_iter()
        .map(|v| v.as_ref().trim().to_lowercase())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::NodeKind;
    use serde_json::json;

    fn warehouse(id: &str, state: &str, district: &str) -> Node {
        let mut node = Node::new(id, NodeKind::Warehouse, 10_000.0);
        node.state = Some(state.to_string());
        node.district = Some(district.to_string());
        node
    }

    #[test]
    fn test_empty_filter_matches_everything() {
        let filter = NodeFilter::new();
        assert!(filter.is_empty());
        assert!(filter.matches(&warehouse("a", "Kerala", "Kochi")));
        assert!(filter.matches(&Node::new("b", NodeKind::Other, 0.0)));
    }

    #[test]
    fn test_state_filter_is_case_insensitive() {
        let filter = NodeFilter::new().with_states(["KERALA"]);
        assert!(filter.matches(&warehouse("a", "Kerala", "Kochi")));
        assert!(!filter.matches(&warehouse("b", "Goa", "Panaji")));
    }

    #[test]
    fn test_missing_label_fails_non_empty_dimension() {
        let filter = NodeFilter::new().with_districts(["kochi"]);
        assert!(!filter.matches(&Node::new("a", NodeKind::Warehouse, 1.0)));
    }

    #[test]
    fn test_dimensions_combine_with_and() {
        let filter = NodeFilter::new()
            .with_states(["kerala", "goa"])
            .with_districts(["kochi"]);
        assert!(filter.matches(&warehouse("a", "Kerala", "Kochi")));
        assert!(!filter.matches(&warehouse("b", "Goa", "Panaji")));
    }

    #[test]
    fn test_type_filter_uses_label() {
        let filter = NodeFilter::new().with_types(["farm"]);
        assert!(filter.matches(&Node::new("f", NodeKind::Farm, 5_000.0)));
        assert!(!filter.matches(&warehouse("w", "Goa", "Panaji")));
    }

    #[test]
    fn test_node_id_matches_code_or_identity() {
        let mut node = Node::new("65f0AB", NodeKind::Warehouse, 1.0);
        node.code = Some("WH-07".into());

        assert!(NodeFilter::new().with_node_ids(["wh-07"]).matches(&node));
        assert!(NodeFilter::new().with_node_ids(["65f0ab"]).matches(&node));
        assert!(!NodeFilter::new().with_node_ids(["wh-08"]).matches(&node));
    }

    #[test]
    fn test_from_value_accepts_scalars_lists_and_alias() {
        let filter = NodeFilter::from_value(&json!({
            "states": "Kerala",
            "districts": ["Kochi", "  ", null],
            "nodeIds": ["WH-1"],
            "node_ids": "wh-2",
            "ignored": ["x"],
        }));
        assert_eq!(filter.states, BTreeSet::from(["kerala".to_string()]));
        assert_eq!(filter.districts, BTreeSet::from(["kochi".to_string()]));
        assert_eq!(
            filter.node_ids,
            BTreeSet::from(["wh-1".to_string(), "wh-2".to_string()])
        );
        assert!(filter.types.is_empty());
    }

    #[test]
    fn test_from_value_non_object_is_empty() {
        assert!(NodeFilter::from_value(&json!(["kerala"])).is_empty());
        assert!(NodeFilter::from_value(&json!(null)).is_empty());
    }

    #[test]
    fn test_serializes_only_non_empty_sorted_keys() {
        let filter = NodeFilter::new().with_states(["goa", "Assam"]);
        let json = serde_json::to_value(&filter).unwrap();
        assert_eq!(json, json!({"states": ["assam", "goa"]}));
    }
}
