//! Aspect taxonomy models

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// A node of the aspect taxonomy as authored (e.g. "air" → "inside air").
///
/// Aspects are written wholesale: replacing an aspect replaces its entire
/// subtree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Aspect {
    /// Unique identifier
    pub id: String,
    /// Human-readable name
    pub name: String,
    /// Ordered child aspects
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sub_aspects: Vec<Aspect>,
}

impl Aspect {
    /// Create a leaf aspect
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            sub_aspects: Vec::new(),
        }
    }

    /// Append a child aspect
    pub fn with_sub_aspect(mut self, aspect: Aspect) -> Self {
        self.sub_aspects.push(aspect);
        self
    }
}

/// Materialized closure record of one aspect tree node.
///
/// `ancestor_ids` runs from the root to the direct parent and is empty only
/// for roots (where `root_id == id`). `descendent_ids` holds every aspect
/// reachable through `child_ids`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AspectNode {
    /// Aspect id
    pub id: String,
    /// Aspect name
    pub name: String,
    /// Id of the tree root
    pub root_id: String,
    /// Id of the direct parent (none for roots)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    /// Direct children
    #[serde(default)]
    pub child_ids: BTreeSet<String>,
    /// Path from the root to the direct parent
    #[serde(default)]
    pub ancestor_ids: Vec<String>,
    /// All transitive children
    #[serde(default)]
    pub descendent_ids: BTreeSet<String>,
}

impl AspectNode {
    /// Node for an aspect id the index has never seen.
    ///
    /// It only relates to itself, so matching against it degrades to an
    /// exact id comparison.
    pub fn detached(id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            name: String::new(),
            root_id: id.clone(),
            id,
            ..Default::default()
        }
    }

    /// Whether this node is the root of its tree
    pub fn is_root(&self) -> bool {
        self.ancestor_ids.is_empty()
    }

    /// Whether `aspect_id` is somewhere above this node
    pub fn has_ancestor(&self, aspect_id: &str) -> bool {
        self.ancestor_ids.iter().any(|id| id == aspect_id)
    }

    /// Whether `aspect_id` is somewhere below this node
    pub fn has_descendant(&self, aspect_id: &str) -> bool {
        self.descendent_ids.contains(aspect_id)
    }

    /// Whether `aspect_id` is this node, one of its ancestors or one of its
    /// descendants.
    ///
    /// Measuring-function matching accepts both directions: a query for a
    /// parent aspect matches a child-aspect reading and vice versa.
    pub fn is_related_to(&self, aspect_id: &str) -> bool {
        self.id == aspect_id || self.has_ancestor(aspect_id) || self.has_descendant(aspect_id)
    }
}
