//! Aspect index - closure records of the aspect taxonomy
//!
//! Each aspect tree is materialized into one [`AspectNode`] per aspect, with
//! precomputed ancestors and descendants so matching never walks the tree.
//! Writes replace a whole tree: its old nodes are removed first because
//! aspects may move between parents or roots on edit.

use std::collections::{BTreeSet, HashMap};

use devmeta_core::{Aspect, AspectNode, RegistryError, RegistryResult};
use tracing::{debug, info, warn};

use crate::reader::Reader;

/// Compute the closure records of one aspect tree.
///
/// Nodes are returned in depth-first pre-order, starting with the root.
/// The walk uses an explicit stack, so deep trees cannot overflow the call
/// stack.
pub fn build_nodes(root: &Aspect) -> Vec<AspectNode> {
    let mut nodes: Vec<AspectNode> = Vec::new();
    let mut seen: BTreeSet<&str> = BTreeSet::new();
    let mut stack: Vec<(&Aspect, Vec<String>)> = vec![(root, Vec::new())];

    while let Some((aspect, ancestors)) = stack.pop() {
        if !seen.insert(aspect.id.as_str()) {
            warn!(aspect_id = %aspect.id, root_id = %root.id, "Skipping duplicate aspect in tree");
            continue;
        }
        let mut child_ancestors = ancestors.clone();
        child_ancestors.push(aspect.id.clone());
        for child in aspect.sub_aspects.iter().rev() {
            stack.push((child, child_ancestors.clone()));
        }
        nodes.push(AspectNode {
            id: aspect.id.clone(),
            name: aspect.name.clone(),
            root_id: root.id.clone(),
            parent_id: ancestors.last().cloned(),
            child_ids: aspect.sub_aspects.iter().map(|a| a.id.clone()).collect(),
            ancestor_ids: ancestors,
            descendent_ids: BTreeSet::new(),
        });
    }

    // Children follow their parent in pre-order, so walking backwards
    // completes every child before its parent.
    let mut descendants: HashMap<String, BTreeSet<String>> = HashMap::new();
    for node in nodes.iter_mut().rev() {
        let mut own = BTreeSet::new();
        for child_id in &node.child_ids {
            own.insert(child_id.clone());
            if let Some(below) = descendants.get(child_id) {
                own.extend(below.iter().cloned());
            }
        }
        node.descendent_ids = own.clone();
        descendants.insert(node.id.clone(), own);
    }

    nodes
}

/// Read and write access to the materialized aspect index
pub struct AspectIndex<'a> {
    reader: Reader<'a>,
}

impl<'a> AspectIndex<'a> {
    /// Create an index over a store
    pub fn new(reader: Reader<'a>) -> Self {
        Self { reader }
    }

    /// Replace the nodes of the tree rooted at `root`.
    ///
    /// Returns the ids of every descendant of the root. The rebuild is not
    /// atomic: a failed write leaves the tree partially written and the
    /// caller must redo the whole rebuild.
    pub async fn rebuild(&self, root: &Aspect) -> RegistryResult<Vec<String>> {
        let nodes = build_nodes(root);
        let descendants: Vec<String> = nodes
            .first()
            .map(|n| n.descendent_ids.iter().cloned().collect())
            .unwrap_or_default();

        self.reader
            .remove_aspect_nodes_by_root_id(&root.id)
            .await
            .map_err(|e| interrupted(&root.id, "removing old nodes", e))?;

        let count = nodes.len();
        for node in nodes {
            let node_id = node.id.clone();
            self.reader
                .set_aspect_node(node)
                .await
                .map_err(|e| interrupted(&root.id, &format!("writing node {}", node_id), e))?;
        }

        info!(root_id = %root.id, nodes = count, "Rebuilt aspect tree");
        Ok(descendants)
    }

    /// Get one node
    pub async fn get_node(&self, id: &str) -> RegistryResult<AspectNode> {
        self.reader
            .aspect_node(id)
            .await?
            .ok_or_else(|| RegistryError::AspectNotFound(id.to_string()))
    }

    /// Get the nodes that exist for `ids`
    pub async fn list_by_ids(&self, ids: &[String]) -> RegistryResult<Vec<AspectNode>> {
        self.reader.aspect_nodes(ids).await
    }

    /// Every node, ordered by id
    pub async fn list_all(&self) -> RegistryResult<Vec<AspectNode>> {
        self.reader.all_aspect_nodes().await
    }

    /// Nodes of aspects used with measuring functions, optionally expanded
    /// by their ancestors and/or descendants, ordered by id.
    pub async fn list_with_measuring_function(
        &self,
        include_ancestors: bool,
        include_descendants: bool,
    ) -> RegistryResult<Vec<AspectNode>> {
        let exact_ids = self.reader.measuring_aspect_ids().await?;
        let exact = self.reader.aspect_nodes(&exact_ids).await?;

        let mut ids: BTreeSet<String> = exact.iter().map(|n| n.id.clone()).collect();
        for node in &exact {
            if include_ancestors {
                ids.extend(node.ancestor_ids.iter().cloned());
            }
            if include_descendants {
                ids.extend(node.descendent_ids.iter().cloned());
            }
        }
        debug!(
            exact = exact.len(),
            expanded = ids.len(),
            "Listing measuring aspect nodes"
        );

        let ids: Vec<String> = ids.into_iter().collect();
        let mut nodes = self.reader.aspect_nodes(&ids).await?;
        nodes.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(nodes)
    }
}

fn interrupted(root_id: &str, step: &str, cause: RegistryError) -> RegistryError {
    RegistryError::InconsistentState(format!(
        "rebuild of aspect tree {} interrupted while {}: {}",
        root_id, step, cause
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn set(ids: &[&str]) -> BTreeSet<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    fn tree() -> Aspect {
        Aspect::new("a1", "A1")
            .with_sub_aspect(
                Aspect::new("a1.1", "A1.1").with_sub_aspect(Aspect::new("a1.1.1", "A1.1.1")),
            )
            .with_sub_aspect(Aspect::new("a1.2", "A1.2"))
    }

    fn by_id(nodes: &[AspectNode], id: &str) -> AspectNode {
        nodes.iter().find(|n| n.id == id).cloned().unwrap()
    }

    #[test]
    fn closure_of_small_tree() {
        let nodes = build_nodes(&tree());
        let ids: Vec<&str> = nodes.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["a1", "a1.1", "a1.1.1", "a1.2"]);

        let root = by_id(&nodes, "a1");
        assert!(root.is_root());
        assert_eq!(root.parent_id, None);
        assert_eq!(root.child_ids, set(&["a1.1", "a1.2"]));
        assert_eq!(root.descendent_ids, set(&["a1.1", "a1.1.1", "a1.2"]));

        let leaf = by_id(&nodes, "a1.1.1");
        assert_eq!(leaf.root_id, "a1");
        assert_eq!(leaf.parent_id.as_deref(), Some("a1.1"));
        assert_eq!(leaf.ancestor_ids, vec!["a1".to_string(), "a1.1".to_string()]);
        assert!(leaf.descendent_ids.is_empty());
        assert!(leaf.child_ids.is_empty());
    }

    #[test]
    fn ancestor_descendant_symmetry() {
        let wide = Aspect::new("r", "R")
            .with_sub_aspect(tree())
            .with_sub_aspect(
                Aspect::new("b", "B")
                    .with_sub_aspect(Aspect::new("b.1", "B1"))
                    .with_sub_aspect(
                        Aspect::new("b.2", "B2").with_sub_aspect(Aspect::new("b.2.1", "B21")),
                    ),
            );
        let nodes = build_nodes(&wide);
        for a in &nodes {
            for b in &nodes {
                assert_eq!(
                    a.has_ancestor(&b.id),
                    b.has_descendant(&a.id),
                    "{} / {}",
                    a.id,
                    b.id
                );
            }
        }
    }

    #[test]
    fn descendants_are_closure_of_children() {
        let nodes = build_nodes(&tree());
        for node in &nodes {
            let mut expected = BTreeSet::new();
            let mut stack: Vec<String> = node.child_ids.iter().cloned().collect();
            while let Some(id) = stack.pop() {
                let child = by_id(&nodes, &id);
                stack.extend(child.child_ids.iter().cloned());
                expected.insert(id);
            }
            assert_eq!(node.descendent_ids, expected);
        }
    }

    #[test]
    fn deep_tree_does_not_recurse() {
        let mut aspect = Aspect::new("leaf", "leaf");
        for i in 0..2_000 {
            aspect = Aspect::new(format!("n{}", i), "n").with_sub_aspect(aspect);
        }
        let nodes = build_nodes(&aspect);
        assert_eq!(nodes.len(), 2_001);
        assert_eq!(nodes[0].descendent_ids.len(), 2_000);
        assert_eq!(nodes[2_000].ancestor_ids.len(), 2_000);
    }

    #[test]
    fn duplicate_ids_are_skipped() {
        let root = Aspect::new("a", "A")
            .with_sub_aspect(Aspect::new("b", "B"))
            .with_sub_aspect(Aspect::new("b", "B again"));
        let nodes = build_nodes(&root);
        assert_eq!(nodes.len(), 2);
        assert_eq!(by_id(&nodes, "b").name, "B");
    }
}
