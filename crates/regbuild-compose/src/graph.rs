//! Image lineage graph using `petgraph`.
//!
//! Links images produced by the same request: when one produced image is a
//! base of another, the base must be built (and pushed) first.

use std::collections::HashMap;

use petgraph::Direction;
use petgraph::graph::NodeIndex;
use regbuild_common::error::{BuildError, Result};
use regbuild_common::types::{ImageDependencies, ImageReference};

/// Directed graph of produced images; edges point from base to dependent.
#[derive(Debug)]
pub struct LineageGraph {
    graph: petgraph::Graph<String, ()>,
    nodes: HashMap<String, NodeIndex>,
}

impl LineageGraph {
    fn new() -> Self {
        Self {
            graph: petgraph::Graph::new(),
            nodes: HashMap::new(),
        }
    }

    /// Builds the graph from scanned dependencies.
    ///
    /// Bases that are not produced by any record (public images, for
    /// instance) do not appear in the graph.
    #[must_use]
    pub fn from_dependencies(deps: &[ImageDependencies]) -> Self {
        let mut lineage = Self::new();
        for record in deps {
            let _ = lineage.add_image(&record.image);
        }
        for record in deps {
            let Some(&dependent) = lineage.nodes.get(&normalize(&record.image)) else {
                continue;
            };
            let bases = std::iter::once(&record.runtime).chain(record.buildtime.iter());
            for base in bases {
                if let Some(&base_idx) = lineage.nodes.get(&normalize(base)) {
                    lineage.add_dependency(dependent, base_idx);
                }
            }
        }
        lineage
    }

    /// Adds a produced image, returning the existing node if already known.
    fn add_image(&mut self, image: &str) -> NodeIndex {
        let key = normalize(image);
        if let Some(&idx) = self.nodes.get(&key) {
            return idx;
        }
        let idx = self.graph.add_node(image.to_string());
        let _ = self.nodes.insert(key, idx);
        idx
    }

    /// Adds an edge: `dependent` is built from `base`.
    fn add_dependency(&mut self, dependent: NodeIndex, base: NodeIndex) {
        let _ = self.graph.update_edge(base, dependent, ());
    }

    /// Returns produced images with bases before the images built on them.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::LineageCycle`] if images are built from each
    /// other.
    pub fn build_order(&self) -> Result<Vec<String>> {
        match petgraph::algo::toposort(&self.graph, None) {
            Ok(indices) => Ok(indices
                .iter()
                .filter_map(|&idx| self.graph.node_weight(idx).cloned())
                .collect()),
            Err(cycle) => Err(BuildError::LineageCycle {
                message: self
                    .graph
                    .node_weight(cycle.node_id())
                    .cloned()
                    .unwrap_or_default(),
            }),
        }
    }

    /// Returns the produced images built directly on `image`.
    #[must_use]
    pub fn dependents_of(&self, image: &str) -> Vec<String> {
        let Some(&idx) = self.nodes.get(&normalize(image)) else {
            return Vec::new();
        };
        let mut out: Vec<String> = self
            .graph
            .neighbors_directed(idx, Direction::Outgoing)
            .filter_map(|n| self.graph.node_weight(n).cloned())
            .collect();
        out.sort();
        out
    }
}

fn normalize(image: &str) -> String {
    ImageReference::parse(image).map_or_else(|_| image.to_string(), |r| r.normalized())
}
