//! A mutable, weighted graph with value-carrying edges.
//!
//! `ValueGraph` is the graph collaborator the dynamic service operates on:
//! directed or undirected, one weighted edge per vertex pair, no self-loops.
//! Edges hold finite [`Weight`]s only; writing [`NO_EDGE`] removes the edge, so
//! iteration over predecessors and successors always yields live neighbors.
//!
//! Node iteration follows insertion order, and adjacency uses `fnv` maps, so a
//! graph built by the same calls always iterates the same way.

use fnv::{FnvHashMap, FnvHashSet};
use serde::{Deserialize, Serialize};

use crate::{Node, Weight, NO_EDGE};

/// Builder for [`ValueGraph`]: directedness plus an optional capacity hint.
#[derive(Clone, Copy, Debug)]
pub struct ValueGraphBuilder {
    directed: bool,
    expected_node_count: usize,
}

impl ValueGraphBuilder {
    /// Starts a builder for a directed graph.
    pub fn directed() -> Self {
        Self { directed: true, expected_node_count: 0 }
    }

    /// Starts a builder for an undirected graph.
    pub fn undirected() -> Self {
        Self { directed: false, expected_node_count: 0 }
    }

    /// Pre-allocates for a known node count.
    pub fn expected_node_count(mut self, count: usize) -> Self {
        self.expected_node_count = count;
        self
    }

    /// Builds the empty graph.
    pub fn build<N: Node>(self) -> ValueGraph<N> {
        ValueGraph {
            directed: self.directed,
            nodes: Vec::with_capacity(self.expected_node_count),
            out_edges: FnvHashMap::with_capacity_and_hasher(
                self.expected_node_count,
                Default::default(),
            ),
            in_edges: FnvHashMap::with_capacity_and_hasher(
                self.expected_node_count,
                Default::default(),
            ),
        }
    }
}

/// A directed or undirected graph whose edges carry a [`Weight`].
///
/// Undirected graphs store each edge in both adjacency directions under the
/// same weight.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValueGraph<N: Node> {
    directed: bool,
    nodes: Vec<N>,
    out_edges: FnvHashMap<N, FnvHashMap<N, Weight>>,
    in_edges: FnvHashMap<N, FnvHashSet<N>>,
}

impl<N: Node> ValueGraph<N> {
    /// Whether edges are directional.
    pub fn is_directed(&self) -> bool {
        self.directed
    }

    /// Number of nodes.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of edges; an undirected edge counts once.
    pub fn edge_count(&self) -> usize {
        let directional: usize = self.out_edges.values().map(FnvHashMap::len).sum();
        if self.directed {
            directional
        } else {
            directional / 2
        }
    }

    /// Whether `node` has been added.
    pub fn contains_node(&self, node: &N) -> bool {
        self.out_edges.contains_key(node)
    }

    /// Adds an isolated node. Returns `false` if it was already present.
    pub fn add_node(&mut self, node: N) -> bool {
        if self.contains_node(&node) {
            return false;
        }
        self.nodes.push(node.clone());
        self.out_edges.insert(node.clone(), FnvHashMap::default());
        self.in_edges.insert(node, FnvHashSet::default());
        true
    }

    /// Nodes in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = &N> {
        self.nodes.iter()
    }

    /// Vertices reachable from `node` over one edge.
    pub fn successors<'a>(&'a self, node: &N) -> impl Iterator<Item = &'a N> {
        self.out_edges.get(node).into_iter().flat_map(FnvHashMap::keys)
    }

    /// Vertices that reach `node` over one edge.
    pub fn predecessors<'a>(&'a self, node: &N) -> impl Iterator<Item = &'a N> {
        self.in_edges.get(node).into_iter().flatten()
    }

    /// Outgoing edges of `node` with their weights.
    pub fn out_edges<'a>(&'a self, node: &N) -> impl Iterator<Item = (&'a N, Weight)> {
        self.out_edges
            .get(node)
            .into_iter()
            .flat_map(|edges| edges.iter().map(|(target, weight)| (target, *weight)))
    }

    /// The weight of the edge from `source` to `target`, if one exists.
    pub fn edge_value(&self, source: &N, target: &N) -> Option<Weight> {
        self.out_edges.get(source)?.get(target).copied()
    }

    /// The weight of the edge from `source` to `target`, or `default`.
    pub fn edge_value_or_default(&self, source: &N, target: &N, default: Weight) -> Weight {
        self.edge_value(source, target).unwrap_or(default)
    }

    /// Whether an edge connects `source` to `target`.
    pub fn has_edge(&self, source: &N, target: &N) -> bool {
        self.edge_value(source, target).is_some()
    }

    /// Writes the weight of the edge from `source` to `target`, adding either
    /// endpoint if absent, and returns the previous weight.
    ///
    /// Writing [`NO_EDGE`] removes the edge. Self-loops are not representable;
    /// a call with `source == target` does nothing.
    pub fn put_edge_value(&mut self, source: N, target: N, weight: Weight) -> Option<Weight> {
        if source == target {
            return None;
        }
        if weight == NO_EDGE {
            return self.remove_edge(&source, &target);
        }
        self.add_node(source.clone());
        self.add_node(target.clone());
        let previous = self.insert_directional(source.clone(), target.clone(), weight);
        if !self.directed {
            self.insert_directional(target, source, weight);
        }
        previous
    }

    /// Removes the edge from `source` to `target`, returning its weight.
    pub fn remove_edge(&mut self, source: &N, target: &N) -> Option<Weight> {
        let previous = self.remove_directional(source, target);
        if !self.directed {
            self.remove_directional(target, source);
        }
        previous
    }

    fn insert_directional(&mut self, source: N, target: N, weight: Weight) -> Option<Weight> {
        self.in_edges.entry(target.clone()).or_default().insert(source.clone());
        self.out_edges.entry(source).or_default().insert(target, weight)
    }

    fn remove_directional(&mut self, source: &N, target: &N) -> Option<Weight> {
        if let Some(sources) = self.in_edges.get_mut(target) {
            sources.remove(source);
        }
        self.out_edges.get_mut(source)?.remove(target)
    }

    /// Renders the graph in GraphViz dot format, nodes in insertion order and
    /// edges sorted, so equal graphs render identically.
    pub fn to_dot(&self) -> String {
        use std::fmt::Write;

        let (header, arrow) = if self.directed {
            ("digraph", "->")
        } else {
            ("graph", "--")
        };
        let mut out = format!("{header} g {{\n");
        for node in &self.nodes {
            let _ = writeln!(out, "  {node:?};");
        }
        for source in &self.nodes {
            let mut targets: Vec<(&N, Weight)> = self.out_edges(source).collect();
            targets.sort();
            for (target, weight) in targets {
                if !self.directed && target < source {
                    continue;
                }
                let _ = writeln!(out, "  {source:?} {arrow} {target:?} [label={weight}];");
            }
        }
        out.push_str("}\n");
        out
    }
}

/// An identified graph: the unit whose index state the dynamic service owns.
///
/// Wrappers compare and hash by identifier alone, as two wrappers with the same
/// identifier are meant to be the same logical graph.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GraphWrapper<N: Node> {
    id: String,
    graph: ValueGraph<N>,
}

impl<N: Node> GraphWrapper<N> {
    /// Wraps `graph` under `id`.
    pub fn new(id: impl Into<String>, graph: ValueGraph<N>) -> Self {
        Self { id: id.into(), graph }
    }

    /// The wrapper identifier.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The wrapped graph.
    pub fn graph(&self) -> &ValueGraph<N> {
        &self.graph
    }

    /// Mutable access to the wrapped graph.
    ///
    /// Mutating edges of a vertex outside [`crate::DynamicGraphService::update`]
    /// leaves any index built over this wrapper stale.
    pub fn graph_mut(&mut self) -> &mut ValueGraph<N> {
        &mut self.graph
    }
}

impl<N: Node> PartialEq for GraphWrapper<N> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<N: Node> Eq for GraphWrapper<N> {}

impl<N: Node> std::hash::Hash for GraphWrapper<N> {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}
