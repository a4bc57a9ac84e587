//! The static all-pairs engine: repeated single-source Dijkstra.
//!
//! The dynamic service uses this collaborator twice: once to build the index
//! for a graph that already has edges (cold initialization), and in tests as
//! an independent oracle for whatever the incremental index answers.
//!
//! Scratch state (estimates, predecessors, the heap) is call-local and
//! discarded on return. The heap is a lazy-deletion binary heap: improving a
//! vertex's estimate pushes a fresh entry and stale entries are skipped on
//! extraction, so re-prioritization needs no decrease-key support.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use fnv::FnvHashMap;

use crate::graph::ValueGraph;
use crate::path::EndpointPair;
use crate::{Distance, Node};

/// A discovered shortest path: the vertex chain and its weight at discovery.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ShortestPathResult<N: Node> {
    /// Vertices from source to destination.
    pub chain: Vec<N>,
    /// Total weight over the edge values seen by the calculation.
    pub weight: Distance,
}

/// Shortest paths keyed by endpoint pair. Only reachable, non-self pairs
/// appear.
pub type ShortestPathMap<N> = FnvHashMap<EndpointPair<N>, ShortestPathResult<N>>;

/// A static shortest path calculation over a whole graph.
pub trait AllPairsEngine<N: Node> {
    /// Shortest paths from `source` to every vertex it reaches.
    fn single_source(&self, graph: &ValueGraph<N>, source: &N) -> ShortestPathMap<N>;

    /// Shortest paths between all pairs: one single-source pass per vertex.
    fn all_pairs(&self, graph: &ValueGraph<N>) -> ShortestPathMap<N> {
        let mut result = ShortestPathMap::default();
        for source in graph.nodes() {
            result.extend(self.single_source(graph, source));
        }
        result
    }
}

/// Dijkstra with a lazy-deletion heap.
#[derive(Clone, Copy, Debug, Default)]
pub struct DijkstraEngine;

impl<N: Node> AllPairsEngine<N> for DijkstraEngine {
    fn single_source(&self, graph: &ValueGraph<N>, source: &N) -> ShortestPathMap<N> {
        let mut estimate: FnvHashMap<&N, Distance> = FnvHashMap::default();
        let mut predecessor: FnvHashMap<&N, &N> = FnvHashMap::default();
        let mut heap: BinaryHeap<Reverse<(Distance, &N)>> = BinaryHeap::new();

        estimate.insert(source, 0);
        heap.push(Reverse((0, source)));
        while let Some(Reverse((settled, node))) = heap.pop() {
            if settled > estimate[node] {
                continue;
            }
            for (next, weight) in graph.out_edges(node) {
                let relaxed = settled + Distance::from(weight);
                if estimate.get(next).is_none_or(|&current| relaxed < current) {
                    estimate.insert(next, relaxed);
                    predecessor.insert(next, node);
                    heap.push(Reverse((relaxed, next)));
                }
            }
        }

        let mut result = ShortestPathMap::default();
        for (&node, &weight) in estimate.iter().filter(|(&node, _)| node != source) {
            let mut chain = vec![node.clone()];
            let mut cursor = node;
            while let Some(&previous) = predecessor.get(cursor) {
                chain.push(previous.clone());
                cursor = previous;
            }
            chain.reverse();
            let pair = EndpointPair::of(source.clone(), node.clone(), graph.is_directed());
            result.insert(pair, ShortestPathResult { chain, weight });
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::ValueGraphBuilder;

    fn engine() -> DijkstraEngine {
        DijkstraEngine
    }

    #[test]
    fn single_edge() {
        let mut graph = ValueGraphBuilder::directed().expected_node_count(2).build();
        graph.put_edge_value("a", "b", 3);
        let result = engine().single_source(&graph, &"a");
        assert_eq!(result.len(), 1);
        let found = &result[&EndpointPair::ordered("a", "b")];
        assert_eq!(found.chain, vec!["a", "b"]);
        assert_eq!(found.weight, 3);
    }

    #[test]
    fn prefers_the_cheaper_route() {
        let mut graph = ValueGraphBuilder::directed().expected_node_count(3).build();
        graph.put_edge_value("a", "b", 1);
        graph.put_edge_value("b", "c", 2);
        graph.put_edge_value("a", "c", 1);
        let result = engine().all_pairs(&graph);
        assert_eq!(result[&EndpointPair::ordered("a", "c")].chain, vec!["a", "c"]);
        assert_eq!(result[&EndpointPair::ordered("a", "c")].weight, 1);
        assert_eq!(result[&EndpointPair::ordered("a", "b")].weight, 1);
        assert_eq!(result[&EndpointPair::ordered("b", "c")].weight, 2);
    }

    #[test]
    fn reprioritizes_after_a_late_improvement() {
        // Settling order must follow improved estimates: d's first finite
        // estimate (via b, 10 + 1) is beaten later through c (3 + 1 + 1).
        let mut graph = ValueGraphBuilder::directed().expected_node_count(4).build();
        graph.put_edge_value("a", "b", 10);
        graph.put_edge_value("a", "c", 3);
        graph.put_edge_value("c", "b", 1);
        graph.put_edge_value("b", "d", 1);
        let result = engine().single_source(&graph, &"a");
        assert_eq!(result[&EndpointPair::ordered("a", "b")].weight, 4);
        assert_eq!(result[&EndpointPair::ordered("a", "b")].chain, vec!["a", "c", "b"]);
        assert_eq!(result[&EndpointPair::ordered("a", "d")].weight, 5);
        assert_eq!(result[&EndpointPair::ordered("a", "d")].chain, vec!["a", "c", "b", "d"]);
    }

    #[test]
    fn unreachable_pairs_are_absent() {
        let mut graph = ValueGraphBuilder::directed().expected_node_count(3).build();
        graph.add_node("lonely");
        graph.put_edge_value("a", "b", 1);
        let result = engine().all_pairs(&graph);
        assert_eq!(result.len(), 1);
        assert!(result.contains_key(&EndpointPair::ordered("a", "b")));
    }

    #[test]
    fn undirected_graphs_reach_both_ways() {
        let mut graph = ValueGraphBuilder::undirected().expected_node_count(3).build();
        graph.put_edge_value("a", "b", 2);
        graph.put_edge_value("b", "c", 3);
        let result = engine().all_pairs(&graph);
        let ac = &result[&EndpointPair::unordered("c", "a")];
        assert_eq!(ac.weight, 5);
    }
}
