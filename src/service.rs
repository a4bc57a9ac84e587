//! The dynamic service: cold initialization, incremental updates, queries.
//!
//! An update re-weights the edges incident to one vertex `v` and then repairs
//! the index in four phases:
//!
//! 1. **cleanup**: a breadth-first sweep outward from the self-path of `v`
//!    through the local extension maps removes every indexed path that walks
//!    through `v`; the closure invariant of [`PathIndex`] is what makes the
//!    sweep exhaustive.
//! 2. **seed**: the two-vertex paths over the surviving incident edges of
//!    `v` are re-registered; they are locally shortest by definition.
//! 3. **prime**: the minimum-weight locally shortest path of every endpoint
//!    pair, re-weighed against the mutated graph, enters a global min-heap.
//! 4. **relax**: paths pop in non-decreasing weight order. The first pop for
//!    a pair is its shortest path and is promoted; its one-vertex extensions
//!    through settled neighbors become new locally shortest candidates and
//!    are pushed in turn. Later pops for a settled pair are discarded.
//!
//! The classical Dijkstra argument, applied to paths instead of vertices,
//! guarantees that a pair settles on its true updated shortest path before
//! anything longer is built on top of it.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, VecDeque};
use std::sync::Arc;

use fnv::FnvHashSet;
use tracing::{debug, trace};

use crate::algebra;
use crate::engine::{AllPairsEngine, ShortestPathMap};
use crate::error::{Error, Result};
use crate::graph::{GraphWrapper, ValueGraph};
use crate::index::PathIndex;
use crate::path::{EndpointPair, Path, PathRef, WeightUpdate};
use crate::{DijkstraEngine, Distance, Node};

/// A graph wrapper together with the index maintained over it.
///
/// The handle is the unit of independence: distinct handles share nothing and
/// may live on different threads, while one handle serializes its updates and
/// queries through `&mut`/`&` borrows.
#[derive(Clone, Debug)]
pub struct DynamicGraph<N: Node> {
    wrapper: GraphWrapper<N>,
    index: PathIndex<N>,
}

impl<N: Node> DynamicGraph<N> {
    /// A handle with an empty index, for graphs built through updates.
    pub fn new(wrapper: GraphWrapper<N>) -> Self {
        Self { wrapper, index: PathIndex::new() }
    }

    /// The wrapper identifier.
    pub fn id(&self) -> &str {
        self.wrapper.id()
    }

    /// The wrapped graph.
    pub fn graph(&self) -> &ValueGraph<N> {
        self.wrapper.graph()
    }

    /// The wrapper itself.
    pub fn wrapper(&self) -> &GraphWrapper<N> {
        &self.wrapper
    }

    /// The index state. Read-only: all mutation goes through the service.
    pub fn index(&self) -> &PathIndex<N> {
        &self.index
    }
}

/// Orchestrates initialization, incremental updates, and queries.
///
/// The engine collaborator is injected so tests can substitute their own;
/// outside of [`DynamicGraphService::init`] it is never consulted.
#[derive(Clone, Debug, Default)]
pub struct DynamicGraphService<E = DijkstraEngine> {
    engine: E,
}

impl DynamicGraphService<DijkstraEngine> {
    /// A service backed by the Dijkstra engine.
    pub fn new() -> Self {
        Self { engine: DijkstraEngine }
    }
}

impl<E> DynamicGraphService<E> {
    /// A service backed by a custom engine.
    pub fn with_engine(engine: E) -> Self {
        Self { engine }
    }

    /// Builds the index for a graph that already has edges.
    ///
    /// Runs the static engine once, records every discovered shortest path,
    /// registers the extension closure, probes the one-hop extensions of each
    /// discovered path, and seeds every edge as a two-vertex locally shortest
    /// path. The result equals what an equivalent sequence of updates builds,
    /// and initializing the same graph twice yields equal indexes.
    pub fn init<N: Node>(&self, wrapper: GraphWrapper<N>) -> Result<DynamicGraph<N>>
    where
        E: AllPairsEngine<N>,
    {
        let graph = wrapper.graph();
        let discovered = self.engine.all_pairs(graph);
        let mut index = PathIndex::new();

        for (pair, found) in &discovered {
            if found.chain.is_empty() {
                return Err(Error::InvariantViolation(format!(
                    "engine produced an empty shortest path chain for {pair:?}",
                )));
            }
            let path: PathRef<N> =
                Arc::new(Path::new(pair.clone(), found.chain.iter().cloned().collect()));
            index.insert_locally_shortest(graph, path.clone());
            index.promote_shortest(graph, path.clone());
            probe_right_extensions(graph, &mut index, &discovered, &path);
            probe_left_extensions(graph, &mut index, &discovered, &path);
        }

        // Every edge is a locally shortest two-vertex path, whether or not it
        // is anyone's shortest path; without these the index has no fallback
        // candidate once a later update invalidates a recorded shortest path.
        for source in graph.nodes() {
            for (target, _) in graph.out_edges(source) {
                let edge = Arc::new(Path::edge(source.clone(), target.clone(), graph.is_directed()));
                index.insert_locally_shortest(graph, edge);
            }
        }

        debug!(graph = %wrapper.id(), pairs = discovered.len(), "initialized index");
        Ok(DynamicGraph { wrapper, index })
    }

    /// Applies one atomic batch of weight changes incident to a single vertex
    /// and restores every index invariant without a full recomputation.
    ///
    /// The batch is validated before anything mutates; a rejected update
    /// leaves graph and index untouched.
    pub fn update<N: Node>(
        &self,
        dynamic: &mut DynamicGraph<N>,
        update: &WeightUpdate<N>,
    ) -> Result<()> {
        validate_update(dynamic, update)?;

        let node = update.node().clone();
        let graph = dynamic.wrapper.graph_mut();
        for (source, &weight) in update.incoming() {
            graph.put_edge_value(source.clone(), node.clone(), weight);
        }
        for (target, &weight) in update.outgoing() {
            graph.put_edge_value(node.clone(), target.clone(), weight);
        }

        let graph = dynamic.wrapper.graph();
        let removed = clean_up(graph, &mut dynamic.index, &node);
        seed(graph, &mut dynamic.index, &node);
        let settled = fix_up(graph, &mut dynamic.index)?;
        debug!(
            graph = %dynamic.wrapper.id(),
            node = ?node,
            removed,
            settled,
            "applied weight update"
        );
        Ok(())
    }

    /// The current shortest distance from `src` to `dst`.
    ///
    /// The minimum re-summed weight over every locally shortest candidate for
    /// the pair; `None` when no candidate connects them. A vertex is at
    /// distance zero from itself.
    pub fn distance<N: Node>(&self, dynamic: &DynamicGraph<N>, src: &N, dst: &N) -> Option<Distance> {
        if src == dst {
            return dynamic.graph().contains_node(src).then_some(0);
        }
        best_candidate(dynamic, src, dst).map(|(weight, _)| weight)
    }

    /// The vertex chain of the current shortest path from `src` to `dst`.
    pub fn path<N: Node>(&self, dynamic: &DynamicGraph<N>, src: &N, dst: &N) -> Option<Vec<N>> {
        if src == dst {
            return dynamic.graph().contains_node(src).then(|| vec![src.clone()]);
        }
        best_candidate(dynamic, src, dst).map(|(_, path)| path.to_vec())
    }
}

/// The minimum-weight locally shortest candidate for `(src, dst)`, weights
/// re-summed from current edge values, ties broken by chain.
fn best_candidate<'a, N: Node>(
    dynamic: &'a DynamicGraph<N>,
    src: &N,
    dst: &N,
) -> Option<(Distance, &'a PathRef<N>)> {
    let pair = algebra::vertex_pair(src, dst, dynamic.graph());
    dynamic
        .index
        .locally_shortest(&pair)
        .filter_map(|path| algebra::weight(dynamic.graph(), path).map(|weight| (weight, path)))
        .min()
}

fn validate_update<N: Node>(dynamic: &DynamicGraph<N>, update: &WeightUpdate<N>) -> Result<()> {
    let graph = dynamic.graph();
    let node = update.node();
    let invalid = |reason: String| Error::InvalidUpdate {
        graph: dynamic.id().to_owned(),
        reason,
    };
    if !graph.contains_node(node) {
        return Err(invalid(format!("unknown vertex {node:?}")));
    }
    for neighbor in update.incoming().keys().chain(update.outgoing().keys()) {
        if neighbor == node {
            return Err(invalid(format!("vertex {node:?} names itself as neighbor")));
        }
        if !graph.contains_node(neighbor) {
            return Err(invalid(format!("unknown neighbor {neighbor:?}")));
        }
    }
    if !graph.is_directed() {
        for (neighbor, weight) in update.incoming() {
            if let Some(&other) = update.outgoing().get(neighbor) {
                if other != *weight {
                    return Err(invalid(format!(
                        "conflicting weights for undirected edge to {neighbor:?}",
                    )));
                }
            }
        }
    }
    Ok(())
}

/// Removes every indexed path that walks through `node`. Returns how many.
fn clean_up<N: Node>(graph: &ValueGraph<N>, index: &mut PathIndex<N>, node: &N) -> usize {
    let root: PathRef<N> = Arc::new(Path::self_path(node.clone(), graph.is_directed()));
    let mut visited: FnvHashSet<PathRef<N>> = FnvHashSet::default();
    let mut queue: VecDeque<PathRef<N>> = VecDeque::new();
    visited.insert(root.clone());
    queue.push_back(root);

    let mut removed = 0;
    while let Some(path) = queue.pop_front() {
        let dependents: Vec<PathRef<N>> = index
            .left_local_extensions(&path)
            .chain(index.right_local_extensions(&path))
            .cloned()
            .collect();
        for dependent in dependents {
            if visited.insert(dependent.clone()) {
                queue.push_back(dependent);
            }
        }
        if !path.is_trivial() {
            debug_assert!(path.contains(node));
            index.remove(graph, &path);
            removed += 1;
        }
    }
    trace!(node = ?node, removed, "cleanup swept the affected paths");
    removed
}

/// Re-registers the two-vertex paths over the edges incident to `node`.
fn seed<N: Node>(graph: &ValueGraph<N>, index: &mut PathIndex<N>, node: &N) {
    let sources: Vec<N> = graph.predecessors(node).cloned().collect();
    for source in sources {
        let edge = Arc::new(Path::edge(source, node.clone(), graph.is_directed()));
        index.insert_locally_shortest(graph, edge);
    }
    let targets: Vec<N> = graph.successors(node).cloned().collect();
    for target in targets {
        let edge = Arc::new(Path::edge(node.clone(), target, graph.is_directed()));
        index.insert_locally_shortest(graph, edge);
    }
}

/// A heap entry: weight first, chain second, so pops are deterministic.
#[derive(PartialEq, Eq, PartialOrd, Ord)]
struct Candidate<N: Node> {
    weight: Distance,
    path: PathRef<N>,
}

/// Re-settles every endpoint pair and grows new locally shortest paths from
/// the settled ones. Returns the number of settled pairs.
fn fix_up<N: Node>(graph: &ValueGraph<N>, index: &mut PathIndex<N>) -> Result<usize> {
    let mut heap: BinaryHeap<Reverse<Candidate<N>>> = BinaryHeap::new();
    for pair in index.pairs() {
        debug_assert!(!pair.is_self_pair());
        let best = index
            .locally_shortest(pair)
            .filter_map(|path| algebra::weight(graph, path).map(|weight| (weight, path)))
            .min();
        if let Some((weight, path)) = best {
            heap.push(Reverse(Candidate { weight, path: path.clone() }));
        }
    }

    let mut extracted: FnvHashSet<EndpointPair<N>> = FnvHashSet::default();
    while let Some(Reverse(Candidate { weight, path })) = heap.pop() {
        if !extracted.insert(path.endpoints().clone()) {
            continue;
        }
        index.promote_shortest(graph, path.clone());

        // One-hop prepends: a settled shortest extension of this path's left
        // sub-path contributes its front vertex.
        let left_sub = algebra::left_sub_path(graph, &path);
        let prepends: Vec<N> = index
            .left_shortest_extensions(&left_sub)
            .map(|base| base.first().clone())
            .collect();
        for front in prepends {
            extend(graph, index, &mut heap, &path, weight, &front, End::Front)?;
        }

        // One-hop appends, mirrored through the right sub-path.
        let right_sub = algebra::right_sub_path(graph, &path);
        let appends: Vec<N> = index
            .right_shortest_extensions(&right_sub)
            .map(|base| base.last().clone())
            .collect();
        for back in appends {
            extend(graph, index, &mut heap, &path, weight, &back, End::Back)?;
        }
    }
    Ok(extracted.len())
}

enum End {
    Front,
    Back,
}

/// Builds the one-vertex extension of a settled path, registers it as locally
/// shortest, and queues it for settlement.
fn extend<N: Node>(
    graph: &ValueGraph<N>,
    index: &mut PathIndex<N>,
    heap: &mut BinaryHeap<Reverse<Candidate<N>>>,
    settled: &PathRef<N>,
    settled_weight: Distance,
    vertex: &N,
    end: End,
) -> Result<()> {
    if settled.contains(vertex) {
        // Only simple paths are indexed.
        return Ok(());
    }
    let (candidate, edge) = match end {
        End::Front => (
            algebra::add_as_first(graph, vertex, settled),
            graph.edge_value(vertex, settled.first()),
        ),
        End::Back => (
            algebra::add_as_last(graph, vertex, settled),
            graph.edge_value(settled.last(), vertex),
        ),
    };
    if index.contains_locally_shortest(&candidate) {
        return Ok(());
    }
    let Some(edge) = edge else {
        return Err(Error::InvariantViolation(format!(
            "extension edge missing for {:?}",
            candidate.chain(),
        )));
    };
    let candidate: PathRef<N> = Arc::new(candidate);
    index.insert_locally_shortest(graph, candidate.clone());
    heap.push(Reverse(Candidate {
        weight: settled_weight + Distance::from(edge),
        path: candidate,
    }));
    Ok(())
}

/// Registers the one-hop successors of a discovered shortest path that are
/// themselves locally shortest: the candidate minus its first vertex must be
/// the discovered shortest path of that reduced pair.
fn probe_right_extensions<N: Node>(
    graph: &ValueGraph<N>,
    index: &mut PathIndex<N>,
    discovered: &ShortestPathMap<N>,
    path: &PathRef<N>,
) {
    for next in graph.successors(path.last()) {
        if path.contains(next) {
            continue;
        }
        let reduced_pair = algebra::vertex_pair(&path.chain()[1], next, graph);
        let Some(reduced) = discovered.get(&reduced_pair) else {
            continue;
        };
        let matches = reduced.chain.len() == path.len()
            && reduced.chain[..path.len() - 1] == path.chain()[1..]
            && &reduced.chain[path.len() - 1] == next;
        if matches {
            let candidate = Arc::new(algebra::add_as_last(graph, next, path));
            index.insert_locally_shortest(graph, candidate);
        }
    }
}

/// Mirror of [`probe_right_extensions`] through predecessors of the first
/// vertex.
fn probe_left_extensions<N: Node>(
    graph: &ValueGraph<N>,
    index: &mut PathIndex<N>,
    discovered: &ShortestPathMap<N>,
    path: &PathRef<N>,
) {
    for previous in graph.predecessors(path.first()) {
        if path.contains(previous) {
            continue;
        }
        let reduced_pair =
            algebra::vertex_pair(previous, &path.chain()[path.len() - 2], graph);
        let Some(reduced) = discovered.get(&reduced_pair) else {
            continue;
        };
        let matches = reduced.chain.len() == path.len()
            && reduced.chain[1..] == path.chain()[..path.len() - 1]
            && &reduced.chain[0] == previous;
        if matches {
            let candidate = Arc::new(algebra::add_as_first(graph, previous, path));
            index.insert_locally_shortest(graph, candidate);
        }
    }
}
