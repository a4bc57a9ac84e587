//! Incrementally maintained all-pairs shortest paths over weighted graphs.
//!
//! This crate maintains the shortest path between every ordered pair of vertices
//! of a directed, edge-weighted graph, and keeps those answers current under
//! *localized* weight changes: one call re-weights the edges incident to a single
//! vertex, and the index repairs itself without recomputing paths from scratch.
//!
//! The index tracks the *locally shortest* paths of the graph, the paths that
//! cannot be improved by replacing their one-hop-shorter prefix or suffix with a
//! cheaper alternative. Every shortest path is locally shortest, and a weight
//! change incident to a vertex `v` can only invalidate locally shortest paths
//! that pass through `v`. An update therefore purges exactly the paths through
//! `v` (cleanup), reseeds the two-vertex paths at `v`, and then re-settles the
//! affected pairs with a Dijkstra-style relaxation over whole paths rather than
//! vertices (fixup): paths pop off a global priority queue in non-decreasing
//! weight order, the first pop for a pair is its new shortest path, and settled
//! paths are extended by one vertex at a time through the extension indexes.
//!
//! Queries never trust cached numbers: a reported distance is always re-summed
//! from the current edge values of the graph.
//!
//! # Examples
//!
//! ```
//! use incremental_apsp::{DynamicGraph, DynamicGraphService, GraphWrapper, ValueGraphBuilder, WeightUpdate};
//!
//! let mut graph = ValueGraphBuilder::directed().expected_node_count(3).build();
//! graph.add_node("a");
//! graph.add_node("b");
//! graph.add_node("c");
//!
//! let service = DynamicGraphService::new();
//! let mut routes = DynamicGraph::new(GraphWrapper::new("demo", graph));
//!
//! // Edges are introduced and re-weighted one vertex at a time.
//! service.update(&mut routes, &WeightUpdate::new("a", [], [("b", 2)]))?;
//! service.update(&mut routes, &WeightUpdate::new("c", [("b", 3)], []))?;
//!
//! assert_eq!(service.distance(&routes, &"a", &"c"), Some(5));
//! assert_eq!(service.path(&routes, &"a", &"c"), Some(vec!["a", "b", "c"]));
//!
//! // A cheaper detour shows up in subsequent queries without a recomputation.
//! service.update(&mut routes, &WeightUpdate::new("b", [("a", 1)], [("c", 1)]))?;
//! assert_eq!(service.distance(&routes, &"a", &"c"), Some(2));
//! # Ok::<(), incremental_apsp::Error>(())
//! ```
//!
//! A graph that already exists can instead be indexed cold with
//! [`DynamicGraphService::init`], which runs the static all-pairs engine once
//! and builds the same index an equivalent sequence of updates would have
//! produced.

use std::fmt::Debug;
use std::hash::Hash;

/// An edge weight. [`NO_EDGE`] is reserved to mean "no edge".
pub type Weight = u32;

/// An accumulated path weight. Sums of [`Weight`]s cannot overflow it.
pub type Distance = u64;

/// The edge-value sentinel denoting the absence of an edge.
///
/// Writing it through a [`WeightUpdate`] removes the edge.
pub const NO_EDGE: Weight = Weight::MAX;

/// A type usable as a graph vertex.
///
/// A blanket implementation covers every eligible type; vertices only need to
/// be cheap to clone, comparable, and hashable.
pub trait Node: Clone + Eq + Hash + Ord + Debug + 'static {}
impl<T: Clone + Eq + Hash + Ord + Debug + 'static> Node for T {}

pub mod algebra;
pub mod engine;
pub mod error;
pub mod graph;
pub mod index;
pub mod path;
pub mod service;

pub use crate::engine::{AllPairsEngine, DijkstraEngine, ShortestPathMap, ShortestPathResult};
pub use crate::error::{Error, Result};
pub use crate::graph::{GraphWrapper, ValueGraph, ValueGraphBuilder};
pub use crate::index::PathIndex;
pub use crate::path::{EndpointPair, Path, PathRef, WeightUpdate};
pub use crate::service::{DynamicGraph, DynamicGraphService};
