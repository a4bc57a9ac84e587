//! Value types of the path universe: endpoint pairs, paths, weight updates.
//!
//! A [`Path`] is identified by its endpoints and vertex chain alone. Weight is
//! deliberately not part of the type: paths live as keys and set members in the
//! index, and edge weights change underneath them, so a path's weight is
//! recomputed from the graph every time it is needed (see [`crate::algebra`]).

use std::sync::Arc;

use fnv::FnvHashMap;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::{Node, Weight};

/// The vertex chain of a path; inline for the short chains that dominate.
pub type Chain<N> = SmallVec<[N; 8]>;

/// A shared, immutable path handle, as stored throughout the index.
pub type PathRef<N> = Arc<Path<N>>;

/// A source/destination query key.
///
/// Ordered on directed graphs. On undirected graphs the two ends are
/// normalized so that `(a, b)` and `(b, a)` are the same key.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EndpointPair<N: Node> {
    source: N,
    target: N,
    ordered: bool,
}

impl<N: Node> EndpointPair<N> {
    /// An ordered pair, for directed graphs.
    pub fn ordered(source: N, target: N) -> Self {
        Self { source, target, ordered: true }
    }

    /// An unordered pair, for undirected graphs; the ends are normalized.
    pub fn unordered(a: N, b: N) -> Self {
        let (source, target) = if a <= b { (a, b) } else { (b, a) };
        Self { source, target, ordered: false }
    }

    /// The pair matching the directedness flag.
    pub fn of(source: N, target: N, directed: bool) -> Self {
        if directed {
            Self::ordered(source, target)
        } else {
            Self::unordered(source, target)
        }
    }

    /// The source end (the lesser end, if unordered).
    pub fn source(&self) -> &N {
        &self.source
    }

    /// The target end (the greater end, if unordered).
    pub fn target(&self) -> &N {
        &self.target
    }

    /// Whether the pair distinguishes direction.
    pub fn is_ordered(&self) -> bool {
        self.ordered
    }

    /// Whether both ends are the same vertex.
    pub fn is_self_pair(&self) -> bool {
        self.source == self.target
    }
}

/// An immutable walk through the graph.
///
/// Identity is `(endpoints, chain)`; two paths over the same vertices are the
/// same path no matter what the edges currently weigh.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Path<N: Node> {
    endpoints: EndpointPair<N>,
    chain: Chain<N>,
}

impl<N: Node> Path<N> {
    /// A path over `chain` keyed by `endpoints`.
    pub fn new(endpoints: EndpointPair<N>, chain: Chain<N>) -> Self {
        debug_assert!(!chain.is_empty(), "a path must visit at least one vertex");
        debug_assert!(
            !endpoints.is_ordered()
                || (chain.first() == Some(endpoints.source())
                    && chain.last() == Some(endpoints.target())),
            "endpoints must match the chain ends",
        );
        Self { endpoints, chain }
    }

    /// The singleton path of one vertex; the boundary case of the extension
    /// lattice, used as a traversal root and extension key but never indexed.
    pub fn self_path(node: N, directed: bool) -> Self {
        let endpoints = EndpointPair::of(node.clone(), node.clone(), directed);
        Self { endpoints, chain: std::iter::once(node).collect() }
    }

    /// The two-vertex path over a single edge.
    pub fn edge(source: N, target: N, directed: bool) -> Self {
        let endpoints = EndpointPair::of(source.clone(), target.clone(), directed);
        Self { endpoints, chain: [source, target].into_iter().collect() }
    }

    /// The query key of this path.
    pub fn endpoints(&self) -> &EndpointPair<N> {
        &self.endpoints
    }

    /// The vertices visited, in walk order.
    pub fn chain(&self) -> &[N] {
        &self.chain
    }

    /// The first vertex of the walk.
    pub fn first(&self) -> &N {
        &self.chain[0]
    }

    /// The last vertex of the walk.
    pub fn last(&self) -> &N {
        &self.chain[self.chain.len() - 1]
    }

    /// Number of vertices visited.
    pub fn len(&self) -> usize {
        self.chain.len()
    }

    /// Whether this is a singleton self-path rather than a real walk.
    pub fn is_trivial(&self) -> bool {
        self.chain.len() < 2
    }

    /// Whether the walk visits `node`.
    pub fn contains(&self, node: &N) -> bool {
        self.chain.contains(node)
    }

    /// Whether the walk crosses the edge from `source` to `target`.
    pub fn contains_edge(&self, source: &N, target: &N) -> bool {
        self.chain
            .windows(2)
            .any(|step| &step[0] == source && &step[1] == target)
    }

    /// The chain as an owned `Vec`.
    pub fn to_vec(&self) -> Vec<N> {
        self.chain.to_vec()
    }
}

/// An atomic batch of weight changes for the edges incident to one vertex.
///
/// `incoming` re-weights edges from the named predecessors into the target
/// vertex, `outgoing` re-weights edges from the target vertex to the named
/// successors. A weight of [`crate::NO_EDGE`] removes the edge.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeightUpdate<N: Node> {
    node: N,
    incoming: FnvHashMap<N, Weight>,
    outgoing: FnvHashMap<N, Weight>,
}

impl<N: Node> WeightUpdate<N> {
    /// A batch targeting `node`.
    pub fn new(
        node: N,
        incoming: impl IntoIterator<Item = (N, Weight)>,
        outgoing: impl IntoIterator<Item = (N, Weight)>,
    ) -> Self {
        Self {
            node,
            incoming: incoming.into_iter().collect(),
            outgoing: outgoing.into_iter().collect(),
        }
    }

    /// The vertex whose incident edges change.
    pub fn node(&self) -> &N {
        &self.node
    }

    /// Predecessor re-weightings: edges into the target vertex.
    pub fn incoming(&self) -> &FnvHashMap<N, Weight> {
        &self.incoming
    }

    /// Successor re-weightings: edges out of the target vertex.
    pub fn outgoing(&self) -> &FnvHashMap<N, Weight> {
        &self.outgoing
    }
}
