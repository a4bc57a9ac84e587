//! Stateless path algebra: sub-path derivation, weight recomputation, and
//! one-vertex extension.
//!
//! Everything here is a pure function of a graph and a path. The dynamic
//! service leans on two boundary rules:
//!
//! * the one-hop-shorter sub-path of a two-vertex path is the singleton
//!   self-path of the remaining end, which lets the extension lattice bottom
//!   out at self-pairs instead of a special case, and
//! * weights are always re-summed from current edge values, never read from a
//!   field, so a recorded path can never report a stale number.

use smallvec::SmallVec;

use crate::graph::ValueGraph;
use crate::path::{Chain, EndpointPair, Path};
use crate::{Distance, Node};

/// The endpoint pair for `source` and `target` honoring the graph's
/// directedness.
pub fn vertex_pair<N: Node>(source: &N, target: &N, graph: &ValueGraph<N>) -> EndpointPair<N> {
    EndpointPair::of(source.clone(), target.clone(), graph.is_directed())
}

/// The path without its first vertex.
///
/// For a two-vertex path this is the self-path of the target.
pub fn right_sub_path<N: Node>(graph: &ValueGraph<N>, path: &Path<N>) -> Path<N> {
    debug_assert!(path.len() >= 2, "sub-paths exist only for real walks");
    if path.len() == 2 {
        return Path::self_path(path.last().clone(), graph.is_directed());
    }
    let chain: Chain<N> = path.chain()[1..].iter().cloned().collect();
    let endpoints = vertex_pair(&chain[0], &chain[chain.len() - 1], graph);
    Path::new(endpoints, chain)
}

/// The path without its last vertex.
///
/// For a two-vertex path this is the self-path of the source.
pub fn left_sub_path<N: Node>(graph: &ValueGraph<N>, path: &Path<N>) -> Path<N> {
    debug_assert!(path.len() >= 2, "sub-paths exist only for real walks");
    if path.len() == 2 {
        return Path::self_path(path.first().clone(), graph.is_directed());
    }
    let chain: Chain<N> = path.chain()[..path.len() - 1].iter().cloned().collect();
    let endpoints = vertex_pair(&chain[0], &chain[chain.len() - 1], graph);
    Path::new(endpoints, chain)
}

/// The weight of `path` re-summed from current edge values.
///
/// Trivial paths weigh zero. `None` means a traversed edge no longer exists,
/// which a consistent index never exposes to callers.
#[inline]
pub fn weight<N: Node>(graph: &ValueGraph<N>, path: &Path<N>) -> Option<Distance> {
    path.chain()
        .windows(2)
        .map(|step| graph.edge_value(&step[0], &step[1]).map(Distance::from))
        .sum()
}

/// The path extended by `node` on the front; the caller accounts for the new
/// edge's weight.
pub fn add_as_first<N: Node>(graph: &ValueGraph<N>, node: &N, path: &Path<N>) -> Path<N> {
    let mut chain: Chain<N> = SmallVec::with_capacity(path.len() + 1);
    chain.push(node.clone());
    chain.extend(path.chain().iter().cloned());
    let endpoints = vertex_pair(node, path.last(), graph);
    Path::new(endpoints, chain)
}

/// The path extended by `node` on the back; the caller accounts for the new
/// edge's weight.
pub fn add_as_last<N: Node>(graph: &ValueGraph<N>, node: &N, path: &Path<N>) -> Path<N> {
    let mut chain: Chain<N> = SmallVec::with_capacity(path.len() + 1);
    chain.extend(path.chain().iter().cloned());
    chain.push(node.clone());
    let endpoints = vertex_pair(path.first(), node, graph);
    Path::new(endpoints, chain)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::ValueGraphBuilder;

    fn chain_graph() -> ValueGraph<&'static str> {
        let mut graph = ValueGraphBuilder::directed().expected_node_count(3).build();
        graph.put_edge_value("a", "b", 3);
        graph.put_edge_value("b", "c", 2);
        graph
    }

    fn path_abc(graph: &ValueGraph<&'static str>) -> Path<&'static str> {
        Path::new(
            vertex_pair(&"a", &"c", graph),
            ["a", "b", "c"].into_iter().collect(),
        )
    }

    #[test]
    fn sub_paths_drop_one_end() {
        let graph = chain_graph();
        let abc = path_abc(&graph);
        assert_eq!(right_sub_path(&graph, &abc).chain(), ["b", "c"]);
        assert_eq!(left_sub_path(&graph, &abc).chain(), ["a", "b"]);
    }

    #[test]
    fn two_vertex_sub_paths_are_self_paths() {
        let graph = chain_graph();
        let ab = Path::edge("a", "b", true);
        let right = right_sub_path(&graph, &ab);
        assert!(right.is_trivial());
        assert_eq!(right.first(), &"b");
        let left = left_sub_path(&graph, &ab);
        assert!(left.is_trivial());
        assert_eq!(left.first(), &"a");
    }

    #[test]
    fn weight_resums_current_edge_values() {
        let mut graph = chain_graph();
        let abc = path_abc(&graph);
        assert_eq!(weight(&graph, &abc), Some(5));
        graph.put_edge_value("a", "b", 10);
        assert_eq!(weight(&graph, &abc), Some(12));
    }

    #[test]
    fn weight_of_trivial_path_is_zero() {
        let graph = chain_graph();
        assert_eq!(weight(&graph, &Path::self_path("a", true)), Some(0));
    }

    #[test]
    fn weight_is_none_when_an_edge_is_gone() {
        let mut graph = chain_graph();
        let abc = path_abc(&graph);
        graph.remove_edge(&"b", &"c");
        assert_eq!(weight(&graph, &abc), None);
    }

    #[test]
    fn extension_builds_new_endpoints() {
        let graph = chain_graph();
        let bc = Path::edge("b", "c", true);
        let abc = add_as_first(&graph, &"a", &bc);
        assert_eq!(abc.chain(), ["a", "b", "c"]);
        assert_eq!(abc.endpoints(), &vertex_pair(&"a", &"c", &graph));
        let ab = Path::edge("a", "b", true);
        let abc = add_as_last(&graph, &"c", &ab);
        assert_eq!(abc.chain(), ["a", "b", "c"]);
        assert_eq!(abc.endpoints(), &vertex_pair(&"a", &"c", &graph));
    }
}
