//! Randomized cross-checks of the incremental index against the static
//! engine, which recomputes everything from scratch and serves as the oracle.

use incremental_apsp::{
    AllPairsEngine, DijkstraEngine, DynamicGraph, DynamicGraphService, EndpointPair, GraphWrapper,
    ValueGraph, ValueGraphBuilder, WeightUpdate, NO_EDGE,
};
use itertools::iproduct;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

type Node = u32;

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

fn empty_graph(nodes: &[Node]) -> ValueGraph<Node> {
    let mut graph = ValueGraphBuilder::directed()
        .expected_node_count(nodes.len())
        .build();
    for &node in nodes {
        graph.add_node(node);
    }
    graph
}

fn random_weight(rng: &mut StdRng) -> u32 {
    if rng.gen_bool(0.15) {
        NO_EDGE
    } else {
        rng.gen_range(1..=10)
    }
}

fn random_update(rng: &mut StdRng, nodes: &[Node]) -> WeightUpdate<Node> {
    let node = nodes[rng.gen_range(0..nodes.len())];
    let mut incoming = Vec::new();
    let mut outgoing = Vec::new();
    for &other in nodes {
        if other == node {
            continue;
        }
        if rng.gen_bool(0.3) {
            incoming.push((other, random_weight(rng)));
        }
        if rng.gen_bool(0.3) {
            outgoing.push((other, random_weight(rng)));
        }
    }
    WeightUpdate::new(node, incoming, outgoing)
}

/// Every ordered pair must agree with a from-scratch recomputation, and every
/// reported chain must re-sum to the reported distance.
fn assert_matches_oracle(service: &DynamicGraphService, dg: &DynamicGraph<Node>, nodes: &[Node]) {
    let oracle = DijkstraEngine.all_pairs(dg.graph());
    for (&src, &dst) in iproduct!(nodes, nodes) {
        if src == dst {
            continue;
        }
        let expected = oracle
            .get(&EndpointPair::ordered(src, dst))
            .map(|found| found.weight);
        let distance = service.distance(dg, &src, &dst);
        assert_eq!(
            distance, expected,
            "distance {src} -> {dst} disagrees with the oracle"
        );
        match service.path(dg, &src, &dst) {
            None => assert_eq!(expected, None),
            Some(chain) => {
                assert_eq!(chain.first(), Some(&src));
                assert_eq!(chain.last(), Some(&dst));
                let resummed: u64 = chain
                    .windows(2)
                    .map(|step| {
                        u64::from(
                            dg.graph()
                                .edge_value(&step[0], &step[1])
                                .expect("reported path crosses a live edge"),
                        )
                    })
                    .sum();
                assert_eq!(Some(resummed), distance, "stale weight on {src} -> {dst}");
            }
        }
    }
}

#[test]
fn random_update_sequences_match_the_oracle() {
    init_tracing();
    let nodes: Vec<Node> = (0..8).collect();
    let service = DynamicGraphService::new();
    let mut rng = StdRng::seed_from_u64(0x5eed);
    let mut dg = DynamicGraph::new(GraphWrapper::new("random", empty_graph(&nodes)));

    for round in 0..30 {
        let update = random_update(&mut rng, &nodes);
        service.update(&mut dg, &update).unwrap();
        dg.index()
            .validate(dg.graph())
            .unwrap_or_else(|violation| panic!("round {round}: {violation}"));
        assert_matches_oracle(&service, &dg, &nodes);
    }
}

#[test]
fn a_denser_graph_with_more_rounds_still_agrees() {
    let nodes: Vec<Node> = (0..6).collect();
    let service = DynamicGraphService::new();
    let mut rng = StdRng::seed_from_u64(42);
    let mut dg = DynamicGraph::new(GraphWrapper::new("dense", empty_graph(&nodes)));

    for _ in 0..60 {
        let update = random_update(&mut rng, &nodes);
        service.update(&mut dg, &update).unwrap();
    }
    dg.index().validate(dg.graph()).unwrap();
    assert_matches_oracle(&service, &dg, &nodes);
}

fn random_graph(rng: &mut StdRng, nodes: &[Node], probability: f64) -> ValueGraph<Node> {
    let mut graph = empty_graph(nodes);
    for (&src, &dst) in iproduct!(nodes, nodes) {
        if src != dst && rng.gen_bool(probability) {
            graph.put_edge_value(src, dst, rng.gen_range(1..=10));
        }
    }
    graph
}

#[test]
fn cold_init_matches_the_oracle() {
    let nodes: Vec<Node> = (0..8).collect();
    let service = DynamicGraphService::new();
    let mut rng = StdRng::seed_from_u64(7);
    let graph = random_graph(&mut rng, &nodes, 0.35);

    let dg = service.init(GraphWrapper::new("cold", graph)).unwrap();
    dg.index().validate(dg.graph()).unwrap();
    assert_matches_oracle(&service, &dg, &nodes);
}

#[test]
fn init_is_idempotent() {
    let nodes: Vec<Node> = (0..7).collect();
    let service = DynamicGraphService::new();
    let mut rng = StdRng::seed_from_u64(11);
    let graph = random_graph(&mut rng, &nodes, 0.3);

    let first = service.init(GraphWrapper::new("one", graph.clone())).unwrap();
    let second = service.init(GraphWrapper::new("two", graph)).unwrap();
    assert_eq!(first.index(), second.index());
}

#[test]
fn init_then_updates_behaves_like_updates_alone() {
    let nodes: Vec<Node> = (0..7).collect();
    let service = DynamicGraphService::new();
    let mut rng = StdRng::seed_from_u64(13);
    let graph = random_graph(&mut rng, &nodes, 0.3);

    let mut dg = service.init(GraphWrapper::new("warm", graph)).unwrap();
    for _ in 0..20 {
        let update = random_update(&mut rng, &nodes);
        service.update(&mut dg, &update).unwrap();
        dg.index().validate(dg.graph()).unwrap();
    }
    assert_matches_oracle(&service, &dg, &nodes);
}

/// Isolating one vertex cannot change any answer whose path avoided that
/// vertex. Edge weights are distinct powers of two, so every path weight is
/// unique and the snapshot comparison is exact.
#[test]
fn invalidation_is_local_to_paths_through_the_vertex() {
    let nodes: Vec<Node> = (0..7).collect();
    let edges: &[(Node, Node)] = &[
        (0, 1),
        (1, 2),
        (2, 3),
        (3, 4),
        (4, 5),
        (5, 6),
        (6, 0),
        (0, 3),
        (3, 6),
        (1, 4),
        (4, 0),
        (2, 5),
        (5, 1),
        (2, 0),
        (6, 2),
    ];
    let mut graph = empty_graph(&nodes);
    for (position, &(src, dst)) in edges.iter().enumerate() {
        graph.put_edge_value(src, dst, 1 << position);
    }
    let service = DynamicGraphService::new();
    let mut dg = service.init(GraphWrapper::new("local", graph)).unwrap();

    let victim: Node = 3;
    let snapshot: Vec<(Node, Node, Option<Vec<Node>>, Option<u64>)> = iproduct!(&nodes, &nodes)
        .filter(|(&src, &dst)| src != dst)
        .map(|(&src, &dst)| {
            (
                src,
                dst,
                service.path(&dg, &src, &dst),
                service.distance(&dg, &src, &dst),
            )
        })
        .collect();

    // Disconnect the victim entirely: the harshest possible weight increase.
    let incoming: Vec<(Node, u32)> = nodes
        .iter()
        .filter(|&&other| dg.graph().has_edge(&other, &victim))
        .map(|&other| (other, NO_EDGE))
        .collect();
    let outgoing: Vec<(Node, u32)> = nodes
        .iter()
        .filter(|&&other| dg.graph().has_edge(&victim, &other))
        .map(|&other| (other, NO_EDGE))
        .collect();
    service
        .update(&mut dg, &WeightUpdate::new(victim, incoming, outgoing))
        .unwrap();
    dg.index().validate(dg.graph()).unwrap();

    for (src, dst, path, distance) in snapshot {
        let Some(chain) = path else { continue };
        if chain.contains(&victim) {
            continue;
        }
        assert_eq!(
            service.path(&dg, &src, &dst),
            Some(chain),
            "{src} -> {dst} avoided the updated vertex but changed"
        );
        assert_eq!(service.distance(&dg, &src, &dst), distance);
    }
    assert_matches_oracle(&service, &dg, &nodes);
}
