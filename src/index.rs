//! The cross-referencing index of locally shortest and shortest paths.
//!
//! Six maps cover the path universe of one graph:
//!
//! * `locally_shortest`: endpoint pair -> set of locally shortest paths;
//! * `shortest`: endpoint pair -> the recorded minimum-weight path;
//! * four extension maps keyed by a sub-path, holding the one-vertex-longer
//!   paths extending it on the left or right, once for locally shortest
//!   members and once restricted to recorded shortest paths.
//!
//! Registration and removal go through this module so the closure property
//! always holds: every indexed path of two or more vertices is registered
//! under both its one-hop-shorter sub-paths, down to the singleton self-paths
//! of its endpoints. Cleanup's breadth-first sweep from a self-path is only
//! complete because of that closure, so [`PathIndex::validate`] can check it
//! structurally instead of trusting it to hold by accident.

use std::sync::Arc;

use fnv::{FnvHashMap, FnvHashSet};

use crate::algebra;
use crate::error::{Error, Result};
use crate::graph::ValueGraph;
use crate::path::{EndpointPair, Path, PathRef};
use crate::Node;

type ExtensionMap<N> = FnvHashMap<PathRef<N>, FnvHashSet<PathRef<N>>>;

/// Per-graph index state. Mutated only by the dynamic service.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PathIndex<N: Node> {
    locally_shortest: FnvHashMap<EndpointPair<N>, FnvHashSet<PathRef<N>>>,
    shortest: FnvHashMap<EndpointPair<N>, PathRef<N>>,
    left_extension_of_locally_shortest: ExtensionMap<N>,
    right_extension_of_locally_shortest: ExtensionMap<N>,
    left_extension_of_shortest: ExtensionMap<N>,
    right_extension_of_shortest: ExtensionMap<N>,
}

impl<N: Node> PathIndex<N> {
    /// An empty index.
    pub fn new() -> Self {
        Self {
            locally_shortest: FnvHashMap::default(),
            shortest: FnvHashMap::default(),
            left_extension_of_locally_shortest: ExtensionMap::default(),
            right_extension_of_locally_shortest: ExtensionMap::default(),
            left_extension_of_shortest: ExtensionMap::default(),
            right_extension_of_shortest: ExtensionMap::default(),
        }
    }

    /// Whether nothing is indexed.
    pub fn is_empty(&self) -> bool {
        self.locally_shortest.is_empty() && self.shortest.is_empty()
    }

    /// The locally shortest paths recorded for `pair`.
    pub fn locally_shortest(&self, pair: &EndpointPair<N>) -> impl Iterator<Item = &PathRef<N>> {
        self.locally_shortest.get(pair).into_iter().flatten()
    }

    /// Every endpoint pair with at least one locally shortest path.
    pub fn pairs(&self) -> impl Iterator<Item = &EndpointPair<N>> {
        self.locally_shortest.keys()
    }

    /// The recorded shortest path for `pair`, if any.
    pub fn shortest(&self, pair: &EndpointPair<N>) -> Option<&PathRef<N>> {
        self.shortest.get(pair)
    }

    /// Whether `path` is recorded as locally shortest.
    pub fn contains_locally_shortest(&self, path: &Path<N>) -> bool {
        self.locally_shortest
            .get(path.endpoints())
            .is_some_and(|set| set.contains(path))
    }

    /// Locally shortest paths extending `sub_path` by one vertex on the left.
    pub fn left_local_extensions(&self, sub_path: &Path<N>) -> impl Iterator<Item = &PathRef<N>> {
        self.left_extension_of_locally_shortest
            .get(sub_path)
            .into_iter()
            .flatten()
    }

    /// Locally shortest paths extending `sub_path` by one vertex on the right.
    pub fn right_local_extensions(&self, sub_path: &Path<N>) -> impl Iterator<Item = &PathRef<N>> {
        self.right_extension_of_locally_shortest
            .get(sub_path)
            .into_iter()
            .flatten()
    }

    /// Recorded shortest paths extending `sub_path` by one vertex on the left.
    pub fn left_shortest_extensions(&self, sub_path: &Path<N>) -> impl Iterator<Item = &PathRef<N>> {
        self.left_extension_of_shortest
            .get(sub_path)
            .into_iter()
            .flatten()
    }

    /// Recorded shortest paths extending `sub_path` by one vertex on the right.
    pub fn right_shortest_extensions(&self, sub_path: &Path<N>) -> impl Iterator<Item = &PathRef<N>> {
        self.right_extension_of_shortest
            .get(sub_path)
            .into_iter()
            .flatten()
    }

    /// Records `path` as locally shortest and registers it under both its
    /// sub-paths, keeping the closure the cleanup sweep depends on.
    ///
    /// Idempotent; trivial paths are never indexed.
    pub fn insert_locally_shortest(&mut self, graph: &ValueGraph<N>, path: PathRef<N>) {
        if path.is_trivial() {
            return;
        }
        self.locally_shortest
            .entry(path.endpoints().clone())
            .or_default()
            .insert(path.clone());
        let right_sub = Arc::new(algebra::right_sub_path(graph, &path));
        let left_sub = Arc::new(algebra::left_sub_path(graph, &path));
        self.left_extension_of_locally_shortest
            .entry(right_sub)
            .or_default()
            .insert(path.clone());
        self.right_extension_of_locally_shortest
            .entry(left_sub)
            .or_default()
            .insert(path);
    }

    /// Records `path` as the shortest path of its endpoints, displacing and
    /// demoting any previously recorded path, and registers it under both its
    /// sub-paths in the shortest-extension maps.
    pub fn promote_shortest(&mut self, graph: &ValueGraph<N>, path: PathRef<N>) {
        debug_assert!(!path.is_trivial(), "self-pairs are never recorded");
        if let Some(previous) = self.shortest.get(path.endpoints()).cloned() {
            if previous == path {
                return;
            }
            self.demote_shortest(graph, &previous);
        }
        self.shortest.insert(path.endpoints().clone(), path.clone());
        let right_sub = Arc::new(algebra::right_sub_path(graph, &path));
        let left_sub = Arc::new(algebra::left_sub_path(graph, &path));
        self.left_extension_of_shortest
            .entry(right_sub)
            .or_default()
            .insert(path.clone());
        self.right_extension_of_shortest
            .entry(left_sub)
            .or_default()
            .insert(path);
    }

    /// Removes every trace of `path`: its locally-shortest membership, its
    /// registrations under its sub-paths, the extension entries keyed by it,
    /// and, when it is the recorded shortest path, that record too.
    pub fn remove(&mut self, graph: &ValueGraph<N>, path: &PathRef<N>) {
        if let Some(set) = self.locally_shortest.get_mut(path.endpoints()) {
            set.remove(path);
            if set.is_empty() {
                self.locally_shortest.remove(path.endpoints());
            }
        }
        let right_sub = algebra::right_sub_path(graph, path);
        let left_sub = algebra::left_sub_path(graph, path);
        Self::unregister(&mut self.left_extension_of_locally_shortest, &right_sub, path);
        Self::unregister(&mut self.right_extension_of_locally_shortest, &left_sub, path);

        if self.shortest.get(path.endpoints()) == Some(path) {
            self.shortest.remove(path.endpoints());
            Self::unregister(&mut self.left_extension_of_shortest, &right_sub, path);
            Self::unregister(&mut self.right_extension_of_shortest, &left_sub, path);
        }

        self.left_extension_of_locally_shortest.remove(&**path);
        self.right_extension_of_locally_shortest.remove(&**path);
        self.left_extension_of_shortest.remove(&**path);
        self.right_extension_of_shortest.remove(&**path);
    }

    /// Drops `path` from the shortest record and the shortest-extension maps,
    /// leaving its locally-shortest standing untouched.
    fn demote_shortest(&mut self, graph: &ValueGraph<N>, path: &PathRef<N>) {
        self.shortest.remove(path.endpoints());
        let right_sub = algebra::right_sub_path(graph, path);
        let left_sub = algebra::left_sub_path(graph, path);
        Self::unregister(&mut self.left_extension_of_shortest, &right_sub, path);
        Self::unregister(&mut self.right_extension_of_shortest, &left_sub, path);
    }

    fn unregister(map: &mut ExtensionMap<N>, key: &Path<N>, member: &PathRef<N>) {
        if let Some(set) = map.get_mut(key) {
            set.remove(member);
            if set.is_empty() {
                map.remove(key);
            }
        }
    }

    /// Checks every structural invariant of the index against `graph`.
    ///
    /// Meant for tests and debugging sweeps; cost is proportional to the
    /// number of indexed paths.
    pub fn validate(&self, graph: &ValueGraph<N>) -> Result<()> {
        for (pair, set) in &self.locally_shortest {
            if set.is_empty() {
                return Err(violation(format!("empty locally-shortest set for {pair:?}")));
            }
            for path in set {
                if path.len() < 2 {
                    return Err(violation(format!("trivial path indexed for {pair:?}")));
                }
                if path.endpoints() != pair {
                    return Err(violation(format!("path {path:?} filed under {pair:?}")));
                }
                let distinct: FnvHashSet<&N> = path.chain().iter().collect();
                if distinct.len() != path.len() {
                    return Err(violation(format!("non-simple chain {:?}", path.chain())));
                }
                if algebra::weight(graph, path).is_none() {
                    return Err(violation(format!("dead edge under {:?}", path.chain())));
                }
                let right_sub = algebra::right_sub_path(graph, path);
                let left_sub = algebra::left_sub_path(graph, path);
                if !self
                    .left_extension_of_locally_shortest
                    .get(&right_sub)
                    .is_some_and(|ext| ext.contains(path))
                {
                    return Err(violation(format!(
                        "{:?} not registered as left extension of its right sub-path",
                        path.chain(),
                    )));
                }
                if !self
                    .right_extension_of_locally_shortest
                    .get(&left_sub)
                    .is_some_and(|ext| ext.contains(path))
                {
                    return Err(violation(format!(
                        "{:?} not registered as right extension of its left sub-path",
                        path.chain(),
                    )));
                }
            }
        }

        for (pair, path) in &self.shortest {
            let Some(set) = self.locally_shortest.get(pair) else {
                return Err(violation(format!("shortest path of {pair:?} has no locally-shortest set")));
            };
            if !set.contains(path) {
                return Err(violation(format!("shortest path of {pair:?} is not locally shortest")));
            }
            let weight = algebra::weight(graph, path);
            let minimum = set.iter().filter_map(|p| algebra::weight(graph, p)).min();
            if weight.is_none() || weight != minimum {
                return Err(violation(format!(
                    "shortest path of {pair:?} weighs {weight:?}, set minimum is {minimum:?}",
                )));
            }
        }

        self.validate_extensions(graph, &self.left_extension_of_locally_shortest, Side::Left, false)?;
        self.validate_extensions(graph, &self.right_extension_of_locally_shortest, Side::Right, false)?;
        self.validate_extensions(graph, &self.left_extension_of_shortest, Side::Left, true)?;
        self.validate_extensions(graph, &self.right_extension_of_shortest, Side::Right, true)?;
        Ok(())
    }

    fn validate_extensions(
        &self,
        graph: &ValueGraph<N>,
        map: &ExtensionMap<N>,
        side: Side,
        shortest_only: bool,
    ) -> Result<()> {
        for (key, set) in map {
            if set.is_empty() {
                return Err(violation(format!("empty extension set keyed by {:?}", key.chain())));
            }
            for path in set {
                let sub = match side {
                    Side::Left => algebra::right_sub_path(graph, path),
                    Side::Right => algebra::left_sub_path(graph, path),
                };
                if sub != **key {
                    return Err(violation(format!(
                        "{:?} keyed by {:?} but its sub-path is {:?}",
                        path.chain(),
                        key.chain(),
                        sub.chain(),
                    )));
                }
                if !self.contains_locally_shortest(path) {
                    return Err(violation(format!(
                        "extension {:?} is not locally shortest",
                        path.chain(),
                    )));
                }
                if shortest_only && self.shortest.get(path.endpoints()) != Some(path) {
                    return Err(violation(format!(
                        "extension {:?} is not the recorded shortest path",
                        path.chain(),
                    )));
                }
            }
        }
        Ok(())
    }
}

#[derive(Clone, Copy)]
enum Side {
    Left,
    Right,
}

fn violation(detail: String) -> Error {
    Error::InvariantViolation(detail)
}
