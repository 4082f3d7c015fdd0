//! Dependency graph for fragments
//!
//! Edges run from a depended-upon fragment to the fragment that includes it.
//! Every local include directive adds its own edge, so a fragment including
//! the same dependency twice has two parallel edges and an indegree of two;
//! the sort decrements once per edge, which leaves the final order intact.
//! Uses petgraph for storage, with node indices equal to declaration order.

use std::collections::{HashMap, VecDeque};
use std::path::Path;

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use thiserror::Error;
use tracing::debug;

use super::fragment::{Fragment, FragmentId};
use super::include::IncludeScanner;

#[derive(Debug, Error, PartialEq)]
pub enum GraphError {
    #[error("{fragment}:{line}: local include \"{target}\" resolves to {resolved}, which is not a declared fragment")]
    UnresolvedInclude {
        fragment: String,
        line: usize,
        target: String,
        resolved: String,
    },

    #[error("Fragment declared more than once: {0}")]
    DuplicateFragment(String),

    #[error("Cyclic dependency detected among fragments: {}", .blocked.join(", "))]
    CycleDetected {
        /// Fragments left unsorted, in declaration order
        blocked: Vec<String>,
    },
}

/// Edge payload: the include directive that created the edge
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IncludeSite {
    /// 1-based line of the directive in the dependent fragment
    pub line: usize,
}

/// A dependency graph over declared fragments
#[derive(Debug, Default)]
pub struct DependencyGraph {
    /// Node weights are declared paths
    graph: DiGraph<String, IncludeSite>,

    /// Local include references per fragment, indexed by [`FragmentId`]
    indegree: Vec<usize>,
}

impl DependencyGraph {
    /// Creates an empty dependency graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the graph for a declared fragment list
    pub fn build(fragments: &[Fragment], scanner: &IncludeScanner<'_>) -> Result<Self, GraphError> {
        let mut graph = Self::new();
        let mut by_path: HashMap<&Path, FragmentId> = HashMap::with_capacity(fragments.len());

        // First pass: one node per fragment, in declaration order
        for fragment in fragments {
            if by_path.insert(fragment.path(), fragment.id()).is_some() {
                return Err(GraphError::DuplicateFragment(fragment.declared().to_string()));
            }
            graph.add_fragment(fragment.declared());
        }

        // Second pass: one edge per local include reference
        for fragment in fragments {
            for include in scanner.extract(fragment) {
                let Some(resolved) = include.local_path() else {
                    continue;
                };

                let dependency = by_path.get(resolved).copied().ok_or_else(|| {
                    GraphError::UnresolvedInclude {
                        fragment: fragment.declared().to_string(),
                        line: include.line,
                        target: include.target.clone(),
                        resolved: resolved.display().to_string(),
                    }
                })?;

                debug!(
                    dependency = %graph.name(dependency),
                    dependent = fragment.declared(),
                    line = include.line,
                    "adding dependency edge"
                );
                graph.add_dependency(fragment.id(), dependency, IncludeSite { line: include.line });
            }
        }

        Ok(graph)
    }

    /// Adds a fragment node, returning its id
    pub fn add_fragment(&mut self, name: impl Into<String>) -> FragmentId {
        let idx = self.graph.add_node(name.into());
        self.indegree.push(0);
        FragmentId::new(idx.index())
    }

    /// Adds a dependency edge: `dependent` includes `dependency`
    ///
    /// The edge direction is: dependency -> dependent
    pub fn add_dependency(&mut self, dependent: FragmentId, dependency: FragmentId, site: IncludeSite) {
        self.graph.add_edge(node(dependency), node(dependent), site);
        self.indegree[dependent.index()] += 1;
    }

    /// Declared path of a fragment
    pub fn name(&self, id: FragmentId) -> &str {
        &self.graph[node(id)]
    }

    /// Number of local include references in the fragment
    pub fn indegree(&self, id: FragmentId) -> usize {
        self.indegree[id.index()]
    }

    /// Fragments that include `id`, one entry per edge, in the order the
    /// edges were added
    pub fn dependents(&self, id: FragmentId) -> Vec<FragmentId> {
        self.neighbors_in_order(id, Direction::Outgoing)
    }

    /// Distinct fragments that `id` includes, in include order
    pub fn dependencies(&self, id: FragmentId) -> Vec<FragmentId> {
        let mut dependencies = self.neighbors_in_order(id, Direction::Incoming);
        let mut seen = vec![false; self.len()];
        dependencies.retain(|dep| !std::mem::replace(&mut seen[dep.index()], true));
        dependencies
    }

    // petgraph walks a node's edge list newest-first; edge indices are
    // assigned in insertion order, so sorting by them restores it.
    fn neighbors_in_order(&self, id: FragmentId, direction: Direction) -> Vec<FragmentId> {
        let mut edges: Vec<_> = self
            .graph
            .edges_directed(node(id), direction)
            .map(|edge| {
                let other = match direction {
                    Direction::Outgoing => edge.target(),
                    Direction::Incoming => edge.source(),
                };
                (edge.id(), other)
            })
            .collect();
        edges.sort_unstable_by_key(|(edge, _)| *edge);
        edges.into_iter().map(|(_, other)| FragmentId::new(other.index())).collect()
    }

    /// Returns all fragments in topological order (dependencies before
    /// dependents), using Kahn's algorithm.
    ///
    /// The queue is seeded with every fragment of indegree zero in
    /// declaration order and is strictly FIFO, so ties are broken by
    /// declaration order and then by the order fragments became ready.
    pub fn topological_order(&self) -> Result<Vec<FragmentId>, GraphError> {
        let mut indegree = self.indegree.clone();
        let mut queue: VecDeque<FragmentId> = (0..self.len())
            .map(FragmentId::new)
            .filter(|id| indegree[id.index()] == 0)
            .collect();

        debug!(ready = queue.len(), total = self.len(), "seeded topological sort");

        let mut order = Vec::with_capacity(self.len());
        while let Some(id) = queue.pop_front() {
            order.push(id);

            for dependent in self.dependents(id) {
                let remaining = &mut indegree[dependent.index()];
                *remaining -= 1;
                if *remaining == 0 {
                    queue.push_back(dependent);
                }
            }
        }

        if order.len() < self.len() {
            let blocked = (0..self.len())
                .map(FragmentId::new)
                .filter(|id| indegree[id.index()] > 0)
                .map(|id| self.name(id).to_string())
                .collect();
            return Err(GraphError::CycleDetected { blocked });
        }

        Ok(order)
    }

    /// Returns the number of fragments in the graph
    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    /// Returns true if the graph is empty
    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    /// Returns the total number of dependency edges
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }
}

fn node(id: FragmentId) -> NodeIndex {
    NodeIndex::new(id.index())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{FragmentSource, MemorySource};
    use proptest::prelude::*;

    fn site(line: usize) -> IncludeSite {
        IncludeSite { line }
    }

    fn names(graph: &DependencyGraph, order: &[FragmentId]) -> Vec<String> {
        order.iter().map(|id| graph.name(*id).to_string()).collect()
    }

    fn load(source: &MemorySource, paths: &[&str]) -> Vec<Fragment> {
        paths
            .iter()
            .enumerate()
            .map(|(i, path)| {
                let text = source.read_to_string(Path::new(path)).unwrap();
                Fragment::new(FragmentId::new(i), *path, *path, &text)
            })
            .collect()
    }

    #[test]
    fn empty_graph() {
        let graph = DependencyGraph::new();
        assert!(graph.is_empty());
        assert_eq!(graph.len(), 0);
        assert_eq!(graph.topological_order().unwrap(), vec![]);
    }

    #[test]
    fn add_dependency() {
        let mut graph = DependencyGraph::new();
        let value = graph.add_fragment("Value.hpp");
        let activation = graph.add_fragment("Activation.hpp");

        graph.add_dependency(activation, value, site(3));

        assert_eq!(graph.dependencies(activation), vec![value]);
        assert_eq!(graph.dependents(value), vec![activation]);
        assert_eq!(graph.indegree(activation), 1);
        assert_eq!(graph.indegree(value), 0);
    }

    #[test]
    fn dependency_declared_after_dependent() {
        let mut graph = DependencyGraph::new();
        let activation = graph.add_fragment("Activation.hpp");
        let value = graph.add_fragment("Value.hpp");
        graph.add_dependency(activation, value, site(1));

        let order = graph.topological_order().unwrap();
        assert_eq!(names(&graph, &order), vec!["Value.hpp", "Activation.hpp"]);
    }

    #[test]
    fn ties_break_by_declaration_order() {
        // Layer -> Neuron -> {Tensor, Value}
        let mut graph = DependencyGraph::new();
        let layer = graph.add_fragment("Layer.hpp");
        let neuron = graph.add_fragment("Neuron.hpp");
        let tensor = graph.add_fragment("Tensor.hpp");
        let value = graph.add_fragment("Value.hpp");
        graph.add_dependency(layer, neuron, site(1));
        graph.add_dependency(neuron, tensor, site(1));
        graph.add_dependency(neuron, value, site(2));

        let order = graph.topological_order().unwrap();
        assert_eq!(
            names(&graph, &order),
            vec!["Tensor.hpp", "Value.hpp", "Neuron.hpp", "Layer.hpp"]
        );
    }

    #[test]
    fn ready_fragments_queue_fifo() {
        // a and b are roots; c depends on b, d depends on a.
        // b's dependent becomes ready after a's, but a is dequeued first.
        let mut graph = DependencyGraph::new();
        let c = graph.add_fragment("c");
        let d = graph.add_fragment("d");
        let b = graph.add_fragment("b");
        let a = graph.add_fragment("a");
        graph.add_dependency(c, b, site(1));
        graph.add_dependency(d, a, site(1));

        let order = graph.topological_order().unwrap();
        assert_eq!(names(&graph, &order), vec!["b", "a", "c", "d"]);
    }

    #[test]
    fn duplicate_include_counts_twice() {
        let mut graph = DependencyGraph::new();
        let value = graph.add_fragment("Value.hpp");
        let neuron = graph.add_fragment("Neuron.hpp");
        graph.add_dependency(neuron, value, site(2));
        graph.add_dependency(neuron, value, site(7));

        // Raw indegree counts references, not distinct dependencies
        assert_eq!(graph.indegree(neuron), 2);
        assert_eq!(graph.edge_count(), 2);
        assert_eq!(graph.dependents(value), vec![neuron, neuron]);
        assert_eq!(graph.dependencies(neuron), vec![value]);

        let order = graph.topological_order().unwrap();
        assert_eq!(order, vec![value, neuron]);
    }

    #[test]
    fn two_fragment_cycle() {
        let mut graph = DependencyGraph::new();
        let a = graph.add_fragment("A.hpp");
        let b = graph.add_fragment("B.hpp");
        graph.add_dependency(a, b, site(1));
        graph.add_dependency(b, a, site(1));

        let result = graph.topological_order();
        assert_eq!(
            result,
            Err(GraphError::CycleDetected {
                blocked: vec!["A.hpp".to_string(), "B.hpp".to_string()]
            })
        );
    }

    #[test]
    fn self_include_is_a_cycle() {
        let mut graph = DependencyGraph::new();
        let a = graph.add_fragment("A.hpp");
        graph.add_dependency(a, a, site(1));

        assert!(matches!(graph.topological_order(), Err(GraphError::CycleDetected { .. })));
    }

    #[test]
    fn cycle_reports_downstream_fragments() {
        let mut graph = DependencyGraph::new();
        let root = graph.add_fragment("root");
        let a = graph.add_fragment("a");
        let b = graph.add_fragment("b");
        let tail = graph.add_fragment("tail");
        graph.add_dependency(a, root, site(1));
        graph.add_dependency(a, b, site(2));
        graph.add_dependency(b, a, site(1));
        graph.add_dependency(tail, b, site(1));

        let err = graph.topological_order().unwrap_err();
        assert_eq!(
            err,
            GraphError::CycleDetected {
                blocked: vec!["a".to_string(), "b".to_string(), "tail".to_string()]
            }
        );
        assert!(err.to_string().contains("Cyclic dependency detected"));
    }

    #[test]
    fn build_from_fragments() {
        let source = MemorySource::new()
            .with_file("Value.hpp", "#pragma once\n#include <cmath>\n")
            .with_file("Activation.hpp", "#include \"Value.hpp\"\n");
        let fragments = load(&source, &["Value.hpp", "Activation.hpp"]);
        let scanner = IncludeScanner::new(&source, "");

        let graph = DependencyGraph::build(&fragments, &scanner).unwrap();

        assert_eq!(graph.len(), 2);
        assert_eq!(graph.edge_count(), 1);
        assert_eq!(graph.dependencies(FragmentId::new(1)), vec![FragmentId::new(0)]);
    }

    #[test]
    fn build_rejects_undeclared_local_include() {
        let source = MemorySource::new()
            .with_file("Tensor.hpp", "")
            .with_file("Neuron.hpp", "#include <vector>\n#include \"Tensor.hpp\"\n");
        let fragments = load(&source, &["Neuron.hpp"]);
        let scanner = IncludeScanner::new(&source, "");

        let err = DependencyGraph::build(&fragments, &scanner).unwrap_err();
        assert_eq!(
            err,
            GraphError::UnresolvedInclude {
                fragment: "Neuron.hpp".to_string(),
                line: 2,
                target: "Tensor.hpp".to_string(),
                resolved: "Tensor.hpp".to_string(),
            }
        );
    }

    #[test]
    fn build_rejects_duplicate_declaration() {
        let source = MemorySource::new().with_file("include/Value.hpp", "");
        let fragments = vec![
            Fragment::new(FragmentId::new(0), "Value.hpp", "include/Value.hpp", ""),
            Fragment::new(FragmentId::new(1), "./Value.hpp", "include/./Value.hpp", ""),
        ];
        let scanner = IncludeScanner::new(&source, "");

        let err = DependencyGraph::build(&fragments, &scanner).unwrap_err();
        assert_eq!(err, GraphError::DuplicateFragment("./Value.hpp".to_string()));
    }

    /// A random DAG: edges only run from lower to higher rank
    fn dag() -> impl Strategy<Value = (usize, Vec<(usize, usize)>)> {
        (1usize..12)
            .prop_flat_map(|n| {
                (
                    Just(n),
                    Just((0..n).collect::<Vec<_>>()).prop_shuffle(),
                    prop::collection::vec((0..n, 0..n), 0..30),
                )
            })
            .prop_map(|(n, rank, pairs)| {
                let edges = pairs
                    .into_iter()
                    .filter(|(dependency, dependent)| rank[*dependency] < rank[*dependent])
                    .collect();
                (n, edges)
            })
    }

    fn graph_of(n: usize, edges: &[(usize, usize)]) -> DependencyGraph {
        let mut graph = DependencyGraph::new();
        for i in 0..n {
            graph.add_fragment(format!("f{i}.hpp"));
        }
        for (dependency, dependent) in edges {
            graph.add_dependency(FragmentId::new(*dependent), FragmentId::new(*dependency), site(1));
        }
        graph
    }

    proptest! {
        #[test]
        fn order_respects_every_edge((n, edges) in dag()) {
            let graph = graph_of(n, &edges);
            let order = graph.topological_order().unwrap();

            prop_assert_eq!(order.len(), n);
            let mut position = vec![usize::MAX; n];
            for (pos, id) in order.iter().enumerate() {
                position[id.index()] = pos;
            }
            for (dependency, dependent) in &edges {
                prop_assert!(position[*dependency] < position[*dependent]);
            }
        }

        #[test]
        fn order_is_deterministic((n, edges) in dag()) {
            let first = graph_of(n, &edges).topological_order().unwrap();
            let second = graph_of(n, &edges).topological_order().unwrap();
            prop_assert_eq!(first, second);
        }
    }
}
