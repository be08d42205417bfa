//! Whole-collection module dependency graph.
//!
//! Where [`dependency_closure`](super::dependency_closure) answers "what does this
//! one module need", [`ExtensionGraph`] builds every edge of a collection at once
//! so the CLI can report cycles and missing modules, print an enable order and
//! draw trees.

use anyhow::{Result, anyhow};
use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::{HashMap, HashSet};

use crate::entity::Collection;

/// Color states for cycle detection using DFS.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Color {
    /// Node has not been visited.
    White,
    /// Node is currently being visited (in the DFS stack).
    Gray,
    /// Node has been fully visited.
    Black,
}

/// Directed graph of machine names, an edge `a → b` meaning "a depends on b".
///
/// Dependencies missing from the collection still become nodes, so they show
/// up in trees; [`ExtensionGraph::missing`] lists them.
pub struct ExtensionGraph {
    graph: DiGraph<String, ()>,
    node_map: HashMap<String, NodeIndex>,
    known: HashSet<String>,
}

impl ExtensionGraph {
    fn new() -> Self {
        Self {
            graph: DiGraph::new(),
            node_map: HashMap::new(),
            known: HashSet::new(),
        }
    }

    /// Build the graph from every entity of a collection and its declared dependencies.
    pub fn from_collection(collection: &Collection) -> Self {
        let mut graph = Self::new();

        for entity in collection {
            let Some(id) = entity.id() else {
                continue;
            };
            graph.known.insert(id.to_string());
            graph.ensure_node(id);

            for dependency in entity.dependencies() {
                graph.add_dependency(id, &dependency);
            }
        }

        graph
    }

    fn ensure_node(&mut self, name: &str) -> NodeIndex {
        if let Some(&index) = self.node_map.get(name) {
            index
        } else {
            let index = self.graph.add_node(name.to_string());
            self.node_map.insert(name.to_string(), index);
            index
        }
    }

    fn add_dependency(&mut self, from: &str, to: &str) {
        let from_idx = self.ensure_node(from);
        let to_idx = self.ensure_node(to);

        if !self.graph.contains_edge(from_idx, to_idx) {
            self.graph.add_edge(from_idx, to_idx, ());
        }
    }

    fn detect_cycles(&self) -> Result<()> {
        match self.find_cycle() {
            Some(cycle) => Err(anyhow!("Circular dependency detected: {}", cycle.join(" → "))),
            None => Ok(()),
        }
    }

    /// The first cycle found by a depth-first walk, first and last element equal.
    pub fn find_cycle(&self) -> Option<Vec<String>> {
        let mut colors: HashMap<NodeIndex, Color> =
            self.graph.node_indices().map(|node| (node, Color::White)).collect();
        let mut path = Vec::new();

        for node in self.graph.node_indices() {
            if matches!(colors.get(&node), Some(Color::White))
                && let Some(cycle) = self.dfs_visit(node, &mut colors, &mut path)
            {
                return Some(cycle);
            }
        }

        None
    }

    fn dfs_visit(
        &self,
        node: NodeIndex,
        colors: &mut HashMap<NodeIndex, Color>,
        path: &mut Vec<NodeIndex>,
    ) -> Option<Vec<String>> {
        colors.insert(node, Color::Gray);
        path.push(node);

        for neighbor in self.ordered_neighbors(node) {
            match colors.get(&neighbor) {
                Some(Color::Gray) => {
                    let start = path.iter().position(|n| *n == neighbor).unwrap_or_default();
                    let mut cycle: Vec<String> =
                        path[start..].iter().map(|idx| self.graph[*idx].clone()).collect();
                    cycle.push(self.graph[neighbor].clone());
                    return Some(cycle);
                }
                Some(Color::White) => {
                    if let Some(cycle) = self.dfs_visit(neighbor, colors, path) {
                        return Some(cycle);
                    }
                }
                _ => {}
            }
        }

        path.pop();
        colors.insert(node, Color::Black);
        None
    }

    /// Enable order: every module after all of its dependencies.
    ///
    /// Fails when the graph has a cycle, naming it.
    pub fn topological_order(&self) -> Result<Vec<String>> {
        self.detect_cycles()?;

        let indices = toposort(&self.graph, None)
            .map_err(|_| anyhow!("Failed to determine module enable order"))?;
        Ok(indices.into_iter().rev().map(|idx| self.graph[idx].clone()).collect())
    }

    /// Enable order of `name` and everything it depends on, dependencies first.
    ///
    /// Fails when the module graph has a cycle.
    pub fn enable_order(&self, name: &str, closure: &[String]) -> Result<Vec<String>> {
        let members: HashSet<&str> =
            closure.iter().map(String::as_str).chain(std::iter::once(name)).collect();
        Ok(self
            .topological_order()?
            .into_iter()
            .filter(|id| members.contains(id.as_str()))
            .collect())
    }

    fn direct_dependencies(&self, name: &str) -> Vec<String> {
        self.node_map
            .get(name)
            .map(|&idx| {
                self.ordered_neighbors(idx).into_iter().map(|n| self.graph[n].clone()).collect()
            })
            .unwrap_or_default()
    }

    /// Dependencies that are referenced but absent from the collection, sorted.
    pub fn missing(&self) -> Vec<String> {
        let mut missing: Vec<String> = self
            .graph
            .node_weights()
            .filter(|name| !self.known.contains(*name))
            .cloned()
            .collect();
        missing.sort();
        missing
    }

    /// Draw the dependency tree below `root`.
    pub fn to_tree_string(&self, root: &str) -> String {
        let mut result = String::new();
        let mut visited = HashSet::new();
        self.build_tree_string(root, &mut result, "", true, &mut visited);
        result
    }

    fn build_tree_string(
        &self,
        name: &str,
        result: &mut String,
        prefix: &str,
        is_last: bool,
        visited: &mut HashSet<String>,
    ) {
        let connector = if is_last {
            "└── "
        } else {
            "├── "
        };
        let marker = if self.known.contains(name) {
            ""
        } else {
            " (missing)"
        };
        result.push_str(&format!("{prefix}{connector}{name}{marker}\n"));

        let child_prefix = if is_last {
            format!("{prefix}    ")
        } else {
            format!("{prefix}│   ")
        };

        if !visited.insert(name.to_string()) {
            result.push_str(&format!("{child_prefix}└── (circular reference)\n"));
            return;
        }

        let deps = self.direct_dependencies(name);
        for (i, dep) in deps.iter().enumerate() {
            self.build_tree_string(dep, result, &child_prefix, i == deps.len() - 1, visited);
        }

        visited.remove(name);
    }

    // petgraph yields neighbors most recently added first
    fn ordered_neighbors(&self, node: NodeIndex) -> Vec<NodeIndex> {
        let mut neighbors: Vec<NodeIndex> = self.graph.neighbors(node).collect();
        neighbors.reverse();
        neighbors
    }
}
