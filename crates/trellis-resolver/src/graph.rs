//! Resolved dependency graph construction and traversal.

use std::collections::{HashMap, HashSet};
use std::fmt;

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;

use crate::container::{PackageContainer, PackageContainerConstraint};
use crate::resolver::Resolution;
use crate::version_set::VersionSetSpecifier;

/// A node in the resolved dependency graph.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct ResolvedNode {
    pub name: String,
    pub version: String,
}

impl ResolvedNode {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
        }
    }
}

impl fmt::Display for ResolvedNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} v{}", self.name, self.version)
    }
}

/// Edge label: the requirement the dependent declared.
#[derive(Debug, Clone)]
pub struct DepEdge {
    pub requirement: VersionSetSpecifier,
}

/// A resolved dependency graph backed by petgraph.
pub struct DependencyGraph {
    graph: DiGraph<ResolvedNode, DepEdge>,
    /// Lookup from package name to node index.
    index: HashMap<String, NodeIndex>,
    pub root: Option<NodeIndex>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self {
            graph: DiGraph::new(),
            index: HashMap::new(),
            root: None,
        }
    }

    /// Build the graph of a finished resolution under a root package whose
    /// top-level requirements are `constraints`.
    pub fn from_resolution<C: PackageContainer>(
        root: ResolvedNode,
        constraints: &[PackageContainerConstraint<C::Identifier>],
        resolution: &Resolution<C>,
    ) -> Self {
        let mut graph = Self::new();
        let root = graph.add_root(root);

        for package in &resolution.packages {
            graph.add_node(ResolvedNode::new(
                package.identifier().to_string(),
                package.version.to_string(),
            ));
        }
        for constraint in constraints {
            if let Some(to) = graph.find(&constraint.identifier().to_string()) {
                graph.add_edge(
                    root,
                    to,
                    DepEdge {
                        requirement: constraint.requirement().clone(),
                    },
                );
            }
        }
        for package in &resolution.packages {
            let Some(from) = graph.find(&package.identifier().to_string()) else {
                continue;
            };
            for constraint in package.dependencies() {
                if let Some(to) = graph.find(&constraint.identifier().to_string()) {
                    graph.add_edge(
                        from,
                        to,
                        DepEdge {
                            requirement: constraint.requirement().clone(),
                        },
                    );
                }
            }
        }
        graph
    }

    /// Add or retrieve a node. If the name already exists, returns the existing index.
    pub fn add_node(&mut self, node: ResolvedNode) -> NodeIndex {
        if let Some(&idx) = self.index.get(&node.name) {
            return idx;
        }
        let name = node.name.clone();
        let idx = self.graph.add_node(node);
        self.index.insert(name, idx);
        idx
    }

    /// Add the root node (the project itself).
    ///
    /// The root is kept out of the name index, so a resolved package sharing
    /// the project's name gets a node of its own.
    pub fn add_root(&mut self, node: ResolvedNode) -> NodeIndex {
        let idx = self.graph.add_node(node);
        self.root = Some(idx);
        idx
    }

    /// Add a dependency edge from `from` to `to`.
    pub fn add_edge(&mut self, from: NodeIndex, to: NodeIndex, edge: DepEdge) {
        if !self.graph.edges(from).any(|e| e.target() == to) {
            self.graph.add_edge(from, to, edge);
        }
    }

    /// Look up a node by package name.
    pub fn find(&self, name: &str) -> Option<NodeIndex> {
        self.index.get(name).copied()
    }

    pub fn node(&self, idx: NodeIndex) -> &ResolvedNode {
        &self.graph[idx]
    }

    /// All resolved nodes (excluding root).
    pub fn all_nodes(&self) -> Vec<&ResolvedNode> {
        self.graph
            .node_indices()
            .filter(|&idx| Some(idx) != self.root)
            .map(|idx| &self.graph[idx])
            .collect()
    }

    /// Direct dependencies of a node.
    pub fn dependencies_of(&self, idx: NodeIndex) -> Vec<(NodeIndex, &DepEdge)> {
        let mut deps: Vec<_> = self
            .graph
            .edges_directed(idx, Direction::Outgoing)
            .map(|e| (e.target(), e.weight()))
            .collect();
        deps.sort_by(|a, b| self.graph[a.0].name.cmp(&self.graph[b.0].name));
        deps
    }

    /// Reverse dependencies (who depends on this node).
    pub fn dependents_of(&self, idx: NodeIndex) -> Vec<(NodeIndex, &DepEdge)> {
        let mut deps: Vec<_> = self
            .graph
            .edges_directed(idx, Direction::Incoming)
            .map(|e| (e.source(), e.weight()))
            .collect();
        deps.sort_by(|a, b| self.graph[a.0].name.cmp(&self.graph[b.0].name));
        deps
    }

    /// Print the dependency tree to a string.
    ///
    /// Packages already shown higher up the current branch are printed once
    /// more and not expanded, so cycles terminate.
    pub fn print_tree(&self, max_depth: Option<usize>) -> String {
        let mut output = String::new();
        let Some(root) = self.root else {
            return output;
        };

        output.push_str(&format!("{}\n", self.graph[root]));

        let mut visited = HashSet::new();
        visited.insert(root);
        let deps = self.dependencies_of(root);
        let count = deps.len();
        for (i, (idx, _)) in deps.iter().enumerate() {
            self.print_subtree(&mut output, *idx, "", i == count - 1, 1, max_depth, &mut visited);
        }
        output
    }

    #[allow(clippy::too_many_arguments)]
    fn print_subtree(
        &self,
        output: &mut String,
        idx: NodeIndex,
        prefix: &str,
        is_last: bool,
        depth: usize,
        max_depth: Option<usize>,
        visited: &mut HashSet<NodeIndex>,
    ) {
        let connector = if is_last { "└── " } else { "├── " };
        let node = &self.graph[idx];
        output.push_str(&format!("{prefix}{connector}{node}\n"));

        if let Some(max) = max_depth {
            if depth >= max {
                return;
            }
        }

        if !visited.insert(idx) {
            return;
        }

        let child_prefix = format!("{prefix}{}", if is_last { "    " } else { "│   " });
        let deps = self.dependencies_of(idx);
        let count = deps.len();
        for (i, (child, _)) in deps.iter().enumerate() {
            self.print_subtree(
                output,
                *child,
                &child_prefix,
                i == count - 1,
                depth + 1,
                max_depth,
                visited,
            );
        }

        visited.remove(&idx);
    }

    /// Find the path from root to a package.
    pub fn find_path(&self, name: &str) -> Option<Vec<&ResolvedNode>> {
        let root = self.root?;
        let target = self.find(name)?;
        let mut path = Vec::new();
        let mut visited = HashSet::new();
        if self.dfs_path(root, target, &mut path, &mut visited) {
            Some(path.iter().map(|&idx| &self.graph[idx]).collect())
        } else {
            None
        }
    }

    fn dfs_path(
        &self,
        current: NodeIndex,
        target: NodeIndex,
        path: &mut Vec<NodeIndex>,
        visited: &mut HashSet<NodeIndex>,
    ) -> bool {
        path.push(current);
        if current == target {
            return true;
        }
        if !visited.insert(current) {
            path.pop();
            return false;
        }
        for (child, _) in self.dependencies_of(current) {
            if self.dfs_path(child, target, path, visited) {
                return true;
            }
        }
        path.pop();
        false
    }

    /// Inverted tree for one package: who requires it, and with what requirement.
    pub fn print_inverted_tree(&self, name: &str) -> String {
        let mut output = String::new();
        let Some(idx) = self.find(name) else {
            return output;
        };

        output.push_str(&format!("{}\n", self.graph[idx]));

        let mut visited = HashSet::new();
        visited.insert(idx);

        let dependents = self.dependents_of(idx);
        let count = dependents.len();
        for (i, (dep_idx, edge)) in dependents.iter().enumerate() {
            self.print_inverted_subtree(
                &mut output,
                *dep_idx,
                &edge.requirement,
                "",
                i == count - 1,
                &mut visited,
            );
        }
        output
    }

    fn print_inverted_subtree(
        &self,
        output: &mut String,
        idx: NodeIndex,
        requirement: &VersionSetSpecifier,
        prefix: &str,
        is_last: bool,
        visited: &mut HashSet<NodeIndex>,
    ) {
        let connector = if is_last { "└── " } else { "├── " };
        let node = &self.graph[idx];
        output.push_str(&format!("{prefix}{connector}{node} (requires {requirement})\n"));

        if !visited.insert(idx) {
            return;
        }

        let child_prefix = format!("{prefix}{}", if is_last { "    " } else { "│   " });
        let dependents = self.dependents_of(idx);
        let count = dependents.len();
        for (i, (dep_idx, edge)) in dependents.iter().enumerate() {
            self.print_inverted_subtree(
                output,
                *dep_idx,
                &edge.requirement,
                &child_prefix,
                i == count - 1,
                visited,
            );
        }

        visited.remove(&idx);
    }

    /// Number of nodes (excluding root).
    pub fn len(&self) -> usize {
        let total = self.graph.node_count();
        if self.root.is_some() {
            total.saturating_sub(1)
        } else {
            total
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for DependencyGraph {
    fn default() -> Self {
        Self::new()
    }
}
