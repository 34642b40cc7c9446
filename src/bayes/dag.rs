use std::collections::BTreeSet;
use std::fmt;

use crate::error::{MlError, Result};

/// Directed acyclic graph over named nodes. Every mutation keeps it acyclic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dag {
    nodes: Vec<String>,
    parents: Vec<BTreeSet<usize>>,
}

impl Dag {
    /// Graph with the given nodes and no edges
    pub fn empty<S: AsRef<str>>(nodes: &[S]) -> Self {
        Dag {
            nodes: nodes.iter().map(|n| n.as_ref().to_string()).collect(),
            parents: vec![BTreeSet::new(); nodes.len()],
        }
    }

    /// Graph from named edges; every endpoint must be one of `nodes`
    pub fn from_edges<S: AsRef<str>>(nodes: &[S], edges: &[(&str, &str)]) -> Result<Self> {
        let mut dag = Self::empty(nodes);
        for (from, to) in edges {
            let u = dag.require(from)?;
            let v = dag.require(to)?;
            dag.add_edge(u, v)?;
        }
        Ok(dag)
    }

    fn require(&self, name: &str) -> Result<usize> {
        self.node_index(name)
            .ok_or_else(|| MlError::invalid_parameter("edge", format!("unknown node '{}'", name)))
    }

    pub fn nodes(&self) -> &[String] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node_index(&self, name: &str) -> Option<usize> {
        self.nodes.iter().position(|n| n == name)
    }

    pub fn name(&self, node: usize) -> &str {
        &self.nodes[node]
    }

    pub fn parents(&self, node: usize) -> &BTreeSet<usize> {
        &self.parents[node]
    }

    pub fn children(&self, node: usize) -> impl Iterator<Item = usize> + '_ {
        (0..self.nodes.len()).filter(move |&v| self.parents[v].contains(&node))
    }

    pub fn has_edge(&self, from: usize, to: usize) -> bool {
        self.parents.get(to).map_or(false, |p| p.contains(&from))
    }

    /// All edges `(from, to)` ordered by target, then source
    pub fn edges(&self) -> Vec<(usize, usize)> {
        self.parents
            .iter()
            .enumerate()
            .flat_map(|(to, ps)| ps.iter().map(move |&from| (from, to)))
            .collect()
    }

    pub fn edge_count(&self) -> usize {
        self.parents.iter().map(BTreeSet::len).sum()
    }

    /// Edges by node name
    pub fn named_edges(&self) -> Vec<(String, String)> {
        self.edges()
            .into_iter()
            .map(|(u, v)| (self.nodes[u].clone(), self.nodes[v].clone()))
            .collect()
    }

    /// Whether a directed path leads from `from` to `to` (a node reaches itself)
    pub fn has_path(&self, from: usize, to: usize) -> bool {
        let mut seen = vec![false; self.nodes.len()];
        let mut stack = vec![from];
        while let Some(node) = stack.pop() {
            if node == to {
                return true;
            }
            if std::mem::replace(&mut seen[node], true) {
                continue;
            }
            stack.extend(self.children(node).filter(|&c| !seen[c]));
        }
        false
    }

    /// Whether adding `from -> to` would close a cycle
    pub fn would_create_cycle(&self, from: usize, to: usize) -> bool {
        from == to || self.has_path(to, from)
    }

    pub fn add_edge(&mut self, from: usize, to: usize) -> Result<()> {
        if from >= self.nodes.len() || to >= self.nodes.len() {
            return Err(MlError::invalid_parameter("edge", "node index out of range"));
        }
        if self.would_create_cycle(from, to) {
            return Err(MlError::invalid_parameter(
                "edge",
                format!("{} -> {} would create a cycle", self.nodes[from], self.nodes[to]),
            ));
        }
        self.parents[to].insert(from);
        Ok(())
    }

    pub fn remove_edge(&mut self, from: usize, to: usize) -> bool {
        self.parents.get_mut(to).map_or(false, |p| p.remove(&from))
    }

    /// Replace `from -> to` with `to -> from`. The graph is unchanged on error.
    pub fn reverse_edge(&mut self, from: usize, to: usize) -> Result<()> {
        if !self.remove_edge(from, to) {
            return Err(MlError::invalid_parameter("edge", "cannot reverse a missing edge"));
        }
        if let Err(err) = self.add_edge(to, from) {
            self.parents[to].insert(from);
            return Err(err);
        }
        Ok(())
    }

    pub fn in_degree(&self, node: usize) -> usize {
        self.parents[node].len()
    }

    /// Nodes ordered so that every parent precedes its children
    pub fn topological_order(&self) -> Vec<usize> {
        let mut remaining: Vec<usize> = self.parents.iter().map(BTreeSet::len).collect();
        let mut ready: Vec<usize> = (0..self.nodes.len()).filter(|&v| remaining[v] == 0).rev().collect();
        let mut order = Vec::with_capacity(self.nodes.len());
        while let Some(node) = ready.pop() {
            order.push(node);
            for child in self.children(node) {
                remaining[child] -= 1;
                if remaining[child] == 0 {
                    ready.push(child);
                }
            }
        }
        order
    }

    pub fn is_acyclic(&self) -> bool {
        self.topological_order().len() == self.nodes.len()
    }
}

impl fmt::Display for Dag {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let edges: Vec<String> = self
            .named_edges()
            .into_iter()
            .map(|(u, v)| format!("('{}', '{}')", u, v))
            .collect();
        write!(f, "[{}]", edges.join(", "))
    }
}
