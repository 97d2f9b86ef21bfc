// SPDX-License-Identifier: MIT

//! Graph builder and compile-time validation
//!
//! Every definition fault is reported by [`GraphBuilder::compile`] or by the
//! `add_*` call that introduced it, never during a run.

use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::sync::Arc;

use super::executor::CompiledGraph;
use super::types::{Edge, DEFAULT_STEP_LIMIT, END};
use crate::adk::error::GraphError;
use crate::inbox::store::CheckpointStore;
use crate::inbox::workflow::node::Node;
use crate::inbox::workflow::router::Router;

#[derive(Default)]
pub struct GraphBuilder {
    nodes: HashMap<String, Arc<dyn Node>>,
    /// Registration order, kept for deterministic validation messages
    order: Vec<String>,
    edges: HashMap<String, Edge>,
    entry: Option<String>,
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_node(
        &mut self,
        name: impl Into<String>,
        node: Arc<dyn Node>,
    ) -> Result<&mut Self, GraphError> {
        let name = name.into();
        if name == END {
            return Err(GraphError::ReservedName(name));
        }
        if self.nodes.contains_key(&name) {
            return Err(GraphError::DuplicateNode(name));
        }
        self.order.push(name.clone());
        self.nodes.insert(name, node);
        Ok(self)
    }

    /// Unconditional edge `from -> to`. `to` may be [`END`].
    pub fn add_edge(
        &mut self,
        from: impl Into<String>,
        to: impl Into<String>,
    ) -> Result<&mut Self, GraphError> {
        self.insert_edge(from.into(), Edge::Direct(to.into()))
    }

    /// Route out of `from` with `router`; `targets` maps each router label
    /// to a node name or [`END`].
    pub fn add_conditional_edges<I, L, T>(
        &mut self,
        from: impl Into<String>,
        router: Arc<dyn Router>,
        targets: I,
    ) -> Result<&mut Self, GraphError>
    where
        I: IntoIterator<Item = (L, T)>,
        L: Into<String>,
        T: Into<String>,
    {
        let targets: BTreeMap<String, String> = targets
            .into_iter()
            .map(|(label, target)| (label.into(), target.into()))
            .collect();
        self.insert_edge(from.into(), Edge::Conditional { router, targets })
    }

    pub fn set_entry_point(&mut self, name: impl Into<String>) -> Result<&mut Self, GraphError> {
        if let Some(existing) = &self.entry {
            return Err(GraphError::DuplicateEntryPoint(existing.clone()));
        }
        self.entry = Some(name.into());
        Ok(self)
    }

    fn insert_edge(&mut self, from: String, edge: Edge) -> Result<&mut Self, GraphError> {
        if self.edges.contains_key(&from) {
            return Err(GraphError::DuplicateEdge(from));
        }
        self.edges.insert(from, edge);
        Ok(self)
    }

    fn validate(&self) -> Result<String, GraphError> {
        let entry = self.entry.clone().ok_or(GraphError::MissingEntryPoint)?;
        if !self.nodes.contains_key(&entry) {
            return Err(GraphError::UnknownNode(entry));
        }

        for from in self.edges.keys() {
            if !self.nodes.contains_key(from) {
                return Err(GraphError::UnknownNode(from.clone()));
            }
        }

        for name in &self.order {
            let edge = self
                .edges
                .get(name)
                .ok_or_else(|| GraphError::MissingEdge(name.clone()))?;

            if let Edge::Conditional { router, targets } = edge {
                for label in router.labels() {
                    if !targets.contains_key(&label) {
                        return Err(GraphError::UnmappedRoute {
                            node: name.clone(),
                            label,
                        });
                    }
                }
            }
            for target in edge.targets() {
                if target != END && !self.nodes.contains_key(target) {
                    return Err(GraphError::UnknownNode(target.to_string()));
                }
            }
        }

        // Forward reachability from the entry point
        let mut reachable: HashSet<&str> = HashSet::new();
        let mut queue = VecDeque::from([entry.as_str()]);
        while let Some(name) = queue.pop_front() {
            if name == END || !reachable.insert(name) {
                continue;
            }
            if let Some(edge) = self.edges.get(name) {
                queue.extend(edge.targets());
            }
        }
        if let Some(orphan) = self.order.iter().find(|n| !reachable.contains(n.as_str())) {
            return Err(GraphError::Unreachable(orphan.clone()));
        }

        // Backward reachability from END
        let mut reverse: HashMap<&str, Vec<&str>> = HashMap::new();
        for (from, edge) in &self.edges {
            for target in edge.targets() {
                reverse.entry(target).or_default().push(from.as_str());
            }
        }
        let mut finishing: HashSet<&str> = HashSet::new();
        let mut queue = VecDeque::from([END]);
        while let Some(name) = queue.pop_front() {
            if !finishing.insert(name) {
                continue;
            }
            if let Some(sources) = reverse.get(name) {
                queue.extend(sources.iter().copied());
            }
        }
        if let Some(stuck) = self.order.iter().find(|n| !finishing.contains(n.as_str())) {
            return Err(GraphError::NoPathToEnd(stuck.clone()));
        }

        Ok(entry)
    }

    /// Validate the definition and bind it to a checkpoint store
    pub fn compile(
        self,
        checkpoints: Arc<dyn CheckpointStore>,
    ) -> Result<CompiledGraph, GraphError> {
        let entry = self.validate()?;
        log::info!(
            "Compiled graph with {} nodes, entry point '{}'",
            self.nodes.len(),
            entry
        );
        Ok(CompiledGraph::new(
            self.nodes,
            self.edges,
            entry,
            checkpoints,
            DEFAULT_STEP_LIMIT,
        ))
    }
}
