#![allow(dead_code)]
use tracing::info;

use super::parser::{parse, ParseOutcome};
use crate::types::{Node, NodeRef, StrategyNode};

/// Owns the node tree and parameter catalogue for exactly one parsed
/// document. Re-parsing replaces the whole store; there is no merging.
#[derive(Debug, Default)]
pub struct NodeStore {
    nodes: Vec<Node>,
    catalogue: Vec<String>,
}

impl NodeStore {
    pub fn new(outcome: ParseOutcome) -> Self {
        Self {
            nodes: outcome.nodes,
            catalogue: outcome.catalogue,
        }
    }

    pub fn from_text(text: &str) -> Self {
        Self::new(parse(text))
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub(crate) fn nodes_mut(&mut self) -> &mut [Node] {
        &mut self.nodes
    }

    pub fn catalogue(&self) -> &[String] {
        &self.catalogue
    }

    pub fn strategy(&self, node_ref: NodeRef) -> Option<&StrategyNode> {
        match (self.nodes.get(node_ref.node)?, node_ref.child) {
            (Node::Folder(folder), Some(child)) => folder.strategies.get(child),
            (Node::Strategy(strategy), None) => Some(strategy),
            _ => None,
        }
    }

    pub fn strategy_mut(&mut self, node_ref: NodeRef) -> Option<&mut StrategyNode> {
        match (self.nodes.get_mut(node_ref.node)?, node_ref.child) {
            (Node::Folder(folder), Some(child)) => folder.strategies.get_mut(child),
            (Node::Strategy(strategy), None) => Some(strategy),
            _ => None,
        }
    }

    pub fn get_param(&self, node_ref: NodeRef, name: &str) -> Option<&str> {
        self.strategy(node_ref)?.params.get(name).map(String::as_str)
    }

    /// Set a live parameter value. The baseline is untouched. Returns false
    /// when `node_ref` does not address a strategy.
    pub fn set_param(&mut self, node_ref: NodeRef, name: &str, value: &str) -> bool {
        match self.strategy_mut(node_ref) {
            Some(strategy) => {
                strategy.params.insert(name.to_string(), value.to_string());
                true
            }
            None => false,
        }
    }

    /// Re-snapshot one strategy's baseline from its live values, so it no
    /// longer diffs. Returns false when `node_ref` is not a strategy.
    pub fn reset_baseline(&mut self, node_ref: NodeRef) -> bool {
        match self.strategy_mut(node_ref) {
            Some(strategy) => {
                strategy.baseline = strategy.params.clone();
                true
            }
            None => false,
        }
    }

    /// The "clear changes" operation: re-snapshot every strategy in the
    /// tree.
    pub fn clear_changes(&mut self) {
        let mut count = 0usize;
        for node in &mut self.nodes {
            match node {
                Node::Folder(folder) => {
                    for strategy in &mut folder.strategies {
                        strategy.baseline = strategy.params.clone();
                        count += 1;
                    }
                }
                Node::Strategy(strategy) => {
                    strategy.baseline = strategy.params.clone();
                    count += 1;
                }
            }
        }
        info!("cleared pending changes across {} strategies", count);
    }

    pub fn strategy_count(&self) -> usize {
        self.nodes
            .iter()
            .map(|node| match node {
                Node::Folder(folder) => folder.strategies.len(),
                Node::Strategy(_) => 1,
            })
            .sum()
    }

    pub fn folder_count(&self) -> usize {
        self.nodes
            .iter()
            .filter(|node| matches!(node, Node::Folder(_)))
            .count()
    }
}
