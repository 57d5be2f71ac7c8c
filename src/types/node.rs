#![allow(dead_code)]
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Parameter map preserving the order keys first appeared in the source
/// text. Re-inserting an existing key overwrites the value but keeps the
/// original position.
pub type ParamMap = IndexMap<String, String>;

/// Parameter that doubles as the strategy's display name.
pub const STRATEGY_NAME_KEY: &str = "StrategyName";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategyNode {
    pub name: String,
    /// Live values, mutated by the editor.
    pub params: ParamMap,
    /// Snapshot taken at parse time or at the last explicit clear. Diffs
    /// compare `params` against this; nothing else writes it.
    pub baseline: ParamMap,
    /// Addressee used when building `SetParam` commands. Derived from the
    /// owning folder if any, recomputed on every selection.
    pub command_target: String,
}

impl StrategyNode {
    pub fn from_params(params: ParamMap) -> Self {
        let name = params
            .get(STRATEGY_NAME_KEY)
            .cloned()
            .unwrap_or_default();
        let baseline = params.clone();
        let command_target = name.clone();
        Self {
            name,
            params,
            baseline,
            command_target,
        }
    }

    /// True when any live value differs from the baseline.
    pub fn is_dirty(&self) -> bool {
        self.params
            .iter()
            .any(|(name, value)| self.baseline.get(name).map(String::as_str).unwrap_or("") != value)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FolderNode {
    pub name: String,
    pub strategies: Vec<StrategyNode>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum Node {
    Folder(FolderNode),
    Strategy(StrategyNode),
}

/// Index-based address of one strategy inside a node tree: `node` indexes
/// the top-level list, `child` the strategy position when the node is a
/// folder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeRef {
    pub node: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub child: Option<usize>,
}

impl NodeRef {
    pub fn top_level(node: usize) -> Self {
        Self { node, child: None }
    }

    pub fn in_folder(node: usize, child: usize) -> Self {
        Self {
            node,
            child: Some(child),
        }
    }
}