use serde::{Deserialize, Serialize};

use super::store::NodeStore;
use crate::types::{FolderNode, Node, NodeRef, StrategyNode};

/// What part of the tree a selection covers. Indices address the top-level
/// node list; out-of-range or wrong-variant indices yield no rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "scope", rename_all = "snake_case")]
pub enum Scope {
    AllStrategies,
    Folder { node: usize },
    StrategyInFolder { node: usize, strategy: usize },
    TopLevelStrategy { node: usize },
}

/// Parameter-name filter applied to a selection. Matching is exact and
/// case-sensitive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamFilter {
    All,
    Named(String),
}

impl ParamFilter {
    pub fn from_option(name: Option<String>) -> Self {
        match name {
            Some(name) => ParamFilter::Named(name),
            None => ParamFilter::All,
        }
    }

    fn matches(&self, name: &str) -> bool {
        match self {
            ParamFilter::All => true,
            ParamFilter::Named(wanted) => wanted == name,
        }
    }
}

/// Flat projection of one parameter of one strategy, as shown in the
/// editor table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Row {
    pub node: NodeRef,
    pub strategy_name: String,
    pub param_name: String,
    pub value: String,
}

/// Project the scoped part of the tree into rows. As a deliberate side
/// effect, every strategy the scope touches gets its `command_target`
/// recomputed: folder members take the folder's name, top-level strategies
/// their own. Downstream commands address whatever the last selection
/// derived.
pub fn select_rows(store: &mut NodeStore, scope: &Scope, filter: &ParamFilter) -> Vec<Row> {
    let mut rows = Vec::new();
    let nodes = store.nodes_mut();

    match *scope {
        Scope::AllStrategies => {
            for (index, node) in nodes.iter_mut().enumerate() {
                match node {
                    Node::Folder(folder) => folder_rows(folder, index, filter, &mut rows),
                    Node::Strategy(strategy) => top_level_rows(strategy, index, filter, &mut rows),
                }
            }
        }
        Scope::Folder { node } => {
            if let Some(Node::Folder(folder)) = nodes.get_mut(node) {
                folder_rows(folder, node, filter, &mut rows);
            }
        }
        Scope::StrategyInFolder { node, strategy } => {
            if let Some(Node::Folder(folder)) = nodes.get_mut(node) {
                let target = folder.name.clone();
                if let Some(member) = folder.strategies.get_mut(strategy) {
                    member.command_target = target;
                    strategy_rows(member, NodeRef::in_folder(node, strategy), filter, &mut rows);
                }
            }
        }
        Scope::TopLevelStrategy { node } => {
            if let Some(Node::Strategy(strategy)) = nodes.get_mut(node) {
                top_level_rows(strategy, node, filter, &mut rows);
            }
        }
    }

    rows
}

fn folder_rows(folder: &mut FolderNode, node_index: usize, filter: &ParamFilter, rows: &mut Vec<Row>) {
    let target = folder.name.clone();
    for (child, strategy) in folder.strategies.iter_mut().enumerate() {
        strategy.command_target = target.clone();
        strategy_rows(strategy, NodeRef::in_folder(node_index, child), filter, rows);
    }
}

fn top_level_rows(strategy: &mut StrategyNode, node_index: usize, filter: &ParamFilter, rows: &mut Vec<Row>) {
    strategy.command_target = strategy.name.clone();
    strategy_rows(strategy, NodeRef::top_level(node_index), filter, rows);
}

fn strategy_rows(strategy: &StrategyNode, node_ref: NodeRef, filter: &ParamFilter, rows: &mut Vec<Row>) {
    for (name, value) in &strategy.params {
        if filter.matches(name) {
            rows.push(Row {
                node: node_ref,
                strategy_name: strategy.name.clone(),
                param_name: name.clone(),
                value: value.clone(),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_store() -> NodeStore {
        NodeStore::from_text(
            "#Begin_Folder F1\n\
             ##Begin_Strategy\nStrategyName=S1\nAutoBuy=0\n##End_Strategy\n\
             ##Begin_Strategy\nStrategyName=S2\nAutoBuy=1\nRisk=3\n##End_Strategy\n\
             #End_Folder\n\
             ##Begin_Strategy\nStrategyName=Solo\nRisk=5\n##End_Strategy",
        )
    }

    #[test]
    fn test_all_strategies_rows() {
        let mut store = sample_store();
        let rows = select_rows(&mut store, &Scope::AllStrategies, &ParamFilter::All);

        // S1: 2 params, S2: 3 params, Solo: 2 params.
        assert_eq!(rows.len(), 7);
        assert_eq!(rows[0].strategy_name, "S1");
        assert_eq!(rows[0].param_name, "StrategyName");
        assert_eq!(rows[6].strategy_name, "Solo");
    }

    #[test]
    fn test_param_filter() {
        let mut store = sample_store();
        let rows = select_rows(
            &mut store,
            &Scope::AllStrategies,
            &ParamFilter::Named("Risk".to_string()),
        );

        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|row| row.param_name == "Risk"));
    }

    #[test]
    fn test_filter_is_case_sensitive() {
        let mut store = sample_store();
        let rows = select_rows(
            &mut store,
            &Scope::AllStrategies,
            &ParamFilter::Named("risk".to_string()),
        );
        assert!(rows.is_empty());
    }

    #[test]
    fn test_folder_scope_sets_folder_target() {
        let mut store = sample_store();
        select_rows(&mut store, &Scope::Folder { node: 0 }, &ParamFilter::All);

        assert_eq!(store.strategy(NodeRef::in_folder(0, 0)).unwrap().command_target, "F1");
        assert_eq!(store.strategy(NodeRef::in_folder(0, 1)).unwrap().command_target, "F1");
    }

    #[test]
    fn test_folder_member_selected_individually_keeps_folder_target() {
        let mut store = sample_store();
        let rows = select_rows(
            &mut store,
            &Scope::StrategyInFolder { node: 0, strategy: 1 },
            &ParamFilter::All,
        );

        assert_eq!(rows.len(), 3);
        assert_eq!(store.strategy(NodeRef::in_folder(0, 1)).unwrap().command_target, "F1");
    }

    #[test]
    fn test_top_level_strategy_targets_itself() {
        let mut store = sample_store();
        let rows = select_rows(&mut store, &Scope::TopLevelStrategy { node: 2 }, &ParamFilter::All);

        assert_eq!(rows.len(), 2);
        assert_eq!(store.strategy(NodeRef::top_level(2)).unwrap().command_target, "Solo");
    }

    #[test]
    fn test_out_of_range_scope_yields_no_rows() {
        let mut store = sample_store();
        assert!(select_rows(&mut store, &Scope::Folder { node: 9 }, &ParamFilter::All).is_empty());
        // Node 2 is a strategy, not a folder.
        assert!(select_rows(&mut store, &Scope::Folder { node: 2 }, &ParamFilter::All).is_empty());
        assert!(select_rows(
            &mut store,
            &Scope::StrategyInFolder { node: 0, strategy: 5 },
            &ParamFilter::All
        )
        .is_empty());
    }

    #[test]
    fn test_rows_reference_live_values() {
        let mut store = sample_store();
        store.set_param(NodeRef::in_folder(0, 0), "AutoBuy", "1");

        let rows = select_rows(
            &mut store,
            &Scope::StrategyInFolder { node: 0, strategy: 0 },
            &ParamFilter::Named("AutoBuy".to_string()),
        );
        assert_eq!(rows[0].value, "1");
    }
}
