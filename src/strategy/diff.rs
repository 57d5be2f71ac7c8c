use super::store::NodeStore;
use crate::types::{ChangeRecord, Node, StrategyNode};

/// Addressee substituted when a strategy has no usable command target.
const UNDEFINED_TARGET: &str = "UNDEFINED";

/// Compare every strategy's live values against its baseline and emit one
/// record per changed parameter. Pure: records are rebuilt from current
/// store state on every call. Folder members come first in tree order,
/// then top-level strategies.
pub fn compute_changes(store: &NodeStore) -> Vec<ChangeRecord> {
    let mut changes = Vec::new();

    for node in store.nodes() {
        if let Node::Folder(folder) = node {
            for strategy in &folder.strategies {
                collect_changes(strategy, &mut changes);
            }
        }
    }
    for node in store.nodes() {
        if let Node::Strategy(strategy) = node {
            collect_changes(strategy, &mut changes);
        }
    }

    changes
}

fn collect_changes(strategy: &StrategyNode, changes: &mut Vec<ChangeRecord>) {
    for (name, value) in &strategy.params {
        let old = strategy.baseline.get(name).map(String::as_str).unwrap_or("");
        if old != value {
            changes.push(ChangeRecord {
                target: strategy.command_target.clone(),
                param_name: name.clone(),
                old_value: old.to_string(),
                new_value: value.clone(),
                forward: set_param_command(&strategy.command_target, name, value),
                revert: set_param_command(&strategy.command_target, name, old),
            });
        }
    }
}

/// Wire format of the bot remote-control protocol; must be reproduced
/// byte-for-byte. Embedded quotes in the target or value pass through
/// unescaped -- the protocol has no escape syntax, so such commands are
/// ambiguous on the wire. Known limitation.
pub fn set_param_command(target: &str, param: &str, value: &str) -> String {
    let target = if target.is_empty() { UNDEFINED_TARGET } else { target };
    format!("SetParam \"{}\" {} {}", target, param, value)
}
