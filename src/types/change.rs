use serde::{Deserialize, Serialize};

/// One parameter-level difference between a strategy's baseline and its
/// live values, with the remote-control commands that apply and undo it.
/// Records are regenerated from scratch on every diff, never patched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeRecord {
    pub target: String,
    pub param_name: String,
    pub old_value: String,
    pub new_value: String,
    /// `SetParam` command applying `new_value`.
    pub forward: String,
    /// `SetParam` command restoring `old_value`.
    pub revert: String,
}
