use std::collections::HashMap;

/// Kill-switch: degrade the user-label conflict resolver to a no-op.
pub const LABEL_CONFLICT_RESOLVER_DISABLED: &str = "LabelConflictResolverDisabled";
/// Kill-switch: degrade the internal-label conflict resolver to a no-op.
pub const INTERNAL_LABEL_CONFLICT_RESOLVER_DISABLED: &str = "InternalLabelConflictResolverDisabled";
/// Escape hatch: allow silently deleting a conflicting internal-slot
/// mailbox even when it still holds messages.
pub const INTERNAL_LABEL_CONFLICT_NON_EMPTY_MAILBOX_DELETION: &str =
    "InternalLabelConflictNonEmptyMailboxDeletion";

/// Boolean feature-flag source. Unknown flags answer `false`.
///
/// The manager queries flags once per resolver construction, so a flipped
/// flag takes effect on the next reconciliation cycle, never mid-plan.
pub trait FlagSource: Send + Sync {
    fn flag_value(&self, name: &str) -> bool;
}

impl FlagSource for HashMap<String, bool> {
    fn flag_value(&self, name: &str) -> bool {
        self.get(name).copied().unwrap_or(false)
    }
}
