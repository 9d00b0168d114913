use core::fmt;

use crate::label::Id;

/// One instruction for the shadow store.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum Update {
    /// Create the mailbox if absent, otherwise rename it to `name`.
    CreateOrUpdate { mailbox_id: Id, name: Vec<String> },
    /// Destructive delete, visible to connected IMAP clients.
    Delete { mailbox_id: Id },
    /// Internal cleanup delete, not reported to IMAP clients.
    DeleteSilent { mailbox_id: Id },
}

type Step = Box<dyn Fn() -> Vec<Update> + Send>;

/// An ordered, deferred list of updates.
///
/// Resolvers assemble a plan out of producer steps instead of a flat list so
/// the caller can materialise it late, wrap diagnostics around application,
/// and re-read it without recomputing. `updates` flattens the steps in the
/// exact order the shadow store must apply them.
#[derive(Default)]
pub struct Plan {
    steps: Vec<Step>,
}

impl Plan {
    pub fn new() -> Self {
        Self { steps: Vec::new() }
    }

    /// Append one producer step.
    pub fn push<F>(&mut self, step: F)
    where
        F: Fn() -> Vec<Update> + Send + 'static,
    {
        self.steps.push(Box::new(step));
    }

    /// Append all of `other`'s steps after this plan's, preserving their
    /// relative order.
    pub fn append(&mut self, mut other: Plan) {
        self.steps.append(&mut other.steps);
    }

    /// True if no steps were recorded.
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Flatten the plan into the update sequence to apply.
    pub fn updates(&self) -> Vec<Update> {
        self.steps.iter().flat_map(|step| step()).collect()
    }
}

impl fmt::Debug for Plan {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Plan({} steps)", self.steps.len())
    }
}
