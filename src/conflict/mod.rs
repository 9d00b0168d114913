mod internal;
mod user;

pub use internal::InternalLabelResolver;
pub use user::UserLabelResolver;

use std::sync::Arc;

use itertools::Itertools;
use log::debug;
use snafu::Snafu;

use crate::flags::{self, FlagSource};
use crate::label::{self, Id, Label};
use crate::remote::{self, RemoteClient};
use crate::report::Reporter;
use crate::shadow::{self, AddressBinder, AddressId, InternalId, ShadowMailbox, ShadowQuery};

#[derive(Debug, Snafu)]
pub enum Error {
    /// Two distinct remote ids canonically own the same name. This is a
    /// data-consistency bug in the remote or the shadow store; nothing can
    /// be repaired locally.
    #[snafu(display(
        "unexpected label conflict: the name of label {} is already used by label {}",
        label_id,
        conflicting_id
    ))]
    UnexpectedLabelConflict { label_id: Id, conflicting_id: Id },

    /// A remote user label claims a name reserved for a built-in container.
    #[snafu(display("API label {} conflicts with internal label {}", label_id, container))]
    InternalMailboxApiConflict { label_id: Id, container: String },

    /// The mailbox squatting in an internal container slot still holds
    /// messages, and the deletion override flag is off.
    #[snafu(display("internal mailbox conflicting non-api label has associated messages"))]
    NonEmptyConflictingMailbox { mailbox_id: Id, count: u64 },

    #[snafu(display("could not look up mailbox by name: {}", source))]
    Lookup { source: shadow::Error },

    #[snafu(display("could not fetch conflicting label from remote: {}", source))]
    FetchConflictingLabel { source: remote::Error },

    #[snafu(display(
        "could not count messages in conflicting mailbox: {}",
        errors.iter().map(|e| e.to_string()).join("; ")
    ))]
    CountMessages { errors: Vec<shadow::Error> },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// One per-address connection currently in play. The resolvers only need
/// the bridge address behind it.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Connector {
    pub address_id: AddressId,
}

impl Connector {
    pub fn new(address_id: AddressId) -> Self {
        Self { address_id }
    }
}

/// Shadow-store view scoped to the connectors of one reconciliation cycle.
pub(crate) struct ShadowProbe {
    shadow: Arc<dyn ShadowQuery>,
    binder: Arc<dyn AddressBinder>,
    addresses: Vec<AddressId>,
}

impl ShadowProbe {
    /// Look up the mailbox occupying the label's mapped name. The first
    /// connector whose address is bound in the shadow store answers.
    fn mailbox_by_label(&self, label: &Label) -> shadow::Result<ShadowMailbox> {
        for address in &self.addresses {
            if let Some(handle) = self.binder.bind_address(address) {
                return self
                    .shadow
                    .mailbox_by_name(&handle, &label::mailbox_name(label));
            }
        }
        Err(shadow::Error::NoBoundAddress)
    }

    /// Sum the mailbox's message count over every bindable connector.
    /// A failing connector is recorded and the sweep continues, so one bad
    /// connection cannot mask the counts of the others.
    fn message_count(&self, mailbox: InternalId) -> (u64, Vec<shadow::Error>) {
        let mut sum = 0;
        let mut errors = Vec::new();
        for address in &self.addresses {
            if let Some(handle) = self.binder.bind_address(address) {
                match self.shadow.message_count(&handle, mailbox) {
                    Ok(count) => sum += count,
                    Err(e) => errors.push(e),
                }
            }
        }
        (sum, errors)
    }
}

/// Composition root for the conflict resolvers. Holds the ports and builds
/// fresh resolvers per reconciliation cycle, parameterised by the set of
/// per-address connectors currently in play.
pub struct Manager {
    shadow: Arc<dyn ShadowQuery>,
    binder: Arc<dyn AddressBinder>,
    client: Arc<dyn RemoteClient>,
    reporter: Arc<dyn Reporter>,
    flags: Arc<dyn FlagSource>,
}

impl Manager {
    pub fn new(
        shadow: Arc<dyn ShadowQuery>,
        binder: Arc<dyn AddressBinder>,
        client: Arc<dyn RemoteClient>,
        reporter: Arc<dyn Reporter>,
        flags: Arc<dyn FlagSource>,
    ) -> Self {
        Self {
            shadow,
            binder,
            client,
            reporter,
            flags,
        }
    }

    /// Build a user-label conflict resolver for one cycle. Kill-switch
    /// flags are answered here, so a flipped flag takes effect on the next
    /// cycle, never mid-plan.
    pub fn user_resolver(&self, connectors: &[Connector]) -> Box<dyn UserLabelResolver> {
        if self.flags.flag_value(flags::LABEL_CONFLICT_RESOLVER_DISABLED) {
            debug!("user-label conflict resolver is disabled by kill-switch");
            return Box::new(user::NullUserLabelResolver);
        }

        debug!(
            "built user-label conflict resolver (connectors={})",
            connectors.len()
        );
        Box::new(user::UserLabelResolverImpl::new(
            self.probe(connectors),
            Arc::clone(&self.client),
            Arc::clone(&self.reporter),
        ))
    }

    /// Build an internal-label conflict resolver for one cycle. Flag
    /// semantics are the same as for `user_resolver`.
    pub fn internal_resolver(&self, connectors: &[Connector]) -> Box<dyn InternalLabelResolver> {
        if self
            .flags
            .flag_value(flags::INTERNAL_LABEL_CONFLICT_RESOLVER_DISABLED)
        {
            debug!("internal-label conflict resolver is disabled by kill-switch");
            return Box::new(internal::NullInternalLabelResolver);
        }

        debug!(
            "built internal-label conflict resolver (connectors={})",
            connectors.len()
        );
        Box::new(internal::InternalLabelResolverImpl::new(
            self.probe(connectors),
            self.flags
                .flag_value(flags::INTERNAL_LABEL_CONFLICT_NON_EMPTY_MAILBOX_DELETION),
            Arc::clone(&self.reporter),
        ))
    }

    fn probe(&self, connectors: &[Connector]) -> ShadowProbe {
        ShadowProbe {
            shadow: Arc::clone(&self.shadow),
            binder: Arc::clone(&self.binder),
            addresses: connectors.iter().map(|c| c.address_id.clone()).collect(),
        }
    }
}
