use core::fmt;
use std::error;

use snafu::Snafu;

use crate::label::Id;

#[derive(Debug, Snafu)]
pub enum Error {
    /// No mailbox occupies the queried name. At the resolver contract level
    /// this is the "name is free" signal, not a failure.
    #[snafu(display("no mailbox with the requested name"))]
    NotFound,

    #[snafu(display("no connector address is bound in the shadow store"))]
    NoBoundAddress,

    #[snafu(display("shadow store query failed: {}", source))]
    Store {
        source: Box<dyn error::Error + Send + Sync>,
    },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Bridge-side identifier of a user address.
#[derive(Eq, PartialEq, Hash, Debug, Clone)]
pub struct AddressId(pub String);

impl fmt::Display for AddressId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Shadow-store handle for an address, as produced by `AddressBinder`.
#[derive(Eq, PartialEq, Hash, Debug, Clone)]
pub struct AddressHandle(pub String);

impl fmt::Display for AddressHandle {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Shadow-store mailbox handle, used for message-count queries.
#[derive(Eq, PartialEq, Hash, Debug, Clone, Copy)]
pub struct InternalId(pub u64);

impl fmt::Display for InternalId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Snapshot of one locally cached mailbox.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct ShadowMailbox {
    /// The remote label this mailbox was most recently written for.
    pub remote_id: Id,
    /// Path segments actually stored in the shadow store.
    pub bridge_name: Vec<String>,
    pub internal_id: InternalId,
}

/// Read-only query surface of the shadow store. Implementations must be
/// safe for concurrent use and read-consistent for the duration of one
/// resolver call.
pub trait ShadowQuery: Send + Sync {
    /// Look up the mailbox stored under `name` for the given address.
    fn mailbox_by_name(&self, address: &AddressHandle, name: &[String]) -> Result<ShadowMailbox>;

    /// Count the messages held by a mailbox under the given address.
    fn message_count(&self, address: &AddressHandle, mailbox: InternalId) -> Result<u64>;
}

/// Maps a bridge address id to the shadow store's handle for it. An address
/// that has not been provisioned yet yields `None`.
pub trait AddressBinder: Send + Sync {
    fn bind_address(&self, address: &AddressId) -> Option<AddressHandle>;
}
