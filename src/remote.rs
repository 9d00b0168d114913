use std::error;

use snafu::Snafu;

use crate::label::{Id, Label, LabelKind};

#[derive(Debug, Snafu)]
pub enum Error {
    /// The id does not name a label on the remote; it was deleted or never
    /// existed. Resolvers treat this as the cue to drop a stale mailbox.
    #[snafu(display("no such label on the remote"))]
    NoSuchLabel,

    #[snafu(display("remote label fetch failed: {}", source))]
    Api {
        source: Box<dyn error::Error + Send + Sync>,
    },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Remote mail service client, narrowed to the single call the conflict
/// resolvers need. The canonical label state always comes from here, never
/// from the event that triggered a resolution.
pub trait RemoteClient: Send + Sync {
    /// Fetch the canonical state of a label by id. Labels whose kind is not
    /// in `kinds` are reported as `NoSuchLabel`.
    fn get_label(&self, id: &Id, kinds: &[LabelKind]) -> Result<Label>;
}
