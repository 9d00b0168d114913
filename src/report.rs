use std::collections::HashMap;
use std::error;

use serde_json::Value;
use snafu::Snafu;

#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display("could not deliver report: {}", source))]
    Delivery {
        source: Box<dyn error::Error + Send + Sync>,
    },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Structured context attached to a report.
pub type Context = HashMap<&'static str, Value>;

/// Incident reporting port. Resolvers send a report when they hit a state
/// that indicates a data-consistency bug rather than an ordinary rename;
/// delivery failures are logged by the caller and never abort a resolution.
pub trait Reporter: Send + Sync {
    fn report_message(&self, kind: &str, context: Context) -> Result<()>;

    fn report_warning(&self, kind: &str, context: Context) -> Result<()>;
}
