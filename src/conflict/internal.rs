use std::collections::HashMap;
use std::sync::Arc;

use lazy_static::lazy_static;
use log::{error, info, warn};
use serde_json::json;

use super::{Error, Result, ShadowProbe};
use crate::label::{Id, Label, LabelKind, FOLDER_CONTAINER, LABEL_CONTAINER};
use crate::report::{Context, Reporter};
use crate::shadow::{self, ShadowMailbox};
use crate::update::{Plan, Update};

/// Guards the built-in container mailboxes against foreign occupants.
///
/// `api_labels` is the complete remote label set of the current
/// reconciliation pass, keyed by id. A container slot held by a label in
/// that set is unrecoverable; anything else squatting there is a stale
/// shadow-store artifact that can be cleaned up, provided it is empty.
pub trait InternalLabelResolver: Send + Sync {
    fn resolve(&self, api_labels: &HashMap<Id, Label>) -> Result<Plan>;
}

/// Kill-switch stand-in. Accepts anything, plans nothing.
pub(crate) struct NullInternalLabelResolver;

impl InternalLabelResolver for NullInternalLabelResolver {
    fn resolve(&self, _api_labels: &HashMap<Id, Label>) -> Result<Plan> {
        Ok(Plan::new())
    }
}

lazy_static! {
    /// The built-in containers. Id and canonical name are identical, and
    /// the name carries no container prefix of its own.
    static ref INTERNAL_CONTAINERS: Vec<Label> = [FOLDER_CONTAINER, LABEL_CONTAINER]
        .iter()
        .map(|container| Label {
            id: Id(container.to_string()),
            path: vec![container.to_string()],
            kind: LabelKind::System,
        })
        .collect();
}

pub(crate) struct InternalLabelResolverImpl {
    probe: ShadowProbe,
    allow_non_empty_deletion: bool,
    reporter: Arc<dyn Reporter>,
}

impl InternalLabelResolverImpl {
    pub(crate) fn new(
        probe: ShadowProbe,
        allow_non_empty_deletion: bool,
        reporter: Arc<dyn Reporter>,
    ) -> Self {
        Self {
            probe,
            allow_non_empty_deletion,
            reporter,
        }
    }

    fn report_message(&self, kind: &str, container: &Label, occupant: &ShadowMailbox) {
        if let Err(e) = self
            .reporter
            .report_message(kind, report_context(container, occupant))
        {
            error!("failed to report internal label conflict: {}", e);
        }
    }

    fn report_warning(&self, kind: &str, container: &Label, occupant: &ShadowMailbox) {
        if let Err(e) = self
            .reporter
            .report_warning(kind, report_context(container, occupant))
        {
            error!("failed to report internal label conflict warning: {}", e);
        }
    }
}

impl InternalLabelResolver for InternalLabelResolverImpl {
    fn resolve(&self, api_labels: &HashMap<Id, Label>) -> Result<Plan> {
        let mut plan = Plan::new();

        for container in INTERNAL_CONTAINERS.iter() {
            let occupant = match self.probe.mailbox_by_label(container) {
                Ok(mailbox) => mailbox,
                Err(shadow::Error::NotFound) => continue,
                Err(source) => return Err(Error::Lookup { source }),
            };

            // The container owns its slot.
            if occupant.remote_id == container.id {
                continue;
            }

            info!(
                "internal container slot held by a foreign mailbox (container={}, occupant={})",
                container.id, occupant.remote_id
            );

            if api_labels.contains_key(&occupant.remote_id) {
                // The remote genuinely assigns this reserved name to a user
                // label. Displacing the container would break every client;
                // surrendering the name would lose it. Halt instead.
                error!(
                    "API-defined label conflicts with internal container (container={}, occupant={})",
                    container.id, occupant.remote_id
                );
                self.report_message(
                    "Internal mailbox name conflict. Same-name mailbox is returned by API",
                    container,
                    &occupant,
                );
                return Err(Error::InternalMailboxApiConflict {
                    label_id: occupant.remote_id.clone(),
                    container: container.id.0.clone(),
                });
            }

            let (count, errors) = self.probe.message_count(occupant.internal_id);
            if !errors.is_empty() {
                return Err(Error::CountMessages { errors });
            }

            if count > 0 && !self.allow_non_empty_deletion {
                // The squatter shelters user mail, most likely stored there
                // before a remote rename. Deleting it needs an explicit
                // operator opt-in via the override flag.
                warn!(
                    "conflicting mailbox in internal slot still holds messages (occupant={}, count={})",
                    occupant.remote_id, count
                );
                self.report_warning(
                    "Internal mailbox name conflict. Conflicting mailbox is not empty",
                    container,
                    &occupant,
                );
                return Err(Error::NonEmptyConflictingMailbox {
                    mailbox_id: occupant.remote_id.clone(),
                    count,
                });
            }

            let mailbox_id = occupant.remote_id.clone();
            plan.push(move || {
                vec![Update::DeleteSilent {
                    mailbox_id: mailbox_id.clone(),
                }]
            });
        }

        Ok(plan)
    }
}

fn report_context(container: &Label, occupant: &ShadowMailbox) -> Context {
    let mut context = Context::new();
    context.insert("internalLabelID", json!(container.id.0));
    context.insert("internalLabelName", json!(container.path.join("/")));
    context.insert("conflictingLabelID", json!(occupant.remote_id.0));
    context.insert("conflictingLabelName", json!(occupant.bridge_name.join("/")));
    context
}
