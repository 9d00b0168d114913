use std::collections::HashSet;
use std::sync::Arc;

use log::{error, info};
use serde_json::json;

use super::{Error, Result, ShadowProbe};
use crate::label::{self, Id, Label, LabelKind};
use crate::remote::{self, RemoteClient};
use crate::report::{Context, Reporter};
use crate::shadow;
use crate::update::{Plan, Update};

/// Computes the update plan that makes a user label's mailbox name reflect
/// the remote state, freeing the target name first when another label holds
/// it and breaking rename cycles with a single temporary rename.
///
/// `visited` records the label ids currently in flight; the caller passes
/// an empty set and may reuse it across calls of one reconciliation pass.
/// The resolver performs no mutation: everything it decides is in the
/// returned plan, which the caller applies to the shadow store in order.
pub trait UserLabelResolver: Send + Sync {
    fn resolve(&self, label: &Label, visited: &mut HashSet<Id>) -> Result<Plan>;
}

/// Kill-switch stand-in. Accepts anything, plans nothing.
pub(crate) struct NullUserLabelResolver;

impl UserLabelResolver for NullUserLabelResolver {
    fn resolve(&self, _label: &Label, _visited: &mut HashSet<Id>) -> Result<Plan> {
        Ok(Plan::new())
    }
}

/// Kinds a conflicting mailbox occupant may resolve to on the remote.
const CONFLICTING_LABEL_KINDS: &[LabelKind] =
    &[LabelKind::Folder, LabelKind::Label, LabelKind::System];

pub(crate) struct UserLabelResolverImpl {
    probe: ShadowProbe,
    client: Arc<dyn RemoteClient>,
    reporter: Arc<dyn Reporter>,
}

impl UserLabelResolverImpl {
    pub(crate) fn new(
        probe: ShadowProbe,
        client: Arc<dyn RemoteClient>,
        reporter: Arc<dyn Reporter>,
    ) -> Self {
        Self {
            probe,
            client,
            reporter,
        }
    }

    fn report_unexpected_conflict(&self, label_id: &Id, conflicting_id: &Id) {
        let mut context = Context::new();
        context.insert("labelID", json!(label_id.0));
        context.insert("conflictingLabelID", json!(conflicting_id.0));
        if let Err(e) = self
            .reporter
            .report_message("Unexpected label conflict", context)
        {
            error!("failed to report unexpected label conflict: {}", e);
        }
    }
}

impl UserLabelResolver for UserLabelResolverImpl {
    fn resolve(&self, label: &Label, visited: &mut HashSet<Id>) -> Result<Plan> {
        // The walk follows the chain of labels whose remote renames freed
        // or took each other's names. An explicit stack instead of call
        // recursion keeps a pathological chain bounded by heap, not stack.
        // `chain` holds every label whose closing rename must wait until
        // the occupant of its target name has moved out of the way.
        let mut chain: Vec<Label> = Vec::new();
        let mut current = label.clone();

        let mut plan = loop {
            let target = label::mailbox_name(&current);

            if visited.contains(&current.id) {
                // Closing a cycle, such as a label swap. Park the label
                // under a temporary name; the chain unwind below overwrites
                // it with the correct one.
                info!(
                    "cycle detected, applying temporary rename (label={}, path={})",
                    current.id,
                    label::hash_path(&target)
                );
                let mailbox_id = current.id.clone();
                let temp = label::temp_mailbox_name(&current);
                let mut plan = Plan::new();
                plan.push(move || {
                    vec![Update::CreateOrUpdate {
                        mailbox_id: mailbox_id.clone(),
                        name: temp.clone(),
                    }]
                });
                break plan;
            }
            visited.insert(current.id.clone());

            let mailbox = match self.probe.mailbox_by_label(&current) {
                Ok(mailbox) => mailbox,
                Err(shadow::Error::NotFound) => {
                    // Name is free; a single create-or-update settles it.
                    info!(
                        "mailbox name is free, creating (label={}, path={})",
                        current.id,
                        label::hash_path(&target)
                    );
                    let mailbox_id = current.id.clone();
                    let name = target.clone();
                    let mut plan = Plan::new();
                    plan.push(move || {
                        vec![Update::CreateOrUpdate {
                            mailbox_id: mailbox_id.clone(),
                            name: name.clone(),
                        }]
                    });
                    break plan;
                }
                Err(source) => return Err(Error::Lookup { source }),
            };

            // The name already belongs to this label; nothing to update.
            if mailbox.remote_id == current.id {
                info!("mailbox name already matches label (label={})", current.id);
                break Plan::new();
            }

            info!(
                "label conflict found (label={}, path={}, conflicting={}, conflicting_path={})",
                current.id,
                label::hash_path(&target),
                mailbox.remote_id,
                label::hash_path(&mailbox.bridge_name)
            );

            let conflicting = match self.client.get_label(&mailbox.remote_id, CONFLICTING_LABEL_KINDS) {
                Ok(conflicting) => conflicting,
                Err(remote::Error::NoSuchLabel) => {
                    // The occupant is gone on the remote; its mailbox is
                    // stale and can be removed before taking the name.
                    info!(
                        "conflicting label no longer exists on remote, deleting (conflicting={})",
                        mailbox.remote_id
                    );
                    let stale_id = mailbox.remote_id.clone();
                    let mailbox_id = current.id.clone();
                    let name = target.clone();
                    let mut plan = Plan::new();
                    plan.push(move || {
                        vec![
                            Update::Delete {
                                mailbox_id: stale_id.clone(),
                            },
                            Update::CreateOrUpdate {
                                mailbox_id: mailbox_id.clone(),
                                name: name.clone(),
                            },
                        ]
                    });
                    break plan;
                }
                Err(source) => {
                    error!("failed to fetch conflicting label from remote: {}", source);
                    return Err(Error::FetchConflictingLabel { source });
                }
            };

            // If the occupant's canonical name still maps to the very name
            // it occupies, two distinct remote ids own one name. A system
            // label in the way is equally unrecoverable.
            if conflicting.kind == LabelKind::System
                || label::mailbox_name(&conflicting) == mailbox.bridge_name
            {
                self.report_unexpected_conflict(&current.id, &conflicting.id);
                return Err(Error::UnexpectedLabelConflict {
                    label_id: current.id.clone(),
                    conflicting_id: conflicting.id,
                });
            }

            // The occupant was renamed remotely. Resolve it first so its
            // new name is settled, then rename `current` behind it.
            info!(
                "conflicting label was renamed remotely, resolving it first (conflicting={}, new_path={})",
                conflicting.id,
                label::hash_path(&label::mailbox_name(&conflicting))
            );
            chain.push(current);
            current = conflicting;
        };

        // Close the chain outward: each label renames only after the
        // occupant of its target name has moved.
        for link in chain.into_iter().rev() {
            let name = label::mailbox_name(&link);
            let mailbox_id = link.id;
            plan.push(move || {
                vec![Update::CreateOrUpdate {
                    mailbox_id: mailbox_id.clone(),
                    name: name.clone(),
                }]
            });
        }

        Ok(plan)
    }
}
