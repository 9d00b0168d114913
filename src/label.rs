use core::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Top-level shadow-store container under which remote folders are grouped.
pub const FOLDER_CONTAINER: &str = "Folders";
/// Top-level shadow-store container under which remote labels are grouped.
pub const LABEL_CONTAINER: &str = "Labels";
/// Prefix applied to the leaf segment of a temporary rename while a rename
/// cycle is being broken.
pub const TEMP_PREFIX: &str = "tmp_";

/// Opaque remote label identifier. Stable across renames; names are not.
#[derive(Eq, PartialEq, Hash, Serialize, Deserialize, Debug, Clone)]
pub struct Id(pub String);

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Eq, PartialEq, Hash, Serialize, Deserialize, Debug, Clone, Copy)]
pub enum LabelKind {
    /// Built-in remote label with a fixed name (Inbox, Sent, ...).
    System,
    /// User folder; a message belongs to at most one.
    Folder,
    /// User label; freely combinable.
    Label,
}

/// Snapshot of a remote label as delivered by the event stream. Immutable
/// for the duration of one resolver call.
#[derive(Eq, PartialEq, Serialize, Deserialize, Debug, Clone)]
pub struct Label {
    pub id: Id,
    /// User-visible path segments, leaf last. This is what the label would
    /// be called if written to the shadow store right now.
    pub path: Vec<String>,
    pub kind: LabelKind,
}

/// Map a label to the bridge name under which the shadow store files it.
///
/// User folders and labels are grouped under their respective top-level
/// containers; system labels keep their fixed, unprefixed name.
pub fn mailbox_name(label: &Label) -> Vec<String> {
    match label.kind {
        LabelKind::Folder => prefixed(FOLDER_CONTAINER, &label.path),
        LabelKind::Label => prefixed(LABEL_CONTAINER, &label.path),
        LabelKind::System => label.path.clone(),
    }
}

/// `mailbox_name` with the leaf segment replaced by its `tmp_` form. Used
/// to park a label while a rename cycle is unwound; the closing update of
/// the cycle overwrites it.
pub fn temp_mailbox_name(label: &Label) -> Vec<String> {
    let mut name = mailbox_name(label);
    if let Some(leaf) = name.last_mut() {
        *leaf = format!("{}{}", TEMP_PREFIX, leaf);
    }
    name
}

/// Digest of a bridge name for log fields. Mailbox names are user data and
/// must not appear in logs or reports in the clear.
pub fn hash_path(path: &[String]) -> String {
    base64::encode(Sha256::digest(path.concat().as_bytes()))
}

fn prefixed(container: &str, path: &[String]) -> Vec<String> {
    let mut name = Vec::with_capacity(path.len() + 1);
    name.push(container.to_string());
    name.extend(path.iter().cloned());
    name
}

#[cfg(test)]
mod tests {
    use super::*;

    fn label(id: &str, path: &[&str], kind: LabelKind) -> Label {
        Label {
            id: Id(id.to_string()),
            path: path.iter().map(|s| s.to_string()).collect(),
            kind,
        }
    }

    #[test]
    fn folders_and_labels_are_prefixed_by_their_container() {
        let folder = label("1", &["Work", "Reports"], LabelKind::Folder);
        assert_eq!(mailbox_name(&folder), vec!["Folders", "Work", "Reports"]);

        let user_label = label("2", &["Travel"], LabelKind::Label);
        assert_eq!(mailbox_name(&user_label), vec!["Labels", "Travel"]);
    }

    #[test]
    fn system_labels_keep_their_fixed_name() {
        let inbox = label("3", &["Inbox"], LabelKind::System);
        assert_eq!(mailbox_name(&inbox), vec!["Inbox"]);
    }

    #[test]
    fn temp_name_replaces_only_the_leaf() {
        let folder = label("4", &["Work", "Reports"], LabelKind::Folder);
        assert_eq!(
            temp_mailbox_name(&folder),
            vec!["Folders", "Work", "tmp_Reports"]
        );
    }

    #[test]
    fn hash_path_is_stable_and_opaque() {
        let name = vec!["Labels".to_string(), "Work".to_string()];
        let digest = hash_path(&name);
        assert_eq!(digest, hash_path(&name));
        assert!(!digest.contains("Work"));
    }
}
