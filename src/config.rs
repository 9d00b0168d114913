use serde::Deserialize;
use snafu::prelude::*;
use std::{
    fs, io,
    path::{Path, PathBuf},
};

use crate::flags::{self, FlagSource};

#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display("Could not read config file `{}': {}", filename.to_string_lossy(), source))]
    ReadConfigFile {
        filename: PathBuf,
        source: io::Error,
    },

    #[snafu(display("Could not parse config file `{}': {}", filename.to_string_lossy(), source))]
    ParseConfigFile {
        filename: PathBuf,
        source: toml::de::Error,
    },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Static configuration for a bridge that has no remote feature-flag
/// service. Every field defaults to off, so an empty or absent `[flags]`
/// table leaves both resolvers enabled.
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub flags: Flags,
}

/// Kill-switch values, named after the flags they answer.
#[derive(Debug, Default, Deserialize)]
pub struct Flags {
    /// Replace the user-label conflict resolver with a no-op.
    #[serde(default)]
    pub label_conflict_resolver_disabled: bool,

    /// Replace the internal-label conflict resolver with a no-op.
    #[serde(default)]
    pub internal_label_conflict_resolver_disabled: bool,

    /// Permit silently deleting a conflicting internal-slot mailbox even
    /// when it still contains messages. Leave this off unless an operator
    /// has confirmed the messages are expendable.
    #[serde(default)]
    pub internal_label_conflict_non_empty_mailbox_deletion: bool,
}

impl Config {
    /// Load `relabel.toml` from the given directory.
    pub fn from_dir(path: impl AsRef<Path>) -> Result<Self> {
        let filename = path.as_ref().join("relabel.toml");

        let contents = fs::read_to_string(&filename).context(ReadConfigFileSnafu {
            filename: &filename,
        })?;
        toml::from_str(contents.as_str()).context(ParseConfigFileSnafu {
            filename: &filename,
        })
    }
}

impl FlagSource for Config {
    fn flag_value(&self, name: &str) -> bool {
        self.flags.flag_value(name)
    }
}

impl FlagSource for Flags {
    fn flag_value(&self, name: &str) -> bool {
        match name {
            flags::LABEL_CONFLICT_RESOLVER_DISABLED => self.label_conflict_resolver_disabled,
            flags::INTERNAL_LABEL_CONFLICT_RESOLVER_DISABLED => {
                self.internal_label_conflict_resolver_disabled
            }
            flags::INTERNAL_LABEL_CONFLICT_NON_EMPTY_MAILBOX_DELETION => {
                self.internal_label_conflict_non_empty_mailbox_deletion
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_flags_table_defaults_to_everything_enabled() {
        let config: Config = toml::from_str("").unwrap();
        assert!(!config.flag_value(flags::LABEL_CONFLICT_RESOLVER_DISABLED));
        assert!(!config.flag_value(flags::INTERNAL_LABEL_CONFLICT_RESOLVER_DISABLED));
        assert!(!config.flag_value(flags::INTERNAL_LABEL_CONFLICT_NON_EMPTY_MAILBOX_DELETION));
    }

    #[test]
    fn flags_map_to_their_recognised_names() {
        let config: Config = toml::from_str(
            "[flags]\n\
             label_conflict_resolver_disabled = true\n\
             internal_label_conflict_non_empty_mailbox_deletion = true\n",
        )
        .unwrap();
        assert!(config.flag_value(flags::LABEL_CONFLICT_RESOLVER_DISABLED));
        assert!(!config.flag_value(flags::INTERNAL_LABEL_CONFLICT_RESOLVER_DISABLED));
        assert!(config.flag_value(flags::INTERNAL_LABEL_CONFLICT_NON_EMPTY_MAILBOX_DELETION));
        assert!(!config.flag_value("SomeUnknownFlag"));
    }

    #[test]
    fn from_dir_reports_a_missing_file() {
        let err = Config::from_dir(std::env::temp_dir().join("relabel-no-such-dir")).unwrap_err();
        assert!(matches!(err, Error::ReadConfigFile { .. }));
    }

    #[test]
    fn from_dir_loads_a_config_file() {
        let dir = std::env::temp_dir().join("relabel-config-test");
        fs::create_dir_all(&dir).unwrap();
        fs::write(
            dir.join("relabel.toml"),
            "[flags]\ninternal_label_conflict_resolver_disabled = true\n",
        )
        .unwrap();

        let config = Config::from_dir(&dir).unwrap();
        assert!(config.flag_value(flags::INTERNAL_LABEL_CONFLICT_RESOLVER_DISABLED));

        fs::remove_dir_all(&dir).ok();
    }
}
