#![doc = include_str!("../README.md")]

/// Kill-switch configuration file.
pub mod config;
/// Conflict resolvers and their composition root.
pub mod conflict;
/// Feature-flag port.
pub mod flags;
/// Remote label value types and mailbox name mapping.
pub mod label;
/// Remote mail service port.
pub mod remote;
/// Incident reporting port.
pub mod report;
/// Shadow mailbox store ports.
pub mod shadow;
/// Shadow store update instructions.
pub mod update;
