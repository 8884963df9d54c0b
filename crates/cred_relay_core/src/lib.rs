//! Cloud-free core of the credential relay.
//!
//! The relay lets an untrusted orchestrator fan work out across accounts
//! without seeing usable credentials: a grant ties decrypt rights to one
//! function's runtime identity, the role assumer seals the secret half of a
//! short-lived credential under that grant's grantee, and the wrapper inside
//! the function unseals it. This crate owns the wire contract, identifier
//! parsing, output templates and the error taxonomy. It intentionally
//! excludes AWS SDK and Lambda runtime concerns.

pub mod contract;
pub mod error;
pub mod identifiers;
pub mod template;
