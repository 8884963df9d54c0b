//! AWS-oriented adapters and handlers for the credential relay.
//!
//! This crate owns runtime integration details (Lambda handlers, KMS, STS,
//! Lambda and S3 adapters, result delivery) behind the collaborator traits in
//! `adapters`. Wire contract, identifier parsing and templates live in
//! `cred_relay_core`.
//!
//! The relay hops are independent services joined only by the orchestrator:
//! `Granter::grant` → `RoleAssumer::assume_role` → `Wrapper::invoke` (inside the
//! target function) → `Granter::revoke`. The only transition enforced here is
//! the unseal in `Wrapper::invoke`, which needs a live grant bound to the
//! grantee the credentials were sealed for.

pub mod adapters;
pub mod config;
pub mod handlers;
pub mod logging;
pub mod runtime;
#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers;
