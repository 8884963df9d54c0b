use std::fmt;
use std::future::Future;

use cred_relay_core::contract::RoleRef;
use cred_relay_core::error::RelayResult;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Short-lived credential set returned by a role assumption.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct AssumedCredentials {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub session_token: String,
}

impl fmt::Debug for AssumedCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AssumedCredentials")
            .field("access_key_id", &self.access_key_id)
            .finish_non_exhaustive()
    }
}

/// Issues cross-account sessions. Session lifetime is the broker's default.
pub trait IdentityBroker: Send + Sync {
    fn assume_role(
        &self,
        role: &RoleRef,
        session_name: &str,
    ) -> impl Future<Output = RelayResult<AssumedCredentials>> + Send;
}
