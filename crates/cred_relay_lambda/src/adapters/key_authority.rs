use std::fmt;
use std::future::Future;

use cred_relay_core::contract::Binding;
use cred_relay_core::error::RelayResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrantOperation {
    Decrypt,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrantRequest {
    pub grantee: String,
    pub name: String,
    pub operations: Vec<GrantOperation>,
}

impl GrantRequest {
    /// A grant allowing `grantee` to decrypt and nothing else.
    pub fn decrypt_only(grantee: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            grantee: grantee.into(),
            name: name.into(),
            operations: vec![GrantOperation::Decrypt],
        }
    }
}

#[derive(Clone, PartialEq, Eq)]
pub struct IssuedGrant {
    pub grant_id: String,
    pub grant_token: String,
}

impl fmt::Debug for IssuedGrant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IssuedGrant")
            .field("grant_id", &self.grant_id)
            .finish_non_exhaustive()
    }
}

/// Key authority holding the relay's sealing key.
///
/// `decrypt` is the only place authorization is enforced: it must return
/// `RelayError::Authorization` when the grant token is missing, unknown or
/// revoked, or when `binding` differs from the one used to seal.
pub trait KeyAuthority: Send + Sync {
    fn create_grant(
        &self,
        request: &GrantRequest,
    ) -> impl Future<Output = RelayResult<IssuedGrant>> + Send;

    fn revoke_grant(&self, grant_id: &str) -> impl Future<Output = RelayResult<()>> + Send;

    fn encrypt(
        &self,
        plaintext: &[u8],
        binding: &Binding,
    ) -> impl Future<Output = RelayResult<Vec<u8>>> + Send;

    fn decrypt(
        &self,
        ciphertext: &[u8],
        grant_tokens: &[String],
        binding: &Binding,
    ) -> impl Future<Output = RelayResult<Vec<u8>>> + Send;
}
