//! In-memory collaborators for exercising the relay without AWS.
//!
//! `InMemoryKeyAuthority` enforces the same rules the real key authority
//! does for the relay: decrypt needs a live grant token whose grantee is the
//! binding's recipient, and the binding must equal the one used to seal.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use cred_relay_core::contract::{Binding, RoleRef};
use cred_relay_core::error::{RelayError, RelayResult};

use crate::adapters::function_registry::{FunctionDescription, FunctionRegistry};
use crate::adapters::identity_broker::{AssumedCredentials, IdentityBroker};
use crate::adapters::key_authority::{GrantOperation, GrantRequest, IssuedGrant, KeyAuthority};
use crate::adapters::object_store::ObjectStore;
use crate::adapters::result_sink::ResultSink;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedGrant {
    pub request: GrantRequest,
    pub token: String,
    pub revoked: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SealedRecord {
    pub plaintext: Vec<u8>,
    pub binding: Binding,
}

#[derive(Default)]
struct KeyAuthorityState {
    grants: HashMap<String, RecordedGrant>,
    sealed: HashMap<Vec<u8>, SealedRecord>,
}

#[derive(Clone, Default)]
pub struct InMemoryKeyAuthority {
    state: Arc<Mutex<KeyAuthorityState>>,
    sequence: Arc<AtomicUsize>,
    key_disabled: bool,
}

impl InMemoryKeyAuthority {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fails every `encrypt` the way a disabled key does.
    pub fn with_disabled_key() -> Self {
        Self {
            key_disabled: true,
            ..Self::default()
        }
    }

    pub fn grant(&self, grant_id: &str) -> Option<RecordedGrant> {
        self.state
            .lock()
            .expect("poisoned mutex")
            .grants
            .get(grant_id)
            .cloned()
    }

    pub fn grant_count(&self) -> usize {
        self.state.lock().expect("poisoned mutex").grants.len()
    }

    pub fn sealed_plaintext(&self, ciphertext: &[u8]) -> Option<SealedRecord> {
        self.state
            .lock()
            .expect("poisoned mutex")
            .sealed
            .get(ciphertext)
            .cloned()
    }

    pub fn sealed_count(&self) -> usize {
        self.state.lock().expect("poisoned mutex").sealed.len()
    }

    fn next(&self) -> usize {
        self.sequence.fetch_add(1, Ordering::SeqCst) + 1
    }
}

impl KeyAuthority for InMemoryKeyAuthority {
    async fn create_grant(&self, request: &GrantRequest) -> RelayResult<IssuedGrant> {
        let sequence = self.next();
        let issued = IssuedGrant {
            grant_id: format!("grant-{sequence}"),
            grant_token: format!("token-{sequence}"),
        };
        let record = RecordedGrant {
            request: request.clone(),
            token: issued.grant_token.clone(),
            revoked: false,
        };
        let mut state = self.state.lock().expect("poisoned mutex");
        state.grants.insert(issued.grant_id.clone(), record);
        Ok(issued)
    }

    async fn revoke_grant(&self, grant_id: &str) -> RelayResult<()> {
        let mut state = self.state.lock().expect("poisoned mutex");
        match state.grants.get_mut(grant_id) {
            Some(grant) if !grant.revoked => {
                grant.revoked = true;
                Ok(())
            }
            Some(_) => Err(RelayError::provider(
                "kms.revoke_grant",
                format!("grant '{grant_id}' is already revoked"),
            )),
            None => Err(RelayError::provider(
                "kms.revoke_grant",
                format!("grant '{grant_id}' does not exist"),
            )),
        }
    }

    async fn encrypt(&self, plaintext: &[u8], binding: &Binding) -> RelayResult<Vec<u8>> {
        if self.key_disabled {
            return Err(RelayError::provider(
                "kms.encrypt",
                "DisabledException: relay key is disabled",
            ));
        }

        let ciphertext = format!("sealed-{}", self.next()).into_bytes();
        let record = SealedRecord {
            plaintext: plaintext.to_vec(),
            binding: binding.clone(),
        };
        let mut state = self.state.lock().expect("poisoned mutex");
        state.sealed.insert(ciphertext.clone(), record);
        Ok(ciphertext)
    }

    async fn decrypt(
        &self,
        ciphertext: &[u8],
        grant_tokens: &[String],
        binding: &Binding,
    ) -> RelayResult<Vec<u8>> {
        let state = self.state.lock().expect("poisoned mutex");
        let sealed = state.sealed.get(ciphertext).ok_or_else(|| {
            RelayError::authorization("kms.decrypt", "InvalidCiphertextException: unknown blob")
        })?;
        if sealed.binding != *binding {
            return Err(RelayError::authorization(
                "kms.decrypt",
                "InvalidCiphertextException: encryption context mismatch",
            ));
        }

        let authorized = state.grants.values().any(|grant| {
            !grant.revoked
                && grant_tokens.contains(&grant.token)
                && grant.request.grantee == binding.grantee()
                && grant.request.operations.contains(&GrantOperation::Decrypt)
        });
        if !authorized {
            return Err(RelayError::authorization(
                "kms.decrypt",
                "AccessDeniedException: no live grant for this grantee",
            ));
        }

        Ok(sealed.plaintext.clone())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedSession {
    pub role: RoleRef,
    pub session_name: String,
    pub credentials: AssumedCredentials,
}

/// Issues a distinct credential set per call.
#[derive(Clone, Default)]
pub struct InMemoryIdentityBroker {
    sessions: Arc<Mutex<Vec<RecordedSession>>>,
    sequence: Arc<AtomicUsize>,
}

impl InMemoryIdentityBroker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sessions(&self) -> Vec<RecordedSession> {
        self.sessions.lock().expect("poisoned mutex").clone()
    }
}

impl IdentityBroker for InMemoryIdentityBroker {
    async fn assume_role(
        &self,
        role: &RoleRef,
        session_name: &str,
    ) -> RelayResult<AssumedCredentials> {
        let sequence = self.sequence.fetch_add(1, Ordering::SeqCst) + 1;
        let credentials = AssumedCredentials {
            access_key_id: format!("ASIA{sequence:016}"),
            secret_access_key: format!("secret-{}-{sequence}", role.account_id),
            session_token: format!("session-{sequence}"),
        };
        self.sessions
            .lock()
            .expect("poisoned mutex")
            .push(RecordedSession {
                role: role.clone(),
                session_name: session_name.to_string(),
                credentials: credentials.clone(),
            });
        Ok(credentials)
    }
}

pub struct FailingIdentityBroker;

impl IdentityBroker for FailingIdentityBroker {
    async fn assume_role(
        &self,
        _role: &RoleRef,
        _session_name: &str,
    ) -> RelayResult<AssumedCredentials> {
        Err(RelayError::provider(
            "sts.assume_role",
            "ExpiredTokenException: relay session expired",
        ))
    }
}

/// Produces URLs shaped like presigned references:
/// `https://{bucket}.s3.example/{key}?ttl={secs}&nonce={n}`.
#[derive(Clone)]
pub struct InMemoryObjectStore {
    bucket: String,
    sequence: Arc<AtomicUsize>,
}

impl InMemoryObjectStore {
    pub fn new(bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            sequence: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn presigned_count(&self) -> usize {
        self.sequence.load(Ordering::SeqCst)
    }
}

impl ObjectStore for InMemoryObjectStore {
    async fn presign_put(&self, key: &str, ttl: Duration) -> RelayResult<String> {
        let nonce = self.sequence.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(format!(
            "https://{}.s3.example/{key}?ttl={}&nonce={nonce}",
            self.bucket,
            ttl.as_secs()
        ))
    }
}

pub struct FailingObjectStore;

impl ObjectStore for FailingObjectStore {
    async fn presign_put(&self, _key: &str, _ttl: Duration) -> RelayResult<String> {
        Err(RelayError::provider("s3.presign_put", "signing credentials expired"))
    }
}

#[derive(Clone, Default)]
pub struct InMemoryFunctionRegistry {
    roles: Arc<HashMap<String, String>>,
}

impl InMemoryFunctionRegistry {
    pub fn with_function(function: impl Into<String>, execution_role: impl Into<String>) -> Self {
        Self {
            roles: Arc::new(HashMap::from([(function.into(), execution_role.into())])),
        }
    }
}

impl FunctionRegistry for InMemoryFunctionRegistry {
    async fn get_function(&self, function: &str) -> RelayResult<FunctionDescription> {
        self.roles
            .get(function)
            .map(|role| FunctionDescription {
                execution_role: role.clone(),
            })
            .ok_or_else(|| {
                RelayError::provider(
                    "lambda.get_function",
                    format!("ResourceNotFoundException: function '{function}' not found"),
                )
            })
    }
}

type Writes = Vec<(String, Vec<u8>)>;

/// Records every PUT; a rejecting sink fails them like an expired reference.
#[derive(Clone, Default)]
pub struct CapturingResultSink {
    writes: Arc<Mutex<Writes>>,
    reject: bool,
}

impl CapturingResultSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rejecting() -> Self {
        Self {
            reject: true,
            ..Self::default()
        }
    }

    pub fn writes(&self) -> Writes {
        self.writes.lock().expect("poisoned mutex").clone()
    }
}

impl ResultSink for CapturingResultSink {
    async fn put(&self, url: &str, body: Vec<u8>) -> RelayResult<()> {
        if self.reject {
            return Err(RelayError::provider(
                "object_store.put",
                "HTTP status client error (403 Forbidden)",
            ));
        }
        self.writes
            .lock()
            .expect("poisoned mutex")
            .push((url.to_string(), body));
        Ok(())
    }
}
