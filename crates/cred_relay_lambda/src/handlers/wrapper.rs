use std::fmt;
use std::future::Future;
use std::marker::PhantomData;

use aws_config::{BehaviorVersion, Region, SdkConfig};
use cred_relay_core::contract::{Binding, Credentials, SecretPayload, WrapEnvelope};
use cred_relay_core::error::{BoxError, RelayError, RelayResult};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{error, info};
use zeroize::Zeroizing;

use crate::adapters::key_authority::KeyAuthority;
use crate::adapters::result_sink::ResultSink;

const CREDENTIAL_PROVIDER_NAME: &str = "cred-relay";

/// Credential set recovered for one invocation, scoped to the target region.
///
/// Handed to the wrapped logic as an argument; nothing is installed globally.
#[derive(Clone)]
pub struct ScopedSession {
    access_key_id: String,
    secret_access_key: Zeroizing<String>,
    session_token: String,
    region: String,
}

impl ScopedSession {
    pub fn new(
        access_key_id: impl Into<String>,
        secret_access_key: impl Into<String>,
        session_token: impl Into<String>,
        region: impl Into<String>,
    ) -> Self {
        Self {
            access_key_id: access_key_id.into(),
            secret_access_key: Zeroizing::new(secret_access_key.into()),
            session_token: session_token.into(),
            region: region.into(),
        }
    }

    fn from_unsealed(envelope: &WrapEnvelope, secret: &SecretPayload) -> Self {
        Self::new(
            envelope.credentials.access_key_id.as_str(),
            secret.secret_access_key.as_str(),
            envelope.credentials.session_token.as_str(),
            envelope.context.region.as_str(),
        )
    }

    pub fn access_key_id(&self) -> &str {
        &self.access_key_id
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    pub fn credentials(&self) -> aws_credential_types::Credentials {
        aws_credential_types::Credentials::new(
            self.access_key_id.clone(),
            self.secret_access_key.as_str().to_owned(),
            Some(self.session_token.clone()),
            None,
            CREDENTIAL_PROVIDER_NAME,
        )
    }

    /// SDK configuration for clients acting as the assumed role.
    pub async fn sdk_config(&self) -> SdkConfig {
        aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(self.region.clone()))
            .credentials_provider(self.credentials())
            .load()
            .await
    }
}

impl fmt::Debug for ScopedSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScopedSession")
            .field("access_key_id", &self.access_key_id)
            .field("region", &self.region)
            .finish_non_exhaustive()
    }
}

/// Business logic run inside the wrapper.
///
/// Receives the scoped session and the payload bytes exactly as the
/// orchestrator sent them; its output bytes are written verbatim.
pub trait WrappedHandler: Send + Sync {
    fn call(
        &self,
        session: ScopedSession,
        payload: Vec<u8>,
    ) -> impl Future<Output = Result<Vec<u8>, BoxError>> + Send;
}

impl<F, Fut> WrappedHandler for F
where
    F: Fn(ScopedSession, Vec<u8>) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Vec<u8>, BoxError>> + Send,
{
    fn call(
        &self,
        session: ScopedSession,
        payload: Vec<u8>,
    ) -> impl Future<Output = Result<Vec<u8>, BoxError>> + Send {
        (self)(session, payload)
    }
}

/// Adapts a function over typed JSON input and output.
pub struct JsonHandler<F, I, O> {
    handler: F,
    _marker: PhantomData<fn(I) -> O>,
}

pub fn json_handler<F, Fut, I, O>(handler: F) -> JsonHandler<F, I, O>
where
    F: Fn(ScopedSession, I) -> Fut + Send + Sync,
    Fut: Future<Output = Result<O, BoxError>> + Send,
    I: DeserializeOwned + Send,
    O: Serialize,
{
    JsonHandler {
        handler,
        _marker: PhantomData,
    }
}

impl<F, Fut, I, O> WrappedHandler for JsonHandler<F, I, O>
where
    F: Fn(ScopedSession, I) -> Fut + Send + Sync,
    Fut: Future<Output = Result<O, BoxError>> + Send,
    I: DeserializeOwned + Send,
    O: Serialize,
{
    async fn call(&self, session: ScopedSession, payload: Vec<u8>) -> Result<Vec<u8>, BoxError> {
        let input: I = serde_json::from_slice(&payload)?;
        let output = (self.handler)(session, input).await?;
        Ok(serde_json::to_vec(&output)?)
    }
}

/// Runtime shim: unseals the credentials, runs the wrapped logic and ships
/// its output to the single-use upload reference.
#[derive(Debug, Clone)]
pub struct Wrapper<K, R, H> {
    key_authority: K,
    sink: R,
    handler: H,
}

impl<K, R, H> Wrapper<K, R, H>
where
    K: KeyAuthority,
    R: ResultSink,
    H: WrappedHandler,
{
    pub fn new(key_authority: K, sink: R, handler: H) -> Self {
        Self {
            key_authority,
            sink,
            handler,
        }
    }

    /// Handles one raw envelope. Produces no payload of its own; the result
    /// only exists as the object written through the upload reference.
    pub async fn invoke(&self, raw_envelope: &[u8]) -> RelayResult<()> {
        let envelope = WrapEnvelope::parse(raw_envelope).inspect_err(|failure| {
            error!(component = "wrapper", event = "envelope_rejected", error = %failure);
        })?;

        let result = self.run(&envelope).await;
        match &result {
            Ok(()) => info!(
                component = "wrapper",
                event = "result_delivered",
                account_id = %envelope.context.account_id,
                region = %envelope.context.region,
                grantee = %envelope.credentials.grantee,
            ),
            Err(failure) => error!(
                component = "wrapper",
                event = "invoke_failed",
                account_id = %envelope.context.account_id,
                region = %envelope.context.region,
                grantee = %envelope.credentials.grantee,
                error = %failure,
            ),
        }
        result
    }

    async fn run(&self, envelope: &WrapEnvelope) -> RelayResult<()> {
        let secret = self.unseal(&envelope.credentials).await?;
        let session = ScopedSession::from_unsealed(envelope, &secret);

        let output = self
            .handler
            .call(session, envelope.payload_bytes().to_vec())
            .await
            .map_err(RelayError::handler)?;

        self.sink.put(&secret.output_url, output).await
    }

    async fn unseal(&self, credentials: &Credentials) -> RelayResult<SecretPayload> {
        let grant_tokens = if credentials.grant.is_empty() {
            Vec::new()
        } else {
            vec![credentials.grant.clone()]
        };

        let binding = Binding::recipient(credentials.grantee.as_str());
        let decrypted = self
            .key_authority
            .decrypt(&credentials.encrypted, &grant_tokens, &binding)
            .await?;
        SecretPayload::from_plaintext(&Zeroizing::new(decrypted))
    }
}
