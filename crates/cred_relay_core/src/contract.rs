//! Wire contract between the orchestrator and the three relay hops.
//!
//! Field names are PascalCase on the wire and each hop's output is the next
//! hop's input: `GrantOutput` feeds `AssumeRoleInput`, `AssumeRoleOutput`
//! plus the caller's payload forms a `WrapEnvelope`.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::{RelayError, RelayResult};

/// Encryption-context key that carries the grantee into the seal.
pub const BINDING_KEY: &str = "Recipient";

/// An assumption target produced by the account-listing component.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "PascalCase")]
pub struct Context {
    pub account_id: String,
    pub region: String,
    pub role_name: String,
}

impl Context {
    pub fn role_ref(&self) -> RoleRef {
        RoleRef {
            account_id: self.account_id.clone(),
            role_name: self.role_name.clone(),
        }
    }
}

/// Account-scoped role reference, rendered as `role://{AccountId}/{RoleName}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RoleRef {
    pub account_id: String,
    pub role_name: String,
}

impl fmt::Display for RoleRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "role://{}/{}", self.account_id, self.role_name)
    }
}

/// Sealed credential handed to the orchestrator.
///
/// `AccessKeyId` and `SessionToken` are in the clear; they do not
/// authenticate without the secret key that only `Encrypted` holds.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct Credentials {
    pub access_key_id: String,
    pub session_token: String,
    #[serde(with = "base64_bytes")]
    pub encrypted: Vec<u8>,
    pub grant: String,
    pub grantee: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("access_key_id", &self.access_key_id)
            .field("session_token", &"<redacted>")
            .field("encrypted_len", &self.encrypted.len())
            .field("grant", &"<redacted>")
            .field("grantee", &self.grantee)
            .finish()
    }
}

/// Plaintext inside the seal. Wiped when dropped.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
#[serde(rename_all = "PascalCase")]
pub struct SecretPayload {
    pub secret_access_key: String,
    pub output_url: String,
}

impl SecretPayload {
    pub fn to_plaintext(&self) -> RelayResult<Vec<u8>> {
        serde_json::to_vec(self)
            .map_err(|error| RelayError::validation_with("failed to encode secret payload", error))
    }

    pub fn from_plaintext(plaintext: &[u8]) -> RelayResult<Self> {
        serde_json::from_slice(plaintext).map_err(|error| {
            RelayError::validation_with("unsealed plaintext is not a secret payload", error)
        })
    }
}

impl fmt::Debug for SecretPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretPayload")
            .field("secret_access_key", &"<redacted>")
            .field("output_url", &"<redacted>")
            .finish()
    }
}

/// Context that must match between seal and unseal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    recipient: String,
}

impl Binding {
    pub fn recipient(grantee: impl Into<String>) -> Self {
        Self {
            recipient: grantee.into(),
        }
    }

    pub fn grantee(&self) -> &str {
        &self.recipient
    }

    pub fn to_context(&self) -> HashMap<String, String> {
        HashMap::from([(BINDING_KEY.to_string(), self.recipient.clone())])
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct GrantInput {
    pub execution_id: String,
    pub function: String,
}

#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct GrantOutput {
    pub grant_id: String,
    pub grant_token: String,
    pub grantee: String,
}

impl fmt::Debug for GrantOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GrantOutput")
            .field("grant_id", &self.grant_id)
            .field("grant_token", &"<redacted>")
            .field("grantee", &self.grantee)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct RevokeInput {
    pub grant_id: String,
}

#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct AssumeRoleInput {
    pub context: Context,
    pub execution_id: String,
    pub grant: String,
    pub grantee: String,
    pub function: String,
}

impl fmt::Debug for AssumeRoleInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AssumeRoleInput")
            .field("context", &self.context)
            .field("execution_id", &self.execution_id)
            .field("grant", &"<redacted>")
            .field("grantee", &self.grantee)
            .field("function", &self.function)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct AssumeRoleOutput {
    pub context: Context,
    pub credentials: Credentials,
}

/// Input of a wrapped function. `Payload` is kept as raw JSON text so the
/// wrapped logic sees exactly the bytes the orchestrator sent. A missing or
/// `null` payload reaches the wrapped logic as `null`.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct WrapEnvelope {
    pub context: Context,
    pub credentials: Credentials,
    #[serde(default)]
    pub payload: Option<Box<RawValue>>,
}

impl WrapEnvelope {
    pub fn new(assumed: AssumeRoleOutput, payload: Box<RawValue>) -> Self {
        Self {
            context: assumed.context,
            credentials: assumed.credentials,
            payload: Some(payload),
        }
    }

    pub fn parse(raw: &[u8]) -> RelayResult<Self> {
        serde_json::from_slice(raw)
            .map_err(|error| RelayError::validation_with("malformed wrapper envelope", error))
    }

    pub fn payload_bytes(&self) -> &[u8] {
        match &self.payload {
            Some(payload) => payload.get().as_bytes(),
            None => b"null",
        }
    }
}

mod base64_bytes {
    use base64::{engine::general_purpose::STANDARD, Engine};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD
            .decode(encoded.as_bytes())
            .map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn sample_credentials() -> Credentials {
        Credentials {
            access_key_id: "ASIAEXAMPLE".to_string(),
            session_token: "session-token".to_string(),
            encrypted: vec![0, 159, 146, 150],
            grant: "grant-token".to_string(),
            grantee: "arn:aws:iam::222222222222:role/worker".to_string(),
        }
    }

    #[test]
    fn credentials_use_pascal_case_and_base64_blob() {
        let value = serde_json::to_value(sample_credentials()).expect("serialize");
        assert_eq!(
            value,
            json!({
                "AccessKeyId": "ASIAEXAMPLE",
                "SessionToken": "session-token",
                "Encrypted": "AJ+Slg==",
                "Grant": "grant-token",
                "Grantee": "arn:aws:iam::222222222222:role/worker",
            })
        );
    }

    #[test]
    fn role_ref_is_account_scoped() {
        let context = Context {
            account_id: "111111111111".to_string(),
            region: "us-east-1".to_string(),
            role_name: "Auditor".to_string(),
        };
        assert_eq!(
            context.role_ref().to_string(),
            "role://111111111111/Auditor"
        );
    }

    #[test]
    fn envelope_keeps_payload_text_verbatim() {
        let raw = br#"{
            "Context": {"AccountId": "111111111111", "Region": "us-east-1", "RoleName": "Auditor"},
            "Credentials": {"AccessKeyId": "A", "SessionToken": "S", "Encrypted": "AJ+Slg==", "Grant": "g", "Grantee": "r"},
            "Payload": {"b": 1.50, "a": [ 1,2 ]}
        }"#;

        let envelope = WrapEnvelope::parse(raw).expect("envelope should parse");
        assert_eq!(envelope.payload_bytes(), br#"{"b": 1.50, "a": [ 1,2 ]}"#);
        assert_eq!(envelope.credentials.encrypted, vec![0, 159, 146, 150]);
    }

    #[test]
    fn envelope_without_payload_forwards_null() {
        let raw = br#"{
            "Context": {"AccountId": "111111111111", "Region": "us-east-1", "RoleName": "Auditor"},
            "Credentials": {"AccessKeyId": "A", "SessionToken": "S", "Encrypted": "", "Grant": "g", "Grantee": "r"}
        }"#;

        let envelope = WrapEnvelope::parse(raw).expect("payload is optional");
        assert!(envelope.payload.is_none());
        assert_eq!(envelope.payload_bytes(), b"null");
    }

    #[test]
    fn envelope_without_credentials_is_a_validation_error() {
        let error = WrapEnvelope::parse(br#"{"Context": {}, "Payload": null}"#)
            .expect_err("envelope should fail");
        assert_eq!(error.kind(), crate::error::ErrorKind::Validation);
    }

    #[test]
    fn secret_payload_debug_is_redacted() {
        let secret = SecretPayload {
            secret_access_key: "super-secret".to_string(),
            output_url: "https://bucket.example/key?X-Amz-Signature=abc".to_string(),
        };
        let rendered = format!("{secret:?}");
        assert!(!rendered.contains("super-secret"));
        assert!(!rendered.contains("X-Amz-Signature"));
    }

    #[test]
    fn binding_context_names_the_recipient() {
        let binding = Binding::recipient("arn:aws:iam::222222222222:role/worker");
        assert_eq!(
            binding.to_context().get(BINDING_KEY).map(String::as_str),
            Some("arn:aws:iam::222222222222:role/worker")
        );
    }
}
