use aws_sdk_kms::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_kms::primitives::Blob;
use aws_sdk_kms::types::GrantOperation as KmsGrantOperation;
use cred_relay_core::contract::Binding;
use cred_relay_core::error::{RelayError, RelayResult};

use crate::adapters::key_authority::{GrantOperation, GrantRequest, IssuedGrant, KeyAuthority};

/// Service error codes KMS uses when a decrypt is refused rather than broken.
/// A binding mismatch surfaces as `InvalidCiphertextException`.
const DECRYPT_REJECTION_CODES: [&str; 5] = [
    "AccessDeniedException",
    "InvalidGrantTokenException",
    "InvalidGrantIdException",
    "InvalidCiphertextException",
    "IncorrectKeyException",
];

#[derive(Debug, Clone)]
pub struct KmsKeyAuthority {
    client: aws_sdk_kms::Client,
    key_id: Option<String>,
}

impl KmsKeyAuthority {
    /// `key_id` is required for grants and encryption; decrypt pins it when set.
    pub fn new(client: aws_sdk_kms::Client, key_id: Option<String>) -> Self {
        Self { client, key_id }
    }

    fn key_id(&self, operation: &'static str) -> RelayResult<&str> {
        self.key_id
            .as_deref()
            .ok_or_else(|| RelayError::Config(format!("{operation} requires a KMS key id")))
    }
}

impl KeyAuthority for KmsKeyAuthority {
    async fn create_grant(&self, request: &GrantRequest) -> RelayResult<IssuedGrant> {
        let key_id = self.key_id("kms.create_grant")?;
        let operations = request
            .operations
            .iter()
            .map(|operation| match operation {
                GrantOperation::Decrypt => KmsGrantOperation::Decrypt,
            })
            .collect();

        let output = self
            .client
            .create_grant()
            .key_id(key_id)
            .grantee_principal(&request.grantee)
            .name(&request.name)
            .set_operations(Some(operations))
            .send()
            .await
            .map_err(|error| {
                RelayError::provider("kms.create_grant", DisplayErrorContext(&error))
            })?;

        match (output.grant_id(), output.grant_token()) {
            (Some(grant_id), Some(grant_token)) => Ok(IssuedGrant {
                grant_id: grant_id.to_string(),
                grant_token: grant_token.to_string(),
            }),
            _ => Err(RelayError::provider(
                "kms.create_grant",
                "response is missing the grant id or token",
            )),
        }
    }

    async fn revoke_grant(&self, grant_id: &str) -> RelayResult<()> {
        let key_id = self.key_id("kms.revoke_grant")?;
        self.client
            .revoke_grant()
            .key_id(key_id)
            .grant_id(grant_id)
            .send()
            .await
            .map(|_| ())
            .map_err(|error| RelayError::provider("kms.revoke_grant", DisplayErrorContext(&error)))
    }

    async fn encrypt(&self, plaintext: &[u8], binding: &Binding) -> RelayResult<Vec<u8>> {
        let key_id = self.key_id("kms.encrypt")?;
        let output = self
            .client
            .encrypt()
            .key_id(key_id)
            .plaintext(Blob::new(plaintext))
            .set_encryption_context(Some(binding.to_context()))
            .send()
            .await
            .map_err(|error| RelayError::provider("kms.encrypt", DisplayErrorContext(&error)))?;

        output
            .ciphertext_blob()
            .map(|blob| blob.as_ref().to_vec())
            .ok_or_else(|| RelayError::provider("kms.encrypt", "response has no ciphertext"))
    }

    async fn decrypt(
        &self,
        ciphertext: &[u8],
        grant_tokens: &[String],
        binding: &Binding,
    ) -> RelayResult<Vec<u8>> {
        let output = self
            .client
            .decrypt()
            .set_key_id(self.key_id.clone())
            .ciphertext_blob(Blob::new(ciphertext))
            .set_grant_tokens(Some(grant_tokens.to_vec()))
            .set_encryption_context(Some(binding.to_context()))
            .send()
            .await
            .map_err(classify_decrypt_error)?;

        output
            .plaintext()
            .map(|blob| blob.as_ref().to_vec())
            .ok_or_else(|| RelayError::provider("kms.decrypt", "response has no plaintext"))
    }
}

fn classify_decrypt_error<E, R>(error: SdkError<E, R>) -> RelayError
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
    R: std::fmt::Debug,
{
    if let SdkError::ServiceError(service) = &error {
        let code = service.err().code();
        if is_decrypt_rejection(code) {
            let message = service.err().message().unwrap_or("no message");
            let reason = format!("{}: {message}", code.unwrap_or_default());
            return RelayError::authorization("kms.decrypt", reason);
        }
    }
    RelayError::provider("kms.decrypt", DisplayErrorContext(&error))
}

fn is_decrypt_rejection(code: Option<&str>) -> bool {
    code.is_some_and(|code| DECRYPT_REJECTION_CODES.contains(&code))
}
