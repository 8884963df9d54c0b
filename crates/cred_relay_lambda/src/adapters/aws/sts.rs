use aws_sdk_sts::error::DisplayErrorContext;
use cred_relay_core::contract::RoleRef;
use cred_relay_core::error::{RelayError, RelayResult};

use crate::adapters::identity_broker::{AssumedCredentials, IdentityBroker};

pub const DEFAULT_PARTITION: &str = "aws";

#[derive(Debug, Clone)]
pub struct StsIdentityBroker {
    client: aws_sdk_sts::Client,
    partition: String,
}

impl StsIdentityBroker {
    pub fn new(client: aws_sdk_sts::Client, partition: impl Into<String>) -> Self {
        Self {
            client,
            partition: partition.into(),
        }
    }
}

/// IAM role ARN for an account-scoped role reference.
pub fn role_arn(partition: &str, role: &RoleRef) -> String {
    format!(
        "arn:{partition}:iam::{}:role/{}",
        role.account_id, role.role_name
    )
}

impl IdentityBroker for StsIdentityBroker {
    async fn assume_role(
        &self,
        role: &RoleRef,
        session_name: &str,
    ) -> RelayResult<AssumedCredentials> {
        let output = self
            .client
            .assume_role()
            .role_arn(role_arn(&self.partition, role))
            .role_session_name(session_name)
            .send()
            .await
            .map_err(|error| {
                RelayError::provider("sts.assume_role", DisplayErrorContext(&error))
            })?;

        let credentials = output
            .credentials()
            .ok_or_else(|| RelayError::provider("sts.assume_role", "missing credentials"))?;

        Ok(AssumedCredentials {
            access_key_id: credentials.access_key_id().to_string(),
            secret_access_key: credentials.secret_access_key().to_string(),
            session_token: credentials.session_token().to_string(),
        })
    }
}
