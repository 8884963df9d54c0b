use cred_relay_core::contract::{
    AssumeRoleInput, AssumeRoleOutput, Binding, Credentials, SecretPayload,
};
use cred_relay_core::error::{RelayError, RelayResult};
use cred_relay_core::identifiers::{ExecutionArn, FunctionArn};
use cred_relay_core::template::{Template, TemplateVariables};
use tracing::{error, info};
use zeroize::Zeroizing;

use crate::adapters::identity_broker::IdentityBroker;
use crate::adapters::key_authority::KeyAuthority;
use crate::adapters::object_store::{ObjectStore, OUTPUT_URL_TTL};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleAssumerConfig {
    pub key_pattern: Template,
    pub session_pattern: Template,
}

/// Produces sealed credentials for one (execution, target) pair.
#[derive(Debug, Clone)]
pub struct RoleAssumer<B, K, S> {
    broker: B,
    key_authority: K,
    store: S,
    config: RoleAssumerConfig,
}

impl<B, K, S> RoleAssumer<B, K, S>
where
    B: IdentityBroker,
    K: KeyAuthority,
    S: ObjectStore,
{
    pub fn new(broker: B, key_authority: K, store: S, config: RoleAssumerConfig) -> Self {
        Self {
            broker,
            key_authority,
            store,
            config,
        }
    }

    /// Assumes the target role and seals its secret key together with a
    /// fresh upload reference under `input.grantee`.
    ///
    /// Any failing step aborts the call; no partial credentials are returned.
    pub async fn assume_role(&self, input: &AssumeRoleInput) -> RelayResult<AssumeRoleOutput> {
        let result = self.try_assume_role(input).await;
        match &result {
            Ok(_) => info!(
                component = "role_assumer",
                event = "credentials_sealed",
                execution_id = %input.execution_id,
                account_id = %input.context.account_id,
                region = %input.context.region,
                role_name = %input.context.role_name,
                grantee = %input.grantee,
            ),
            Err(failure) => error!(
                component = "role_assumer",
                event = "assume_role_failed",
                execution_id = %input.execution_id,
                account_id = %input.context.account_id,
                region = %input.context.region,
                role_name = %input.context.role_name,
                error = %failure,
            ),
        }
        result
    }

    async fn try_assume_role(&self, input: &AssumeRoleInput) -> RelayResult<AssumeRoleOutput> {
        if input.grantee.is_empty() {
            return Err(RelayError::validation(
                "grantee is required to bind the sealed credentials",
            ));
        }

        let execution = ExecutionArn::parse(&input.execution_id)?;
        let function = FunctionArn::parse(&input.function)?;
        let variables = TemplateVariables::new(&execution, &function, &input.context);
        let object_key = self.config.key_pattern.render(&variables)?;
        let session_name = self.config.session_pattern.render(&variables)?;

        let assumed = self
            .broker
            .assume_role(&input.context.role_ref(), &session_name)
            .await?;
        let output_url = self.store.presign_put(&object_key, OUTPUT_URL_TTL).await?;

        let secret = SecretPayload {
            secret_access_key: assumed.secret_access_key.clone(),
            output_url,
        };
        let plaintext = Zeroizing::new(secret.to_plaintext()?);
        let encrypted = self
            .key_authority
            .encrypt(&plaintext, &Binding::recipient(input.grantee.as_str()))
            .await?;

        Ok(AssumeRoleOutput {
            context: input.context.clone(),
            credentials: Credentials {
                access_key_id: assumed.access_key_id.clone(),
                session_token: assumed.session_token.clone(),
                encrypted,
                grant: input.grant.clone(),
                grantee: input.grantee.clone(),
            },
        })
    }
}
