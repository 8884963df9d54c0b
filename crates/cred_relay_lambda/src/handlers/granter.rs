use cred_relay_core::contract::{GrantInput, GrantOutput, RevokeInput};
use cred_relay_core::error::RelayResult;
use cred_relay_core::identifiers::ExecutionArn;
use tracing::{error, info};

use crate::adapters::function_registry::FunctionRegistry;
use crate::adapters::key_authority::{GrantRequest, KeyAuthority};

/// Issues and revokes the decrypt grant for one execution and one function.
#[derive(Debug, Clone)]
pub struct Granter<K, F> {
    key_authority: K,
    functions: F,
}

impl<K: KeyAuthority, F: FunctionRegistry> Granter<K, F> {
    pub fn new(key_authority: K, functions: F) -> Self {
        Self {
            key_authority,
            functions,
        }
    }

    /// Grants `Decrypt` to the function's current execution role.
    ///
    /// The grant name depends only on the execution, so repeating the call
    /// creates a second grant with the same name. There is no retry here.
    pub async fn grant(&self, input: &GrantInput) -> RelayResult<GrantOutput> {
        let result = self.try_grant(input).await;
        match &result {
            Ok(output) => info!(
                component = "granter",
                event = "grant_created",
                execution_id = %input.execution_id,
                function = %input.function,
                grant_id = %output.grant_id,
                grantee = %output.grantee,
            ),
            Err(failure) => error!(
                component = "granter",
                event = "grant_failed",
                execution_id = %input.execution_id,
                function = %input.function,
                error = %failure,
            ),
        }
        result
    }

    async fn try_grant(&self, input: &GrantInput) -> RelayResult<GrantOutput> {
        let execution = ExecutionArn::parse(&input.execution_id)?;
        let name = execution.grant_name();

        let function = self.functions.get_function(&input.function).await?;
        let request = GrantRequest::decrypt_only(function.execution_role, name);
        let issued = self.key_authority.create_grant(&request).await?;

        Ok(GrantOutput {
            grant_id: issued.grant_id,
            grant_token: issued.grant_token,
            grantee: request.grantee,
        })
    }

    /// Revokes a grant. Errors for unknown or already revoked grants come back
    /// from the key authority unchanged.
    pub async fn revoke(&self, input: &RevokeInput) -> RelayResult<()> {
        let result = self.key_authority.revoke_grant(&input.grant_id).await;
        match &result {
            Ok(()) => info!(
                component = "granter",
                event = "grant_revoked",
                grant_id = %input.grant_id,
            ),
            Err(failure) => error!(
                component = "granter",
                event = "revoke_failed",
                grant_id = %input.grant_id,
                error = %failure,
            ),
        }
        result
    }
}
