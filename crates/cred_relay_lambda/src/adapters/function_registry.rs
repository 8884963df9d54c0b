use std::future::Future;

use cred_relay_core::error::RelayResult;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionDescription {
    pub execution_role: String,
}

pub trait FunctionRegistry: Send + Sync {
    /// Resolves a function name or ARN to its current runtime identity.
    fn get_function(
        &self,
        function: &str,
    ) -> impl Future<Output = RelayResult<FunctionDescription>> + Send;
}
