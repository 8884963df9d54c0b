use aws_sdk_lambda::error::DisplayErrorContext;
use cred_relay_core::error::{RelayError, RelayResult};

use crate::adapters::function_registry::{FunctionDescription, FunctionRegistry};

#[derive(Debug, Clone)]
pub struct LambdaFunctionRegistry {
    client: aws_sdk_lambda::Client,
}

impl LambdaFunctionRegistry {
    pub fn new(client: aws_sdk_lambda::Client) -> Self {
        Self { client }
    }
}

impl FunctionRegistry for LambdaFunctionRegistry {
    async fn get_function(&self, function: &str) -> RelayResult<FunctionDescription> {
        let output = self
            .client
            .get_function()
            .function_name(function)
            .send()
            .await
            .map_err(|error| {
                RelayError::provider("lambda.get_function", DisplayErrorContext(&error))
            })?;

        let execution_role = output
            .configuration()
            .and_then(|configuration| configuration.role())
            .ok_or_else(|| {
                RelayError::provider(
                    "lambda.get_function",
                    format!("function '{function}' has no execution role"),
                )
            })?;

        Ok(FunctionDescription {
            execution_role: execution_role.to_string(),
        })
    }
}
