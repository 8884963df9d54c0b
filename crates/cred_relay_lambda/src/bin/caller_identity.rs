//! Sample wrapped function: reports which principal the relayed credentials
//! resolve to in the target account, echoing the payload it was given.

use cred_relay_core::error::BoxError;
use cred_relay_lambda::handlers::wrapper::{json_handler, ScopedSession};
use cred_relay_lambda::logging::init_tracing;
use cred_relay_lambda::runtime::run_wrapped;
use lambda_runtime::Error;
use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct CallerIdentity {
    account: Option<String>,
    arn: Option<String>,
    region: String,
    payload: Value,
}

async fn describe_caller(
    session: ScopedSession,
    payload: Value,
) -> Result<CallerIdentity, BoxError> {
    let sdk_config = session.sdk_config().await;
    let output = aws_sdk_sts::Client::new(&sdk_config)
        .get_caller_identity()
        .send()
        .await?;

    Ok(CallerIdentity {
        account: output.account().map(str::to_string),
        arn: output.arn().map(str::to_string),
        region: session.region().to_string(),
        payload,
    })
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    init_tracing();
    run_wrapped(json_handler(describe_caller)).await
}
