//! Lambda runtime glue shared by the binaries.

use std::future::Future;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use aws_config::BehaviorVersion;
use cred_relay_core::error::{RelayError, RelayResult};
use lambda_runtime::{service_fn, Diagnostic, LambdaEvent};
use serde_json::value::RawValue;

use crate::adapters::aws::{HttpResultSink, KmsKeyAuthority};
use crate::config::wrapper_kms_key_id;
use crate::handlers::wrapper::{WrappedHandler, Wrapper};

/// Time kept back from the invocation deadline so a timeout can still be
/// reported as a `Cancelled` failure before the runtime kills the process.
pub const DEADLINE_MARGIN: Duration = Duration::from_millis(500);

pub fn invocation_deadline(context: &lambda_runtime::Context) -> SystemTime {
    UNIX_EPOCH + Duration::from_millis(context.deadline)
}

/// Runs `call` until `deadline` (less [`DEADLINE_MARGIN`]). An unfinished call
/// is dropped, which cancels its in-flight request; nothing it already did is
/// undone.
pub async fn with_deadline<T>(
    operation: &'static str,
    deadline: SystemTime,
    call: impl Future<Output = RelayResult<T>>,
) -> RelayResult<T> {
    let remaining = deadline
        .duration_since(SystemTime::now())
        .unwrap_or_default()
        .saturating_sub(DEADLINE_MARGIN);

    tokio::time::timeout(remaining, call)
        .await
        .unwrap_or(Err(RelayError::Cancelled { operation }))
}

/// Lambda error response for a relay failure. `errorType` is the failure
/// kind, so an orchestrator can branch on it without parsing the message.
pub fn diagnostic(error: RelayError) -> Diagnostic {
    Diagnostic {
        error_type: error.kind().as_str().to_string(),
        error_message: error.to_string(),
    }
}

type AwsWrapper<H> = Wrapper<KmsKeyAuthority, HttpResultSink, H>;

/// Starts the Lambda event loop for a wrapped function.
///
/// Call from the function's `main`. The key authority uses the default AWS
/// configuration of the function itself; `RELAY_KMS_KEY_ID`, when set, pins
/// the key accepted for decryption.
pub async fn run_wrapped<H: WrappedHandler>(handler: H) -> Result<(), lambda_runtime::Error> {
    let aws_config = aws_config::load_defaults(BehaviorVersion::latest()).await;
    let kms = aws_sdk_kms::Client::new(&aws_config);
    let wrapper = Wrapper::new(
        KmsKeyAuthority::new(kms, wrapper_kms_key_id()),
        HttpResultSink::new()?,
        handler,
    );
    let wrapper = &wrapper;

    lambda_runtime::run(service_fn(move |event| invoke_wrapped(wrapper, event))).await
}

async fn invoke_wrapped<H: WrappedHandler>(
    wrapper: &AwsWrapper<H>,
    event: LambdaEvent<Box<RawValue>>,
) -> Result<(), Diagnostic> {
    let deadline = invocation_deadline(&event.context);
    let call = wrapper.invoke(event.payload.get().as_bytes());
    with_deadline("wrapper.invoke", deadline, call)
        .await
        .map_err(diagnostic)
}
