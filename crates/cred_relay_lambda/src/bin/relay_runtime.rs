use aws_config::BehaviorVersion;
use cred_relay_core::contract::{AssumeRoleInput, GrantInput, RevokeInput};
use cred_relay_core::error::{RelayError, RelayResult};
use cred_relay_lambda::adapters::aws::{
    KmsKeyAuthority, LambdaFunctionRegistry, S3ObjectStore, StsIdentityBroker,
};
use cred_relay_lambda::config::{RuntimeConfig, RuntimeMode};
use cred_relay_lambda::handlers::granter::Granter;
use cred_relay_lambda::handlers::role_assumer::RoleAssumer;
use cred_relay_lambda::logging::init_tracing;
use cred_relay_lambda::runtime::{diagnostic, invocation_deadline, with_deadline};
use lambda_runtime::{service_fn, Diagnostic, Error, LambdaEvent};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

type AwsGranter = Granter<KmsKeyAuthority, LambdaFunctionRegistry>;
type AwsRoleAssumer = RoleAssumer<StsIdentityBroker, KmsKeyAuthority, S3ObjectStore>;

enum Relay {
    GrantCreator(AwsGranter),
    GrantRevoker(AwsGranter),
    AssumeRole(AwsRoleAssumer),
}

impl Relay {
    async fn from_config(config: RuntimeConfig) -> Result<Self, Error> {
        let aws_config = aws_config::load_defaults(BehaviorVersion::latest()).await;
        let key_authority = KmsKeyAuthority::new(
            aws_sdk_kms::Client::new(&aws_config),
            Some(config.kms_key_id),
        );

        let relay = match config.mode {
            RuntimeMode::GrantCreator | RuntimeMode::GrantRevoker => {
                let granter = Granter::new(
                    key_authority,
                    LambdaFunctionRegistry::new(aws_sdk_lambda::Client::new(&aws_config)),
                );
                if config.mode == RuntimeMode::GrantCreator {
                    Self::GrantCreator(granter)
                } else {
                    Self::GrantRevoker(granter)
                }
            }
            RuntimeMode::AssumeRole => {
                let settings = config.role_assumer.ok_or_else(|| {
                    Error::from(RelayError::Config(
                        "AssumeRole mode needs bucket and pattern settings".to_string(),
                    ))
                })?;
                Self::AssumeRole(RoleAssumer::new(
                    StsIdentityBroker::new(
                        aws_sdk_sts::Client::new(&aws_config),
                        settings.partition,
                    ),
                    key_authority,
                    S3ObjectStore::new(
                        aws_sdk_s3::Client::new(&aws_config),
                        settings.output_bucket,
                    ),
                    settings.templates,
                ))
            }
        };
        Ok(relay)
    }

    async fn handle(&self, event: LambdaEvent<Value>) -> Result<Value, Diagnostic> {
        self.try_handle(event).await.map_err(diagnostic)
    }

    async fn try_handle(&self, event: LambdaEvent<Value>) -> RelayResult<Value> {
        let deadline = invocation_deadline(&event.context);
        match self {
            Self::GrantCreator(granter) => {
                let input: GrantInput = decode(event.payload)?;
                let call = granter.grant(&input);
                let output = with_deadline("granter.grant", deadline, call).await?;
                encode(&output)
            }
            Self::GrantRevoker(granter) => {
                let input: RevokeInput = decode(event.payload)?;
                let call = granter.revoke(&input);
                with_deadline("granter.revoke", deadline, call).await?;
                Ok(Value::Null)
            }
            Self::AssumeRole(assumer) => {
                let input: AssumeRoleInput = decode(event.payload)?;
                let call = assumer.assume_role(&input);
                let output = with_deadline("role_assumer.assume_role", deadline, call).await?;
                encode(&output)
            }
        }
    }
}

fn decode<T: DeserializeOwned>(payload: Value) -> RelayResult<T> {
    serde_json::from_value(payload)
        .map_err(|error| RelayError::validation_with("invalid relay event", error))
}

fn encode<T: Serialize>(output: &T) -> RelayResult<Value> {
    serde_json::to_value(output)
        .map_err(|error| RelayError::validation_with("failed to encode relay output", error))
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    init_tracing();
    let relay = Relay::from_config(RuntimeConfig::from_env()?).await?;
    let relay = &relay;
    lambda_runtime::run(service_fn(move |event| relay.handle(event))).await
}
