use std::str::FromStr;

use cred_relay_core::error::{RelayError, RelayResult};
use cred_relay_core::template::Template;

use crate::adapters::aws::sts::DEFAULT_PARTITION;
use crate::handlers::role_assumer::RoleAssumerConfig;

pub const MODE_ENV: &str = "RELAY_MODE";
pub const KMS_KEY_ENV: &str = "RELAY_KMS_KEY_ID";
pub const OUTPUT_BUCKET_ENV: &str = "RELAY_OUTPUT_BUCKET";
pub const OUTPUT_KEY_PATTERN_ENV: &str = "RELAY_OUTPUT_KEY_PATTERN";
pub const ROLE_SESSION_PATTERN_ENV: &str = "RELAY_ROLE_SESSION_PATTERN";
pub const PARTITION_ENV: &str = "RELAY_IAM_PARTITION";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuntimeMode {
    GrantCreator,
    GrantRevoker,
    AssumeRole,
}

impl FromStr for RuntimeMode {
    type Err = RelayError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "GrantCreator" => Ok(Self::GrantCreator),
            "GrantRevoker" => Ok(Self::GrantRevoker),
            "AssumeRole" => Ok(Self::AssumeRole),
            other => Err(RelayError::Config(format!(
                "{MODE_ENV} must be GrantCreator, GrantRevoker or AssumeRole, got '{other}'"
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleAssumerSettings {
    pub output_bucket: String,
    pub partition: String,
    pub templates: RoleAssumerConfig,
}

/// Settings for the `relay_runtime` binary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeConfig {
    pub mode: RuntimeMode,
    pub kms_key_id: String,
    pub role_assumer: Option<RoleAssumerSettings>,
}

impl RuntimeConfig {
    pub fn from_env() -> RelayResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads settings through `lookup`; only the AssumeRole mode needs the
    /// bucket and templates, and those are parsed here so a bad pattern fails
    /// at startup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> RelayResult<Self> {
        let mode = required(&lookup, MODE_ENV)?.parse::<RuntimeMode>()?;
        let kms_key_id = required(&lookup, KMS_KEY_ENV)?;

        let role_assumer = match mode {
            RuntimeMode::AssumeRole => Some(RoleAssumerSettings {
                output_bucket: required(&lookup, OUTPUT_BUCKET_ENV)?,
                partition: optional(&lookup, PARTITION_ENV)
                    .unwrap_or_else(|| DEFAULT_PARTITION.to_string()),
                templates: RoleAssumerConfig {
                    key_pattern: Template::parse(&required(&lookup, OUTPUT_KEY_PATTERN_ENV)?)?,
                    session_pattern: Template::parse(&required(
                        &lookup,
                        ROLE_SESSION_PATTERN_ENV,
                    )?)?,
                },
            }),
            RuntimeMode::GrantCreator | RuntimeMode::GrantRevoker => None,
        };

        Ok(Self {
            mode,
            kms_key_id,
            role_assumer,
        })
    }
}

/// Optional key pinning for the wrapper's decrypt calls.
pub fn wrapper_kms_key_id() -> Option<String> {
    optional(&|key: &str| std::env::var(key).ok(), KMS_KEY_ENV)
}

fn required(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> RelayResult<String> {
    optional(lookup, key).ok_or_else(|| RelayError::Config(format!("{key} must be configured")))
}

fn optional(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<String> {
    lookup(key)
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
