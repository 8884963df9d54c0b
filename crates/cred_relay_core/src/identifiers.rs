//! Structured identifiers handed to the relay by the orchestrator.
//!
//! Both identifiers are colon-delimited with a fixed layout. The segment count
//! is checked before any field is read, so a short identifier is a
//! `ValidationError` instead of an out-of-range access.

use crate::error::{RelayError, RelayResult};

pub const EXECUTION_SEGMENTS: usize = 8;
pub const FUNCTION_MIN_SEGMENTS: usize = 7;
pub const FUNCTION_MAX_SEGMENTS: usize = 8;
pub const DEFAULT_FUNCTION_QUALIFIER: &str = "LATEST";
pub const GRANT_NAME_PREFIX: &str = "CredentialRelay-";
pub const MAX_GRANT_NAME_LEN: usize = 256;

const NAME_SEGMENT: usize = 6;
const SUFFIX_SEGMENT: usize = 7;

/// A workflow execution identifier, e.g.
/// `arn:aws:states:us-east-1:111111111111:execution:Fanout:run-42`.
///
/// Anything past the eighth segment stays part of the execution suffix, which
/// keeps express executions (`...:express:Fanout:run-42:uuid`) intact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionArn {
    state_machine: String,
    execution_id: String,
}

impl ExecutionArn {
    pub fn parse(value: &str) -> RelayResult<Self> {
        let segments: Vec<&str> = value.splitn(EXECUTION_SEGMENTS, ':').collect();
        if segments.len() != EXECUTION_SEGMENTS {
            return Err(RelayError::validation(format!(
                "execution id '{value}' has {} colon-delimited segments, expected {EXECUTION_SEGMENTS}",
                segments.len()
            )));
        }

        let state_machine = segments[NAME_SEGMENT];
        let execution_id = segments[SUFFIX_SEGMENT];
        if state_machine.is_empty() || execution_id.is_empty() {
            return Err(RelayError::validation(format!(
                "execution id '{value}' must name both a state machine and an execution"
            )));
        }

        Ok(Self {
            state_machine: state_machine.to_string(),
            execution_id: execution_id.to_string(),
        })
    }

    pub fn state_machine(&self) -> &str {
        &self.state_machine
    }

    pub fn execution_id(&self) -> &str {
        &self.execution_id
    }

    /// Authorization name derived from the execution suffix.
    ///
    /// Two grants for the same execution always carry the same name, which is
    /// how an orchestrator spots a duplicate grant after a retry. Characters
    /// the key authority does not accept in names are replaced with `-`.
    pub fn grant_name(&self) -> String {
        let mut name = String::with_capacity(GRANT_NAME_PREFIX.len() + self.execution_id.len());
        name.push_str(GRANT_NAME_PREFIX);
        name.extend(self.execution_id.chars().map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, ':' | '/' | '_' | '-') {
                c
            } else {
                '-'
            }
        }));
        name.truncate(MAX_GRANT_NAME_LEN);
        name
    }
}

/// A function identifier in full form, with or without a trailing qualifier:
/// `arn:aws:lambda:us-east-1:111111111111:function:Foo[:qualifier]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionArn {
    function: String,
    qualifier: Option<String>,
}

impl FunctionArn {
    pub fn parse(value: &str) -> RelayResult<Self> {
        let segments: Vec<&str> = value.splitn(FUNCTION_MAX_SEGMENTS, ':').collect();
        if !(FUNCTION_MIN_SEGMENTS..=FUNCTION_MAX_SEGMENTS).contains(&segments.len()) {
            return Err(RelayError::validation(format!(
                "function '{value}' has {} colon-delimited segments, expected {FUNCTION_MIN_SEGMENTS} or {FUNCTION_MAX_SEGMENTS}",
                segments.len()
            )));
        }

        let function = segments[NAME_SEGMENT];
        if function.is_empty() {
            return Err(RelayError::validation(format!(
                "function '{value}' has an empty function name"
            )));
        }

        let qualifier = match segments.get(SUFFIX_SEGMENT) {
            Some(&"") => {
                return Err(RelayError::validation(format!(
                    "function '{value}' has an empty qualifier"
                )));
            }
            Some(qualifier) => Some(qualifier.to_string()),
            None => None,
        };

        Ok(Self {
            function: function.to_string(),
            qualifier,
        })
    }

    pub fn function(&self) -> &str {
        &self.function
    }

    pub fn qualifier(&self) -> &str {
        self.qualifier
            .as_deref()
            .unwrap_or(DEFAULT_FUNCTION_QUALIFIER)
    }
}
