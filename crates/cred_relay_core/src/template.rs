//! Storage-key and session-name patterns.
//!
//! A pattern is literal text with `{Name}` placeholders; `{{` and `}}` stand
//! for literal braces. Only the six [`Variable`]s exist and none of them has a
//! fallback: an unknown name fails at parse time and an empty value fails at
//! render time.

use crate::contract::Context;
use crate::error::{RelayError, RelayResult};
use crate::identifiers::{ExecutionArn, FunctionArn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Variable {
    StateMachine,
    ExecutionId,
    Function,
    FunctionQualifier,
    AccountId,
    Region,
}

impl Variable {
    pub const ALL: [Variable; 6] = [
        Self::StateMachine,
        Self::ExecutionId,
        Self::Function,
        Self::FunctionQualifier,
        Self::AccountId,
        Self::Region,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::StateMachine => "StateMachine",
            Self::ExecutionId => "ExecutionId",
            Self::Function => "Function",
            Self::FunctionQualifier => "FunctionQualifier",
            Self::AccountId => "AccountId",
            Self::Region => "Region",
        }
    }

    fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|variable| variable.name() == name)
    }
}

/// Values substituted into a [`Template`] for one (execution, target) pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateVariables {
    pub state_machine: String,
    pub execution_id: String,
    pub function: String,
    pub function_qualifier: String,
    pub account_id: String,
    pub region: String,
}

impl TemplateVariables {
    pub fn new(execution: &ExecutionArn, function: &FunctionArn, context: &Context) -> Self {
        Self {
            state_machine: execution.state_machine().to_string(),
            execution_id: execution.execution_id().to_string(),
            function: function.function().to_string(),
            function_qualifier: function.qualifier().to_string(),
            account_id: context.account_id.clone(),
            region: context.region.clone(),
        }
    }

    pub fn get(&self, variable: Variable) -> &str {
        match variable {
            Variable::StateMachine => &self.state_machine,
            Variable::ExecutionId => &self.execution_id,
            Variable::Function => &self.function,
            Variable::FunctionQualifier => &self.function_qualifier,
            Variable::AccountId => &self.account_id,
            Variable::Region => &self.region,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Variable(Variable),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    source: String,
    segments: Vec<Segment>,
}

impl Template {
    pub fn parse(source: &str) -> RelayResult<Self> {
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut chars = source.char_indices().peekable();

        while let Some((offset, c)) = chars.next() {
            match c {
                '{' if chars.peek().map(|(_, next)| *next) == Some('{') => {
                    chars.next();
                    literal.push('{');
                }
                '{' => {
                    let mut name = String::new();
                    let mut closed = false;
                    for (_, inner) in chars.by_ref() {
                        match inner {
                            '}' => {
                                closed = true;
                                break;
                            }
                            '{' => {
                                return Err(RelayError::validation(format!(
                                    "template '{source}' nests '{{' inside the placeholder at offset {offset}"
                                )));
                            }
                            other => name.push(other),
                        }
                    }
                    if !closed {
                        return Err(RelayError::validation(format!(
                            "template '{source}' has an unclosed placeholder at offset {offset}"
                        )));
                    }

                    let name = name.trim();
                    let variable = Variable::from_name(name).ok_or_else(|| {
                        RelayError::validation(format!(
                            "template '{source}' references unknown variable '{name}'"
                        ))
                    })?;
                    if !literal.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut literal)));
                    }
                    segments.push(Segment::Variable(variable));
                }
                '}' if chars.peek().map(|(_, next)| *next) == Some('}') => {
                    chars.next();
                    literal.push('}');
                }
                '}' => {
                    return Err(RelayError::validation(format!(
                        "template '{source}' has an unmatched '}}' at offset {offset}"
                    )));
                }
                other => literal.push(other),
            }
        }

        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        Ok(Self {
            source: source.to_string(),
            segments,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn render(&self, variables: &TemplateVariables) -> RelayResult<String> {
        let mut rendered = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => rendered.push_str(text),
                Segment::Variable(variable) => {
                    let value = variables.get(*variable);
                    if value.is_empty() {
                        return Err(RelayError::validation(format!(
                            "template '{}' needs {} but it is empty",
                            self.source,
                            variable.name()
                        )));
                    }
                    rendered.push_str(value);
                }
            }
        }

        if rendered.is_empty() {
            return Err(RelayError::validation(format!(
                "template '{}' rendered to an empty string",
                self.source
            )));
        }
        Ok(rendered)
    }
}
