#![allow(dead_code)]

use cred_relay_core::contract::{
    AssumeRoleInput, AssumeRoleOutput, Context, GrantInput, WrapEnvelope,
};
use cred_relay_core::template::Template;
use cred_relay_lambda::handlers::granter::Granter;
use cred_relay_lambda::handlers::role_assumer::{RoleAssumer, RoleAssumerConfig};
use cred_relay_lambda::test_helpers::{
    InMemoryFunctionRegistry, InMemoryIdentityBroker, InMemoryKeyAuthority, InMemoryObjectStore,
};
use serde_json::value::RawValue;

pub const EXECUTION: &str = "arn:aws:states:us-east-1:999999999999:execution:Inventory:run-7";
pub const WORKER_FUNCTION: &str = "arn:aws:lambda:us-east-1:999999999999:function:Worker";
pub const WORKER_ROLE: &str = "arn:aws:iam::999999999999:role/worker";
pub const AUDIT_FUNCTION: &str = "arn:aws:lambda:us-east-1:999999999999:function:Audit:prod";
pub const AUDIT_ROLE: &str = "arn:aws:iam::999999999999:role/audit";
pub const RESULTS_BUCKET: &str = "relay-results";

pub type TestGranter = Granter<InMemoryKeyAuthority, InMemoryFunctionRegistry>;
pub type TestRoleAssumer =
    RoleAssumer<InMemoryIdentityBroker, InMemoryKeyAuthority, InMemoryObjectStore>;

/// All relay hops wired to one shared in-memory key authority.
pub struct RelayHarness {
    pub key_authority: InMemoryKeyAuthority,
    pub broker: InMemoryIdentityBroker,
    pub worker_granter: TestGranter,
    pub audit_granter: TestGranter,
    pub assumer: TestRoleAssumer,
}

impl RelayHarness {
    pub fn new() -> Self {
        let key_authority = InMemoryKeyAuthority::new();
        let broker = InMemoryIdentityBroker::new();
        let config = RoleAssumerConfig {
            key_pattern: Template::parse("{StateMachine}/{ExecutionId}/{AccountId}-{Region}.json")
                .expect("key pattern"),
            session_pattern: Template::parse("{Function}-{ExecutionId}").expect("session pattern"),
        };

        Self {
            worker_granter: Granter::new(
                key_authority.clone(),
                InMemoryFunctionRegistry::with_function(WORKER_FUNCTION, WORKER_ROLE),
            ),
            audit_granter: Granter::new(
                key_authority.clone(),
                InMemoryFunctionRegistry::with_function(AUDIT_FUNCTION, AUDIT_ROLE),
            ),
            assumer: RoleAssumer::new(
                broker.clone(),
                key_authority.clone(),
                InMemoryObjectStore::new(RESULTS_BUCKET),
                config,
            ),
            key_authority,
            broker,
        }
    }
}

pub fn grant_input(function: &str) -> GrantInput {
    GrantInput {
        execution_id: EXECUTION.to_string(),
        function: function.to_string(),
    }
}

pub fn target(account_id: &str) -> Context {
    Context {
        account_id: account_id.to_string(),
        region: "eu-central-1".to_string(),
        role_name: "InventoryReader".to_string(),
    }
}

pub fn assume_input(
    context: Context,
    grant_token: &str,
    grantee: &str,
    function: &str,
) -> AssumeRoleInput {
    AssumeRoleInput {
        context,
        execution_id: EXECUTION.to_string(),
        grant: grant_token.to_string(),
        grantee: grantee.to_string(),
        function: function.to_string(),
    }
}

pub fn envelope(assumed: AssumeRoleOutput, payload: &str) -> Vec<u8> {
    let payload = RawValue::from_string(payload.to_string()).expect("payload should be JSON");
    serde_json::to_vec(&WrapEnvelope::new(assumed, payload)).expect("serialize envelope")
}
