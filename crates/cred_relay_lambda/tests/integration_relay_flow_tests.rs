mod support;

use cred_relay_core::contract::{RevokeInput, SecretPayload};
use cred_relay_core::error::{BoxError, ErrorKind};
use cred_relay_lambda::handlers::wrapper::{ScopedSession, Wrapper};
use cred_relay_lambda::test_helpers::CapturingResultSink;
use support::relay::{
    assume_input, envelope, grant_input, target, RelayHarness, AUDIT_FUNCTION, AUDIT_ROLE,
    RESULTS_BUCKET, WORKER_FUNCTION, WORKER_ROLE,
};

async fn report_secret(session: ScopedSession, payload: Vec<u8>) -> Result<Vec<u8>, BoxError> {
    let credentials = session.credentials();
    let mut output = credentials.secret_access_key().as_bytes().to_vec();
    output.push(b'|');
    output.extend(payload);
    Ok(output)
}

#[tokio::test]
async fn relays_credentials_from_grant_to_result_object() {
    let harness = RelayHarness::new();
    let grant = harness
        .worker_granter
        .grant(&grant_input(WORKER_FUNCTION))
        .await
        .expect("grant");
    assert_eq!(grant.grantee, WORKER_ROLE);

    let input = assume_input(
        target("111111111111"),
        &grant.grant_token,
        &grant.grantee,
        WORKER_FUNCTION,
    );
    let assumed = harness
        .assumer
        .assume_role(&input)
        .await
        .expect("assume role");
    let sealed = harness
        .key_authority
        .sealed_plaintext(&assumed.credentials.encrypted)
        .expect("sealed record");
    let secret = SecretPayload::from_plaintext(&sealed.plaintext).expect("secret payload");
    let expected_prefix = format!(
        "https://{RESULTS_BUCKET}.s3.example/Inventory/run-7/111111111111-eu-central-1.json?"
    );
    assert!(secret.output_url.starts_with(&expected_prefix));

    let payload = r#"{"Tables": [ "orders","users" ], "Limit": 10.0}"#;
    let sink = CapturingResultSink::new();
    let wrapper = Wrapper::new(harness.key_authority.clone(), sink.clone(), report_secret);
    wrapper
        .invoke(&envelope(assumed, payload))
        .await
        .expect("invoke");

    let sessions = harness.broker.sessions();
    let session_secret = &sessions[0].credentials.secret_access_key;
    let expected = format!("{session_secret}|{payload}");
    let writes = sink.writes();
    assert_eq!(writes.len(), 1);
    assert_eq!(writes[0].0, secret.output_url);
    assert_eq!(writes[0].1, expected.into_bytes());

    harness
        .worker_granter
        .revoke(&RevokeInput {
            grant_id: grant.grant_id.clone(),
        })
        .await
        .expect("revoke");
    let record = harness.key_authority.grant(&grant.grant_id);
    assert!(record.expect("grant record").revoked);
}

#[tokio::test]
async fn omitted_grant_token_cannot_unseal() {
    let harness = RelayHarness::new();
    let grant = harness
        .worker_granter
        .grant(&grant_input(WORKER_FUNCTION))
        .await
        .expect("grant");
    let input = assume_input(target("111111111111"), "", &grant.grantee, WORKER_FUNCTION);
    let assumed = harness
        .assumer
        .assume_role(&input)
        .await
        .expect("assume role");

    let sink = CapturingResultSink::new();
    let error = Wrapper::new(harness.key_authority.clone(), sink.clone(), report_secret)
        .invoke(&envelope(assumed, "{}"))
        .await
        .expect_err("unseal should fail");

    assert_eq!(error.kind(), ErrorKind::Authorization);
    assert!(sink.writes().is_empty());
}

#[tokio::test]
async fn another_functions_grant_cannot_unseal() {
    let harness = RelayHarness::new();
    harness
        .worker_granter
        .grant(&grant_input(WORKER_FUNCTION))
        .await
        .expect("worker grant");
    let audit_grant = harness
        .audit_granter
        .grant(&grant_input(AUDIT_FUNCTION))
        .await
        .expect("audit grant");
    assert_eq!(audit_grant.grantee, AUDIT_ROLE);

    let input = assume_input(
        target("111111111111"),
        &audit_grant.grant_token,
        WORKER_ROLE,
        WORKER_FUNCTION,
    );
    let assumed = harness
        .assumer
        .assume_role(&input)
        .await
        .expect("assume role");

    let sink = CapturingResultSink::new();
    let error = Wrapper::new(harness.key_authority.clone(), sink.clone(), report_secret)
        .invoke(&envelope(assumed, "{}"))
        .await
        .expect_err("unseal should fail");
    assert_eq!(error.kind(), ErrorKind::Authorization);
    assert!(sink.writes().is_empty());
}

#[tokio::test]
async fn rewritten_grantee_does_not_match_the_seal() {
    let harness = RelayHarness::new();
    let worker_grant = harness
        .worker_granter
        .grant(&grant_input(WORKER_FUNCTION))
        .await
        .expect("worker grant");
    let audit_grant = harness
        .audit_granter
        .grant(&grant_input(AUDIT_FUNCTION))
        .await
        .expect("audit grant");

    let input = assume_input(
        target("111111111111"),
        &worker_grant.grant_token,
        &worker_grant.grantee,
        WORKER_FUNCTION,
    );
    let mut assumed = harness
        .assumer
        .assume_role(&input)
        .await
        .expect("assume role");
    assumed.credentials.grant = audit_grant.grant_token.clone();
    assumed.credentials.grantee = audit_grant.grantee.clone();

    let sink = CapturingResultSink::new();
    let error = Wrapper::new(harness.key_authority.clone(), sink.clone(), report_secret)
        .invoke(&envelope(assumed, "{}"))
        .await
        .expect_err("unseal should fail");
    assert_eq!(error.kind(), ErrorKind::Authorization);
    assert!(sink.writes().is_empty());
}

#[tokio::test]
async fn revoked_grant_cannot_unseal() {
    let harness = RelayHarness::new();
    let grant = harness
        .worker_granter
        .grant(&grant_input(WORKER_FUNCTION))
        .await
        .expect("grant");
    let input = assume_input(
        target("111111111111"),
        &grant.grant_token,
        &grant.grantee,
        WORKER_FUNCTION,
    );
    let assumed = harness
        .assumer
        .assume_role(&input)
        .await
        .expect("assume role");

    harness
        .worker_granter
        .revoke(&RevokeInput {
            grant_id: grant.grant_id,
        })
        .await
        .expect("revoke");

    let sink = CapturingResultSink::new();
    let error = Wrapper::new(harness.key_authority.clone(), sink.clone(), report_secret)
        .invoke(&envelope(assumed, "{}"))
        .await
        .expect_err("unseal should fail");
    assert_eq!(error.kind(), ErrorKind::Authorization);
    assert!(sink.writes().is_empty());
}

#[tokio::test]
async fn repeated_grant_for_an_execution_shares_the_name() {
    let harness = RelayHarness::new();
    let first = harness
        .worker_granter
        .grant(&grant_input(WORKER_FUNCTION))
        .await
        .expect("first grant");
    let second = harness
        .worker_granter
        .grant(&grant_input(WORKER_FUNCTION))
        .await
        .expect("second grant");

    assert_ne!(first.grant_id, second.grant_id);
    let first_name = harness
        .key_authority
        .grant(&first.grant_id)
        .expect("first record")
        .request
        .name;
    let second_name = harness
        .key_authority
        .grant(&second.grant_id)
        .expect("second record")
        .request
        .name;
    assert_eq!(first_name, "CredentialRelay-run-7");
    assert_eq!(first_name, second_name);
}

#[tokio::test]
async fn revoking_twice_surfaces_the_provider_error() {
    let harness = RelayHarness::new();
    let grant = harness
        .worker_granter
        .grant(&grant_input(WORKER_FUNCTION))
        .await
        .expect("grant");
    let revoke = RevokeInput {
        grant_id: grant.grant_id,
    };

    harness
        .worker_granter
        .revoke(&revoke)
        .await
        .expect("first revoke");
    let error = harness
        .worker_granter
        .revoke(&revoke)
        .await
        .expect_err("second revoke should fail");
    assert_eq!(error.kind(), ErrorKind::Provider);
}

#[tokio::test]
async fn unknown_function_fails_the_grant() {
    let harness = RelayHarness::new();
    let error = harness
        .worker_granter
        .grant(&grant_input(AUDIT_FUNCTION))
        .await
        .expect_err("grant should fail");
    assert_eq!(error.kind(), ErrorKind::Provider);
    assert_eq!(harness.key_authority.grant_count(), 0);
}
