mod support;

use std::collections::HashSet;
use std::sync::Arc;

use cred_relay_core::contract::{Binding, SecretPayload};
use cred_relay_core::error::ErrorKind;
use cred_relay_lambda::adapters::key_authority::{GrantRequest, KeyAuthority};
use support::relay::{assume_input, target, RelayHarness, WORKER_FUNCTION};
use tokio::task::JoinSet;

const FANOUT: usize = 50;

fn grantee(index: usize) -> String {
    format!("arn:aws:iam::999999999999:role/worker-{index}")
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_assumptions_stay_bound_to_their_grantee() {
    let harness = RelayHarness::new();
    let mut tokens = Vec::with_capacity(FANOUT);
    for index in 0..FANOUT {
        let request = GrantRequest::decrypt_only(grantee(index), "CredentialRelay-run-7");
        let issued = harness
            .key_authority
            .create_grant(&request)
            .await
            .expect("grant");
        tokens.push(issued.grant_token);
    }

    let assumer = Arc::new(harness.assumer);
    let mut tasks = JoinSet::new();
    for (index, token) in tokens.iter().enumerate() {
        let assumer = Arc::clone(&assumer);
        let input = assume_input(
            target(&format!("{:012}", 100_000_000_000u64 + index as u64)),
            token,
            &grantee(index),
            WORKER_FUNCTION,
        );
        tasks.spawn(async move { (index, assumer.assume_role(&input).await) });
    }

    let mut outputs = vec![None; FANOUT];
    while let Some(joined) = tasks.join_next().await {
        let (index, result) = joined.expect("task should not panic");
        outputs[index] = Some(result.expect("assume role"));
    }
    let outputs: Vec<_> = outputs
        .into_iter()
        .map(|output| output.expect("every task reports"))
        .collect();

    let mut secrets = HashSet::new();
    let mut urls = HashSet::new();
    for (index, output) in outputs.iter().enumerate() {
        assert_eq!(output.credentials.grantee, grantee(index));
        let plaintext = harness
            .key_authority
            .decrypt(
                &output.credentials.encrypted,
                &[tokens[index].clone()],
                &Binding::recipient(grantee(index)),
            )
            .await
            .expect("own grantee should unseal");
        let secret = SecretPayload::from_plaintext(&plaintext).expect("secret payload");
        let expected_suffix = format!("/{}-eu-central-1.json?", output.context.account_id);
        assert!(secret.output_url.contains(&expected_suffix));
        secrets.insert(secret.secret_access_key.clone());
        urls.insert(secret.output_url.clone());

        let other = (index + 1) % FANOUT;
        let cross = harness
            .key_authority
            .decrypt(
                &output.credentials.encrypted,
                &[tokens[other].clone()],
                &Binding::recipient(grantee(other)),
            )
            .await
            .expect_err("another grantee must not unseal");
        assert_eq!(cross.kind(), ErrorKind::Authorization);

        let borrowed_token = harness
            .key_authority
            .decrypt(
                &output.credentials.encrypted,
                &[tokens[other].clone()],
                &Binding::recipient(grantee(index)),
            )
            .await
            .expect_err("another grantee's token must not unseal");
        assert_eq!(borrowed_token.kind(), ErrorKind::Authorization);
    }

    assert_eq!(secrets.len(), FANOUT);
    assert_eq!(urls.len(), FANOUT);
    assert_eq!(harness.broker.sessions().len(), FANOUT);
}
