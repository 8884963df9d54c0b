use std::future::Future;

use cred_relay_core::error::RelayResult;

/// Unauthenticated writer for presigned upload references.
pub trait ResultSink: Send + Sync {
    fn put(&self, url: &str, body: Vec<u8>) -> impl Future<Output = RelayResult<()>> + Send;
}
