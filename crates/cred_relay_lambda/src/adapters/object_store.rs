use std::future::Future;
use std::time::Duration;

use cred_relay_core::error::RelayResult;

/// Lifetime of the upload reference handed to a wrapped function.
pub const OUTPUT_URL_TTL: Duration = Duration::from_secs(20 * 60);

pub trait ObjectStore: Send + Sync {
    /// Returns a credential-free reference allowing one PUT of `key` within `ttl`.
    fn presign_put(
        &self,
        key: &str,
        ttl: Duration,
    ) -> impl Future<Output = RelayResult<String>> + Send;
}
