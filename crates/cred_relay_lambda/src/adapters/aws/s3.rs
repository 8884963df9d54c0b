use std::time::Duration;

use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::presigning::PresigningConfig;
use cred_relay_core::error::{RelayError, RelayResult};

use crate::adapters::object_store::ObjectStore;

#[derive(Debug, Clone)]
pub struct S3ObjectStore {
    bucket: String,
    s3_client: aws_sdk_s3::Client,
}

impl S3ObjectStore {
    pub fn new(s3_client: aws_sdk_s3::Client, bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            s3_client,
        }
    }
}

impl ObjectStore for S3ObjectStore {
    async fn presign_put(&self, key: &str, ttl: Duration) -> RelayResult<String> {
        let presigning = PresigningConfig::expires_in(ttl)
            .map_err(|error| RelayError::provider("s3.presign_put", error))?;

        let request = self
            .s3_client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .presigned(presigning)
            .await
            .map_err(|error| RelayError::provider("s3.presign_put", DisplayErrorContext(&error)))?;

        Ok(request.uri().to_string())
    }
}
