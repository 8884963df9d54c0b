//! AWS implementations of the relay collaborators.

pub mod http;
pub mod kms;
pub mod lambda;
pub mod s3;
pub mod sts;

pub use http::HttpResultSink;
pub use kms::KmsKeyAuthority;
pub use lambda::LambdaFunctionRegistry;
pub use s3::S3ObjectStore;
pub use sts::StsIdentityBroker;
