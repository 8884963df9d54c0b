pub mod aws;
pub mod function_registry;
pub mod identity_broker;
pub mod key_authority;
pub mod object_store;
pub mod result_sink;
