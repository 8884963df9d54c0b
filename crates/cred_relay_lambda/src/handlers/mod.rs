pub mod granter;
pub mod role_assumer;
pub mod wrapper;
