pub mod pending;
pub mod record_store;
