pub mod backup;
pub mod store;
