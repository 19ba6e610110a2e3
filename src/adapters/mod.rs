pub mod sender;
pub mod store;
