pub mod extract;
pub mod handlers;
pub mod storage;
pub mod store;
pub mod validation;
