pub mod handlers;
pub mod queue;
pub mod service;
pub mod store;
