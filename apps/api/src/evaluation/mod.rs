pub mod model;
pub mod prompts;
pub mod worker;
