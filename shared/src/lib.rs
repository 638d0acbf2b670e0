pub mod account;
pub mod project;
pub mod task;
