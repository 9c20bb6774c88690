pub mod agent;
pub mod tools;
