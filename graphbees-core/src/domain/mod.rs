pub mod input;
pub mod solver;
pub mod tools;
pub mod types;
