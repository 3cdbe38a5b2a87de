pub mod deployment;
pub mod prediction;
