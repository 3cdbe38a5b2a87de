pub mod app;
pub mod deployment;
pub mod run;
