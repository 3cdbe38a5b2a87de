pub mod deployments;
pub mod predictions;
