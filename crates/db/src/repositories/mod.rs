pub mod app_repo;
pub mod app_version_repo;
pub mod deployment_repo;
pub mod run_repo;

pub use app_repo::AppRepo;
pub use app_version_repo::AppVersionRepo;
pub use deployment_repo::DeploymentRepo;
pub use run_repo::RunRepo;
