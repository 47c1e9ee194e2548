//! Repositories - registration, validation and call dispatch.

mod config;
mod dispatcher;
mod predefined;
mod registry;
mod repository;
mod validator;

pub use config::RegistryConfig;
pub use predefined::PredefinedOp;
pub use registry::{RegistryBuilder, RepositoryRegistry};
pub use repository::Repository;
pub use validator::compile_method;
