//! awsutils Core
//!
//! Resource model, schemas and provider seams shared by the awsutils
//! provider and its command line driver.

pub mod differ;
pub mod effect;
pub mod interpreter;
pub mod plan;
pub mod provider;
pub mod resource;
pub mod retry;
pub mod schema;
