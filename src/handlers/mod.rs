//! HTTP handlers for the admin routes.

pub mod resource;
pub use resource::*;
