//! Routers: admin resource routes and common service routes.

mod common;
mod resource;

pub use common::common_routes_with_ready;
pub use resource::admin_routes;
