//! HTTP surface for the welli access-control engine

pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod state;
