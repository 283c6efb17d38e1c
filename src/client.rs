//! Client for the Restbase auth and data services.
//!
//! Developer-friendly goal: keep the public surface small and predictable.
//! Implementation details are split into submodules under `src/client/`.

mod auth;
pub mod builder;
mod classification;
pub mod core;
mod data;
pub mod endpoint;
mod execution;
pub mod request;
mod tokens;

pub use builder::RestbaseClientBuilder;
pub use core::RestbaseClient;
pub use request::{RequestDescriptor, Service};
