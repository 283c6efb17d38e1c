//! # restbase
//!
//! Authenticated request layer for a backend that exposes two services at
//! distinct base URLs: an **auth service** (login, signup, token refresh,
//! logout) and a **data service** (table management and record CRUD).
//!
//! ## Overview
//!
//! Every call goes through one execution engine, [`RestbaseClient::execute`],
//! which:
//!
//! - picks the base URL and default headers of the target [`Service`]
//! - merges headers and injects `Authorization: Bearer <token>` when a token is held
//! - sends the request over a pluggable [`transport::Transport`] under a per-attempt timeout
//! - classifies the response into a [`Payload`] or an [`Error`]
//! - on a 401 from the data service, refreshes the access token once and replays the call once
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use restbase::{ClientConfig, RestbaseClient};
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> restbase::Result<()> {
//!     let config = ClientConfig::new("https://auth.example.com", "https://data.example.com");
//!     let client = RestbaseClient::new(config)?;
//!
//!     client.login("ada@example.com", "secret").await?;
//!
//!     let record = json!({"name": "Ada", "rol": "admin"});
//!     let row = client.create("users", record.as_object().unwrap()).await?;
//!     let admins = client.get_where("users", json!({"rol": "admin"}).as_object().unwrap()).await?;
//!     println!("{row} / {} admins", admins.len());
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`client`] | Client, builder, request descriptors and the execution engine |
//! | [`config`] | Base URLs, default headers, timeout |
//! | [`transport`] | Transport trait and the reqwest implementation |
//! | [`types`] | Payload, token state and wire bodies |
//! | [`error`] | Error taxonomy |

pub mod client;
pub mod config;
pub mod error;
pub mod transport;
pub mod types;

pub use client::{RequestDescriptor, RestbaseClient, RestbaseClientBuilder, Service};
pub use config::ClientConfig;
pub use error::{Error, ErrorContext, ErrorKind};
pub use transport::{HttpRequest, HttpResponse, HttpTransport, Method, Transport, TransportError};
pub use types::{Payload, TokenState};

/// Result type alias for the library
pub type Result<T> = std::result::Result<T, Error>;
