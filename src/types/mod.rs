//! # Types Module
//!
//! Values that cross the client boundary.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Payload`] | Classified body of a successful response |
//! | [`TokenState`] | Access/refresh token pair held by a client |
//! | [`wire`] | Request and response bodies of the fixed endpoints |

pub mod payload;
pub mod tokens;
pub mod wire;

pub use payload::Payload;
pub use tokens::TokenState;
