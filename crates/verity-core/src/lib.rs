//! # verity-core
//!
//! Request/response runtime shared by every Verity API operation.
//!
//! ## Modules
//!
//! - [`config`] - Client configuration, HTTP tuning and server selection
//! - [`server`] - Templated server catalog
//! - [`context`] - Per-call auth overlay, server overrides, deadline and cancellation
//! - [`auth`] - Credentials and session tokens
//! - [`params`] - Parameter serialization styles
//! - [`content`] - Content negotiation
//! - [`request`] - Operation descriptors and request assembly
//! - [`transport`] - Sending, rate-limit retry and redacted dumps
//! - [`client`] - The shared [`ApiClient`]
//! - [`codec`] - Strict and polymorphic model decoding
//! - [`nullable`] - Tri-state optional values
//! - [`error`] - Error envelope and taxonomy

#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod auth;
pub mod client;
pub mod codec;
pub mod config;
pub mod content;
pub mod context;
pub mod error;
pub mod nullable;
pub mod params;
pub mod request;
pub mod server;
pub mod transport;

// Re-export commonly used types
pub use auth::{ApiKey, ApiKeyScheme, AuthContext, BasicAuth, SessionTokens, TokenSource};
pub use client::ApiClient;
pub use codec::{Assignment, Reference, ResourceType};
pub use config::{Configuration, HttpConfig, RateLimitPolicy};
pub use context::CallContext;
pub use error::{report_error, Error, ErrorKind, GenericApiError, Result};
pub use nullable::Nullable;
pub use params::{
    parameter_add_to_header_or_query, parameter_to_string, ParamValue, QueryParams, Style,
};
pub use request::{Operation, PreparedRequest, RequestBody, RequestParts};
pub use server::{ServerConfiguration, ServerVariable, ServerVariables};
pub use transport::ApiResponse;

