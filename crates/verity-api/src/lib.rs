//! Typed resources for the Verity fabric API.
//!
//! This crate declares a slice of the Verity resource catalog on top of the
//! `verity-core` runtime, together with session login and the system level
//! operations.

#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod client;
pub mod models;
pub mod resource;
pub mod session;
pub mod system;

pub use client::VerityClient;
pub use resource::{
    DeleteRequest, GetRequest, PatchRequest, PutRequest, Resource, ResourceMap, ResourceService,
};
pub use session::{AuthResponse, Credentials, LoginRequest};
pub use system::{SystemMode, UpgradeRequest, VersionInfo, VersionRequest};

/// Convenient result alias that reuses the shared Verity error type.
pub type Result<T> = verity_core::Result<T>;
