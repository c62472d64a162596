//! Identity provider boundary.
//!
//! This module provides the `IdentityClient` for the remote sign-up and
//! sign-in endpoints, the `IdentityApi` seam the session store calls
//! through, and the closed `AuthError` taxonomy both surface.

pub mod client;
pub mod error;

pub use client::{IdentityApi, IdentityClient, IdentityResponse, DEFAULT_PROVIDER_URL};
pub use error::AuthError;
