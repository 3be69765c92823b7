//! # URL Module
//!
//! Reverse routing and signed URLs. The [`UrlGenerator`] turns route names
//! and parameter sets back into URLs against an immutable
//! [`UrlGenerationContext`]; the [`UrlSigner`] layers tamper-proof,
//! expiring signatures on top.
//!
//! Generation is synchronous and infallible once inputs are valid: every
//! failure mode (unknown route, missing segment value, requirement
//! mismatch, un-URL-able value) is a [`crate::errors::UrlGenerationError`]
//! raised at the call site, never a malformed URL in the output.

mod context;
mod generator;
mod signer;

pub use context::{Scheme, UrlGenerationContext};
pub use generator::{ParamValue, UrlGenerator, UrlKind, FRAGMENT_KEY};
pub use signer::{SigningError, UrlSigner, EXPIRES_KEY, SIGNATURE_KEY};
