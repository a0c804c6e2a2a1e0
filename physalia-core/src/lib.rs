//! Shared primitives for the Physalia protein-structure search ecosystem.
//!
//! `physalia-core` provides the foundation that the other Physalia crates
//! build on:
//!
//! - **Error types** — [`PhysaliaError`] and [`Result`] for structured error
//!   handling
//! - **Traits** — [`Annotated`], [`Summarizable`], [`ContentAddressable`]
//! - **Hashing** — SHA-256 content addressing for data integrity

pub mod error;
pub mod hash;
pub mod traits;

pub use error::{PhysaliaError, Result};
pub use traits::*;
