//! Common types shared by the loader device, the image formats and the reference board.
//!
//! This module provides:
//! 1. **Error Handling:** Setup, transaction, image-format and property error types.
//! 2. **Transaction Attributes:** The security/debug/requester metadata carried by writes.

/// Transaction attribute type.
pub mod attrs;

/// Error types.
pub mod error;

pub use attrs::MemTxAttrs;
pub use error::{ImageError, MemTxError, PatchError, PropertyError};
