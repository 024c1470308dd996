//! Error types for loader setup, reset replay and memory transactions.
//!
//! This module defines the failure taxonomy of the loader device. It provides:
//! 1. **Setup errors:** `PatchError`, surfaced synchronously when a loader is attached.
//! 2. **Transaction errors:** `MemTxError`, reported by an `AddressSpace` read or write.
//! 3. **Format errors:** `ImageError`, reported by a single image-format loader attempt.
//! 4. **Property errors:** `PropertyError`, for malformed `key=value` configuration strings.

use std::path::PathBuf;

use thiserror::Error;

/// Failures raised while attaching a loader or replaying its reset action.
///
/// Every setup failure is fatal: the loader stays unregistered and performs no side
/// effects. `Transaction` is the only variant a reset replay can produce.
#[derive(Debug, Error)]
pub enum PatchError {
    /// Two mutually exclusive modes were requested at once.
    #[error("conflicting options: {0}")]
    ConflictingOptions(&'static str),

    /// An option required by the selected mode is absent.
    #[error("missing required option: {0}")]
    MissingRequiredOption(&'static str),

    /// A length or register index exceeds what the device supports.
    #[error("out of range: {0}")]
    OutOfRange(String),

    /// The configured CPU index does not name an existing CPU.
    #[error("nonexistent boot CPU #{0}")]
    UnresolvedCpu(u32),

    /// The machine has no CPU at all, so no address space can be chosen.
    #[error("no CPU available to resolve an address space")]
    NoCpu,

    /// Every image format (including raw) rejected the file.
    #[error("cannot load specified image {}", path.display())]
    ImageLoadFailure {
        /// Path of the image that could not be loaded.
        path: PathBuf,
    },

    /// The register name is not of the form `r<index>`.
    #[error("unsupported register: {0}")]
    UnparsableRegisterName(String),

    /// The resolved CPU's address space disappeared from the machine.
    #[error("address space {0} is not attached to the machine")]
    MissingAddressSpace(usize),

    /// A memory transaction failed while replaying the patch.
    #[error("memory transaction failed: {0}")]
    Transaction(#[from] MemTxError),

    /// A configuration string could not be parsed.
    #[error(transparent)]
    Property(#[from] PropertyError),
}

/// Address-space transaction failures.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum MemTxError {
    /// No region decodes the address.
    #[error("no memory mapped at {addr:#x}")]
    Unmapped {
        /// First unmapped address.
        addr: u64,
    },

    /// The access starts inside a region but runs past its end.
    #[error("access of {len} bytes at {addr:#x} crosses a region boundary")]
    OutOfBounds {
        /// Start address of the access.
        addr: u64,
        /// Length of the access in bytes.
        len: usize,
    },

    /// The region refused the transaction attributes (e.g. non-secure access to secure RAM).
    #[error("transaction at {addr:#x} denied by region attributes")]
    Denied {
        /// Start address of the access.
        addr: u64,
    },
}

/// A single image-format attempt failed.
///
/// The sequencer treats every variant as "try the next format"; only exhaustion of all
/// formats becomes a `PatchError`.
#[derive(Debug, Error)]
pub enum ImageError {
    /// The file does not carry this format's signature.
    #[error("not a {0} image")]
    Unrecognized(&'static str),

    /// The file carries the signature but its contents are inconsistent.
    #[error("malformed {format} image: {reason}")]
    Malformed {
        /// Format name.
        format: &'static str,
        /// What was wrong.
        reason: String,
    },

    /// The file is well-formed but uses a feature this loader does not implement.
    #[error("unsupported {format} image: {reason}")]
    Unsupported {
        /// Format name.
        format: &'static str,
        /// The unsupported feature.
        reason: String,
    },

    /// The image does not fit in the machine's memory.
    #[error("image of {size} bytes exceeds the {max} byte limit")]
    TooLarge {
        /// Image size in bytes.
        size: u64,
        /// Largest accepted size in bytes.
        max: u64,
    },

    /// A parsed segment could not be written into the target address space.
    #[error("segment write failed: {0}")]
    Write(#[from] MemTxError),
}

impl ImageError {
    /// Shorthand for a `Malformed` error.
    pub fn malformed(format: &'static str, reason: impl Into<String>) -> Self {
        Self::Malformed {
            format,
            reason: reason.into(),
        }
    }
}

/// Errors from the `key=value,...` property surface.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum PropertyError {
    /// An item had no `=`.
    #[error("property `{0}` has no value")]
    MissingValue(String),

    /// The key is not a loader property.
    #[error("unknown property `{0}`")]
    UnknownKey(String),

    /// The same key appeared twice.
    #[error("property `{0}` given more than once")]
    Duplicate(String),

    /// The value does not parse as the property's type.
    #[error("invalid value `{value}` for property `{key}`")]
    InvalidValue {
        /// Property name.
        key: String,
        /// Offending value.
        value: String,
    },

    /// A JSON configuration failed to deserialize.
    #[error("invalid JSON configuration: {0}")]
    Json(String),
}
