//! Memory transaction attributes.

use serde::Deserialize;

/// Metadata attached to every address-space transaction.
///
/// The loader never interprets these fields itself; they are forwarded verbatim to the
/// address space, which may use them to gate access (e.g. secure-only RAM).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Deserialize)]
pub struct MemTxAttrs {
    /// Transaction originates from the secure world.
    #[serde(default)]
    pub secure: bool,
    /// Debugger-originated access.
    #[serde(default)]
    pub debug: bool,
    /// Bus requester identifier.
    #[serde(default)]
    pub requester_id: u16,
}

impl MemTxAttrs {
    /// Attributes used for image loading: non-secure, non-debug, requester 0.
    pub const UNSPECIFIED: Self = Self {
        secure: false,
        debug: false,
        requester_id: 0,
    };
}
