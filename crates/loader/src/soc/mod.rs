//! Host side of the loader.
//!
//! This module defines the capabilities a loader consumes and a small reference machine
//! implementing them. It is organized into:
//! 1. **Traits:** `CpuCore`, `AddressSpace`, `Machine`, `ResetRegistry`, `ResetAction`.
//! 2. **Harts:** A reference 64-bit CPU.
//! 3. **Memory:** RAM regions behind an attribute-checking address space.
//! 4. **Board:** Platform construction, readiness and reset dispatch.

/// Reference board and platform.
pub mod board;

/// Reference CPU.
pub mod hart;

/// RAM regions and the system address space.
pub mod memory;

/// Reset callback table.
pub mod reset;

/// Host capability traits.
pub mod traits;

pub use board::{Board, Platform, SYSTEM_MEMORY};
pub use hart::Hart;
pub use memory::{MemoryRegion, SystemMemory};
pub use reset::ResetTable;
pub use traits::{
    AddressSpace, AddressSpaceId, CpuCore, Machine, ResetAction, ResetRegistry, ResetToken,
};
