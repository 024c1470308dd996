//! Host capabilities consumed by the loader device.
//!
//! The loader never owns CPUs or memory; it reaches them through these traits. It needs:
//! 1. **CPU control:** `CpuCore` for full reset, program-counter override and register writes.
//! 2. **Memory:** `AddressSpace` for attribute-tagged reads, writes and write checks.
//! 3. **Machine view:** `Machine` for CPU lookup, address-space lookup, RAM size and readiness.
//! 4. **Reset dispatch:** `ResetRegistry` and `ResetAction` for per-reset replay.
//!
//! Every trait is object-safe so hosts (and tests) can supply their own implementations.

use std::fmt;
use std::sync::Arc;

use crate::common::{MemTxAttrs, MemTxError, PatchError};

/// Identifies one address space of a machine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AddressSpaceId(pub usize);

impl fmt::Display for AddressSpaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "as{}", self.0)
    }
}

/// A virtual CPU as seen by the loader.
pub trait CpuCore: Send {
    /// Performs a full architectural reset.
    fn reset(&mut self);

    /// Overrides the program counter.
    fn set_pc(&mut self, pc: u64);

    /// Returns the current program counter.
    fn pc(&self) -> u64;

    /// Writes one register from its 8-byte in-memory image.
    ///
    /// Returns the number of bytes consumed; `0` means the CPU refused the register.
    fn write_register(&mut self, index: usize, value: &[u8; 8]) -> usize;

    /// Address space this CPU issues its memory transactions into.
    fn address_space(&self) -> AddressSpaceId;
}

/// A memory view that accepts attribute-tagged transactions.
pub trait AddressSpace: Send {
    /// Reads `buf.len()` bytes starting at `addr`.
    fn read(&mut self, addr: u64, buf: &mut [u8], attrs: MemTxAttrs) -> Result<(), MemTxError>;

    /// Writes `data` starting at `addr`.
    fn write(&mut self, addr: u64, data: &[u8], attrs: MemTxAttrs) -> Result<(), MemTxError>;

    /// Reports whether a `len`-byte write at `addr` would be accepted, without performing it.
    fn check(&self, addr: u64, len: usize, attrs: MemTxAttrs) -> Result<(), MemTxError>;
}

/// The surrounding machine: CPUs, their memory and the boot milestone.
pub trait Machine {
    /// Looks up the CPU with the given index.
    fn cpu(&self, index: u32) -> Option<&dyn CpuCore>;

    /// Mutable lookup of the CPU with the given index.
    fn cpu_mut(&mut self, index: u32) -> Option<&mut dyn CpuCore>;

    /// Index of the first CPU in system enumeration order, if any.
    fn first_cpu(&self) -> Option<u32>;

    /// Mutable lookup of an address space.
    fn address_space_mut(&mut self, id: AddressSpaceId) -> Option<&mut dyn AddressSpace>;

    /// Total addressable RAM in bytes; bounds raw image loads.
    fn ram_size(&self) -> u64;

    /// True once the machine has finished its start-of-day initialisation.
    fn is_ready(&self) -> bool;
}

/// Work replayed on every machine reset.
pub trait ResetAction: Send + Sync + fmt::Debug {
    /// Runs the action against the machine.
    fn reset(&self, machine: &mut dyn Machine) -> Result<(), PatchError>;
}

/// Handle returned by a `ResetRegistry`, required to unregister.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResetToken(pub u64);

/// The host's table of reset callbacks.
pub trait ResetRegistry {
    /// Adds `action` to the reset sequence and returns its token.
    fn register(&mut self, action: Arc<dyn ResetAction>) -> ResetToken;

    /// Removes the action registered under `token`. Returns `false` if it was unknown.
    fn unregister(&mut self, token: ResetToken) -> bool;
}
