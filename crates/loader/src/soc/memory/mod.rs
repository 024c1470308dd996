//! Physical System Memory.
//!
//! This module implements the reference board's address space. It provides:
//! 1. **Buffer:** Lazily committed backing storage (`DramBuffer`) for each RAM region.
//! 2. **Regions:** RAM windows mapped at a base address, optionally secure-only.
//! 3. **Routing:** `AddressSpace` reads and writes decoded to a single region.

/// DRAM buffer implementation (mmap or heap) for raw byte storage.
pub mod buffer;

use self::buffer::DramBuffer;
use super::traits::AddressSpace;
use crate::common::{MemTxAttrs, MemTxError};

/// A RAM window.
#[derive(Debug)]
pub struct MemoryRegion {
    name: String,
    base: u64,
    buffer: DramBuffer,
    secure_only: bool,
}

impl MemoryRegion {
    /// Creates a zeroed region of `size` bytes at `base`.
    pub fn new(name: impl Into<String>, base: u64, size: u64, secure_only: bool) -> Self {
        Self {
            name: name.into(),
            base,
            buffer: DramBuffer::new(size as usize),
            secure_only,
        }
    }

    /// Region name (e.g. `"DRAM"`).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// (base address, size in bytes).
    pub fn address_range(&self) -> (u64, u64) {
        (self.base, self.buffer.len() as u64)
    }

    /// Only secure transactions may access this region.
    pub const fn is_secure_only(&self) -> bool {
        self.secure_only
    }

    fn contains(&self, addr: u64) -> bool {
        addr >= self.base && addr - self.base < self.buffer.len() as u64
    }
}

/// All RAM regions reachable by the board's harts.
#[derive(Debug, Default)]
pub struct SystemMemory {
    regions: Vec<MemoryRegion>,
}

impl SystemMemory {
    /// An empty address space.
    pub fn new() -> Self {
        Self::default()
    }

    /// Maps `region`; regions are kept sorted by base address.
    pub fn add_region(&mut self, region: MemoryRegion) {
        self.regions.push(region);
        self.regions.sort_by_key(|r| r.base);
    }

    /// Mapped regions in address order.
    pub fn regions(&self) -> &[MemoryRegion] {
        &self.regions
    }

    /// Finds the region for an access and checks bounds and attributes.
    fn route(&self, addr: u64, len: usize, attrs: MemTxAttrs) -> Result<(usize, usize), MemTxError> {
        let (idx, region) = self
            .regions
            .iter()
            .enumerate()
            .find(|(_, r)| r.contains(addr))
            .ok_or(MemTxError::Unmapped { addr })?;

        if region.secure_only && !attrs.secure {
            return Err(MemTxError::Denied { addr });
        }

        let offset = (addr - region.base) as usize;
        if len > region.buffer.len() - offset {
            return Err(MemTxError::OutOfBounds { addr, len });
        }
        Ok((idx, offset))
    }
}

impl AddressSpace for SystemMemory {
    fn read(&mut self, addr: u64, buf: &mut [u8], attrs: MemTxAttrs) -> Result<(), MemTxError> {
        if buf.is_empty() {
            return Ok(());
        }
        let (idx, offset) = self.route(addr, buf.len(), attrs)?;
        let bytes = self.regions[idx]
            .buffer
            .read_slice(offset, buf.len())
            .ok_or(MemTxError::OutOfBounds {
                addr,
                len: buf.len(),
            })?;
        buf.copy_from_slice(bytes);
        Ok(())
    }

    fn write(&mut self, addr: u64, data: &[u8], attrs: MemTxAttrs) -> Result<(), MemTxError> {
        if data.is_empty() {
            return Ok(());
        }
        let (idx, offset) = self.route(addr, data.len(), attrs)?;
        if self.regions[idx].buffer.write_slice(offset, data) {
            Ok(())
        } else {
            Err(MemTxError::OutOfBounds {
                addr,
                len: data.len(),
            })
        }
    }

    fn check(&self, addr: u64, len: usize, attrs: MemTxAttrs) -> Result<(), MemTxError> {
        if len == 0 {
            return Ok(());
        }
        self.route(addr, len, attrs).map(|_| ())
    }
}
