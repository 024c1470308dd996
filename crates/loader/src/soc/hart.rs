//! Reference hart.
//!
//! A minimal 64-bit CPU with 32 general-purpose registers and a program counter. It
//! provides:
//! 1. **Reset:** Restores zeroed registers and the configured reset vector.
//! 2. **Register writes:** Indices `0..=31` are GPRs, `32` is the PC; values are little-endian.
//! 3. **Invariant Enforcement:** `x0` is hard-wired to zero.

use super::traits::{AddressSpaceId, CpuCore};

/// Number of general-purpose registers.
pub const NUM_GPRS: usize = 32;

/// Register index that `write_register` maps to the program counter.
pub const PC_REGNUM: usize = 32;

/// General-purpose register file with `x0` hard-wired to zero.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Gpr {
    regs: [u64; NUM_GPRS],
}

impl Gpr {
    /// Creates a register file with all registers zeroed.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads register `idx`; `x0` and out-of-range indices read as zero.
    pub fn read(&self, idx: usize) -> u64 {
        if idx == 0 {
            0
        } else {
            self.regs.get(idx).copied().unwrap_or(0)
        }
    }

    /// Writes register `idx`; writes to `x0` are ignored.
    pub fn write(&mut self, idx: usize, val: u64) {
        if idx != 0 {
            if let Some(reg) = self.regs.get_mut(idx) {
                *reg = val;
            }
        }
    }
}

/// A reference CPU implementing `CpuCore`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Hart {
    /// Hart index.
    pub id: u32,
    /// General-purpose registers.
    pub regs: Gpr,
    /// Program counter.
    pub pc: u64,
    reset_pc: u64,
    space: AddressSpaceId,
}

impl Hart {
    /// Creates a hart in its reset state.
    pub fn new(id: u32, reset_pc: u64, space: AddressSpaceId) -> Self {
        Self {
            id,
            regs: Gpr::new(),
            pc: reset_pc,
            reset_pc,
            space,
        }
    }

    /// Formats all GPRs two per line, followed by the PC.
    pub fn dump(&self) -> String {
        let mut out = String::new();
        for i in (0..NUM_GPRS).step_by(2) {
            out.push_str(&format!(
                "x{:<2}={:#018x} x{:<2}={:#018x}\n",
                i,
                self.regs.read(i),
                i + 1,
                self.regs.read(i + 1)
            ));
        }
        out.push_str(&format!("pc ={:#018x}\n", self.pc));
        out
    }
}

impl CpuCore for Hart {
    fn reset(&mut self) {
        self.regs = Gpr::new();
        self.pc = self.reset_pc;
    }

    fn set_pc(&mut self, pc: u64) {
        self.pc = pc;
    }

    fn pc(&self) -> u64 {
        self.pc
    }

    fn write_register(&mut self, index: usize, value: &[u8; 8]) -> usize {
        let value = u64::from_le_bytes(*value);
        match index {
            0..NUM_GPRS => self.regs.write(index, value),
            PC_REGNUM => self.pc = value,
            _ => return 0,
        }
        8
    }

    fn address_space(&self) -> AddressSpaceId {
        self.space
    }
}
