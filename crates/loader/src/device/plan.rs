//! The resolved reset action of one loader.
//!
//! A `ResetPlan` is computed once at setup and replayed unchanged on every reset. The
//! replay order is fixed:
//! 1. **PC override:** full CPU reset, then program counter := effective address.
//! 2. **Register defaults:** every populated slot is written through the CPU.
//! 3. **Literal write:** the converted bytes are written to the effective address.
//!
//! The CPU reset comes first so that it cannot clobber the patched registers or PC.

use tracing::{debug, warn};

use super::data::LiteralData;
use super::mode::ModeKind;
use super::register::RegisterDefaults;
use super::resolve::ResolvedCpu;
use crate::common::{MemTxAttrs, PatchError};
use crate::soc::traits::{Machine, ResetAction};

/// Resolved, immutable state of an attached loader.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResetPlan {
    pub(crate) mode: ModeKind,
    pub(crate) cpu: ResolvedCpu,
    pub(crate) address: u64,
    pub(crate) set_pc: bool,
    pub(crate) data: Option<LiteralData>,
    pub(crate) registers: RegisterDefaults,
    pub(crate) attrs: MemTxAttrs,
}

impl ResetPlan {
    /// Mode selected at setup.
    pub const fn mode(&self) -> ModeKind {
        self.mode
    }

    /// CPU and address space resolved at setup.
    pub const fn cpu(&self) -> ResolvedCpu {
        self.cpu
    }

    /// Address used for the PC override or literal write.
    ///
    /// For structured images this is the entry point reported by the format loader.
    pub const fn effective_address(&self) -> u64 {
        self.address
    }

    /// Whether each reset overrides the program counter.
    pub const fn sets_pc(&self) -> bool {
        self.set_pc
    }

    /// Literal written on each reset, for data-write loaders.
    pub const fn data(&self) -> Option<&LiteralData> {
        self.data.as_ref()
    }

    /// Register defaults applied on each reset.
    pub const fn registers(&self) -> &RegisterDefaults {
        &self.registers
    }

    /// Attributes of the literal write.
    pub const fn attrs(&self) -> MemTxAttrs {
        self.attrs
    }

    /// Replays the plan against `machine`.
    pub fn apply(&self, machine: &mut dyn Machine) -> Result<(), PatchError> {
        if self.set_pc || !self.registers.is_empty() {
            let cpu = machine
                .cpu_mut(self.cpu.index)
                .ok_or(PatchError::UnresolvedCpu(self.cpu.index))?;

            if self.set_pc {
                debug!(cpu = self.cpu.index, pc = self.address, "resetting CPU and setting PC");
                cpu.reset();
                cpu.set_pc(self.address);
            }

            for (index, value) in self.registers.iter() {
                let written = cpu.write_register(index, &value);
                if written == 0 {
                    warn!(cpu = self.cpu.index, register = index, "CPU refused register default");
                } else {
                    debug!(cpu = self.cpu.index, register = index, "applied register default");
                }
            }
        }

        if let Some(data) = &self.data {
            let space = machine
                .address_space_mut(self.cpu.space)
                .ok_or(PatchError::MissingAddressSpace(self.cpu.space.0))?;
            debug!(
                addr = self.address,
                len = data.len(),
                space = %self.cpu.space,
                "writing literal data"
            );
            space.write(self.address, data.as_slice(), self.attrs)?;
        }

        Ok(())
    }
}

impl ResetAction for ResetPlan {
    fn reset(&self, machine: &mut dyn Machine) -> Result<(), PatchError> {
        self.apply(machine)
    }
}
