//! CPU and address-space resolution.

use crate::common::PatchError;
use crate::soc::traits::{AddressSpaceId, Machine};

/// A CPU chosen at setup together with the address space it issues transactions into.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ResolvedCpu {
    /// CPU index in system enumeration order.
    pub index: u32,
    /// The CPU's address space.
    pub space: AddressSpaceId,
}

/// Maps an optional CPU index onto a concrete CPU.
///
/// `None` selects the machine's first CPU. A named CPU that does not exist is fatal, as is
/// a machine without any CPU.
pub fn resolve_cpu(machine: &dyn Machine, cpu_num: Option<u32>) -> Result<ResolvedCpu, PatchError> {
    let index = match cpu_num {
        Some(index) => index,
        None => machine.first_cpu().ok_or(PatchError::NoCpu)?,
    };
    let cpu = machine
        .cpu(index)
        .ok_or(PatchError::UnresolvedCpu(index))?;

    Ok(ResolvedCpu {
        index,
        space: cpu.address_space(),
    })
}
