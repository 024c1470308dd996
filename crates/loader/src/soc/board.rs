//! Reference board construction and reset dispatch.
//!
//! This module builds a small machine from `BoardConfig`. It performs:
//! 1. **Harts:** Creates `cpus` harts sharing one address space.
//! 2. **Memory:** Maps main RAM and the optional secure-only window.
//! 3. **Boot milestone:** `machine_done` marks the machine ready and runs the first reset.
//! 4. **Reset dispatch:** `system_reset` restores hart defaults, then replays every
//!    registered reset action in registration order.

use tracing::{info, warn};

use super::hart::Hart;
use super::memory::{MemoryRegion, SystemMemory};
use super::reset::ResetTable;
use super::traits::{AddressSpace, AddressSpaceId, CpuCore, Machine};
use crate::common::PatchError;
use crate::config::BoardConfig;

/// Address space shared by all harts of the reference board.
pub const SYSTEM_MEMORY: AddressSpaceId = AddressSpaceId(0);

/// CPUs, memory and boot state; the `Machine` seen by loaders.
#[derive(Debug)]
pub struct Platform {
    /// Harts in enumeration order.
    pub harts: Vec<Hart>,
    /// The shared address space.
    pub memory: SystemMemory,
    ram_size: u64,
    ready: bool,
}

impl Platform {
    /// Builds harts and memory from `config`.
    pub fn new(config: &BoardConfig) -> Self {
        let harts = (0..config.cpus)
            .map(|id| Hart::new(id, config.reset_pc, SYSTEM_MEMORY))
            .collect();

        let mut memory = SystemMemory::new();
        memory.add_region(MemoryRegion::new("DRAM", config.ram_base, config.ram_size, false));
        if let Some(secure) = config.secure_ram {
            memory.add_region(MemoryRegion::new("SRAM", secure.base, secure.size, true));
        }

        Self {
            harts,
            memory,
            ram_size: config.ram_size,
            ready: false,
        }
    }
}

impl Machine for Platform {
    fn cpu(&self, index: u32) -> Option<&dyn CpuCore> {
        let hart = self.harts.get(index as usize)?;
        Some(hart)
    }

    fn cpu_mut(&mut self, index: u32) -> Option<&mut dyn CpuCore> {
        let hart = self.harts.get_mut(index as usize)?;
        Some(hart)
    }

    fn first_cpu(&self) -> Option<u32> {
        self.harts.first().map(|h| h.id)
    }

    fn address_space_mut(&mut self, id: AddressSpaceId) -> Option<&mut dyn AddressSpace> {
        if id == SYSTEM_MEMORY {
            Some(&mut self.memory)
        } else {
            None
        }
    }

    fn ram_size(&self) -> u64 {
        self.ram_size
    }

    fn is_ready(&self) -> bool {
        self.ready
    }
}

/// A reference machine: the platform plus its reset table.
///
/// The two halves are separate fields so a loader can borrow both at once:
///
/// ```
/// use rvsim_loader::config::{BoardConfig, PatchConfig};
/// use rvsim_loader::device::GenericLoader;
/// use rvsim_loader::soc::Board;
///
/// let mut board = Board::new(&BoardConfig::default());
/// let config = PatchConfig::default().with_address(0x8000_1000).with_cpu(0);
/// let loader = GenericLoader::new(config)
///     .attach(&mut board.platform, &mut board.resets)
///     .unwrap();
/// board.machine_done().unwrap();
/// assert_eq!(board.platform.harts[0].pc, 0x8000_1000);
/// # let _ = loader.detach(&mut board.resets);
/// ```
#[derive(Debug)]
pub struct Board {
    /// CPUs and memory.
    pub platform: Platform,
    /// Registered reset actions.
    pub resets: ResetTable,
}

impl Board {
    /// Builds an un-started board.
    pub fn new(config: &BoardConfig) -> Self {
        Self {
            platform: Platform::new(config),
            resets: ResetTable::new(),
        }
    }

    /// Marks start-of-day initialisation complete and performs the first system reset.
    ///
    /// Loaders attached after this point are applied immediately.
    pub fn machine_done(&mut self) -> Result<(), PatchError> {
        self.system_reset()?;
        self.platform.ready = true;
        info!(harts = self.platform.harts.len(), "machine ready");
        Ok(())
    }

    /// Resets every hart, then replays every registered action in order.
    ///
    /// All actions run even if one fails; the first failure is returned.
    pub fn system_reset(&mut self) -> Result<(), PatchError> {
        for hart in &mut self.platform.harts {
            hart.reset();
        }

        let mut first_error = None;
        for action in self.resets.actions() {
            if let Err(e) = action.reset(&mut self.platform) {
                warn!(error = %e, ?action, "reset action failed");
                if first_error.is_none() {
                    first_error = Some(e);
                }
            }
        }
        first_error.map_or(Ok(()), Err)
    }
}
