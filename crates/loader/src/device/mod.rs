//! The generic loader device.
//!
//! A loader patches guest state at boot from a declarative `PatchConfig`. It does one of:
//! 1. **Data write:** writes up to 8 literal bytes to an address on every reset.
//! 2. **Image load:** loads an executable once and optionally points a CPU at its entry.
//! 3. **PC override:** points a named CPU at an address on every reset.
//!
//! Any mode may additionally seed one CPU register with the literal value after reset.
//!
//! Setup (`GenericLoader::attach`) validates, resolves and loads, then registers the
//! resulting `ResetPlan` with the host. If the machine is already running, the plan is
//! applied immediately as well. `AttachedLoader::detach` is the matching teardown.

/// Literal data codec.
pub mod data;
/// Option validation and mode selection.
pub mod mode;
/// The reset action replayed by an attached loader.
pub mod plan;
/// Register-name parsing and default storage.
pub mod register;
/// CPU and address-space resolution.
pub mod resolve;

use std::sync::Arc;

use tracing::{debug, info};

pub use data::LiteralData;
pub use mode::{MAX_DATA_LEN, ModeKind, PatchMode, validate};
pub use plan::ResetPlan;
pub use register::{NUM_DEFAULT_REGS, RegisterDefaults, parse_register_name};
pub use resolve::{ResolvedCpu, resolve_cpu};

use crate::common::PatchError;
use crate::config::PatchConfig;
use crate::image::{ImageSequencer, LoadRequest};
use crate::soc::traits::{Machine, ResetRegistry, ResetToken};

/// A configured loader that has not been attached yet.
#[derive(Debug)]
pub struct GenericLoader {
    config: PatchConfig,
    images: ImageSequencer,
}

impl GenericLoader {
    /// A loader using the built-in image formats.
    pub fn new(config: PatchConfig) -> Self {
        Self::with_images(config, ImageSequencer::new())
    }

    /// A loader with a custom image-format sequence.
    pub fn with_images(config: PatchConfig, images: ImageSequencer) -> Self {
        Self { config, images }
    }

    /// The declared configuration.
    pub const fn config(&self) -> &PatchConfig {
        &self.config
    }

    /// Runs setup without registering anything.
    ///
    /// All checks happen before the image load, which is the only side effect of setup, so
    /// a failed call leaves guest memory untouched.
    pub fn prepare(&self, machine: &mut dyn Machine) -> Result<ResetPlan, PatchError> {
        let mode = validate(&self.config)?;
        let cpu = resolve_cpu(machine, self.config.cpu_num)?;

        let literal = LiteralData::encode(
            self.config.data.unwrap_or(0),
            self.config.data_len,
            self.config.data_be,
        );

        let mut registers = RegisterDefaults::default();
        if let Some(name) = &self.config.register {
            let index = parse_register_name(name)?;
            registers.set(index, literal.word());
            debug!(register = index, "recorded register default");
        }

        let kind = mode.kind();
        let (address, set_pc, data) = match mode {
            PatchMode::DataWrite { address, .. } => (address, false, Some(literal)),
            PatchMode::ImageLoad {
                path,
                force_raw,
                address,
                set_pc,
            } => {
                let request = LoadRequest {
                    address,
                    max_size: machine.ram_size(),
                };
                let space = machine
                    .address_space_mut(cpu.space)
                    .ok_or(PatchError::MissingAddressSpace(cpu.space.0))?;
                let loaded = self.images.load(&path, force_raw, request, space)?;
                (loaded.entry.unwrap_or(address), set_pc, None)
            }
            PatchMode::SetPc { address, .. } => (address, true, None),
        };

        Ok(ResetPlan {
            mode: kind,
            cpu,
            address,
            set_pc,
            data,
            registers,
            attrs: self.config.attrs,
        })
    }

    /// Sets the loader up and registers its reset action.
    ///
    /// On a machine that is already past its ready milestone the action also runs once
    /// before this returns. If that immediate run fails, the action is unregistered again
    /// and the error is returned.
    pub fn attach(
        self,
        machine: &mut dyn Machine,
        resets: &mut dyn ResetRegistry,
    ) -> Result<AttachedLoader, PatchError> {
        let plan = Arc::new(self.prepare(machine)?);
        let token = resets.register(plan.clone());

        info!(
            mode = ?plan.mode(),
            cpu = plan.cpu().index,
            addr = plan.effective_address(),
            set_pc = plan.sets_pc(),
            "loader attached"
        );

        if machine.is_ready() {
            info!("machine already running, applying patch now");
            if let Err(e) = plan.apply(machine) {
                let _ = resets.unregister(token);
                return Err(e);
            }
        }

        Ok(AttachedLoader { token, plan })
    }
}

/// A loader whose reset action is registered with the host.
#[derive(Debug)]
pub struct AttachedLoader {
    token: ResetToken,
    plan: Arc<ResetPlan>,
}

impl AttachedLoader {
    /// Token under which the reset action is registered.
    pub const fn token(&self) -> ResetToken {
        self.token
    }

    /// The resolved plan replayed on every reset.
    pub fn plan(&self) -> &ResetPlan {
        &self.plan
    }

    /// Unregisters the reset action. Returns `false` if the host no longer knew it.
    pub fn detach(self, resets: &mut dyn ResetRegistry) -> bool {
        debug!(token = self.token.0, "loader detached");
        resets.unregister(self.token)
    }
}
