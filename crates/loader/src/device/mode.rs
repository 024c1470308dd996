//! Option-bag validation.
//!
//! Turns the independently optional fields of a `PatchConfig` into exactly one
//! `PatchMode`. The checks run in a fixed precedence, which decides the error a malformed
//! configuration receives:
//! 1. Any literal field (data, non-zero length, big-endian request) selects a data write.
//! 2. Otherwise an image path or force-raw selects an image load.
//! 3. Otherwise a non-zero address selects a program-counter override.
//! 4. Otherwise nothing actionable was supplied.

use std::path::PathBuf;

use crate::common::PatchError;
use crate::config::PatchConfig;

/// Largest literal write in bytes.
pub const MAX_DATA_LEN: u8 = 8;

/// The single action a loader performs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PatchMode {
    /// Write `len` bytes of `value` to `address` on every reset.
    DataWrite {
        /// Target address.
        address: u64,
        /// Literal value, in host order before endianness conversion.
        value: u64,
        /// Number of bytes written (1..=8).
        len: u8,
        /// Store big-endian.
        big_endian: bool,
    },
    /// Load an image once at setup; set the PC on reset if a CPU was named.
    ImageLoad {
        /// Image file.
        path: PathBuf,
        /// Skip structured formats.
        force_raw: bool,
        /// Raw load address; replaced by the entry point of structured formats.
        address: u64,
        /// A CPU was named explicitly, so the PC is overridden on reset.
        set_pc: bool,
    },
    /// Set the program counter of `cpu` to `address` on every reset.
    SetPc {
        /// New program counter.
        address: u64,
        /// CPU whose PC is overridden.
        cpu: u32,
    },
}

impl PatchMode {
    /// The discriminant of this mode.
    pub const fn kind(&self) -> ModeKind {
        match self {
            Self::DataWrite { .. } => ModeKind::DataWrite,
            Self::ImageLoad { .. } => ModeKind::ImageLoad,
            Self::SetPc { .. } => ModeKind::SetPc,
        }
    }
}

/// Field-less view of `PatchMode`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ModeKind {
    /// Literal memory write.
    DataWrite,
    /// Image load.
    ImageLoad,
    /// Program-counter override.
    SetPc,
}

/// Selects the mode of `config` or explains why none applies.
///
/// The register name is not inspected here; it is parsed only after a mode was chosen.
pub fn validate(config: &PatchConfig) -> Result<PatchMode, PatchError> {
    let wants_data = config.data.is_some() || config.data_len != 0 || config.data_be;
    let wants_image = config.file.is_some() || config.force_raw;
    let address = config.address.unwrap_or(0);

    if wants_data {
        if config.file.is_some() {
            return Err(PatchError::ConflictingOptions(
                "specifying a file is not supported when loading memory values",
            ));
        }
        if config.force_raw {
            return Err(PatchError::ConflictingOptions(
                "specifying force-raw is not supported when loading memory values",
            ));
        }
        if config.data_len == 0 {
            return Err(PatchError::MissingRequiredOption(
                "both data and data-len must be specified",
            ));
        }
        if config.data_len > MAX_DATA_LEN {
            return Err(PatchError::OutOfRange(format!(
                "data-len {} exceeds {MAX_DATA_LEN} bytes",
                config.data_len
            )));
        }
        return Ok(PatchMode::DataWrite {
            address,
            value: config.data.unwrap_or(0),
            len: config.data_len,
            big_endian: config.data_be,
        });
    }

    if wants_image {
        if wants_data {
            return Err(PatchError::ConflictingOptions(
                "data can not be specified when loading an image",
            ));
        }
        let Some(path) = config.file.clone() else {
            return Err(PatchError::MissingRequiredOption(
                "force-raw requires a file to load",
            ));
        };
        return Ok(PatchMode::ImageLoad {
            path,
            force_raw: config.force_raw,
            address,
            set_pc: config.cpu_num.is_some(),
        });
    }

    if address != 0 {
        if wants_data {
            return Err(PatchError::ConflictingOptions(
                "data can not be specified when setting a program counter",
            ));
        }
        let Some(cpu) = config.cpu_num else {
            return Err(PatchError::MissingRequiredOption(
                "cpu-num must be specified when setting a program counter",
            ));
        };
        return Ok(PatchMode::SetPc { address, cpu });
    }

    Err(PatchError::MissingRequiredOption(
        "no actionable configuration supplied",
    ))
}
