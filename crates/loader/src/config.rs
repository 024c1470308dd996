//! Configuration for loader devices and the reference board.
//!
//! This module defines the declared intent of a loader and the parameters of the board it
//! patches. It provides:
//! 1. **`PatchConfig`:** The raw option bag of one loader device, keyed by its property names.
//! 2. **Property strings:** `FromStr` for `[loader,]key=value,...` device descriptions.
//! 3. **`BoardConfig`:** CPU count and memory map of the reference board.
//!
//! Both configs deserialize from JSON; every field has a default so partial documents work.

use std::path::PathBuf;
use std::str::FromStr;

use serde::Deserialize;

use crate::common::{MemTxAttrs, PropertyError};

/// Property value of `cpu-num` meaning "no CPU specified".
pub const CPU_NONE: u32 = u32::MAX;

/// Driver name accepted as the first item of a property string.
pub const DRIVER_NAME: &str = "loader";

/// Default configuration constants for the reference board.
mod defaults {
    /// Number of harts.
    pub const CPUS: u32 = 1;

    /// Base address of main system RAM (2 GiB).
    pub const RAM_BASE: u64 = 0x8000_0000;

    /// Total size of main system RAM (128 MiB).
    ///
    /// Also the upper bound for raw image loads.
    pub const RAM_SIZE: u64 = 128 * 1024 * 1024;

    /// Program counter a hart takes on reset.
    pub const RESET_PC: u64 = RAM_BASE;
}

/// Declared intent of one loader device.
///
/// Fields are independent optionals exactly as the host exposes them; `device::validate`
/// turns them into a single unambiguous mode. A `data_len` of zero means "no literal
/// write", even though `data` may legitimately be `Some(0)`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "RawPatchConfig")]
pub struct PatchConfig {
    /// Target address for a literal write or program counter.
    pub address: Option<u64>,
    /// Literal value to write.
    pub data: Option<u64>,
    /// Number of bytes of `data` to write (0..=8).
    pub data_len: u8,
    /// Store `data` big-endian instead of little-endian.
    pub data_be: bool,
    /// CPU selecting the address space; `None` means the first CPU.
    pub cpu_num: Option<u32>,
    /// Skip structured formats and load `file` as a raw binary.
    pub force_raw: bool,
    /// Register (`r0`..`r30`) whose reset default is seeded from `data`.
    pub register: Option<String>,
    /// Image to load.
    pub file: Option<PathBuf>,
    /// Attributes forwarded to the literal write.
    pub attrs: MemTxAttrs,
}

impl PatchConfig {
    /// Parses a JSON document keyed by property names.
    pub fn from_json(json: &str) -> Result<Self, PropertyError> {
        serde_json::from_str(json).map_err(|e| PropertyError::Json(e.to_string()))
    }

    /// Sets the target address.
    #[must_use]
    pub const fn with_address(mut self, address: u64) -> Self {
        self.address = Some(address);
        self
    }

    /// Sets the literal value and its length.
    #[must_use]
    pub const fn with_data(mut self, data: u64, len: u8) -> Self {
        self.data = Some(data);
        self.data_len = len;
        self
    }

    /// Requests big-endian storage of the literal value.
    #[must_use]
    pub const fn big_endian(mut self) -> Self {
        self.data_be = true;
        self
    }

    /// Selects a CPU.
    #[must_use]
    pub const fn with_cpu(mut self, cpu: u32) -> Self {
        self.cpu_num = if cpu == CPU_NONE { None } else { Some(cpu) };
        self
    }

    /// Sets the image path.
    #[must_use]
    pub fn with_file(mut self, file: impl Into<PathBuf>) -> Self {
        self.file = Some(file.into());
        self
    }

    /// Forces a raw image load.
    #[must_use]
    pub const fn force_raw(mut self) -> Self {
        self.force_raw = true;
        self
    }

    /// Names the register whose reset default is seeded.
    #[must_use]
    pub fn with_register(mut self, name: impl Into<String>) -> Self {
        self.register = Some(name.into());
        self
    }

    /// Sets the transaction attributes of the literal write.
    #[must_use]
    pub const fn with_attrs(mut self, attrs: MemTxAttrs) -> Self {
        self.attrs = attrs;
        self
    }

    /// Assigns one property by name, as the host property system would.
    pub fn set_property(&mut self, key: &str, value: &str) -> Result<(), PropertyError> {
        let invalid = || PropertyError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
        };
        match key {
            "addr" => self.address = Some(parse_u64(value).ok_or_else(invalid)?),
            "data" => self.data = Some(parse_u64(value).ok_or_else(invalid)?),
            "data-len" => {
                self.data_len = parse_u64(value)
                    .and_then(|v| u8::try_from(v).ok())
                    .ok_or_else(invalid)?;
            }
            "data-be" => self.data_be = parse_bool(value).ok_or_else(invalid)?,
            "cpu-num" => {
                let cpu = parse_u64(value)
                    .and_then(|v| u32::try_from(v).ok())
                    .ok_or_else(invalid)?;
                self.cpu_num = (cpu != CPU_NONE).then_some(cpu);
            }
            "force-raw" => self.force_raw = parse_bool(value).ok_or_else(invalid)?,
            "reg" => self.register = Some(value.to_string()),
            "file" => self.file = Some(PathBuf::from(value)),
            "attrs-requester-id" => {
                self.attrs.requester_id = parse_u64(value)
                    .and_then(|v| u16::try_from(v).ok())
                    .ok_or_else(invalid)?;
            }
            "attrs-debug" => self.attrs.debug = parse_bool(value).ok_or_else(invalid)?,
            "attrs-secure" => self.attrs.secure = parse_bool(value).ok_or_else(invalid)?,
            _ => return Err(PropertyError::UnknownKey(key.to_string())),
        }
        Ok(())
    }
}

impl FromStr for PatchConfig {
    type Err = PropertyError;

    /// Parses `[loader,]key=value,...`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut config = Self::default();
        let mut seen: Vec<&str> = Vec::new();

        for (i, item) in s.split(',').map(str::trim).enumerate() {
            if item.is_empty() || (i == 0 && item == DRIVER_NAME) {
                continue;
            }
            let (key, value) = item
                .split_once('=')
                .ok_or_else(|| PropertyError::MissingValue(item.to_string()))?;
            let key = key.trim();
            if seen.contains(&key) {
                return Err(PropertyError::Duplicate(key.to_string()));
            }
            seen.push(key);
            config.set_property(key, value.trim())?;
        }
        Ok(config)
    }
}

/// Wire shape of `PatchConfig`: flat, property-named keys.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields, rename_all = "kebab-case")]
struct RawPatchConfig {
    addr: Option<u64>,
    data: Option<u64>,
    data_len: u8,
    data_be: bool,
    cpu_num: Option<u32>,
    force_raw: bool,
    reg: Option<String>,
    file: Option<PathBuf>,
    attrs_requester_id: u16,
    attrs_debug: bool,
    attrs_secure: bool,
}

impl From<RawPatchConfig> for PatchConfig {
    fn from(raw: RawPatchConfig) -> Self {
        Self {
            address: raw.addr,
            data: raw.data,
            data_len: raw.data_len,
            data_be: raw.data_be,
            cpu_num: raw.cpu_num.filter(|&cpu| cpu != CPU_NONE),
            force_raw: raw.force_raw,
            register: raw.reg,
            file: raw.file,
            attrs: MemTxAttrs {
                secure: raw.attrs_secure,
                debug: raw.attrs_debug,
                requester_id: raw.attrs_requester_id,
            },
        }
    }
}

/// Decimal or `0x`-prefixed hexadecimal.
fn parse_u64(s: &str) -> Option<u64> {
    match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16).ok(),
        None => s.parse().ok(),
    }
}

fn parse_bool(s: &str) -> Option<bool> {
    match s {
        "on" | "true" | "yes" => Some(true),
        "off" | "false" | "no" => Some(false),
        _ => None,
    }
}

/// A memory window of the reference board.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
pub struct RegionConfig {
    /// First address of the window.
    pub base: u64,
    /// Size in bytes.
    pub size: u64,
}

/// Reference board parameters.
///
/// # Examples
///
/// ```
/// use rvsim_loader::config::BoardConfig;
///
/// let json = r#"{ "cpus": 2, "ram_size": 1048576 }"#;
/// let config: BoardConfig = serde_json::from_str(json).unwrap();
/// assert_eq!(config.cpus, 2);
/// assert_eq!(config.ram_base, 0x8000_0000);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct BoardConfig {
    /// Number of harts, enumerated from 0.
    #[serde(default = "BoardConfig::default_cpus")]
    pub cpus: u32,

    /// Main RAM base address.
    #[serde(default = "BoardConfig::default_ram_base")]
    pub ram_base: u64,

    /// Main RAM size in bytes.
    #[serde(default = "BoardConfig::default_ram_size")]
    pub ram_size: u64,

    /// Program counter every hart takes on reset.
    #[serde(default = "BoardConfig::default_reset_pc")]
    pub reset_pc: u64,

    /// Optional RAM window only reachable by secure transactions.
    #[serde(default)]
    pub secure_ram: Option<RegionConfig>,
}

impl BoardConfig {
    fn default_cpus() -> u32 {
        defaults::CPUS
    }

    fn default_ram_base() -> u64 {
        defaults::RAM_BASE
    }

    fn default_ram_size() -> u64 {
        defaults::RAM_SIZE
    }

    fn default_reset_pc() -> u64 {
        defaults::RESET_PC
    }

    /// Parses a JSON board description.
    pub fn from_json(json: &str) -> Result<Self, PropertyError> {
        serde_json::from_str(json).map_err(|e| PropertyError::Json(e.to_string()))
    }
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            cpus: defaults::CPUS,
            ram_base: defaults::RAM_BASE,
            ram_size: defaults::RAM_SIZE,
            reset_pc: defaults::RESET_PC,
            secure_ram: None,
        }
    }
}
