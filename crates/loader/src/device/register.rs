//! Register default storage.
//!
//! A loader can seed one CPU register with its literal value after every reset. Names are
//! `r<index>` with a decimal index below `NUM_DEFAULT_REGS`.

use crate::common::PatchError;

/// Number of register slots addressable by name.
pub const NUM_DEFAULT_REGS: usize = 31;

/// Parses `r<index>` into a slot index.
pub fn parse_register_name(name: &str) -> Result<usize, PatchError> {
    let digits = name
        .strip_prefix('r')
        .filter(|d| !d.is_empty() && d.bytes().all(|b| b.is_ascii_digit()))
        .ok_or_else(|| PatchError::UnparsableRegisterName(name.to_string()))?;

    match digits.parse::<usize>() {
        Ok(index) if index < NUM_DEFAULT_REGS => Ok(index),
        _ => Err(PatchError::OutOfRange(format!("unsupported register: {name}"))),
    }
}

/// Sparse per-register reset defaults, stored as 8-byte in-memory images.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RegisterDefaults {
    slots: [Option<[u8; 8]>; NUM_DEFAULT_REGS],
}

impl RegisterDefaults {
    /// Records `value` as the default of register `index`.
    ///
    /// Indices outside the slot range are ignored; `parse_register_name` never yields one.
    pub fn set(&mut self, index: usize, value: [u8; 8]) {
        if let Some(slot) = self.slots.get_mut(index) {
            *slot = Some(value);
        }
    }

    /// Default of register `index`, if one was recorded.
    pub fn get(&self, index: usize) -> Option<[u8; 8]> {
        self.slots.get(index).copied().flatten()
    }

    /// Populated slots in ascending register order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, [u8; 8])> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| slot.map(|value| (index, value)))
    }

    /// True when no register default is recorded.
    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(Option::is_none)
    }
}
