//! Generic loader device for the rvsim system simulator.
//!
//! This crate implements a declarative boot-time memory patcher with the following:
//! 1. **Device:** Option validation, CPU resolution and the reset action replayed on every reset.
//! 2. **Images:** ELF, U-Boot legacy, Intel HEX and raw loading with ordered fallback.
//! 3. **SoC:** Host capability traits plus a reference board (harts, RAM, reset table).
//! 4. **Configuration:** Property-string and JSON configuration of loaders and boards.
//!
//! A loader performs exactly one of: a literal write of up to 8 bytes, an image load
//! (optionally pointing a CPU at its entry), or a program-counter override. It may also
//! seed one register of its CPU after every reset.

/// Errors and transaction attributes.
pub mod common;
/// Loader and board configuration.
pub mod config;
/// The loader device (validation, resolution, reset plan).
pub mod device;
/// Image formats and the format sequencer.
pub mod image;
/// Host capabilities and the reference board.
pub mod soc;

/// Loader configuration; parse from a property string or JSON.
pub use crate::config::PatchConfig;
/// Unattached loader; call `attach` to set it up.
pub use crate::device::{AttachedLoader, GenericLoader};
/// Setup and reset error type.
pub use crate::common::PatchError;
