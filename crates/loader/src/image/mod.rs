//! Image loading.
//!
//! This module owns the format ordering and fallback policy used when a loader is given a
//! file. It provides:
//! 1. **`ImageLoader`:** One file format, parsing bytes into load segments and an entry point.
//! 2. **Formats:** ELF, U-Boot legacy images, Intel HEX and raw binaries.
//! 3. **`ImageSequencer`:** Tries the structured formats in order, then falls back to raw.
//!
//! Parsing is pure; the sequencer checks every segment of an image against the target
//! address space before writing any of them.

use std::fmt;
use std::fs;
use std::path::Path;

use tracing::{debug, info};

use crate::common::{ImageError, MemTxAttrs, PatchError};
use crate::soc::traits::AddressSpace;

/// ELF executables.
pub mod elf;
/// Intel HEX records.
pub mod ihex;
/// Raw binaries.
pub mod raw;
/// U-Boot legacy (`mkimage`) images.
pub mod uimage;

pub use elf::ElfLoader;
pub use ihex::IntelHexLoader;
pub use raw::RawLoader;
pub use uimage::UImageLoader;

/// A contiguous run of bytes to place at a guest address.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Segment {
    /// Guest address of the first byte.
    pub address: u64,
    /// Contents, including any zero fill.
    pub bytes: Vec<u8>,
}

/// Result of parsing an image file.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ParsedImage {
    /// Segments in file order.
    pub segments: Vec<Segment>,
    /// Entry point, for formats that carry one.
    pub entry: Option<u64>,
}

impl ParsedImage {
    /// Total number of bytes placed in memory.
    pub fn size(&self) -> u64 {
        self.segments.iter().map(|s| s.bytes.len() as u64).sum()
    }
}

/// Parameters shared by every format attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LoadRequest {
    /// Configured address; the raw load address.
    pub address: u64,
    /// Largest accepted raw image, normally the machine's RAM size.
    pub max_size: u64,
}

/// A single image file format.
pub trait ImageLoader {
    /// Short format name used in logs.
    fn format(&self) -> &'static str;

    /// Parses `data` into load segments.
    fn parse(&self, data: &[u8], request: &LoadRequest) -> Result<ParsedImage, ImageError>;
}

/// Outcome of a successful image load.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LoadedImage {
    /// Format that accepted the file.
    pub format: &'static str,
    /// Bytes placed in memory.
    pub size: u64,
    /// Entry point reported by a structured format. Always `None` for raw loads.
    pub entry: Option<u64>,
}

/// Ordered list of structured formats plus the raw fallback.
pub struct ImageSequencer {
    structured: Vec<Box<dyn ImageLoader>>,
    raw: Box<dyn ImageLoader>,
}

impl ImageSequencer {
    /// ELF, then U-Boot, then Intel HEX, then raw.
    pub fn new() -> Self {
        Self::with_loaders(
            vec![
                Box::new(ElfLoader),
                Box::new(UImageLoader),
                Box::new(IntelHexLoader),
            ],
            Box::new(RawLoader),
        )
    }

    /// A sequencer with custom formats, tried in the given order before `raw`.
    pub fn with_loaders(structured: Vec<Box<dyn ImageLoader>>, raw: Box<dyn ImageLoader>) -> Self {
        Self { structured, raw }
    }

    /// Loads the file at `path` into `space`.
    ///
    /// Structured formats are skipped when `force_raw` is set. The first format that both
    /// parses the file and places all of its segments wins.
    pub fn load(
        &self,
        path: &Path,
        force_raw: bool,
        request: LoadRequest,
        space: &mut dyn AddressSpace,
    ) -> Result<LoadedImage, PatchError> {
        let failure = || PatchError::ImageLoadFailure {
            path: path.to_path_buf(),
        };

        let data = fs::read(path).map_err(|e| {
            debug!(path = %path.display(), error = %e, "cannot read image");
            failure()
        })?;

        let loaded = self
            .load_bytes(&data, force_raw, request, space)
            .ok_or_else(failure)?;
        info!(
            path = %path.display(),
            format = loaded.format,
            size = loaded.size,
            entry = ?loaded.entry,
            "image loaded"
        );
        Ok(loaded)
    }

    /// Runs the format sequence over an in-memory image.
    pub fn load_bytes(
        &self,
        data: &[u8],
        force_raw: bool,
        request: LoadRequest,
        space: &mut dyn AddressSpace,
    ) -> Option<LoadedImage> {
        if !force_raw {
            for loader in &self.structured {
                match place(loader.as_ref(), data, &request, space) {
                    Ok(loaded) => return Some(loaded),
                    Err(e) => debug!(format = loader.format(), error = %e, "format rejected image"),
                }
            }
        }

        match place(self.raw.as_ref(), data, &request, space) {
            Ok(loaded) => Some(LoadedImage {
                entry: None,
                ..loaded
            }),
            Err(e) => {
                debug!(format = self.raw.format(), error = %e, "raw load failed");
                None
            }
        }
    }

    /// Format names in attempt order, raw last.
    pub fn formats(&self) -> Vec<&'static str> {
        self.structured
            .iter()
            .chain(std::iter::once(&self.raw))
            .map(|l| l.format())
            .collect()
    }
}

impl Default for ImageSequencer {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ImageSequencer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageSequencer")
            .field("formats", &self.formats())
            .finish()
    }
}

/// Parses with one format and writes its segments.
///
/// Every segment is checked against `space` before the first write, so a format that
/// cannot place its whole image leaves memory untouched.
fn place(
    loader: &dyn ImageLoader,
    data: &[u8],
    request: &LoadRequest,
    space: &mut dyn AddressSpace,
) -> Result<LoadedImage, ImageError> {
    let image = loader.parse(data, request)?;
    let segments: Vec<&Segment> = image.segments.iter().filter(|s| !s.bytes.is_empty()).collect();

    for segment in &segments {
        space.check(segment.address, segment.bytes.len(), MemTxAttrs::UNSPECIFIED)?;
    }
    for segment in &segments {
        space.write(segment.address, &segment.bytes, MemTxAttrs::UNSPECIFIED)?;
    }
    Ok(LoadedImage {
        format: loader.format(),
        size: image.size(),
        entry: image.entry,
    })
}
