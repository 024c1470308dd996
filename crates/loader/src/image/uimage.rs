//! U-Boot legacy image loading.
//!
//! A legacy image is a 64-byte big-endian header followed by the payload. Only
//! uncompressed kernel images are placed; the payload goes to `ih_load` and the entry
//! point is `ih_ep`.

use super::{ImageLoader, LoadRequest, ParsedImage, Segment};
use crate::common::ImageError;

const FORMAT: &str = "uimage";

/// `ih_magic` of a legacy image.
pub const IH_MAGIC: u32 = 0x2705_1956;
/// Size of the legacy image header.
pub const HEADER_LEN: usize = 64;
/// `ih_type` of an OS kernel image.
pub const IH_TYPE_KERNEL: u8 = 2;
/// `ih_comp` of an uncompressed payload.
pub const IH_COMP_NONE: u8 = 0;

/// Decoded legacy image header.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UImageHeader {
    /// Payload size in bytes.
    pub size: u32,
    /// Load address.
    pub load: u32,
    /// Entry point.
    pub entry: u32,
    /// Operating system code.
    pub os: u8,
    /// CPU architecture code.
    pub arch: u8,
    /// Image type code.
    pub image_type: u8,
    /// Compression code.
    pub compression: u8,
}

impl UImageHeader {
    /// Decodes the header at the start of `data`.
    pub fn parse(data: &[u8]) -> Result<Self, ImageError> {
        let header = data.get(..HEADER_LEN).ok_or(ImageError::Unrecognized(FORMAT))?;
        let word = |offset: usize| {
            u32::from_be_bytes([
                header[offset],
                header[offset + 1],
                header[offset + 2],
                header[offset + 3],
            ])
        };

        if word(0) != IH_MAGIC {
            return Err(ImageError::Unrecognized(FORMAT));
        }

        Ok(Self {
            size: word(12),
            load: word(16),
            entry: word(20),
            os: header[28],
            arch: header[29],
            image_type: header[30],
            compression: header[31],
        })
    }
}

/// Boot-image container format.
#[derive(Clone, Copy, Debug, Default)]
pub struct UImageLoader;

impl ImageLoader for UImageLoader {
    fn format(&self) -> &'static str {
        FORMAT
    }

    fn parse(&self, data: &[u8], _request: &LoadRequest) -> Result<ParsedImage, ImageError> {
        let header = UImageHeader::parse(data)?;

        if header.image_type != IH_TYPE_KERNEL {
            return Err(ImageError::Unsupported {
                format: FORMAT,
                reason: format!("image type {}", header.image_type),
            });
        }
        if header.compression != IH_COMP_NONE {
            return Err(ImageError::Unsupported {
                format: FORMAT,
                reason: format!("compression {}", header.compression),
            });
        }

        let payload = usize::try_from(header.size)
            .ok()
            .and_then(|size| HEADER_LEN.checked_add(size))
            .and_then(|end| data.get(HEADER_LEN..end))
            .ok_or_else(|| {
                ImageError::malformed(
                    FORMAT,
                    format!("payload of {} bytes truncated", header.size),
                )
            })?;

        Ok(ParsedImage {
            segments: vec![Segment {
                address: u64::from(header.load),
                bytes: payload.to_vec(),
            }],
            entry: Some(u64::from(header.entry)),
        })
    }
}
