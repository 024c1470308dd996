//! Raw binary loading: the whole file at the configured address.

use super::{ImageLoader, LoadRequest, ParsedImage, Segment};
use crate::common::ImageError;

/// Fallback format; never reports an entry point.
#[derive(Clone, Copy, Debug, Default)]
pub struct RawLoader;

impl ImageLoader for RawLoader {
    fn format(&self) -> &'static str {
        "raw"
    }

    fn parse(&self, data: &[u8], request: &LoadRequest) -> Result<ParsedImage, ImageError> {
        let size = data.len() as u64;
        if size > request.max_size {
            return Err(ImageError::TooLarge {
                size,
                max: request.max_size,
            });
        }
        Ok(ParsedImage {
            segments: vec![Segment {
                address: request.address,
                bytes: data.to_vec(),
            }],
            entry: None,
        })
    }
}
