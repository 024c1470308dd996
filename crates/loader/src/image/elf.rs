//! ELF executable loading.
//!
//! Loads every `PT_LOAD` program header at its physical address. Bytes beyond `p_filesz`
//! up to `p_memsz` are zero-filled. Both classes and both byte orders are accepted.

use object::Endianness;
use object::elf::{self, FileHeader32, FileHeader64};
use object::read::elf::{FileHeader, ProgramHeader};

use super::{ImageLoader, LoadRequest, ParsedImage, Segment};
use crate::common::ImageError;

const FORMAT: &str = "elf";

/// Offset of the class byte in `e_ident`.
const EI_CLASS: usize = 4;

/// Structured executable format.
#[derive(Clone, Copy, Debug, Default)]
pub struct ElfLoader;

impl ImageLoader for ElfLoader {
    fn format(&self) -> &'static str {
        FORMAT
    }

    fn parse(&self, data: &[u8], request: &LoadRequest) -> Result<ParsedImage, ImageError> {
        if !data.starts_with(&elf::ELFMAG) {
            return Err(ImageError::Unrecognized(FORMAT));
        }
        match data.get(EI_CLASS) {
            Some(&elf::ELFCLASS32) => parse_elf::<FileHeader32<Endianness>>(data, request.max_size),
            Some(&elf::ELFCLASS64) => parse_elf::<FileHeader64<Endianness>>(data, request.max_size),
            _ => Err(ImageError::malformed(FORMAT, "unknown ELF class")),
        }
    }
}

/// Collects the `PT_LOAD` segments. The summed `p_memsz` is capped at `max_size` before
/// anything is allocated.
fn parse_elf<Elf: FileHeader<Endian = Endianness>>(
    data: &[u8],
    max_size: u64,
) -> Result<ParsedImage, ImageError> {
    let malformed = |e: object::read::Error| ImageError::malformed(FORMAT, e.to_string());

    let header = Elf::parse(data).map_err(malformed)?;
    let endian = header.endian().map_err(malformed)?;
    let headers = header.program_headers(endian, data).map_err(malformed)?;

    let mut segments = Vec::new();
    let mut total: u64 = 0;
    for ph in headers {
        if ph.p_type(endian) != elf::PT_LOAD {
            continue;
        }
        let address: u64 = ph.p_paddr(endian).into();
        let file_size: u64 = ph.p_filesz(endian).into();
        let mem_size: u64 = ph.p_memsz(endian).into();
        if mem_size == 0 {
            continue;
        }
        if file_size > mem_size {
            return Err(ImageError::malformed(
                FORMAT,
                format!("segment at {address:#x} has filesz {file_size:#x} > memsz {mem_size:#x}"),
            ));
        }

        total = total.saturating_add(mem_size);
        if total > max_size {
            return Err(ImageError::TooLarge {
                size: total,
                max: max_size,
            });
        }

        let file_bytes = ph.data(endian, data).map_err(|()| {
            ImageError::malformed(FORMAT, format!("segment at {address:#x} exceeds file bounds"))
        })?;
        let mem_size = usize::try_from(mem_size).map_err(|_| {
            ImageError::malformed(FORMAT, format!("segment at {address:#x} is too large"))
        })?;

        let mut bytes = Vec::with_capacity(mem_size);
        bytes.extend_from_slice(file_bytes);
        bytes.resize(mem_size, 0);
        segments.push(Segment { address, bytes });
    }

    if segments.is_empty() {
        return Err(ImageError::malformed(FORMAT, "no loadable segments"));
    }

    Ok(ParsedImage {
        segments,
        entry: Some(header.e_entry(endian).into()),
    })
}
