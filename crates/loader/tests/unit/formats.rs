//! # Image Format Tests
//!
//! Parses synthesized files with the built-in formats and loads them through the
//! default sequence into a real address space.

use pretty_assertions::assert_eq;
use rvsim_loader::common::{ImageError, MemTxAttrs};
use rvsim_loader::image::uimage::{IH_COMP_NONE, IH_TYPE_KERNEL};
use rvsim_loader::image::{
    ElfLoader, ImageLoader, ImageSequencer, IntelHexLoader, LoadRequest, Segment, UImageLoader,
};
use rvsim_loader::soc::{AddressSpace, MemoryRegion, SystemMemory};

use crate::common::images::{
    ElfSegment, elf32_be, elf64_le, ihex_file, ihex_record, temp_image, uimage,
};

const RAM_BASE: u64 = 0x8000_0000;

const REQUEST: LoadRequest = LoadRequest {
    address: RAM_BASE + 0x8000,
    max_size: 0x1_0000,
};

fn ram() -> SystemMemory {
    let mut mem = SystemMemory::new();
    mem.add_region(MemoryRegion::new("DRAM", RAM_BASE, 0x1_0000, false));
    mem
}

fn read(mem: &mut SystemMemory, addr: u64, len: usize) -> Vec<u8> {
    let mut buf = vec![0; len];
    mem.read(addr, &mut buf, MemTxAttrs::UNSPECIFIED).unwrap();
    buf
}

#[test]
fn test_elf64_segments_at_physical_addresses() {
    let data = elf64_le(
        RAM_BASE + 0x100,
        &[
            ElfSegment::new(RAM_BASE + 0x100, &[0x13, 0, 0, 0]),
            ElfSegment::new(RAM_BASE + 0x2000, &[0xAA, 0xBB]).with_bss(6),
        ],
    );

    let image = ElfLoader.parse(&data, &REQUEST).unwrap();

    assert_eq!(image.entry, Some(RAM_BASE + 0x100));
    assert_eq!(
        image.segments,
        vec![
            Segment {
                address: RAM_BASE + 0x100,
                bytes: vec![0x13, 0, 0, 0],
            },
            Segment {
                address: RAM_BASE + 0x2000,
                bytes: vec![0xAA, 0xBB, 0, 0, 0, 0],
            },
        ]
    );
}

#[test]
fn test_elf32_big_endian() {
    let data = elf32_be(0x8000_0400, &ElfSegment::new(RAM_BASE + 0x400, &[1, 2, 3, 4]));

    let image = ElfLoader.parse(&data, &REQUEST).unwrap();
    assert_eq!(image.entry, Some(0x8000_0400));
    assert_eq!(image.segments.len(), 1);
    assert_eq!(image.segments[0].address, RAM_BASE + 0x400);
    assert_eq!(image.segments[0].bytes, vec![1, 2, 3, 4]);
}

#[test]
fn test_elf_rejections() {
    assert!(matches!(
        ElfLoader.parse(b"not an elf", &REQUEST),
        Err(ImageError::Unrecognized("elf"))
    ));

    let empty = elf64_le(RAM_BASE, &[]);
    assert!(matches!(
        ElfLoader.parse(&empty, &REQUEST),
        Err(ImageError::Malformed { .. })
    ));

    let mut truncated = elf64_le(RAM_BASE, &[ElfSegment::new(RAM_BASE, &[0; 32])]);
    truncated.truncate(truncated.len() - 16);
    assert!(matches!(
        ElfLoader.parse(&truncated, &REQUEST),
        Err(ImageError::Malformed { .. })
    ));
}

#[test]
fn test_elf_oversized_bss_is_too_large() {
    let data = elf64_le(
        RAM_BASE,
        &[ElfSegment::new(RAM_BASE, &[1, 2, 3, 4]).with_bss(1 << 60)],
    );

    let err = ElfLoader.parse(&data, &REQUEST).unwrap_err();
    assert!(matches!(
        err,
        ImageError::TooLarge { size, max } if size == 1 << 60 && max == REQUEST.max_size
    ));

    let mut mem = ram();
    let loaded = ImageSequencer::new()
        .load(temp_image(&data).path(), false, REQUEST, &mut mem)
        .unwrap();
    assert_eq!(loaded.format, "raw");
}

#[test]
fn test_elf_segments_summed_against_limit() {
    let half = REQUEST.max_size / 2 + 1;
    let data = elf64_le(
        RAM_BASE,
        &[
            ElfSegment::new(RAM_BASE, &[1]).with_bss(half),
            ElfSegment::new(RAM_BASE + half, &[2]).with_bss(half),
        ],
    );
    assert!(matches!(
        ElfLoader.parse(&data, &REQUEST),
        Err(ImageError::TooLarge { .. })
    ));
}

#[test]
fn test_uimage_kernel() {
    let data = uimage(0x8000_3000, 0x8000_3010, IH_TYPE_KERNEL, IH_COMP_NONE, &[9, 8, 7]);

    let image = UImageLoader.parse(&data, &REQUEST).unwrap();
    assert_eq!(image.entry, Some(0x8000_3010));
    assert_eq!(image.segments[0].address, 0x8000_3000);
    assert_eq!(image.segments[0].bytes, vec![9, 8, 7]);
}

#[test]
fn test_uimage_unsupported_variants() {
    let compressed = uimage(RAM_BASE, RAM_BASE, IH_TYPE_KERNEL, 1, &[0; 4]);
    assert!(matches!(
        UImageLoader.parse(&compressed, &REQUEST),
        Err(ImageError::Unsupported { .. })
    ));

    let ramdisk = uimage(RAM_BASE, RAM_BASE, 3, IH_COMP_NONE, &[0; 4]);
    assert!(matches!(
        UImageLoader.parse(&ramdisk, &REQUEST),
        Err(ImageError::Unsupported { .. })
    ));

    let mut oversized = uimage(RAM_BASE, RAM_BASE, IH_TYPE_KERNEL, IH_COMP_NONE, &[0; 4]);
    oversized[12..16].copy_from_slice(&u32::MAX.to_be_bytes());
    assert!(matches!(
        UImageLoader.parse(&oversized, &REQUEST),
        Err(ImageError::Malformed { .. })
    ));

    let mut truncated = uimage(RAM_BASE, RAM_BASE, IH_TYPE_KERNEL, IH_COMP_NONE, &[0; 16]);
    truncated.truncate(70);
    assert!(matches!(
        UImageLoader.parse(&truncated, &REQUEST),
        Err(ImageError::Malformed { .. })
    ));
}

#[test]
fn test_ihex_extended_linear_and_start() {
    let data = ihex_file(&[
        ihex_record(0x04, 0, &[0x80, 0x00]),
        ihex_record(0x00, 0x0100, &[1, 2, 3, 4]),
        ihex_record(0x00, 0x0104, &[5, 6]),
        ihex_record(0x00, 0x0200, &[7]),
        ihex_record(0x05, 0, &[0x80, 0x00, 0x01, 0x00]),
        ihex_record(0x01, 0, &[]),
    ]);

    let image = IntelHexLoader.parse(&data, &REQUEST).unwrap();
    assert_eq!(image.entry, Some(0x8000_0100));
    assert_eq!(
        image.segments,
        vec![
            Segment {
                address: 0x8000_0100,
                bytes: vec![1, 2, 3, 4, 5, 6],
            },
            Segment {
                address: 0x8000_0200,
                bytes: vec![7],
            },
        ]
    );
}

#[test]
fn test_ihex_segment_addressing() {
    let data = ihex_file(&[
        ihex_record(0x02, 0, &[0x10, 0x00]),
        ihex_record(0x00, 0x0010, &[0xAB]),
        ihex_record(0x03, 0, &[0x00, 0x10, 0x00, 0x20]),
        ihex_record(0x01, 0, &[]),
    ]);

    let image = IntelHexLoader.parse(&data, &REQUEST).unwrap();
    assert_eq!(image.segments[0].address, 0x1_0010);
    assert_eq!(image.entry, Some(0x10 * 16 + 0x20));
}

#[test]
fn test_ihex_without_start_record_has_no_entry() {
    let data = ihex_file(&[ihex_record(0x00, 0, &[1]), ihex_record(0x01, 0, &[])]);
    assert_eq!(IntelHexLoader.parse(&data, &REQUEST).unwrap().entry, None);
}

#[test]
fn test_ihex_rejections() {
    let missing_eof = ihex_file(&[ihex_record(0x00, 0, &[1])]);
    assert!(matches!(
        IntelHexLoader.parse(&missing_eof, &REQUEST),
        Err(ImageError::Malformed { .. })
    ));

    let mut bad_checksum = ihex_record(0x00, 0, &[1]);
    bad_checksum.replace_range(bad_checksum.len() - 2.., "00");
    let data = ihex_file(&[bad_checksum, ihex_record(0x01, 0, &[])]);
    assert!(matches!(
        IntelHexLoader.parse(&data, &REQUEST),
        Err(ImageError::Malformed { .. })
    ));

    let unknown = ihex_file(&[ihex_record(0x07, 0, &[]), ihex_record(0x01, 0, &[])]);
    assert!(matches!(
        IntelHexLoader.parse(&unknown, &REQUEST),
        Err(ImageError::Unsupported { .. })
    ));

    assert!(matches!(
        IntelHexLoader.parse(b"\x7fELF", &REQUEST),
        Err(ImageError::Unrecognized("ihex"))
    ));
}

#[test]
fn test_default_sequence_loads_elf_from_disk() {
    let file = temp_image(&elf64_le(
        RAM_BASE + 0x40,
        &[ElfSegment::new(RAM_BASE + 0x40, &[0xDE, 0xAD]).with_bss(4)],
    ));
    let mut mem = ram();
    mem.write(RAM_BASE + 0x42, &[0xFF, 0xFF], MemTxAttrs::UNSPECIFIED)
        .unwrap();

    let loaded = ImageSequencer::new()
        .load(file.path(), false, REQUEST, &mut mem)
        .unwrap();

    assert_eq!(loaded.format, "elf");
    assert_eq!(loaded.entry, Some(RAM_BASE + 0x40));
    assert_eq!(loaded.size, 4);
    assert_eq!(read(&mut mem, RAM_BASE + 0x40, 4), vec![0xDE, 0xAD, 0, 0]);
}

#[test]
fn test_default_sequence_falls_back_to_raw() {
    let data = uimage(RAM_BASE, RAM_BASE, IH_TYPE_KERNEL, 2, &[1, 2, 3, 4]);
    let file = temp_image(&data);
    let mut mem = ram();

    let loaded = ImageSequencer::new()
        .load(file.path(), false, REQUEST, &mut mem)
        .unwrap();

    assert_eq!(loaded.format, "raw");
    assert_eq!(loaded.entry, None);
    assert_eq!(loaded.size, data.len() as u64);
    assert_eq!(read(&mut mem, REQUEST.address, data.len()), data);
}

#[test]
fn test_force_raw_loads_elf_verbatim() {
    let data = elf64_le(RAM_BASE, &[ElfSegment::new(RAM_BASE, &[1])]);
    let file = temp_image(&data);
    let mut mem = ram();

    let loaded = ImageSequencer::new()
        .load(file.path(), true, REQUEST, &mut mem)
        .unwrap();

    assert_eq!(loaded.format, "raw");
    assert_eq!(read(&mut mem, REQUEST.address, 4), vec![0x7f, b'E', b'L', b'F']);
    assert_eq!(read(&mut mem, RAM_BASE, 1), vec![0]);
}
