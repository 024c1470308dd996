//! # Configuration Tests
//!
//! Property strings, JSON documents and board defaults.

use std::path::PathBuf;

use pretty_assertions::assert_eq;
use rstest::rstest;
use rvsim_loader::common::{MemTxAttrs, PropertyError};
use rvsim_loader::config::*;

#[test]
fn test_property_string_data_write() {
    let config: PatchConfig = "loader,addr=0x80000100,data=0xdeadbeef,data-len=4,data-be=on"
        .parse()
        .unwrap();

    assert_eq!(
        config,
        PatchConfig::default()
            .with_address(0x8000_0100)
            .with_data(0xDEAD_BEEF, 4)
            .big_endian()
    );
}

#[test]
fn test_property_string_image_and_attrs() {
    let config: PatchConfig =
        "file=/tmp/kernel.elf,cpu-num=1,force-raw=yes,attrs-secure=true,attrs-requester-id=12"
            .parse()
            .unwrap();

    assert_eq!(config.file, Some(PathBuf::from("/tmp/kernel.elf")));
    assert_eq!(config.cpu_num, Some(1));
    assert!(config.force_raw);
    assert_eq!(
        config.attrs,
        MemTxAttrs {
            secure: true,
            debug: false,
            requester_id: 12,
        }
    );
}

#[test]
fn test_cpu_sentinel_means_unspecified() {
    let config: PatchConfig = "addr=0x1000,cpu-num=4294967295".parse().unwrap();
    assert_eq!(config.cpu_num, None);
    assert_eq!(PatchConfig::default().with_cpu(CPU_NONE).cpu_num, None);
}

#[test]
fn test_register_name_is_kept_verbatim() {
    let config: PatchConfig = "reg=r2,data=42,data-len=8".parse().unwrap();
    assert_eq!(config.register.as_deref(), Some("r2"));
}

#[rstest]
#[case("addr", PropertyError::MissingValue("addr".into()))]
#[case("bogus=1", PropertyError::UnknownKey("bogus".into()))]
#[case("addr=1,addr=2", PropertyError::Duplicate("addr".into()))]
#[case("data-len=256", PropertyError::InvalidValue { key: "data-len".into(), value: "256".into() })]
#[case("data-be=maybe", PropertyError::InvalidValue { key: "data-be".into(), value: "maybe".into() })]
#[case("addr=0xZZ", PropertyError::InvalidValue { key: "addr".into(), value: "0xZZ".into() })]
fn test_property_string_errors(#[case] input: &str, #[case] expected: PropertyError) {
    assert_eq!(input.parse::<PatchConfig>().unwrap_err(), expected);
}

#[test]
fn test_empty_items_ignored() {
    let config: PatchConfig = "loader,,addr=16,".parse().unwrap();
    assert_eq!(config.address, Some(16));
}

#[test]
fn test_json_uses_property_names() {
    let config = PatchConfig::from_json(
        r#"{ "addr": 2147483648, "cpu-num": 0, "reg": "r5", "attrs-debug": true }"#,
    )
    .unwrap();

    assert_eq!(config.address, Some(0x8000_0000));
    assert_eq!(config.cpu_num, Some(0));
    assert_eq!(config.register.as_deref(), Some("r5"));
    assert!(config.attrs.debug);
    assert_eq!(config.data_len, 0);
}

#[test]
fn test_json_rejects_unknown_keys() {
    assert!(matches!(
        PatchConfig::from_json(r#"{ "address": 1 }"#),
        Err(PropertyError::Json(_))
    ));
}

#[test]
fn test_json_cpu_sentinel() {
    let config = PatchConfig::from_json(r#"{ "addr": 1, "cpu-num": 4294967295 }"#).unwrap();
    assert_eq!(config.cpu_num, None);
}

#[test]
fn test_board_defaults() {
    let board = BoardConfig::default();
    assert_eq!(board.cpus, 1);
    assert_eq!(board.ram_base, 0x8000_0000);
    assert_eq!(board.ram_size, 128 * 1024 * 1024);
    assert_eq!(board.reset_pc, 0x8000_0000);
    assert_eq!(board.secure_ram, None);
}

#[test]
fn test_board_json_partial() {
    let board = BoardConfig::from_json(
        r#"{ "cpus": 4, "secure_ram": { "base": 268435456, "size": 4096 } }"#,
    )
    .unwrap();

    assert_eq!(board.cpus, 4);
    assert_eq!(board.ram_size, BoardConfig::default().ram_size);
    assert_eq!(
        board.secure_ram,
        Some(RegionConfig {
            base: 0x1000_0000,
            size: 0x1000,
        })
    );
}
