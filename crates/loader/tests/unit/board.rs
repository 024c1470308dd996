//! # Reference Board Tests
//!
//! Harts, memory routing and the reset table behind the loader tests.

use std::sync::Arc;

use rvsim_loader::common::{MemTxAttrs, MemTxError};
use rvsim_loader::config::{BoardConfig, PatchConfig};
use rvsim_loader::device::GenericLoader;
use rvsim_loader::soc::hart::PC_REGNUM;
use rvsim_loader::soc::{
    AddressSpace, AddressSpaceId, Board, CpuCore, Hart, Machine, MemoryRegion, ResetRegistry,
    ResetTable, SYSTEM_MEMORY, SystemMemory,
};

use crate::common::harness::{RAM_BASE, RAM_SIZE, RESET_PC, SECURE_BASE, TestContext};

const SECURE: MemTxAttrs = MemTxAttrs {
    secure: true,
    debug: false,
    requester_id: 0,
};

#[test]
fn test_hart_reset_restores_defaults() {
    let mut hart = Hart::new(0, RESET_PC, SYSTEM_MEMORY);
    hart.regs.write(5, 99);
    hart.set_pc(0x1234);

    hart.reset();
    assert_eq!(hart.regs.read(5), 0);
    assert_eq!(hart.pc(), RESET_PC);
}

#[test]
fn test_hart_register_writes() {
    let mut hart = Hart::new(0, RESET_PC, SYSTEM_MEMORY);

    assert_eq!(hart.write_register(7, &0xABCDu64.to_le_bytes()), 8);
    assert_eq!(hart.regs.read(7), 0xABCD);

    assert_eq!(hart.write_register(0, &1u64.to_le_bytes()), 8);
    assert_eq!(hart.regs.read(0), 0);

    assert_eq!(hart.write_register(PC_REGNUM, &0x8000_0040u64.to_le_bytes()), 8);
    assert_eq!(hart.pc, 0x8000_0040);

    assert_eq!(hart.write_register(PC_REGNUM + 1, &[0; 8]), 0);
}

#[test]
fn test_hart_dump_lists_pc() {
    let hart = Hart::new(0, RESET_PC, SYSTEM_MEMORY);
    let dump = hart.dump();
    assert!(dump.contains("x0 =0x0000000000000000"));
    assert!(dump.ends_with("pc =0x0000000080000000\n"));
}

#[test]
fn test_platform_topology() {
    let ctx = TestContext::new();
    let platform = &ctx.board.platform;

    assert_eq!(platform.first_cpu(), Some(0));
    assert!(platform.cpu(1).is_some());
    assert!(platform.cpu(2).is_none());
    assert_eq!(platform.ram_size(), RAM_SIZE);
    assert!(!platform.is_ready());

    let names: Vec<_> = platform.memory.regions().iter().map(|r| r.name()).collect();
    assert_eq!(names, vec!["SRAM", "DRAM"]);
}

#[test]
fn test_platform_without_secure_window() {
    let mut board = Board::new(&BoardConfig::default());
    assert_eq!(board.platform.memory.regions().len(), 1);
    assert!(board.platform.address_space_mut(AddressSpaceId(1)).is_none());
    board.machine_done().unwrap();
    assert!(board.platform.is_ready());
}

#[test]
fn test_memory_routing_errors() {
    let mut mem = SystemMemory::new();
    mem.add_region(MemoryRegion::new("DRAM", 0x1000, 0x100, false));
    mem.add_region(MemoryRegion::new("SRAM", 0x4000, 0x100, true));
    let mut buf = [0u8; 4];

    assert_eq!(
        mem.read(0x2000, &mut buf, MemTxAttrs::UNSPECIFIED),
        Err(MemTxError::Unmapped { addr: 0x2000 })
    );
    assert_eq!(
        mem.write(0x10FE, &[0; 4], MemTxAttrs::UNSPECIFIED),
        Err(MemTxError::OutOfBounds {
            addr: 0x10FE,
            len: 4,
        })
    );
    assert_eq!(
        mem.write(0x4000, &[1], MemTxAttrs::UNSPECIFIED),
        Err(MemTxError::Denied { addr: 0x4000 })
    );
    assert_eq!(mem.write(0x4000, &[1], SECURE), Ok(()));
    assert_eq!(mem.read(0x4000, &mut buf[..1], SECURE), Ok(()));
    assert_eq!(buf[0], 1);
    assert_eq!(mem.write(0x9999, &[], MemTxAttrs::UNSPECIFIED), Ok(()));
}

#[test]
fn test_secure_attrs_reach_memory() {
    let mut ctx = TestContext::new();
    let config = PatchConfig::default()
        .with_address(SECURE_BASE + 0x10)
        .with_data(0x5A, 1)
        .with_attrs(SECURE);
    let _loader = ctx.attach(config).unwrap();

    ctx.machine_done();
    assert_eq!(ctx.read(SECURE_BASE + 0x10, 1), vec![0x5A]);
}

#[test]
fn test_reset_table_preserves_order_and_tokens() {
    let mut ctx = TestContext::new();
    let first = GenericLoader::new(PatchConfig::default().with_address(RAM_BASE).with_data(1, 1))
        .prepare(&mut ctx.board.platform)
        .unwrap();
    let second = GenericLoader::new(PatchConfig::default().with_address(RAM_BASE).with_data(2, 1))
        .prepare(&mut ctx.board.platform)
        .unwrap();

    let mut table = ResetTable::new();
    let a = table.register(Arc::new(first));
    let b = table.register(Arc::new(second));
    assert_ne!(a, b);
    assert_eq!(table.len(), 2);

    for action in table.actions() {
        action.reset(&mut ctx.board.platform).unwrap();
    }
    assert_eq!(ctx.read(RAM_BASE, 1), vec![2]);

    assert!(table.unregister(a));
    assert!(!table.unregister(a));
    assert_eq!(table.len(), 1);
    assert!(table.contains(b));
}

#[test]
fn test_all_actions_run_when_one_fails() {
    let mut ctx = TestContext::new();
    let _bad = ctx
        .attach(PatchConfig::default().with_address(0x10).with_data(1, 1))
        .unwrap();
    let _good = ctx
        .attach(PatchConfig::default().with_address(RAM_BASE).with_data(7, 1))
        .unwrap();

    assert!(ctx.board.system_reset().is_err());
    assert_eq!(ctx.read(RAM_BASE, 1), vec![7]);
}
