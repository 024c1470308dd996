//! Generic loader CLI.
//!
//! This binary boots the reference board with a set of loader devices and reports the
//! resulting guest state. It performs:
//! 1. **Board setup:** Builds the board from a JSON description or the defaults.
//! 2. **Cold-plug:** Attaches every `--device` before the machine is ready.
//! 3. **Boot:** Runs the first system reset, then attaches every `--hotplug` device.
//! 4. **Inspection:** Dumps memory ranges and hart registers, then tears the devices down.

use clap::Parser;
use std::{fs, process};
use tracing::info;
use tracing_subscriber::EnvFilter;

use rvsim_loader::common::MemTxAttrs;
use rvsim_loader::config::{BoardConfig, PatchConfig};
use rvsim_loader::soc::{AddressSpace, Board};
use rvsim_loader::{AttachedLoader, GenericLoader};

#[derive(Parser, Debug)]
#[command(
    name = "patch",
    author,
    version,
    about = "Boot a reference board with generic loader devices",
    long_about = "Attach generic loader devices to a reference RISC-V board, run its reset sequence and inspect the result.\n\nDevices are described as property strings.\n\nExamples:\n  patch --device loader,addr=0x80000000,data=0x13,data-len=4 --dump 0x80000000:4\n  patch --device loader,file=kernel.elf,cpu-num=0 --regs 0\n  patch --board board.json --hotplug loader,addr=0x80001000,cpu-num=1 --regs 1"
)]
struct Cli {
    /// Board description (JSON). Defaults to one hart and 128 MiB of RAM.
    #[arg(long)]
    board: Option<String>,

    /// Loader attached before the machine is ready. Repeatable.
    #[arg(short, long = "device", value_name = "PROPS")]
    devices: Vec<String>,

    /// Loader attached after the first reset. Repeatable.
    #[arg(long = "hotplug", value_name = "PROPS")]
    hotplugs: Vec<String>,

    /// Additional system resets after boot.
    #[arg(long, default_value_t = 0)]
    resets: u32,

    /// Memory range to print after boot, as ADDR:LEN. Repeatable.
    #[arg(long = "dump", value_name = "ADDR:LEN")]
    dumps: Vec<String>,

    /// Hart whose registers are printed after boot. Repeatable.
    #[arg(long = "regs", value_name = "HART")]
    regs: Vec<usize>,
}

fn main() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .try_init();

    let cli = Cli::parse();

    let config = match &cli.board {
        Some(path) => {
            let json = fs::read_to_string(path)
                .unwrap_or_else(|e| fail(&format!("cannot read board description {path}: {e}")));
            BoardConfig::from_json(&json).unwrap_or_else(|e| fail(&e.to_string()))
        }
        None => BoardConfig::default(),
    };
    let mut board = Board::new(&config);

    let mut loaders = Vec::new();
    for props in &cli.devices {
        loaders.push(attach(&mut board, props));
    }

    if let Err(e) = board.machine_done() {
        fail(&format!("first reset failed: {e}"));
    }

    for props in &cli.hotplugs {
        loaders.push(attach(&mut board, props));
    }

    for _ in 0..cli.resets {
        if let Err(e) = board.system_reset() {
            fail(&format!("reset failed: {e}"));
        }
    }

    for range in &cli.dumps {
        dump_memory(&mut board, range);
    }

    for &hart in &cli.regs {
        match board.platform.harts.get(hart) {
            Some(h) => print!("hart {hart}:\n{}", h.dump()),
            None => fail(&format!("no hart {hart}")),
        }
    }

    let count = loaders.len();
    for loader in loaders {
        let _ = loader.detach(&mut board.resets);
    }
    info!(loaders = count, "devices detached");
}

/// Parses a property string and attaches the resulting loader.
fn attach(board: &mut Board, props: &str) -> AttachedLoader {
    let config: PatchConfig = props
        .parse()
        .unwrap_or_else(|e| fail(&format!("{props}: {e}")));

    GenericLoader::new(config)
        .attach(&mut board.platform, &mut board.resets)
        .unwrap_or_else(|e| fail(&format!("{props}: {e}")))
}

/// Prints `ADDR:LEN` as a hex dump, 16 bytes per line.
fn dump_memory(board: &mut Board, range: &str) {
    let Some((addr, len)) = range
        .split_once(':')
        .and_then(|(a, l)| Some((parse_num(a)?, usize::try_from(parse_num(l)?).ok()?)))
    else {
        fail(&format!("invalid dump range {range}, expected ADDR:LEN"));
    };

    let mut buf = vec![0u8; len];
    let attrs = MemTxAttrs {
        secure: true,
        ..MemTxAttrs::default()
    };
    if let Err(e) = board.platform.memory.read(addr, &mut buf, attrs) {
        fail(&format!("dump {range}: {e}"));
    }

    for (i, chunk) in buf.chunks(16).enumerate() {
        let bytes: Vec<String> = chunk.iter().map(|b| format!("{b:02x}")).collect();
        println!("{:#018x}: {}", addr + (i as u64) * 16, bytes.join(" "));
    }
}

fn parse_num(s: &str) -> Option<u64> {
    match s.strip_prefix("0x") {
        Some(hex) => u64::from_str_radix(hex, 16).ok(),
        None => s.parse().ok(),
    }
}

fn fail(msg: &str) -> ! {
    eprintln!("Error: {msg}");
    process::exit(1);
}
