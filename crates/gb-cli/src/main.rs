//! GB CLI - Inspect a Game Boy cartridge through the emulated address space

use clap::Parser;
use gb_core::system::{GameBoy, SystemConfig};
use gb_core::{BusError, SerialSink};
use log::{info, warn};
use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;

/// Game Boy memory inspector
#[derive(Parser, Debug)]
#[command(name = "gb-cli")]
#[command(about = "Load a Game Boy ROM and peek/poke its address space", long_about = None)]
struct Args {
    /// Path to the ROM image
    #[arg(short, long)]
    rom: PathBuf,

    /// Start with the boot image unmapped and post-boot registers loaded
    #[arg(short, long)]
    skip_boot: bool,

    /// Print the cartridge header
    #[arg(long)]
    header: bool,

    /// Read a byte (0x-prefixed hex or decimal); repeatable
    #[arg(long, value_name = "ADDR")]
    peek: Vec<String>,

    /// Write a byte, e.g. 0xC000=0x42; repeatable, applied before peeks
    #[arg(long, value_name = "ADDR=VALUE")]
    poke: Vec<String>,

    /// Hex dump starting at this address
    #[arg(long, value_name = "ADDR")]
    dump: Option<String>,

    /// Number of bytes to dump
    #[arg(long, default_value = "256")]
    len: String,

    /// Battery RAM image to load before any pokes
    #[arg(long, value_name = "PATH")]
    load_save: Option<PathBuf>,

    /// Write battery RAM here after pokes
    #[arg(long, value_name = "PATH")]
    save: Option<PathBuf>,

    /// Debug-level logging unless RUST_LOG says otherwise
    #[arg(short, long)]
    verbose: bool,
}

/// Prints serial output as text
struct SerialPrinter<W: Write> {
    out: W,
}

impl<W: Write> SerialSink for SerialPrinter<W> {
    fn on_serial_byte(&mut self, byte: u8) {
        if let Err(e) = self.out.write_all(&[byte]).and_then(|_| self.out.flush()) {
            warn!("serial output {:#04x} dropped: {}", byte, e);
        }
    }
}

fn main() {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level)).init();

    if let Err(e) = run(&args) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let rom_data = fs::read(&args.rom)
        .map_err(|e| format!("failed to read rom {}: {}", args.rom.display(), e))?;

    let config = SystemConfig {
        skip_boot_rom: args.skip_boot,
    };
    let mut system = GameBoy::from_rom(&rom_data, config)?;
    system.attach_serial(Box::new(SerialPrinter { out: io::stdout() }));

    if args.header {
        print_header(&system);
    }

    if let Some(path) = &args.load_save {
        let data = fs::read(path)
            .map_err(|e| format!("failed to read save {}: {}", path.display(), e))?;
        system.import_ram(&data)?;
        info!("loaded {} bytes of cartridge ram from {}", data.len(), path.display());
    }

    for poke in &args.poke {
        let (address, value) = poke
            .split_once('=')
            .ok_or_else(|| format!("poke must be ADDR=VALUE, got {:?}", poke))?;
        let address = parse_number(address)?;
        let value = parse_number(value)?;
        system.bus_mut().write_byte_checked(address, value)?;
    }

    for peek in &args.peek {
        let address = parse_number(peek)?;
        let value = system.bus().read_byte_checked(address)?;
        println!("${:04X}: ${:02X}", address, value);
    }

    if let Some(start) = &args.dump {
        let start = parse_number(start)?;
        let len = parse_number(&args.len)?;
        dump(&mut io::stdout().lock(), &system, start, len)?;
    }

    if let Some(path) = &args.save {
        if !system.has_battery() {
            eprintln!("warning: cartridge has no battery, saving ram anyway");
        }
        let data = system.export_ram();
        fs::write(path, &data)
            .map_err(|e| format!("failed to write save {}: {}", path.display(), e))?;
        info!("wrote {} bytes of cartridge ram to {}", data.len(), path.display());
    }

    Ok(())
}

/// Parse `0x`-prefixed hex or decimal
fn parse_number(text: &str) -> Result<u32, String> {
    let text = text.trim();
    let parsed = match text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        Some(hex) => u32::from_str_radix(hex, 16),
        None => text.parse::<u32>(),
    };
    parsed.map_err(|e| format!("invalid number {:?}: {}", text, e))
}

fn print_header(system: &GameBoy) {
    let header = system.header();
    let descriptor = system.descriptor();

    println!("Cartridge:");
    println!("  Title:    {}", header.title);
    println!("  Type:     ${:02X} {}", descriptor.id, descriptor.name);
    match header.declared_rom_banks() {
        Some(banks) => println!("  ROM:      {} banks", banks),
        None => println!("  ROM:      unknown size code ${:02X}", header.rom_size_code),
    }
    println!("  RAM:      {} banks", header.declared_ram_banks());
    println!("  Battery:  {}", descriptor.has_battery());
    println!(
        "  Checksum: ${:02X} ({})",
        header.header_checksum,
        if header.checksum_valid() { "ok" } else { "mismatch" }
    );
    println!("  Logo:     {}", if header.logo_matches { "ok" } else { "mismatch" });
}

/// Hex dump of `len` bytes from `start`, 16 per row.
///
/// Both ends are checked against the bus before anything is printed.
fn dump<W: Write>(out: &mut W, system: &GameBoy, start: u32, len: u32) -> Result<(), Box<dyn std::error::Error>> {
    if len == 0 {
        return Ok(());
    }
    let bus = system.bus();
    let last = start
        .checked_add(len - 1)
        .ok_or(BusError::InvalidAddress(u32::MAX))?;
    bus.read_byte_checked(start)?;
    bus.read_byte_checked(last)?;

    // last <= 0xFFFF here, so row + 16 cannot overflow
    for row in (start - start % 16..=last).step_by(16) {
        let mut line = format!("${:04X}:", row);
        for address in row..row + 16 {
            if address < start || address > last {
                line.push_str("   ");
            } else {
                line.push_str(&format!(" {:02X}", bus.read_byte_checked(address)?));
            }
        }
        writeln!(out, "{}", line.trim_end())?;
    }

    Ok(())
}
