use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use tracing::warn;
use tracing_subscriber::EnvFilter;

use svd_mmio::{decode_document, Device, Peripheral};

#[derive(Parser, Debug)]
#[command(name = "dump_device", version, about = "Print a resolved SVD device")]
struct Cli {
    /// Path to the .svd file
    path: PathBuf,
    /// Only print the named peripheral
    #[arg(long)]
    peripheral: Option<String>,
    /// Output JSON instead of a register table
    #[arg(long)]
    json: bool,
    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| level.into()),
        ))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let text = std::fs::read_to_string(&cli.path)
        .with_context(|| format!("reading {}", cli.path.display()))?;
    let decoded = decode_document(&text)
        .with_context(|| format!("decoding {}", cli.path.display()))?;
    for diagnostic in &decoded.diagnostics {
        warn!("{diagnostic}");
    }
    let device = decoded.device;

    let selected: Vec<&Peripheral> = match cli.peripheral.as_deref() {
        Some(name) => vec![device
            .peripheral(name)
            .with_context(|| format!("no peripheral named {name}"))?],
        None => device.peripherals.iter().collect(),
    };

    if cli.json {
        let out = if cli.peripheral.is_some() {
            serde_json::to_string_pretty(&selected)?
        } else {
            serde_json::to_string_pretty(&device)?
        };
        println!("{out}");
        return Ok(());
    }

    print_header(&device);
    for peripheral in selected {
        print_peripheral(peripheral);
    }
    Ok(())
}

fn print_header(device: &Device) {
    println!(
        "{} {} ({})",
        device.vendor.as_deref().unwrap_or("-"),
        device.name,
        device.version
    );
    if let Some(cpu) = &device.cpu {
        println!(
            "cpu {} {} endian={} nvicPrioBits={}",
            cpu.name,
            cpu.revision,
            cpu.endian,
            cpu.nvic_prio_bits.value()
        );
    }
    println!();
}

fn print_peripheral(peripheral: &Peripheral) {
    match &peripheral.derived_from {
        Some(prototype) => println!(
            "{} @ {} (derived from {prototype})",
            peripheral.name, peripheral.base_address
        ),
        None => println!("{} @ {}", peripheral.name, peripheral.base_address),
    }
    for interrupt in &peripheral.interrupts {
        println!("  irq {:<3} {}", interrupt.value.value(), interrupt.name);
    }
    for register in &peripheral.registers {
        println!(
            "  0x{:08x} {:<24} {:<14} size={:<2} reset={}",
            peripheral.register_address(register),
            register.name.as_str(),
            register.access.map(|a| a.as_str()).unwrap_or("-"),
            register.size.value(),
            register
                .reset_value
                .map(|v| v.to_string())
                .unwrap_or_else(|| "-".into()),
        );
        for field in &register.fields {
            println!(
                "      {:<9} {:<22} {}",
                field.bit_range.to_string(),
                field.name.as_str(),
                field.access.map(|a| a.as_str()).unwrap_or("-"),
            );
        }
    }
}
