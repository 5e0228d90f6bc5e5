//! `ilcart` — ahead-of-time compiler from CLI (ECMA-335) assemblies to
//! bootable 8-bit cartridge images.

use clap::{Parser, Subcommand};
use ilcart::{CompileConfig, CompileError};
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "ilcart", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Raise the log level once per occurrence (overrides `RUST_LOG`).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Command {
    /// Compile a managed-bytecode assembly into a cartridge image.
    Compile(CompileArgs),
}

#[derive(clap::Args)]
struct CompileArgs {
    /// Path to the managed-bytecode binary.
    input: PathBuf,

    /// Output cartridge image path.
    #[arg(short, long, default_value = "output.gb")]
    output: PathBuf,

    /// Cartridge title, truncated to 15 characters.
    #[arg(long, default_value = "HELLO WORLD")]
    title: String,

    /// Cartridge-type byte, e.g. `0x00` or `0`.
    #[arg(long, default_value = "0x00", value_parser = parse_byte)]
    cartridge_type: u8,

    /// Treat an IL opcode with no target lowering as a hard failure.
    #[arg(long)]
    strict_opcodes: bool,
}

fn parse_byte(value: &str) -> Result<u8, String> {
    let value = value.trim();
    if let Some(hex) = value.strip_prefix("0x").or_else(|| value.strip_prefix("0X")) {
        u8::from_str_radix(hex, 16).map_err(|e| e.to_string())
    } else {
        value.parse::<u8>().map_err(|e| e.to_string())
    }
}

fn init_logging(verbosity: u8) {
    let default_level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("error: {message}");
            ExitCode::FAILURE
        }
    }
}

fn run(command: Command) -> Result<(), String> {
    match command {
        Command::Compile(args) => compile(args).map_err(|e| e.to_string()),
    }
}

fn compile(args: CompileArgs) -> Result<(), CompileError> {
    let mut title = args.title;
    title.truncate(ilcart::config::MAX_TITLE_LEN);

    let config = CompileConfig {
        title,
        cartridge_type: args.cartridge_type,
        strict_opcodes: args.strict_opcodes,
    };

    let input = read_input(&args.input).map_err(CompileError::Io)?;
    let image = ilcart::compile(&input, &config)?;
    fs::write(&args.output, image).map_err(CompileError::Io)?;
    Ok(())
}

/// Reads the whole input file into memory, via a memory map when the `mmap`
/// feature is enabled — semantically identical to a full read, just
/// avoiding the copy (mirrors the teacher library's own gated load path).
#[cfg(feature = "mmap")]
fn read_input(path: &std::path::Path) -> std::io::Result<Vec<u8>> {
    let file = fs::File::open(path)?;
    let mapping = unsafe { memmap2::Mmap::map(&file)? };
    Ok(mapping.to_vec())
}

#[cfg(not(feature = "mmap"))]
fn read_input(path: &std::path::Path) -> std::io::Result<Vec<u8>> {
    fs::read(path)
}
