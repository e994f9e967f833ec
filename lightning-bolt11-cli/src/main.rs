//! `bolt11`, a command line tool to inspect and create BOLT11 lightning invoices.

use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand};
use lightning_bolt11::util::logger::Level;

mod decode;
mod encode;
mod logger;

#[derive(Parser)]
#[command(name = "bolt11")]
#[command(about = "Decode and encode BOLT11 lightning invoices", long_about = None)]
#[command(version)]
struct Cli {
	/// Log decoding details to stderr, once for debug and twice for trace output
	#[arg(short, long, action = ArgAction::Count, global = true)]
	verbose: u8,

	#[command(subcommand)]
	command: Commands,
}

#[derive(Subcommand)]
enum Commands {
	/// Decode an invoice and print its content as JSON
	Decode(decode::DecodeArgs),
	/// Build and sign an invoice and print it
	Encode(encode::EncodeArgs),
}

fn main() -> Result<()> {
	let cli = Cli::parse();
	let level = match cli.verbose {
		0 => Level::Warn,
		1 => Level::Debug,
		_ => Level::Trace,
	};
	let logger = logger::StderrLogger::new(level);

	match cli.command {
		Commands::Decode(args) => decode::handle_command(args, &logger),
		Commands::Encode(args) => encode::handle_command(args, &logger),
	}
}
