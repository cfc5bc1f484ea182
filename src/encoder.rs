use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use log::{error, info};

use huffman_codec::files::{self, ENCODED_EXTENSION};

/// Compress a file with static Huffman coding.
#[derive(Parser)]
#[command(name = "encode", version, about)]
struct Args {
    /// File to compress.
    input: PathBuf,

    /// Where to write the artifact. Defaults to `<INPUT>.huff`.
    output: Option<PathBuf>,

    /// Do not print the summary.
    #[arg(short, long)]
    quiet: bool,
}

fn main() -> ExitCode {
    env_logger::init();
    let args = Args::parse();

    let output = args
        .output
        .unwrap_or_else(|| files::default_output_path(&args.input, ENCODED_EXTENSION));

    info!("--- Start Encoding ---");
    let stats = match files::encode_file(&args.input, &output) {
        Ok(stats) => stats,
        Err(e) => {
            error!("Encoding {} failed: {}", args.input.display(), e);
            eprintln!("encode: {}", e);
            return ExitCode::FAILURE;
        }
    };

    if !args.quiet {
        println!(
            "\r\n✅ Encoding successful.\n\
             📂  Input:       {} ({} bytes)\n\
             💾  Output:      {} ({} bytes)\n\
             🔣  Symbols:     {}\n\
             ℹ️  Entropy:     {:.4} bits/symbol\n\
             🗜️  Ratio:       {:.4}%",
            args.input.display(),
            stats.input_len,
            output.display(),
            stats.output_len,
            stats.distinct_symbols,
            stats.entropy,
            stats.ratio()
        );
    }

    info!("--- End ---");
    ExitCode::SUCCESS
}
