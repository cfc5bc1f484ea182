use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use log::{error, info};

use huffman_codec::files::{self, DECODED_EXTENSION};

/// Restore a file compressed by `encode`.
#[derive(Parser)]
#[command(name = "decode", version, about)]
struct Args {
    /// Artifact to decompress.
    input: PathBuf,

    /// Where to write the restored bytes. Defaults to `<INPUT>.txt`.
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
        .unwrap_or_else(|| files::default_output_path(&args.input, DECODED_EXTENSION));

    info!("--- Start Decoding ---");
    let written = match files::decode_file(&args.input, &output) {
        Ok(written) => written,
        Err(e) => {
            error!(
                "Decoding {} failed ({:?} error): {}",
                args.input.display(),
                e.kind(),
                e
            );
            eprintln!("decode: {}", e);
            return ExitCode::FAILURE;
        }
    };

    if !args.quiet {
        let input_size = std::fs::metadata(&args.input).map(|m| m.len()).unwrap_or(0);
        println!(
            "\r\n✅ decoding successful.\n\
             📂 input file:        {} ({} bytes)\n\
             💾 output file:       {} ({} bytes)",
            args.input.display(),
            input_size,
            output.display(),
            written
        );
    }

    info!("--- End ---");
    ExitCode::SUCCESS
}
