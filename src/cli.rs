// Command-line interface: `signature`, `delta` and `patch` verbs over the
// core pipeline.
//
// Outputs default to stdout so the verbs compose in shell pipelines;
// `--output` with an existing file requires `--force`.

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::PathBuf;
use std::process;

use clap::{ArgAction, Args, Parser, Subcommand, ValueHint};

use crate::delta::DeltaEncoder;
use crate::patch;
use crate::signature::{Signature, SignatureOptions, STRONG_SUM_MAX_LEN};

const BUF_SIZE: usize = 64 * 1024;

// ---------------------------------------------------------------------------
// Clap CLI definition
// ---------------------------------------------------------------------------

/// Rsync-style signature/delta/patch tool.
#[derive(Parser, Debug)]
#[command(
    name = "rsdelta",
    version,
    about = "rsync-style delta compression",
    arg_required_else_help = true
)]
struct Cli {
    #[command(subcommand)]
    command: Cmd,

    /// Force overwrite existing output files.
    #[arg(short = 'f', long, global = true)]
    force: bool,

    /// Quiet mode (suppress non-error output).
    #[arg(short = 'q', long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    /// Verbose mode (use multiple times for more detail).
    #[arg(short = 'v', long, global = true, action = ArgAction::Count)]
    verbose: u8,

    /// Output stats as JSON to stderr.
    #[arg(long = "json", global = true)]
    json_output: bool,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Compute a block signature of a base file.
    Signature(SignatureArgs),
    /// Compute a delta from a signature and a new file.
    Delta(DeltaArgs),
    /// Apply a delta to a base file, reconstructing the new file.
    Patch(PatchArgs),
}

#[derive(Args, Debug)]
struct SignatureArgs {
    /// Base file to fingerprint.
    #[arg(value_hint = ValueHint::FilePath)]
    base: PathBuf,

    /// Block size in bytes.
    #[arg(long = "block-size", default_value_t = 2048, value_parser = clap::value_parser!(u32).range(1..))]
    block_size: u32,

    /// Strong-sum bytes kept per block (1-16).
    #[arg(long = "strong-len", default_value_t = 8, value_parser = clap::value_parser!(u32).range(1..=STRONG_SUM_MAX_LEN as i64))]
    strong_len: u32,

    /// Output file (default: stdout).
    #[arg(long, value_hint = ValueHint::FilePath)]
    output: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct DeltaArgs {
    /// Signature file produced by `signature`.
    #[arg(value_hint = ValueHint::FilePath)]
    sig: PathBuf,

    /// New file to encode.
    #[arg(value_hint = ValueHint::FilePath)]
    new: PathBuf,

    /// Output file (default: stdout).
    #[arg(long, value_hint = ValueHint::FilePath)]
    output: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct PatchArgs {
    /// Base file the delta was computed against.
    #[arg(value_hint = ValueHint::FilePath)]
    base: PathBuf,

    /// Delta file produced by `delta`.
    #[arg(value_hint = ValueHint::FilePath)]
    delta: PathBuf,

    /// Output file (default: stdout).
    #[arg(long, value_hint = ValueHint::FilePath)]
    output: Option<PathBuf>,
}

// ---------------------------------------------------------------------------
// Output selection
// ---------------------------------------------------------------------------

fn open_output(path: Option<&PathBuf>, force: bool) -> Result<Box<dyn Write>, i32> {
    match path {
        None => Ok(Box::new(BufWriter::with_capacity(
            BUF_SIZE,
            io::stdout().lock(),
        ))),
        Some(path) => {
            if path.exists() && !force {
                eprintln!(
                    "rsdelta: output file exists, use -f to overwrite: {}",
                    path.display()
                );
                return Err(1);
            }
            match File::create(path) {
                Ok(f) => Ok(Box::new(BufWriter::with_capacity(BUF_SIZE, f))),
                Err(e) => {
                    eprintln!("rsdelta: output file: {}: {e}", path.display());
                    Err(1)
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Signature command
// ---------------------------------------------------------------------------

fn cmd_signature(cli: &Cli, args: &SignatureArgs) -> i32 {
    let base = match std::fs::read(&args.base) {
        Ok(data) => data,
        Err(e) => {
            eprintln!("rsdelta: base file: {}: {e}", args.base.display());
            return 1;
        }
    };

    let opts = SignatureOptions {
        block_len: args.block_size,
        strong_len: args.strong_len,
    };
    let sig = match Signature::generate(&base, &opts) {
        Ok(sig) => sig,
        Err(e) => {
            eprintln!("rsdelta: {e}");
            return 1;
        }
    };

    let mut writer = match open_output(args.output.as_ref(), cli.force) {
        Ok(w) => w,
        Err(code) => return code,
    };
    let sig_bytes = sig.to_bytes();
    if let Err(e) = writer.write_all(&sig_bytes).and_then(|()| writer.flush()) {
        eprintln!("rsdelta: write: {e}");
        return 1;
    }

    if cli.verbose > 0 && !cli.quiet {
        eprintln!(
            "rsdelta: signature: {} base bytes, {} blocks of {}, {} bytes out",
            base.len(),
            sig.block_count(),
            args.block_size,
            sig_bytes.len()
        );
    }
    if cli.json_output {
        let json = serde_json::json!({
            "command": "signature",
            "base_size": base.len(),
            "block_size": args.block_size,
            "strong_len": args.strong_len,
            "blocks": sig.block_count(),
            "sig_size": sig_bytes.len(),
        });
        eprintln!("{}", serde_json::to_string_pretty(&json).unwrap());
    }

    0
}

// ---------------------------------------------------------------------------
// Delta command
// ---------------------------------------------------------------------------

fn cmd_delta(cli: &Cli, args: &DeltaArgs) -> i32 {
    let sig_bytes = match std::fs::read(&args.sig) {
        Ok(data) => data,
        Err(e) => {
            eprintln!("rsdelta: signature file: {}: {e}", args.sig.display());
            return 1;
        }
    };

    let new_file = match File::open(&args.new) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("rsdelta: new file: {}: {e}", args.new.display());
            return 1;
        }
    };
    let mut reader = BufReader::with_capacity(BUF_SIZE, new_file);

    let writer = match open_output(args.output.as_ref(), cli.force) {
        Ok(w) => w,
        Err(code) => return code,
    };

    let mut encoder = match DeltaEncoder::new(&sig_bytes, writer) {
        Ok(enc) => enc,
        Err(e) => {
            eprintln!("rsdelta: {e}");
            return 1;
        }
    };

    let mut buf = vec![0u8; BUF_SIZE];
    let mut target_size = 0u64;
    loop {
        match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => {
                target_size += n as u64;
                if let Err(e) = encoder.write(&buf[..n]) {
                    eprintln!("rsdelta: {e}");
                    return 1;
                }
            }
            Err(e) => {
                eprintln!("rsdelta: read error: {e}");
                return 1;
            }
        }
    }

    let block_len = encoder.block_len();
    if let Err(e) = encoder.finish() {
        eprintln!("rsdelta: {e}");
        return 1;
    }

    if cli.verbose > 0 && !cli.quiet {
        eprintln!("rsdelta: delta: {target_size} new bytes against {block_len}-byte blocks");
    }
    if cli.json_output {
        let json = serde_json::json!({
            "command": "delta",
            "sig_size": sig_bytes.len(),
            "block_size": block_len,
            "target_size": target_size,
        });
        eprintln!("{}", serde_json::to_string_pretty(&json).unwrap());
    }

    0
}

// ---------------------------------------------------------------------------
// Patch command
// ---------------------------------------------------------------------------

fn cmd_patch(cli: &Cli, args: &PatchArgs) -> i32 {
    let base = match std::fs::read(&args.base) {
        Ok(data) => data,
        Err(e) => {
            eprintln!("rsdelta: base file: {}: {e}", args.base.display());
            return 1;
        }
    };
    let delta = match std::fs::read(&args.delta) {
        Ok(data) => data,
        Err(e) => {
            eprintln!("rsdelta: delta file: {}: {e}", args.delta.display());
            return 1;
        }
    };

    let mut writer = match open_output(args.output.as_ref(), cli.force) {
        Ok(w) => w,
        Err(code) => return code,
    };

    let written = match patch::apply(&base, &delta, &mut writer) {
        Ok(n) => n,
        Err(e) => {
            eprintln!("rsdelta: {e}");
            return 1;
        }
    };
    if let Err(e) = writer.flush() {
        eprintln!("rsdelta: write: {e}");
        return 1;
    }

    if cli.verbose > 0 && !cli.quiet {
        eprintln!("rsdelta: patch: {written} bytes reconstructed");
    }
    if cli.json_output {
        let json = serde_json::json!({
            "command": "patch",
            "base_size": base.len(),
            "delta_size": delta.len(),
            "output_size": written,
        });
        eprintln!("{}", serde_json::to_string_pretty(&json).unwrap());
    }

    0
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

/// Main CLI entry point. Parses arguments via clap, dispatches commands.
pub fn run() -> ! {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .format_timestamp(None)
        .format_target(false)
        .init();

    let cli = Cli::parse();
    let exit_code = match &cli.command {
        Cmd::Signature(args) => cmd_signature(&cli, args),
        Cmd::Delta(args) => cmd_delta(&cli, args),
        Cmd::Patch(args) => cmd_patch(&cli, args),
    };

    process::exit(exit_code);
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
