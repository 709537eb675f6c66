mod commands;
mod config;
mod render;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use sigpatch::Architecture;
use tracing_subscriber::EnvFilter;

use config::Config;

#[derive(Parser)]
#[command(name = "sigpatch")]
#[command(about = "Masked signature patcher for executable images", version)]
struct Args {
    /// Config file (default: <config dir>/sigpatch/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// JSON signature table to use instead of the builtin one
    #[arg(short, long, global = true, env = "SIGPATCH_SIGNATURES")]
    signatures: Option<PathBuf>,

    /// Print reports as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Apply the signatures to the target
    Patch {
        /// Target executable (default: config `target`)
        path: Option<PathBuf>,
        /// Override architecture detection (x64, x86)
        #[arg(short, long)]
        arch: Option<Architecture>,
        /// Do not create <target>.bak
        #[arg(long)]
        no_backup: bool,
        /// Report what would change without writing
        #[arg(long)]
        dry_run: bool,
    },
    /// Undo the signatures, or copy back the backup
    Restore {
        path: Option<PathBuf>,
        #[arg(short, long)]
        arch: Option<Architecture>,
        /// Replace the target with <target>.bak instead of reversing signatures
        #[arg(long)]
        from_backup: bool,
    },
    /// Show which signatures are patched, unpatched or missing
    Scan {
        path: Option<PathBuf>,
        #[arg(short, long)]
        arch: Option<Architecture>,
    },
    /// Print the detected architecture of the target
    Arch { path: Option<PathBuf> },
    /// Validate and print the signature table as JSON
    Signatures {
        /// Write the table to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();

    let directive = if args.verbose {
        "sigpatch=debug"
    } else {
        "sigpatch=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(directive.parse()?))
        .with_writer(std::io::stderr)
        .init();

    let config = Config::load_or_default(args.config.as_deref());
    let signatures = config.signature_set(args.signatures.as_deref())?;
    let target = |path: Option<PathBuf>| path.unwrap_or_else(|| config.target.clone());

    match args.command {
        Command::Patch {
            path,
            arch,
            no_backup,
            dry_run,
        } => commands::patch::run(
            &target(path),
            &signatures,
            arch,
            config.backup && !no_backup,
            dry_run,
            args.json,
        ),
        Command::Restore {
            path,
            arch,
            from_backup,
        } => commands::restore::run(&target(path), &signatures, arch, from_backup, args.json),
        Command::Scan { path, arch } => {
            commands::scan::run(&target(path), &signatures, arch, args.json)
        }
        Command::Arch { path } => commands::arch::run(&target(path), args.json),
        Command::Signatures { output } => commands::signatures::run(&signatures, output.as_deref()),
    }
}
