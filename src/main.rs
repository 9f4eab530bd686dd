//! dirhash CLI - print the deterministic digest of a directory tree

use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::{debug, Level};
use tracing_subscriber::EnvFilter;

use dirhash::{Config, DirHasher, Hash, SymlinkPolicy};

#[derive(Parser)]
#[command(name = "dirhash")]
#[command(about = "compute a deterministic cryptographic hash of a directory tree")]
#[command(version)]
struct Cli {
    /// the directory to generate a cryptographic hash of
    #[arg(short, long, default_value = ".")]
    dir: PathBuf,

    /// symlink handling: refuse, file, follow
    #[arg(long, env = "DIRHASH_SYMLINKS")]
    symlinks: Option<SymlinkPolicy>,

    /// toml config file
    #[arg(short, long, env = "DIRHASH_CONFIG")]
    config: Option<PathBuf>,

    /// hash sibling entries one at a time
    #[arg(long)]
    sequential: bool,

    /// print the root's canonical listing instead of its digest
    #[arg(long)]
    listing: bool,

    /// fail unless the digest equals this hex value
    #[arg(long, value_name = "HEX")]
    expect: Option<String>,

    /// log every directory's canonical listing to stderr
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("error: {}", e);
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("dirhash=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    // a subscriber may already be installed when embedded; keep that one
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init();
}

fn run(cli: Cli) -> dirhash::Result<()> {
    let mut config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    if let Some(policy) = cli.symlinks {
        config.symlinks = policy;
    }
    if cli.sequential {
        config.parallel = false;
    }
    debug!(
        dir = %cli.dir.display(),
        symlinks = %config.symlinks,
        parallel = config.parallel,
        "hashing tree"
    );

    let mut hasher = DirHasher::new().config(config);
    if tracing::enabled!(Level::DEBUG) {
        hasher = hasher.on_listing(|dir, listing| {
            debug!(
                dir = %dir.display(),
                "hashing directory:\n\"\"\"\n{}\"\"\"",
                listing
            );
        });
    }

    let listing = hasher.listing(&cli.dir)?;
    let digest = listing.digest();

    if let Some(expected) = &cli.expect {
        let expected = Hash::from_hex(expected.trim())?;
        if expected != digest {
            return Err(dirhash::Error::DigestMismatch {
                expected: expected.to_hex(),
                actual: digest.to_hex(),
            });
        }
    }

    let mut stdout = io::stdout().lock();
    let written = if cli.listing {
        stdout.write_all(listing.as_bytes())
    } else {
        writeln!(stdout, "{}", digest)
    };
    written
        .and_then(|_| stdout.flush())
        .map_err(|e| dirhash::Error::Io {
            path: "stdout".into(),
            source: e,
        })
}
