//! mtarc CLI - Command-line tool for MTA deployment archives.
//!
//! This is the main entry point for the mtarc command-line application.

use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use mtarc::{handler, ZipStream};

/// Default limit for the manifest and the deployment descriptor (1 MiB).
const DEFAULT_DOCUMENT_LIMIT: u64 = 1024 * 1024;

/// Default limit for generic entry content (4 GiB).
const DEFAULT_CONTENT_LIMIT: u64 = 4 * 1024 * 1024 * 1024;

/// mtarc - MTA deployment archive inspection and extraction tool
#[derive(Parser)]
#[command(name = "mtarc")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the package manifest (META-INF/MANIFEST.MF)
    Manifest {
        /// Path to the archive
        #[arg(short, long, env = "MTARC_ARCHIVE")]
        archive: PathBuf,

        /// Maximum accepted manifest size in bytes
        #[arg(short, long, env = "MTARC_MANIFEST_LIMIT", default_value_t = DEFAULT_DOCUMENT_LIMIT)]
        limit: u64,
    },

    /// Print the deployment descriptor (META-INF/mtad.yaml)
    Descriptor {
        /// Path to the archive
        #[arg(short, long, env = "MTARC_ARCHIVE")]
        archive: PathBuf,

        /// Maximum accepted descriptor size in bytes
        #[arg(short, long, env = "MTARC_DESCRIPTOR_LIMIT", default_value_t = DEFAULT_DOCUMENT_LIMIT)]
        limit: u64,
    },

    /// Extract a single named entry
    Extract {
        /// Path to the archive
        #[arg(short, long, env = "MTARC_ARCHIVE")]
        archive: PathBuf,

        /// Entry path within the archive (exact, case-sensitive)
        entry: String,

        /// Output file (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Maximum accepted entry size in bytes
        #[arg(short, long, env = "MTARC_CONTENT_LIMIT", default_value_t = DEFAULT_CONTENT_LIMIT)]
        limit: u64,
    },

    /// List entries in archive order
    List {
        /// Path to the archive
        #[arg(short, long, env = "MTARC_ARCHIVE")]
        archive: PathBuf,

        /// Show sizes and compression methods
        #[arg(short, long)]
        detailed: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Manifest { archive, limit } => cmd_manifest(&archive, limit),
        Commands::Descriptor { archive, limit } => cmd_descriptor(&archive, limit),
        Commands::Extract {
            archive,
            entry,
            output,
            limit,
        } => cmd_extract(&archive, &entry, output.as_deref(), limit),
        Commands::List { archive, detailed } => cmd_list(&archive, detailed),
    }
}

fn open_archive(path: &Path) -> Result<File> {
    File::open(path).with_context(|| format!("cannot open archive: {}", path.display()))
}

fn cmd_manifest(archive: &Path, limit: u64) -> Result<()> {
    let content = handler::manifest(open_archive(archive)?, limit)?;
    io::stdout().write_all(&content)?;
    Ok(())
}

fn cmd_descriptor(archive: &Path, limit: u64) -> Result<()> {
    let text = handler::descriptor(open_archive(archive)?, limit)?;
    print!("{text}");
    Ok(())
}

fn cmd_extract(archive: &Path, entry: &str, output: Option<&Path>, limit: u64) -> Result<()> {
    let content = handler::file_content(open_archive(archive)?, entry, limit)
        .with_context(|| format!("failed to extract {entry:?}"))?;

    match output {
        Some(path) => {
            std::fs::write(path, &content)
                .with_context(|| format!("cannot write {}", path.display()))?;
            eprintln!("{}: {} bytes", path.display(), content.len());
        }
        None => io::stdout().write_all(&content)?,
    }
    Ok(())
}

fn cmd_list(archive: &Path, detailed: bool) -> Result<()> {
    let mut stream = ZipStream::new(open_archive(archive)?);
    let mut count = 0usize;

    while let Some(entry) = stream.next_entry()? {
        if detailed {
            let size = entry
                .declared_size()
                .map_or_else(|| "?".to_owned(), |s| s.to_string());
            println!("{size:>12}  method {:>2}  {}", entry.method, entry.name);
        } else {
            println!("{}", entry.name);
        }
        stream.skip_entry(&entry)?;
        count += 1;
    }

    eprintln!("{count} entries");
    Ok(())
}
