//! glaciertex - Command-line tool for Glacier engine TEX texture archives.
//!
//! This is the main entry point for the glaciertex command-line application.

use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use glob::{MatchOptions, Pattern};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::warn;
use tracing_subscriber::EnvFilter;

use glacier::prelude::*;

/// glaciertex - Glacier engine TEX archive tool
#[derive(Parser)]
#[command(name = "glaciertex")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Archive layout
    #[arg(long, global = true, env = "GLACIER_TEX_LAYOUT", default_value = "desktop")]
    layout: ArchiveLayout,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the entries of an archive
    List {
        /// Path to the TEX file
        #[arg(short, long, env = "GLACIER_TEX_INPUT")]
        archive: PathBuf,

        /// Filter pattern on file names (glob-style)
        #[arg(short, long)]
        filter: Option<String>,

        /// Show detailed information
        #[arg(short, long)]
        detailed: bool,
    },

    /// Show archive header and format statistics
    Info {
        /// Path to the TEX file
        #[arg(short, long, env = "GLACIER_TEX_INPUT")]
        archive: PathBuf,
    },

    /// Write the index to file name map as JSON
    Manifest {
        /// Path to the TEX file
        #[arg(short, long, env = "GLACIER_TEX_INPUT")]
        archive: PathBuf,

        /// Output JSON file (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Export one entry (format chosen by the output extension)
    Export {
        /// Path to the TEX file
        #[arg(short, long, env = "GLACIER_TEX_INPUT")]
        archive: PathBuf,

        /// Logical entry index
        #[arg(short, long)]
        index: u32,

        /// Output file (.dds, .tga, .bmp, .png, .jpg)
        #[arg(short, long)]
        output: PathBuf,

        /// Export only this mip level
        #[arg(short, long, conflicts_with_all = ["chain", "all_levels"])]
        level: Option<usize>,

        /// Write the whole mip chain into one DDS file
        #[arg(long, conflicts_with = "all_levels")]
        chain: bool,

        /// Write every mip level to its own <name>_<w>x<h> file
        #[arg(long)]
        all_levels: bool,
    },

    /// Export every entry to a directory
    ExportAll {
        /// Path to the TEX file
        #[arg(short, long, env = "GLACIER_TEX_INPUT")]
        archive: PathBuf,

        /// Output directory
        #[arg(short, long, env = "GLACIER_TEX_OUTPUT")]
        output: PathBuf,

        /// Output file type
        #[arg(short = 't', long, value_enum, default_value_t = ExportFormat::Dds)]
        format: ExportFormat,

        /// Filter pattern on file names (glob-style)
        #[arg(short, long)]
        filter: Option<String>,
    },

    /// Import a DDS or raster file into an entry and export the result
    Import {
        /// Path to the TEX file
        #[arg(short, long, env = "GLACIER_TEX_INPUT")]
        archive: PathBuf,

        /// Logical entry index
        #[arg(short, long)]
        index: u32,

        /// Source file (.dds, .tga, .bmp, .png, .jpg)
        #[arg(short = 's', long)]
        source: PathBuf,

        /// Where to export the updated entry (DDS writes the whole chain)
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Validate a DDS file against one of the TEX exchange layouts
    CheckDds {
        /// DDS file
        #[arg(short, long)]
        input: PathBuf,

        /// Expected layout
        #[arg(short = 't', long, value_enum)]
        variant: VariantArg,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum ExportFormat {
    Dds,
    Tga,
    Bmp,
    Png,
    Jpg,
}

impl ExportFormat {
    fn extension(self) -> &'static str {
        match self {
            Self::Dds => "dds",
            Self::Tga => "tga",
            Self::Bmp => "bmp",
            Self::Png => "png",
            Self::Jpg => "jpg",
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum VariantArg {
    Dxt1,
    Dxt3,
    A8r8g8b8,
    L8,
}

impl From<VariantArg> for DdsVariant {
    fn from(arg: VariantArg) -> Self {
        match arg {
            VariantArg::Dxt1 => DdsVariant::Dxt1,
            VariantArg::Dxt3 => DdsVariant::Dxt3,
            VariantArg::A8r8g8b8 => DdsVariant::A8R8G8B8,
            VariantArg::L8 => DdsVariant::L8,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let layout = cli.layout;
    match cli.command {
        Commands::List {
            archive,
            filter,
            detailed,
        } => {
            cmd_list(&archive, layout, filter.as_deref(), detailed)?;
        }
        Commands::Info { archive } => {
            cmd_info(&archive, layout)?;
        }
        Commands::Manifest { archive, output } => {
            cmd_manifest(&archive, layout, output.as_deref())?;
        }
        Commands::Export {
            archive,
            index,
            output,
            level,
            chain,
            all_levels,
        } => {
            let mode = match (level, chain, all_levels) {
                (Some(level), _, _) => ExportMode::Level(level),
                (None, true, _) => ExportMode::Chain,
                (None, false, true) => ExportMode::AllLevels,
                (None, false, false) => ExportMode::Level(0),
            };
            cmd_export(&archive, layout, index, &output, mode)?;
        }
        Commands::ExportAll {
            archive,
            output,
            format,
            filter,
        } => {
            cmd_export_all(&archive, layout, &output, format, filter.as_deref())?;
        }
        Commands::Import {
            archive,
            index,
            source,
            output,
        } => {
            cmd_import(&archive, layout, index, &source, &output)?;
        }
        Commands::CheckDds { input, variant } => {
            cmd_check_dds(&input, variant.into())?;
        }
    }

    Ok(())
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn open_session(path: &Path, layout: ArchiveLayout) -> Result<Session> {
    Session::open(path, layout)
        .with_context(|| format!("Failed to open TEX archive {}", path.display()))
}

fn cmd_list(path: &Path, layout: ArchiveLayout, filter: Option<&str>, detailed: bool) -> Result<()> {
    let session = open_session(path, layout)?;
    let pattern = filter.map(Pattern::new).transpose().context("Invalid filter pattern")?;

    let mut count = 0;
    for entry in session.entries() {
        if let Some(pattern) = &pattern {
            if !glob_match(pattern, &entry.file_name) {
                continue;
            }
        }

        if detailed {
            println!(
                "{:>5} {} {} {:>5}x{:<5} {:>2} {:>10} {:#010x} {:?} {:?} {}",
                entry.index,
                entry.type1,
                entry.type2,
                entry.width,
                entry.height,
                entry.mip_count,
                entry.file_size,
                entry.offset,
                entry.unknown,
                entry.indices.as_deref().unwrap_or_default(),
                entry.file_name
            );
        } else {
            println!(
                "{:>5} {} {:>5}x{:<5} {:>2} {}",
                entry.index, entry.type1, entry.width, entry.height, entry.mip_count, entry.file_name
            );
        }
        count += 1;
    }

    println!("\nTotal: {} entries", count);

    Ok(())
}

fn cmd_info(path: &Path, layout: ArchiveLayout) -> Result<()> {
    let start = Instant::now();
    let session = open_session(path, layout)?;

    println!("Archive: {}", path.display());
    println!("Layout: {}", session.layout());
    if let Some(header) = session.header() {
        let (t1, t2) = (header.table1_offset, header.table2_offset);
        println!("Offset tables: {:#x}, {:#x}", t1, t2);
    }
    println!(
        "Loaded {} entries in {:?} ({} empty leading slots)",
        session.entries().len(),
        start.elapsed(),
        session.empty_offset_prefix_count()
    );

    let referenced = session.entries().iter().filter(|e| e.indices.is_some()).count();
    println!("Entries with index references: {}", referenced);

    println!("\nFormats:");
    for (tag, count) in session.format_counts() {
        let known = if TextureFormat::from_tag(tag).is_ok() { "" } else { " (unknown)" };
        println!("  {:<4} {:>6}{}", tag, count, known);
    }

    Ok(())
}

fn cmd_manifest(path: &Path, layout: ArchiveLayout, output: Option<&Path>) -> Result<()> {
    let session = open_session(path, layout)?;
    let json = session.manifest_json().context("Failed to build manifest")?;

    match output {
        Some(output) => {
            fs::write(output, json).context("Failed to write manifest")?;
            println!("Manifest written to {}", output.display());
        }
        None => println!("{json}"),
    }

    Ok(())
}

enum ExportMode {
    Level(usize),
    Chain,
    AllLevels,
}

fn cmd_export(
    path: &Path,
    layout: ArchiveLayout,
    index: u32,
    output: &Path,
    mode: ExportMode,
) -> Result<()> {
    let session = open_session(path, layout)?;

    match mode {
        ExportMode::Level(level) => {
            session
                .export_level(index, level, output)
                .with_context(|| format!("Failed to export entry {index} level {level}"))?;
            println!("Exported entry {} level {} to {}", index, level, output.display());
        }
        ExportMode::Chain => {
            session
                .export_dds_chain(index, output)
                .with_context(|| format!("Failed to export entry {index}"))?;
            println!("Exported entry {} mip chain to {}", index, output.display());
        }
        ExportMode::AllLevels => {
            let paths = session
                .export_all_levels(index, output)
                .with_context(|| format!("Failed to export entry {index}"))?;
            for path in paths {
                println!("Exported {}", path.display());
            }
        }
    }

    Ok(())
}

fn cmd_export_all(
    path: &Path,
    layout: ArchiveLayout,
    output: &Path,
    format: ExportFormat,
    filter: Option<&str>,
) -> Result<()> {
    println!("Opening TEX archive: {}", path.display());

    let start = Instant::now();
    let session = open_session(path, layout)?;
    println!("Loaded {} entries in {:?}", session.entries().len(), start.elapsed());

    let pattern = filter.map(Pattern::new).transpose().context("Invalid filter pattern")?;
    let entries: Vec<&TextureEntry> = session
        .entries()
        .iter()
        .filter(|e| pattern.as_ref().map_or(true, |p| glob_match(p, &e.file_name)))
        .collect();

    println!("Exporting {} entries...", entries.len());

    let pb = ProgressBar::new(entries.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})")?
            .progress_chars("#>-"),
    );

    fs::create_dir_all(output)?;

    let start = Instant::now();
    let mut failed = 0usize;
    for entry in &entries {
        let target = output.join(export_file_name(entry, format));
        let result = match format {
            ExportFormat::Dds => session.export_dds_chain(entry.index, &target),
            _ => session.export(entry.index, &target),
        };
        if let Err(e) = result {
            warn!(index = entry.index, name = %entry.file_name, kind = %e.kind(), "export failed: {e}");
            failed += 1;
        }

        pb.inc(1);
    }

    pb.finish_with_message("Done");
    println!(
        "Exported {} entries in {:?} ({} failed)",
        entries.len() - failed,
        start.elapsed(),
        failed
    );

    Ok(())
}

fn cmd_import(
    path: &Path,
    layout: ArchiveLayout,
    index: u32,
    source: &Path,
    output: &Path,
) -> Result<()> {
    let mut session = open_session(path, layout)?;
    let before = session.entry(index)?.clone();

    session
        .import(index, source)
        .with_context(|| format!("Failed to import {} into entry {index}", source.display()))?;

    let after = session.entry(index)?;
    println!(
        "Imported {}: {}x{} ({} levels, {} bytes) -> {}x{} ({} levels, {} bytes)",
        source.display(),
        before.width,
        before.height,
        before.mip_count,
        before.file_size,
        after.width,
        after.height,
        after.mip_count,
        after.file_size
    );

    let exported = if FileTarget::from_path(output)?.is_dds() {
        session.export_dds_chain(index, output)
    } else {
        session.export(index, output)
    };
    exported.context("Failed to export imported entry")?;

    println!("Wrote {}", output.display());

    Ok(())
}

fn cmd_check_dds(input: &Path, variant: DdsVariant) -> Result<()> {
    let mut file = File::open(input).context("Failed to open DDS file")?;

    match decode_and_validate(&mut file, variant) {
        Ok(surface) => {
            println!(
                "{}: valid {:?}, {}x{}, {} levels",
                input.display(),
                variant,
                surface.width,
                surface.height,
                surface.mip_count()
            );
            Ok(())
        }
        Err(e) => anyhow::bail!("{}: rejected: {}", input.display(), e),
    }
}

/// `<index>_<name>.<ext>`, with any directory part of the stored name dropped.
fn export_file_name(entry: &TextureEntry, format: ExportFormat) -> String {
    let stem = Path::new(&entry.file_name.replace('\\', "/"))
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "texture".to_string());
    format!("{:05}_{}.{}", entry.index, stem, format.extension())
}

fn glob_match(pattern: &Pattern, name: &str) -> bool {
    let options = MatchOptions {
        case_sensitive: false,
        require_literal_separator: false,
        require_literal_leading_dot: false,
    };
    pattern.matches_with(name, options)
}
