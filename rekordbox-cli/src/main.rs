//! Command line tool for inspecting and editing rekordbox ANLZ files

mod config;

use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::{debug, Level};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use rekordbox_anlz::{walk_anlz_paths, AnlzFile, Tag, TagContent};

use config::Config;

#[derive(Parser)]
#[command(name = "rbx")]
#[command(about = "Inspect and edit rekordbox analysis files (.DAT, .EXT, .2EX)")]
#[command(version)]
struct Cli {
    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Pretty-print JSON output
    #[arg(long, global = true)]
    pretty: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the tags of a file
    Info { file: PathBuf },

    /// Print decoded tag contents as JSON
    Dump {
        file: PathBuf,
        /// Only tags with this type code or alias, e.g. PQTZ or beat_grid
        #[arg(short, long)]
        tag: Option<String>,
    },

    /// Print the beat grid
    Beats { file: PathBuf },

    /// Parse and rebuild every analysis file below a directory
    Check { root: PathBuf },

    /// Replace the track path stored in a file
    SetPath {
        file: PathBuf,
        path: String,
        /// Write to this file instead of overwriting the input
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Serialize)]
struct TagDump<'a> {
    code: String,
    name: &'a str,
    len_header: u32,
    len_tag: u32,
    content: &'a TagContent,
    #[serde(skip_serializing_if = "Option::is_none")]
    trailing: Option<&'a [u8]>,
}

fn main() {
    let cli = Cli::parse();
    let config = Config {
        verbose: cli.verbose,
        pretty: cli.pretty,
    };

    if let Err(e) = init_logging(&config) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    if let Err(e) = run(cli.command, &config) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn init_logging(config: &Config) -> anyhow::Result<()> {
    let level = if config.verbose { Level::DEBUG } else { Level::INFO };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::default().add_directive(level.into()));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .compact()
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

fn run(command: Commands, config: &Config) -> anyhow::Result<()> {
    match command {
        Commands::Info { file } => info(&file),
        Commands::Dump { file, tag } => dump(&file, tag.as_deref(), config),
        Commands::Beats { file } => beats(&file),
        Commands::Check { root } => check(&root),
        Commands::SetPath { file, path, output } => set_path(&file, &path, output.as_deref()),
    }
}

fn open(path: &Path) -> anyhow::Result<AnlzFile> {
    AnlzFile::open(path).with_context(|| format!("Failed to read {}", path.display()))
}

fn info(path: &Path) -> anyhow::Result<()> {
    let file = open(path)?;
    println!("{}", path.display());
    println!(
        "  len_header={} len_file={} tags={}",
        file.header.len_header,
        file.header.len_file,
        file.num_tags()
    );
    for tag in &file.tags {
        println!(
            "  {:<4}  {:<16} len_header={:<4} len_tag={}",
            tag.kind(),
            tag.name(),
            tag.len_header,
            tag.len_tag
        );
    }
    if let Some(track) = file.track_path() {
        println!("  path: {}", track);
    }
    Ok(())
}

/// Tags matching `key` with the library's lookup rules, or all of them
fn select_tags<'a>(file: &'a AnlzFile, key: Option<&str>) -> Vec<&'a Tag> {
    match key {
        Some(key) => file.tags(key),
        None => file.tags.iter().collect(),
    }
}

fn dump(path: &Path, key: Option<&str>, config: &Config) -> anyhow::Result<()> {
    let file = open(path)?;
    let tags: Vec<TagDump> = select_tags(&file, key)
        .into_iter()
        .map(|t| TagDump {
            code: t.kind().to_string(),
            name: t.name(),
            len_header: t.len_header,
            len_tag: t.len_tag,
            content: &t.content,
            trailing: (!t.trailing.is_empty()).then_some(t.trailing.as_slice()),
        })
        .collect();

    if let Some(key) = key {
        if tags.is_empty() {
            bail!("No '{}' tag in {}", key, path.display());
        }
    }

    let json = if config.pretty {
        serde_json::to_string_pretty(&tags)?
    } else {
        serde_json::to_string(&tags)?
    };
    println!("{}", json);
    Ok(())
}

fn beats(path: &Path) -> anyhow::Result<()> {
    let file = open(path)?;
    let Some(grid) = file.beat_grid() else {
        bail!("No beat grid in {}", path.display());
    };

    println!("{} beats, average {:.2} BPM", grid.len(), grid.bpm_average());
    for (i, beat) in grid.entries.iter().enumerate() {
        println!(
            "  {:5}  beat {}  {:7.2} BPM  {:9.3}s",
            i + 1,
            beat.beat,
            beat.bpm(),
            beat.seconds()
        );
    }
    Ok(())
}

fn check(root: &Path) -> anyhow::Result<()> {
    let groups = walk_anlz_paths(root)
        .with_context(|| format!("Failed to scan {}", root.display()))?;

    let mut total = 0usize;
    let mut failed = 0usize;
    for (dir, paths) in &groups {
        debug!("Checking {}", dir.display());
        for (_, path) in paths.iter() {
            total += 1;
            match roundtrip(path) {
                Ok(true) => println!("✓ {}", path.display()),
                Ok(false) => {
                    failed += 1;
                    println!("✗ {} (rebuilt bytes differ)", path.display());
                }
                Err(e) => {
                    failed += 1;
                    println!("✗ {} ({:#})", path.display(), e);
                }
            }
        }
    }

    println!("{} files in {} directories, {} failed", total, groups.len(), failed);
    if failed > 0 {
        bail!("{} of {} files did not round-trip", failed, total);
    }
    Ok(())
}

/// Parse and rebuild one file; true when the bytes are identical
fn roundtrip(path: &Path) -> anyhow::Result<bool> {
    let data = std::fs::read(path)?;
    let mut file = AnlzFile::parse(&data)?;
    let rebuilt = file.build()?;
    Ok(rebuilt == data)
}

fn set_path(file_path: &Path, track_path: &str, output: Option<&Path>) -> anyhow::Result<()> {
    let mut file = open(file_path)?;
    file.set_path(track_path)
        .with_context(|| format!("Cannot set path in {}", file_path.display()))?;

    let target = output.unwrap_or(file_path);
    file.save_as(target)
        .with_context(|| format!("Failed to write {}", target.display()))?;
    println!("✓ {} -> {}", target.display(), track_path);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rekordbox_anlz::structs::{CueList, TrackPath};

    #[test]
    fn test_select_tags_by_code_or_alias() {
        let mut file = AnlzFile::new();
        file.add_tag(Tag::new(TagContent::Path(TrackPath::new("/a.mp3"))));
        file.add_tag(Tag::new(TagContent::CueList(CueList::default())));
        file.add_tag(Tag::new(TagContent::CueList(CueList::default())));

        assert_eq!(select_tags(&file, None).len(), 3);
        assert_eq!(select_tags(&file, Some("PCOB")).len(), 2);
        assert_eq!(select_tags(&file, Some("cue_list")).len(), 2);
        assert_eq!(select_tags(&file, Some("path"))[0].name(), "path");
        assert!(select_tags(&file, Some("XXXX")).is_empty());
    }
}
