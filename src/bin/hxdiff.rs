//! hxdiff - compare binary files from the shell
//!
//! Prints differing offsets, a marked hex dump, or a file summary.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};

use mhx::buffer::FileStore;
use mhx::diff::CompareMode;
use mhx::highlight::{project, Projection};
use mhx::layout::{self, LineRecord};
use mhx::logging;

/// Compare binary files offset by offset
#[derive(Parser, Debug)]
#[command(name = "hxdiff")]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print offsets that differ (exit status 1 when any do)
    Diff {
        /// Files to compare; the first is the pairwise baseline
        #[arg(required = true, num_args = 2..)]
        files: Vec<PathBuf>,

        /// Compare engine
        #[arg(short, long, value_enum, default_value_t = CompareMode::Pairwise)]
        mode: CompareMode,

        /// Offset format
        #[arg(short, long, value_enum, default_value_t = OffsetFormat::Hex)]
        format: OffsetFormat,
    },

    /// Hex dump every file with differing bytes marked
    Dump {
        /// Files to dump; with fewer than the mode needs, nothing is marked
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Compare engine
        #[arg(short, long, value_enum, default_value_t = CompareMode::Pairwise)]
        mode: CompareMode,
    },

    /// Show name, size and path of each file
    Info {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum OffsetFormat {
    /// 0x0000001F
    Hex,
    /// 31
    Dec,
    /// 0x0000001F (31)
    Both,
}

fn main() -> Result<ExitCode> {
    let args = Args::parse();
    logging::init_stderr("warn");

    match args.command {
        Command::Diff { files, mode, format } => cmd_diff(&files, mode, format),
        Command::Dump { files, mode } => cmd_dump(&files, mode).map(|()| ExitCode::SUCCESS),
        Command::Info { files } => cmd_info(&files).map(|()| ExitCode::SUCCESS),
    }
}

/// Load files in argument order
fn open_all(files: &[PathBuf]) -> Result<FileStore> {
    let mut store = FileStore::new();
    for path in files {
        store
            .open(path)
            .with_context(|| format!("Failed to load {}", path.display()))?;
    }
    Ok(store)
}

fn format_offset(offset: usize, format: OffsetFormat) -> String {
    match format {
        OffsetFormat::Hex => format!("0x{:08X}", offset),
        OffsetFormat::Dec => format!("{}", offset),
        OffsetFormat::Both => format!("0x{:08X} ({})", offset, offset),
    }
}

/// Marker row under a dump line: `^^` below each flagged slot
fn marker_row(line: &LineRecord<'_>, id: &str, projection: &Projection) -> Option<String> {
    if !projection.is_line_highlighted(id, line.offset()) {
        return None;
    }
    let marks: Vec<&str> = line
        .slot_offsets()
        .map(|offset| {
            if projection.is_byte_different(id, offset) {
                "^^"
            } else {
                "  "
            }
        })
        .collect();
    let row = format!("{:10}{}", "", marks.join(" "));
    Some(row.trim_end().to_string())
}

// === Commands ===

fn cmd_diff(files: &[PathBuf], mode: CompareMode, format: OffsetFormat) -> Result<ExitCode> {
    let store = open_all(files)?;
    let diffs = store.compare(mode)?;

    for offset in diffs.iter() {
        println!("{}", format_offset(offset, format));
    }
    eprintln!("{} differences found", diffs.len());

    Ok(if diffs.is_empty() {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(1)
    })
}

fn cmd_dump(files: &[PathBuf], mode: CompareMode) -> Result<()> {
    let store = open_all(files)?;
    let projection = if store.len() >= mode.min_files() {
        let diffs = store.compare(mode)?;
        Some(project(
            &diffs,
            store.documents().map(|(h, d)| (h.id(), d.len())),
        ))
    } else {
        None
    };

    for (i, (handle, document)) in store.documents().enumerate() {
        if i > 0 {
            println!();
        }
        println!("== {} ({}) ==", handle.name(), handle.display_size());
        println!("{}", layout::header());
        for line in layout::layout(document.data()) {
            println!(
                "{}  {}  {}",
                line.address(),
                line.hex_string(),
                line.ascii_string()
            );
            if let Some(row) = projection
                .as_ref()
                .and_then(|p| marker_row(&line, handle.id(), p))
            {
                println!("{}", row);
            }
        }
    }

    Ok(())
}

fn cmd_info(files: &[PathBuf]) -> Result<()> {
    let store = open_all(files)?;
    if store.is_empty() {
        bail!("No files given");
    }

    for handle in store.files() {
        println!("{}", handle.name());
        println!("  Path: {}", handle.id());
        println!(
            "  Size: {} ({} bytes, 0x{:X})",
            handle.display_size(),
            handle.size(),
            handle.size()
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use mhx::diff::DifferenceSet;

    #[test]
    fn test_format_offset() {
        assert_eq!(format_offset(31, OffsetFormat::Hex), "0x0000001F");
        assert_eq!(format_offset(31, OffsetFormat::Dec), "31");
        assert_eq!(format_offset(31, OffsetFormat::Both), "0x0000001F (31)");
    }

    #[test]
    fn test_marker_row() {
        let data = [0u8; 20];
        let diffs: DifferenceSet = [1, 18].into_iter().collect();
        let projection = project(&diffs, [("a", data.len())]);
        let lines: Vec<_> = layout::layout(&data).collect();

        assert_eq!(
            marker_row(&lines[0], "a", &projection).as_deref(),
            Some("             ^^")
        );
        assert_eq!(
            marker_row(&lines[1], "a", &projection).as_deref(),
            Some("                ^^")
        );
    }

    #[test]
    fn test_marker_row_skips_clean_lines() {
        let data = [0u8; 32];
        let diffs: DifferenceSet = [3].into_iter().collect();
        let projection = project(&diffs, [("a", data.len())]);
        let line = layout::line_at(&data, 1).unwrap();

        assert_eq!(marker_row(&line, "a", &projection), None);
    }
}
