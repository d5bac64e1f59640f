//! mdblocks - inspect and reformat the tables and task lists in a markdown file.
//!
//! # Usage
//!
//! ```bash
//! mdblocks detect README.md
//! mdblocks --json show README.md --line 12
//! mdblocks format --write TODO.md
//! mdblocks new-tasks --title Release "cut branch" ">x:tag build"
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::json;

use mdblocks::blocks::{
    BlockKind, BlockMap, MAX_INDENT, ParsedTable, ParsedTask, TaskList, block_lines,
    detect_blocks, parse_table, parse_tasks,
};
use mdblocks::config::{
    ConfigFlags, clear_config_flags, global_config_path, load_config_flags, local_override_path,
    parse_flag_tokens, save_config_flags,
};
use mdblocks::editor::{EditSession, EditorBuffer};
use mdblocks::perf;
use mdblocks::stats::DocumentStats;
use mdblocks::watcher::DocumentWatcher;

/// Inspect and reformat markdown tables and task lists
#[derive(Parser, Debug)]
#[command(name = "mdblocks", version, about, long_about = None)]
struct Cli {
    /// Print machine-readable JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    /// Print timing of detection and formatting passes
    #[arg(long, global = true)]
    perf: bool,

    /// Save current command-line flags as defaults
    #[arg(long)]
    save: bool,

    /// Clear saved defaults
    #[arg(long)]
    clear: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the tables and task lists in a file
    Detect {
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Re-run detection whenever the file changes
        #[arg(short, long)]
        watch: bool,
    },
    /// Show the parsed contents of the block covering a line
    Show {
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// 1-based line number inside the block
        #[arg(
            short,
            long,
            value_parser = clap::builder::RangedU64ValueParser::<usize>::new().range(1..)
        )]
        line: usize,
    },
    /// Rewrite every block in canonical form
    Format {
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Write the result back to FILE instead of printing it
        #[arg(long)]
        write: bool,
    },
    /// Count characters, words and lines
    Stats {
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
    /// Print an empty table skeleton
    NewTable {
        /// Rows including the header row
        #[arg(long, default_value_t = 3)]
        rows: usize,

        #[arg(long, default_value_t = 3)]
        cols: usize,
    },
    /// Print a task list; prefix items with `x:` for done and `>` per nesting level
    NewTasks {
        /// Section heading placed above the list
        #[arg(long)]
        title: Option<String>,

        #[arg(value_name = "ITEM")]
        items: Vec<String>,
    },
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .init();

    let raw_args = std::env::args().collect::<Vec<_>>();
    let cli = Cli::parse();
    let global_path = global_config_path();
    let local_path = local_override_path();
    let cli_flags = parse_flag_tokens(&raw_args);

    if cli.clear {
        clear_config_flags(&global_path)?;
    }
    if cli.save {
        save_config_flags(&global_path, &cli_flags)?;
    }

    let file_flags = if cli.clear {
        ConfigFlags::default()
    } else {
        let global_flags = load_config_flags(&global_path)?;
        let local_flags = load_config_flags(&local_path)?;
        global_flags.union(&local_flags)
    };
    let effective = file_flags.union(&cli_flags);
    perf::set_enabled(effective.perf);

    let Some(command) = cli.command else {
        if cli.save || cli.clear {
            return Ok(());
        }
        anyhow::bail!("no command given; run `mdblocks --help` for usage");
    };

    match command {
        Command::Detect { file, watch } => {
            if watch || effective.watch {
                watch_blocks(&file, effective.json)
            } else {
                print_blocks(&file, effective.json)
            }
        }
        Command::Show { file, line } => show_block(&file, line, effective.json),
        Command::Format { file, write } => format_file(&file, write),
        Command::Stats { file } => {
            let stats = DocumentStats::from_text(&read_document(&file)?);
            if effective.json {
                println!("{}", serde_json::to_string_pretty(&stats)?);
            } else {
                println!("{stats}");
            }
            Ok(())
        }
        Command::NewTable { rows, cols } => {
            println!("{}", ParsedTable::new(rows, cols).render());
            Ok(())
        }
        Command::NewTasks { title, items } => {
            let tasks = items.iter().map(|item| parse_item_arg(item)).collect();
            let list = TaskList::from_tasks(tasks).with_title(title.unwrap_or_default());
            println!("{}", list.render());
            Ok(())
        }
    }
}

/// Read a document with `\r\n` line endings normalized to `\n`.
fn read_document(path: &Path) -> Result<String> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    Ok(text.replace("\r\n", "\n"))
}

fn detect_in(text: &str) -> BlockMap {
    let _scope = perf::scope("detect_blocks");
    detect_blocks(text)
}

fn print_blocks(path: &Path, json: bool) -> Result<()> {
    let text = read_document(path)?;
    let blocks = detect_in(&text);
    if json {
        let ranges: Vec<_> = blocks.blocks().collect();
        println!("{}", serde_json::to_string_pretty(&ranges)?);
        return Ok(());
    }
    for block in &blocks {
        println!(
            "{:<6}{}-{}",
            block.kind,
            block.start_line + 1,
            block.end_line + 1
        );
    }
    Ok(())
}

fn watch_blocks(path: &Path, json: bool) -> Result<()> {
    let mut watcher = DocumentWatcher::new(path, Duration::from_millis(200))
        .with_context(|| format!("Failed to watch {}", path.display()))?;
    tracing::info!(path = %watcher.target_path().display(), "watching for changes");

    print_blocks(path, json)?;
    loop {
        std::thread::sleep(Duration::from_millis(250));
        if watcher.take_change_ready() {
            println!();
            if let Err(err) = print_blocks(path, json) {
                tracing::warn!("{err:#}");
            }
        }
    }
}

fn show_block(path: &Path, line: usize, json: bool) -> Result<()> {
    let text = read_document(path)?;
    let line_idx = line - 1;
    let blocks = detect_in(&text);
    let block = *blocks
        .get(line_idx)
        .ok_or(mdblocks::Error::NoBlockAtLine { line })?;
    let lines = block_lines(&text, &block);

    let (parsed, preview) = match block.kind {
        BlockKind::Table => {
            let table = parse_table(&lines);
            (serde_json::to_value(&table)?, table.render())
        }
        BlockKind::Tasks => {
            let tasks = parse_tasks(&lines);
            let preview = TaskList::from_tasks(tasks.clone()).render();
            (serde_json::to_value(&tasks)?, preview)
        }
    };

    if json {
        let key = block.kind.label();
        let value = json!({ "block": block, key: parsed });
        println!("{}", serde_json::to_string_pretty(&value)?);
    } else {
        println!(
            "{} at lines {}-{}:\n{preview}",
            block.kind,
            block.start_line + 1,
            block.end_line + 1
        );
    }
    Ok(())
}

fn format_file(path: &Path, write: bool) -> Result<()> {
    let _scope = perf::scope("format");
    let text = read_document(path)?;
    let mut buffer = EditorBuffer::from_text(&text);
    let blocks = detect_in(&text);

    // Last block first so earlier start lines stay valid.
    let starts: Vec<usize> = blocks.blocks().map(|block| block.start_line).collect();
    for start in starts.into_iter().rev() {
        EditSession::open(&buffer, start)?.confirm(&mut buffer)?;
    }

    let formatted = buffer.text();
    if write {
        if formatted != text {
            fs::write(path, &formatted)
                .with_context(|| format!("Failed to write {}", path.display()))?;
        }
        tracing::info!(path = %path.display(), blocks = blocks.len(), "formatted");
    } else {
        print!("{formatted}");
    }
    Ok(())
}

/// Parse a `new-tasks` item such as `>x:write docs`.
fn parse_item_arg(item: &str) -> ParsedTask {
    let rest = item.trim_start_matches('>');
    let indent = (item.len() - rest.len()).min(MAX_INDENT);
    match rest.strip_prefix("x:") {
        Some(text) => ParsedTask::new(text, true, indent),
        None => ParsedTask::new(rest, false, indent),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_item_arg_plain() {
        assert_eq!(parse_item_arg("buy milk"), ParsedTask::new("buy milk", false, 0));
    }

    #[test]
    fn test_parse_item_arg_done_and_nested() {
        assert_eq!(parse_item_arg(">>x:eggs"), ParsedTask::new("eggs", true, 2));
    }

    #[test]
    fn test_parse_item_arg_clamps_nesting() {
        assert_eq!(parse_item_arg(">>>>deep").indent, MAX_INDENT);
    }

    #[test]
    fn test_cli_parses_global_json_after_subcommand() {
        let cli = Cli::parse_from(["mdblocks", "detect", "README.md", "--json"]);
        assert!(cli.json);
        assert!(matches!(cli.command, Some(Command::Detect { watch: false, .. })));
    }

    #[test]
    fn test_cli_show_rejects_line_zero() {
        assert!(Cli::try_parse_from(["mdblocks", "show", "a.md", "--line", "0"]).is_err());
        let cli = Cli::parse_from(["mdblocks", "show", "a.md", "--line", "1"]);
        assert!(matches!(cli.command, Some(Command::Show { line: 1, .. })));
    }
}
