//! mmdpad - syntax-highlighted overlay views of mermaid diagram source.
//!
//! # Usage
//!
//! ```bash
//! mmdpad flow.mmd                      # overlay markup on stdout
//! mmdpad --format page -o flow.html flow.mmd
//! mmdpad --watch --format page -o flow.html flow.mmd
//! ```

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;

use mmdpad::config::{
    ConfigFlags, OutputFormat, clear_config_flags, global_config_path, load_config_flags,
    local_override_path, save_config_flags,
};
use mmdpad::editor::{EditorConfig, OverlayEditor};
use mmdpad::page::standalone_page;
use mmdpad::perf;
use mmdpad::watcher::{Reload, SourceWatcher};

const WATCH_SETTLE: Duration = Duration::from_millis(200);
const WATCH_POLL: Duration = Duration::from_millis(250);

/// Syntax-highlighted overlay views of mermaid diagram source
#[derive(Parser, Debug)]
#[command(name = "mmdpad", version, about, long_about = None)]
struct Cli {
    /// Diagram source file
    #[arg(value_name = "FILE")]
    file: PathBuf,

    /// What to write
    #[arg(short, long, value_enum)]
    format: Option<OutputFormat>,

    /// Write to this file instead of stdout
    #[arg(short, long, value_name = "PATH")]
    output: Option<PathBuf>,

    /// Re-render whenever the file changes
    #[arg(short, long)]
    watch: bool,

    /// Spaces inserted by Tab
    #[arg(long, value_name = "N")]
    indent_width: Option<usize>,

    /// Enable performance logging
    #[arg(long)]
    perf: bool,

    /// Write render and watcher debug events to a file
    #[arg(long, value_name = "PATH")]
    render_debug_log: Option<PathBuf>,

    /// Save current command-line flags as defaults
    #[arg(long)]
    save: bool,

    /// Clear saved defaults
    #[arg(long)]
    clear: bool,
}

/// The persistable subset of the parsed command line.
fn flags_from_cli(cli: &Cli) -> ConfigFlags {
    ConfigFlags {
        watch: cli.watch,
        perf: cli.perf,
        format: cli.format,
        indent_width: cli.indent_width,
        render_debug_log: cli.render_debug_log.clone(),
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let global_path = global_config_path();
    let local_path = local_override_path();
    let cli_flags = flags_from_cli(&cli);

    if cli.clear {
        clear_config_flags(&global_path)?;
    }
    if cli.save {
        save_config_flags(&global_path, &cli_flags)?;
    }

    let file_flags = if cli.clear {
        ConfigFlags::default()
    } else {
        load_config_flags(&global_path)?.union(&load_config_flags(&local_path)?)
    };
    let effective = file_flags.union(&cli_flags);

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(perf::env_filter(effective.perf))
        .init();

    perf::set_enabled(effective.perf);
    if let Err(err) = perf::set_debug_log_path(effective.render_debug_log.as_deref()) {
        tracing::warn!(error = %err, "failed to open render debug log");
    }

    if !cli.file.exists() {
        anyhow::bail!("File not found: {}", cli.file.display());
    }

    let config = EditorConfig {
        indent_width: effective.indent_width.unwrap_or(2),
        ..EditorConfig::default()
    };
    let format = effective.format.unwrap_or_default();
    let mut editor = OverlayEditor::new("", config);

    load(&mut editor, &cli.file)?;
    emit(&editor, format, &cli.file, cli.output.as_deref())?;

    if effective.watch {
        watch(&mut editor, format, &cli.file, cli.output.as_deref())?;
    }
    Ok(())
}

fn load(editor: &mut OverlayEditor, path: &Path) -> Result<()> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    editor.set_value(&text);
    Ok(())
}

fn emit(
    editor: &OverlayEditor,
    format: OutputFormat,
    source: &Path,
    output: Option<&Path>,
) -> Result<()> {
    let _scope = perf::scope("cli.emit");
    let rendered = match format {
        OutputFormat::Html => editor.overlay().markup().to_string(),
        OutputFormat::Page => {
            let title = source
                .file_name()
                .map_or_else(|| source.display().to_string(), |n| n.to_string_lossy().into_owned());
            standalone_page(editor, &title)
        }
        OutputFormat::Json => {
            let mut json = serde_json::to_string_pretty(editor.tokens())
                .context("Failed to serialize tokens")?;
            json.push('\n');
            json
        }
    };

    match output {
        Some(path) => fs::write(path, rendered)
            .with_context(|| format!("Failed to write {}", path.display())),
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout
                .write_all(rendered.as_bytes())
                .and_then(|()| stdout.flush())
                .context("Failed to write to stdout")
        }
    }
}

fn watch(
    editor: &mut OverlayEditor,
    format: OutputFormat,
    source: &Path,
    output: Option<&Path>,
) -> Result<()> {
    let mut watcher = SourceWatcher::new(source, WATCH_SETTLE)
        .with_context(|| format!("Failed to watch {}", source.display()))?;
    tracing::info!(path = %watcher.path().display(), "watching for changes");

    loop {
        std::thread::sleep(WATCH_POLL);
        match watcher.poll() {
            Reload::Idle => {}
            Reload::Changed(text) => {
                editor.set_value(&text);
                emit(editor, format, source, output)?;
            }
            // Keep the last good render; the save that finishes will fire again.
            Reload::Failed(err) => tracing::warn!(error = %err, "reload failed"),
        }
    }
}
