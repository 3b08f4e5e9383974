//! Persistent default flags.
//!
//! Defaults live in plain rc files holding command-line flags, one or more
//! per line. The global file is merged with a local `.mmdpadrc`, then with
//! the flags actually passed on the command line.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

/// What the CLI writes for a diagram file.
#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Highlighted overlay markup only.
    #[default]
    Html,
    /// A standalone page with the full editor structure and stylesheet.
    Page,
    /// The token sequence as JSON.
    Json,
}

impl OutputFormat {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Html => "html",
            Self::Page => "page",
            Self::Json => "json",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s {
            "html" => Some(Self::Html),
            "page" => Some(Self::Page),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ConfigFlags {
    pub watch: bool,
    pub perf: bool,
    pub format: Option<OutputFormat>,
    pub indent_width: Option<usize>,
    pub render_debug_log: Option<PathBuf>,
}

impl ConfigFlags {
    /// Merge with `other`; booleans combine, `other`'s values win otherwise.
    pub fn union(&self, other: &Self) -> Self {
        Self {
            watch: self.watch || other.watch,
            perf: self.perf || other.perf,
            format: other.format.or(self.format),
            indent_width: other.indent_width.or(self.indent_width),
            render_debug_log: other
                .render_debug_log
                .clone()
                .or_else(|| self.render_debug_log.clone()),
        }
    }
}

pub fn global_config_path() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        if let Some(appdata) = std::env::var_os("APPDATA") {
            return PathBuf::from(appdata).join("mmdpad").join("config");
        }
    }

    #[cfg(target_os = "macos")]
    {
        if let Some(home) = std::env::var_os("HOME") {
            return PathBuf::from(home)
                .join("Library")
                .join("Application Support")
                .join("mmdpad")
                .join("config");
        }
    }

    #[cfg(not(any(target_os = "windows", target_os = "macos")))]
    {
        if let Some(xdg) = std::env::var_os("XDG_CONFIG_HOME") {
            return PathBuf::from(xdg).join("mmdpad").join("config");
        }
        if let Some(home) = std::env::var_os("HOME") {
            return PathBuf::from(home).join(".config").join("mmdpad").join("config");
        }
    }

    local_override_path()
}

pub fn local_override_path() -> PathBuf {
    PathBuf::from(".mmdpadrc")
}

pub fn load_config_flags(path: &Path) -> Result<ConfigFlags> {
    if !path.exists() {
        return Ok(ConfigFlags::default());
    }
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    let tokens = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .flat_map(|line| line.split_whitespace().map(ToOwned::to_owned))
        .collect::<Vec<_>>();
    Ok(parse_flag_tokens(&tokens))
}

pub fn save_config_flags(path: &Path, flags: &ConfigFlags) -> Result<()> {
    let mut lines = vec!["# mmdpad defaults (saved with --save)".to_string()];
    if flags.watch {
        lines.push("--watch".to_string());
    }
    if flags.perf {
        lines.push("--perf".to_string());
    }
    if let Some(format) = flags.format {
        lines.push(format!("--format {}", format.as_str()));
    }
    if let Some(width) = flags.indent_width {
        lines.push(format!("--indent-width {width}"));
    }
    if let Some(path) = &flags.render_debug_log {
        lines.push(format!("--render-debug-log {}", path.display()));
    }
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create config dir {}", parent.display()))?;
    }
    fs::write(path, format!("{}\n", lines.join("\n")))
        .with_context(|| format!("Failed to write config {}", path.display()))
}

pub fn clear_config_flags(path: &Path) -> Result<()> {
    if path.exists() {
        fs::remove_file(path).with_context(|| format!("Failed to remove {}", path.display()))?;
    }
    Ok(())
}

/// Extract known flags from raw tokens, ignoring anything unrecognized.
///
/// Both `--flag value` and `--flag=value` forms are accepted.
pub fn parse_flag_tokens(tokens: &[String]) -> ConfigFlags {
    let mut flags = ConfigFlags::default();
    let mut i = 0;
    while i < tokens.len() {
        let token = tokens[i].as_str();
        let (name, inline_value) = match token.split_once('=') {
            Some((name, value)) if name.starts_with('-') => (name, Some(value)),
            _ => match token.strip_prefix("-f") {
                // `-fjson`
                Some(attached) if !attached.is_empty() => ("-f", Some(attached)),
                _ => (token, None),
            },
        };
        let mut value = || {
            inline_value.map(ToOwned::to_owned).or_else(|| {
                let next = tokens.get(i + 1).cloned();
                if next.is_some() {
                    i += 1;
                }
                next
            })
        };
        match name {
            "--watch" | "-w" => flags.watch = true,
            "--perf" => flags.perf = true,
            "--format" | "-f" => flags.format = value().as_deref().and_then(OutputFormat::parse),
            "--indent-width" => flags.indent_width = value().and_then(|v| v.parse().ok()),
            "--render-debug-log" => flags.render_debug_log = value().map(PathBuf::from),
            _ => {}
        }
        i += 1;
    }
    flags
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn tokens(args: &[&str]) -> Vec<String> {
        args.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_parse_flag_tokens_extracts_known_flags() {
        let flags = parse_flag_tokens(&tokens(&[
            "mmdpad",
            "diagram.mmd",
            "--watch",
            "--format",
            "page",
            "--indent-width",
            "4",
        ]));
        assert!(flags.watch);
        assert!(!flags.perf);
        assert_eq!(flags.format, Some(OutputFormat::Page));
        assert_eq!(flags.indent_width, Some(4));
    }

    #[test]
    fn test_parse_flag_tokens_accepts_short_forms() {
        let flags = parse_flag_tokens(&tokens(&["mmdpad", "-f", "json", "-w", "x.mmd"]));
        assert!(flags.watch);
        assert_eq!(flags.format, Some(OutputFormat::Json));

        let attached = parse_flag_tokens(&tokens(&["-fpage"]));
        assert_eq!(attached.format, Some(OutputFormat::Page));
        let equals = parse_flag_tokens(&tokens(&["-f=html"]));
        assert_eq!(equals.format, Some(OutputFormat::Html));
    }

    #[test]
    fn test_parse_flag_tokens_ignores_invalid_values() {
        let flags = parse_flag_tokens(&tokens(&["--format=svg", "--indent-width=wide"]));
        assert_eq!(flags.format, None);
        assert_eq!(flags.indent_width, None);
    }

    #[test]
    fn test_parse_flag_tokens_missing_value_at_end() {
        let flags = parse_flag_tokens(&tokens(&["--watch", "--format"]));
        assert!(flags.watch);
        assert_eq!(flags.format, None);
    }

    #[test]
    fn test_value_token_is_not_reparsed_as_flag() {
        let flags = parse_flag_tokens(&tokens(&["--render-debug-log", "--watch"]));
        assert_eq!(flags.render_debug_log, Some(PathBuf::from("--watch")));
        assert!(!flags.watch);
    }

    #[test]
    fn test_save_then_load_round_trips() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("config");
        let flags = ConfigFlags {
            watch: true,
            perf: true,
            format: Some(OutputFormat::Json),
            indent_width: Some(3),
            render_debug_log: Some(PathBuf::from("debug.log")),
        };
        save_config_flags(&path, &flags).unwrap();
        assert_eq!(load_config_flags(&path).unwrap(), flags);
    }

    #[test]
    fn test_load_missing_file_gives_defaults() {
        let dir = tempdir().unwrap();
        let flags = load_config_flags(&dir.path().join("absent")).unwrap();
        assert_eq!(flags, ConfigFlags::default());
    }

    #[test]
    fn test_clear_removes_file_and_tolerates_absence() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config");
        std::fs::write(&path, "--watch\n").unwrap();
        clear_config_flags(&path).unwrap();
        assert!(!path.exists());
        clear_config_flags(&path).unwrap();
    }
}
