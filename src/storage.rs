//! Filesystem boundary: result artifact read-back, saved copies of results,
//! and named option presets stored as JSON under the user config directory.

use crate::model::Options;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Read the file the external tool wrote for one invocation.
pub fn read_artifact(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("read {}", path.display()))
}

/// Whole-file write for user-saved result copies. No atomic-rename guarantees.
pub fn save_text(path: &Path, text: &str) -> Result<()> {
    std::fs::write(path, text).with_context(|| format!("write {}", path.display()))
}

/// Default filename for a saved result copy, e.g. `prompt-20260825-143015.md`.
pub fn default_copy_name() -> String {
    let now = time::OffsetDateTime::now_local()
        .unwrap_or_else(|_| time::OffsetDateTime::now_utc());
    let fmt = time::macros::format_description!(
        "[year][month][day]-[hour][minute][second]"
    );
    format!(
        "prompt-{}.md",
        now.format(&fmt).unwrap_or_else(|_| "output".into())
    )
}

fn preset_dir() -> Result<PathBuf> {
    let base = dirs::config_dir().context("no config directory on this platform")?;
    Ok(base.join("promptdeck").join("presets"))
}

fn preset_path(dir: &Path, name: &str) -> PathBuf {
    dir.join(format!("{name}.json"))
}

/// Persist the given options as a named preset. Returns the written path.
pub fn save_preset(name: &str, options: &Options) -> Result<PathBuf> {
    save_preset_in(&preset_dir()?, name, options)
}

fn save_preset_in(dir: &Path, name: &str, options: &Options) -> Result<PathBuf> {
    std::fs::create_dir_all(dir).with_context(|| format!("create {}", dir.display()))?;
    let path = preset_path(dir, name);
    let json = serde_json::to_string_pretty(options).context("serialize preset")?;
    std::fs::write(&path, json).with_context(|| format!("write {}", path.display()))?;
    log::debug!("saved preset {}", path.display());
    Ok(path)
}

/// Load a named preset saved earlier with [`save_preset`].
pub fn load_preset(name: &str) -> Result<Options> {
    load_preset_in(&preset_dir()?, name)
}

fn load_preset_in(dir: &Path, name: &str) -> Result<Options> {
    let path = preset_path(dir, name);
    let json =
        std::fs::read_to_string(&path).with_context(|| format!("read {}", path.display()))?;
    serde_json::from_str(&json).with_context(|| format!("parse {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::OutputFormat;

    #[test]
    fn preset_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let options = Options {
            path: "/work/repo".into(),
            include_patterns: "*.rs,*.toml".into(),
            output_format: OutputFormat::Xml,
            line_numbers: true,
            ..Options::default()
        };

        let path = save_preset_in(dir.path(), "rust-repo", &options).unwrap();
        assert!(path.ends_with("rust-repo.json"));

        let loaded = load_preset_in(dir.path(), "rust-repo").unwrap();
        assert_eq!(loaded, options);
    }

    #[test]
    fn missing_preset_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_preset_in(dir.path(), "no-such-preset").is_err());
    }

    #[test]
    fn read_artifact_reports_the_path_on_failure() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("gone.md");
        let err = read_artifact(&missing).unwrap_err();
        assert!(format!("{err:#}").contains("gone.md"));
    }

    #[test]
    fn default_copy_name_is_a_markdown_file() {
        let name = default_copy_name();
        assert!(name.starts_with("prompt-"));
        assert!(name.ends_with(".md"));
    }
}
