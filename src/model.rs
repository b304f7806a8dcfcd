use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Output format accepted by the external tool's `-F` flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    Markdown,
    Json,
    Xml,
}

impl OutputFormat {
    pub fn as_arg(self) -> &'static str {
        match self {
            OutputFormat::Markdown => "markdown",
            OutputFormat::Json => "json",
            OutputFormat::Xml => "xml",
        }
    }
}

impl Default for OutputFormat {
    fn default() -> Self {
        OutputFormat::Markdown
    }
}

/// Tokenizer encoding accepted by the external tool's `--encoding` flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum TokenizerEncoding {
    Cl100k,
    P50k,
    #[value(name = "p50k_edit")]
    P50kEdit,
    R50k,
}

impl TokenizerEncoding {
    pub fn as_arg(self) -> &'static str {
        match self {
            TokenizerEncoding::Cl100k => "cl100k",
            TokenizerEncoding::P50k => "p50k",
            TokenizerEncoding::P50kEdit => "p50k_edit",
            TokenizerEncoding::R50k => "r50k",
        }
    }
}

impl Default for TokenizerEncoding {
    fn default() -> Self {
        TokenizerEncoding::Cl100k
    }
}

/// Token count rendering accepted by the external tool's `--token-format` flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum TokenCountFormat {
    Raw,
    Format,
}

impl TokenCountFormat {
    pub fn as_arg(self) -> &'static str {
        match self {
            TokenCountFormat::Raw => "raw",
            TokenCountFormat::Format => "format",
        }
    }
}

impl Default for TokenCountFormat {
    fn default() -> Self {
        TokenCountFormat::Format
    }
}

/// Full set of user-configured generation parameters.
///
/// Defaults produce a minimal valid argument list: `build(&Options::default())`
/// emits no tokens at all.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Options {
    /// Directory the tool analyzes; "." is the tool's own default and is
    /// omitted from the argument list.
    pub path: String,
    pub output_file: Option<PathBuf>,
    pub clipboard: bool,
    /// Raw user text; split on commas/newlines into one `-i` per pattern.
    pub include_patterns: String,
    /// Raw user text; split on commas/newlines into one `-e` per pattern.
    pub exclude_patterns: String,
    pub follow_symlinks: bool,
    pub hidden: bool,
    pub no_ignore: bool,
    pub output_format: OutputFormat,
    pub template: Option<PathBuf>,
    pub line_numbers: bool,
    pub absolute_paths: bool,
    pub no_codeblock: bool,
    pub full_directory_tree: bool,
    pub diff: bool,
    /// Raw "base,compare" text; emitted only when both parts are present.
    pub git_diff_branches: String,
    /// Raw "base,compare" text; emitted only when both parts are present.
    pub git_log_branches: String,
    pub encoding: TokenizerEncoding,
    pub token_format: TokenCountFormat,
    pub token_map: bool,
    pub quiet: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            path: ".".to_string(),
            output_file: None,
            clipboard: false,
            include_patterns: String::new(),
            exclude_patterns: String::new(),
            follow_symlinks: false,
            hidden: false,
            no_ignore: false,
            output_format: OutputFormat::default(),
            template: None,
            line_numbers: false,
            absolute_paths: false,
            no_codeblock: false,
            full_directory_tree: false,
            diff: false,
            git_diff_branches: String::new(),
            git_log_branches: String::new(),
            encoding: TokenizerEncoding::default(),
            token_format: TokenCountFormat::default(),
            token_map: false,
            quiet: false,
        }
    }
}

/// Which standard stream a captured line came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamKind {
    Stdout,
    Stderr,
}

/// Events emitted by the process engine while a tool invocation is in flight.
#[derive(Debug, Clone)]
pub enum ToolEvent {
    Line { stream: StreamKind, text: String },
    Exited { code: Option<i32> },
}

/// Everything a finished invocation produced, returned by the engine when the
/// process has exited. Carrying the captured lines here removes any ordering
/// ambiguity between "last line received" and "process exited".
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub exit_code: Option<i32>,
    pub cancelled: bool,
    pub stdout: Vec<String>,
    pub stderr: Vec<String>,
}

/// A completed run after post-processing: outcome plus the result artifact
/// read back from disk, if one was configured and readable.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub outcome: RunOutcome,
    pub artifact_path: Option<PathBuf>,
    pub artifact: Option<String>,
    /// Artifact read failure after a successful exit. Reported alongside the
    /// Completed status, never in place of it.
    pub artifact_error: Option<String>,
}

impl RunSummary {
    pub fn status(&self) -> RunStatus {
        if self.outcome.cancelled {
            RunStatus::Cancelled
        } else if self.outcome.exit_code == Some(0) {
            RunStatus::Completed
        } else {
            RunStatus::Failed
        }
    }
}

/// Structured events consumed by presentation layers (TUI or headless CLI).
#[derive(Debug, Clone)]
pub enum AppEvent {
    RunStarted,
    Tool(ToolEvent),
    /// The tool binary could not be launched at all. Distinct from a run that
    /// started and then failed.
    StartFailed {
        message: String,
    },
    RunCompleted {
        summary: Box<RunSummary>,
    },
    Info(String),
}

/// UI-visible lifecycle state of the current/last invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Ready,
    Generating,
    Completed,
    Failed,
    Cancelled,
    Error,
}

impl RunStatus {
    pub fn label(self) -> &'static str {
        match self {
            RunStatus::Ready => "Ready",
            RunStatus::Generating => "Generating…",
            RunStatus::Completed => "Completed",
            RunStatus::Failed => "Failed",
            RunStatus::Cancelled => "Cancelled",
            RunStatus::Error => "Error",
        }
    }
}

/// Pull the token count out of a tool stdout line such as
/// `Token count: 12,345, Model info: ...`.
pub fn extract_token_info(line: &str) -> Option<String> {
    let start = line.find("Token count:")? + "Token count:".len();
    let rest = &line[start..];
    let end = rest.find(',').unwrap_or(rest.len());
    let value = rest[..end].trim();
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}
