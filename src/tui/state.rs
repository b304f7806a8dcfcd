use crate::model::{
    extract_token_info, AppEvent, Options, OutputFormat, RunStatus, StreamKind, TokenCountFormat,
    TokenizerEncoding, ToolEvent,
};
use std::path::PathBuf;

/// Top-level tabs.
pub const TAB_FORM: usize = 0;
pub const TAB_OUTPUT: usize = 1;
pub const TAB_HELP: usize = 2;

/// One row in the options form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Path,
    OutputFile,
    Clipboard,
    IncludePatterns,
    ExcludePatterns,
    FollowSymlinks,
    Hidden,
    NoIgnore,
    OutputFormat,
    Template,
    LineNumbers,
    AbsolutePaths,
    NoCodeblock,
    FullDirectoryTree,
    Diff,
    GitDiffBranches,
    GitLogBranches,
    Encoding,
    TokenFormat,
    TokenMap,
    Quiet,
}

pub const FIELDS: [Field; 21] = [
    Field::Path,
    Field::OutputFile,
    Field::Clipboard,
    Field::IncludePatterns,
    Field::ExcludePatterns,
    Field::FollowSymlinks,
    Field::Hidden,
    Field::NoIgnore,
    Field::OutputFormat,
    Field::Template,
    Field::LineNumbers,
    Field::AbsolutePaths,
    Field::NoCodeblock,
    Field::FullDirectoryTree,
    Field::Diff,
    Field::GitDiffBranches,
    Field::GitLogBranches,
    Field::Encoding,
    Field::TokenFormat,
    Field::TokenMap,
    Field::Quiet,
];

/// Widget behavior per field: free text, on/off toggle, or enum choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Toggle,
    Choice,
}

impl Field {
    pub fn label(self) -> &'static str {
        match self {
            Field::Path => "Path",
            Field::OutputFile => "Output file",
            Field::Clipboard => "Copy to clipboard (tool)",
            Field::IncludePatterns => "Include patterns",
            Field::ExcludePatterns => "Exclude patterns",
            Field::FollowSymlinks => "Follow symlinks",
            Field::Hidden => "Show hidden files",
            Field::NoIgnore => "Ignore .gitignore",
            Field::OutputFormat => "Output format",
            Field::Template => "Template",
            Field::LineNumbers => "Line numbers",
            Field::AbsolutePaths => "Absolute paths",
            Field::NoCodeblock => "No code blocks",
            Field::FullDirectoryTree => "Full directory tree",
            Field::Diff => "Staged git diff",
            Field::GitDiffBranches => "Git diff branches (a,b)",
            Field::GitLogBranches => "Git log branches (a,b)",
            Field::Encoding => "Tokenizer encoding",
            Field::TokenFormat => "Token count format",
            Field::TokenMap => "Token map",
            Field::Quiet => "Quiet",
        }
    }

    pub fn kind(self) -> FieldKind {
        match self {
            Field::Path
            | Field::OutputFile
            | Field::IncludePatterns
            | Field::ExcludePatterns
            | Field::Template
            | Field::GitDiffBranches
            | Field::GitLogBranches => FieldKind::Text,
            Field::OutputFormat | Field::Encoding | Field::TokenFormat => FieldKind::Choice,
            _ => FieldKind::Toggle,
        }
    }
}

/// UI-side state, owned by the UI thread only; all mutation happens in the
/// single consumer loop that applies key presses and controller events.
pub struct UiState {
    pub tab: usize,
    pub tool_name: String,
    pub tool_path: Option<PathBuf>,
    pub options: Options,

    pub selected: usize,
    pub editing: bool,
    pub edit_buffer: String,

    pub output_lines: Vec<(StreamKind, String)>,
    pub output_scroll: usize,
    pub follow_output: bool,

    pub status: RunStatus,
    pub info: String,
    pub token_info: Option<String>,
    pub result: Option<String>,
    pub result_path: Option<PathBuf>,
}

impl UiState {
    pub fn new(tool_name: String, tool_path: Option<PathBuf>, options: Options) -> Self {
        Self {
            tab: TAB_FORM,
            tool_name,
            tool_path,
            options,
            selected: 0,
            editing: false,
            edit_buffer: String::new(),
            output_lines: Vec::new(),
            output_scroll: 0,
            follow_output: true,
            status: RunStatus::Ready,
            info: String::new(),
            token_info: None,
            result: None,
            result_path: None,
        }
    }

    pub fn selected_field(&self) -> Field {
        FIELDS[self.selected.min(FIELDS.len() - 1)]
    }

    pub fn select_prev(&mut self) {
        if self.selected > 0 {
            self.selected -= 1;
        }
    }

    pub fn select_next(&mut self) {
        if self.selected + 1 < FIELDS.len() {
            self.selected += 1;
        }
    }

    /// Current display value for a field.
    pub fn field_value(&self, field: Field) -> String {
        match field {
            Field::Path => self.options.path.clone(),
            Field::OutputFile => self
                .options
                .output_file
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_default(),
            Field::IncludePatterns => self.options.include_patterns.clone(),
            Field::ExcludePatterns => self.options.exclude_patterns.clone(),
            Field::Template => self
                .options
                .template
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_default(),
            Field::GitDiffBranches => self.options.git_diff_branches.clone(),
            Field::GitLogBranches => self.options.git_log_branches.clone(),
            Field::OutputFormat => self.options.output_format.as_arg().to_string(),
            Field::Encoding => self.options.encoding.as_arg().to_string(),
            Field::TokenFormat => self.options.token_format.as_arg().to_string(),
            Field::Clipboard => toggle_label(self.options.clipboard),
            Field::FollowSymlinks => toggle_label(self.options.follow_symlinks),
            Field::Hidden => toggle_label(self.options.hidden),
            Field::NoIgnore => toggle_label(self.options.no_ignore),
            Field::LineNumbers => toggle_label(self.options.line_numbers),
            Field::AbsolutePaths => toggle_label(self.options.absolute_paths),
            Field::NoCodeblock => toggle_label(self.options.no_codeblock),
            Field::FullDirectoryTree => toggle_label(self.options.full_directory_tree),
            Field::Diff => toggle_label(self.options.diff),
            Field::TokenMap => toggle_label(self.options.token_map),
            Field::Quiet => toggle_label(self.options.quiet),
        }
    }

    pub fn toggle(&mut self, field: Field) {
        let slot = match field {
            Field::Clipboard => &mut self.options.clipboard,
            Field::FollowSymlinks => &mut self.options.follow_symlinks,
            Field::Hidden => &mut self.options.hidden,
            Field::NoIgnore => &mut self.options.no_ignore,
            Field::LineNumbers => &mut self.options.line_numbers,
            Field::AbsolutePaths => &mut self.options.absolute_paths,
            Field::NoCodeblock => &mut self.options.no_codeblock,
            Field::FullDirectoryTree => &mut self.options.full_directory_tree,
            Field::Diff => &mut self.options.diff,
            Field::TokenMap => &mut self.options.token_map,
            Field::Quiet => &mut self.options.quiet,
            _ => return,
        };
        *slot = !*slot;
    }

    pub fn cycle(&mut self, field: Field, forward: bool) {
        match field {
            Field::OutputFormat => {
                self.options.output_format = cycle_slice(
                    &[OutputFormat::Markdown, OutputFormat::Json, OutputFormat::Xml],
                    self.options.output_format,
                    forward,
                );
            }
            Field::Encoding => {
                self.options.encoding = cycle_slice(
                    &[
                        TokenizerEncoding::Cl100k,
                        TokenizerEncoding::P50k,
                        TokenizerEncoding::P50kEdit,
                        TokenizerEncoding::R50k,
                    ],
                    self.options.encoding,
                    forward,
                );
            }
            Field::TokenFormat => {
                self.options.token_format = cycle_slice(
                    &[TokenCountFormat::Format, TokenCountFormat::Raw],
                    self.options.token_format,
                    forward,
                );
            }
            _ => {}
        }
    }

    pub fn begin_edit(&mut self) {
        if self.selected_field().kind() != FieldKind::Text {
            return;
        }
        self.edit_buffer = self.field_value(self.selected_field());
        self.editing = true;
    }

    pub fn commit_edit(&mut self) {
        let value = std::mem::take(&mut self.edit_buffer);
        self.editing = false;
        match self.selected_field() {
            Field::Path => {
                self.options.path = if value.trim().is_empty() {
                    ".".into()
                } else {
                    value
                };
            }
            Field::OutputFile => {
                self.options.output_file =
                    (!value.trim().is_empty()).then(|| PathBuf::from(value));
            }
            Field::IncludePatterns => self.options.include_patterns = value,
            Field::ExcludePatterns => self.options.exclude_patterns = value,
            Field::Template => {
                self.options.template = (!value.trim().is_empty()).then(|| PathBuf::from(value));
            }
            Field::GitDiffBranches => self.options.git_diff_branches = value,
            Field::GitLogBranches => self.options.git_log_branches = value,
            _ => {}
        }
    }

    pub fn cancel_edit(&mut self) {
        self.edit_buffer.clear();
        self.editing = false;
    }

    /// Text to copy or save: the result artifact when one was read back,
    /// otherwise the accumulated output panel.
    pub fn payload(&self) -> Option<String> {
        if let Some(result) = &self.result {
            return Some(result.clone());
        }
        if self.output_lines.is_empty() {
            return None;
        }
        Some(
            self.output_lines
                .iter()
                .map(|(_, text)| text.as_str())
                .collect::<Vec<_>>()
                .join("\n"),
        )
    }

    fn push_line(&mut self, stream: StreamKind, text: String) {
        const MAX: usize = 5000;
        self.output_lines.push((stream, text));
        if self.output_lines.len() > MAX {
            let _ = self.output_lines.drain(0..(self.output_lines.len() - MAX));
        }
    }

    fn reset_for_run(&mut self) {
        self.output_lines.clear();
        self.output_scroll = 0;
        self.follow_output = true;
        self.token_info = None;
        self.result = None;
        self.result_path = None;
        self.status = RunStatus::Generating;
        self.info = "Generating prompt…".into();
    }

    pub fn apply_event(&mut self, ev: AppEvent) {
        match ev {
            AppEvent::RunStarted => self.reset_for_run(),
            AppEvent::Tool(ToolEvent::Line { stream, text }) => {
                if stream == StreamKind::Stdout {
                    if let Some(info) = extract_token_info(&text) {
                        self.token_info = Some(info);
                    }
                }
                self.push_line(stream, text);
            }
            // Final state comes from RunCompleted, which carries the whole
            // outcome; the raw exit event needs no separate handling.
            AppEvent::Tool(ToolEvent::Exited { .. }) => {}
            AppEvent::StartFailed { message } => {
                self.status = RunStatus::Error;
                self.push_line(StreamKind::Stderr, message.clone());
                self.info = message;
            }
            AppEvent::Info(message) => self.info = message,
            AppEvent::RunCompleted { summary } => {
                self.status = summary.status();
                self.result = summary.artifact.clone();
                self.result_path = summary.artifact_path.clone();
                if let Some(err) = &summary.artifact_error {
                    self.push_line(StreamKind::Stderr, err.clone());
                }
                self.info = match self.status {
                    RunStatus::Completed if self.result.is_some() => {
                        "Completed – result ready (y copy, s save)".into()
                    }
                    RunStatus::Completed => "Completed".into(),
                    RunStatus::Cancelled => "Cancelled".into(),
                    _ => match summary.outcome.exit_code {
                        Some(code) => format!("Failed (exit code {code})"),
                        None => "Failed (terminated by signal)".into(),
                    },
                };
            }
        }
    }
}

fn toggle_label(v: bool) -> String {
    if v { "[x]".into() } else { "[ ]".into() }
}

fn cycle_slice<T: Copy + PartialEq>(values: &[T], current: T, forward: bool) -> T {
    let idx = values.iter().position(|v| *v == current).unwrap_or(0);
    let next = if forward {
        (idx + 1) % values.len()
    } else {
        (idx + values.len() - 1) % values.len()
    };
    values[next]
}
