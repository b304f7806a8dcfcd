use crate::engine::{argv, locate_tool, EngineControl, ToolRunner};
use crate::model::{Options, OutputFormat, StreamKind, TokenCountFormat, TokenizerEncoding, ToolEvent};
use crate::storage;
use anyhow::{Context, Result};
use clap::Parser;
use std::io::Write;
use std::path::PathBuf;
use tokio::sync::mpsc;

/// Output line routing for the stdout/stderr writer.
enum OutputLine {
    Stdout(String),
    Stderr(String),
}

/// Spawn a blocking writer for stdout/stderr to keep terminal I/O out of the
/// async tasks.
fn spawn_output_writer() -> (
    mpsc::UnboundedSender<OutputLine>,
    tokio::task::JoinHandle<()>,
) {
    let (tx, mut rx) = mpsc::unbounded_channel::<OutputLine>();
    let handle = tokio::task::spawn_blocking(move || {
        let stdout = std::io::stdout();
        let stderr = std::io::stderr();
        let mut out = std::io::LineWriter::new(stdout.lock());
        let mut err = std::io::LineWriter::new(stderr.lock());

        while let Some(line) = rx.blocking_recv() {
            match line {
                OutputLine::Stdout(msg) => {
                    let _ = writeln!(out, "{}", msg);
                }
                OutputLine::Stderr(msg) => {
                    let _ = writeln!(err, "{}", msg);
                }
            }
        }

        let _ = out.flush();
        let _ = err.flush();
    });
    (tx, handle)
}

#[derive(Debug, Parser, Clone)]
#[command(
    name = "promptdeck",
    version,
    about = "Terminal front-end for the code2prompt CLI"
)]
pub struct Cli {
    /// Directory to analyze (the tool's positional argument)
    #[arg(default_value = ".")]
    pub path: String,

    /// Write the generated prompt to this file
    #[arg(short = 'O', long)]
    pub output_file: Option<PathBuf>,

    /// Ask the tool to copy the prompt to the clipboard
    #[arg(short = 'c', long)]
    pub clipboard: bool,

    /// Include glob patterns (comma/newline separated, repeatable)
    #[arg(short = 'i', long = "include", value_name = "PATTERNS")]
    pub include: Vec<String>,

    /// Exclude glob patterns (comma/newline separated, repeatable)
    #[arg(short = 'e', long = "exclude", value_name = "PATTERNS")]
    pub exclude: Vec<String>,

    /// Follow symlinks while traversing
    #[arg(short = 'L', long)]
    pub follow_symlinks: bool,

    /// Include hidden files and directories
    #[arg(long)]
    pub hidden: bool,

    /// Skip .gitignore rules
    #[arg(long)]
    pub no_ignore: bool,

    /// Output format
    #[arg(short = 'F', long, value_enum, default_value_t = OutputFormat::Markdown)]
    pub output_format: OutputFormat,

    /// Custom Handlebars template file
    #[arg(short = 't', long)]
    pub template: Option<PathBuf>,

    /// Add line numbers to source blocks
    #[arg(long)]
    pub line_numbers: bool,

    /// Use absolute instead of relative paths
    #[arg(long)]
    pub absolute_paths: bool,

    /// Disable wrapping code in markdown code blocks
    #[arg(long)]
    pub no_codeblock: bool,

    /// List the full directory tree, including excluded files
    #[arg(long)]
    pub full_directory_tree: bool,

    /// Include staged git diff
    #[arg(long)]
    pub diff: bool,

    /// Include git diff between two branches, e.g. "main,feature"
    #[arg(long, value_name = "A,B")]
    pub git_diff_branch: Option<String>,

    /// Include git log between two branches, e.g. "main,feature"
    #[arg(long, value_name = "A,B")]
    pub git_log_branch: Option<String>,

    /// Tokenizer encoding for token counting
    #[arg(long, value_enum, default_value_t = TokenizerEncoding::Cl100k)]
    pub encoding: TokenizerEncoding,

    /// Token count display format
    #[arg(long, value_enum, default_value_t = TokenCountFormat::Format)]
    pub token_format: TokenCountFormat,

    /// Display a token usage map per directory
    #[arg(long)]
    pub token_map: bool,

    /// Suppress the tool's progress output
    #[arg(short = 'q', long)]
    pub quiet: bool,

    /// Name or path of the external code2prompt binary
    #[arg(long, default_value = "code2prompt")]
    pub tool: String,

    /// Run once without the TUI, streaming the tool's output
    #[arg(long)]
    pub headless: bool,

    /// Print the argument vector that would be passed to the tool, then exit
    #[arg(long)]
    pub print_args: bool,

    /// Load a saved option preset (replaces the option flags)
    #[arg(long, value_name = "NAME")]
    pub preset: Option<String>,

    /// Save the effective options as a named preset, then exit
    #[arg(long, value_name = "NAME")]
    pub save_preset: Option<String>,
}

/// Map CLI flags onto the tool option record.
pub fn build_options(args: &Cli) -> Options {
    Options {
        path: args.path.clone(),
        output_file: args.output_file.clone(),
        clipboard: args.clipboard,
        include_patterns: args.include.join(","),
        exclude_patterns: args.exclude.join(","),
        follow_symlinks: args.follow_symlinks,
        hidden: args.hidden,
        no_ignore: args.no_ignore,
        output_format: args.output_format,
        template: args.template.clone(),
        line_numbers: args.line_numbers,
        absolute_paths: args.absolute_paths,
        no_codeblock: args.no_codeblock,
        full_directory_tree: args.full_directory_tree,
        diff: args.diff,
        git_diff_branches: args.git_diff_branch.clone().unwrap_or_default(),
        git_log_branches: args.git_log_branch.clone().unwrap_or_default(),
        encoding: args.encoding,
        token_format: args.token_format,
        token_map: args.token_map,
        quiet: args.quiet,
    }
}

/// Dispatch one CLI invocation. Returns the process exit code to propagate.
pub async fn run(args: Cli) -> Result<i32> {
    let options = match args.preset.as_deref() {
        Some(name) => {
            storage::load_preset(name).with_context(|| format!("load preset `{name}`"))?
        }
        None => build_options(&args),
    };

    if let Some(name) = args.save_preset.as_deref() {
        let path = storage::save_preset(name, &options)?;
        println!("Saved preset: {}", path.display());
        return Ok(0);
    }

    if args.print_args {
        println!("{}", argv::render(&argv::build(&options)));
        return Ok(0);
    }

    if args.headless {
        init_logging();
        return run_headless(&args, options).await;
    }

    #[cfg(feature = "tui")]
    {
        crate::tui::run(args, options).await?;
        Ok(0)
    }
    #[cfg(not(feature = "tui"))]
    {
        // Fallback when built without TUI support.
        init_logging();
        run_headless(&args, options).await
    }
}

fn init_logging() {
    let env = env_logger::Env::default().default_filter_or("warn");
    let _ = env_logger::Builder::from_env(env).try_init();
}

/// Run the tool once, mirroring its stdout/stderr to ours, and return its
/// exit code. Ctrl-C cancels the run instead of orphaning the child.
async fn run_headless(args: &Cli, options: Options) -> Result<i32> {
    let tool = locate_tool(&args.tool)
        .with_context(|| format!("external tool `{}` not found", args.tool))?;
    log::info!("using tool at {}", tool.display());

    let arg_vec = argv::build(&options);
    let runner = ToolRunner::new(tool);

    let (out_tx, out_handle) = spawn_output_writer();
    let (evt_tx, mut evt_rx) = mpsc::unbounded_channel::<ToolEvent>();
    let (ctrl_tx, ctrl_rx) = mpsc::unbounded_channel::<EngineControl>();

    let printer_tx = out_tx.clone();
    let printer = tokio::spawn(async move {
        while let Some(ev) = evt_rx.recv().await {
            match ev {
                ToolEvent::Line {
                    stream: StreamKind::Stdout,
                    text,
                } => {
                    let _ = printer_tx.send(OutputLine::Stdout(text));
                }
                ToolEvent::Line {
                    stream: StreamKind::Stderr,
                    text,
                } => {
                    let _ = printer_tx.send(OutputLine::Stderr(text));
                }
                ToolEvent::Exited { .. } => {}
            }
        }
    });

    let cancel_task = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = ctrl_tx.send(EngineControl::Cancel);
        }
    });

    let outcome = runner
        .run(&arg_vec, evt_tx, ctrl_rx)
        .await
        .context("failed to run the external tool")?;
    cancel_task.abort();
    let _ = printer.await;

    if outcome.cancelled {
        let _ = out_tx.send(OutputLine::Stderr("Cancelled".into()));
    } else if let (Some(0), Some(path)) = (outcome.exit_code, options.output_file.as_deref()) {
        let _ = out_tx.send(OutputLine::Stderr(format!(
            "Result written to {}",
            path.display()
        )));
    }

    drop(out_tx);
    let _ = out_handle.await;

    Ok(outcome.exit_code.unwrap_or(1))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(line: &[&str]) -> Cli {
        Cli::try_parse_from(line).unwrap()
    }

    #[test]
    fn defaults_map_to_default_options() {
        let args = parse(&["promptdeck"]);
        assert_eq!(build_options(&args), Options::default());
    }

    #[test]
    fn repeated_include_flags_join_into_raw_pattern_text() {
        let args = parse(&["promptdeck", "-i", "*.rs,*.toml", "-i", "*.md"]);
        let options = build_options(&args);
        assert_eq!(options.include_patterns, "*.rs,*.toml,*.md");
        assert_eq!(
            argv::build(&options),
            vec!["-i", "*.rs", "-i", "*.toml", "-i", "*.md"]
        );
    }

    #[test]
    fn flags_map_one_to_one() {
        let args = parse(&[
            "promptdeck",
            "/src/project",
            "-O",
            "out.md",
            "-c",
            "--hidden",
            "--git-diff-branch",
            "main,feature",
            "--encoding",
            "r50k",
            "-F",
            "json",
        ]);
        let options = build_options(&args);
        assert_eq!(options.path, "/src/project");
        assert_eq!(options.output_file.as_deref().unwrap().to_str(), Some("out.md"));
        assert!(options.clipboard);
        assert!(options.hidden);
        assert_eq!(options.git_diff_branches, "main,feature");
        assert_eq!(options.encoding, TokenizerEncoding::R50k);
        assert_eq!(options.output_format, OutputFormat::Json);
    }

    #[test]
    fn encoding_value_names_match_the_tool() {
        let args = parse(&["promptdeck", "--encoding", "p50k_edit"]);
        assert_eq!(build_options(&args).encoding, TokenizerEncoding::P50kEdit);
    }
}
