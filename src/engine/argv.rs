//! Argument builder for the external tool.
//!
//! Pure mapping from [`Options`] to the flat argument vector. Tokens are
//! handed to the process API as discrete argv entries, so no shell escaping
//! is applied here; [`render`] quotes for display purposes only.

use crate::model::{Options, OutputFormat, TokenCountFormat, TokenizerEncoding};

/// Build the ordered argument vector for one invocation.
///
/// Infallible: malformed input (blank patterns, incomplete branch pairs)
/// yields fewer tokens, never an error. Flags that match the tool's own
/// defaults are omitted so an untouched `Options` produces an empty vector.
pub fn build(opts: &Options) -> Vec<String> {
    let mut args: Vec<String> = Vec::new();

    if !opts.path.is_empty() && opts.path != "." {
        args.push(opts.path.clone());
    }
    if let Some(out) = &opts.output_file {
        args.push("-O".into());
        args.push(out.display().to_string());
    }
    if opts.clipboard {
        args.push("-c".into());
    }
    for pattern in split_patterns(&opts.include_patterns) {
        args.push("-i".into());
        args.push(pattern);
    }
    for pattern in split_patterns(&opts.exclude_patterns) {
        args.push("-e".into());
        args.push(pattern);
    }
    if opts.follow_symlinks {
        args.push("-L".into());
    }
    if opts.hidden {
        args.push("--hidden".into());
    }
    if opts.no_ignore {
        args.push("--no-ignore".into());
    }
    if opts.line_numbers {
        args.push("--line-numbers".into());
    }
    if opts.absolute_paths {
        args.push("--absolute-paths".into());
    }
    if opts.no_codeblock {
        args.push("--no-codeblock".into());
    }
    if opts.full_directory_tree {
        args.push("--full-directory-tree".into());
    }
    if opts.diff {
        args.push("--diff".into());
    }
    if opts.token_map {
        args.push("--token-map".into());
    }
    if opts.quiet {
        args.push("-q".into());
    }
    if opts.output_format != OutputFormat::Markdown {
        args.push("-F".into());
        args.push(opts.output_format.as_arg().into());
    }
    if let Some(template) = &opts.template {
        args.push("-t".into());
        args.push(template.display().to_string());
    }
    if let Some((a, b)) = branch_pair(&opts.git_diff_branches) {
        args.push("--git-diff-branch".into());
        args.push(format!("{a},{b}"));
    }
    if let Some((a, b)) = branch_pair(&opts.git_log_branches) {
        args.push("--git-log-branch".into());
        args.push(format!("{a},{b}"));
    }
    if opts.encoding != TokenizerEncoding::Cl100k {
        args.push("--encoding".into());
        args.push(opts.encoding.as_arg().into());
    }
    if opts.token_format != TokenCountFormat::Format {
        args.push("--token-format".into());
        args.push(opts.token_format.as_arg().into());
    }

    args
}

/// Split raw pattern text on commas and newlines, trimming each segment and
/// dropping empties, preserving input order.
pub fn split_patterns(raw: &str) -> Vec<String> {
    raw.split([',', '\n', '\r'])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Parse a "base,compare" branch pair. Anything other than exactly two
/// non-empty comma-separated parts is silently ignored.
pub fn branch_pair(raw: &str) -> Option<(String, String)> {
    let parts: Vec<&str> = raw.split(',').map(str::trim).collect();
    match parts.as_slice() {
        [a, b] if !a.is_empty() && !b.is_empty() => Some((a.to_string(), b.to_string())),
        _ => None,
    }
}

/// Render an argument vector as a single display string, double-quoting
/// tokens that contain whitespace (or are empty). Display only; the real
/// invocation always passes discrete tokens.
pub fn render(args: &[String]) -> String {
    args.iter()
        .map(|a| {
            if a.is_empty() || a.chars().any(char::is_whitespace) {
                format!("\"{a}\"")
            } else {
                a.clone()
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn default_options_build_empty_vector() {
        assert!(build(&Options::default()).is_empty());
    }

    #[test]
    fn non_default_path_leads_the_vector() {
        let opts = Options {
            path: "/home/me/project".into(),
            hidden: true,
            ..Options::default()
        };
        let args = build(&opts);
        assert_eq!(args[0], "/home/me/project");
        assert_eq!(args[1], "--hidden");
    }

    #[test]
    fn output_file_emits_big_o_flag() {
        let opts = Options {
            output_file: Some(PathBuf::from("out.md")),
            ..Options::default()
        };
        assert_eq!(build(&opts), vec!["-O", "out.md"]);
    }

    #[test]
    fn patterns_split_on_commas_and_newlines_in_order() {
        let opts = Options {
            include_patterns: "*.rs, *.go\n*.py".into(),
            ..Options::default()
        };
        assert_eq!(
            build(&opts),
            vec!["-i", "*.rs", "-i", "*.go", "-i", "*.py"]
        );
    }

    #[test]
    fn blank_pattern_segments_are_dropped() {
        let opts = Options {
            exclude_patterns: " ,,\n  \r*.lock,  ".into(),
            ..Options::default()
        };
        assert_eq!(build(&opts), vec!["-e", "*.lock"]);
    }

    #[test]
    fn each_boolean_flag_toggles_exactly_one_token() {
        let flags: Vec<(fn(&mut Options), &str)> = vec![
            (|o| o.follow_symlinks = true, "-L"),
            (|o| o.hidden = true, "--hidden"),
            (|o| o.no_ignore = true, "--no-ignore"),
            (|o| o.line_numbers = true, "--line-numbers"),
            (|o| o.absolute_paths = true, "--absolute-paths"),
            (|o| o.no_codeblock = true, "--no-codeblock"),
            (|o| o.full_directory_tree = true, "--full-directory-tree"),
            (|o| o.diff = true, "--diff"),
            (|o| o.token_map = true, "--token-map"),
            (|o| o.quiet = true, "-q"),
        ];
        for (set, token) in flags {
            let mut opts = Options::default();
            set(&mut opts);
            assert_eq!(build(&opts), vec![token], "flag {token}");
        }
    }

    #[test]
    fn default_format_encoding_and_token_format_are_omitted() {
        let opts = Options {
            output_format: crate::model::OutputFormat::Markdown,
            encoding: crate::model::TokenizerEncoding::Cl100k,
            token_format: crate::model::TokenCountFormat::Format,
            ..Options::default()
        };
        assert!(build(&opts).is_empty());
    }

    #[test]
    fn non_default_format_and_encoding_emit_values() {
        let opts = Options {
            output_format: crate::model::OutputFormat::Json,
            encoding: crate::model::TokenizerEncoding::P50kEdit,
            token_format: crate::model::TokenCountFormat::Raw,
            ..Options::default()
        };
        assert_eq!(
            build(&opts),
            vec![
                "-F",
                "json",
                "--encoding",
                "p50k_edit",
                "--token-format",
                "raw"
            ]
        );
    }

    #[test]
    fn branch_pair_requires_exactly_two_parts() {
        assert_eq!(branch_pair("main,feature"), Some(("main".into(), "feature".into())));
        assert_eq!(branch_pair(" main , feature "), Some(("main".into(), "feature".into())));
        assert_eq!(branch_pair("main"), None);
        assert_eq!(branch_pair(""), None);
        assert_eq!(branch_pair("main,"), None);
        assert_eq!(branch_pair("a,b,c"), None);
    }

    #[test]
    fn single_branch_emits_no_git_diff_flag() {
        let opts = Options {
            git_diff_branches: "main".into(),
            ..Options::default()
        };
        assert!(build(&opts).is_empty());
    }

    #[test]
    fn complete_branch_pairs_are_joined_with_a_comma() {
        let opts = Options {
            git_diff_branches: "main, feature".into(),
            git_log_branches: "release,hotfix".into(),
            ..Options::default()
        };
        assert_eq!(
            build(&opts),
            vec![
                "--git-diff-branch",
                "main,feature",
                "--git-log-branch",
                "release,hotfix"
            ]
        );
    }

    #[test]
    fn template_path_emits_t_flag() {
        let opts = Options {
            template: Some(PathBuf::from("custom.hbs")),
            ..Options::default()
        };
        assert_eq!(build(&opts), vec!["-t", "custom.hbs"]);
    }

    #[test]
    fn render_quotes_only_tokens_with_whitespace() {
        let args = vec![
            "-O".to_string(),
            "my output.md".to_string(),
            "-i".to_string(),
            "*.rs".to_string(),
        ];
        assert_eq!(render(&args), "-O \"my output.md\" -i *.rs");
    }
}
