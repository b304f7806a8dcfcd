//! Post-run processing.
//!
//! After the tool exits, read back the result artifact it wrote (when the run
//! succeeded and an output file was configured) so presentation layers can
//! display, copy, or save it.

use crate::model::{Options, RunOutcome, RunSummary};
use crate::storage;

/// Turn a raw engine outcome into the summary handed to the UI. An artifact
/// read failure after a successful exit is carried as an extra error line;
/// it never downgrades the Completed status.
pub(crate) fn process_run_completion(options: &Options, outcome: RunOutcome) -> RunSummary {
    let artifact_path = options.output_file.clone();

    let (artifact, artifact_error) = match (&artifact_path, outcome.exit_code, outcome.cancelled) {
        (Some(path), Some(0), false) => match storage::read_artifact(path) {
            Ok(text) => (Some(text), None),
            Err(e) => (None, Some(format!("Error reading output file: {e:#}"))),
        },
        _ => (None, None),
    };

    RunSummary {
        outcome,
        artifact_path,
        artifact,
        artifact_error,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::RunStatus;

    fn outcome(exit_code: Option<i32>, cancelled: bool) -> RunOutcome {
        RunOutcome {
            exit_code,
            cancelled,
            stdout: vec![],
            stderr: vec![],
        }
    }

    #[test]
    fn successful_run_reads_the_artifact_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prompt.md");
        std::fs::write(&path, "# generated prompt\n").unwrap();

        let options = Options {
            output_file: Some(path.clone()),
            ..Options::default()
        };
        let summary = process_run_completion(&options, outcome(Some(0), false));

        assert_eq!(summary.artifact.as_deref(), Some("# generated prompt\n"));
        assert_eq!(summary.artifact_error, None);
        assert_eq!(summary.status(), RunStatus::Completed);
    }

    #[test]
    fn unreadable_artifact_keeps_completed_status() {
        let dir = tempfile::tempdir().unwrap();
        let options = Options {
            output_file: Some(dir.path().join("never-written.md")),
            ..Options::default()
        };
        let summary = process_run_completion(&options, outcome(Some(0), false));

        assert_eq!(summary.artifact, None);
        assert!(summary
            .artifact_error
            .as_deref()
            .unwrap()
            .starts_with("Error reading output file:"));
        assert_eq!(summary.status(), RunStatus::Completed);
    }

    #[test]
    fn failed_run_does_not_read_the_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prompt.md");
        std::fs::write(&path, "stale content").unwrap();

        let options = Options {
            output_file: Some(path),
            ..Options::default()
        };
        let summary = process_run_completion(&options, outcome(Some(2), false));

        assert_eq!(summary.artifact, None);
        assert_eq!(summary.artifact_error, None);
        assert_eq!(summary.status(), RunStatus::Failed);
    }

    #[test]
    fn run_without_output_file_has_no_artifact() {
        let summary = process_run_completion(&Options::default(), outcome(Some(0), false));
        assert_eq!(summary.artifact, None);
        assert_eq!(summary.artifact_path, None);
    }
}
