//! Run lifecycle controller.
//!
//! Single consumer of UI commands; the UI never touches the engine directly.
//! All state transitions flow back to the UI as [`AppEvent`]s on one channel,
//! which keeps thread affinity explicit.

use crate::engine::{argv, EngineControl, RunError, ToolRunner};
use crate::model::{AppEvent, Options, RunOutcome, ToolEvent};
use anyhow::Result;
use std::sync::Arc;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};

use super::post_process;

/// Commands emitted by UI layers to control generation runs.
#[derive(Debug, Clone)]
pub(crate) enum UiCommand {
    Generate(Box<Options>),
    Cancel,
    Quit,
}

/// Internal handle for a running invocation task.
struct RunCtx {
    ctrl_tx: UnboundedSender<EngineControl>,
    handle: Option<tokio::task::JoinHandle<Result<RunOutcome, RunError>>>,
    options: Options,
}

/// Spawn a new invocation and return its control handle.
fn start_run(
    runner: &Arc<ToolRunner>,
    options: Options,
    event_tx: &UnboundedSender<AppEvent>,
) -> RunCtx {
    let args = argv::build(&options);
    let (ctrl_tx, ctrl_rx) = unbounded_channel::<EngineControl>();
    let (tool_tx, mut tool_rx) = unbounded_channel::<ToolEvent>();

    // Forward engine events onto the single UI event channel.
    let fwd_tx = event_tx.clone();
    tokio::spawn(async move {
        while let Some(ev) = tool_rx.recv().await {
            let _ = fwd_tx.send(AppEvent::Tool(ev));
        }
    });

    let runner = runner.clone();
    let handle = tokio::spawn(async move { runner.run(&args, tool_tx, ctrl_rx).await });
    RunCtx {
        ctrl_tx,
        handle: Some(handle),
        options,
    }
}

/// Orchestrate invocations based on UI commands and emit events back to the
/// presentation layer. Returns when a Quit command has been honored.
pub(crate) async fn run_controller(
    runner: Arc<ToolRunner>,
    event_tx: UnboundedSender<AppEvent>,
    mut cmd_rx: UnboundedReceiver<UiCommand>,
) -> Result<()> {
    let mut run_ctx: Option<RunCtx> = None;
    let mut quit_pending = false;

    loop {
        tokio::select! {
            cmd = cmd_rx.recv() => {
                match cmd {
                    Some(UiCommand::Generate(options)) => {
                        // Busy runs are not queued; the request is dropped.
                        if run_ctx.is_some() || runner.is_running() {
                            let _ = event_tx.send(AppEvent::Info(
                                "A generation is already running".into(),
                            ));
                        } else {
                            let _ = event_tx.send(AppEvent::RunStarted);
                            run_ctx = Some(start_run(&runner, *options, &event_tx));
                        }
                    }
                    Some(UiCommand::Cancel) => {
                        if let Some(ctx) = &run_ctx {
                            let _ = ctx.ctrl_tx.send(EngineControl::Cancel);
                            let _ = event_tx.send(AppEvent::Info("Cancelling…".into()));
                        }
                    }
                    Some(UiCommand::Quit) | None => {
                        // Quit waits for the current run to wind down so the
                        // child never outlives the app.
                        quit_pending = true;
                        if let Some(ctx) = &run_ctx {
                            let _ = ctx.ctrl_tx.send(EngineControl::Cancel);
                        } else {
                            break Ok(());
                        }
                    }
                }
            }
            // Do not take the JoinHandle before this branch wins; otherwise it
            // can be dropped if another select branch is chosen, and we'll
            // never observe completion.
            maybe_done = async {
                if let Some(ctx) = &mut run_ctx {
                    if let Some(h) = ctx.handle.as_mut() {
                        return Some(h.await);
                    }
                }
                futures::future::pending().await
            } => {
                if let Some(join_res) = maybe_done {
                    let finished = run_ctx.take();
                    match join_res {
                        Ok(Ok(outcome)) => {
                            let options = finished
                                .map(|ctx| ctx.options)
                                .unwrap_or_default();
                            let summary =
                                post_process::process_run_completion(&options, outcome);
                            let _ = event_tx.send(AppEvent::RunCompleted {
                                summary: Box::new(summary),
                            });
                        }
                        Ok(Err(e)) => {
                            let _ = event_tx.send(AppEvent::StartFailed {
                                message: format!("{e:#}"),
                            });
                        }
                        Err(e) => {
                            let _ = event_tx.send(AppEvent::StartFailed {
                                message: format!("run task failed: {e}"),
                            });
                        }
                    }
                    if quit_pending {
                        break Ok(());
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::RunStatus;

    async fn recv_until_completed(
        rx: &mut UnboundedReceiver<AppEvent>,
    ) -> (Vec<AppEvent>, Box<crate::model::RunSummary>) {
        let mut seen = Vec::new();
        loop {
            let ev = tokio::time::timeout(std::time::Duration::from_secs(10), rx.recv())
                .await
                .expect("timed out waiting for events")
                .expect("event channel closed");
            if let AppEvent::RunCompleted { summary } = ev {
                return (seen, summary);
            }
            seen.push(ev);
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn generate_runs_to_completion_and_quit_stops_the_loop() {
        let runner = Arc::new(ToolRunner::new("true"));
        let (event_tx, mut event_rx) = unbounded_channel();
        let (cmd_tx, cmd_rx) = unbounded_channel();

        let ctl = tokio::spawn(run_controller(runner, event_tx, cmd_rx));

        cmd_tx
            .send(UiCommand::Generate(Box::new(Options::default())))
            .unwrap();
        let (seen, summary) = recv_until_completed(&mut event_rx).await;

        assert!(matches!(seen.first(), Some(AppEvent::RunStarted)));
        assert_eq!(summary.outcome.exit_code, Some(0));
        assert_eq!(summary.status(), RunStatus::Completed);

        cmd_tx.send(UiCommand::Quit).unwrap();
        ctl.await.unwrap().unwrap();
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn generate_while_running_is_a_no_op() {
        // `sleep 5` through the positional path argument keeps the run busy.
        let runner = Arc::new(ToolRunner::new("sleep"));
        let (event_tx, mut event_rx) = unbounded_channel();
        let (cmd_tx, cmd_rx) = unbounded_channel();

        let ctl = tokio::spawn(run_controller(runner, event_tx, cmd_rx));

        let busy = Options {
            path: "5".into(),
            ..Options::default()
        };
        cmd_tx.send(UiCommand::Generate(Box::new(busy.clone()))).unwrap();
        // Second request while busy must not start a second process.
        cmd_tx.send(UiCommand::Generate(Box::new(busy))).unwrap();
        cmd_tx.send(UiCommand::Cancel).unwrap();

        let (seen, summary) = recv_until_completed(&mut event_rx).await;
        assert!(summary.outcome.cancelled);
        assert_eq!(summary.status(), RunStatus::Cancelled);

        let starts = seen
            .iter()
            .filter(|e| matches!(e, AppEvent::RunStarted))
            .count();
        assert_eq!(starts, 1);
        assert!(seen.iter().any(|e| matches!(
            e,
            AppEvent::Info(msg) if msg.contains("already running")
        )));
        let exits = seen
            .iter()
            .filter(|e| matches!(e, AppEvent::Tool(ToolEvent::Exited { .. })))
            .count();
        assert!(exits <= 1);

        cmd_tx.send(UiCommand::Quit).unwrap();
        ctl.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn missing_binary_surfaces_start_failure_without_exited_event() {
        let runner = Arc::new(ToolRunner::new("/nonexistent/definitely-not-a-tool"));
        let (event_tx, mut event_rx) = unbounded_channel();
        let (cmd_tx, cmd_rx) = unbounded_channel();

        let ctl = tokio::spawn(run_controller(runner, event_tx, cmd_rx));
        cmd_tx
            .send(UiCommand::Generate(Box::new(Options::default())))
            .unwrap();

        let mut seen = Vec::new();
        loop {
            let ev = tokio::time::timeout(std::time::Duration::from_secs(10), event_rx.recv())
                .await
                .expect("timed out waiting for events")
                .expect("event channel closed");
            let failed = matches!(ev, AppEvent::StartFailed { .. });
            seen.push(ev);
            if failed {
                break;
            }
        }
        assert!(!seen
            .iter()
            .any(|e| matches!(e, AppEvent::Tool(ToolEvent::Exited { .. }))));
        assert!(!seen.iter().any(|e| matches!(e, AppEvent::RunCompleted { .. })));

        cmd_tx.send(UiCommand::Quit).unwrap();
        ctl.await.unwrap().unwrap();
    }
}
