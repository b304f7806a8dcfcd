mod export;
mod form;
mod help;
mod state;

use crate::cli::Cli;
use crate::engine::{locate_tool, ToolRunner};
use crate::model::{AppEvent, Options, RunStatus};
use crate::orchestrator::{self, UiCommand};
use anyhow::{Context, Result};
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::path::PathBuf;
use std::sync::Arc;
use std::{io, time::Duration, time::Instant};
use tokio::sync::mpsc;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};

use export::{copy_to_clipboard, save_result_copy};
use state::{FieldKind, UiState, TAB_FORM, TAB_HELP, TAB_OUTPUT};

pub async fn run(args: Cli, options: Options) -> Result<()> {
    // Unbounded channels avoid backpressure between the engine and the UI.
    let (event_tx, event_rx) = mpsc::unbounded_channel::<AppEvent>();
    let (cmd_tx, cmd_rx) = mpsc::unbounded_channel::<UiCommand>();

    // Resolve the tool once outside the UI thread; the UI only displays the
    // result. A missing binary still gets a runner so a generate attempt
    // surfaces the start failure in the output panel.
    let tool_path = locate_tool(&args.tool);
    let runner_path = tool_path
        .clone()
        .unwrap_or_else(|| PathBuf::from(&args.tool));
    let runner = Arc::new(ToolRunner::new(runner_path));

    // TUI runs in a dedicated thread to keep all blocking I/O out of the
    // Tokio runtime.
    let tool_name = args.tool.clone();
    let ui_handle = std::thread::spawn(move || {
        run_threaded(tool_name, tool_path, options, event_rx, cmd_tx)
    });

    let res = orchestrator::run_controller(runner, event_tx, cmd_rx).await;

    let join_res = tokio::task::spawn_blocking(move || ui_handle.join()).await;
    if let Ok(joined) = join_res {
        match joined {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(e),
            Err(_) => return Err(anyhow::anyhow!("TUI thread panicked")),
        }
    }

    res
}

/// Run the TUI loop on a dedicated thread.
pub fn run_threaded(
    tool_name: String,
    tool_path: Option<PathBuf>,
    options: Options,
    mut event_rx: UnboundedReceiver<AppEvent>,
    cmd_tx: UnboundedSender<UiCommand>,
) -> Result<()> {
    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen).ok();

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("create terminal")?;
    terminal.clear().ok();

    // UiState is owned by the UI thread only; no cross-thread mutation.
    let mut state = UiState::new(tool_name, tool_path, options);
    if state.tool_path.is_none() {
        state.info = format!("`{}` not found on PATH", state.tool_name);
    }

    let tick_rate = Duration::from_millis(100);
    let mut last_tick = Instant::now();

    let res = loop {
        // Drain events without blocking to keep the UI responsive.
        while let Ok(ev) = event_rx.try_recv() {
            state.apply_event(ev);
            if state.follow_output {
                state.output_scroll = state.output_lines.len();
            }
        }

        if last_tick.elapsed() >= tick_rate {
            terminal.draw(|f| form::draw(f.area(), f, &state)).ok();
            last_tick = Instant::now();
        }

        // Poll input with a short timeout to avoid blocking the render loop.
        if event::poll(Duration::from_millis(10)).unwrap_or(false) {
            if let Ok(Event::Key(k)) = event::read() {
                if k.kind != KeyEventKind::Press {
                    continue;
                }
                if handle_key(&mut state, &cmd_tx, k.modifiers, k.code) {
                    break Ok(());
                }
            }
        }
    };

    disable_raw_mode().ok();
    let mut stdout = io::stdout();
    execute!(stdout, LeaveAlternateScreen).ok();
    res
}

/// Apply one key press. Returns true when the loop should exit.
fn handle_key(
    state: &mut UiState,
    cmd_tx: &UnboundedSender<UiCommand>,
    modifiers: KeyModifiers,
    code: KeyCode,
) -> bool {
    // Text editing captures everything except the keys that leave the editor.
    if state.editing {
        match code {
            KeyCode::Enter => state.commit_edit(),
            KeyCode::Esc => state.cancel_edit(),
            KeyCode::Backspace => {
                state.edit_buffer.pop();
            }
            KeyCode::Char(c) if modifiers == KeyModifiers::CONTROL && c == 'c' => {
                let _ = cmd_tx.send(UiCommand::Quit);
                return true;
            }
            KeyCode::Char(c) => state.edit_buffer.push(c),
            _ => {}
        }
        return false;
    }

    match (modifiers, code) {
        (_, KeyCode::Char('q')) | (KeyModifiers::CONTROL, KeyCode::Char('c')) => {
            let _ = cmd_tx.send(UiCommand::Quit);
            return true;
        }
        (_, KeyCode::Tab) => {
            state.tab = (state.tab + 1) % 3;
        }
        (_, KeyCode::Char('?')) => {
            state.tab = TAB_HELP;
        }
        (_, KeyCode::Char('g')) | (_, KeyCode::F(5)) => {
            // The controller owns the single-flight policy; a generate while
            // running comes back as an Info event.
            let _ = cmd_tx.send(UiCommand::Generate(Box::new(state.options.clone())));
            state.tab = TAB_OUTPUT;
        }
        (_, KeyCode::Char('x')) => {
            if state.status == RunStatus::Generating {
                let _ = cmd_tx.send(UiCommand::Cancel);
            } else {
                state.info = "Nothing to cancel".into();
            }
        }
        (_, KeyCode::Char('y')) => match state.payload() {
            Some(text) => match copy_to_clipboard(&text) {
                Ok(()) => state.info = "Copied to clipboard".into(),
                Err(e) => state.info = format!("Clipboard copy failed: {e:#}"),
            },
            None => state.info = "Nothing to copy yet".into(),
        },
        (_, KeyCode::Char('s')) => match state.payload() {
            Some(text) => match save_result_copy(&text) {
                Ok(path) => state.info = format!("Saved: {}", path.display()),
                Err(e) => state.info = format!("Save failed: {e:#}"),
            },
            None => state.info = "Nothing to save yet".into(),
        },
        (_, KeyCode::Up) | (_, KeyCode::Char('k')) => match state.tab {
            TAB_FORM => state.select_prev(),
            TAB_OUTPUT => {
                state.follow_output = false;
                state.output_scroll = state.output_scroll.saturating_sub(1);
            }
            _ => {}
        },
        (_, KeyCode::Down) | (_, KeyCode::Char('j')) => match state.tab {
            TAB_FORM => state.select_next(),
            TAB_OUTPUT => {
                state.output_scroll = (state.output_scroll + 1).min(state.output_lines.len());
                if state.output_scroll == state.output_lines.len() {
                    state.follow_output = true;
                }
            }
            _ => {}
        },
        (_, KeyCode::Char('f')) if state.tab == TAB_OUTPUT => {
            state.follow_output = !state.follow_output;
            if state.follow_output {
                state.output_scroll = state.output_lines.len();
            }
        }
        (_, KeyCode::Char(' ')) if state.tab == TAB_FORM => {
            let field = state.selected_field();
            if field.kind() == FieldKind::Toggle {
                state.toggle(field);
            }
        }
        (_, KeyCode::Left) if state.tab == TAB_FORM => {
            let field = state.selected_field();
            state.cycle(field, false);
        }
        (_, KeyCode::Right) if state.tab == TAB_FORM => {
            let field = state.selected_field();
            state.cycle(field, true);
        }
        (_, KeyCode::Enter) if state.tab == TAB_FORM => {
            let field = state.selected_field();
            match field.kind() {
                FieldKind::Text => state.begin_edit(),
                FieldKind::Toggle => state.toggle(field),
                FieldKind::Choice => state.cycle(field, true),
            }
        }
        _ => {}
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{StreamKind, ToolEvent};

    fn state() -> UiState {
        UiState::new("code2prompt".into(), None, Options::default())
    }

    fn channel() -> (
        UnboundedSender<UiCommand>,
        mpsc::UnboundedReceiver<UiCommand>,
    ) {
        mpsc::unbounded_channel()
    }

    #[test]
    fn quit_key_sends_quit_and_exits() {
        let (tx, mut rx) = channel();
        let mut st = state();
        assert!(handle_key(&mut st, &tx, KeyModifiers::NONE, KeyCode::Char('q')));
        assert!(matches!(rx.try_recv(), Ok(UiCommand::Quit)));
    }

    #[test]
    fn generate_key_ships_the_current_options() {
        let (tx, mut rx) = channel();
        let mut st = state();
        st.options.hidden = true;
        handle_key(&mut st, &tx, KeyModifiers::NONE, KeyCode::Char('g'));
        match rx.try_recv() {
            Ok(UiCommand::Generate(opts)) => assert!(opts.hidden),
            other => panic!("unexpected command: {other:?}"),
        }
        assert_eq!(st.tab, TAB_OUTPUT);
    }

    #[test]
    fn cancel_key_is_a_no_op_when_idle() {
        let (tx, mut rx) = channel();
        let mut st = state();
        handle_key(&mut st, &tx, KeyModifiers::NONE, KeyCode::Char('x'));
        assert!(rx.try_recv().is_err());
        assert_eq!(st.info, "Nothing to cancel");
    }

    #[test]
    fn editing_captures_characters_until_enter() {
        let (tx, _rx) = channel();
        let mut st = state();
        st.selected = 0; // Path
        handle_key(&mut st, &tx, KeyModifiers::NONE, KeyCode::Enter);
        assert!(st.editing);
        for c in "/tmp".chars() {
            handle_key(&mut st, &tx, KeyModifiers::NONE, KeyCode::Char(c));
        }
        // begin_edit preloads the current value, "."
        assert_eq!(st.edit_buffer, "./tmp");
        handle_key(&mut st, &tx, KeyModifiers::NONE, KeyCode::Enter);
        assert!(!st.editing);
        assert_eq!(st.options.path, "./tmp");
    }

    #[test]
    fn scrolling_output_disables_follow_until_bottom() {
        let (tx, _rx) = channel();
        let mut st = state();
        st.tab = TAB_OUTPUT;
        for i in 0..5 {
            st.apply_event(AppEvent::Tool(ToolEvent::Line {
                stream: StreamKind::Stdout,
                text: format!("line {i}"),
            }));
        }
        st.output_scroll = st.output_lines.len();
        handle_key(&mut st, &tx, KeyModifiers::NONE, KeyCode::Up);
        assert!(!st.follow_output);
        handle_key(&mut st, &tx, KeyModifiers::NONE, KeyCode::Down);
        assert!(st.follow_output);
    }
}
