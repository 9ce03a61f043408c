use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::sync::mpsc;

use droidscope_logs::{LogBuffer, LogTailer, TailEvent, TailHandle};
use droidscope_tui::{
    Action, AppState, Event, EventHandler, HelpOverlay, KeyBindings, KeyContext, LogViewerScreen,
    Tui,
};
use droidscope_types::ViewerConfig;

mod project;

/// Droidscope - a terminal UI for following Android logcat capture files
#[derive(Parser, Debug)]
#[command(name = "droidscope")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Log file to follow (defaults to the newest file in the project's
    /// log directory)
    #[arg(value_name = "FILE")]
    file: Option<PathBuf>,

    /// Project root used to resolve the default log file and the
    /// application id
    #[arg(long, default_value = ".")]
    project: PathBuf,

    /// Start with the package filter disabled
    #[arg(long)]
    no_package: bool,

    /// Buffer size for log records
    #[arg(long, default_value = "10000")]
    buffer_size: usize,

    /// File-growth poll interval in milliseconds
    #[arg(long = "poll-ms", default_value = "100")]
    poll_ms: u64,

    /// Start at the end of the file instead of seeding the buffer with
    /// existing content
    #[arg(long)]
    no_seed: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Tracing goes to stderr so the alternate screen stays clean
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let result = run_app(args).await;

    if let Err(e) = &result {
        eprintln!("Error: {:#}", e);
    }

    result
}

async fn run_app(args: Args) -> Result<()> {
    let log_path = project::resolve_log_path(&args.project, args.file)?;

    let package = project::discover_application_id(&args.project);
    let package_filter_enabled = !args.no_package;

    let mut config = ViewerConfig::new(log_path);
    config.package = package;
    config.package_filter_enabled = package_filter_enabled;
    config.buffer_capacity = args.buffer_size;
    config.poll_interval = Duration::from_millis(args.poll_ms);
    config.seed_existing = !args.no_seed;

    let buffer = LogBuffer::new(config.buffer_capacity);

    // Opening the file must succeed before the terminal is taken over;
    // a missing file is fatal with a non-zero exit.
    let tailer = LogTailer::open(&config.log_path, config.seed_existing, &buffer)
        .with_context(|| format!("cannot follow {}", config.log_path.display()))?;

    let (tail_tx, mut tail_rx) = mpsc::unbounded_channel::<TailEvent>();
    let tail = TailHandle::spawn(tailer, buffer.clone(), config.poll_interval, tail_tx);

    let mut tui = Tui::new()?;
    let mut events = EventHandler::new(Duration::from_millis(100));
    let keybindings = KeyBindings::new();
    let mut state = AppState::new(config);

    render(&mut tui, &mut state, &buffer)?;

    // Main event loop: whichever happens first, a key or a batch of new
    // records, drives the next frame.
    loop {
        tokio::select! {
            Some(event) = events.next() => {
                match event {
                    Event::Key(key) => {
                        let action = if state.ui_state.prompt.is_some() {
                            keybindings.get_prompt_action(&key)
                        } else {
                            keybindings.get_action(KeyContext::Viewer, &key)
                        };
                        if let Some(action) = action {
                            handle_action(&mut state, &buffer, action);
                        }
                    }
                    Event::Tick | Event::Resize(_, _) => {
                        // Redraw below picks up whatever changed
                    }
                    Event::Error(e) => {
                        tracing::warn!(%e, "terminal event error");
                    }
                }
            }

            Some(tail_event) = tail_rx.recv() => {
                match tail_event {
                    TailEvent::Appended(_) => {
                        // Buffer growth invalidates the projection by
                        // itself; the redraw below re-derives the view
                    }
                    TailEvent::Rotated => {
                        tracing::warn!("log file rotated, following new content");
                    }
                    TailEvent::Ended(reason) => {
                        state.mark_frozen(reason);
                    }
                }
            }
        }

        if state.should_quit {
            break;
        }

        render(&mut tui, &mut state, &buffer)?;
    }

    // Stop the tailer and wait for the file handle to close
    tail.shutdown().await;
    events.shutdown();
    tui.restore()?;

    Ok(())
}

fn handle_action(state: &mut AppState, buffer: &LogBuffer, action: Action) {
    match action {
        Action::Quit => {
            state.should_quit = true;
        }
        Action::TogglePause => {
            state.toggle_pause(buffer);
        }
        Action::ToggleHelp => {
            state.ui_state.help_visible = !state.ui_state.help_visible;
        }
        Action::ToggleFollow => {
            state.ui_state.follow = !state.ui_state.follow;
        }

        // Filter mutation
        Action::TogglePackageFilter => {
            state.toggle_package_filter();
        }
        Action::OpenPrompt(kind) => {
            state.open_prompt(kind);
        }
        Action::ClearFilters => {
            state.clear_filters();
        }
        Action::ClearAllFilters => {
            state.clear_all_filters();
        }

        // Prompt input
        Action::PromptInput(c) => {
            state.prompt_char(c);
        }
        Action::PromptBackspace => {
            state.prompt_backspace();
        }
        Action::PromptClear => {
            state.prompt_clear();
        }
        Action::PromptAccept => {
            state.accept_prompt();
        }
        Action::PromptCancel => {
            state.cancel_prompt();
        }

        // Log pane navigation; manual movement leaves follow mode
        Action::ScrollUp(n) => {
            state.ui_state.follow = false;
            state.ui_state.scroll = state.ui_state.scroll.saturating_sub(n);
        }
        Action::ScrollDown(n) => {
            state.ui_state.follow = false;
            // Clamped against the filtered count at render time
            state.ui_state.scroll = state.ui_state.scroll.saturating_add(n);
        }
        Action::PageUp => {
            state.ui_state.follow = false;
            state.ui_state.scroll = state.ui_state.scroll.saturating_sub(20);
        }
        Action::PageDown => {
            state.ui_state.follow = false;
            state.ui_state.scroll = state.ui_state.scroll.saturating_add(20);
        }
        Action::ScrollToTop => {
            state.ui_state.follow = false;
            state.ui_state.scroll = 0;
        }
        Action::ScrollToBottom => {
            state.ui_state.follow = true;
        }
    }
}

fn render(tui: &mut Tui, state: &mut AppState, buffer: &LogBuffer) -> Result<()> {
    tui.terminal().draw(|frame| {
        LogViewerScreen::render(frame, state, buffer);

        if state.ui_state.help_visible {
            HelpOverlay::render(frame);
        }
    })?;

    Ok(())
}
