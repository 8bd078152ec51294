mod app;
mod msg;

use std::io;
use std::path::PathBuf;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use anyhow::Result;
use crossterm::event::{
    self, DisableFocusChange, DisableMouseCapture, EnableFocusChange, EnableMouseCapture, Event,
};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;

use app::App;
use caretline::EngineConfig;
use msg::Msg;

/// Tick period. Engine timers fire no faster than this.
const TICK: Duration = Duration::from_millis(10);

fn main() -> Result<()> {
    let config = EngineConfig::load()?;

    // Initialize logging to file (never stdout)
    let log_dir = directories::ProjectDirs::from("", "", "caretline")
        .map(|d| d.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("/tmp"));
    std::fs::create_dir_all(&log_dir)?;

    let file_appender = tracing_appender::rolling::daily(&log_dir, "caretline.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_env_filter(config.log.filter.as_str())
        .init();

    tracing::info!("caretline starting");

    let path = std::env::args().nth(1).map(PathBuf::from);

    // Terminal setup
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture, EnableFocusChange)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run(&mut terminal, config, path);

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        DisableFocusChange,
        DisableMouseCapture,
        LeaveAlternateScreen
    )?;
    terminal.show_cursor()?;

    if let Err(e) = result {
        tracing::error!("caretline error: {e:?}");
        eprintln!("caretline error: {e:?}");
    }

    Ok(())
}

fn run(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    config: EngineConfig,
    path: Option<PathBuf>,
) -> Result<()> {
    let (tx, rx) = mpsc::channel::<Msg>();
    let size = terminal.size()?;
    let mut app = App::new(config, path.as_deref(), (size.width, size.height))?;

    // Input thread: reads terminal events and forwards as Msg
    let tx_input = tx.clone();
    thread::spawn(move || {
        loop {
            if let Ok(event) = event::read() {
                let msg = match event {
                    Event::Key(k) => Msg::Key(k),
                    Event::Mouse(m) => Msg::Mouse(m),
                    Event::Resize(w, h) => Msg::Resize(w, h),
                    Event::FocusLost => Msg::FocusLost,
                    Event::FocusGained => Msg::FocusGained,
                    Event::Paste(_) => continue,
                };
                if tx_input.send(msg).is_err() {
                    break;
                }
            }
        }
    });

    // Tick thread: drives the engine's timers
    let tx_tick = tx.clone();
    thread::spawn(move || {
        loop {
            thread::sleep(TICK);
            if tx_tick.send(Msg::Tick).is_err() {
                break;
            }
        }
    });

    terminal.draw(|f| app.view(f))?;

    // ── Main event loop ──
    loop {
        // Batch-drain all pending messages; ticks only redraw when the engine asks
        let first = rx.recv()?;
        let mut dirty = !matches!(first, Msg::Tick);
        app.update(first)?;

        while let Ok(msg) = rx.try_recv() {
            dirty |= !matches!(msg, Msg::Tick);
            app.update(msg)?;
        }

        if app.should_quit {
            tracing::info!("caretline exiting");
            break;
        }

        if app.needs_redraw() || dirty {
            terminal.draw(|f| app.view(f))?;
        }
    }

    Ok(())
}
