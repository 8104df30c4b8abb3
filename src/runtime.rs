use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use std::io::{self, Stdout};
use std::sync::mpsc::Receiver;
use std::time::Duration;

use crate::app::{App, InputMode};
use crate::board::FetchCycle;
use crate::clock::today_utc;
use crate::ui;

pub fn init_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;
    Ok(terminal)
}

pub fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

pub fn run_app(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    mut app: App,
    rx: Receiver<FetchCycle>,
) -> Result<()> {
    let tick_rate = Duration::from_millis(100);
    loop {
        while let Ok(cycle) = rx.try_recv() {
            app.apply_cycle(cycle, today_utc());
        }

        terminal.draw(|f| ui::ui(f, &app))?;

        if !event::poll(tick_rate)? {
            continue;
        }
        let Event::Key(key) = event::read()? else {
            continue;
        };
        if key.kind != KeyEventKind::Press {
            continue;
        }
        match app.input_mode {
            InputMode::Normal => match key.code {
                KeyCode::Char('q') => return Ok(()),
                KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                    return Ok(())
                }
                KeyCode::Char('a') | KeyCode::Char('/') => app.start_airport_edit(),
                KeyCode::Char('r') => app.request_refresh(),
                KeyCode::Char('w') => app.save_airport(),
                KeyCode::Char('?') | KeyCode::Char('h') => app.open_help(),
                _ => {}
            },
            InputMode::Airport => match key.code {
                KeyCode::Enter => app.apply_airport_edit(),
                KeyCode::Esc => app.cancel_airport_edit(),
                KeyCode::Backspace => app.backspace_airport(),
                KeyCode::Char(ch) if key.modifiers.contains(KeyModifiers::CONTROL) => {
                    if ch == 'u' {
                        app.clear_airport_edit();
                    }
                }
                KeyCode::Char(ch) => app.push_airport_char(ch),
                _ => {}
            },
            InputMode::Help => match key.code {
                KeyCode::Esc | KeyCode::Char('?') | KeyCode::Char('h') | KeyCode::Char('q') => {
                    app.close_help()
                }
                _ => {}
            },
        }
    }
}
