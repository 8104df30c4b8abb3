use chrono::{DateTime, Local};
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, Cell, Clear, Paragraph, Row, Table, Wrap};
use ratatui::Frame;
use std::time::{Duration, SystemTime};

use crate::app::{App, InputMode};
use crate::fids::RowSet;
use crate::squawk::EmergencySquawk;
use crate::status::StatusClass;

struct Theme {
    accent: Color,
    warn: Color,
    danger: Color,
    ok: Color,
    dim: Color,
    header_bg: Color,
    panel_bg: Color,
    row_even_bg: Color,
    row_odd_bg: Color,
}

const THEME: Theme = Theme {
    accent: Color::Cyan,
    warn: Color::Yellow,
    danger: Color::LightRed,
    ok: Color::Green,
    dim: Color::DarkGray,
    header_bg: Color::Rgb(17, 24, 39),
    panel_bg: Color::Rgb(31, 41, 55),
    row_even_bg: Color::Rgb(31, 41, 55),
    row_odd_bg: Color::Rgb(38, 48, 63),
};

pub fn ui(f: &mut Frame, app: &App) {
    let size = f.area();
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(9),
            Constraint::Min(8),
            Constraint::Length(8),
            Constraint::Length(1),
        ])
        .split(size);

    render_header(f, chunks[0], app);
    render_weather(f, chunks[1], app);
    render_flights(f, chunks[2], app);
    render_squawks(f, chunks[3], app);
    render_footer(f, chunks[4], app);

    match app.input_mode {
        InputMode::Airport => render_airport_prompt(f, size, app),
        InputMode::Help => render_help_menu(f, size),
        InputMode::Normal => {}
    }
}

fn render_header(f: &mut Frame, area: Rect, app: &App) {
    let updated = app
        .last_update
        .map(format_system_time)
        .unwrap_or_else(|| "--".to_string());
    let (state, state_color) = if app.fetching {
        ("FETCHING", THEME.warn)
    } else {
        ("OK", THEME.ok)
    };

    let line = Line::from(vec![
        Span::styled(
            "AIRPORT OPS ",
            Style::default()
                .fg(THEME.accent)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            app.airport.clone(),
            Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
        ),
        Span::raw("  "),
        Span::styled(
            format!("{} ({})", app.operator.name, app.operator.prefix),
            Style::default().fg(THEME.dim),
        ),
        Span::raw("  UPDATED "),
        Span::styled(updated, Style::default().fg(Color::White)),
        Span::raw("  "),
        Span::styled(state, Style::default().fg(state_color)),
    ]);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .style(Style::default().bg(THEME.header_bg));
    f.render_widget(Paragraph::new(line).block(block), area);
}

fn render_weather(f: &mut Frame, area: Rect, app: &App) {
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);

    let (metar, taf) = match &app.board {
        Some(board) => (board.metar.as_str(), board.taf.as_str()),
        None => ("Loading...", "Loading..."),
    };
    render_text_panel(f, cols[0], "METAR", metar);
    render_text_panel(f, cols[1], "TAF", taf);
}

fn render_text_panel(f: &mut Frame, area: Rect, title: &str, text: &str) {
    let style = if text.starts_with("Error") {
        Style::default().fg(THEME.danger)
    } else {
        Style::default().fg(Color::White)
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Plain)
        .title(title.to_string())
        .style(Style::default().bg(THEME.panel_bg));
    let paragraph = Paragraph::new(text.to_string())
        .style(style)
        .block(block)
        .wrap(Wrap { trim: false });
    f.render_widget(paragraph, area);
}

fn render_flights(f: &mut Frame, area: Rect, app: &App) {
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);

    let title_dep = format!("DEPARTURES ({})", app.airport);
    let title_arr = format!("ARRIVALS ({})", app.airport);
    match &app.board {
        Some(board) => {
            render_row_set(f, cols[0], &title_dep, "TO", &board.departures);
            render_row_set(f, cols[1], &title_arr, "FROM", &board.arrivals);
        }
        None => {
            render_text_panel(f, cols[0], &title_dep, "Loading...");
            render_text_panel(f, cols[1], &title_arr, "Loading...");
        }
    }
}

fn render_row_set(f: &mut Frame, area: Rect, title: &str, counterpart: &str, rows: &RowSet) {
    let rows = match rows {
        RowSet::Empty(message) => {
            render_text_panel(f, area, title, message);
            return;
        }
        RowSet::Rows(rows) => rows,
    };

    let header = header_row(&["FLIGHT", counterpart, "TIME", "STATUS"]);
    let body = rows.iter().enumerate().map(|(i, row)| {
        let style = striped(i).fg(status_color(row.status_class));
        Row::new(vec![
            Cell::from(row.flight.clone()),
            Cell::from(row.counterpart_airport.clone()),
            Cell::from(row.time.clone()),
            Cell::from(row.status.clone()),
        ])
        .style(style)
    });

    let table = Table::new(
        body,
        [
            Constraint::Length(8),
            Constraint::Length(5),
            Constraint::Length(5),
            Constraint::Min(10),
        ],
    )
    .header(header)
    .block(panel_block(title))
    .column_spacing(1)
    .style(Style::default().bg(THEME.panel_bg));
    f.render_widget(table, area);
}

fn render_squawks(f: &mut Frame, area: Rect, app: &App) {
    let title = "EMERGENCY SQUAWKS (OpenSky)";
    let Some(board) = &app.board else {
        render_text_panel(f, area, title, "Loading...");
        return;
    };
    let list = match &board.squawks {
        Err(message) => {
            render_text_panel(f, area, title, message);
            return;
        }
        Ok(list) if list.is_empty() => {
            render_text_panel(f, area, title, "No emergencies detected.");
            return;
        }
        Ok(list) => list,
    };

    let header = header_row(&["CALLSIGN", "SQUAWK", "ICAO24", "MEANING"]);
    let body = list.iter().enumerate().map(|(i, squawk)| squawk_row(i, squawk));
    let table = Table::new(
        body,
        [
            Constraint::Length(10),
            Constraint::Length(6),
            Constraint::Length(8),
            Constraint::Min(12),
        ],
    )
    .header(header)
    .block(panel_block(title))
    .column_spacing(1)
    .style(Style::default().bg(THEME.panel_bg));
    f.render_widget(table, area);
}

fn squawk_row(i: usize, squawk: &EmergencySquawk) -> Row<'static> {
    let callsign = if squawk.callsign.is_empty() {
        "--".to_string()
    } else {
        squawk.callsign.clone()
    };
    Row::new(vec![
        Cell::from(callsign),
        Cell::from(squawk.squawk_code.clone()),
        Cell::from(squawk.transponder_id.clone()),
        Cell::from(squawk.meaning()),
    ])
    .style(
        striped(i)
            .fg(THEME.danger)
            .add_modifier(Modifier::BOLD),
    )
}

fn render_footer(f: &mut Frame, area: Rect, app: &App) {
    let mut spans = vec![Span::styled(
        format!(
            "q quit  a airport  r refresh  w save airport  ? help  REF {}s",
            app.refresh.as_secs()
        ),
        Style::default().fg(THEME.dim),
    )];
    if let Some(message) = app.recent_status(Duration::from_secs(6)) {
        spans.push(Span::raw("  "));
        spans.push(Span::styled(
            message.to_string(),
            Style::default()
                .fg(THEME.accent)
                .add_modifier(Modifier::BOLD),
        ));
    }
    let paragraph = Paragraph::new(Line::from(spans)).style(Style::default().bg(THEME.header_bg));
    f.render_widget(paragraph, area);
}

fn render_airport_prompt(f: &mut Frame, area: Rect, app: &App) {
    let popup = centered_rect(40, 3, area);
    f.render_widget(Clear, popup);
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .title("AIRPORT (ICAO or IATA, Enter to apply)")
        .style(Style::default().bg(THEME.header_bg));
    let line = Line::from(vec![
        Span::styled(
            app.airport_edit.clone(),
            Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
        ),
        Span::styled("_", Style::default().fg(THEME.accent)),
    ]);
    f.render_widget(Paragraph::new(line).block(block), popup);
}

fn render_help_menu(f: &mut Frame, area: Rect) {
    let items = [
        ("q", "quit"),
        ("a, /", "change airport"),
        ("Enter", "apply airport"),
        ("Esc", "cancel / close"),
        ("Ctrl-u", "clear airport input"),
        ("r", "refresh now"),
        ("w", "save airport to config file"),
        ("?, h", "toggle help"),
    ];
    let lines: Vec<Line> = items
        .iter()
        .map(|(key, what)| {
            Line::from(vec![
                Span::styled(format!("{key:<8}"), Style::default().fg(THEME.accent)),
                Span::raw(*what),
            ])
        })
        .collect();
    let popup = centered_rect(50, lines.len() as u16 + 2, area);
    f.render_widget(Clear, popup);
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .title("HELP")
        .style(Style::default().bg(THEME.header_bg));
    f.render_widget(Paragraph::new(lines).block(block), popup);
}

fn header_row(labels: &[&str]) -> Row<'static> {
    let cells = labels.iter().map(|label| {
        Cell::from(label.to_string()).style(
            Style::default()
                .fg(THEME.accent)
                .bg(THEME.header_bg)
                .add_modifier(Modifier::BOLD),
        )
    });
    Row::new(cells)
        .style(Style::default().bg(THEME.header_bg))
        .height(1)
}

fn panel_block(title: &str) -> Block<'static> {
    Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Plain)
        .title(title.to_string())
        .style(Style::default().bg(THEME.panel_bg))
}

fn striped(i: usize) -> Style {
    if i % 2 == 0 {
        Style::default().bg(THEME.row_even_bg)
    } else {
        Style::default().bg(THEME.row_odd_bg)
    }
}

fn status_color(class: StatusClass) -> Color {
    match class {
        StatusClass::Delayed => THEME.danger,
        StatusClass::Expected => THEME.warn,
        StatusClass::Departed => THEME.ok,
        StatusClass::None => Color::White,
    }
}

fn centered_rect(percent_x: u16, height: u16, area: Rect) -> Rect {
    let height = height.min(area.height.saturating_sub(2)).max(3);
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(1),
            Constraint::Length(height),
            Constraint::Min(1),
        ])
        .split(area);
    let vertical = popup_layout[1];
    let scaled = u32::from(vertical.width) * u32::from(percent_x) / 100;
    let width = u16::try_from(scaled).unwrap_or(u16::MAX).max(20);
    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Min(1),
            Constraint::Length(width),
            Constraint::Min(1),
        ])
        .split(vertical);
    horizontal[1]
}

fn format_system_time(time: SystemTime) -> String {
    let dt: DateTime<Local> = time.into();
    dt.format("%H:%M:%S").to_string()
}
