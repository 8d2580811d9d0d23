//! Full-screen live view of the throughput sampler.

use std::io;
use std::time::{Duration, Instant};

use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    layout::{Alignment, Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table},
    Frame, Terminal,
};

use crate::display::{sample_columns, SAMPLE_HEADERS};
use crate::stats::{CounterSource, InterfaceSample, Sampler, Snapshot};

const COLUMN_WIDTHS: [u16; 11] = [20, 10, 10, 12, 10, 12, 10, 10, 12, 10, 12];

pub fn draw(f: &mut Frame, interfaces: &[String], snapshot: Option<&Snapshot>) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(3), Constraint::Length(1)])
        .split(f.size());

    let status = match snapshot {
        Some(s) => format!(
            "Time: {}   Sample: {}   Interval: {:.1}s",
            s.taken_at.format("%Y-%m-%d %H:%M:%S"),
            s.sample,
            s.interval.as_secs_f64()
        ),
        None => "Waiting for first sample...".to_string(),
    };
    let header = Paragraph::new(status).block(
        Block::default()
            .title(format!(" UE Traffic ({} interfaces) ", interfaces.len()))
            .borders(Borders::ALL),
    );
    f.render_widget(header, chunks[0]);

    let head = Row::new(SAMPLE_HEADERS.iter().enumerate().map(|(i, title)| {
        let line = Line::from(*title);
        Cell::from(if i == 0 { line } else { line.alignment(Alignment::Right) })
    }))
    .style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD));

    let rows: Vec<Row> = match snapshot {
        Some(s) => s.rows.iter().map(|row| sample_row(row, s.interval)).collect(),
        None => interfaces
            .iter()
            .map(|name| Row::new([Cell::from(name.as_str())]))
            .collect(),
    };

    let table = Table::new(rows, COLUMN_WIDTHS.map(Constraint::Length))
        .header(head)
        .block(Block::default().title(" Interfaces ").borders(Borders::ALL));
    f.render_widget(table, chunks[1]);

    let footer = Paragraph::new(Line::from(vec![
        Span::styled(" q ", Style::default().fg(Color::Black).bg(Color::Cyan)),
        Span::raw(" quit"),
    ]));
    f.render_widget(footer, chunks[2]);
}

fn sample_row(row: &InterfaceSample, interval: Duration) -> Row<'static> {
    let style = match row {
        InterfaceSample::Unavailable { .. } => Style::default().fg(Color::DarkGray),
        InterfaceSample::Available { .. } => Style::default(),
    };
    let mut cells = vec![Cell::from(row.name().to_string()).style(Style::default().fg(Color::Cyan))];
    cells.extend(
        sample_columns(row, interval)
            .into_iter()
            .map(|value| Cell::from(Line::from(value).alignment(Alignment::Right))),
    );
    Row::new(cells).style(style)
}

fn quit_requested(code: KeyCode, modifiers: KeyModifiers) -> bool {
    match code {
        KeyCode::Char('q') | KeyCode::Esc => true,
        KeyCode::Char('c') => modifiers.contains(KeyModifiers::CONTROL),
        _ => false,
    }
}

/// Sample on every tick until `limit` samples (zero: until the operator
/// quits). Returns the last snapshot taken.
pub fn run(
    sampler: &mut Sampler,
    source: &impl CounterSource,
    limit: u64,
) -> io::Result<Option<Snapshot>> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout))?;

    let result = event_loop(&mut terminal, sampler, source, limit);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn event_loop<B: Backend>(
    terminal: &mut Terminal<B>,
    sampler: &mut Sampler,
    source: &impl CounterSource,
    limit: u64,
) -> io::Result<Option<Snapshot>> {
    let interfaces = sampler.interfaces().to_vec();
    let mut last: Option<Snapshot> = None;
    let mut next_tick = Instant::now() + sampler.interval();

    terminal.clear()?;
    loop {
        terminal.draw(|f| draw(f, &interfaces, last.as_ref()))?;

        let wait = next_tick.saturating_duration_since(Instant::now());
        if event::poll(wait)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press && quit_requested(key.code, key.modifiers) {
                    return Ok(last);
                }
            }
            continue;
        }

        last = Some(sampler.sample(source));
        next_tick += sampler.interval();
        if sampler.done(limit) {
            terminal.draw(|f| draw(f, &interfaces, last.as_ref()))?;
            return Ok(last);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::Counters;
    use chrono::Local;
    use ratatui::backend::TestBackend;

    fn screen(terminal: &Terminal<TestBackend>) -> String {
        let buffer = terminal.backend().buffer();
        let width = buffer.area.width as usize;
        buffer
            .content
            .chunks(width)
            .map(|line| line.iter().map(|cell| cell.symbol()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn test_draw_waiting() {
        let mut terminal = Terminal::new(TestBackend::new(160, 12)).unwrap();
        let interfaces = vec!["val0000000001".to_string()];
        terminal.draw(|f| draw(f, &interfaces, None)).unwrap();

        let text = screen(&terminal);
        assert!(text.contains("UE Traffic (1 interfaces)"));
        assert!(text.contains("Waiting for first sample"));
        assert!(text.contains("val0000000001"));
    }

    #[test]
    fn test_draw_snapshot() {
        let snapshot = Snapshot {
            sample: 4,
            taken_at: Local::now(),
            interval: Duration::from_secs(1),
            rows: vec![
                InterfaceSample::Available {
                    name: "val0000000001".into(),
                    totals: Counters { rx_packets: 100, rx_bytes: 2048, tx_packets: 50, tx_bytes: 1024 },
                    delta: Counters { rx_packets: 10, rx_bytes: 1024, tx_packets: 5, tx_bytes: 512 },
                },
                InterfaceSample::Unavailable { name: "val0000000002".into() },
            ],
        };
        let mut terminal = Terminal::new(TestBackend::new(160, 12)).unwrap();
        let interfaces = vec!["val0000000001".to_string(), "val0000000002".to_string()];
        terminal.draw(|f| draw(f, &interfaces, Some(&snapshot))).unwrap();

        let text = screen(&terminal);
        assert!(text.contains("Sample: 4"));
        assert!(text.contains("RX pkts"));
        assert!(text.contains("1,024.0/s"));
        assert!(text.contains("N/A"));
    }

    #[test]
    fn test_quit_keys() {
        assert!(quit_requested(KeyCode::Char('q'), KeyModifiers::NONE));
        assert!(quit_requested(KeyCode::Esc, KeyModifiers::NONE));
        assert!(quit_requested(KeyCode::Char('c'), KeyModifiers::CONTROL));
        assert!(!quit_requested(KeyCode::Char('c'), KeyModifiers::NONE));
        assert!(!quit_requested(KeyCode::Down, KeyModifiers::NONE));
    }
}
