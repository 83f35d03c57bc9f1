use std::io;
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

use crossterm::event::{self, Event as CEvent, KeyCode, KeyEvent, KeyEventKind};
use crossterm::execute;
use crossterm::terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen};
use tui::backend::{Backend, CrosstermBackend};
use tui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use tui::style::{Color, Modifier, Style};
use tui::text::{Span, Spans};
use tui::widgets::{BarChart, Block, Borders, Cell, List, ListItem, ListState, Paragraph, Row, Table, Wrap};
use tui::{Frame, Terminal};

use crate::aggregate::{histogram, BoxSummary, ChartSet, Dashboard, ValueGroup};
use crate::board::{Board, SelectionHandler};
use crate::error::AppError;

const TEXT: Color = Color::Rgb(0xEE, 0xEE, 0xEE);
const PANEL: Color = Color::Rgb(0x39, 0x3E, 0x46);
const ACCENT: Color = Color::Rgb(0x00, 0xAD, 0xB5);

const NO_DATA: &str = "No data for the current selection";
const CHART_TITLES: [&str; 5] = [
    "Salary distribution (USD)",
    "Salary by experience level",
    "Top 10 locations by mean salary",
    "Salary by work modality",
    "Mean salary by country",
];

enum Event<I> {
    Input(I),
    Tick,
}

#[derive(Copy, Clone, Debug, PartialEq)]
enum Focus {
    Year,
    Experience,
    Location,
}

impl From<Focus> for usize {
    fn from(input: Focus) -> usize {
        match input {
            Focus::Year => 0,
            Focus::Experience => 1,
            Focus::Location => 2,
        }
    }
}

impl Focus {
    fn next(self) -> Self {
        match self {
            Focus::Year => Focus::Experience,
            Focus::Experience => Focus::Location,
            Focus::Location => Focus::Year,
        }
    }

    fn prev(self) -> Self {
        match self {
            Focus::Year => Focus::Location,
            Focus::Experience => Focus::Year,
            Focus::Location => Focus::Experience,
        }
    }

    fn title(self) -> &'static str {
        match self {
            Focus::Year => "Year(s)",
            Focus::Experience => "Experience level",
            Focus::Location => "Location(s), follows year and experience",
        }
    }
}

/// Terminal-side state: the board plus list cursors and focus.
pub struct App<'a> {
    board: Board<'a>,
    years: Vec<i32>,
    experience: Vec<&'static str>,
    focus: Focus,
    lists: [ListState; 3],
    bins: usize,
}

impl<'a> App<'a> {
    pub fn new(board: Board<'a>, bins: usize) -> Self {
        let years = board.dataset().year_options();
        let experience = board.dataset().experience_options();
        let mut app = App {
            board,
            years,
            experience,
            focus: Focus::Year,
            lists: [ListState::default(), ListState::default(), ListState::default()],
            bins,
        };
        app.clamp_cursors();
        app
    }

    fn option_count(&self, focus: Focus) -> usize {
        match focus {
            Focus::Year => self.years.len(),
            Focus::Experience => self.experience.len(),
            Focus::Location => self.board.location_options.len(),
        }
    }

    fn clamp_cursors(&mut self) {
        for focus in [Focus::Year, Focus::Experience, Focus::Location] {
            let len = self.option_count(focus);
            let state = &mut self.lists[usize::from(focus)];
            let selected = match (len, state.selected()) {
                (0, _) => None,
                (_, None) => Some(0),
                (len, Some(idx)) => Some(idx.min(len - 1)),
            };
            state.select(selected);
        }
    }

    fn move_cursor(&mut self, delta: isize) {
        let len = self.option_count(self.focus) as isize;
        let state = &mut self.lists[usize::from(self.focus)];
        if len == 0 {
            state.select(None);
            return;
        }
        let current = state.selected().unwrap_or(0) as isize;
        state.select(Some((current + delta).rem_euclid(len) as usize));
    }

    fn toggle_current(&mut self) {
        let Some(idx) = self.lists[usize::from(self.focus)].selected() else {
            return;
        };
        match self.focus {
            Focus::Year => {
                if let Some(year) = self.years.get(idx).copied() {
                    self.board.toggle_year(year);
                }
            }
            Focus::Experience => {
                if let Some(label) = self.experience.get(idx).copied() {
                    self.board.toggle_experience(label);
                }
            }
            Focus::Location => {
                if let Some(location) = self.board.location_options.get(idx).cloned() {
                    self.board.toggle_location(&location);
                }
            }
        }
        self.clamp_cursors();
    }

    /// Applies one key press. Returns `false` when the user asked to quit.
    pub fn handle_key(&mut self, code: KeyCode) -> bool {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => return false,
            KeyCode::Tab | KeyCode::Right => self.focus = self.focus.next(),
            KeyCode::BackTab | KeyCode::Left => self.focus = self.focus.prev(),
            KeyCode::Down | KeyCode::Char('j') => self.move_cursor(1),
            KeyCode::Up | KeyCode::Char('k') => self.move_cursor(-1),
            KeyCode::Char(' ') | KeyCode::Enter => self.toggle_current(),
            KeyCode::Char('c') => {
                self.board.clear();
                self.clamp_cursors();
            }
            _ => {}
        }
        true
    }
}

pub fn run(app: &mut App, tick_rate: Duration) -> Result<(), AppError> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    let result = event_loop(&mut terminal, app, tick_rate);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    result
}

fn event_loop<B: Backend>(terminal: &mut Terminal<B>, app: &mut App, tick_rate: Duration) -> Result<(), AppError> {
    let (tx, rx) = mpsc::channel::<Event<KeyEvent>>();
    thread::spawn(move || {
        let mut last_tick = Instant::now();
        loop {
            let timeout = tick_rate
                .checked_sub(last_tick.elapsed())
                .unwrap_or_else(|| Duration::from_secs(0));

            match event::poll(timeout) {
                Ok(true) => {
                    if let Ok(CEvent::Key(key)) = event::read() {
                        if tx.send(Event::Input(key)).is_err() {
                            break;
                        }
                    }
                }
                Ok(false) => {}
                Err(e) => {
                    log::error!("Terminal input failed: {e}");
                    break;
                }
            }

            if last_tick.elapsed() >= tick_rate {
                if tx.send(Event::Tick).is_err() {
                    break;
                }
                last_tick = Instant::now();
            }
        }
    });

    loop {
        terminal.draw(|f| draw(f, app))?;
        match rx.recv()? {
            Event::Input(key) if key.kind == KeyEventKind::Press => {
                if !app.handle_key(key.code) {
                    break;
                }
            }
            Event::Input(_) | Event::Tick => {}
        }
    }
    Ok(())
}

fn panel(title: &str) -> Block<'_> {
    Block::default()
        .title(Span::styled(title, Style::default().fg(TEXT).add_modifier(Modifier::BOLD)))
        .borders(Borders::ALL)
        .style(Style::default().bg(PANEL).fg(TEXT))
}

fn placeholder(title: &str) -> Paragraph<'_> {
    Paragraph::new(NO_DATA)
        .block(panel(title))
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
}

fn halves(area: Rect) -> Vec<Rect> {
    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)].as_ref())
        .split(area)
}

fn draw<B: Backend>(f: &mut Frame<B>, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints(
            [
                Constraint::Length(3),
                Constraint::Percentage(20),
                Constraint::Percentage(25),
                Constraint::Percentage(25),
                Constraint::Min(6),
            ]
            .as_ref(),
        )
        .split(f.size());

    draw_header(f, app, chunks[0]);
    draw_filters(f, app, chunks[1]);

    let top = halves(chunks[2]);
    let middle = halves(chunks[3]);
    let areas = [top[0], top[1], middle[0], middle[1], chunks[4]];

    match &app.board.dashboard {
        Dashboard::Empty => {
            for (area, title) in areas.iter().zip(CHART_TITLES) {
                f.render_widget(placeholder(title), *area);
            }
        }
        Dashboard::Charts(set) => {
            draw_distribution(f, set, app.bins, areas[0]);
            draw_boxes(f, &set.by_experience, CHART_TITLES[1], areas[1]);
            draw_top_locations(f, set, areas[2]);
            draw_boxes(f, &set.by_remote_type, CHART_TITLES[3], areas[3]);
            draw_countries(f, set, areas[4]);
        }
    }
}

fn draw_header<B: Backend>(f: &mut Frame<B>, app: &App, area: Rect) {
    let dataset = app.board.dataset();
    let line = Spans::from(vec![
        Span::styled(
            "Data Science Salary Board",
            Style::default().fg(ACCENT).add_modifier(Modifier::BOLD),
        ),
        Span::raw(format!(
            "  {} of {} rows  loaded {}  ",
            app.board.matched,
            dataset.records().len(),
            dataset.loaded_at().format("%H:%M:%S")
        )),
        Span::styled(
            "Tab focus  Space toggle  c clear  q quit",
            Style::default().fg(Color::DarkGray),
        ),
    ]);
    let header = Paragraph::new(line)
        .block(Block::default().borders(Borders::ALL).style(Style::default().fg(TEXT)))
        .alignment(Alignment::Center);
    f.render_widget(header, area);
}

fn draw_filters<B: Backend>(f: &mut Frame<B>, app: &mut App, area: Rect) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(
            [
                Constraint::Ratio(1, 3),
                Constraint::Ratio(1, 3),
                Constraint::Ratio(1, 3),
            ]
            .as_ref(),
        )
        .split(area);

    let selection = &app.board.selection;
    let entries: [Vec<(String, bool)>; 3] = [
        app.years
            .iter()
            .map(|y| (y.to_string(), selection.years.contains(y)))
            .collect(),
        app.experience
            .iter()
            .map(|l| (l.to_string(), selection.experience.contains(*l)))
            .collect(),
        app.board
            .location_options
            .iter()
            .map(|l| (l.clone(), selection.locations.contains(l)))
            .collect(),
    ];

    for (idx, focus) in [Focus::Year, Focus::Experience, Focus::Location].into_iter().enumerate() {
        let items: Vec<ListItem> = entries[idx]
            .iter()
            .map(|(text, checked)| {
                let mark = if *checked { "[x] " } else { "[ ] " };
                ListItem::new(format!("{mark}{text}"))
            })
            .collect();
        let border = if focus == app.focus {
            Style::default().fg(ACCENT)
        } else {
            Style::default().fg(TEXT)
        };
        let list = List::new(items)
            .block(Block::default().title(focus.title()).borders(Borders::ALL).border_style(border))
            .highlight_style(Style::default().fg(Color::Black).bg(ACCENT))
            .highlight_symbol("> ");
        f.render_stateful_widget(list, columns[idx], &mut app.lists[idx]);
    }
}

// Box strip drawn above the histogram, spanning the same salary range.
fn distribution_box_line(set: &ChartSet, width: usize) -> Option<String> {
    let summary = BoxSummary::from_values(&set.distribution)?;
    Some(box_plot_row(&summary, summary.min, summary.max, width))
}

fn draw_distribution<B: Backend>(f: &mut Frame<B>, set: &ChartSet, bins: usize, area: Rect) {
    let block = panel(CHART_TITLES[0]);
    let inner = block.inner(area);
    f.render_widget(block, area);
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Min(0)].as_ref())
        .split(inner);

    if let Some(line) = distribution_box_line(set, rows[0].width as usize) {
        f.render_widget(
            Paragraph::new(Span::styled(line, Style::default().fg(ACCENT))).style(Style::default().bg(PANEL)),
            rows[0],
        );
    }

    let buckets = histogram(&set.distribution, bins);
    let labels: Vec<String> = buckets.iter().map(|b| short_salary(b.start)).collect();
    let data: Vec<(&str, u64)> = labels
        .iter()
        .zip(&buckets)
        .map(|(label, bucket)| (label.as_str(), bucket.count))
        .collect();
    let slots = data.len().max(1) as u16;
    let bar_width = (rows[1].width / slots).saturating_sub(1).max(1);
    let chart = BarChart::default()
        .data(&data)
        .bar_width(bar_width)
        .bar_gap(1)
        .bar_style(Style::default().fg(ACCENT))
        .value_style(Style::default().fg(Color::Black).bg(ACCENT))
        .label_style(Style::default().fg(TEXT));
    f.render_widget(chart, rows[1]);
}

/// One text row of a horizontal box plot scaled to `[lo, hi]`.
fn box_plot_row(summary: &BoxSummary, lo: f64, hi: f64, width: usize) -> String {
    if width == 0 {
        return String::new();
    }
    let pos = |v: f64| -> usize {
        if hi <= lo {
            width / 2
        } else {
            (((v - lo) / (hi - lo)) * (width - 1) as f64).round() as usize
        }
    };
    let mut cells = vec![' '; width];
    for cell in &mut cells[pos(summary.lower_whisker)..=pos(summary.upper_whisker)] {
        *cell = '─';
    }
    for cell in &mut cells[pos(summary.q1)..=pos(summary.q3)] {
        *cell = '█';
    }
    cells[pos(summary.median)] = '┃';
    if summary.min < summary.lower_whisker {
        cells[pos(summary.min)] = '•';
    }
    if summary.max > summary.upper_whisker {
        cells[pos(summary.max)] = '•';
    }
    cells.into_iter().collect()
}

fn draw_boxes<B: Backend>(f: &mut Frame<B>, groups: &[ValueGroup], title: &str, area: Rect) {
    let summaries: Vec<(&str, BoxSummary)> = groups
        .iter()
        .filter_map(|g| BoxSummary::from_values(&g.values).map(|s| (g.label, s)))
        .collect();
    let lo = summaries.iter().map(|(_, s)| s.min).fold(f64::INFINITY, f64::min);
    let hi = summaries.iter().map(|(_, s)| s.max).fold(f64::NEG_INFINITY, f64::max);

    let label_width = 16;
    let value_width = 12;
    let plot_width = (area.width as usize).saturating_sub(label_width + value_width + 4);

    let mut lines = Vec::new();
    for (label, summary) in &summaries {
        lines.push(Spans::from(vec![
            Span::styled(format!("{label:<label_width$}"), Style::default().fg(TEXT)),
            Span::styled(box_plot_row(summary, lo, hi, plot_width), Style::default().fg(ACCENT)),
            Span::raw(format!(" {:>w$}", format_salary(summary.median), w = value_width - 1)),
        ]));
        lines.push(Spans::from(Span::styled(
            format!(
                "{:label_width$}q1 {}  q3 {}  n={}",
                "",
                format_salary(summary.q1),
                format_salary(summary.q3),
                groups.iter().find(|g| g.label == *label).map_or(0, |g| g.values.len())
            ),
            Style::default().fg(Color::DarkGray),
        )));
    }
    if lines.is_empty() {
        lines.push(Spans::from("No labeled rows in this selection"));
    }
    f.render_widget(Paragraph::new(lines).block(panel(title)), area);
}

fn draw_top_locations<B: Backend>(f: &mut Frame<B>, set: &ChartSet, area: Rect) {
    let max = set.top_locations.iter().map(|l| l.mean).fold(0.0, f64::max);
    let bar_room = (area.width as usize).saturating_sub(6 + 14 + 4).max(1);
    let rows: Vec<Row> = set
        .top_locations
        .iter()
        .map(|l| {
            let filled = if max > 0.0 {
                ((l.mean / max) * bar_room as f64).round() as usize
            } else {
                0
            };
            Row::new(vec![
                Cell::from(l.location.clone()),
                Cell::from("█".repeat(filled.max(1))).style(Style::default().fg(ACCENT)),
                Cell::from(format_salary(l.mean)),
            ])
        })
        .collect();
    let widths = [
        Constraint::Length(6),
        Constraint::Length(bar_room as u16),
        Constraint::Length(14),
    ];
    let table = Table::new(rows).block(panel(CHART_TITLES[2])).widths(&widths);
    f.render_widget(table, area);
}

/// Position on a light-to-dark blue ramp for `t` in `[0, 1]`.
fn blues(t: f64) -> Color {
    let t = t.clamp(0.0, 1.0);
    let lerp = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * t).round() as u8;
    Color::Rgb(lerp(198, 8), lerp(219, 48), lerp(239, 107))
}

fn draw_countries<B: Backend>(f: &mut Frame<B>, set: &ChartSet, area: Rect) {
    let lo = set.by_country.iter().map(|c| c.mean).fold(f64::INFINITY, f64::min);
    let hi = set.by_country.iter().map(|c| c.mean).fold(f64::NEG_INFINITY, f64::max);

    let mut countries: Vec<_> = set.by_country.iter().collect();
    countries.sort_by(|a, b| b.mean.total_cmp(&a.mean));

    let rows: Vec<Row> = countries
        .iter()
        .map(|c| {
            let t = if hi > lo { (c.mean - lo) / (hi - lo) } else { 1.0 };
            let shade = blues(t);
            let ink = if t > 0.5 { Color::White } else { Color::Black };
            Row::new(vec![
                Cell::from(c.iso_alpha3),
                Cell::from(c.location.clone()),
                Cell::from(format_salary(c.mean)).style(Style::default().bg(shade).fg(ink)),
                Cell::from(c.count.to_string()),
            ])
        })
        .collect();
    let header = Row::new(vec!["ISO3", "Code", "Mean salary (USD)", "Records"])
        .style(Style::default().fg(ACCENT).add_modifier(Modifier::BOLD));
    let widths = [
        Constraint::Length(6),
        Constraint::Length(6),
        Constraint::Length(20),
        Constraint::Length(10),
    ];
    let table = Table::new(rows)
        .header(header)
        .block(panel(CHART_TITLES[4]))
        .widths(&widths);
    f.render_widget(table, area);
}

pub fn format_salary(value: f64) -> String {
    let whole = value.round() as i64;
    let digits = whole.abs().to_string();
    let mut grouped = String::new();
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    let sign = if whole < 0 { "-" } else { "" };
    format!("{sign}${grouped}")
}

fn short_salary(value: f64) -> String {
    if value.abs() >= 1000.0 {
        format!("{:.0}k", value / 1000.0)
    } else {
        format!("{value:.0}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::{record, SalaryDataSet};
    use crate::filter::Selection;

    fn dataset() -> SalaryDataSet {
        SalaryDataSet::new(vec![
            record(2023, "EN", 0, "US", 60000.0),
            record(2024, "SE", 50, "DE", 90000.0),
            record(2024, "EX", 100, "GB", 250000.0),
        ])
    }

    #[test]
    fn formats_salaries_with_separators() {
        assert_eq!(format_salary(0.0), "$0");
        assert_eq!(format_salary(999.4), "$999");
        assert_eq!(format_salary(1234567.0), "$1,234,567");
        assert_eq!(format_salary(100000.0), "$100,000");
        assert_eq!(short_salary(125000.0), "125k");
        assert_eq!(short_salary(512.0), "512");
    }

    #[test]
    fn box_row_marks_quartiles_and_median() {
        let summary = BoxSummary::from_values(&[0.0, 10.0, 20.0, 30.0, 40.0]).unwrap();
        let row = box_plot_row(&summary, 0.0, 40.0, 41);
        let cells: Vec<char> = row.chars().collect();
        assert_eq!(cells.len(), 41);
        assert_eq!(cells[0], '─');
        assert_eq!(cells[10], '█');
        assert_eq!(cells[20], '┃');
        assert_eq!(cells[30], '█');
        assert_eq!(cells[40], '─');
        assert_eq!(box_plot_row(&summary, 0.0, 40.0, 0), "");
    }

    #[test]
    fn distribution_panel_has_box_strip() {
        let data = dataset();
        let board = Board::new(&data, Selection::default());
        let Dashboard::Charts(set) = &board.dashboard else {
            panic!("expected charts");
        };
        let line = distribution_box_line(set, 20).unwrap();
        assert_eq!(line.chars().count(), 20);
        assert!(line.contains('┃'));
        assert!(line.contains('█'));

        let empty = ChartSet {
            distribution: Vec::new(),
            by_experience: Vec::new(),
            top_locations: Vec::new(),
            by_remote_type: Vec::new(),
            by_country: Vec::new(),
        };
        assert_eq!(distribution_box_line(&empty, 20), None);
    }

    #[test]
    fn blue_ramp_endpoints() {
        assert_eq!(blues(0.0), Color::Rgb(198, 219, 239));
        assert_eq!(blues(1.0), Color::Rgb(8, 48, 107));
        assert_eq!(blues(3.0), blues(1.0));
    }

    #[test]
    fn keys_drive_the_board() {
        let data = dataset();
        let mut app = App::new(Board::new(&data, Selection::default()), 10);
        assert_eq!(app.lists[0].selected(), Some(0));

        // Select 2024 on the year list.
        assert!(app.handle_key(KeyCode::Down));
        assert!(app.handle_key(KeyCode::Char(' ')));
        assert!(app.board.selection.years.contains(&2024));
        assert_eq!(app.board.matched, 2);
        assert_eq!(app.board.location_options, vec!["DE", "GB"]);

        // Move to locations and pick the second entry.
        app.handle_key(KeyCode::Tab);
        app.handle_key(KeyCode::Tab);
        assert_eq!(app.focus, Focus::Location);
        app.handle_key(KeyCode::Up);
        assert_eq!(app.lists[2].selected(), Some(1));
        app.handle_key(KeyCode::Enter);
        assert!(app.board.selection.locations.contains("GB"));
        assert_eq!(app.board.matched, 1);

        app.handle_key(KeyCode::Char('c'));
        assert_eq!(app.board.matched, 3);
        assert!(!app.handle_key(KeyCode::Char('q')));
    }

    #[test]
    fn location_cursor_stays_in_range_when_options_shrink() {
        let data = dataset();
        let mut app = App::new(Board::new(&data, Selection::default()), 10);
        app.focus = Focus::Location;
        app.handle_key(KeyCode::Up);
        assert_eq!(app.lists[2].selected(), Some(2));

        app.focus = Focus::Year;
        app.handle_key(KeyCode::Char(' '));
        assert_eq!(app.board.location_options, vec!["US"]);
        assert_eq!(app.lists[2].selected(), Some(0));
    }
}
