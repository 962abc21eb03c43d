use std::fs::{self, OpenOptions};
use std::io;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::layout::{Alignment, Constraint, Direction, Layout};
use ratatui::prelude::*;
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use besiktas_roster::config::Config;
use besiktas_roster::kv::JsonFileStore;
use besiktas_roster::observe::Subscription;
use besiktas_roster::roster_fetch::HttpRosterSource;
use besiktas_roster::state::{AppState, Badge, GRID_COLUMNS, NAV_ITEMS, Screen};
use besiktas_roster::{FavoriteSet, FavoritesStore, LoadState, Player, RosterLoader};

const TITLE: &str = "BEŞİKTAŞ APP";
const SPINNER: [char; 4] = ['|', '/', '-', '\\'];
const CARD_HEIGHT: u16 = 5;

struct App {
    state: AppState,
    should_quit: bool,
    loader: RosterLoader,
    favorites: FavoritesStore<JsonFileStore>,
    roster_rx: Subscription<LoadState>,
    favorites_rx: Option<Subscription<FavoriteSet>>,
    roster_url: Option<String>,
    tick: usize,
}

impl App {
    fn new(config: &Config) -> Self {
        let source = HttpRosterSource::new(config.roster_url.clone())
            .with_timeout(config.request_timeout);
        let loader = RosterLoader::new(source);
        let favorites = FavoritesStore::new(JsonFileStore::new(&config.favorites_path));

        let mut state = AppState::new();
        let roster_rx = loader.subscribe();
        let favorites_rx = match favorites.subscribe() {
            Ok(rx) => Some(rx),
            Err(err) => {
                warn!(error = %err, "favorites unavailable");
                state.push_log(format!("[WARN] Favorites unavailable: {err}"));
                None
            }
        };

        Self {
            state,
            should_quit: false,
            loader,
            favorites,
            roster_rx,
            favorites_rx,
            roster_url: config.roster_url.clone(),
            tick: 0,
        }
    }

    fn drain_updates(&mut self) {
        while let Some(next) = self.roster_rx.try_recv() {
            self.state.set_roster(next);
        }
        // Storage may have been repaired since startup.
        if self.favorites_rx.is_none()
            && let Ok(rx) = self.favorites.subscribe()
        {
            info!("favorites storage available");
            self.state.push_log("[INFO] Favorites available");
            self.favorites_rx = Some(rx);
        }
        if let Some(set) = self.favorites_rx.as_ref().and_then(Subscription::latest) {
            self.state.set_favorites(set);
        }
    }

    fn on_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Char(c @ '1'..='4') => {
                let index = c as usize - '1' as usize;
                if let Some(screen) = Screen::from_index(index) {
                    self.state.select_screen(screen);
                }
            }
            KeyCode::Tab => self.state.cycle_screen(),
            KeyCode::Char('r') | KeyCode::Char('R') => self.reload(),
            _ if self.state.screen != Screen::Home => {}
            KeyCode::Char('l') | KeyCode::Right => self.state.select_next(),
            KeyCode::Char('h') | KeyCode::Left => self.state.select_prev(),
            KeyCode::Char('j') | KeyCode::Down => self.state.select_down(),
            KeyCode::Char('k') | KeyCode::Up => self.state.select_up(),
            KeyCode::Enter => self.state.toggle_expanded(),
            KeyCode::Esc => self.state.expanded = None,
            KeyCode::Char('f') | KeyCode::Char('F') => self.toggle_favorite(),
            _ => {}
        }
    }

    fn reload(&mut self) {
        if self.loader.trigger() {
            self.state.push_log("[INFO] Roster request sent");
        } else {
            self.state.push_log("[INFO] Roster request already in flight");
        }
    }

    fn toggle_favorite(&mut self) {
        let Some(player) = self.state.selected_player() else {
            self.state.push_log("[INFO] No player selected");
            return;
        };
        let id = player.id.clone();
        let name = player.display_name().to_string();
        match self.favorites.toggle(&id) {
            Ok(true) => self.state.push_log(format!("[INFO] {name} added to favorites")),
            Ok(false) => self
                .state
                .push_log(format!("[INFO] {name} removed from favorites")),
            Err(err) => {
                warn!(error = %err, id = %id, "favorite toggle failed");
                self.state
                    .push_log(format!("[WARN] Could not save favorites: {err}"));
            }
        }
    }
}

fn main() -> Result<()> {
    let config = Config::from_env().context("failed to read configuration")?;
    init_logging(&config);
    info!(url = ?config.roster_url, favorites = %config.favorites_path.display(), "starting");

    let mut app = App::new(&config);
    app.loader.trigger();

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = ratatui::backend::CrosstermBackend::new(stdout);
    let mut terminal = ratatui::Terminal::new(backend)?;

    let res = run_app(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    res.context("terminal ui failed")
}

// Stdout belongs to the terminal UI, so tracing goes to a file.
fn init_logging(config: &Config) {
    let path = config.log_path();
    if let Some(dir) = path.parent() {
        let _ = fs::create_dir_all(dir);
    }
    let Ok(file) = OpenOptions::new().create(true).append(true).open(&path) else {
        return;
    };
    let filter = EnvFilter::try_new(&config.log_filter).unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .try_init();
}

fn run_app<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> io::Result<()> {
    let tick_rate = Duration::from_millis(120);
    let mut last_tick = Instant::now();

    loop {
        app.drain_updates();

        terminal.draw(|f| ui(f, app))?;

        let timeout = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or(Duration::ZERO);
        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    app.on_key(key);
                }
            }
        }

        if last_tick.elapsed() >= tick_rate {
            app.tick = app.tick.wrapping_add(1);
            last_tick = Instant::now();
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

fn ui(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(1),
            Constraint::Length(4),
            Constraint::Length(3),
            Constraint::Length(1),
        ])
        .split(frame.size());

    let header = Paragraph::new(TITLE)
        .alignment(Alignment::Center)
        .style(
            Style::default()
                .fg(Color::White)
                .bg(Color::Black)
                .add_modifier(Modifier::BOLD),
        )
        .block(Block::default().borders(Borders::BOTTOM));
    frame.render_widget(header, chunks[0]);

    match app.state.screen {
        Screen::Home => render_home(frame, chunks[1], app),
        Screen::News => render_placeholder(frame, chunks[1], "News Screen"),
        Screen::Profile => render_profile(frame, chunks[1], &app.state),
        Screen::Settings => render_settings(frame, chunks[1], app),
    }

    render_console(frame, chunks[2], &app.state);
    render_nav_bar(frame, chunks[3], &app.state);

    let footer = Paragraph::new(footer_text(&app.state))
        .style(Style::default().fg(Color::DarkGray));
    frame.render_widget(footer, chunks[4]);
}

fn footer_text(state: &AppState) -> &'static str {
    match state.screen {
        Screen::Home => {
            "1-4/Tab Screens | h/j/k/l Move | Enter Card | f Favorite | r Reload | q Quit"
        }
        _ => "1-4/Tab Screens | r Reload | q Quit",
    }
}

fn render_home(frame: &mut Frame, area: Rect, app: &App) {
    let state = &app.state;
    match &state.roster {
        LoadState::Empty => {}
        LoadState::Loading => {
            let spinner = SPINNER[app.tick % SPINNER.len()];
            let text = format!("{spinner} Loading players...");
            frame.render_widget(centered_text(text, Style::default()), area);
        }
        LoadState::Failure(message) => {
            let text = format!("{message}\n\nPress r to try again");
            let style = Style::default().fg(Color::Red);
            frame.render_widget(centered_text(text, style), area);
        }
        LoadState::Success(players) if players.is_empty() => {
            let style = Style::default().fg(Color::DarkGray);
            frame.render_widget(centered_text("No players in the roster", style), area);
        }
        LoadState::Success(players) => {
            render_grid(frame, area, state, players);
            if let Some(player) = state
                .expanded
                .as_deref()
                .and_then(|id| players.iter().find(|p| p.id == id))
            {
                render_player_card(frame, area, player, state.is_favorite(&player.id));
            }
        }
    }
}

fn centered_text<'a>(text: impl Into<Text<'a>>, style: Style) -> Paragraph<'a> {
    Paragraph::new(text)
        .alignment(Alignment::Center)
        .style(style)
        .wrap(Wrap { trim: true })
}

fn render_grid(frame: &mut Frame, area: Rect, state: &AppState, players: &[Player]) {
    let visible_rows = usize::from((area.height / CARD_HEIGHT).max(1));
    let selected_row = state.selected / GRID_COLUMNS;
    let first_row = selected_row.saturating_sub(visible_rows - 1);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints(vec![Constraint::Length(CARD_HEIGHT); visible_rows])
        .split(area);

    for (row_offset, row_area) in rows.iter().enumerate() {
        let row = first_row + row_offset;
        let cols = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(*row_area);
        for (col, card_area) in cols.iter().enumerate() {
            let index = row * GRID_COLUMNS + col;
            let Some(player) = players.get(index) else {
                return;
            };
            render_card(
                frame,
                *card_area,
                player,
                index == state.selected,
                state.is_favorite(&player.id),
            );
        }
    }
}

fn render_card(frame: &mut Frame, area: Rect, player: &Player, selected: bool, favorite: bool) {
    let marker = if favorite { "★ " } else { "" };
    let border = if selected {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default().fg(Color::Gray)
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border)
        .title(format!("{marker}{}", player.display_name()));

    let lines = [
        player.position.as_deref().unwrap_or("-"),
        player.nationality.as_deref().unwrap_or("-"),
        player.market_value.as_deref().unwrap_or(""),
    ]
    .join("\n");
    let card = Paragraph::new(lines).block(block);
    frame.render_widget(card, area);
}

fn render_player_card(frame: &mut Frame, area: Rect, player: &Player, favorite: bool) {
    let popup_area = centered_rect(70, 80, area);
    frame.render_widget(Clear, popup_area);

    let mut lines = vec![player.display_name().to_string(), String::new()];
    for (label, value) in player.detail_rows() {
        lines.push(format!("{label}: {value}"));
    }
    if let Some(image) = &player.image {
        lines.push(String::new());
        lines.push(format!("Image: {image}"));
    }
    if favorite {
        lines.push(String::new());
        lines.push("★ Favorite".to_string());
    }

    let card = Paragraph::new(lines.join("\n"))
        .block(Block::default().title("Player").borders(Borders::ALL))
        .wrap(Wrap { trim: false });
    frame.render_widget(card, popup_area);
}

fn render_placeholder(frame: &mut Frame, area: Rect, text: &'static str) {
    frame.render_widget(centered_text(text, Style::default()), area);
}

fn render_profile(frame: &mut Frame, area: Rect, state: &AppState) {
    let mut lines = vec![format!("Favorites ({})", state.favorites.len()), String::new()];
    if state.favorites.is_empty() {
        lines.push("No favorites yet. Press f on a player card.".to_string());
    }
    for id in &state.favorites {
        let name = state
            .players()
            .iter()
            .find(|p| &p.id == id)
            .map(|p| p.display_name().to_string())
            .unwrap_or_else(|| format!("#{id}"));
        lines.push(format!("★ {name}"));
    }
    let profile = Paragraph::new(lines.join("\n"))
        .block(Block::default().title("Profile").borders(Borders::ALL));
    frame.render_widget(profile, area);
}

fn render_settings(frame: &mut Frame, area: Rect, app: &App) {
    let lines = [
        format!(
            "Roster source: {}",
            app.roster_url.as_deref().unwrap_or("(not configured)")
        ),
        format!(
            "Favorites file: {}",
            app.favorites.storage().path().display()
        ),
        format!("Roster state: {}", app.state.roster.label()),
        format!("Fetch attempts: {}", app.loader.fetch_count()),
    ]
    .join("\n");
    let settings = Paragraph::new(lines)
        .block(Block::default().title("Settings").borders(Borders::ALL));
    frame.render_widget(settings, area);
}

fn render_console(frame: &mut Frame, area: Rect, state: &AppState) {
    let block = Block::default().title("Console").borders(Borders::TOP);
    let inner_height = usize::from(area.height.saturating_sub(1));
    let start = state.logs.len().saturating_sub(inner_height);
    let text = state
        .logs
        .iter()
        .skip(start)
        .cloned()
        .collect::<Vec<_>>()
        .join("\n");
    let console = Paragraph::new(text)
        .style(Style::default().fg(Color::DarkGray))
        .block(block);
    frame.render_widget(console, area);
}

fn render_nav_bar(frame: &mut Frame, area: Rect, state: &AppState) {
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Ratio(1, NAV_ITEMS.len() as u32); NAV_ITEMS.len()])
        .split(area);

    for (item, col) in NAV_ITEMS.iter().zip(cols.iter()) {
        let label = match item.badge {
            Badge::None => item.title.to_string(),
            Badge::Dot => format!("{} •", item.title),
            Badge::Count(count) => format!("{} ({count})", item.title),
        };
        let style = if item.screen == state.screen {
            Style::default()
                .fg(Color::Black)
                .bg(Color::White)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        };
        let tab = Paragraph::new(label)
            .alignment(Alignment::Center)
            .style(style)
            .block(Block::default().borders(Borders::TOP));
        frame.render_widget(tab, *col);
    }
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1])[1]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with_favorites(path: std::path::PathBuf) -> Config {
        Config {
            roster_url: None,
            request_timeout: Duration::from_secs(1),
            favorites_path: path,
            log_filter: "info".to_string(),
        }
    }

    #[test]
    fn favorites_stream_recovers_after_storage_is_repaired() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("favorites.json");
        fs::write(&path, "{ broken").expect("write corrupt file");

        let mut app = App::new(&config_with_favorites(path.clone()));
        assert!(app.favorites_rx.is_none());
        app.drain_updates();
        assert!(app.favorites_rx.is_none());

        fs::remove_file(&path).expect("repair storage");
        app.drain_updates();
        assert!(app.favorites_rx.is_some());

        app.favorites.add("10").expect("add");
        app.drain_updates();
        assert!(app.state.is_favorite("10"));
    }
}
