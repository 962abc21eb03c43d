use std::collections::VecDeque;

use crate::favorites::FavoriteSet;
use crate::load_state::LoadState;
use crate::player::Player;

pub const GRID_COLUMNS: usize = 2;
const MAX_LOGS: usize = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Home,
    News,
    Profile,
    Settings,
}

impl Screen {
    pub const ALL: [Screen; 4] = [Screen::Home, Screen::News, Screen::Profile, Screen::Settings];

    pub fn route(self) -> &'static str {
        match self {
            Screen::Home => "home",
            Screen::News => "news",
            Screen::Profile => "profile",
            Screen::Settings => "settings",
        }
    }

    pub fn index(self) -> usize {
        match self {
            Screen::Home => 0,
            Screen::News => 1,
            Screen::Profile => 2,
            Screen::Settings => 3,
        }
    }

    pub fn from_index(index: usize) -> Option<Screen> {
        Self::ALL.get(index).copied()
    }

    pub fn next(self) -> Screen {
        Self::ALL[(self.index() + 1) % Self::ALL.len()]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Badge {
    None,
    Dot,
    Count(u32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NavItem {
    pub title: &'static str,
    pub screen: Screen,
    pub badge: Badge,
}

pub const NAV_ITEMS: [NavItem; 4] = [
    NavItem {
        title: "Ana Sayfa",
        screen: Screen::Home,
        badge: Badge::None,
    },
    NavItem {
        title: "Haberler",
        screen: Screen::News,
        badge: Badge::Count(15),
    },
    NavItem {
        title: "Profil",
        screen: Screen::Profile,
        badge: Badge::None,
    },
    NavItem {
        title: "Ayarlar",
        screen: Screen::Settings,
        badge: Badge::Dot,
    },
];

/// Everything the terminal front-end renders, fed from the loader and store streams.
#[derive(Debug, Clone)]
pub struct AppState {
    pub screen: Screen,
    pub roster: LoadState,
    pub favorites: FavoriteSet,
    pub selected: usize,
    pub expanded: Option<String>,
    pub logs: VecDeque<String>,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

impl AppState {
    pub fn new() -> Self {
        Self {
            screen: Screen::Home,
            roster: LoadState::Empty,
            favorites: FavoriteSet::new(),
            selected: 0,
            expanded: None,
            logs: VecDeque::new(),
        }
    }

    pub fn players(&self) -> &[Player] {
        self.roster.players()
    }

    pub fn selected_player(&self) -> Option<&Player> {
        self.players().get(self.selected)
    }

    pub fn is_favorite(&self, id: &str) -> bool {
        self.favorites.contains(id)
    }

    pub fn set_roster(&mut self, roster: LoadState) {
        match &roster {
            LoadState::Loading => self.push_log("[INFO] Loading roster"),
            LoadState::Success(players) => {
                self.push_log(format!("[INFO] Roster loaded: {} players", players.len()))
            }
            LoadState::Failure(message) => self.push_log(format!("[WARN] {message}")),
            LoadState::Empty => {}
        }
        // Keep the selection on the same player across reloads when possible.
        let selected_id = self.selected_player().map(|p| p.id.clone());
        self.roster = roster;
        if let Some(id) = selected_id
            && let Some(idx) = self.players().iter().position(|p| p.id == id)
        {
            self.selected = idx;
        }
        let expanded_gone = self
            .expanded
            .as_ref()
            .is_some_and(|id| !self.players().iter().any(|p| &p.id == id));
        if expanded_gone {
            self.expanded = None;
        }
        self.clamp_selection();
    }

    pub fn set_favorites(&mut self, favorites: FavoriteSet) {
        self.favorites = favorites;
    }

    pub fn select_screen(&mut self, screen: Screen) {
        self.screen = screen;
        self.expanded = None;
    }

    pub fn cycle_screen(&mut self) {
        self.select_screen(self.screen.next());
    }

    pub fn select_next(&mut self) {
        let len = self.players().len();
        if len > 0 && self.selected + 1 < len {
            self.selected += 1;
        }
    }

    pub fn select_prev(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    pub fn select_down(&mut self) {
        let len = self.players().len();
        if self.selected + GRID_COLUMNS < len {
            self.selected += GRID_COLUMNS;
        }
    }

    pub fn select_up(&mut self) {
        if self.selected >= GRID_COLUMNS {
            self.selected -= GRID_COLUMNS;
        }
    }

    pub fn clamp_selection(&mut self) {
        let len = self.players().len();
        if len == 0 {
            self.selected = 0;
        } else if self.selected >= len {
            self.selected = len - 1;
        }
    }

    /// Expands the selected card, or collapses it if it already is.
    pub fn toggle_expanded(&mut self) {
        let Some(id) = self.selected_player().map(|p| p.id.clone()) else {
            return;
        };
        if self.expanded.as_deref() == Some(id.as_str()) {
            self.expanded = None;
        } else {
            self.expanded = Some(id);
        }
    }

    pub fn push_log(&mut self, msg: impl Into<String>) {
        self.logs.push_back(msg.into());
        while self.logs.len() > MAX_LOGS {
            self.logs.pop_front();
        }
    }
}
