use crate::player::Player;

/// Phase of the roster fetch lifecycle.
///
/// `Empty` is the idle state before anything was triggered and is distinct
/// from `Success` with an empty list.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LoadState {
    #[default]
    Empty,
    Loading,
    Success(Vec<Player>),
    Failure(String),
}

impl LoadState {
    pub fn is_loading(&self) -> bool {
        matches!(self, LoadState::Loading)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, LoadState::Success(_) | LoadState::Failure(_))
    }

    pub fn players(&self) -> &[Player] {
        match self {
            LoadState::Success(players) => players,
            _ => &[],
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            LoadState::Empty => "idle",
            LoadState::Loading => "loading",
            LoadState::Success(_) => "loaded",
            LoadState::Failure(_) => "failed",
        }
    }
}
