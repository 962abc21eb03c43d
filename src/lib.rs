pub mod config;
pub mod error;
pub mod favorites;
pub mod http_client;
pub mod kv;
pub mod load_state;
pub mod observe;
pub mod player;
pub mod roster;
pub mod roster_fetch;
pub mod state;

pub use error::{PersistenceError, RosterError};
pub use favorites::{FavoriteSet, FavoritesStore};
pub use load_state::LoadState;
pub use player::Player;
pub use roster::{RosterLoader, RosterSource};
