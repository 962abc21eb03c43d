use serde::{Deserialize, Serialize};

pub const UNKNOWN_PLAYER: &str = "Unknown Player";
const MISSING_VALUE: &str = "-";

/// One roster entry, sourced verbatim from the remote feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    pub id: String,
    pub name: Option<String>,
    pub image: Option<String>,
    pub position: Option<String>,
    pub nationality: Option<String>,
    pub birth_date: Option<String>,
    pub foot: Option<String>,
    pub body: Option<String>,
    pub market_value: Option<String>,
}

impl Player {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: None,
            image: None,
            position: None,
            nationality: None,
            birth_date: None,
            foot: None,
            body: None,
            market_value: None,
        }
    }

    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(UNKNOWN_PLAYER)
    }

    /// Labelled lines for the expanded player card.
    pub fn detail_rows(&self) -> Vec<(&'static str, &str)> {
        [
            ("Position", &self.position),
            ("Nationality", &self.nationality),
            ("Birth date", &self.birth_date),
            ("Foot", &self.foot),
            ("Height/Weight", &self.body),
            ("Market value", &self.market_value),
        ]
        .into_iter()
        .map(|(label, value)| (label, value.as_deref().unwrap_or(MISSING_VALUE)))
        .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_name_falls_back_to_placeholder() {
        let player = Player::new("7");
        assert_eq!(player.display_name(), UNKNOWN_PLAYER);
    }

    #[test]
    fn detail_rows_fill_missing_values() {
        let mut player = Player::new("7");
        player.position = Some("Forward".to_string());
        let rows = player.detail_rows();
        assert_eq!(rows.len(), 6);
        assert_eq!(rows[0], ("Position", "Forward"));
        assert_eq!(rows[1], ("Nationality", "-"));
    }
}
