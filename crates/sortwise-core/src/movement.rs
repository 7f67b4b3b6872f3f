//! Card movement events captured during a sorting session.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One drag of a card into a category, as recorded by the capturing UI.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CardMovement {
    /// Card that was moved.
    pub card_id: String,
    /// Display text of the card at the time of the move.
    pub card_label: String,
    /// Category the card came from. `None` for the first placement.
    #[serde(default)]
    pub from_category: Option<String>,
    /// Category the card was dropped into.
    pub to_category: String,
    /// Wall-clock time of the move.
    pub timestamp: DateTime<Utc>,
    /// Monotonically increasing position of this move in the session.
    pub movement_index: u32,
    /// Participant performing the move.
    pub participant_id: String,
    /// Capture session identifier.
    pub session_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn movement_serde_roundtrip() {
        let movement = CardMovement {
            card_id: "1".into(),
            card_label: "Apple".into(),
            from_category: None,
            to_category: "Fruit".into(),
            timestamp: Utc.timestamp_opt(1_700_000_000, 0).unwrap(),
            movement_index: 0,
            participant_id: "p1".into(),
            session_id: "sess-1".into(),
        };
        let json = serde_json::to_string(&movement).unwrap();
        let deserialized: CardMovement = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized.card_id, "1");
        assert_eq!(deserialized.from_category, None);
        assert_eq!(deserialized.movement_index, 0);
    }
}
