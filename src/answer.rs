//! Answer model: an immutable-in-practice record of one player's
//! submission to a question, plus the points it was eventually awarded.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Snapshot of the submitting player's identity, taken at submission time so
/// later team/roster changes can't retroactively alter a graded answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerInfo {
    pub user_id: String,
    pub user_name: String,
    pub user_affiliation: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Answer {
    pub player_info: PlayerInfo,
    pub time_received: DateTime<Utc>,
    #[serde(default)]
    pub base_points: f64,
    #[serde(default)]
    pub bonus_points: f64,
    /// Populated only for multiple-choice questions.
    #[serde(default)]
    pub selected_option: Option<usize>,
}

impl Answer {
    pub fn new(
        player_info: PlayerInfo,
        time_received: DateTime<Utc>,
        selected_option: Option<usize>,
    ) -> Self {
        Self {
            player_info,
            time_received,
            base_points: 0.0,
            bonus_points: 0.0,
            selected_option,
        }
    }

    pub fn total_points(&self) -> f64 {
        self.base_points + self.bonus_points
    }
}

/// The JSON shape returned from grading: `user_id` is stripped so
/// the client never has to handle a second identifier for the same player.
#[derive(Debug, PartialEq, Serialize)]
pub struct AnswerView {
    pub player_info: PublicPlayerInfo,
    pub time_received: DateTime<Utc>,
}

#[derive(Debug, PartialEq, Serialize)]
pub struct PublicPlayerInfo {
    pub user_name: String,
    pub user_affiliation: String,
}

impl From<&Answer> for AnswerView {
    fn from(a: &Answer) -> Self {
        AnswerView {
            player_info: PublicPlayerInfo {
                user_name: a.player_info.user_name.clone(),
                user_affiliation: a.player_info.user_affiliation.clone(),
            },
            time_received: a.time_received,
        }
    }
}
