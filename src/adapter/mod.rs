//! Adapter layer: per-ruleset override points for question generation,
//! grading, and scoring. The state machine and scoring plumbing live in
//! `match_core`; everything variant-specific, bonuses, multipliers, recess
//! length, lives behind this trait.

mod house_bamzy;
mod standard;

pub use house_bamzy::HouseBamzyAdapter;
pub use standard::StandardAdapter;

use std::collections::HashMap;

use chrono::Duration;

use crate::answer::Answer;
use crate::error::MatchError;
use crate::match_core::MatchMeta;
use crate::question::{Question, QuestionKind};

/// Borrowed view of the mutable parts of a match an adapter is allowed to
/// touch while scoring. Kept separate from `Match` itself so adapter methods
/// never need a `&mut self` back into the struct that owns them.
pub struct Scoreboard<'a> {
    pub home_score: &'a mut f64,
    pub away_score: &'a mut f64,
    pub scorers: &'a mut Vec<Answer>,
}

pub trait Adapter: std::fmt::Debug + Send + Sync {
    /// The `match_type` string this adapter is registered under.
    fn match_type(&self) -> &'static str;

    /// Pause length when transitioning Active to Standby. Zero means no
    /// scheduled resume time is set.
    fn recess_duration(&self) -> Duration {
        Duration::zero()
    }

    /// Produce exactly `rounds * qpr` questions, one `duration` per round
    /// taken from `tpq`, with deterministic ids `q-{round}-{index}`.
    fn fetch_questions(&self, meta: &MatchMeta) -> Vec<Question> {
        let mut questions = Vec::with_capacity(meta.rounds as usize * meta.qpr as usize);
        for round in 0..meta.rounds {
            let duration = meta.tpq[round as usize];
            for index in 0..meta.qpr {
                let id = format!("q-{}-{}", round + 1, index + 1);
                let text = format!("Sample question {}?", questions.len() + 1);
                let options = (1..=4).map(|n| format!("Option {n}")).collect();
                questions.push(Question::new(
                    id,
                    text,
                    meta.ppq,
                    duration,
                    QuestionKind::MultipleChoice {
                        options,
                        correct_option: 0,
                    },
                ));
            }
        }
        questions
    }

    /// Grade a snapshot of submitted answers. Default: for multiple choice,
    /// keep answers matching the correct option, deduplicate by `user_id`
    /// keeping the latest submission per player, sort ascending by
    /// `time_received`, and return only the single earliest correct answer
    /// (first-to-answer wins). Adapters may relax this to return every
    /// correct scorer instead.
    fn pick_correct_answers(
        &self,
        question: &Question,
        answers: Vec<Answer>,
    ) -> Result<Vec<Answer>, MatchError> {
        let correct_option = match question.kind {
            QuestionKind::MultipleChoice { correct_option, .. } => correct_option,
            QuestionKind::PlainText => {
                return Err(MatchError::Internal(format!(
                    "pick_correct_answers has no implementation for plain-text question {}",
                    question.question_id
                )))
            }
        };

        let mut latest_by_player: HashMap<String, Answer> = HashMap::new();
        for answer in answers
            .into_iter()
            .filter(|a| a.selected_option == Some(correct_option))
        {
            latest_by_player
                .entry(answer.player_info.user_id.clone())
                .and_modify(|existing| {
                    if answer.time_received > existing.time_received {
                        *existing = answer.clone();
                    }
                })
                .or_insert(answer);
        }

        let mut sorted: Vec<Answer> = latest_by_player.into_values().collect();
        sorted.sort_by_key(|a| a.time_received);
        Ok(sorted.into_iter().take(1).collect())
    }

    /// Award points for a graded list of correct answers, routing each to
    /// the home or away team by `user_affiliation`, then append it to the
    /// scorer ledger. Returns the (possibly bonus-adjusted) answers, which
    /// become the question's cached `answers`.
    fn record_correct_answers(
        &self,
        mut board: Scoreboard<'_>,
        meta: &MatchMeta,
        question: &Question,
        graded: Vec<Answer>,
    ) -> Vec<Answer> {
        graded
            .into_iter()
            .filter_map(|mut answer| {
                let base_points = if question.points > 0.0 {
                    question.points
                } else {
                    meta.ppq
                };
                answer.base_points = base_points;
                if answer.player_info.user_affiliation == meta.home_team {
                    *board.home_score += base_points;
                    self.bonus_points_home(&mut board, &mut answer, 0.0);
                    board.scorers.push(answer.clone());
                    Some(answer)
                } else if answer.player_info.user_affiliation == meta.away_team {
                    *board.away_score += base_points;
                    self.bonus_points_away(&mut board, &mut answer, 0.0);
                    board.scorers.push(answer.clone());
                    Some(answer)
                } else {
                    None
                }
            })
            .collect()
    }

    /// Add `pts` to both the home team's score and the answer's recorded
    /// bonus. Adapters override this to implement fast-answer bonuses etc.
    fn bonus_points_home(&self, board: &mut Scoreboard<'_>, answer: &mut Answer, pts: f64) {
        answer.bonus_points += pts;
        *board.home_score += pts;
    }

    fn bonus_points_away(&self, board: &mut Scoreboard<'_>, answer: &mut Answer, pts: f64) {
        answer.bonus_points += pts;
        *board.away_score += pts;
    }
}

/// `match_type` to adapter constructor.
pub fn adapter_for(match_type: &str) -> Option<Box<dyn Adapter>> {
    match match_type {
        "Standard" => Some(Box::new(StandardAdapter)),
        "HouseBamzy" => Some(Box::new(HouseBamzyAdapter::default())),
        _ => None,
    }
}
