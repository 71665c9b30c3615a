//! Read-only JSON projections of a [`Match`]: `MatchShort` for `GET
//! /matches` and the default `GET /matches/{id}` mode, `MatchExtended` adding
//! the current question and its answers (each `{error}` shaped when the
//! match isn't ready for either).

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::answer::AnswerView;
use crate::clock::Clock;
use crate::question::QuestionView;

use super::Match;

#[derive(Debug, Serialize)]
pub struct MatchShort {
    pub match_id: String,
    pub home_team: String,
    pub away_team: String,
    pub home_score: f64,
    pub away_score: f64,
    pub rounds: u32,
    pub state: i8,
    pub scorers: Vec<AnswerView>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub progress: String,
}

#[derive(Debug, Serialize)]
pub struct MatchExtended {
    #[serde(flatten)]
    pub short: MatchShort,
    pub question: QuestionOrError,
    pub answers: AnswersOrError,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum QuestionOrError {
    Question(QuestionView),
    Error { error: String },
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum AnswersOrError {
    Answers(Vec<AnswerView>),
    Error { error: String },
}

impl Match {
    pub fn to_short(&self) -> MatchShort {
        let meta = self.meta();
        let (used, total) = self.progress();
        MatchShort {
            match_id: meta.match_id,
            home_team: meta.home_team,
            away_team: meta.away_team,
            home_score: self.home_score(),
            away_score: self.away_score(),
            rounds: meta.rounds,
            state: self.state().code(),
            scorers: self.scorers().iter().map(AnswerView::from).collect(),
            start_time: self.start_time(),
            end_time: self.end_time(),
            progress: format!("{used}/{total}"),
        }
    }

    /// Reads the current question, then grades it through `verify`. A
    /// "cannot verify yet" failure is folded into the answers field rather
    /// than returned as an error.
    pub fn to_extended(&self, clock: &dyn Clock) -> MatchExtended {
        let question = match self.get_current_question(clock) {
            Ok(view) => QuestionOrError::Question(view),
            Err(e) => QuestionOrError::Error {
                error: e.to_string(),
            },
        };

        let current_id = self.inner.read().current.as_ref().map(|q| q.question_id.clone());
        let answers = match current_id {
            Some(id) => match self.verify(Some(&id), clock) {
                Ok(views) => AnswersOrError::Answers(views),
                Err(e) => AnswersOrError::Error {
                    error: e.to_string(),
                },
            },
            None => AnswersOrError::Error {
                error: "no current question".into(),
            },
        };

        let short = self.to_short();

        MatchExtended {
            short,
            question,
            answers,
        }
    }
}
