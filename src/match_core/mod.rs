//! The match state machine and scoring core. Holds the two
//! question queues, the current question, the in-flight answer map, team
//! scores, and the scorer ledger behind a single `RwLock`, plus a dedicated
//! [`GradingGate`](crate::grading_gate::GradingGate) for `verify`'s
//! at-most-once grading guarantee.

mod dto;
mod questions;
mod verify;

pub use dto::{MatchExtended, MatchShort};

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize, Serializer};

use crate::adapter::Adapter;
use crate::answer::Answer;
use crate::clock::Clock;
use crate::error::MatchError;
use crate::grading_gate::GradingGate;
use crate::question::Question;

/// Static configuration for a match: teams, round structure, timing. Not
/// itself mutable through the state machine; `update_fields` replaces it
/// wholesale while Suspended.
#[derive(Debug, Clone)]
pub struct MatchMeta {
    pub match_id: String,
    pub home_team: String,
    pub away_team: String,
    pub rounds: u32,
    pub qpr: u32,
    pub tpq: Vec<Duration>,
    pub ppq: f64,
    pub cooldown_duration: Duration,
}

impl MatchMeta {
    pub fn validate(&self) -> Result<(), MatchError> {
        if self.match_id.trim().is_empty() {
            return Err(MatchError::BadRequest("match_id is required".into()));
        }
        if self.home_team.trim().is_empty() || self.away_team.trim().is_empty() {
            return Err(MatchError::BadRequest(
                "home_team and away_team are required".into(),
            ));
        }
        if self.rounds == 0 {
            return Err(MatchError::BadRequest(
                "rounds must be a positive integer".into(),
            ));
        }
        if self.qpr == 0 {
            return Err(MatchError::BadRequest(
                "qpr must be a positive integer".into(),
            ));
        }
        if self.tpq.len() < self.rounds as usize {
            return Err(MatchError::BadRequest(
                "tpq must have at least as many entries as rounds".into(),
            ));
        }
        if self.tpq.iter().any(|d| *d <= Duration::zero()) {
            return Err(MatchError::BadRequest(
                "every tpq entry must be a positive duration".into(),
            ));
        }
        if self.ppq < 0.0 {
            return Err(MatchError::BadRequest("ppq must be non-negative".into()));
        }
        Ok(())
    }
}

/// Optional field updates applied to a Suspended match. Updating non-state
/// attributes requires the match to be Suspended first.
#[derive(Debug, Default, Deserialize)]
pub struct MatchFieldUpdate {
    pub home_team: Option<String>,
    pub away_team: Option<String>,
    pub rounds: Option<u32>,
    pub qpr: Option<u32>,
    pub tpq: Option<Vec<f64>>,
    pub ppq: Option<f64>,
    pub cooldown_duration: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i8)]
pub enum MatchState {
    Cancelled = -99,
    Suspended = -1,
    Upcoming = 0,
    Standby = 1,
    Active = 2,
    Completed = 99,
}

impl MatchState {
    pub fn code(self) -> i8 {
        self as i8
    }
}

impl TryFrom<i8> for MatchState {
    type Error = MatchError;

    fn try_from(value: i8) -> Result<Self, Self::Error> {
        match value {
            -99 => Ok(Self::Cancelled),
            -1 => Ok(Self::Suspended),
            0 => Ok(Self::Upcoming),
            1 => Ok(Self::Standby),
            2 => Ok(Self::Active),
            99 => Ok(Self::Completed),
            other => Err(MatchError::BadRequest(format!(
                "invalid state value {other}"
            ))),
        }
    }
}

impl Serialize for MatchState {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i8(self.code())
    }
}

impl<'de> Deserialize<'de> for MatchState {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = i8::deserialize(deserializer)?;
        MatchState::try_from(raw).map_err(serde::de::Error::custom)
    }
}

#[derive(Debug)]
pub(crate) struct MatchInner {
    pub(crate) state: MatchState,
    pub(crate) home_score: f64,
    pub(crate) away_score: f64,
    pub(crate) scorers: Vec<Answer>,
    pub(crate) unused: Vec<Question>,
    pub(crate) used: Vec<Question>,
    pub(crate) current: Option<Question>,
    pub(crate) current_answers: HashMap<String, Answer>,
    pub(crate) start_time: Option<DateTime<Utc>>,
    pub(crate) end_time: Option<DateTime<Utc>>,
}

impl MatchInner {
    fn fresh() -> Self {
        Self {
            state: MatchState::Upcoming,
            home_score: 0.0,
            away_score: 0.0,
            scorers: Vec::new(),
            unused: Vec::new(),
            used: Vec::new(),
            current: None,
            current_answers: HashMap::new(),
            start_time: None,
            end_time: None,
        }
    }
}

#[derive(Debug)]
pub struct Match {
    meta: RwLock<MatchMeta>,
    adapter: Box<dyn Adapter>,
    grading_gate: GradingGate,
    inner: RwLock<MatchInner>,
}

impl Match {
    pub fn new(meta: MatchMeta, adapter: Box<dyn Adapter>) -> Result<Self, MatchError> {
        meta.validate()?;
        Ok(Self {
            meta: RwLock::new(meta),
            adapter,
            grading_gate: GradingGate::default(),
            inner: RwLock::new(MatchInner::fresh()),
        })
    }

    /// Snapshot of the match's static configuration.
    pub fn meta(&self) -> MatchMeta {
        self.meta.read().clone()
    }

    pub fn match_id(&self) -> String {
        self.meta.read().match_id.clone()
    }

    pub fn state(&self) -> MatchState {
        self.inner.read().state
    }

    pub fn start_time(&self) -> Option<DateTime<Utc>> {
        self.inner.read().start_time
    }

    pub fn end_time(&self) -> Option<DateTime<Utc>> {
        self.inner.read().end_time
    }

    pub fn home_score(&self) -> f64 {
        self.inner.read().home_score
    }

    pub fn away_score(&self) -> f64 {
        self.inner.read().away_score
    }

    pub fn scorers(&self) -> Vec<Answer> {
        self.inner.read().scorers.clone()
    }

    pub fn progress(&self) -> (usize, usize) {
        let inner = self.inner.read();
        let total = inner.unused.len()
            + inner.used.len()
            + usize::from(inner.current.is_some());
        (inner.used.len(), total)
    }

    pub fn used_question_ids(&self) -> Vec<String> {
        self.inner
            .read()
            .used
            .iter()
            .map(|q| q.question_id.clone())
            .collect()
    }

    /// Rejects all transitions the matrix below doesn't name.
    pub fn transition_to(&self, target: MatchState, clock: &dyn Clock) -> Result<(), MatchError> {
        use MatchState::*;
        let mut inner = self.inner.write();
        match (inner.state, target) {
            (Upcoming, Standby) | (Suspended, Standby) => self.do_init(&mut inner),
            (Standby, Upcoming) => self.do_reset(&mut inner),
            (Standby, Active) | (Suspended, Active) => self.do_start(&mut inner, clock),
            (Active, Standby) => self.do_pause(&mut inner, clock),
            (Standby, Suspended) | (Active, Suspended) => self.do_suspend(&mut inner),
            (Active, Completed) | (Suspended, Completed) => self.do_end(&mut inner, clock),
            (Suspended, Cancelled) | (Upcoming, Cancelled) | (Standby, Cancelled) => {
                self.do_cancel(&mut inner)
            }
            (from, to) if from == to => Err(MatchError::BadRequest(
                "match is already in the desired state".into(),
            )),
            (from, to) => Err(MatchError::BadRequest(format!(
                "illegal transition from {} to {}",
                from.code(),
                to.code()
            ))),
        }
    }

    /// Non-state field updates, only permitted while Suspended.
    pub fn update_fields(&self, update: MatchFieldUpdate) -> Result<(), MatchError> {
        if self.inner.read().state != MatchState::Suspended {
            return Err(MatchError::BadRequest(
                "match must be suspended to update other attributes".into(),
            ));
        }

        let mut candidate = self.meta();
        if let Some(home_team) = update.home_team {
            candidate.home_team = home_team;
        }
        if let Some(away_team) = update.away_team {
            candidate.away_team = away_team;
        }
        if let Some(rounds) = update.rounds {
            candidate.rounds = rounds;
        }
        if let Some(qpr) = update.qpr {
            candidate.qpr = qpr;
        }
        if let Some(tpq) = update.tpq {
            candidate.tpq = tpq
                .into_iter()
                .map(|secs| Duration::milliseconds((secs * 1000.0) as i64))
                .collect();
        }
        if let Some(ppq) = update.ppq {
            candidate.ppq = ppq;
        }
        if let Some(cooldown) = update.cooldown_duration {
            candidate.cooldown_duration = Duration::milliseconds((cooldown * 1000.0) as i64);
        }

        candidate.validate()?;
        *self.meta.write() = candidate;
        Ok(())
    }

    pub(crate) fn with_adapter<R>(&self, f: impl FnOnce(&dyn Adapter) -> R) -> R {
        f(self.adapter.as_ref())
    }

    fn do_init(&self, inner: &mut MatchInner) -> Result<(), MatchError> {
        inner.home_score = 0.0;
        inner.away_score = 0.0;
        inner.scorers.clear();
        inner.current = None;
        inner.current_answers.clear();
        inner.used.clear();
        inner.unused = self.adapter.fetch_questions(&self.meta());
        inner.state = MatchState::Standby;
        Ok(())
    }

    fn do_reset(&self, inner: &mut MatchInner) -> Result<(), MatchError> {
        *inner = MatchInner::fresh();
        Ok(())
    }

    fn do_start(&self, inner: &mut MatchInner, clock: &dyn Clock) -> Result<(), MatchError> {
        let meta = self.meta();
        match inner.start_time {
            Some(start_time) if clock.now() < start_time => {
                return Err(MatchError::try_again_at(start_time));
            }
            Some(_) => {}
            None => {
                inner.start_time = Some(clock.now() + meta.cooldown_duration);
            }
        }
        if meta.home_team.trim().is_empty() || meta.away_team.trim().is_empty() {
            return Err(MatchError::BadRequest(
                "both teams must be defined to start the match".into(),
            ));
        }
        inner.state = MatchState::Active;
        self.prep_next_locked(inner, None, clock)
    }

    fn do_pause(&self, inner: &mut MatchInner, clock: &dyn Clock) -> Result<(), MatchError> {
        inner.state = MatchState::Standby;
        let recess = self.adapter.recess_duration();
        if recess > Duration::zero() {
            inner.start_time = Some(clock.now() + recess);
        }
        Ok(())
    }

    fn do_suspend(&self, inner: &mut MatchInner) -> Result<(), MatchError> {
        inner.state = MatchState::Suspended;
        Ok(())
    }

    fn do_cancel(&self, inner: &mut MatchInner) -> Result<(), MatchError> {
        inner.state = MatchState::Cancelled;
        Ok(())
    }

    fn do_end(&self, inner: &mut MatchInner, clock: &dyn Clock) -> Result<(), MatchError> {
        if inner.end_time.is_none() {
            inner.end_time = Some(clock.now());
        }
        inner.state = MatchState::Completed;
        Ok(())
    }
}
