//! Current-question lifecycle: advancing the queue, reading the live
//! question, and recording a player's answer.

use chrono::Duration;

use crate::answer::{Answer, PlayerInfo};
use crate::clock::Clock;
use crate::error::MatchError;
use crate::question::QuestionView;

use super::{Match, MatchInner, MatchState};

impl Match {
    /// Pop the next question off `unused`, mark the previous current question
    /// used, and stamp `send_at`. `send_at` defaults to `clock.now()` unless
    /// an explicit value is supplied (used by tests to control timing).
    pub fn prep_next(&self, send_at: Option<chrono::DateTime<chrono::Utc>>, clock: &dyn Clock) -> Result<(), MatchError> {
        let mut inner = self.inner.write();
        self.prep_next_locked(&mut inner, send_at, clock)
    }

    pub(super) fn prep_next_locked(
        &self,
        inner: &mut MatchInner,
        send_at: Option<chrono::DateTime<chrono::Utc>>,
        clock: &dyn Clock,
    ) -> Result<(), MatchError> {
        if inner.state != MatchState::Active {
            return Err(MatchError::BadRequest(
                "match must be active to advance to the next question".into(),
            ));
        }
        if let Some(finished) = inner.current.take() {
            inner.used.push(finished);
        }
        inner.current_answers.clear();

        let Some(mut question) = (if inner.unused.is_empty() {
            None
        } else {
            Some(inner.unused.remove(0))
        }) else {
            return Err(MatchError::BadRequest(
                "no more questions remain in this match".into(),
            ));
        };
        question.send_at = Some(send_at.unwrap_or_else(|| clock.now()));
        inner.current = Some(question);
        Ok(())
    }

    /// Returns the live question, gated by its visibility window:
    /// `NotReady` before `send_at`, `Expired` once `send_at + duration` has
    /// passed (the question is awaiting `verify`).
    pub fn get_current_question(&self, clock: &dyn Clock) -> Result<QuestionView, MatchError> {
        let inner = self.inner.read();
        if inner.state != MatchState::Active {
            return Err(MatchError::BadRequest(
                "match must be active to view the current question".into(),
            ));
        }
        let question = inner
            .current
            .as_ref()
            .ok_or_else(|| MatchError::NotFound("no question is currently active".into()))?;
        let send_at = question
            .send_at
            .ok_or_else(|| MatchError::Internal("current question missing send_at".into()))?;
        let now = clock.now();
        if now < send_at {
            return Err(MatchError::not_ready(send_at));
        }
        if now > send_at + question.duration {
            return Err(MatchError::Conflict(
                "the current question has expired and is awaiting grading".into(),
            ));
        }
        Ok(question.view())
    }

    /// Records (or overwrites) one player's answer to the current question.
    /// Rejects answers from players not affiliated with either team,
    /// answers submitted before the visibility window opens or after it
    /// elapses, and plain-text answers carrying a `selected_option` or vice
    /// versa.
    pub fn store_answer(
        &self,
        player_info: PlayerInfo,
        selected_option: Option<usize>,
        clock: &dyn Clock,
    ) -> Result<(), MatchError> {
        let mut inner = self.inner.write();
        if inner.state != MatchState::Active {
            return Err(MatchError::BadRequest(
                "match must be active to submit an answer".into(),
            ));
        }
        let meta = self.meta();
        if player_info.user_affiliation != meta.home_team
            && player_info.user_affiliation != meta.away_team
        {
            return Err(MatchError::BadRequest(
                "player is not affiliated with either team".into(),
            ));
        }
        let now = clock.now();
        let question = inner
            .current
            .as_ref()
            .ok_or_else(|| MatchError::NotFound("no question is currently active".into()))?;
        let send_at = question
            .send_at
            .ok_or_else(|| MatchError::Internal("current question missing send_at".into()))?;

        if now < send_at {
            return Err(MatchError::too_early(send_at));
        }
        if now - send_at > question.duration {
            return Err(MatchError::BadRequest(
                "answer received after the question's time window".into(),
            ));
        }

        match &question.kind {
            crate::question::QuestionKind::MultipleChoice { options, .. } => {
                match selected_option {
                    Some(idx) if idx < options.len() => {}
                    Some(idx) => {
                        return Err(MatchError::BadRequest(format!(
                            "selected_option {idx} is out of range"
                        )))
                    }
                    None => {
                        return Err(MatchError::BadRequest(
                            "multiple-choice answers require selected_option".into(),
                        ))
                    }
                }
            }
            crate::question::QuestionKind::PlainText => {
                if selected_option.is_some() {
                    return Err(MatchError::BadRequest(
                        "plain-text answers must not carry selected_option".into(),
                    ));
                }
            }
        }

        let answer = Answer::new(player_info.clone(), now, selected_option);
        inner
            .current_answers
            .insert(player_info.user_id.clone(), answer);
        Ok(())
    }

    pub(crate) fn pending_answer_count(&self) -> usize {
        self.inner.read().current_answers.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::StandardAdapter;
    use crate::clock::TestClock;
    use crate::match_core::MatchMeta;

    fn meta() -> MatchMeta {
        MatchMeta {
            match_id: "m1".into(),
            home_team: "Home".into(),
            away_team: "Away".into(),
            rounds: 1,
            qpr: 2,
            tpq: vec![Duration::seconds(30)],
            ppq: 10.0,
            cooldown_duration: Duration::seconds(5),
        }
    }

    #[test]
    fn prep_next_requires_active_state() {
        let m = Match::new(meta(), Box::new(StandardAdapter)).unwrap();
        let clock = TestClock::new(chrono::Utc::now());
        assert!(m.prep_next(None, &clock).is_err());
    }

    #[test]
    fn store_answer_rejects_out_of_range_option() {
        let m = Match::new(meta(), Box::new(StandardAdapter)).unwrap();
        let clock = TestClock::new(chrono::Utc::now());
        m.transition_to(MatchState::Standby, &clock).unwrap();
        m.transition_to(MatchState::Active, &clock).unwrap();
        let player = PlayerInfo {
            user_id: "u1".into(),
            user_name: "alice".into(),
            user_affiliation: "Home".into(),
        };
        let err = m.store_answer(player, Some(99), &clock).unwrap_err();
        assert!(matches!(err, MatchError::BadRequest(_)));
    }
}
