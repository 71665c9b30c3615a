//! Verification and grading, the concurrency-sensitive path.
//!
//! `verify` is safe under concurrent callers and idempotent: once a question
//! is graded, every subsequent call returns the cached answer list without
//! re-scoring or re-advancing. The whole critical section runs under
//! [`GradingGate`](crate::grading_gate::GradingGate), acquired before the
//! state lock, so racing callers serialize fully; the loser simply observes
//! `graded == true` and returns.

use crate::adapter::Scoreboard;
use crate::answer::{Answer, AnswerView};
use crate::clock::Clock;
use crate::error::MatchError;

use super::{Match, MatchState};

impl Match {
    /// Grade the current question (or, if `question_id` names an already
    /// completed one, replay its cached result) and advance the match to
    /// the next question.
    pub fn verify(
        &self,
        question_id: Option<&str>,
        clock: &dyn Clock,
    ) -> Result<Vec<AnswerView>, MatchError> {
        let _gate = self.grading_gate.enter();
        let mut guard = self.inner.write();
        let inner = &mut *guard;

        if let Some(qid) = question_id {
            if let Some(past) = inner.used.iter().find(|q| q.question_id == qid) {
                if past.graded {
                    return Ok(past.answers_view());
                }
                let available_at = past
                    .expires_at()
                    .ok_or_else(|| MatchError::Internal("used question missing send_at".into()))?;
                return Err(MatchError::not_yet_verified(available_at));
            }

            let current_id = inner.current.as_ref().map(|q| q.question_id.as_str());
            if current_id != Some(qid) {
                return Err(MatchError::UnknownQuestion(qid.to_string()));
            }
        }

        if inner.state != MatchState::Active {
            return Err(MatchError::BadRequest(
                "match must be active to verify a question".into(),
            ));
        }

        let question = inner
            .current
            .as_ref()
            .ok_or_else(|| MatchError::NotFound("no current question to verify".into()))?;

        if question.graded {
            return Ok(question.answers_view());
        }

        let send_at = question
            .send_at
            .ok_or_else(|| MatchError::Internal("current question missing send_at".into()))?;
        let available_at = send_at + question.duration;
        if clock.now() < available_at {
            return Err(MatchError::too_early(available_at));
        }

        let mut graded_question = question.clone();
        let snapshot: Vec<Answer> = inner.current_answers.values().cloned().collect();

        let correct = self
            .adapter
            .pick_correct_answers(&graded_question, snapshot)?;

        let meta = self.meta();
        let board = Scoreboard {
            home_score: &mut inner.home_score,
            away_score: &mut inner.away_score,
            scorers: &mut inner.scorers,
        };
        let awarded = self
            .adapter
            .record_correct_answers(board, &meta, &graded_question, correct);

        let views: Vec<AnswerView> = awarded.iter().map(AnswerView::from).collect();
        graded_question.answers = awarded;
        graded_question.graded = true;
        inner.current = Some(graded_question);

        if self.prep_next_locked(inner, None, clock).is_err() {
            if inner.end_time.is_none() {
                inner.end_time = Some(clock.now());
            }
            inner.state = MatchState::Completed;
        }

        Ok(views)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};

    use super::*;
    use crate::adapter::StandardAdapter;
    use crate::answer::PlayerInfo;
    use crate::clock::TestClock;
    use crate::match_core::{MatchMeta, MatchState};

    fn meta() -> MatchMeta {
        MatchMeta {
            match_id: "m1".into(),
            home_team: "Home".into(),
            away_team: "Away".into(),
            rounds: 1,
            qpr: 1,
            tpq: vec![Duration::seconds(2)],
            ppq: 1.0,
            cooldown_duration: Duration::zero(),
        }
    }

    fn started() -> (Match, TestClock) {
        let clock = TestClock::new(Utc::now());
        let m = Match::new(meta(), Box::new(StandardAdapter)).unwrap();
        m.transition_to(MatchState::Standby, &clock).unwrap();
        m.transition_to(MatchState::Active, &clock).unwrap();
        (m, clock)
    }

    #[test]
    fn happy_path_one_question() {
        let (m, clock) = started();
        clock.advance(Duration::milliseconds(500));
        let player = PlayerInfo {
            user_id: "u1".into(),
            user_name: "alice".into(),
            user_affiliation: "Home".into(),
        };
        m.store_answer(player, Some(0), &clock).unwrap();
        clock.advance(Duration::seconds(2));

        let first = m.verify(None, &clock).unwrap();
        assert_eq!(first.len(), 1);
        assert_eq!(m.home_score(), 1.0);

        let second = m.verify(None, &clock);
        assert!(second.is_err());
        assert_eq!(m.state(), MatchState::Completed);
    }

    #[test]
    fn verify_is_idempotent_by_question_id() {
        let (m, clock) = started();
        clock.advance(Duration::seconds(3));
        let first = m.verify(None, &clock).unwrap();
        let qid = m.used_question_ids();
        let replay = m.verify(Some(&qid[0]), &clock).unwrap();
        assert_eq!(first, replay);
    }

    #[test]
    fn verify_too_early_reports_target_instant() {
        let (m, clock) = started();
        let err = m.verify(None, &clock).unwrap_err();
        assert!(matches!(err, MatchError::BadRequest(msg) if msg.contains("Try again at")));
    }
}
