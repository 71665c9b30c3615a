//! JSON-driven conformance runner for end-to-end match scenarios, scaled
//! down to drive the engine in-process rather than over HTTP. Each fixture
//! under `tests/fixtures/` names a match configuration and an ordered list
//! of steps; this file is just the step interpreter.

use chrono::{Duration, Utc};
use serde::Deserialize;

use match_engine::adapter::adapter_for;
use match_engine::answer::PlayerInfo;
use match_engine::clock::TestClock;
use match_engine::match_core::{Match, MatchMeta, MatchState};

#[derive(Debug, Deserialize)]
struct Scenario {
    #[allow(dead_code)]
    name: String,
    #[serde(rename = "match")]
    match_config: MatchConfig,
    steps: Vec<Step>,
}

#[derive(Debug, Deserialize)]
struct MatchConfig {
    match_type: String,
    home_team: String,
    away_team: String,
    rounds: u32,
    qpr: u32,
    tpq: Vec<f64>,
    ppq: f64,
    #[serde(default)]
    cooldown_duration: f64,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
enum Step {
    /// Drive a state transition; `expect_error` checks it was rejected.
    Transition {
        state: i8,
        #[serde(default)]
        expect_error: bool,
    },
    /// Move the test clock forward.
    Advance { seconds: f64 },
    StoreAnswer {
        user_id: String,
        user_name: String,
        user_affiliation: String,
        #[serde(default)]
        selected_option: Option<usize>,
        #[serde(default)]
        expect_error: bool,
    },
    /// Call `verify`. `expect_error_contains`, when set, asserts the call
    /// failed and the message contains the given substring (e.g. "Try
    /// again at" for a time-gate rejection); otherwise the call must
    /// succeed and `expect_answer_count`, if set, is checked against the
    /// returned list's length.
    Verify {
        #[serde(default)]
        question_id: Option<String>,
        #[serde(default)]
        expect_error_contains: Option<String>,
        #[serde(default)]
        expect_answer_count: Option<usize>,
    },
    /// Concurrently call `verify` from `threads` threads and assert that
    /// the match's `used` queue grew by exactly one question, the
    /// at-most-once grading guarantee under concurrent callers.
    ConcurrentVerify { threads: usize },
    AssertHomeScore { value: f64 },
    AssertAwayScore { value: f64 },
    AssertState { state: i8 },
}

fn build_match(config: &MatchConfig) -> Match {
    let adapter = adapter_for(&config.match_type)
        .unwrap_or_else(|| panic!("unknown match_type {}", config.match_type));
    let meta = MatchMeta {
        match_id: "conformance".into(),
        home_team: config.home_team.clone(),
        away_team: config.away_team.clone(),
        rounds: config.rounds,
        qpr: config.qpr,
        tpq: config
            .tpq
            .iter()
            .map(|secs| Duration::milliseconds((secs * 1000.0) as i64))
            .collect(),
        ppq: config.ppq,
        cooldown_duration: Duration::milliseconds((config.cooldown_duration * 1000.0) as i64),
    };
    Match::new(meta, adapter).expect("valid fixture match configuration")
}

fn run_scenario(fixture: &str) {
    let raw = std::fs::read_to_string(format!(
        "{}/tests/fixtures/{fixture}",
        env!("CARGO_MANIFEST_DIR")
    ))
    .unwrap_or_else(|e| panic!("reading fixture {fixture}: {e}"));
    let scenario: Scenario =
        serde_json::from_str(&raw).unwrap_or_else(|e| panic!("parsing fixture {fixture}: {e}"));

    let clock = TestClock::new(Utc::now());
    let m = build_match(&scenario.match_config);

    for (i, step) in scenario.steps.iter().enumerate() {
        match step {
            Step::Transition { state, expect_error } => {
                let target = MatchState::try_from(*state)
                    .unwrap_or_else(|_| panic!("step {i}: invalid state {state}"));
                let result = m.transition_to(target, &clock);
                if *expect_error {
                    assert!(result.is_err(), "step {i}: expected transition to fail");
                } else {
                    result.unwrap_or_else(|e| panic!("step {i}: transition failed: {e}"));
                }
            }
            Step::Advance { seconds } => {
                clock.advance(Duration::milliseconds((*seconds * 1000.0) as i64));
            }
            Step::StoreAnswer {
                user_id,
                user_name,
                user_affiliation,
                selected_option,
                expect_error,
            } => {
                let player = PlayerInfo {
                    user_id: user_id.clone(),
                    user_name: user_name.clone(),
                    user_affiliation: user_affiliation.clone(),
                };
                let result = m.store_answer(player, *selected_option, &clock);
                if *expect_error {
                    assert!(result.is_err(), "step {i}: expected store_answer to fail");
                } else {
                    result.unwrap_or_else(|e| panic!("step {i}: store_answer failed: {e}"));
                }
            }
            Step::Verify {
                question_id,
                expect_error_contains,
                expect_answer_count,
            } => {
                let result = m.verify(question_id.as_deref(), &clock);
                match expect_error_contains {
                    Some(needle) => {
                        let err = result.unwrap_err_or_panic(i);
                        assert!(
                            err.contains(needle.as_str()),
                            "step {i}: error {err:?} does not contain {needle:?}"
                        );
                    }
                    None => {
                        let answers =
                            result.unwrap_or_else(|e| panic!("step {i}: verify failed: {e}"));
                        if let Some(count) = expect_answer_count {
                            assert_eq!(
                                answers.len(),
                                *count,
                                "step {i}: unexpected answer count"
                            );
                        }
                    }
                }
            }
            Step::ConcurrentVerify { threads } => {
                let before = m.used_question_ids().len();
                let scores_before = (m.home_score(), m.away_score());
                std::thread::scope(|scope| {
                    for _ in 0..*threads {
                        scope.spawn(|| {
                            let _ = m.verify(None, &clock);
                        });
                    }
                });
                let after = m.used_question_ids().len();
                assert_eq!(
                    after,
                    before + 1,
                    "step {i}: concurrent verify calls must advance the queue exactly once"
                );
                let scores_after = (m.home_score(), m.away_score());
                assert!(
                    scores_after.0 >= scores_before.0 && scores_after.1 >= scores_before.1,
                    "step {i}: scores must not move backwards under concurrent verify"
                );
            }
            Step::AssertHomeScore { value } => {
                assert_eq!(m.home_score(), *value, "step {i}: unexpected home score");
            }
            Step::AssertAwayScore { value } => {
                assert_eq!(m.away_score(), *value, "step {i}: unexpected away score");
            }
            Step::AssertState { state } => {
                assert_eq!(
                    m.state().code(),
                    *state,
                    "step {i}: unexpected match state"
                );
            }
        }
    }
}

/// Helper so `Verify`'s error-message assertion can read the error's
/// `Display` string without fighting the borrow checker over `result`.
trait UnwrapErrOrPanic<T> {
    fn unwrap_err_or_panic(self, step: usize) -> String;
}

impl<T> UnwrapErrOrPanic<T> for Result<T, match_engine::error::MatchError> {
    fn unwrap_err_or_panic(self, step: usize) -> String {
        match self {
            Ok(_) => panic!("step {step}: expected verify to fail but it succeeded"),
            Err(e) => e.to_string(),
        }
    }
}

#[test]
fn happy_path_one_question() {
    run_scenario("happy_path_one_question.json");
}

#[test]
fn bonus_window_fast_answer() {
    run_scenario("bonus_window.json");
}

#[test]
fn consecutive_scorer_multiplier() {
    run_scenario("consecutive_multiplier.json");
}

#[test]
fn late_submission_is_rejected() {
    run_scenario("late_submission.json");
}

#[test]
fn concurrent_verify_is_idempotent() {
    run_scenario("concurrent_verify.json");
}

#[test]
fn illegal_transition_is_rejected() {
    run_scenario("illegal_transition.json");
}
