use chrono::Duration;

use super::{Adapter, Scoreboard};
use crate::answer::Answer;
use crate::match_core::MatchMeta;
use crate::question::Question;

/// Ruleset used by matches in House of Bamzy: a fast-answer bonus plus a
/// consecutive-scorer multiplier on top of the base contract.
#[derive(Debug, Clone, Copy)]
pub struct HouseBamzyAdapter {
    /// Points Per Win. Reserved for end-of-round bonuses outside this
    /// engine's scope.
    #[allow(dead_code)]
    ppw: f64,
    /// Within-2-Seconds bonus.
    w2s: f64,
}

impl Default for HouseBamzyAdapter {
    fn default() -> Self {
        Self {
            ppw: 50.0,
            w2s: 5.0,
        }
    }
}

/// Length of the trailing run of scorers sharing `user_name`, counting the
/// incoming scorer itself, walking the ledger from newest to oldest.
fn consecutive_run(scorers: &[Answer], user_name: &str) -> usize {
    let mut run = 1;
    for scorer in scorers.iter().rev() {
        if scorer.player_info.user_name == user_name {
            run += 1;
        } else {
            break;
        }
    }
    run
}

/// Folds a raw consecutive-run count onto a period-4 cycle: `x1, x1, x2,
/// x3, x1, x1, x2, x3, ...`. The hat-trick cap.
fn effective_run(raw: usize) -> usize {
    ((raw - 1) % 4) + 1
}

fn multiplier_for(run: usize) -> f64 {
    match run {
        1 | 2 => 1.0,
        3 => 2.0,
        _ => 3.0,
    }
}

impl Adapter for HouseBamzyAdapter {
    fn match_type(&self) -> &'static str {
        "HouseBamzy"
    }

    fn recess_duration(&self) -> Duration {
        Duration::seconds(120)
    }

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
                let is_home = answer.player_info.user_affiliation == meta.home_team;
                let is_away = answer.player_info.user_affiliation == meta.away_team;
                if !is_home && !is_away {
                    return None;
                }

                let run = effective_run(consecutive_run(board.scorers, &answer.player_info.user_name));
                let base_points = if question.points > 0.0 {
                    question.points
                } else {
                    meta.ppq
                };
                let awarded = base_points * multiplier_for(run);
                answer.base_points = awarded;

                let fast_answer_bonus = match question.send_at {
                    Some(send_at) if answer.time_received - send_at <= Duration::seconds(2) => {
                        self.w2s
                    }
                    _ => 0.0,
                };

                if is_home {
                    *board.home_score += awarded;
                    self.bonus_points_home(&mut board, &mut answer, fast_answer_bonus);
                } else {
                    *board.away_score += awarded;
                    self.bonus_points_away(&mut board, &mut answer, fast_answer_bonus);
                }
                board.scorers.push(answer.clone());
                Some(answer)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_cycles_every_four() {
        assert_eq!(effective_run(1), 1);
        assert_eq!(effective_run(2), 2);
        assert_eq!(effective_run(3), 3);
        assert_eq!(effective_run(4), 4);
        assert_eq!(effective_run(5), 1);
        assert_eq!(effective_run(8), 4);
    }

    #[test]
    fn multiplier_follows_the_consecutive_scorer_table() {
        assert_eq!(multiplier_for(1), 1.0);
        assert_eq!(multiplier_for(2), 1.0);
        assert_eq!(multiplier_for(3), 2.0);
        assert_eq!(multiplier_for(4), 3.0);
    }
}
