//! Match registry: an in-memory collection of matches keyed by `match_id`,
//! built on [`ClashMap`](crate::clashmap::ClashMap), a small `dashmap`-backed
//! wrapper keyed here by match id rather than game id.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::clashmap::ClashMap;
use crate::error::MatchError;
use crate::match_core::{Match, MatchMeta};

/// Durable storage boundary for matches, an interface-only contract: no
/// implementation is wired up, and `MatchRegistry::load_all` never calls it.
#[async_trait]
pub trait Persistence: std::fmt::Debug + Send + Sync {
    async fn load_matches(&self) -> Result<Vec<MatchMeta>, MatchError>;
    async fn persist_matches(&self, matches: &[MatchMeta]) -> Result<(), MatchError>;
}

#[derive(Debug, Default)]
pub struct MatchRegistry {
    matches: ClashMap<String, Arc<Match>>,
}

impl MatchRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts empty; no [`Persistence`] implementation is wired up yet.
    pub fn load_all() -> Self {
        Self::default()
    }

    pub fn lookup(&self, match_id: &str) -> Result<Arc<Match>, MatchError> {
        self.matches
            .get(&match_id.to_string())
            .ok_or_else(|| MatchError::NotFound(match_id.to_string()))
    }

    /// `silent` variant: returns `None` instead of failing.
    pub fn lookup_silent(&self, match_id: &str) -> Option<Arc<Match>> {
        self.matches.get(&match_id.to_string())
    }

    pub fn add(&self, new_match: Match) -> Result<Arc<Match>, MatchError> {
        let match_id = new_match.match_id();
        let arc = Arc::new(new_match);
        match self.matches.insert_if_vacant(match_id.clone(), arc.clone()) {
            None => Ok(arc),
            Some(_) => Err(MatchError::Conflict(match_id)),
        }
    }

    pub fn remove(&self, match_id: &str) -> Result<(), MatchError> {
        self.matches
            .remove(&match_id.to_string())
            .map(|_| ())
            .ok_or_else(|| MatchError::NotFound(match_id.to_string()))
    }

    pub fn clear(&self) {
        self.matches.clear();
    }

    pub fn all(&self) -> Vec<Arc<Match>> {
        self.matches.iter().map(|(_, m)| m).collect()
    }

    pub fn len(&self) -> usize {
        self.matches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Matches whose `start_time`'s UTC calendar date equals `date`. An
    /// empty/absent date returns every match.
    pub fn filter_by_date(&self, date: Option<NaiveDate>) -> Vec<Arc<Match>> {
        match date {
            None => self.all(),
            Some(date) => self
                .all()
                .into_iter()
                .filter(|m| m.start_time().map(|t| t.date_naive()) == Some(date))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;
    use crate::adapter::StandardAdapter;
    use crate::match_core::MatchMeta;

    fn meta(id: &str) -> MatchMeta {
        MatchMeta {
            match_id: id.into(),
            home_team: "Home".into(),
            away_team: "Away".into(),
            rounds: 1,
            qpr: 1,
            tpq: vec![Duration::seconds(30)],
            ppq: 1.0,
            cooldown_duration: Duration::seconds(1),
        }
    }

    #[test]
    fn add_rejects_duplicate_ids() {
        let registry = MatchRegistry::new();
        registry
            .add(Match::new(meta("m1"), Box::new(StandardAdapter)).unwrap())
            .unwrap();
        let err = registry
            .add(Match::new(meta("m1"), Box::new(StandardAdapter)).unwrap())
            .unwrap_err();
        assert!(matches!(err, MatchError::Conflict(_)));
    }

    #[test]
    fn lookup_silent_returns_none_for_missing() {
        let registry = MatchRegistry::new();
        assert!(registry.lookup_silent("missing").is_none());
        assert!(registry.lookup("missing").is_err());
    }

    #[test]
    fn remove_and_clear() {
        let registry = MatchRegistry::new();
        registry
            .add(Match::new(meta("m1"), Box::new(StandardAdapter)).unwrap())
            .unwrap();
        registry
            .add(Match::new(meta("m2"), Box::new(StandardAdapter)).unwrap())
            .unwrap();
        registry.remove("m1").unwrap();
        assert_eq!(registry.len(), 1);
        registry.clear();
        assert!(registry.is_empty());
    }

    #[test]
    fn filter_by_date_with_no_date_returns_all() {
        let registry = MatchRegistry::new();
        registry
            .add(Match::new(meta("m1"), Box::new(StandardAdapter)).unwrap())
            .unwrap();
        assert_eq!(registry.filter_by_date(None).len(), 1);
    }
}
