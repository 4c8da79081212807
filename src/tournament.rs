use rand::seq::index::sample;
use serde::Serialize;

use crate::catalog::dedupe_by_domain;
use crate::tags::entries_for_tag;
use crate::types::RankedApp;

// ── State ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum TournamentPhase {
    SelectingCategory,
    InProgress,
    Finished,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pair {
    pub left: RankedApp,
    pub right: RankedApp,
}

impl Pair {
    fn matches(&self, domain_a: &str, domain_b: &str) -> bool {
        (self.left.mini_app.domain == domain_a && self.right.mini_app.domain == domain_b)
            || (self.left.mini_app.domain == domain_b && self.right.mini_app.domain == domain_a)
    }
}

/// Outcome of a single choice event.
#[derive(Debug, Clone)]
pub enum ChoiceOutcome {
    /// The designated pair is not the live pair; nothing changed.
    Ignored,
    /// Loser eliminated, next pair drawn.
    Continued,
    /// Loser eliminated and the bracket is decided. Reported exactly once,
    /// on the transition; the caller owns the score-write side effect.
    Finished(RankedApp),
}

/// Single-elimination bracket over the catalog entries of one category.
///
/// The pool holds the surviving contestants, keyed by domain. While at
/// least two remain there is always a live pair; once one remains it is
/// the winner and the bracket is finished.
pub struct Tournament {
    phase: TournamentPhase,
    category: Option<String>,
    pool: Vec<RankedApp>,
    current_pair: Option<Pair>,
    winner: Option<RankedApp>,
}

impl Default for Tournament {
    fn default() -> Self {
        Self {
            phase: TournamentPhase::SelectingCategory,
            category: None,
            pool: Vec::new(),
            current_pair: None,
            winner: None,
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TournamentSnapshot {
    pub phase: TournamentPhase,
    pub category: Option<String>,
    pub pool_size: usize,
    pub current_pair: Option<Pair>,
    pub winner: Option<RankedApp>,
}

// ── Engine ─────────────────────────────────────────────────────────────

impl Tournament {
    pub fn new() -> Self {
        Tournament::default()
    }

    pub fn phase(&self) -> TournamentPhase {
        self.phase
    }

    pub fn category(&self) -> Option<&str> {
        self.category.as_deref()
    }

    pub fn pool_size(&self) -> usize {
        self.pool.len()
    }

    pub fn current_pair(&self) -> Option<&Pair> {
        self.current_pair.as_ref()
    }

    pub fn winner(&self) -> Option<&RankedApp> {
        self.winner.as_ref()
    }

    /// Begin a bracket for `category` against the full catalog. Pools of
    /// size zero or one finish immediately (vacuously) instead of
    /// crashing; no score write is attempted for a walkover winner.
    pub fn start(&mut self, catalog: &[RankedApp], category: &str) {
        self.category = Some(category.to_string());
        self.pool = dedupe_by_domain(entries_for_tag(catalog, category));
        self.current_pair = None;
        self.winner = None;
        if self.pool.len() >= 2 {
            self.phase = TournamentPhase::InProgress;
            self.draw_pair();
        } else {
            self.winner = self.pool.pop();
            self.pool.clear();
            self.phase = TournamentPhase::Finished;
        }
    }

    /// Resolve the live pair: `winner_domain` survives, `loser_domain` is
    /// eliminated. A choice against a pair that is no longer live is a
    /// no-op, which makes rapid duplicate events harmless.
    pub fn choose(&mut self, winner_domain: &str, loser_domain: &str) -> ChoiceOutcome {
        if self.phase() != TournamentPhase::InProgress {
            return ChoiceOutcome::Ignored;
        }
        match self.current_pair.as_ref() {
            Some(pair) if pair.matches(winner_domain, loser_domain) => {}
            _ => return ChoiceOutcome::Ignored,
        }

        self.pool.retain(|app| app.mini_app.domain != loser_domain);
        self.current_pair = None;

        match self.pool.len() {
            0 => ChoiceOutcome::Continued,
            1 => {
                let winner = self.pool.remove(0);
                self.winner = Some(winner.clone());
                self.phase = TournamentPhase::Finished;
                ChoiceOutcome::Finished(winner)
            }
            _ => {
                self.draw_pair();
                ChoiceOutcome::Continued
            }
        }
    }

    /// Re-run the same category against the full catalog, discarding all
    /// elimination state.
    pub fn restart(&mut self, catalog: &[RankedApp]) -> Result<(), String> {
        let category = self
            .category
            .clone()
            .ok_or_else(|| "No category selected to restart.".to_string())?;
        self.start(catalog, &category);
        Ok(())
    }

    /// Back to category selection, discarding everything.
    pub fn reset(&mut self) {
        *self = Tournament::default();
    }

    pub fn snapshot(&self) -> TournamentSnapshot {
        TournamentSnapshot {
            phase: self.phase(),
            category: self.category.clone(),
            pool_size: self.pool.len(),
            current_pair: self.current_pair.clone(),
            winner: self.winner.clone(),
        }
    }

    /// Draw two distinct contestants uniformly at random, without removing
    /// either from the pool. Presentation order carries no meaning.
    fn draw_pair(&mut self) {
        if self.pool.len() < 2 {
            self.current_pair = None;
            return;
        }
        let mut rng = rand::thread_rng();
        let picked = sample(&mut rng, self.pool.len(), 2);
        self.current_pair = Some(Pair {
            left: self.pool[picked.index(0)].clone(),
            right: self.pool[picked.index(1)].clone(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AppAuthor, MiniApp};

    fn make_app(id: &str, tags: &[&str]) -> RankedApp {
        RankedApp {
            rank: None,
            mini_app: MiniApp {
                id: id.to_string(),
                domain: format!("{id}.example"),
                name: id.to_string(),
                icon_url: String::new(),
                home_url: String::new(),
                author: AppAuthor::default(),
                description: None,
                subtitle: None,
                tagline: None,
                button_title: None,
                primary_category: None,
                tags: tags.iter().map(|t| t.to_string()).collect(),
            },
            rank_72h_change: 0,
        }
    }

    fn make_catalog(count: usize, tag: &str) -> Vec<RankedApp> {
        (0..count)
            .map(|i| make_app(&format!("app-{i}"), &[tag]))
            .collect()
    }

    /// Resolve the live pair by always keeping its left entry.
    fn choose_left(tournament: &mut Tournament) -> ChoiceOutcome {
        let (winner, loser) = {
            let pair = tournament.current_pair().expect("live pair");
            (
                pair.left.mini_app.domain.clone(),
                pair.right.mini_app.domain.clone(),
            )
        };
        tournament.choose(&winner, &loser)
    }

    #[test]
    fn test_start_draws_distinct_pair() {
        let catalog = make_catalog(12, "games");
        let mut tournament = Tournament::new();
        tournament.start(&catalog, "games");
        assert_eq!(tournament.phase(), TournamentPhase::InProgress);
        assert_eq!(tournament.pool_size(), 12);
        let pair = tournament.current_pair().unwrap();
        assert_ne!(pair.left.mini_app.domain, pair.right.mini_app.domain);
    }

    #[test]
    fn test_bracket_terminates_in_n_minus_one_choices() {
        let catalog = make_catalog(11, "games");
        let domains: Vec<String> = catalog
            .iter()
            .map(|app| app.mini_app.domain.clone())
            .collect();
        let mut tournament = Tournament::new();
        tournament.start(&catalog, "games");

        let mut choices = 0;
        loop {
            let before = tournament.pool_size();
            match choose_left(&mut tournament) {
                ChoiceOutcome::Continued => {
                    choices += 1;
                    assert_eq!(tournament.pool_size(), before - 1);
                }
                ChoiceOutcome::Finished(winner) => {
                    choices += 1;
                    assert!(domains.contains(&winner.mini_app.domain));
                    break;
                }
                ChoiceOutcome::Ignored => panic!("live pair choice was ignored"),
            }
        }
        assert_eq!(choices, 10);
        assert_eq!(tournament.phase(), TournamentPhase::Finished);
        assert_eq!(tournament.pool_size(), 0);
        assert!(tournament.winner().is_some());
    }

    #[test]
    fn test_stale_pair_choice_is_noop() {
        let catalog = make_catalog(5, "games");
        let mut tournament = Tournament::new();
        tournament.start(&catalog, "games");

        let (winner, loser) = {
            let pair = tournament.current_pair().unwrap();
            (
                pair.left.mini_app.domain.clone(),
                pair.right.mini_app.domain.clone(),
            )
        };
        assert!(matches!(
            tournament.choose(&winner, &loser),
            ChoiceOutcome::Continued
        ));
        let pool_after = tournament.pool_size();

        // Replaying the same event must not shrink the pool again.
        assert!(matches!(
            tournament.choose(&winner, &loser),
            ChoiceOutcome::Ignored
        ));
        assert_eq!(tournament.pool_size(), pool_after);
    }

    #[test]
    fn test_unknown_domains_are_ignored() {
        let catalog = make_catalog(4, "games");
        let mut tournament = Tournament::new();
        tournament.start(&catalog, "games");
        assert!(matches!(
            tournament.choose("nope.example", "also-nope.example"),
            ChoiceOutcome::Ignored
        ));
        assert_eq!(tournament.pool_size(), 4);
    }

    #[test]
    fn test_single_entry_category_finishes_immediately() {
        let catalog = make_catalog(1, "games");
        let mut tournament = Tournament::new();
        tournament.start(&catalog, "games");
        assert_eq!(tournament.phase(), TournamentPhase::Finished);
        assert!(tournament.current_pair().is_none());
        assert_eq!(
            tournament.winner().unwrap().mini_app.domain,
            "app-0.example"
        );
    }

    #[test]
    fn test_empty_category_finishes_with_no_winner() {
        let catalog = make_catalog(6, "games");
        let mut tournament = Tournament::new();
        tournament.start(&catalog, "finance");
        assert_eq!(tournament.phase(), TournamentPhase::Finished);
        assert!(tournament.winner().is_none());
        assert!(tournament.current_pair().is_none());
    }

    #[test]
    fn test_pool_dedupes_by_domain() {
        let mut catalog = make_catalog(3, "games");
        catalog.push(catalog[0].clone());
        let mut tournament = Tournament::new();
        tournament.start(&catalog, "games");
        assert_eq!(tournament.pool_size(), 3);
    }

    #[test]
    fn test_restart_restores_full_pool() {
        let catalog = make_catalog(8, "games");
        let mut tournament = Tournament::new();
        tournament.start(&catalog, "games");
        choose_left(&mut tournament);
        choose_left(&mut tournament);
        assert_eq!(tournament.pool_size(), 6);

        tournament.restart(&catalog).unwrap();
        assert_eq!(tournament.pool_size(), 8);
        assert_eq!(tournament.phase(), TournamentPhase::InProgress);
        assert!(tournament.winner().is_none());
    }

    #[test]
    fn test_restart_without_category_errors() {
        let catalog = make_catalog(8, "games");
        let mut tournament = Tournament::new();
        assert!(tournament.restart(&catalog).is_err());
    }

    #[test]
    fn test_reset_returns_to_category_selection() {
        let catalog = make_catalog(8, "games");
        let mut tournament = Tournament::new();
        tournament.start(&catalog, "games");
        tournament.reset();
        assert_eq!(tournament.phase(), TournamentPhase::SelectingCategory);
        assert!(tournament.category().is_none());
        assert_eq!(tournament.pool_size(), 0);
        assert!(tournament.current_pair().is_none());
    }

    #[test]
    fn test_winner_reported_exactly_once() {
        let catalog = make_catalog(2, "games");
        let mut tournament = Tournament::new();
        tournament.start(&catalog, "games");
        let outcome = choose_left(&mut tournament);
        let winner = match outcome {
            ChoiceOutcome::Finished(app) => app,
            other => panic!("expected finish, got {other:?}"),
        };
        // Any further choice against the finished bracket is ignored.
        assert!(matches!(
            tournament.choose(&winner.mini_app.domain, "gone.example"),
            ChoiceOutcome::Ignored
        ));
    }
}
