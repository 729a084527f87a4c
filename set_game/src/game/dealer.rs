//! The dealer thread.
//!
//! The dealer owns the deck and the round timer, and it is the only consumer
//! of the claim queue. Each round it deals, releases the players, then ticks:
//! refresh the countdown, settle at most one claim, refill the table. When the
//! timer runs out the table goes back into the deck and a new round starts,
//! until no legal set is left in play.

use super::{
    GameSummary,
    claims::{ClaimOutcome, ClaimRequest},
    entities::{Card, Deck, PlayerId, PlayerState},
    monitor::GameMonitor,
    player::{FreezeTimings, Player, PlayerWorker},
    table::{ClaimCheck, Table},
};
use crate::{
    config::GameConfig,
    display::GameDisplay,
    errors::{GameError, GameResult},
    validator::SetValidator,
};
use log::{debug, error, info};
use rand::{SeedableRng, rngs::StdRng};
use std::{
    sync::Arc,
    thread::JoinHandle,
    time::Instant,
};

pub struct Dealer {
    config: GameConfig,
    table: Arc<Table>,
    monitor: Arc<GameMonitor>,
    players: Vec<Arc<Player>>,
    display: Arc<dyn GameDisplay>,
    validator: Arc<dyn SetValidator>,
    deck: Deck,
    rng: StdRng,
    round_started: Instant,
    rounds: usize,
}

impl Dealer {
    pub(crate) fn new(
        config: GameConfig,
        table: Arc<Table>,
        monitor: Arc<GameMonitor>,
        players: Vec<Arc<Player>>,
        display: Arc<dyn GameDisplay>,
        validator: Arc<dyn SetValidator>,
    ) -> Self {
        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        let mut deck = Deck::new(config.deck_size);
        deck.shuffle(&mut rng);

        Self {
            config,
            table,
            monitor,
            players,
            display,
            validator,
            deck,
            rng,
            round_started: Instant::now(),
            rounds: 0,
        }
    }

    /// Dealer thread entry point: start the players, play rounds until the
    /// game ends, then stop and join every player thread.
    pub(crate) fn run(mut self) -> GameResult<GameSummary> {
        info!("Dealer starting with {} players", self.players.len());
        let handles = match self.spawn_players() {
            Ok(handles) => handles,
            Err((e, handles)) => {
                error!("Failed to start player threads: {e}");
                self.shutdown(handles)?;
                return Err(e);
            }
        };

        while !self.should_finish() {
            self.rounds += 1;
            info!(
                "Round {} starting, {} cards left in the deck",
                self.rounds,
                self.deck.len()
            );
            self.place_cards_on_table();
            self.show_hints();
            self.run_players();
            self.timer_loop();
            self.update_timer_display(true);
            self.remove_all_cards_from_table();
        }

        let winners = self.announce_winners();
        self.shutdown(handles)?;
        info!("Dealer terminated after {} rounds", self.rounds);
        Ok(self.summary(winners))
    }

    fn spawn_players(&self) -> Result<Vec<JoinHandle<()>>, (GameError, Vec<JoinHandle<()>>)> {
        let timings = FreezeTimings {
            point: self.config.point_freeze(),
            penalty: self.config.penalty_freeze(),
            report_interval: self.config.freeze_report_interval(),
        };
        let mut handles = Vec::with_capacity(self.players.len());
        for player in &self.players {
            let worker = PlayerWorker::new(
                Arc::clone(player),
                Arc::clone(&self.table),
                Arc::clone(&self.monitor),
                Arc::clone(&self.display),
                timings,
            );
            match worker.spawn() {
                Ok(handle) => handles.push(handle),
                Err(e) => return Err((GameError::from(e), handles)),
            }
        }
        Ok(handles)
    }

    /// Run the round until the timer expires, the game terminates, or the
    /// round has nothing left to offer.
    fn timer_loop(&mut self) {
        self.round_started = Instant::now();
        let timeout = self.config.turn_timeout();
        while !self.monitor.is_terminated() && self.round_started.elapsed() < timeout {
            self.monitor.wait_tick(self.config.dealer_tick());
            self.update_timer_display(false);
            self.resolve_next_claim();
            self.place_cards_on_table();
            if self.round_exhausted() {
                debug!("Round {} ends early", self.rounds);
                break;
            }
        }
    }

    /// Settle the oldest pending claim, if any. Never more than one per call.
    pub fn resolve_next_claim(&mut self) -> Option<ClaimOutcome> {
        let request = self.monitor.take_claim()?;
        let outcome = self.judge(request);
        match outcome {
            ClaimOutcome::Point { request, cards } => {
                let player = Arc::clone(&self.players[request.player]);
                let score = player.award_point();
                info!("{} found a set {cards:?}", player.name());
                self.display.set_score(request.player, score);
                self.remove_cards_from_table(&cards);
                self.monitor.set_state(request.player, PlayerState::Point);
                player.wake();
                self.update_timer_display(true);
            }
            ClaimOutcome::Penalty { request, cards } => {
                let player = &self.players[request.player];
                info!("{} claimed a non-set {cards:?}", player.name());
                self.table.clear_tokens(request.player);
                self.monitor.set_state(request.player, PlayerState::Penalty);
                player.wake();
            }
            ClaimOutcome::Stale { request } => {
                debug!(
                    "{}'s claim (ticket {}) is obsolete",
                    self.players[request.player].name(),
                    request.ticket
                );
                if self.monitor.resume_claimant(request.player) {
                    self.players[request.player].wake();
                }
            }
        }
        self.display.claim_settled(&outcome);
        Some(outcome)
    }

    fn judge(&self, request: ClaimRequest) -> ClaimOutcome {
        match self.table.claimed_cards(request.player) {
            ClaimCheck::Stale => ClaimOutcome::Stale { request },
            ClaimCheck::Valid(cards) if self.validator.is_legal_set(&cards) => {
                ClaimOutcome::Point { request, cards }
            }
            ClaimCheck::Valid(cards) => ClaimOutcome::Penalty { request, cards },
        }
    }

    /// Take claimed cards off the table for good.
    fn remove_cards_from_table(&mut self, cards: &[Card]) {
        for &card in cards {
            if let Some(slot) = self.table.slot_of(card) {
                self.table.remove_card(slot);
                self.deck.discard(card);
            }
        }
    }

    /// Fill every empty slot from the deck. Returns how many cards were dealt.
    pub fn place_cards_on_table(&mut self) -> usize {
        let mut dealt = 0;
        for slot in self.table.empty_slots() {
            let Some(card) = self.deck.deal_card() else {
                break;
            };
            self.table.place_card(card, slot);
            dealt += 1;
        }
        dealt
    }

    /// Return every dealt card to the deck, reshuffle, and park the players.
    fn remove_all_cards_from_table(&mut self) {
        let dropped = self.monitor.reset_round();
        if !dropped.is_empty() {
            debug!("Dropping {} claims left over from the round", dropped.len());
        }
        for slot in 0..self.table.size() {
            if let Some(card) = self.table.remove_card(slot) {
                self.deck.return_card(card);
            }
        }
        for player in &self.players {
            player.clear_selections();
        }
        self.deck.shuffle(&mut self.rng);
    }

    fn run_players(&self) {
        self.monitor.broadcast(PlayerState::Running);
    }

    fn update_timer_display(&mut self, reset: bool) {
        let timeout = self.config.turn_timeout();
        let remaining = if reset {
            self.round_started = Instant::now();
            timeout
        } else {
            timeout.saturating_sub(self.round_started.elapsed())
        };
        self.display
            .set_countdown(remaining, remaining <= self.config.turn_timeout_warning());
    }

    /// Nothing more can happen this round: the table is bare, or the deck is
    /// spent and the dealt cards hold no set.
    fn round_exhausted(&self) -> bool {
        if self.table.is_empty() {
            return true;
        }
        self.deck.is_empty()
            && self.monitor.pending_claims() == 0
            && !self.validator.any_legal_set_exists(&self.table.cards())
    }

    /// The game is over once terminated, or when no legal set remains among
    /// the cards still in play (deck and table together).
    pub fn should_finish(&self) -> bool {
        if self.monitor.is_terminated() {
            return true;
        }
        let mut in_play = self.table.cards();
        in_play.extend_from_slice(self.deck.cards());
        !self.validator.any_legal_set_exists(&in_play)
    }

    fn show_hints(&self) {
        if !self.config.hints {
            return;
        }
        for set in self.validator.find_sets(&self.table.cards(), usize::MAX) {
            let slots: Vec<_> = set.iter().filter_map(|&c| self.table.slot_of(c)).collect();
            info!("Hint: set {set:?} at slots {slots:?}");
        }
    }

    /// Every player holding the top score wins.
    fn announce_winners(&self) -> Vec<PlayerId> {
        let winners = top_scorers(&self.scores());
        self.display.announce_winners(&winners);
        winners
    }

    fn scores(&self) -> Vec<u32> {
        self.players.iter().map(|p| p.score()).collect()
    }

    /// Stop every player thread and wait for it.
    fn shutdown(&self, handles: Vec<JoinHandle<()>>) -> GameResult<()> {
        self.monitor.terminate();
        for player in &self.players {
            player.wake();
        }

        let mut panicked = None;
        for handle in handles {
            let name = handle.thread().name().unwrap_or("player").to_string();
            if handle.join().is_err() {
                error!("Thread {name} panicked");
                panicked.get_or_insert(name);
            }
        }
        match panicked {
            Some(name) => Err(GameError::ThreadPanicked(name)),
            None => Ok(()),
        }
    }

    fn summary(&self, winners: Vec<PlayerId>) -> GameSummary {
        GameSummary {
            scores: self.scores(),
            winners,
            rounds: self.rounds,
            discarded: self.deck.discarded().len(),
        }
    }

    #[cfg(test)]
    fn deck(&self) -> &Deck {
        &self.deck
    }

    #[cfg(test)]
    fn with_deck(mut self, deck: Deck) -> Self {
        self.deck = deck;
        self
    }
}

/// Ids of every player sharing the highest score.
pub(crate) fn top_scorers(scores: &[u32]) -> Vec<PlayerId> {
    let Some(&best) = scores.iter().max() else {
        return Vec::new();
    };
    scores
        .iter()
        .enumerate()
        .filter(|&(_, &score)| score == best)
        .map(|(id, _)| id)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validator::FeatureValidator;
    use parking_lot::Mutex;
    use std::time::Duration;

    #[derive(Default)]
    struct RecordingDisplay {
        countdowns: Mutex<Vec<(Duration, bool)>>,
        scores: Mutex<Vec<(PlayerId, u32)>>,
        winners: Mutex<Vec<Vec<PlayerId>>>,
    }

    impl GameDisplay for RecordingDisplay {
        fn set_countdown(&self, remaining: Duration, warn: bool) {
            self.countdowns.lock().push((remaining, warn));
        }

        fn set_freeze(&self, _player: PlayerId, _remaining: Duration) {}

        fn set_score(&self, player: PlayerId, score: u32) {
            self.scores.lock().push((player, score));
        }

        fn announce_winners(&self, winners: &[PlayerId]) {
            self.winners.lock().push(winners.to_vec());
        }
    }

    struct Fixture {
        dealer: Dealer,
        table: Arc<Table>,
        monitor: Arc<GameMonitor>,
        players: Vec<Arc<Player>>,
        display: Arc<RecordingDisplay>,
    }

    fn fixture(config: GameConfig, validator: Arc<dyn SetValidator>) -> Fixture {
        let display = Arc::new(RecordingDisplay::default());
        let table = Arc::new(Table::new(
            config.table_size,
            config.deck_size,
            config.players(),
            display.clone(),
        ));
        let monitor = Arc::new(GameMonitor::new(config.players()));
        let players: Vec<Arc<Player>> = (0..config.players())
            .map(|id| {
                Arc::new(Player::new(
                    id,
                    config.player_name(id),
                    true,
                    config.table_size,
                ))
            })
            .collect();
        let dealer = Dealer::new(
            config,
            Arc::clone(&table),
            Arc::clone(&monitor),
            players.clone(),
            display.clone(),
            validator,
        );
        Fixture {
            dealer,
            table,
            monitor,
            players,
            display,
        }
    }

    fn trick_config(deck_size: usize) -> GameConfig {
        GameConfig {
            deck_size,
            human_players: 2,
            seed: Some(11),
            ..GameConfig::default()
        }
    }

    fn always_legal() -> Arc<dyn SetValidator> {
        Arc::new(|_: &[Card; 3]| true)
    }

    fn never_legal() -> Arc<dyn SetValidator> {
        Arc::new(|_: &[Card; 3]| false)
    }

    fn claim(f: &Fixture, player: PlayerId, slots: [usize; 3]) -> ClaimRequest {
        for slot in slots {
            f.table.toggle_token(player, slot);
        }
        f.monitor.submit_claim(player)
    }

    #[test]
    fn test_place_cards_fills_table() {
        let mut f = fixture(GameConfig::default(), Arc::new(FeatureValidator::default()));
        assert_eq!(f.dealer.place_cards_on_table(), 12);
        assert_eq!(f.dealer.deck().len(), 81 - 12);
        assert_eq!(f.table.count_cards(), 12);
        assert_eq!(f.dealer.place_cards_on_table(), 0);
    }

    #[test]
    fn test_no_claim_resolves_nothing() {
        let mut f = fixture(trick_config(15), always_legal());
        f.dealer.place_cards_on_table();
        assert_eq!(f.dealer.resolve_next_claim(), None);
    }

    #[test]
    fn test_legal_claim_scores_and_refills() {
        let mut f = fixture(trick_config(15), always_legal());
        f.dealer.place_cards_on_table();
        let claimed: Vec<Card> = (0..3).filter_map(|slot| f.table.card_at(slot)).collect();
        claim(&f, 0, [0, 1, 2]);

        let outcome = f.dealer.resolve_next_claim().unwrap();
        assert!(matches!(outcome, ClaimOutcome::Point { .. }));
        assert_eq!(f.players[0].score(), 1);
        assert_eq!(f.monitor.state(0), PlayerState::Point);
        assert_eq!(f.table.count_cards(), 9);
        assert_eq!(f.dealer.deck().discarded(), claimed.as_slice());
        assert_eq!(f.display.scores.lock().as_slice(), &[(0, 1)]);

        assert_eq!(f.dealer.place_cards_on_table(), 3);
        assert_eq!(f.table.count_cards(), 12);
        assert!(f.dealer.deck().is_empty());
        for card in claimed {
            assert_eq!(f.table.slot_of(card), None);
        }
    }

    #[test]
    fn test_illegal_claim_penalizes() {
        let mut f = fixture(trick_config(15), never_legal());
        f.dealer.place_cards_on_table();
        let before = f.table.cards();
        claim(&f, 1, [4, 5, 6]);

        let outcome = f.dealer.resolve_next_claim().unwrap();
        assert!(matches!(outcome, ClaimOutcome::Penalty { .. }));
        assert_eq!(f.players[1].score(), 0);
        assert_eq!(f.monitor.state(1), PlayerState::Penalty);
        assert_eq!(f.table.cards(), before);
        assert_eq!(f.table.count_tokens(1), 0);
    }

    #[test]
    fn test_stale_claim_resumes_player() {
        let mut f = fixture(trick_config(15), always_legal());
        f.dealer.place_cards_on_table();
        claim(&f, 0, [0, 1, 2]);
        f.table.remove_card(1);

        let outcome = f.dealer.resolve_next_claim().unwrap();
        assert!(matches!(outcome, ClaimOutcome::Stale { .. }));
        assert_eq!(f.monitor.state(0), PlayerState::Running);
        assert_eq!(f.players[0].score(), 0);
    }

    #[test]
    fn test_stale_claim_keeps_frozen_player_frozen() {
        let mut f = fixture(trick_config(15), always_legal());
        f.dealer.place_cards_on_table();
        // A leftover claim ahead of a fresh one from the same player.
        f.monitor.submit_claim(0);
        claim(&f, 0, [0, 1, 2]);

        let first = f.dealer.resolve_next_claim().unwrap();
        assert!(matches!(first, ClaimOutcome::Point { .. }));
        assert_eq!(f.monitor.state(0), PlayerState::Point);

        let second = f.dealer.resolve_next_claim().unwrap();
        assert!(matches!(second, ClaimOutcome::Stale { .. }));
        assert_eq!(f.monitor.state(0), PlayerState::Point);
        assert_eq!(f.players[0].score(), 1);
    }

    #[test]
    fn test_one_claim_per_call() {
        let config = GameConfig {
            human_players: 3,
            ..trick_config(15)
        };
        let mut f = fixture(config, always_legal());
        f.dealer.place_cards_on_table();
        claim(&f, 0, [0, 1, 2]);
        claim(&f, 1, [3, 4, 5]);
        claim(&f, 2, [6, 7, 8]);

        f.dealer.resolve_next_claim();
        assert_eq!(f.monitor.pending_claims(), 2);
        f.dealer.resolve_next_claim();
        assert_eq!(f.monitor.pending_claims(), 1);
    }

    #[test]
    fn test_disjoint_claims_resolved_in_submission_order() {
        let mut f = fixture(trick_config(15), always_legal());
        f.dealer.place_cards_on_table();
        let first = claim(&f, 0, [0, 1, 2]);
        let second = claim(&f, 1, [3, 4, 5]);

        let a = f.dealer.resolve_next_claim().unwrap();
        let b = f.dealer.resolve_next_claim().unwrap();
        assert_eq!(a.request(), first);
        assert_eq!(b.request(), second);
        assert!(matches!(b, ClaimOutcome::Point { .. }));
        assert_eq!(f.players[0].score(), 1);
        assert_eq!(f.players[1].score(), 1);
        assert_eq!(f.display.scores.lock().as_slice(), &[(0, 1), (1, 1)]);
    }

    #[test]
    fn test_overlapping_claim_becomes_stale() {
        let mut f = fixture(trick_config(15), always_legal());
        f.dealer.place_cards_on_table();
        claim(&f, 0, [0, 1, 2]);
        claim(&f, 1, [2, 3, 4]);

        assert!(matches!(
            f.dealer.resolve_next_claim(),
            Some(ClaimOutcome::Point { .. })
        ));
        f.dealer.place_cards_on_table();
        assert!(matches!(
            f.dealer.resolve_next_claim(),
            Some(ClaimOutcome::Stale { .. })
        ));
        assert_eq!(f.players[1].score(), 0);
        assert_eq!(f.monitor.state(1), PlayerState::Running);
    }

    #[test]
    fn test_round_reset_returns_unclaimed_cards() {
        let mut f = fixture(trick_config(81), always_legal());
        f.dealer.place_cards_on_table();
        claim(&f, 0, [0, 1, 2]);
        f.dealer.resolve_next_claim();
        f.dealer.place_cards_on_table();
        claim(&f, 1, [5, 6, 7]);

        f.dealer.remove_all_cards_from_table();

        assert!(f.table.is_empty());
        assert_eq!(f.dealer.deck().len(), 78);
        assert_eq!(f.dealer.deck().discarded().len(), 3);
        assert_eq!(f.monitor.pending_claims(), 0);
        assert_eq!(f.monitor.states(), vec![PlayerState::Waiting; 2]);
        for card in f.dealer.deck().discarded() {
            assert!(!f.dealer.deck().cards().contains(card));
        }
    }

    #[test]
    fn test_should_finish_without_sets() {
        let f = fixture(trick_config(15), never_legal());
        assert!(f.dealer.should_finish());

        let f = fixture(GameConfig::default(), Arc::new(FeatureValidator::default()));
        assert!(!f.dealer.should_finish());
    }

    #[test]
    fn test_should_finish_on_cap_set_deck() {
        let cap: Vec<Card> = (0..16usize)
            .map(|bits| Card((bits & 1) + 3 * ((bits >> 1) & 1) + 9 * ((bits >> 2) & 1) + 27 * (bits >> 3)))
            .collect();
        let f = fixture(GameConfig::default(), Arc::new(FeatureValidator::default()));
        let dealer = f.dealer.with_deck(Deck::from_cards(cap));
        assert!(dealer.should_finish());
    }

    #[test]
    fn test_should_finish_counts_table_cards() {
        let mut f = fixture(trick_config(12), always_legal());
        f.dealer.place_cards_on_table();
        assert!(f.dealer.deck().is_empty());
        assert!(!f.dealer.should_finish());
    }

    #[test]
    fn test_should_finish_after_terminate() {
        let f = fixture(GameConfig::default(), Arc::new(FeatureValidator::default()));
        f.monitor.terminate();
        assert!(f.dealer.should_finish());
    }

    #[test]
    fn test_round_exhausted_on_empty_table() {
        let mut f = fixture(trick_config(15), always_legal());
        assert!(f.dealer.round_exhausted());
        f.dealer.place_cards_on_table();
        assert!(!f.dealer.round_exhausted());
    }

    #[test]
    fn test_round_exhausted_when_deck_spent_and_no_set_on_table() {
        let mut f = fixture(trick_config(12), never_legal());
        f.dealer.place_cards_on_table();
        assert!(f.dealer.round_exhausted());
    }

    #[test]
    fn test_countdown_warning() {
        let config = GameConfig {
            turn_timeout_millis: 1_000,
            turn_timeout_warning_millis: 1_000,
            ..GameConfig::default()
        };
        let mut f = fixture(config, Arc::new(FeatureValidator::default()));
        f.dealer.update_timer_display(true);
        let countdowns = f.display.countdowns.lock();
        assert_eq!(countdowns.as_slice(), &[(Duration::from_secs(1), true)]);
    }

    #[test]
    fn test_announce_winners_reports_ties() {
        let config = GameConfig {
            human_players: 3,
            ..GameConfig::default()
        };
        let f = fixture(config, Arc::new(FeatureValidator::default()));
        f.players[0].award_point();
        f.players[2].award_point();
        assert_eq!(f.dealer.announce_winners(), vec![0, 2]);
        assert_eq!(f.display.winners.lock().as_slice(), &[vec![0, 2]]);
    }

    #[test]
    fn test_top_scorers() {
        assert_eq!(top_scorers(&[2, 5, 5, 1]), vec![1, 2]);
        assert_eq!(top_scorers(&[0, 0]), vec![0, 1]);
        assert!(top_scorers(&[]).is_empty());
    }
}
