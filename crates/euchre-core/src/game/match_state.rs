use crate::model::deck::Deck;
use crate::model::player::{PlayerPosition, Team};
use crate::model::round::{RoundPhase, RoundState};
use crate::model::score::{RoundScore, ScoreBoard};
use rand::SeedableRng;
use rand::rngs::StdRng;

pub const DEFAULT_WINNING_SCORE: u32 = 10;

#[derive(Debug, Clone)]
pub struct MatchState {
    scores: ScoreBoard,
    round_number: u32,
    winning_score: u32,
    current_round: RoundState,
    rng: StdRng,
    seed: u64,
}

impl MatchState {
    pub fn new(first_dealer: PlayerPosition) -> Self {
        let seed: u64 = rand::random();
        Self::with_seed(first_dealer, seed)
    }

    pub fn with_seed(first_dealer: PlayerPosition, seed: u64) -> Self {
        Self::with_seed_round_dealer(seed, 1, first_dealer)
    }

    /// Rebuilds the deal of `round_number` by replaying the seeded shuffles that precede it.
    pub fn with_seed_round_dealer(seed: u64, round_number: u32, dealer: PlayerPosition) -> Self {
        let normalized_round = round_number.max(1);
        let mut rng = StdRng::seed_from_u64(seed);

        for _ in 1..normalized_round {
            let _ = Deck::shuffled(&mut rng);
        }

        let deck = Deck::shuffled(&mut rng);
        let current_round = RoundState::deal(&deck, dealer);

        Self {
            scores: ScoreBoard::new(),
            round_number: normalized_round,
            winning_score: DEFAULT_WINNING_SCORE,
            current_round,
            rng,
            seed,
        }
    }

    pub fn with_winning_score(mut self, winning_score: u32) -> Self {
        self.winning_score = winning_score.max(1);
        self
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn winning_score(&self) -> u32 {
        self.winning_score
    }

    pub fn scores(&self) -> &ScoreBoard {
        &self.scores
    }

    pub fn scores_mut(&mut self) -> &mut ScoreBoard {
        &mut self.scores
    }

    pub fn round(&self) -> &RoundState {
        &self.current_round
    }

    pub fn round_mut(&mut self) -> &mut RoundState {
        &mut self.current_round
    }

    pub fn round_number(&self) -> u32 {
        self.round_number
    }

    pub fn dealer(&self) -> PlayerPosition {
        self.current_round.dealer()
    }

    pub fn is_round_ready_for_scoring(&self) -> bool {
        self.current_round.phase() == RoundPhase::Complete
    }

    pub fn winner(&self) -> Option<Team> {
        self.scores.winner(self.winning_score)
    }

    pub fn is_over(&self) -> bool {
        self.winner().is_some()
    }

    /// Banks the finished round's points, passes the deal to the left and deals again.
    /// Returns `None` if the current round has not been played out.
    pub fn finish_round_and_start_next(&mut self) -> Option<RoundScore> {
        let score = self.current_round.score()?;
        self.scores.apply(score);

        self.round_number += 1;
        let next_dealer = self.current_round.dealer().next();
        let deck = Deck::shuffled(&mut self.rng);
        self.current_round = RoundState::deal(&deck, next_dealer);
        Some(score)
    }
}
