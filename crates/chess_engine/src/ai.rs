use std::{
    sync::{
        mpsc::{self, Receiver, TryRecvError},
        Arc,
    },
    thread,
    time::{Duration, Instant},
};

use chess_core::Move;
use log::{debug, error, info};
use rand::{rngs::StdRng, seq::SliceRandom, Rng, SeedableRng};

use crate::{
    config::{Difficulty, DifficultyProfile, EngineConfig},
    draw,
    error::{EngineError, EngineResult},
    evaluation::evaluate_position,
    opening_book::OpeningBook,
    oracle::RulesOracle,
    search::search_root,
};

/// Computer opponent for one difficulty level.
///
/// Cloning is cheap: the opening book is shared and the random source is
/// copied along with its current state.
#[derive(Debug, Clone)]
pub struct ChessAI {
    book: Arc<OpeningBook>,
    config: EngineConfig,
    difficulty: Difficulty,
    rng: StdRng,
}

impl ChessAI {
    /// Opponent drawing from `book`, which is shared rather than copied.
    pub fn new(book: Arc<OpeningBook>, difficulty: Difficulty) -> Self {
        Self::with_rng(book, difficulty, StdRng::from_entropy())
    }

    /// Reproducible opponent: the same seed and inputs give the same moves.
    pub fn with_seed(book: Arc<OpeningBook>, difficulty: Difficulty, seed: u64) -> Self {
        Self::with_rng(book, difficulty, StdRng::seed_from_u64(seed))
    }

    fn with_rng(book: Arc<OpeningBook>, difficulty: Difficulty, rng: StdRng) -> Self {
        ChessAI {
            book,
            config: EngineConfig::default(),
            difficulty,
            rng,
        }
    }

    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    pub fn set_difficulty(&mut self, difficulty: Difficulty) {
        self.difficulty = difficulty;
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn book(&self) -> &Arc<OpeningBook> {
        &self.book
    }

    pub fn profile(&self) -> &DifficultyProfile {
        self.config.profile(self.difficulty)
    }

    /// Picks a move for the side to move, or `None` when the game is over.
    ///
    /// The caller's position is never touched; the search runs on a clone.
    /// Searched moves are held back until the difficulty's think delay has
    /// passed, book moves are returned straight away.
    pub fn choose_move<P: RulesOracle>(&mut self, position: &P) -> EngineResult<Option<Move>> {
        let started = Instant::now();
        let profile = *self.profile();

        let legal = position.legal_moves();
        if legal.is_empty() || position.status().is_over() {
            debug!("No move to make: {:?}", position.status());
            return Ok(None);
        }

        if let Some(mv) = self.book_move(position, &profile) {
            info!("{} plays book move {}", self.difficulty, mv);
            return Ok(Some(mv));
        }

        let mut working = position.clone();
        let mut chosen = search_root(&mut working, profile.depth)?.map(|result| result.best_move);

        if profile.random_move_probability > 0.0
            && self.rng.gen::<f64>() < profile.random_move_probability
        {
            chosen = legal.choose(&mut self.rng).copied();
            debug!("Random override picked {:?}", chosen.map(|mv| mv.to_uci()));
        }

        let Some(chosen) = chosen.or_else(|| legal.choose(&mut self.rng).copied()) else {
            return Ok(None);
        };

        if !legal.contains(&chosen) {
            error!("Selected move {} is not legal in the supplied position", chosen);
            return Err(EngineError::StaleMove { mv: chosen.to_uci() });
        }

        pace(started, profile.think_delay());
        info!("{} plays {}", self.difficulty, chosen);
        Ok(Some(chosen))
    }

    /// Move code such as `e2e4` or `e7e8q`; empty when there is no move.
    pub fn select_move<P: RulesOracle>(&mut self, position: &P) -> EngineResult<String> {
        Ok(self
            .choose_move(position)?
            .map(|mv| mv.to_uci())
            .unwrap_or_default())
    }

    pub fn should_accept_draw<P: RulesOracle>(&mut self, position: &P) -> bool {
        let profile = *self.profile();
        let accepted =
            draw::should_accept_draw(position, &profile, self.config.draw_scale, &mut self.rng);
        info!(
            "{} {} the draw offer",
            self.difficulty,
            if accepted { "accepts" } else { "declines" }
        );
        accepted
    }

    pub fn evaluate<P: RulesOracle>(&self, position: &P) -> i32 {
        evaluate_position(position)
    }

    // A uniformly chosen legal book move, taken with the profile's book probability.
    fn book_move<P: RulesOracle>(&mut self, position: &P, profile: &DifficultyProfile) -> Option<Move> {
        let candidates = self.book.legal_candidates(position);
        if candidates.is_empty() || self.rng.gen::<f64>() >= profile.book_probability {
            return None;
        }
        candidates.choose(&mut self.rng).copied()
    }
}

fn pace(started: Instant, delay: Duration) {
    if let Some(remaining) = delay.checked_sub(started.elapsed()) {
        thread::sleep(remaining);
    }
}

/// Handle to a move selection running on the rayon pool.
#[derive(Debug)]
pub struct MoveTask {
    receiver: Receiver<EngineResult<String>>,
}

impl MoveTask {
    /// Non-blocking check; `None` while the search is still running.
    pub fn poll(&self) -> Option<EngineResult<String>> {
        match self.receiver.try_recv() {
            Ok(result) => Some(result),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(Err(EngineError::TaskDropped)),
        }
    }

    /// Blocks until the move is available.
    pub fn wait(self) -> EngineResult<String> {
        self.receiver
            .recv()
            .unwrap_or_else(|_| Err(EngineError::TaskDropped))
    }
}

/// Runs `select_move` in the background on owned copies of the opponent and
/// the position.
pub fn spawn_select_move<P>(mut ai: ChessAI, position: P) -> MoveTask
where
    P: RulesOracle + Send + 'static,
{
    let (sender, receiver) = mpsc::channel();
    rayon::spawn(move || {
        let result = ai.select_move(&position);
        if sender.send(result).is_err() {
            debug!("Move task was dropped before the result arrived");
        }
    });
    MoveTask { receiver }
}
