use rand::Rng;

use crate::{config::DifficultyProfile, evaluation::evaluate_position, oracle::RulesOracle};

/// Probability of accepting a draw offer in `position`.
///
/// Starts at 1 for a level game and falls linearly to 0 once the evaluation
/// magnitude reaches `draw_scale` centipawns, then the profile's adjustment
/// is added and the result clamped to `[0, 1]`. Finished games never accept.
pub fn acceptance_probability<P: RulesOracle>(
    position: &P,
    profile: &DifficultyProfile,
    draw_scale: f64,
) -> f64 {
    if position.status().is_over() {
        return 0.0;
    }

    let evaluation = f64::from(evaluate_position(position).abs());
    let base = (1.0 - evaluation / draw_scale).max(0.0);
    (base + profile.draw_adjustment).clamp(0.0, 1.0)
}

pub fn should_accept_draw<P: RulesOracle, R: Rng + ?Sized>(
    position: &P,
    profile: &DifficultyProfile,
    draw_scale: f64,
    rng: &mut R,
) -> bool {
    let probability = acceptance_probability(position, profile, draw_scale);
    rng.gen::<f64>() < probability
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Difficulty, EngineConfig};
    use chess_core::Board;
    use rand::{rngs::StdRng, SeedableRng};

    const SCALE: f64 = 1000.0;

    fn profile(difficulty: Difficulty) -> DifficultyProfile {
        *EngineConfig::default().profile(difficulty)
    }

    fn board(fen: &str) -> Board {
        Board::from_fen(fen).unwrap()
    }

    #[test]
    fn level_start_position() {
        let start = Board::new();
        assert_eq!(acceptance_probability(&start, &profile(Difficulty::Medium), SCALE), 1.0);
        assert_eq!(acceptance_probability(&start, &profile(Difficulty::Easy), SCALE), 1.0);
        let hard = acceptance_probability(&start, &profile(Difficulty::Hard), SCALE);
        assert!((hard - 0.8).abs() < 1e-9);
    }

    #[test]
    fn probability_falls_with_advantage() {
        let medium = profile(Difficulty::Medium);
        // White is a rook up, then a queen up
        let rook_up = board("4k3/8/8/8/8/8/8/R3K3 w - - 0 1");
        let queen_up = board("4k3/8/8/8/8/8/8/Q3K3 w - - 0 1");
        let p_rook = acceptance_probability(&rook_up, &medium, SCALE);
        let p_queen = acceptance_probability(&queen_up, &medium, SCALE);
        assert!(p_rook > 0.0 && p_rook < 1.0);
        assert!(p_queen < p_rook);

        let expected = 1.0 - f64::from(evaluate_position(&rook_up).abs()) / SCALE;
        assert!((p_rook - expected).abs() < 1e-9);
    }

    #[test]
    fn adjustment_orders_difficulties() {
        let position = board("4k3/8/8/8/8/8/8/R3K3 w - - 0 1");
        let easy = acceptance_probability(&position, &profile(Difficulty::Easy), SCALE);
        let medium = acceptance_probability(&position, &profile(Difficulty::Medium), SCALE);
        let hard = acceptance_probability(&position, &profile(Difficulty::Hard), SCALE);
        assert!(easy > medium && medium > hard);
        assert!((easy - medium - 0.2).abs() < 1e-9);
        assert!((medium - hard - 0.2).abs() < 1e-9);
    }

    #[test]
    fn huge_advantage_clamps_to_zero_or_adjustment() {
        // Two queens and a rook up is well past the scale
        let position = board("4k3/8/8/8/8/8/8/QQR1K3 w - - 0 1");
        assert!(evaluate_position(&position).abs() > 2000);
        assert_eq!(acceptance_probability(&position, &profile(Difficulty::Medium), SCALE), 0.0);
        assert_eq!(acceptance_probability(&position, &profile(Difficulty::Hard), SCALE), 0.0);
        let easy = acceptance_probability(&position, &profile(Difficulty::Easy), SCALE);
        assert!((easy - 0.2).abs() < 1e-9);
    }

    #[test]
    fn finished_games_never_accept() {
        let mated = board("rnb1kbnr/pppp1ppp/8/4p3/6Pq/5P2/PPPPP2P/RNBQKBNR w KQkq - 1 3");
        let stalemate = board("7k/5Q2/6K1/8/8/8/8/8 b - - 0 1");
        let mut rng = StdRng::seed_from_u64(1);
        for position in [&mated, &stalemate] {
            for difficulty in Difficulty::ALL {
                let p = profile(difficulty);
                assert_eq!(acceptance_probability(position, &p, SCALE), 0.0);
                for _ in 0..50 {
                    assert!(!should_accept_draw(position, &p, SCALE, &mut rng));
                }
            }
        }
    }

    #[test]
    fn certain_acceptance_always_accepts() {
        let mut rng = StdRng::seed_from_u64(7);
        let start = Board::new();
        let easy = profile(Difficulty::Easy);
        assert!((0..200).all(|_| should_accept_draw(&start, &easy, SCALE, &mut rng)));
    }

    #[test]
    fn acceptance_rate_tracks_probability() {
        let position = board("4k3/8/8/8/8/8/8/R3K3 w - - 0 1");
        let medium = profile(Difficulty::Medium);
        let p = acceptance_probability(&position, &medium, SCALE);
        let mut rng = StdRng::seed_from_u64(42);
        let trials = 4000;
        let accepted = (0..trials)
            .filter(|_| should_accept_draw(&position, &medium, SCALE, &mut rng))
            .count();
        let rate = accepted as f64 / trials as f64;
        assert!((rate - p).abs() < 0.05, "rate {} vs probability {}", rate, p);
    }
}
