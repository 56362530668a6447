use std::{path::PathBuf, sync::Arc};

use anyhow::{Context, Result};
use chess_core::{Board, Color, STARTING_FEN};
use chess_engine::{
    draw::acceptance_probability, evaluation::game_phase, ChessAI, Difficulty, EngineConfig,
    OpeningBook,
};
use clap::{Parser, Subcommand};
use log::{info, LevelFilter};

#[derive(Parser, Debug)]
#[command(name = "chess-opponent", version, about = "Computer chess opponent")]
struct Cli {
    /// Position to work on
    #[arg(long, global = true, default_value = STARTING_FEN)]
    fen: String,

    #[arg(long, short, global = true, default_value = "medium")]
    difficulty: Difficulty,

    /// Seed for reproducible choices
    #[arg(long, global = true)]
    seed: Option<u64>,

    /// TOML file overriding the difficulty table
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Skip the think delay
    #[arg(long, global = true)]
    instant: bool,

    #[arg(long, short, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the engine's move for the position
    BestMove,
    /// Print the static evaluation in centipawns (positive favours White)
    Eval,
    /// Decide whether to accept a draw offer
    Draw,
    /// Let the engine play both sides
    Play {
        #[arg(long, default_value_t = 20)]
        plies: u32,
    },
}

fn setup_logging(verbose: u8) -> Result<()> {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "{} [{}] {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
                record.level(),
                message
            ))
        })
        .level(level)
        .chain(std::io::stderr())
        .apply()
        .context("installing logger")?;
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose)?;

    let mut config = match &cli.config {
        Some(path) => EngineConfig::from_file(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => EngineConfig::default(),
    };
    if cli.instant {
        config = config.without_delays();
    }

    let board = Board::from_fen(&cli.fen).with_context(|| format!("parsing FEN '{}'", cli.fen))?;
    let book = Arc::new(OpeningBook::new());
    let new_ai = |seed_offset: u64| {
        let book = Arc::clone(&book);
        let ai = match cli.seed {
            Some(seed) => ChessAI::with_seed(book, cli.difficulty, seed.wrapping_add(seed_offset)),
            None => ChessAI::new(book, cli.difficulty),
        };
        ai.with_config(config.clone())
    };

    match cli.command {
        Command::BestMove => {
            let code = new_ai(0).select_move(&board)?;
            if code.is_empty() {
                println!("(none) {:?}", board.status());
            } else {
                println!("{}", code);
            }
        }
        Command::Eval => {
            let ai = new_ai(0);
            println!("score {}", ai.evaluate(&board));
            println!("phase {:.2}", game_phase(&board));
            println!("status {:?}", board.status());
        }
        Command::Draw => {
            let mut ai = new_ai(0);
            let probability =
                acceptance_probability(&board, ai.profile(), ai.config().draw_scale);
            let accepted = ai.should_accept_draw(&board);
            println!("probability {:.3}", probability);
            println!("{}", if accepted { "accept" } else { "decline" });
        }
        Command::Play { plies } => {
            let mut board = board;
            let mut white = new_ai(0);
            let mut black = new_ai(1);
            for _ in 0..plies {
                let side = board.current_turn();
                let number = board.fullmove_number();
                let ai = match side {
                    Color::White => &mut white,
                    Color::Black => &mut black,
                };
                let code = ai.select_move(&board)?;
                if code.is_empty() {
                    break;
                }
                board.make_move_uci(&code)?;
                println!("{} {:?} {}", number, side, code);
            }
            info!("Final position {}", board.to_fen());
            println!("{}", board.to_fen());
            println!("status {:?}", board.status());
        }
    }

    Ok(())
}
