/// Play one seeded random-vs-random episode and print the board after each ply
///
/// Usage: cargo run --example random_rollout -- [seed] [offset]
/// Set RUST_LOG=debug to see the environment's step logs.
use std::collections::HashMap;

use gym_othello::{Cell, EnvConfig, OthelloEnv, Player, ResetOptions, StepInfo};
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let mut args = std::env::args().skip(1);
    let seed: u64 = args.next().and_then(|s| s.parse().ok()).unwrap_or(42);
    let offset: Option<u32> = args.next().and_then(|s| s.parse().ok());

    let mut env = OthelloEnv::new(EnvConfig::default().with_env_overrides().with_seed(seed));
    let (_, info) = env.reset(None, ResetOptions { offset });

    println!("=== Othello random rollout (seed {seed}) ===\n");
    print_board(&info);

    let mut ply = 0;
    let mut totals: HashMap<Player, f32> = HashMap::new();

    while !env.is_terminated() {
        let player = env.current_player();
        let Some(index) = env.sample_legal_action() else {
            break;
        };

        let result = env.step(&HashMap::from([(player, index)]));
        ply += 1;

        println!("Ply {ply}: {player} plays ({}, {})", index % 8, index / 8);
        print_board(&result.info);
        for p in Player::ALL {
            *totals.entry(p).or_default() += result.rewards[p];
        }
    }

    let white = env.count(Player::White);
    let black = env.count(Player::Black);
    println!("Final: white {white}, black {black}");
    match white.cmp(&black) {
        std::cmp::Ordering::Greater => println!("WHITE WINS"),
        std::cmp::Ordering::Less => println!("BLACK WINS"),
        std::cmp::Ordering::Equal => println!("DRAW"),
    }
    println!(
        "Episode return: white {:.2}, black {:.2}",
        totals.get(&Player::White).copied().unwrap_or_default(),
        totals.get(&Player::Black).copied().unwrap_or_default()
    );
}

fn print_board(info: &StepInfo) {
    println!("  0 1 2 3 4 5 6 7");
    for (row, cells) in info.board.iter().enumerate() {
        print!("{row} ");
        for cell in cells {
            let symbol = match cell {
                Cell::Empty => ".",
                Cell::White => "○",
                Cell::Black => "●",
            };
            print!("{symbol} ");
        }
        println!();
    }
    println!("White: {}, Black: {}\n", info.white_count, info.black_count);
}
