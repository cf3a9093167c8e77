use std::fs;
use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use color_eyre::eyre::{WrapErr, eyre};
use itertools::Itertools;
use npuzzle_core::NPuzzle;
use solver::heuristic::{Heuristic, LinearConflict, Manhattan};
use solver::{Outcome, Search};

/// Solves and generates sliding-tile puzzles
#[derive(Parser)]
#[command(version, about)]
enum Commands {
    /// Solve a puzzle file with weighted A*
    Solve {
        /// The puzzle file to solve
        file: PathBuf,
        /// Weighted-A* weight; 1 searches optimally
        #[arg(short, long, default_value_t = 1)]
        weight: u64,
        /// The heuristic driving the search
        #[arg(long, value_enum, default_value = "linear-conflict")]
        heuristic: HeuristicChoice,
        /// Abandon the search after expanding this many nodes
        #[arg(long)]
        node_budget: Option<u64>,
    },
    /// Generate a random solvable instance and print it
    Generate {
        /// Side length of the board
        size: usize,
        /// Seed for a reproducible scramble
        #[arg(short, long)]
        seed: Option<u64>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum HeuristicChoice {
    Manhattan,
    LinearConflict,
}

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    pretty_env_logger::init();

    match Commands::parse() {
        Commands::Solve {
            file,
            weight,
            heuristic,
            node_budget,
        } => {
            let text = fs::read_to_string(&file)
                .wrap_err_with(|| format!("unable to open n-puzzle file {}", file.display()))?;
            let puzzle = NPuzzle::parse(&text)
                .wrap_err_with(|| format!("{} does not hold a valid puzzle", file.display()))?;

            println!("Puzzle state:\n\n{}\n{}", puzzle.size(), puzzle);

            let outcome = match heuristic {
                HeuristicChoice::Manhattan => solve(Manhattan, puzzle, weight, node_budget),
                HeuristicChoice::LinearConflict => {
                    solve(LinearConflict, puzzle, weight, node_budget)
                }
            };
            report(&outcome);
        }
        Commands::Generate { size, seed } => {
            if !(1..256).contains(&size) {
                return Err(eyre!("the side length must be in 1..=255"));
            }
            let mut rng = seed.map_or_else(fastrand::Rng::new, fastrand::Rng::with_seed);
            let puzzle = NPuzzle::scrambled(size, &mut rng);
            println!("Puzzle state:\n\n{}\n{}", puzzle.size(), puzzle);
        }
    }

    Ok(())
}

fn solve<H: Heuristic>(
    heuristic: H,
    puzzle: NPuzzle,
    weight: u64,
    node_budget: Option<u64>,
) -> Outcome {
    let search = Search::new(heuristic).with_weight(weight);
    let search = match node_budget {
        Some(budget) => search.with_node_budget(budget),
        None => search,
    };
    search.run(puzzle)
}

fn report(outcome: &Outcome) {
    match outcome {
        Outcome::Solved(solution) => {
            println!(
                "Solved in {} moves after expanding {} nodes:",
                solution.moves.len(),
                solution.expanded
            );
            println!("{}", solution.moves.iter().join(" "));
        }
        Outcome::Unsolvable => println!("This puzzle cannot reach the goal."),
        Outcome::Exhausted { expanded } => {
            println!("Search stopped after expanding {expanded} nodes without reaching the goal.");
        }
    }
}
