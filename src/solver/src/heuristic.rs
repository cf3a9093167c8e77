//! Distance-to-goal lower bounds.

use npuzzle_core::NPuzzle;

/// An admissible estimate of the moves left to reach the goal: never
/// more than the true remaining distance, zero exactly at the goal.
/// The driver calls it once per state, before the state enters the
/// frontier.
pub trait Heuristic {
    fn estimate(&self, puzzle: &NPuzzle) -> u64;
}

/// Sum over pieces of the grid distance to their home squares. The
/// board stores canonical indices, so a piece's home square is its own
/// value.
#[derive(Debug, Clone, Copy, Default)]
pub struct Manhattan;

impl Heuristic for Manhattan {
    fn estimate(&self, puzzle: &NPuzzle) -> u64 {
        let size = puzzle.size();
        puzzle
            .board()
            .iter()
            .enumerate()
            .filter(|&(square, _)| square != puzzle.hole_idx())
            .map(|(square, &piece)| {
                let home = usize::from(piece);
                let distance =
                    (square / size).abs_diff(home / size) + (square % size).abs_diff(home % size);
                distance as u64
            })
            .sum()
    }
}

/// Manhattan distance plus two moves for every piece that has to leave
/// its goal line to let another piece pass.
#[derive(Debug, Clone, Copy, Default)]
pub struct LinearConflict;

impl Heuristic for LinearConflict {
    fn estimate(&self, puzzle: &NPuzzle) -> u64 {
        Manhattan.estimate(puzzle) + 2 * leavers(puzzle)
    }
}

/// Pieces that must leave their goal row or column, summed over all
/// lines. Row leavers are in the wrong column and column leavers in the
/// wrong row, so no piece is counted twice.
fn leavers(puzzle: &NPuzzle) -> u64 {
    let size = puzzle.size();
    let mut total = 0;
    for line in 0..size {
        let row: Vec<usize> = (0..size)
            .map(|col| line * size + col)
            .filter(|&square| square != puzzle.hole_idx())
            .map(|square| usize::from(puzzle.board()[square]))
            .filter(|&home| home / size == line)
            .map(|home| home % size)
            .collect();
        total += line_leavers(&row);

        let column: Vec<usize> = (0..size)
            .map(|row| row * size + line)
            .filter(|&square| square != puzzle.hole_idx())
            .map(|square| usize::from(puzzle.board()[square]))
            .filter(|&home| home % size == line)
            .map(|home| home / size)
            .collect();
        total += line_leavers(&column);
    }
    total
}

/// Minimum number of pieces that must leave a line so the rest can be
/// ordered without passing one another: everything outside a longest
/// increasing subsequence of home positions. Counting every reversed
/// pair instead would overestimate and break admissibility.
fn line_leavers(homes: &[usize]) -> u64 {
    if homes.len() < 2 {
        return 0;
    }
    let mut best = vec![1_usize; homes.len()];
    for i in 1..homes.len() {
        for j in 0..i {
            if homes[j] < homes[i] {
                best[i] = best[i].max(best[j] + 1);
            }
        }
    }
    let longest = best.iter().copied().max().unwrap_or(1);
    (homes.len() - longest) as u64
}
