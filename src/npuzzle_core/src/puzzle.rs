//! The sliding-tile puzzle state and the operations a best-first search
//! driver needs: move application, duplication, solvability
//! classification, and the state ordering used to deduplicate nodes.

use crate::spiral::{self, SpiralLabels};
use crate::zobrist;
use itertools::Itertools;
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

/// One of the four orthogonal moves of the empty square.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];

    #[must_use]
    pub fn opposite(self) -> Self {
        match self {
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Direction::Up => "Up",
            Direction::Down => "Down",
            Direction::Left => "Left",
            Direction::Right => "Right",
        })
    }
}

/// A puzzle state.
///
/// The board stores canonical square indices: every displayed label is
/// translated through [`SpiralLabels`] exactly once, at load time, so
/// the solved board is the identity permutation and a piece's goal
/// square is its own value. The square currently holding the empty tile
/// is tracked by `hole_idx`; the value on that square is always the
/// hole's home square index.
///
/// Equality and hashing are structural over the board alone: two
/// states with the same board compare equal no matter how they were
/// reached. Cost, estimate and predecessor are search bookkeeping and
/// take no part in identity.
#[derive(Debug, Clone)]
pub struct NPuzzle {
    size: usize,
    board: Box<[u16]>,
    hole_idx: usize,
    fingerprint: u64,
    g: u64,
    h: u64,
    parent: Option<usize>,
}

impl NPuzzle {
    /// The solved state for a side length.
    ///
    /// # Panics
    ///
    /// Panics if `size` is outside `1..256`.
    #[must_use]
    pub fn goal(size: usize) -> Self {
        assert!((1..256).contains(&size), "side length must be in 1..256");
        // Squares are bounded by 255 * 255.
        #[allow(clippy::cast_possible_truncation)]
        let board: Box<[u16]> = (0..size * size).map(|square| square as u16).collect();
        Self::from_parts(size, board)
    }

    /// Build a state from an already-canonical board. The hole is the
    /// square holding the hole's home index.
    pub(crate) fn from_parts(size: usize, board: Box<[u16]>) -> Self {
        let home = spiral::hole_home(size);
        let hole_idx = board
            .iter()
            .position(|&piece| usize::from(piece) == home)
            .expect("canonical boards always contain the hole piece");
        let fingerprint = zobrist::board_fingerprint(&board, hole_idx);
        Self {
            size,
            board,
            hole_idx,
            fingerprint,
            g: 0,
            h: 0,
            parent: None,
        }
    }

    /// A random reachable state, produced by walking the hole `8·N²`
    /// steps from the goal. Scrambling by moves can never produce an
    /// unsolvable board.
    #[must_use]
    pub fn scrambled(size: usize, rng: &mut fastrand::Rng) -> Self {
        let mut puzzle = Self::goal(size);
        for _ in 0..8 * size * size {
            let dir = Direction::ALL[rng.usize(..4)];
            puzzle.slide(dir);
        }
        puzzle.g = 0;
        puzzle.parent = None;
        puzzle
    }

    #[must_use]
    pub fn size(&self) -> usize {
        self.size
    }

    /// The board as canonical square indices, row-major.
    #[must_use]
    pub fn board(&self) -> &[u16] {
        &self.board
    }

    /// The physical square currently holding the empty tile.
    #[must_use]
    pub fn hole_idx(&self) -> usize {
        self.hole_idx
    }

    /// Incrementally maintained hash of the whole board. Identical
    /// boards always share a fingerprint; distinct boards collide only
    /// with negligible probability, and [`Self::cmp_state`] absorbs even
    /// those.
    #[must_use]
    pub fn fingerprint(&self) -> u64 {
        self.fingerprint
    }

    /// Moves taken from the initial state to reach this one.
    #[must_use]
    pub fn cost(&self) -> u64 {
        self.g
    }

    /// The heuristic's lower bound on moves left to the goal.
    #[must_use]
    pub fn estimate(&self) -> u64 {
        self.h
    }

    /// Arena handle of the state this one was expanded from.
    #[must_use]
    pub fn parent(&self) -> Option<usize> {
        self.parent
    }

    /// Record the heuristic estimate. Called once per state, before it
    /// enters the frontier.
    pub fn set_estimate(&mut self, h: u64) {
        self.h = h;
    }

    /// Duplicate this state as a child about to be expanded, remembering
    /// `parent` as the handle of `self` in the search arena.
    #[must_use]
    pub fn fork(&self, parent: usize) -> Self {
        let mut child = self.clone();
        child.parent = Some(parent);
        child
    }

    /// The square the hole would move to, or `None` at a wall.
    #[must_use]
    pub fn neighbor(&self, dir: Direction) -> Option<usize> {
        let row = self.hole_idx / self.size;
        let col = self.hole_idx % self.size;
        match dir {
            Direction::Up => (row > 0).then(|| self.hole_idx - self.size),
            Direction::Down => (row + 1 < self.size).then(|| self.hole_idx + self.size),
            Direction::Left => (col > 0).then(|| self.hole_idx - 1),
            Direction::Right => (col + 1 < self.size).then(|| self.hole_idx + 1),
        }
    }

    /// Swap the piece on `target` into the hole, update the fingerprint
    /// incrementally and count the move.
    ///
    /// `target` must be orthogonally adjacent to the hole. Both the
    /// scrambler and the search derive it through [`Self::neighbor`], so
    /// release builds do not re-check.
    pub fn apply(&mut self, target: usize) {
        debug_assert!(
            Direction::ALL
                .iter()
                .any(|&dir| self.neighbor(dir) == Some(target)),
            "move target must be adjacent to the hole"
        );
        let piece = self.board[target];
        let hole_piece = self.board[self.hole_idx];
        self.fingerprint ^= zobrist::move_key(piece, target, self.hole_idx);
        self.board[self.hole_idx] = piece;
        self.board[target] = hole_piece;
        self.hole_idx = target;
        self.g += 1;
    }

    /// Apply the move in `dir` if the hole is not at a wall. Returns
    /// whether a move happened.
    pub fn slide(&mut self, dir: Direction) -> bool {
        match self.neighbor(dir) {
            Some(target) => {
                self.apply(target);
                true
            }
            None => false,
        }
    }

    /// Whether the board is the identity permutation.
    #[must_use]
    pub fn is_solved(&self) -> bool {
        self.board
            .iter()
            .enumerate()
            .all(|(square, &piece)| usize::from(piece) == square)
    }

    /// Whether the goal is reachable from this state at all, by the
    /// classical parity argument: odd side lengths are solvable iff the
    /// inversion count is even; even side lengths compare the inversion
    /// parity with the hole's row plus a size-dependent bit.
    #[must_use]
    pub fn is_solvable(&self) -> bool {
        let mut pieces: Vec<u16> = self
            .board
            .iter()
            .enumerate()
            .filter(|&(square, _)| square != self.hole_idx)
            .map(|(_, &piece)| piece)
            .collect();
        let mut scratch = Vec::with_capacity(pieces.len());
        let inversions = count_inversions(&mut pieces, &mut scratch);

        if self.size % 2 == 1 {
            inversions % 2 == 0
        } else {
            let parity = usize::from(self.size & 2 != 0);
            (self.hole_idx / self.size + parity) % 2 == inversions % 2
        }
    }

    /// Total order used to deduplicate states: fingerprint first, then
    /// the full board, so a hash collision can never make two distinct
    /// boards compare equal.
    #[must_use]
    pub fn cmp_state(&self, other: &Self) -> Ordering {
        self.fingerprint
            .cmp(&other.fingerprint)
            .then_with(|| self.board.cmp(&other.board))
    }

    /// The board translated back to displayed labels, row-major.
    #[must_use]
    pub fn raw_labels(&self) -> Vec<u16> {
        let spiral = SpiralLabels::new(self.size);
        self.board
            .iter()
            .map(|&piece| spiral.label_at(usize::from(piece)))
            .collect()
    }
}

impl PartialEq for NPuzzle {
    fn eq(&self, other: &Self) -> bool {
        self.cmp_state(other) == Ordering::Equal
    }
}

impl Eq for NPuzzle {}

impl Hash for NPuzzle {
    fn hash<S: Hasher>(&self, state: &mut S) {
        // Equality falls back to the board; hashing the fingerprint
        // alone keeps map lookups cheap and stays consistent with it.
        self.fingerprint.hash(state);
    }
}

impl fmt::Display for NPuzzle {
    /// Renders displayed labels right-justified to the width of the
    /// largest label, one board row per line, in the same shape the
    /// loader parses.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let labels = self.raw_labels();
        let width = (self.size * self.size - 1).to_string().len();
        for row in labels.chunks(self.size) {
            let line = row
                .iter()
                .format_with(" ", |label, fmt| fmt(&format_args!("{label:>width$}")));
            writeln!(f, "{line}")?;
        }
        Ok(())
    }
}

/// Count pairs appearing in descending order, sorting `pieces` as a side
/// effect. Merge-sort keeps this `O(n log n)`; the result is identical
/// to the quadratic pair count.
fn count_inversions(pieces: &mut [u16], scratch: &mut Vec<u16>) -> usize {
    let n = pieces.len();
    if n < 2 {
        return 0;
    }
    let mid = n / 2;
    let mut inversions =
        count_inversions(&mut pieces[..mid], scratch) + count_inversions(&mut pieces[mid..], scratch);

    scratch.clear();
    let (left, right) = pieces.split_at(mid);
    let (mut i, mut j) = (0, 0);
    while i < left.len() && j < right.len() {
        if left[i] <= right[j] {
            scratch.push(left[i]);
            i += 1;
        } else {
            // right[j] precedes every remaining element of the sorted
            // left half.
            inversions += left.len() - i;
            scratch.push(right[j]);
            j += 1;
        }
    }
    scratch.extend_from_slice(&left[i..]);
    scratch.extend_from_slice(&right[j..]);
    pieces.copy_from_slice(scratch);
    inversions
}

#[cfg(test)]
mod tests {
    use super::*;

    /// The literal quadratic pair count the classifier must agree with.
    fn naive_inversions(board: &[u16], hole_idx: usize) -> usize {
        let mut inversions = 0;
        for sq1 in 0..board.len() {
            if sq1 == hole_idx {
                continue;
            }
            for sq2 in sq1 + 1..board.len() {
                if sq2 != hole_idx && board[sq1] > board[sq2] {
                    inversions += 1;
                }
            }
        }
        inversions
    }

    #[test]
    fn goal_is_solved_and_solvable() {
        for size in 1..=8 {
            let goal = NPuzzle::goal(size);
            assert!(goal.is_solved());
            assert!(goal.is_solvable());
            assert_eq!(goal.cost(), 0);
            assert_eq!(goal.hole_idx(), spiral::hole_home(size));
        }
    }

    #[test]
    fn slide_then_opposite_restores_everything() {
        let mut puzzle = NPuzzle::goal(4);
        let before = puzzle.clone();

        assert!(puzzle.slide(Direction::Up));
        assert_ne!(puzzle.board(), before.board());
        assert_ne!(puzzle.fingerprint(), before.fingerprint());

        assert!(puzzle.slide(Direction::Down));
        assert_eq!(puzzle.board(), before.board());
        assert_eq!(puzzle.hole_idx(), before.hole_idx());
        assert_eq!(puzzle.fingerprint(), before.fingerprint());
        assert_eq!(puzzle.cost(), 2);
    }

    #[test]
    fn reversed_walk_restores_everything() {
        let mut rng = fastrand::Rng::with_seed(0x5eed);
        let mut puzzle = NPuzzle::scrambled(5, &mut rng);
        let before = puzzle.clone();

        let mut walked = Vec::new();
        for _ in 0..200 {
            let dir = Direction::ALL[rng.usize(..4)];
            if puzzle.slide(dir) {
                walked.push(dir);
            }
        }
        for dir in walked.into_iter().rev() {
            assert!(puzzle.slide(dir.opposite()));
        }

        assert_eq!(puzzle.board(), before.board());
        assert_eq!(puzzle.hole_idx(), before.hole_idx());
        assert_eq!(puzzle.fingerprint(), before.fingerprint());
    }

    #[test]
    fn fingerprint_is_board_determined() {
        // Reach the same board twice along different move sequences.
        let mut a = NPuzzle::goal(3);
        a.slide(Direction::Up);
        a.slide(Direction::Left);

        let mut b = NPuzzle::goal(3);
        b.slide(Direction::Left);
        b.slide(Direction::Up);

        assert_ne!(a, b);
        assert_ne!(a.fingerprint(), b.fingerprint());

        // And along a detour that returns to b's board.
        let mut c = NPuzzle::goal(3);
        c.slide(Direction::Left);
        c.slide(Direction::Up);
        c.slide(Direction::Down);
        c.slide(Direction::Up);
        assert_eq!(b, c);
        assert_eq!(b.fingerprint(), c.fingerprint());

        // The incremental value matches a from-scratch fold.
        assert_eq!(
            c.fingerprint(),
            zobrist::board_fingerprint(c.board(), c.hole_idx())
        );
    }

    #[test]
    fn equality_ignores_history() {
        let mut rng = fastrand::Rng::with_seed(7);
        let scrambled = NPuzzle::scrambled(4, &mut rng);
        let reloaded = NPuzzle::from_labels(4, &scrambled.raw_labels()).unwrap();

        assert_eq!(scrambled, reloaded);
        assert_eq!(scrambled.cmp_state(&reloaded), Ordering::Equal);
        assert_eq!(scrambled.fingerprint(), reloaded.fingerprint());
    }

    #[test]
    fn distinct_boards_never_compare_equal() {
        let mut a = NPuzzle::goal(3);
        let b = NPuzzle::goal(3);
        a.slide(Direction::Up);
        assert_ne!(a, b);
        assert_ne!(a.cmp_state(&b), Ordering::Equal);
    }

    #[test]
    fn scrambles_are_always_solvable() {
        for seed in 0..20 {
            let mut rng = fastrand::Rng::with_seed(seed);
            for size in 2..=5 {
                assert!(NPuzzle::scrambled(size, &mut rng).is_solvable());
            }
        }
    }

    #[test]
    fn fifteen_puzzle_parity_fixtures() {
        // Zero inversions: the goal itself.
        assert!(NPuzzle::goal(4).is_solvable());

        // Exactly one inversion: swap the two top-left pieces of the
        // solved board.
        let mut labels = NPuzzle::goal(4).raw_labels();
        labels.swap(0, 1);
        let swapped = NPuzzle::from_labels(4, &labels).unwrap();
        assert_eq!(naive_inversions(swapped.board(), swapped.hole_idx()), 1);
        assert!(!swapped.is_solvable());
    }

    #[test]
    fn merge_count_matches_naive_count() {
        let mut rng = fastrand::Rng::with_seed(42);
        for size in 2..=6 {
            for _ in 0..10 {
                let puzzle = NPuzzle::scrambled(size, &mut rng);
                let mut pieces: Vec<u16> = puzzle
                    .board()
                    .iter()
                    .enumerate()
                    .filter(|&(square, _)| square != puzzle.hole_idx())
                    .map(|(_, &piece)| piece)
                    .collect();
                let mut scratch = Vec::with_capacity(pieces.len());
                assert_eq!(
                    count_inversions(&mut pieces, &mut scratch),
                    naive_inversions(puzzle.board(), puzzle.hole_idx())
                );
            }
        }
    }

    #[test]
    fn display_round_trips_through_the_parser() {
        let mut rng = fastrand::Rng::with_seed(9);
        let puzzle = NPuzzle::scrambled(4, &mut rng);
        let text = format!("{}\n{}", puzzle.size(), puzzle);
        let reparsed = NPuzzle::parse(&text).unwrap();
        assert_eq!(puzzle, reparsed);
    }

    #[test]
    fn single_square_board() {
        let mut puzzle = NPuzzle::goal(1);
        assert!(puzzle.is_solved());
        assert!(puzzle.is_solvable());
        for dir in Direction::ALL {
            assert_eq!(puzzle.neighbor(dir), None);
            assert!(!puzzle.slide(dir));
        }
    }

    #[test]
    fn fork_links_to_the_parent() {
        let root = NPuzzle::goal(3);
        let mut child = root.fork(0);
        assert_eq!(child.parent(), Some(0));
        assert_eq!(child.cost(), root.cost());
        child.slide(Direction::Up);
        assert_eq!(child.cost(), root.cost() + 1);
        assert_eq!(root.parent(), None);
    }
}
