//! Text-format loader.
//!
//! A puzzle file is an optional run of blank and comment lines, the side
//! length on its own line, then one line per board row holding exactly N
//! displayed labels. `#` starts a comment anywhere on a line; label 0
//! denotes the empty tile. Labels are translated to canonical square
//! indices here, once, so everything downstream works on canonical
//! boards only.

use crate::puzzle::NPuzzle;
use crate::spiral::SpiralLabels;
use thiserror::Error;

/// Why a puzzle file was rejected. All of these are parse-time and
/// recoverable: reject the input, do not start a search.
#[derive(Error, Debug)]
pub enum MalformedPuzzle {
    #[error("missing or invalid puzzle size")]
    MissingSize,
    #[error("puzzle size {size} is out of range, expected 1..=255")]
    SizeOutOfRange { size: usize },
    #[error("invalid data {found:?} after puzzle size")]
    TrailingAfterSize { found: String },
    #[error("expected a label, got {found:?}")]
    ExpectedLabel { found: String },
    #[error("row holds {actual} labels, expected {expected}")]
    ShortRow { expected: usize, actual: usize },
    #[error("extra data {found:?} after a complete row")]
    TrailingAfterRow { found: String },
    #[error("label {label} does not fit a {size}x{size} board")]
    LabelOutOfRange { label: u64, size: usize },
    #[error("duplicate label {label}")]
    DuplicateLabel { label: u16 },
    #[error("{found:?} found even though the puzzle is complete")]
    ExtraRow { found: String },
    #[error("missing rows, expected {expected} but found {actual}")]
    MissingRows { expected: usize, actual: usize },
    #[error("board holds {actual} labels, expected {expected}")]
    WrongLabelCount { expected: usize, actual: usize },
}

/// Strip a `#` comment and surrounding whitespace; `None` when nothing
/// remains.
fn data_of(line: &str) -> Option<&str> {
    let data = line.split_once('#').map_or(line, |(data, _)| data).trim();
    (!data.is_empty()).then_some(data)
}

impl NPuzzle {
    /// Parse a puzzle from its text form.
    ///
    /// # Errors
    ///
    /// Returns a [`MalformedPuzzle`] describing the first offending
    /// line or label.
    pub fn parse(text: &str) -> Result<Self, MalformedPuzzle> {
        let mut lines = text.lines().filter_map(data_of);

        let size_line = lines.next().ok_or(MalformedPuzzle::MissingSize)?;
        let mut tokens = size_line.split_whitespace();
        let size: usize = tokens
            .next()
            .expect("data lines hold at least one token")
            .parse()
            .map_err(|_| MalformedPuzzle::MissingSize)?;
        let rest = tokens.collect::<Vec<_>>().join(" ");
        if !rest.is_empty() {
            return Err(MalformedPuzzle::TrailingAfterSize { found: rest });
        }
        if !(1..256).contains(&size) {
            return Err(MalformedPuzzle::SizeOutOfRange { size });
        }

        let area = size * size;
        let mut labels: Vec<u16> = Vec::with_capacity(area);
        let mut rows = 0;
        for line in lines {
            if rows == size {
                return Err(MalformedPuzzle::ExtraRow {
                    found: line.to_owned(),
                });
            }
            let tokens: Vec<&str> = line.split_whitespace().collect();
            if tokens.len() < size {
                return Err(MalformedPuzzle::ShortRow {
                    expected: size,
                    actual: tokens.len(),
                });
            }
            if tokens.len() > size {
                return Err(MalformedPuzzle::TrailingAfterRow {
                    found: tokens[size..].join(" "),
                });
            }
            for token in tokens {
                let label: u64 = token.parse().map_err(|_| MalformedPuzzle::ExpectedLabel {
                    found: token.to_owned(),
                })?;
                if label >= area as u64 {
                    return Err(MalformedPuzzle::LabelOutOfRange { label, size });
                }
                // Bounded by 255 * 255 - 1 after the range check.
                #[allow(clippy::cast_possible_truncation)]
                labels.push(label as u16);
            }
            rows += 1;
        }
        if rows < size {
            return Err(MalformedPuzzle::MissingRows {
                expected: size,
                actual: rows,
            });
        }

        Self::from_labels(size, &labels)
    }

    /// Build a state from a raw row-major board of displayed labels,
    /// validating that the labels form a permutation of `0..size²`.
    ///
    /// # Errors
    ///
    /// [`MalformedPuzzle::SizeOutOfRange`], [`MalformedPuzzle::WrongLabelCount`],
    /// [`MalformedPuzzle::LabelOutOfRange`] or [`MalformedPuzzle::DuplicateLabel`].
    pub fn from_labels(size: usize, labels: &[u16]) -> Result<Self, MalformedPuzzle> {
        if !(1..256).contains(&size) {
            return Err(MalformedPuzzle::SizeOutOfRange { size });
        }
        let area = size * size;
        if labels.len() != area {
            return Err(MalformedPuzzle::WrongLabelCount {
                expected: area,
                actual: labels.len(),
            });
        }

        let spiral = SpiralLabels::new(size);
        let mut seen = vec![false; area];
        let mut board = vec![0_u16; area].into_boxed_slice();
        for (square, &label) in labels.iter().enumerate() {
            let Some(home) = spiral.square_of(label) else {
                return Err(MalformedPuzzle::LabelOutOfRange {
                    label: u64::from(label),
                    size,
                });
            };
            if seen[usize::from(label)] {
                return Err(MalformedPuzzle::DuplicateLabel { label });
            }
            seen[usize::from(label)] = true;
            // Bounded by 255 * 255.
            #[allow(clippy::cast_possible_truncation)]
            {
                board[square] = home as u16;
            }
        }

        Ok(Self::from_parts(size, board))
    }
}
