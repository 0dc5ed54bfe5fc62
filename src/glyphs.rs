//! 5x5 bitmap font for the decimal digits.

use crate::MATRIX_SIDE;

/// One digit's lit mask, indexed `[row][column]`, row 0 at the top.
pub type Glyph = [[bool; MATRIX_SIDE]; MATRIX_SIDE];

const O: bool = false;
const X: bool = true;

/// Glyphs for the digits 0 to 9, in that order.
pub const DIGITS: [Glyph; 10] = [
    // 0
    [
        [O, X, X, X, O],
        [O, X, O, X, O],
        [O, X, O, X, O],
        [O, X, O, X, O],
        [O, X, X, X, O],
    ],
    // 1
    [
        [O, O, X, O, O],
        [O, O, X, O, O],
        [O, O, X, O, O],
        [O, X, X, O, O],
        [O, O, X, O, O],
    ],
    // 2
    [
        [O, X, X, X, O],
        [O, X, O, O, O],
        [O, X, X, X, O],
        [O, O, O, X, O],
        [O, X, X, X, O],
    ],
    // 3
    [
        [O, X, X, X, O],
        [O, O, O, X, O],
        [O, X, X, X, O],
        [O, O, O, X, O],
        [O, X, X, X, O],
    ],
    // 4
    [
        [O, X, O, O, O],
        [O, O, O, X, O],
        [O, X, X, X, O],
        [O, X, O, X, O],
        [O, X, O, X, O],
    ],
    // 5
    [
        [O, X, X, X, O],
        [O, O, O, X, O],
        [O, X, X, X, O],
        [O, X, O, O, O],
        [O, X, X, X, O],
    ],
    // 6
    [
        [O, X, X, X, O],
        [O, X, O, X, O],
        [O, X, X, X, O],
        [O, X, O, O, O],
        [O, X, X, X, O],
    ],
    // 7
    [
        [O, X, O, O, O],
        [O, O, O, X, O],
        [O, X, O, O, O],
        [O, O, O, X, O],
        [O, X, X, X, O],
    ],
    // 8
    [
        [O, X, X, X, O],
        [O, X, O, X, O],
        [O, X, X, X, O],
        [O, X, O, X, O],
        [O, X, X, X, O],
    ],
    // 9
    [
        [O, X, X, X, O],
        [O, O, O, X, O],
        [O, X, X, X, O],
        [O, X, O, X, O],
        [O, X, X, X, O],
    ],
];

/// Glyph for `digit`, or `None` when it is not a single decimal digit.
pub fn glyph(digit: u8) -> Option<&'static Glyph> {
    DIGITS.get(usize::from(digit))
}

/// Whether cell `index` of the row-major pixel buffer is lit in `glyph`.
pub fn is_lit(glyph: &Glyph, index: usize) -> bool {
    glyph[index / MATRIX_SIDE][index % MATRIX_SIDE]
}
