//! Bitmap font for the wordmark.

use std::{collections::BTreeMap, sync::OnceLock};

use living_city_core::RenderDetail;

use crate::LayoutError;

/// Text spelled by the skyline.
pub const WORDMARK_TEXT: &str = "MARKDOWNTOWN";
/// Rows of a standard glyph.
pub const GLYPH_ROWS: usize = 7;
/// Columns of a standard glyph.
pub const GLYPH_COLS: usize = 5;
/// Side of the block each standard cell expands into for HD glyphs.
pub const HD_SCALE: usize = 3;

const FONT: [(char, [&str; GLYPH_ROWS]); 9] = [
    ('M', ["B...B", "BB.BB", "B.B.B", "B...B", "B...B", "B...B", "B...B"]),
    ('A', [".BBB.", "B...B", "B...B", "BBBBB", "B...B", "B...B", "B...B"]),
    ('R', ["BBBB.", "B...B", "B...B", "BBBB.", "B.B..", "B..B.", "B...B"]),
    ('K', ["B...B", "B..B.", "B.B..", "BB...", "B.B..", "B..B.", "B...B"]),
    ('D', ["BBBB.", "B...B", "B...B", "B...B", "B...B", "B...B", "BBBB."]),
    ('O', [".BBB.", "B...B", "B...B", "B...B", "B...B", "B...B", ".BBB."]),
    ('W', ["B...B", "B...B", "B...B", "B.B.B", "B.B.B", "BB.BB", "B...B"]),
    ('N', ["B...B", "BB..B", "B.B.B", "B..BB", "B...B", "B...B", "B...B"]),
    ('T', ["BBBBB", "..B..", "..B..", "..B..", "..B..", "..B..", "..B.."]),
];

/// Grid of filled cells describing one character.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Glyph {
    rows: usize,
    cols: usize,
    cells: Vec<bool>,
}

impl Glyph {
    fn from_rows(rows: &[&str]) -> Self {
        let cols = rows.first().map_or(0, |row| row.len());
        let cells = rows
            .iter()
            .flat_map(|row| row.bytes().map(|cell| cell == b'B'))
            .collect();
        Self {
            rows: rows.len(),
            cols,
            cells,
        }
    }

    fn blank(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            cells: vec![false; rows * cols],
        }
    }

    /// Number of rows in the glyph.
    #[must_use]
    pub const fn rows(&self) -> usize {
        self.rows
    }

    /// Number of columns in the glyph.
    #[must_use]
    pub const fn cols(&self) -> usize {
        self.cols
    }

    /// Whether the cell is filled; cells outside the grid are empty.
    #[must_use]
    pub fn is_filled(&self, row: usize, col: usize) -> bool {
        row < self.rows && col < self.cols && self.cells[row * self.cols + col]
    }

    fn set(&mut self, row: usize, col: usize, filled: bool) {
        let index = row * self.cols + col;
        self.cells[index] = filled;
    }

    /// Expands every filled cell into a `scale`×`scale` block, clearing outer
    /// corners that have no filled neighbour so the letters read as rounded.
    #[must_use]
    pub fn rounded(&self, scale: usize) -> Glyph {
        let mut out = Glyph::blank(self.rows * scale, self.cols * scale);
        if scale == 0 {
            return out;
        }
        for row in 0..self.rows {
            for col in 0..self.cols {
                if !self.is_filled(row, col) {
                    continue;
                }
                let north = row > 0 && self.is_filled(row - 1, col);
                let south = self.is_filled(row + 1, col);
                let west = col > 0 && self.is_filled(row, col - 1);
                let east = self.is_filled(row, col + 1);

                let base_row = row * scale;
                let base_col = col * scale;
                for dr in 0..scale {
                    for dc in 0..scale {
                        out.set(base_row + dr, base_col + dc, true);
                    }
                }

                let last = scale - 1;
                if !north && !west {
                    out.set(base_row, base_col, false);
                }
                if !north && !east {
                    out.set(base_row, base_col + last, false);
                }
                if !south && !west {
                    out.set(base_row + last, base_col, false);
                }
                if !south && !east {
                    out.set(base_row + last, base_col + last, false);
                }
            }
        }
        out
    }

    /// Repeats every cell `factor` times in both directions.
    #[must_use]
    pub fn expanded(&self, factor: usize) -> Glyph {
        if factor <= 1 {
            return self.clone();
        }
        let mut out = Glyph::blank(self.rows * factor, self.cols * factor);
        for row in 0..out.rows {
            for col in 0..out.cols {
                out.set(row, col, self.is_filled(row / factor, col / factor));
            }
        }
        out
    }
}

/// Dimensions of the glyphs in a detail tier.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GlyphMetrics {
    /// Rows per glyph.
    pub rows: usize,
    /// Columns per glyph.
    pub cols: usize,
    /// Multiplier relative to the standard font.
    pub scale: usize,
}

struct GlyphSet {
    glyphs: BTreeMap<char, Glyph>,
    metrics: GlyphMetrics,
}

fn glyph_set(detail: RenderDetail) -> &'static GlyphSet {
    static STANDARD: OnceLock<GlyphSet> = OnceLock::new();
    static HD: OnceLock<GlyphSet> = OnceLock::new();

    match detail {
        RenderDetail::Standard => STANDARD.get_or_init(|| GlyphSet {
            glyphs: FONT
                .iter()
                .map(|(key, rows)| (*key, Glyph::from_rows(rows)))
                .collect(),
            metrics: GlyphMetrics {
                rows: GLYPH_ROWS,
                cols: GLYPH_COLS,
                scale: 1,
            },
        }),
        RenderDetail::Hd => HD.get_or_init(|| GlyphSet {
            glyphs: FONT
                .iter()
                .map(|(key, rows)| (*key, Glyph::from_rows(rows).rounded(HD_SCALE)))
                .collect(),
            metrics: GlyphMetrics {
                rows: GLYPH_ROWS * HD_SCALE,
                cols: GLYPH_COLS * HD_SCALE,
                scale: HD_SCALE,
            },
        }),
    }
}

/// Glyph dimensions for a detail tier.
#[must_use]
pub fn glyph_metrics(detail: RenderDetail) -> GlyphMetrics {
    glyph_set(detail).metrics
}

/// Looks up the glyph for a character, ignoring case.
pub fn glyph(ch: char, detail: RenderDetail) -> Result<&'static Glyph, LayoutError> {
    glyph_set(detail)
        .glyphs
        .get(&ch.to_ascii_uppercase())
        .ok_or(LayoutError::UnknownGlyph { glyph: ch })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_wordmark_character_has_a_glyph() {
        for detail in [RenderDetail::Standard, RenderDetail::Hd] {
            let metrics = glyph_metrics(detail);
            for ch in WORDMARK_TEXT.chars() {
                let glyph = glyph(ch, detail).expect("glyph exists");
                assert_eq!(glyph.rows(), metrics.rows);
                assert_eq!(glyph.cols(), metrics.cols);
            }
        }
    }

    #[test]
    fn lookups_ignore_case_and_reject_unknown_characters() {
        assert!(glyph('m', RenderDetail::Standard).is_ok());
        assert!(matches!(
            glyph('Z', RenderDetail::Standard),
            Err(LayoutError::UnknownGlyph { glyph: 'Z' })
        ));
    }

    #[test]
    fn hd_glyphs_round_isolated_corners() {
        let t = glyph('T', RenderDetail::Hd).expect("glyph exists");
        // Top-left of the crossbar has no neighbour above or to the left.
        assert!(!t.is_filled(0, 0));
        assert!(t.is_filled(1, 1));
        // Interior of the crossbar stays square.
        assert!(t.is_filled(0, 3));
        // Foot of the stem loses both bottom corners.
        assert!(!t.is_filled(20, 6));
        assert!(!t.is_filled(20, 8));
        assert!(t.is_filled(20, 7));
    }

    #[test]
    fn expansion_repeats_cells() {
        let m = glyph('M', RenderDetail::Standard).expect("glyph exists");
        let big = m.expanded(2);
        assert_eq!(big.rows(), 14);
        assert_eq!(big.cols(), 10);
        assert!(big.is_filled(0, 0) && big.is_filled(1, 1));
        assert!(!big.is_filled(0, 2));
    }
}
