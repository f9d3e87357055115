//! A built-in 5x7 pixel font for rendering label text as polygons.

use crate::ops::union;
use crate::{Point, Polygon, Rect};

/// Glyph height, in pixels.
const ROWS: usize = 7;
/// Glyph width, in pixels.
const COLS: usize = 5;
/// Horizontal advance per character, in pixels.
const ADVANCE: f64 = 6.;
/// Vertical advance per character in vertical text, in pixels.
const LINE_ADVANCE: f64 = 9.;

/// Returns the glyph bitmap for `c`, one byte per row from top to bottom.
///
/// Bit 4 of each row is the leftmost column. Lowercase letters use the uppercase glyphs.
fn glyph(c: char) -> Option<[u8; ROWS]> {
    let g = match c.to_ascii_uppercase() {
        ' ' => [0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00],
        '0' => [0x0E, 0x11, 0x13, 0x15, 0x19, 0x11, 0x0E],
        '1' => [0x04, 0x0C, 0x04, 0x04, 0x04, 0x04, 0x0E],
        '2' => [0x0E, 0x11, 0x01, 0x02, 0x04, 0x08, 0x1F],
        '3' => [0x1F, 0x02, 0x04, 0x02, 0x01, 0x11, 0x0E],
        '4' => [0x02, 0x06, 0x0A, 0x12, 0x1F, 0x02, 0x02],
        '5' => [0x1F, 0x10, 0x1E, 0x01, 0x01, 0x11, 0x0E],
        '6' => [0x06, 0x08, 0x10, 0x1E, 0x11, 0x11, 0x0E],
        '7' => [0x1F, 0x01, 0x02, 0x04, 0x08, 0x08, 0x08],
        '8' => [0x0E, 0x11, 0x11, 0x0E, 0x11, 0x11, 0x0E],
        '9' => [0x0E, 0x11, 0x11, 0x0F, 0x01, 0x02, 0x0C],
        'A' => [0x0E, 0x11, 0x11, 0x11, 0x1F, 0x11, 0x11],
        'B' => [0x1E, 0x11, 0x11, 0x1E, 0x11, 0x11, 0x1E],
        'C' => [0x0E, 0x11, 0x10, 0x10, 0x10, 0x11, 0x0E],
        'D' => [0x1C, 0x12, 0x11, 0x11, 0x11, 0x12, 0x1C],
        'E' => [0x1F, 0x10, 0x10, 0x1E, 0x10, 0x10, 0x1F],
        'F' => [0x1F, 0x10, 0x10, 0x1E, 0x10, 0x10, 0x10],
        'G' => [0x0E, 0x11, 0x10, 0x17, 0x11, 0x11, 0x0F],
        'H' => [0x11, 0x11, 0x11, 0x1F, 0x11, 0x11, 0x11],
        'I' => [0x0E, 0x04, 0x04, 0x04, 0x04, 0x04, 0x0E],
        'J' => [0x07, 0x02, 0x02, 0x02, 0x02, 0x12, 0x0C],
        'K' => [0x11, 0x12, 0x14, 0x18, 0x14, 0x12, 0x11],
        'L' => [0x10, 0x10, 0x10, 0x10, 0x10, 0x10, 0x1F],
        'M' => [0x11, 0x1B, 0x15, 0x15, 0x11, 0x11, 0x11],
        'N' => [0x11, 0x11, 0x19, 0x15, 0x13, 0x11, 0x11],
        'O' => [0x0E, 0x11, 0x11, 0x11, 0x11, 0x11, 0x0E],
        'P' => [0x1E, 0x11, 0x11, 0x1E, 0x10, 0x10, 0x10],
        'Q' => [0x0E, 0x11, 0x11, 0x11, 0x15, 0x12, 0x0D],
        'R' => [0x1E, 0x11, 0x11, 0x1E, 0x14, 0x12, 0x11],
        'S' => [0x0F, 0x10, 0x10, 0x0E, 0x01, 0x01, 0x1E],
        'T' => [0x1F, 0x04, 0x04, 0x04, 0x04, 0x04, 0x04],
        'U' => [0x11, 0x11, 0x11, 0x11, 0x11, 0x11, 0x0E],
        'V' => [0x11, 0x11, 0x11, 0x11, 0x11, 0x0A, 0x04],
        'W' => [0x11, 0x11, 0x11, 0x15, 0x15, 0x15, 0x0A],
        'X' => [0x11, 0x11, 0x0A, 0x04, 0x0A, 0x11, 0x11],
        'Y' => [0x11, 0x11, 0x11, 0x0A, 0x04, 0x04, 0x04],
        'Z' => [0x1F, 0x01, 0x02, 0x04, 0x08, 0x10, 0x1F],
        '_' => [0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x1F],
        '-' => [0x00, 0x00, 0x00, 0x1F, 0x00, 0x00, 0x00],
        '+' => [0x00, 0x04, 0x04, 0x1F, 0x04, 0x04, 0x00],
        '=' => [0x00, 0x00, 0x1F, 0x00, 0x1F, 0x00, 0x00],
        '.' => [0x00, 0x00, 0x00, 0x00, 0x00, 0x0C, 0x0C],
        '/' => [0x00, 0x01, 0x02, 0x04, 0x08, 0x10, 0x00],
        '(' => [0x02, 0x04, 0x08, 0x08, 0x08, 0x04, 0x02],
        ')' => [0x08, 0x04, 0x02, 0x02, 0x02, 0x04, 0x08],
        _ => return None,
    };
    Some(g)
}

/// Returns `true` if the font can draw `c`.
pub fn has_glyph(c: char) -> bool {
    glyph(c).is_some()
}

/// Horizontal runs of lit pixels in one glyph row, as `[start, stop)` column pairs.
fn runs(row: u8) -> Vec<(usize, usize)> {
    let mut out = Vec::new();
    let mut start = None;
    for col in 0..=COLS {
        let lit = col < COLS && row & (1 << (COLS - 1 - col)) != 0;
        match (lit, start) {
            (true, None) => start = Some(col),
            (false, Some(s)) => {
                out.push((s, col));
                start = None;
            }
            _ => (),
        }
    }
    out
}

/// Renders `text` as merged polygons, `size` units tall.
///
/// The first character's cell has its lower-left corner at the origin. Horizontal text
/// advances in +x; vertical text stacks characters downward in -y. Characters without a
/// glyph are skipped but still take up space.
pub fn render(text: &str, size: f64, vertical: bool) -> Vec<Polygon> {
    let pixel = size / ROWS as f64;
    let mut rects = Vec::new();
    for (idx, c) in text.chars().enumerate() {
        let Some(bitmap) = glyph(c) else {
            continue;
        };
        let origin = if vertical {
            Point::new(0., -(idx as f64) * LINE_ADVANCE * pixel)
        } else {
            Point::new(idx as f64 * ADVANCE * pixel, 0.)
        };
        for (row, bits) in bitmap.iter().enumerate() {
            let y0 = origin.y + (ROWS - 1 - row) as f64 * pixel;
            for (c0, c1) in runs(*bits) {
                rects.push(
                    Rect::new(
                        Point::new(origin.x + c0 as f64 * pixel, y0),
                        Point::new(origin.x + c1 as f64 * pixel, y0 + pixel),
                    )
                    .to_poly(),
                );
            }
        }
    }
    union(&rects)
}

#[cfg(test)]
mod tests {
    use float_eq::assert_float_eq;

    use super::*;
    use crate::bbox::BoundBox;

    #[test]
    fn runs_split_row() {
        assert_eq!(runs(0x11), vec![(0, 1), (4, 5)]);
        assert_eq!(runs(0x1F), vec![(0, 5)]);
        assert!(runs(0).is_empty());
    }

    #[test]
    fn render_height_matches_size() {
        let polys = render("E", 7., false);
        let bbox = polys.bbox();
        assert_float_eq!(bbox.height(), 7., abs <= 1e-9);
        assert_float_eq!(bbox.width(), 5., abs <= 1e-9);
    }

    #[test]
    fn render_blank_text_is_empty() {
        assert!(render("", 10., false).is_empty());
        assert!(render("   ", 10., true).is_empty());
    }

    #[test]
    fn lowercase_uses_uppercase_glyphs() {
        assert!(has_glyph('q'));
        assert!(!has_glyph('#'));
        let lower = render("fe", 7., false);
        let upper = render("FE", 7., false);
        assert_eq!(lower.len(), upper.len());
    }

    #[test]
    fn vertical_text_stacks_down() {
        let bbox = render("II", 7., true).bbox();
        assert_float_eq!(bbox.width(), 3., abs <= 1e-9);
        assert!(bbox.p0.y < 0.);
        assert_float_eq!(bbox.p1.y, 7., abs <= 1e-9);
    }
}
