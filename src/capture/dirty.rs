//! Tile-based dirty-rectangle detection.
//!
//! Divides a frame into a fixed-size tile grid, hashes each tile on both
//! sides of a comparison, and coalesces adjacent changed tiles into
//! axis-aligned rectangles.

use crate::pixel::Rect;

/// A cheap, non-cryptographic hash good enough to detect byte-for-byte tile
/// changes; collisions would only cause a missed dirty tile, and the teacher
/// corpus (`des`/`flate2`) has no hashing dependency of its own to reuse, so
/// this stays a small FNV-1a rather than pulling in a crate for it.
fn hash_tile(data: &[u8], stride: usize, x0: usize, y0: usize, w: usize, h: usize) -> u64 {
    let mut hash: u64 = 0xcbf29ce484222325;
    for row in y0..y0 + h {
        let start = row * stride + x0 * 4;
        let end = start + w * 4;
        for &byte in &data[start..end] {
            hash ^= u64::from(byte);
            hash = hash.wrapping_mul(0x100000001b3);
        }
    }
    hash
}

/// Computes dirty rectangles between `prev` and `curr`, two RGBA8 buffers of
/// identical `width`/`height`, using a tile grid of `tile_size` pixels.
///
/// Both buffers MUST be tightly packed (stride == `width * 4`) and the same
/// length; mismatched buffers are treated as fully dirty.
#[must_use]
pub fn dirty_rects(prev: &[u8], curr: &[u8], width: u32, height: u32, tile_size: u32) -> Vec<Rect> {
    if prev.len() != curr.len() || prev.is_empty() {
        return vec![Rect::new(0, 0, i64::from(width), i64::from(height))];
    }

    let tile_size = tile_size.max(1);
    let stride = (width as usize) * 4;
    let cols = width.div_ceil(tile_size) as usize;
    let rows = height.div_ceil(tile_size) as usize;

    let mut changed = vec![false; cols * rows];
    for ty in 0..rows {
        for tx in 0..cols {
            let x0 = tx * tile_size as usize;
            let y0 = ty * tile_size as usize;
            let w = (tile_size as usize).min(width as usize - x0);
            let h = (tile_size as usize).min(height as usize - y0);
            let ha = hash_tile(prev, stride, x0, y0, w, h);
            let hb = hash_tile(curr, stride, x0, y0, w, h);
            changed[ty * cols + tx] = ha != hb;
        }
    }

    coalesce(&changed, cols, rows, tile_size, width, height)
}

/// Coalesces a grid of changed-tile flags into axis-aligned pixel rects: one
/// rect per maximal run of changed tiles within a row, then merges
/// vertically-adjacent runs sharing the same horizontal span.
fn coalesce(changed: &[bool], cols: usize, rows: usize, tile_size: u32, width: u32, height: u32) -> Vec<Rect> {
    let mut row_runs: Vec<Vec<(usize, usize)>> = vec![Vec::new(); rows];
    for ty in 0..rows {
        let mut tx = 0;
        while tx < cols {
            if changed[ty * cols + tx] {
                let start = tx;
                while tx < cols && changed[ty * cols + tx] {
                    tx += 1;
                }
                row_runs[ty].push((start, tx));
            } else {
                tx += 1;
            }
        }
    }

    let mut rects = Vec::new();
    let mut consumed = vec![vec![false; row_runs.iter().map(Vec::len).max().unwrap_or(0) + 1]; rows];

    for ty in 0..rows {
        for (i, &(start, end)) in row_runs[ty].iter().enumerate() {
            if consumed[ty][i] {
                continue;
            }
            let mut bottom = ty + 1;
            while bottom < rows {
                let Some(j) = row_runs[bottom].iter().position(|&r| r == (start, end)) else {
                    break;
                };
                if consumed[bottom][j] {
                    break;
                }
                bottom += 1;
            }
            for (row, runs) in row_runs.iter().enumerate().take(bottom).skip(ty) {
                if let Some(j) = runs.iter().position(|&r| r == (start, end)) {
                    consumed[row][j] = true;
                }
            }

            let x = (start as u32) * tile_size;
            let y = (ty as u32) * tile_size;
            let w = ((end as u32) * tile_size).min(width) - x;
            let h = ((bottom as u32) * tile_size).min(height) - y;
            rects.push(Rect::new(i64::from(x), i64::from(y), i64::from(w), i64::from(h)));
        }
    }
    rects
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid(width: u32, height: u32, value: u8) -> Vec<u8> {
        vec![value; (width as usize) * (height as usize) * 4]
    }

    #[test]
    fn identical_buffers_yield_no_dirty_rects() {
        let a = solid(8, 8, 1);
        let b = a.clone();
        assert!(dirty_rects(&a, &b, 8, 8, 4).is_empty());
    }

    #[test]
    fn a_single_changed_pixel_marks_its_tile_dirty() {
        let a = solid(8, 8, 0);
        let mut b = a.clone();
        b[0] = 255;
        let rects = dirty_rects(&a, &b, 8, 8, 4);
        assert_eq!(rects.len(), 1);
        assert_eq!(rects[0], Rect::new(0, 0, 4, 4));
    }

    #[test]
    fn mismatched_buffer_lengths_are_fully_dirty() {
        let a = solid(4, 4, 0);
        let b = solid(8, 8, 0);
        let rects = dirty_rects(&a, &b, 4, 4, 4);
        assert_eq!(rects, vec![Rect::new(0, 0, 4, 4)]);
    }

    #[test]
    fn empty_previous_buffer_is_fully_dirty() {
        let a: Vec<u8> = vec![];
        let b = solid(4, 4, 0);
        let rects = dirty_rects(&a, &b, 4, 4, 4);
        assert_eq!(rects, vec![Rect::new(0, 0, 4, 4)]);
    }
}
