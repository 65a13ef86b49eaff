//! Oriented/storage coordinate remapping and orientation composition.
//!
//! The four orientations form a cyclic group under composition (rotating by
//! `HomeOnRight` twice is the same as rotating by `HomeOnTop` once, and so
//! on), but the ordinal values assigned to the variants do not increase in
//! rotation order — `HomeOnLeft` (ordinal 2) is three quarter-turns
//! counter-clockwise, `HomeOnTop` (ordinal 3) is two. `COMPOSE` below is the
//! 4x4 dispatch table for `current . applied`, taken directly from the
//! source macro rather than derived from the ordinals, so the awkward
//! ordinal assignment can't silently go stale.

use super::Orientation;

/// `current . applied`: the resulting orientation after an image already at
/// orientation `current` has `applied` rotated onto it.
///
/// Row = current orientation, column = applied orientation, both ordered
/// `[HomeBottom, HomeRight, HomeLeft, HomeTop]`.
const COMPOSE: [[Orientation; 4]; 4] = {
    use Orientation::{HomeBottom, HomeLeft, HomeRight, HomeTop};
    [
        [HomeBottom, HomeRight, HomeLeft, HomeTop],
        [HomeRight, HomeTop, HomeBottom, HomeLeft],
        [HomeLeft, HomeBottom, HomeTop, HomeRight],
        [HomeTop, HomeLeft, HomeRight, HomeBottom],
    ]
};

/// Composes two orientations: the orientation a `current`-oriented image
/// ends up at after rotating it by `applied`.
#[must_use]
pub fn compose(current: Orientation, applied: Orientation) -> Orientation {
    COMPOSE[current as usize][applied as usize]
}

/// Maps an oriented point to its storage coordinates.
///
/// `w`/`h` are the *storage* extents (the raw buffer's width/height, not the
/// oriented size). `o` selects the orientation.
#[must_use]
pub fn shift_xy(x: i64, y: i64, w: i64, h: i64, o: Orientation) -> (i64, i64) {
    let (w, h) = (w - 1, h - 1);
    match o {
        Orientation::HomeBottom => (x, y),
        Orientation::HomeRight => (w - y, x),
        Orientation::HomeLeft => (y, h - x),
        Orientation::HomeTop => (w - x, h - y),
    }
}

/// Inverse of [`shift_xy`]: maps a storage point back to oriented coordinates.
#[must_use]
pub fn unshift_xy(x: i64, y: i64, w: i64, h: i64, o: Orientation) -> (i64, i64) {
    let (w, h) = (w - 1, h - 1);
    match o {
        Orientation::HomeBottom => (x, y),
        Orientation::HomeRight => (y, w - x),
        Orientation::HomeLeft => (h - y, x),
        Orientation::HomeTop => (w - x, h - y),
    }
}

/// Maps an oriented rectangle (given as two corners) to a storage rectangle,
/// reordering so the first corner returned is the storage top-left.
#[must_use]
pub fn shift_rect(x1: i64, y1: i64, x2: i64, y2: i64, w: i64, h: i64, o: Orientation) -> (i64, i64, i64, i64) {
    let (mut sx1, mut sy1) = shift_xy(x1, y1, w, h, o);
    let (mut sx2, mut sy2) = shift_xy(x2, y2, w, h, o);
    if sx1 > sx2 {
        std::mem::swap(&mut sx1, &mut sx2);
    }
    if sy1 > sy2 {
        std::mem::swap(&mut sy1, &mut sy2);
    }
    (sx1, sy1, sx2, sy2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use Orientation::{HomeBottom, HomeLeft, HomeRight, HomeTop};

    const ALL: [Orientation; 4] = [HomeBottom, HomeRight, HomeLeft, HomeTop];

    #[test]
    fn compose_identity_on_home_bottom() {
        for o in ALL {
            assert_eq!(compose(o, HomeBottom), o);
            assert_eq!(compose(HomeBottom, o), o);
        }
    }

    #[test]
    fn compose_is_a_group_addition_in_rotation_order() {
        // Four applications of any single rotation must return to the start.
        for o in ALL {
            let mut cur = HomeBottom;
            for _ in 0..4 {
                cur = compose(cur, o);
            }
            assert_eq!(cur, HomeBottom, "rotation {o:?} doesn't cycle back in 4 steps");
        }
    }

    #[test]
    fn compose_exhaustive_16_pairs_matches_table() {
        // Spot-check against the source macro's table for every (current, applied) pair.
        let expect = |oo: Orientation, fo: Orientation| -> Orientation {
            match fo {
                HomeBottom => oo,
                HomeRight => match oo {
                    HomeBottom => HomeRight,
                    HomeRight => HomeTop,
                    HomeLeft => HomeBottom,
                    HomeTop => HomeLeft,
                },
                HomeLeft => match oo {
                    HomeBottom => HomeLeft,
                    HomeRight => HomeBottom,
                    HomeLeft => HomeTop,
                    HomeTop => HomeRight,
                },
                HomeTop => match oo {
                    HomeBottom => HomeTop,
                    HomeRight => HomeLeft,
                    HomeLeft => HomeRight,
                    HomeTop => HomeBottom,
                },
            }
        };
        for oo in ALL {
            for fo in ALL {
                assert_eq!(compose(oo, fo), expect(oo, fo), "mismatch at ({oo:?}, {fo:?})");
            }
        }
    }

    #[test]
    fn shift_unshift_round_trip() {
        let (w, h) = (7, 11);
        for o in ALL {
            for x in 0..w {
                for y in 0..h {
                    let (sx, sy) = shift_xy(x, y, w, h, o);
                    let (ox, oy) = unshift_xy(sx, sy, w, h, o);
                    assert_eq!((ox, oy), (x, y), "orientation {o:?} failed round trip at ({x},{y})");
                }
            }
        }
    }

    #[test]
    fn scenario_4x2_home_right() {
        // Image 4x2 (storage), orientation = HomeRight.
        // Oriented (0,0) stores at (W-1-0, 0) = (3, 0).
        // Oriented (1,0) stores at (3, 1).
        assert_eq!(shift_xy(0, 0, 4, 2, HomeRight), (3, 0));
        assert_eq!(shift_xy(1, 0, 4, 2, HomeRight), (3, 1));
    }
}
