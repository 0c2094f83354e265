//! Per-pixel coverage tests for module, frame and dot shapes.
//!
//! All tests take coordinates local to the shape's box, in module units.

use crate::types::{DotShape, FrameShape, ModuleShape};

/// Which orthogonal neighbours of a module are dark.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Neighbours {
    pub top: bool,
    pub right: bool,
    pub bottom: bool,
    pub left: bool,
}

/// Whether a point inside the unit box survives the rounding of its corners.
/// Radii run clockwise from top-left; zero means square.
fn within_corners(fx: f32, fy: f32, corners: [f32; 4]) -> bool {
    let [tl, tr, br, bl] = corners;
    let outside = |r: f32, cx: f32, cy: f32, in_zone: bool| {
        in_zone && r > 0.0 && (fx - cx).powi(2) + (fy - cy).powi(2) > r * r
    };
    !(outside(tl, tl, tl, fx < tl && fy < tl)
        || outside(tr, 1.0 - tr, tr, fx > 1.0 - tr && fy < tr)
        || outside(br, 1.0 - br, 1.0 - br, fx > 1.0 - br && fy > 1.0 - br)
        || outside(bl, bl, 1.0 - bl, fx < bl && fy > 1.0 - bl))
}

/// Corner radii of a dark module in module units, clockwise from top-left.
///
/// Returns `None` for shapes that are not rounded rectangles (dots).
pub fn module_corners(shape: ModuleShape, n: Neighbours) -> Option<[f32; 4]> {
    let open_tl = !n.top && !n.left;
    let open_tr = !n.top && !n.right;
    let open_br = !n.bottom && !n.right;
    let open_bl = !n.bottom && !n.left;
    let r = |open: bool, radius: f32| if open { radius } else { 0.0 };

    match shape {
        ModuleShape::Square => Some([0.0; 4]),
        ModuleShape::Dots => None,
        ModuleShape::Rounded => Some([
            r(open_tl, 0.5),
            r(open_tr, 0.5),
            r(open_br, 0.5),
            r(open_bl, 0.5),
        ]),
        // Any exposed side rounds the adjoining corners
        ModuleShape::ExtraRounded => Some([
            r(!n.top || !n.left, 0.5),
            r(!n.top || !n.right, 0.5),
            r(!n.bottom || !n.right, 0.5),
            r(!n.bottom || !n.left, 0.5),
        ]),
        ModuleShape::Classy => Some([r(open_tl, 0.5), 0.0, r(open_br, 0.5), 0.0]),
        ModuleShape::ClassyRounded => Some([
            r(open_tl, 0.5),
            r(open_tr, 0.25),
            r(open_br, 0.5),
            r(open_bl, 0.25),
        ]),
    }
}

/// Whether (fx, fy) in `[0, 1)` lies inside a dark module of `shape`.
pub fn module_covers(shape: ModuleShape, n: Neighbours, fx: f32, fy: f32) -> bool {
    match module_corners(shape, n) {
        Some(corners) => within_corners(fx, fy, corners),
        None => (fx - 0.5).powi(2) + (fy - 0.5).powi(2) <= 0.25,
    }
}

/// Whether (x, y) lies in the finder box shrunk by `inset` on every side,
/// with corner radius `r`.
fn in_round_rect(x: f32, y: f32, inset: f32, r: f32) -> bool {
    let (lo, hi) = (inset, 7.0 - inset);
    if x < lo || y < lo || x >= hi || y >= hi {
        return false;
    }
    let cx = x.clamp(lo + r, hi - r);
    let cy = y.clamp(lo + r, hi - r);
    (x - cx).powi(2) + (y - cy).powi(2) <= r * r
}

/// Whether (u, v) in `[0, 7)` lies on the outer ring of a finder pattern.
pub fn frame_covers(shape: FrameShape, u: f32, v: f32) -> bool {
    match shape {
        FrameShape::Square => {
            let inside = |t: f32| (0.0..7.0).contains(&t);
            let hole = |t: f32| (1.0..6.0).contains(&t);
            inside(u) && inside(v) && !(hole(u) && hole(v))
        }
        FrameShape::Dot => {
            let d = ((u - 3.5).powi(2) + (v - 3.5).powi(2)).sqrt();
            (2.5..=3.5).contains(&d)
        }
        FrameShape::ExtraRounded => {
            in_round_rect(u, v, 0.0, 2.5) && !in_round_rect(u, v, 1.0, 1.5)
        }
    }
}

/// Whether (u, v) in `[0, 3)` lies inside the centre of a finder pattern.
pub fn dot_covers(shape: DotShape, u: f32, v: f32) -> bool {
    match shape {
        DotShape::Square => (0.0..3.0).contains(&u) && (0.0..3.0).contains(&v),
        DotShape::Dot => (u - 1.5).powi(2) + (v - 1.5).powi(2) <= 2.25,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALONE: Neighbours = Neighbours {
        top: false,
        right: false,
        bottom: false,
        left: false,
    };

    const SURROUNDED: Neighbours = Neighbours {
        top: true,
        right: true,
        bottom: true,
        left: true,
    };

    #[test]
    fn test_square_covers_corners() {
        assert!(module_covers(ModuleShape::Square, ALONE, 0.01, 0.01));
        assert!(module_covers(ModuleShape::Square, ALONE, 0.99, 0.99));
    }

    #[test]
    fn test_dots_leave_corners_empty() {
        assert!(module_covers(ModuleShape::Dots, SURROUNDED, 0.5, 0.5));
        assert!(!module_covers(ModuleShape::Dots, SURROUNDED, 0.05, 0.05));
    }

    #[test]
    fn test_rounded_only_rounds_exposed_corners() {
        assert!(!module_covers(ModuleShape::Rounded, ALONE, 0.05, 0.05));
        assert!(module_covers(ModuleShape::Rounded, SURROUNDED, 0.05, 0.05));

        let joined_left = Neighbours {
            left: true,
            ..ALONE
        };
        // Top-left touches a neighbour, top-right does not
        assert!(module_covers(ModuleShape::Rounded, joined_left, 0.05, 0.05));
        assert!(!module_covers(ModuleShape::Rounded, joined_left, 0.95, 0.05));
    }

    #[test]
    fn test_classy_keeps_off_diagonal_corners_square() {
        assert!(!module_covers(ModuleShape::Classy, ALONE, 0.05, 0.05));
        assert!(module_covers(ModuleShape::Classy, ALONE, 0.95, 0.05));
        assert!(!module_covers(ModuleShape::Classy, ALONE, 0.95, 0.95));
        assert!(module_covers(ModuleShape::Classy, ALONE, 0.05, 0.95));
    }

    #[test]
    fn test_module_corners() {
        assert_eq!(module_corners(ModuleShape::Dots, ALONE), None);
        assert_eq!(module_corners(ModuleShape::Square, ALONE), Some([0.0; 4]));
        assert_eq!(
            module_corners(ModuleShape::ClassyRounded, ALONE),
            Some([0.5, 0.25, 0.5, 0.25])
        );
        assert_eq!(module_corners(ModuleShape::Rounded, SURROUNDED), Some([0.0; 4]));
    }

    #[test]
    fn test_square_frame_is_a_ring() {
        assert!(frame_covers(FrameShape::Square, 0.5, 3.5));
        assert!(!frame_covers(FrameShape::Square, 3.5, 3.5));
        assert!(!frame_covers(FrameShape::Square, 1.5, 1.5));
    }

    #[test]
    fn test_dot_frame_is_circular() {
        assert!(frame_covers(FrameShape::Dot, 0.5, 3.5));
        assert!(!frame_covers(FrameShape::Dot, 0.2, 0.2));
    }

    #[test]
    fn test_extra_rounded_frame_clips_corners() {
        assert!(!frame_covers(FrameShape::ExtraRounded, 0.1, 0.1));
        assert!(frame_covers(FrameShape::ExtraRounded, 0.5, 3.5));
        assert!(!frame_covers(FrameShape::ExtraRounded, 3.5, 3.5));
    }

    #[test]
    fn test_dot_shapes() {
        assert!(dot_covers(DotShape::Square, 0.1, 0.1));
        assert!(!dot_covers(DotShape::Dot, 0.1, 0.1));
        assert!(dot_covers(DotShape::Dot, 1.5, 1.5));
    }
}
