//! Axis-aligned rectangles and the shared collision resolver
//!
//! Everything solid in Echo Step is an axis-aligned rectangle: platforms,
//! echoes, the player, buttons, triggers, hazards. The resolver separates a
//! moving rectangle from a set of obstacles along the axis of least
//! penetration, one obstacle at a time.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::RESOLVE_EPS;

/// An axis-aligned rectangle in world pixels, +y down.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }

    pub fn from_pos_size(pos: Vec2, w: f32, h: f32) -> Self {
        Self { x: pos.x, y: pos.y, w, h }
    }

    /// Build a rect of `w` x `h` centered on `center`.
    pub fn centered(center: Vec2, w: f32, h: f32) -> Self {
        Self { x: center.x - w / 2.0, y: center.y - h / 2.0, w, h }
    }

    #[inline]
    pub fn right(&self) -> f32 {
        self.x + self.w
    }

    #[inline]
    pub fn bottom(&self) -> f32 {
        self.y + self.h
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(self.x + self.w / 2.0, self.y + self.h / 2.0)
    }

    /// Open-interval overlap test: rectangles that merely touch along an edge
    /// do not count as overlapping.
    pub fn overlaps(&self, other: &Rect) -> bool {
        !(self.right() <= other.x
            || self.x >= other.right()
            || self.bottom() <= other.y
            || self.y >= other.bottom())
    }

    /// Overlap extent along x; meaningful only when `overlaps` holds.
    pub fn overlap_x(&self, other: &Rect) -> f32 {
        self.right().min(other.right()) - self.x.max(other.x)
    }

    /// Overlap extent along y; meaningful only when `overlaps` holds.
    pub fn overlap_y(&self, other: &Rect) -> f32 {
        self.bottom().min(other.bottom()) - self.y.max(other.y)
    }
}

/// Outcome of resolving a moving rectangle against a set of obstacles.
#[derive(Debug, Clone, Copy, Default)]
pub struct Resolution {
    /// The body came to rest against gravity this pass.
    pub grounded: bool,
    /// Index of the supporting obstacle, when grounded.
    pub grounded_on: Option<usize>,
}

/// Separation passes per resolve call. A body can overlap at most a handful
/// of obstacles after one integration step.
const MAX_PASSES: usize = 8;

/// Separate a `w` x `h` body at `pos` from `obstacles`, resolving along the
/// axis with the smaller overlap and zeroing that axis of `vel`.
///
/// When a body overlaps several obstacles at once, each pass resolves the one
/// with the largest overlap area first; this replaces the original's
/// iteration-order dependence with an explicit deterministic tie-break.
///
/// `ground_dir` is +1.0 under normal gravity and -1.0 when inverted; coming
/// to rest against that direction sets `grounded`.
pub fn resolve_rect(
    pos: &mut Vec2,
    vel: &mut Vec2,
    w: f32,
    h: f32,
    obstacles: &[Rect],
    ground_dir: f32,
) -> Resolution {
    let mut out = Resolution::default();
    for _ in 0..MAX_PASSES {
        let body = Rect::from_pos_size(*pos, w, h);
        let mut deepest: Option<(usize, f32)> = None;
        for (i, ob) in obstacles.iter().enumerate() {
            if !body.overlaps(ob) {
                continue;
            }
            let area = body.overlap_x(ob) * body.overlap_y(ob);
            if deepest.map_or(true, |(_, best)| area > best) {
                deepest = Some((i, area));
            }
        }
        let Some((idx, _)) = deepest else { break };
        let ob = &obstacles[idx];
        let overlap_x = body.overlap_x(ob);
        let overlap_y = body.overlap_y(ob);

        if overlap_y < overlap_x {
            if vel.y * ground_dir > 0.0 {
                // Moving with gravity: landed.
                pos.y = if ground_dir > 0.0 {
                    ob.y - h - RESOLVE_EPS
                } else {
                    ob.bottom() + RESOLVE_EPS
                };
                vel.y = 0.0;
                out.grounded = true;
                out.grounded_on = Some(idx);
            } else if vel.y * ground_dir < 0.0 {
                // Moving against gravity: bumped the underside.
                pos.y = if ground_dir > 0.0 {
                    ob.bottom() + RESOLVE_EPS
                } else {
                    ob.y - h - RESOLVE_EPS
                };
                vel.y = 0.0;
            } else {
                break;
            }
        } else if vel.x > 0.0 {
            pos.x = ob.x - w - RESOLVE_EPS;
            vel.x = 0.0;
        } else if vel.x < 0.0 {
            pos.x = ob.right() + RESOLVE_EPS;
            vel.x = 0.0;
        } else {
            break;
        }
    }
    out
}
