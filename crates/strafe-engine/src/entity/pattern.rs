//! Formation movement patterns.
//!
//! A pattern is a pure function from (anchor, member count, elapsed time)
//! to member positions. Patterns never touch the members themselves — the
//! formation reads positions out, applies the pattern, and writes them back,
//! so members only ever need a position view.

use strafe_core::constants::FORMATION_SPACING;
use strafe_core::enums::FormationKind;
use strafe_core::types::Vec2;

pub trait MovementPattern: Send {
    /// Fill `slots` with the member positions for this instant.
    fn apply(&mut self, anchor: Vec2, slots: &mut [Vec2], elapsed: f64);
}

/// Horizontal row centered on the anchor, with a slow lateral sway.
pub struct LinePattern;

impl MovementPattern for LinePattern {
    fn apply(&mut self, anchor: Vec2, slots: &mut [Vec2], elapsed: f64) {
        let n = slots.len() as f64;
        let sway = (elapsed * 0.8).sin() * FORMATION_SPACING * 0.5;
        for (i, slot) in slots.iter_mut().enumerate() {
            let offset = (i as f64 - (n - 1.0) / 2.0) * FORMATION_SPACING;
            *slot = anchor + Vec2::new(offset + sway, 0.0);
        }
    }
}

/// Vertical column below the anchor.
pub struct ColumnPattern;

impl MovementPattern for ColumnPattern {
    fn apply(&mut self, anchor: Vec2, slots: &mut [Vec2], elapsed: f64) {
        let sway = (elapsed * 0.8).sin() * FORMATION_SPACING * 0.5;
        for (i, slot) in slots.iter_mut().enumerate() {
            *slot = anchor + Vec2::new(sway, i as f64 * FORMATION_SPACING);
        }
    }
}

/// Wedge opening downward from the anchor at its tip.
pub struct VPattern;

impl MovementPattern for VPattern {
    fn apply(&mut self, anchor: Vec2, slots: &mut [Vec2], _elapsed: f64) {
        for (i, slot) in slots.iter_mut().enumerate() {
            // 0 at the tip, then alternating left/right arms.
            let arm = ((i + 1) / 2) as f64;
            let side = if i % 2 == 0 { 1.0 } else { -1.0 };
            *slot = anchor + Vec2::new(side * arm * FORMATION_SPACING, arm * FORMATION_SPACING * 0.6);
        }
    }
}

/// Members evenly spaced on a slowly rotating ring around the anchor.
pub struct CirclePattern;

impl MovementPattern for CirclePattern {
    fn apply(&mut self, anchor: Vec2, slots: &mut [Vec2], elapsed: f64) {
        let n = slots.len().max(1) as f64;
        let radius = FORMATION_SPACING * 1.5;
        for (i, slot) in slots.iter_mut().enumerate() {
            let angle = elapsed * 0.5 + (i as f64 / n) * std::f64::consts::TAU;
            *slot = anchor + Vec2::new(angle.cos(), angle.sin()) * radius;
        }
    }
}

/// The pattern a formation kind uses by default.
pub fn pattern_for(kind: FormationKind) -> Box<dyn MovementPattern> {
    match kind {
        FormationKind::Line => Box::new(LinePattern),
        FormationKind::Column => Box::new(ColumnPattern),
        FormationKind::V => Box::new(VPattern),
        FormationKind::Circle => Box::new(CirclePattern),
    }
}
