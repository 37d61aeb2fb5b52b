//! Kinematic movement helpers.
//!
//! Movement is a straight-line step of fixed length per tick, with no
//! acceleration or collision. Callers clamp the result to the map.

use glam::Vec2;

/// Moves from `from` toward `to` by at most `speed`.
///
/// Never overshoots: if `to` is within `speed`, returns `to`.
///
/// # Example
///
/// ```
/// use glam::Vec2;
/// use skirmish_core::resolver::step_toward;
///
/// let p = step_toward(Vec2::ZERO, Vec2::new(10.0, 0.0), 2.0);
/// assert_eq!(p, Vec2::new(2.0, 0.0));
///
/// let q = step_toward(Vec2::ZERO, Vec2::new(1.0, 0.0), 2.0);
/// assert_eq!(q, Vec2::new(1.0, 0.0));
/// ```
#[must_use]
pub fn step_toward(from: Vec2, to: Vec2, speed: f32) -> Vec2 {
    let delta = to - from;
    let dist = delta.length();
    if dist <= speed {
        to
    } else {
        from + delta / dist * speed
    }
}

/// Moves from `from` directly away from `threat` by `speed`.
///
/// Returns `None` when the two points coincide and there is no direction.
#[must_use]
pub fn step_away(from: Vec2, threat: Vec2, speed: f32) -> Option<Vec2> {
    let dir = (from - threat).try_normalize()?;
    Some(from + dir * speed)
}
