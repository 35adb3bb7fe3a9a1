//! Common spatial/lifecycle shape shared by every simulated object

use glam::Vec2;

use crate::consts::*;

/// Axis-aligned body. `pos` is the top-left corner.
///
/// Destruction clears `active`; removal from the owning collection happens
/// at that collection's sweep, never mid-iteration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Body {
    pub pos: Vec2,
    pub size: Vec2,
    pub vel: Vec2,
    pub active: bool,
}

impl Body {
    pub fn new(pos: Vec2, size: Vec2) -> Self {
        Self {
            pos,
            size,
            vel: Vec2::ZERO,
            active: true,
        }
    }

    /// Body placed so that its center lands on `center`
    pub fn centered_at(center: Vec2, size: Vec2) -> Self {
        Self::new(center - size / 2.0, size)
    }

    pub fn center(&self) -> Vec2 {
        self.pos + self.size / 2.0
    }

    /// AABB overlap test (shared edges do not count as overlap)
    pub fn overlaps(&self, other: &Body) -> bool {
        self.pos.x < other.pos.x + other.size.x
            && self.pos.x + self.size.x > other.pos.x
            && self.pos.y < other.pos.y + other.size.y
            && self.pos.y + self.size.y > other.pos.y
    }

    pub fn integrate(&mut self, dt: f32) {
        self.pos += self.vel * dt;
    }

    /// Clamp the body fully inside the play area
    pub fn clamp_to_play_area(&mut self) {
        self.pos.x = self.pos.x.clamp(0.0, PLAY_WIDTH - self.size.x);
        self.pos.y = self.pos.y.clamp(0.0, PLAY_HEIGHT - self.size.y);
    }

    /// True once the body has left the play area by more than the despawn margin
    pub fn outside_play_area(&self) -> bool {
        self.pos.x + self.size.x < -DESPAWN_MARGIN
            || self.pos.x > PLAY_WIDTH + DESPAWN_MARGIN
            || self.pos.y + self.size.y < -DESPAWN_MARGIN
            || self.pos.y > PLAY_HEIGHT + DESPAWN_MARGIN
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overlap_and_separation() {
        let a = Body::new(Vec2::new(0.0, 0.0), Vec2::new(10.0, 10.0));
        let b = Body::new(Vec2::new(5.0, 5.0), Vec2::new(10.0, 10.0));
        let c = Body::new(Vec2::new(20.0, 0.0), Vec2::new(10.0, 10.0));
        assert!(a.overlaps(&b));
        assert!(b.overlaps(&a));
        assert!(!a.overlaps(&c));
    }

    #[test]
    fn test_shared_edge_is_not_overlap() {
        let a = Body::new(Vec2::new(0.0, 0.0), Vec2::new(10.0, 10.0));
        let b = Body::new(Vec2::new(10.0, 0.0), Vec2::new(10.0, 10.0));
        assert!(!a.overlaps(&b));
    }

    #[test]
    fn test_clamp_keeps_body_inside() {
        let mut b = Body::new(Vec2::new(-5.0, PLAY_HEIGHT + 100.0), Vec2::new(50.0, 50.0));
        b.clamp_to_play_area();
        assert_eq!(b.pos.x, 0.0);
        assert_eq!(b.pos.y, PLAY_HEIGHT - 50.0);
    }

    #[test]
    fn test_despawn_margin() {
        let inside = Body::new(Vec2::new(10.0, -40.0), Vec2::new(6.0, 15.0));
        assert!(!inside.outside_play_area());
        let gone = Body::new(Vec2::new(10.0, -80.0), Vec2::new(6.0, 15.0));
        assert!(gone.outside_play_area());
    }
}
