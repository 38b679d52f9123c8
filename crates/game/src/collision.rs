//! Collision detection.
//!
//! Contacts are brute-force axis-aligned box checks: `other` touches a body of
//! radius `r` at `p` when `other` lies in `[p - 2r, p + 2r)` on both axes. The
//! intervals are half-open and the first match in collection order wins.

use glam::Vec2;

/// Anything with a position that can be touched.
pub trait Body {
    fn position(&self) -> Vec2;
}

/// Check whether `point` lies in the contact box of a body at `center` with `radius`.
#[inline]
pub fn in_contact_box(center: Vec2, radius: f32, point: Vec2) -> bool {
    let reach = radius * 2.0;
    point.x >= center.x - reach
        && point.x < center.x + reach
        && point.y >= center.y - reach
        && point.y < center.y + reach
}

/// Index of the first body in `others` inside the contact box.
#[inline]
pub fn first_contact<B: Body>(center: Vec2, radius: f32, others: &[B]) -> Option<usize> {
    others
        .iter()
        .position(|other| in_contact_box(center, radius, other.position()))
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Dot(Vec2);

    impl Body for Dot {
        fn position(&self) -> Vec2 {
            self.0
        }
    }

    #[test]
    fn test_box_is_half_open() {
        let c = Vec2::new(10.0, 10.0);
        // radius 5 -> box [0, 20)
        assert!(in_contact_box(c, 5.0, Vec2::new(0.0, 0.0)));
        assert!(in_contact_box(c, 5.0, Vec2::new(19.99, 19.99)));
        assert!(!in_contact_box(c, 5.0, Vec2::new(20.0, 10.0)));
        assert!(!in_contact_box(c, 5.0, Vec2::new(10.0, 20.0)));
        assert!(!in_contact_box(c, 5.0, Vec2::new(-0.01, 10.0)));
    }

    #[test]
    fn test_first_match_wins() {
        let others = [
            Dot(Vec2::new(100.0, 100.0)),
            Dot(Vec2::new(12.0, 12.0)),
            Dot(Vec2::new(10.0, 10.0)),
        ];
        // The exact centre is later in the list; the earlier hit is returned.
        assert_eq!(first_contact(Vec2::new(10.0, 10.0), 5.0, &others), Some(1));
        assert_eq!(first_contact(Vec2::new(500.0, 500.0), 5.0, &others), None);
    }
}
