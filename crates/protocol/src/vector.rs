//! 2D vector helpers.
//!
//! Positions, headings and velocities are plain `glam::Vec2` values. They are
//! `Copy`, so every operation yields a new value and nothing is aliased.

/// 2D vector in world coordinates (y grows downwards).
pub type Vector = glam::Vec2;

/// Unit heading pointing up the screen.
pub const UP: Vector = Vector::new(0.0, -1.0);
/// Unit heading pointing down the screen.
pub const DOWN: Vector = Vector::new(0.0, 1.0);
/// Unit heading pointing left.
pub const LEFT: Vector = Vector::new(-1.0, 0.0);
/// Unit heading pointing right.
pub const RIGHT: Vector = Vector::new(1.0, 0.0);

/// Unit vector in the direction of `v`, or zero when `v` has no length.
#[inline]
pub fn normalized(v: Vector) -> Vector {
    v.normalize_or_zero()
}

/// Linear interpolation from `a` to `b`; `t` is clamped to `[0, 1]`.
#[inline]
pub fn lerp(a: Vector, b: Vector, t: f32) -> Vector {
    a.lerp(b, t.clamp(0.0, 1.0))
}

/// Unit heading from `from` towards `to` (zero if they coincide).
#[inline]
pub fn heading(from: Vector, to: Vector) -> Vector {
    normalized(to - from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalized_zero_is_zero() {
        let n = normalized(Vector::ZERO);
        assert_eq!(n, Vector::ZERO);
        assert!(n.is_finite());
    }

    #[test]
    fn test_normalized_unit_length() {
        let n = normalized(Vector::new(3.0, 4.0));
        assert!((n.length() - 1.0).abs() < 1e-6);
        assert_eq!(n, Vector::new(0.6, 0.8));
    }

    #[test]
    fn test_lerp_clamps_t() {
        let a = Vector::new(0.0, 0.0);
        let b = Vector::new(10.0, -10.0);
        assert_eq!(lerp(a, b, 0.5), Vector::new(5.0, -5.0));
        assert_eq!(lerp(a, b, 2.0), b);
        assert_eq!(lerp(a, b, -1.0), a);
    }

    #[test]
    fn test_heading_towards_pointer() {
        assert_eq!(heading(Vector::new(5.0, 5.0), Vector::new(5.0, 0.0)), UP);
        assert_eq!(heading(Vector::new(5.0, 5.0), Vector::new(9.0, 5.0)), RIGHT);
        assert_eq!(heading(Vector::new(1.0, 1.0), Vector::new(1.0, 1.0)), Vector::ZERO);
    }

    #[test]
    fn test_arithmetic_leaves_operands_untouched() {
        let a = Vector::new(2.0, 3.0);
        let b = Vector::new(-1.0, 4.0);
        assert_eq!(a + b, Vector::new(1.0, 7.0));
        assert_eq!(a - b, Vector::new(3.0, -1.0));
        assert_eq!(a * 2.0, Vector::new(4.0, 6.0));
        assert_eq!(a * b, Vector::new(-2.0, 12.0));
        assert_eq!(-a, Vector::new(-2.0, -3.0));
        assert_eq!(a, Vector::new(2.0, 3.0));
    }

    #[test]
    fn test_named_directions_cancel() {
        assert_eq!(UP + DOWN, Vector::ZERO);
        assert_eq!(-LEFT, RIGHT);
    }
}
