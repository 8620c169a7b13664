//! 2D transform component.

use glam::Vec2;

/// World-space 2D transform. Rotation is in radians, counter-clockwise.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform2D {
    pub position: Vec2,
    pub rotation: f32,
}

impl Transform2D {
    /// Create an identity transform.
    pub fn identity() -> Self {
        Self {
            position: Vec2::ZERO,
            rotation: 0.0,
        }
    }

    /// Create a transform from a position.
    pub fn from_position(position: Vec2) -> Self {
        Self {
            position,
            rotation: 0.0,
        }
    }

    /// Create a transform from x/y coordinates.
    pub fn from_xy(x: f32, y: f32) -> Self {
        Self::from_position(Vec2::new(x, y))
    }
}

impl Default for Transform2D {
    fn default() -> Self {
        Self::identity()
    }
}
