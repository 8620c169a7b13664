//! Physics components for ECS entities.

use glam::Vec2;

/// Rigid body type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BodyType {
    /// Immovable.
    #[default]
    Static,
    /// Moved by its own velocity, unaffected by gravity and impulses.
    Kinematic,
    /// Affected by gravity and collisions.
    Dynamic,
}

/// Rigid body component.
///
/// `mass == 0.0` means infinite mass: the body never receives impulses.
#[derive(Debug, Clone, PartialEq)]
pub struct RigidBody2D {
    pub body_type: BodyType,
    pub mass: f32,
    pub linear_velocity: Vec2,
    /// Angular velocity in radians per second.
    pub angular_velocity: f32,
    /// Coefficient of restitution. Combined per contact as the product of both bodies.
    pub elasticity: f32,
}

impl RigidBody2D {
    /// Create a new dynamic rigid body with the given mass.
    pub fn new_dynamic(mass: f32) -> Self {
        Self {
            body_type: BodyType::Dynamic,
            mass,
            ..Self::default()
        }
    }

    /// Create a new static rigid body.
    pub fn new_static() -> Self {
        Self::default()
    }

    /// Create a new kinematic rigid body.
    pub fn new_kinematic() -> Self {
        Self {
            body_type: BodyType::Kinematic,
            ..Self::default()
        }
    }

    pub fn with_velocity(mut self, linear_velocity: Vec2) -> Self {
        self.linear_velocity = linear_velocity;
        self
    }

    pub fn with_elasticity(mut self, elasticity: f32) -> Self {
        self.elasticity = elasticity;
        self
    }

    /// Inverse mass used by impulse resolution. Zero for static, kinematic and massless bodies.
    #[inline]
    pub fn inverse_mass(&self) -> f32 {
        if self.body_type == BodyType::Dynamic && self.mass > 0.0 {
            1.0 / self.mass
        } else {
            0.0
        }
    }
}

impl Default for RigidBody2D {
    fn default() -> Self {
        Self {
            body_type: BodyType::Static,
            mass: 0.0,
            linear_velocity: Vec2::ZERO,
            angular_velocity: 0.0,
            elasticity: 1.0,
        }
    }
}

/// Axis-aligned box shape parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoxComponent2D {
    /// Offset of the shape centre from the entity position.
    pub centre_of_mass: Vec2,
    pub half_extent: Vec2,
}

impl BoxComponent2D {
    pub fn new(half_extent: Vec2) -> Self {
        Self {
            centre_of_mass: Vec2::ZERO,
            half_extent,
        }
    }

    pub fn with_centre_of_mass(mut self, centre_of_mass: Vec2) -> Self {
        self.centre_of_mass = centre_of_mass;
        self
    }
}

impl Default for BoxComponent2D {
    fn default() -> Self {
        Self::new(Vec2::splat(0.5))
    }
}

/// Circle shape parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CircleComponent2D {
    /// Offset of the shape centre from the entity position.
    pub centre_of_mass: Vec2,
    pub radius: f32,
}

impl CircleComponent2D {
    pub fn new(radius: f32) -> Self {
        Self {
            centre_of_mass: Vec2::ZERO,
            radius,
        }
    }

    pub fn with_centre_of_mass(mut self, centre_of_mass: Vec2) -> Self {
        self.centre_of_mass = centre_of_mass;
        self
    }
}

impl Default for CircleComponent2D {
    fn default() -> Self {
        Self::new(0.5)
    }
}
