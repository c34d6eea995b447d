use glam::Vec3;
use std::ops::{Add, AddAssign, Mul};

/// Colour of a traced ray: rgb plus a transmittance term, so primary rays
/// that leave the scene can carry transparency out to the image buffer.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Colour {
    pub rgb: Vec3,
    pub transm: f32,
}

impl Colour {
    pub fn new(rgb: Vec3, transm: f32) -> Self {
        Self { rgb, transm }
    }

    pub fn opaque(rgb: Vec3) -> Self {
        Self { rgb, transm: 0.0 }
    }

    /// Fully transparent black, used for rays that never hit the scene.
    pub fn transparent() -> Self {
        Self {
            rgb: Vec3::zero(),
            transm: 1.0,
        }
    }

    /// The four channels in accumulation order.
    pub fn channels(&self) -> [f32; 4] {
        [self.rgb.x, self.rgb.y, self.rgb.z, self.transm]
    }
}

impl Add for Colour {
    type Output = Colour;

    fn add(self, other: Colour) -> Colour {
        Colour {
            rgb: self.rgb + other.rgb,
            transm: self.transm + other.transm,
        }
    }
}

impl AddAssign for Colour {
    fn add_assign(&mut self, other: Colour) {
        *self = *self + other;
    }
}

impl Mul<f32> for Colour {
    type Output = Colour;

    fn mul(self, factor: f32) -> Colour {
        Colour {
            rgb: self.rgb * factor,
            transm: self.transm * factor,
        }
    }
}
