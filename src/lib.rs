//! CPU ray tracer built around a per-pixel trace orchestrator with
//! adaptive focal blur sampling and nested-media tracking.

pub mod bvh;
pub mod camera;
pub mod colour;
pub mod containers;
pub mod interior;
pub mod material;
pub mod pixel;
pub mod primitives;
pub mod ray;
pub mod render;
pub mod scene;
pub mod settings;
pub mod trace;

pub use crate::camera::{Camera, Projection};
pub use crate::colour::Colour;
pub use crate::interior::{Interior, InteriorId, InteriorList};
pub use crate::pixel::TracePixel;
pub use crate::primitives::{Intersection, Primitive};
pub use crate::ray::Ray;
pub use crate::scene::Scene;
pub use crate::trace::{SceneTracer, TraceRay};

pub type DefaultRng = rand_xoshiro::Xoshiro256Plus;

/// Intersections closer than this to the ray origin are rejected to avoid
/// self-intersection artifacts.
pub const DEPTH_TOLERANCE: f32 = 1.0e-4;

/// Farthest depth any intersection is allowed to have.
pub const MAX_DISTANCE: f32 = 1.0e7;

/// Near-zero cutoff for denominators and degenerate vectors.
pub const EPSILON: f32 = 1.0e-5;
