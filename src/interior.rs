use smallvec::SmallVec;

/// Handle into the scene's interior table. Rays reference interiors by
/// handle because interiors outlive any single ray and are shared read-only
/// across worker threads.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct InteriorId(pub usize);

/// Ordered list of interiors a ray is currently inside, innermost last.
/// Small enough to live inline in the ray for typical nesting depths.
pub type InteriorList = SmallVec<[InteriorId; 4]>;

/// Refractive medium associated with the inside of a solid object.
#[derive(Clone, Copy, Debug)]
pub struct Interior {
    /// Index of refraction.
    pub ior: f32,
    /// Wavelength spread of the index, carried for dispersive media.
    pub dispersion: f32,
}

impl Interior {
    pub fn new(ior: f32) -> Self {
        Self {
            ior,
            dispersion: 1.0,
        }
    }
}

impl Default for Interior {
    fn default() -> Self {
        Self::new(1.0)
    }
}
