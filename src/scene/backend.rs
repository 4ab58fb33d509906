use super::shape::SpaceShape;
use crate::color::Appearance;
use crate::error::SceneError;

/// Drawable size of the render surface, in surface units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    #[must_use]
    pub fn aspect(&self) -> f64 {
        if self.height > 0.0 {
            self.width / self.height
        } else {
            1.0
        }
    }
}

/// Opaque id of a shape uploaded to a backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ShapeHandle(pub u64);

/// The rendering capability the scene drives.
pub trait RenderBackend {
    /// Checks the capability and returns the initial viewport.
    fn probe(&mut self) -> Result<Viewport, SceneError>;

    /// Uploads a shape; it stays alive until released.
    fn create(&mut self, shape: &SpaceShape) -> ShapeHandle;

    fn set_appearance(&mut self, handle: ShapeHandle, appearance: Appearance);

    /// Frees the geometry and material of a shape.
    fn release(&mut self, handle: ShapeHandle);
}
