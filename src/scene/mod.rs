//! The 3D scene: per-space shapes, a camera pair and pointer picking.
//!
//! Lifecycle: `Uninitialized` → `Ready` once the rendering capability is
//! confirmed → `Populated` after every repopulation → `Disposed`. A failed
//! capability check lands in `Failed` and the scene never builds shapes.

pub mod backend;
pub mod bounds;
pub mod camera;
pub mod picking;
pub mod shape;

pub use backend::{RenderBackend, ShapeHandle, Viewport};
pub use bounds::Aabb;
pub use camera::{CameraRig, GroundGrid, ViewMode};
pub use shape::{build_shape, ShapeKind, SpaceShape};

use crate::color::Appearance;
use crate::error::SceneError;
use crate::model::Space;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SceneState {
    Uninitialized,
    Ready,
    Populated,
    Failed(SceneError),
    Disposed,
}

/// What a pointer click does to the selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClickAction {
    Replace(String),
    Toggle(String),
    Clear,
    Nothing,
}

struct SceneEntry {
    shape: SpaceShape,
    handle: ShapeHandle,
}

pub struct SceneController<B: RenderBackend> {
    backend: B,
    state: SceneState,
    rig: CameraRig,
    viewport: Viewport,
    entries: Vec<SceneEntry>,
    bounds: Aabb,
}

impl<B: RenderBackend> SceneController<B> {
    #[must_use]
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            state: SceneState::Uninitialized,
            rig: CameraRig::new(1.0),
            viewport: Viewport {
                width: 1.0,
                height: 1.0,
            },
            entries: Vec::new(),
            bounds: Aabb::fallback(),
        }
    }

    /// Probes the rendering capability and sets up the camera pair.
    pub fn initialize(&mut self) -> Result<(), SceneError> {
        match &self.state {
            SceneState::Uninitialized => {}
            SceneState::Failed(err) => return Err(err.clone()),
            _ => return Ok(()),
        }

        match self.backend.probe() {
            Ok(viewport) => {
                self.viewport = viewport;
                self.rig = CameraRig::new(viewport.aspect());
                self.state = SceneState::Ready;
                info!(width = viewport.width, height = viewport.height, "scene initialized");
                Ok(())
            }
            Err(err) => {
                warn!(error = %err, "rendering capability unavailable");
                self.state = SceneState::Failed(err.clone());
                Err(err)
            }
        }
    }

    #[must_use]
    pub fn state(&self) -> &SceneState {
        &self.state
    }

    #[must_use]
    pub fn is_usable(&self) -> bool {
        matches!(self.state, SceneState::Ready | SceneState::Populated)
    }

    /// Rebuilds every shape from `spaces` and re-frames the camera.
    /// Previous shapes are released first. No-op unless initialized.
    pub fn populate(&mut self, spaces: &[&Space]) {
        if !self.is_usable() {
            return;
        }
        self.release_all();

        let total = spaces.len();
        let mut bounds = Aabb::empty();
        for (index, space) in spaces.iter().enumerate() {
            let shape = build_shape(space, index, total);
            bounds.union(&shape.bounds);
            let handle = self.backend.create(&shape);
            self.entries.push(SceneEntry { shape, handle });
        }

        self.bounds = if bounds.is_finite() {
            bounds
        } else {
            Aabb::fallback()
        };
        self.rig.fit(&self.bounds);
        self.state = SceneState::Populated;
        debug!(shapes = self.entries.len(), "scene repopulated");
    }

    /// Applies `resolve(space_id)` to every shape.
    pub fn recolor(&mut self, mut resolve: impl FnMut(&str) -> Appearance) {
        for entry in &self.entries {
            let appearance = resolve(&entry.shape.space_id);
            self.backend.set_appearance(entry.handle, appearance);
        }
    }

    /// Frames the current content again.
    pub fn fit_view(&mut self) {
        self.rig.fit(&self.bounds);
    }

    pub fn resize(&mut self, viewport: Viewport) {
        self.viewport = viewport;
        self.rig.set_aspect(viewport.aspect());
    }

    pub fn set_mode(&mut self, mode: ViewMode) {
        self.rig.set_mode(mode);
    }

    pub fn toggle_mode(&mut self) {
        self.set_mode(self.rig.mode.toggled());
    }

    #[must_use]
    pub fn mode(&self) -> ViewMode {
        self.rig.mode
    }

    pub fn rig_mut(&mut self) -> &mut CameraRig {
        &mut self.rig
    }

    #[must_use]
    pub fn rig(&self) -> &CameraRig {
        &self.rig
    }

    #[must_use]
    pub fn bounds(&self) -> &Aabb {
        &self.bounds
    }

    /// Space under the given normalized device coordinates.
    #[must_use]
    pub fn pick(&self, ndc_x: f64, ndc_y: f64) -> Option<&str> {
        if !self.is_usable() {
            return None;
        }
        let ray = self.rig.ray_through(ndc_x, ndc_y)?;
        let (index, _) = picking::pick(&ray, self.entries.iter().map(|e| &e.shape))?;
        Some(self.entries[index].shape.space_id.as_str())
    }

    /// Selection change for a click at `(ndc_x, ndc_y)`.
    #[must_use]
    pub fn click(&self, ndc_x: f64, ndc_y: f64, modifier: bool) -> ClickAction {
        match (self.pick(ndc_x, ndc_y), modifier) {
            (Some(id), false) => ClickAction::Replace(id.to_string()),
            (Some(id), true) => ClickAction::Toggle(id.to_string()),
            (None, false) if self.is_usable() => ClickAction::Clear,
            _ => ClickAction::Nothing,
        }
    }

    /// Shapes in scene order, with their backend handles.
    pub fn shapes(&self) -> impl Iterator<Item = (&SpaceShape, ShapeHandle)> {
        self.entries.iter().map(|e| (&e.shape, e.handle))
    }

    #[must_use]
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Releases all shapes; the scene cannot be used afterwards.
    pub fn dispose(&mut self) {
        self.release_all();
        self.state = SceneState::Disposed;
    }

    fn release_all(&mut self) {
        for entry in self.entries.drain(..) {
            self.backend.release(entry.handle);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::{DEFAULT_COLOR, DEFAULT_OPACITY};
    use crate::model::{BoundingBox, Geometry3D, Point3D};
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    /// Backend double tracking live shapes.
    #[derive(Default)]
    struct CountingBackend {
        unavailable: bool,
        next: u64,
        live: HashMap<ShapeHandle, Option<Appearance>>,
        created: usize,
    }

    impl RenderBackend for CountingBackend {
        fn probe(&mut self) -> Result<Viewport, SceneError> {
            if self.unavailable {
                Err(SceneError::Unavailable {
                    reason: "no renderer".into(),
                })
            } else {
                Ok(Viewport {
                    width: 160.0,
                    height: 100.0,
                })
            }
        }

        fn create(&mut self, _shape: &SpaceShape) -> ShapeHandle {
            self.next += 1;
            self.created += 1;
            let handle = ShapeHandle(self.next);
            self.live.insert(handle, None);
            handle
        }

        fn set_appearance(&mut self, handle: ShapeHandle, appearance: Appearance) {
            if let Some(slot) = self.live.get_mut(&handle) {
                *slot = Some(appearance);
            }
        }

        fn release(&mut self, handle: ShapeHandle) {
            self.live.remove(&handle);
        }
    }

    fn spaces(n: usize) -> Vec<Space> {
        (0..n)
            .map(|i| {
                let mut s = Space::new(format!("s{i}"), format!("Room {i}"));
                s.area = Some(16.0);
                s.height = Some(3.0);
                s
            })
            .collect()
    }

    fn ready_scene() -> SceneController<CountingBackend> {
        let mut scene = SceneController::new(CountingBackend::default());
        scene.initialize().unwrap();
        scene
    }

    #[test]
    fn repopulation_releases_previous_shapes() {
        let mut scene = ready_scene();
        let first = spaces(5);
        scene.populate(&first.iter().collect::<Vec<_>>());
        assert_eq!(scene.backend().live.len(), 5);

        let second = spaces(3);
        scene.populate(&second.iter().collect::<Vec<_>>());
        assert_eq!(scene.backend().live.len(), 3);
        assert_eq!(scene.backend().created, 8);
        assert_eq!(scene.state(), &SceneState::Populated);

        scene.dispose();
        assert!(scene.backend().live.is_empty());
        assert_eq!(scene.state(), &SceneState::Disposed);
    }

    #[test]
    fn unavailable_capability_is_terminal() {
        let mut scene = SceneController::new(CountingBackend {
            unavailable: true,
            ..CountingBackend::default()
        });
        assert!(scene.initialize().is_err());
        assert!(matches!(scene.state(), SceneState::Failed(_)));

        let list = spaces(2);
        scene.populate(&list.iter().collect::<Vec<_>>());
        assert_eq!(scene.backend().created, 0);
        assert!(scene.initialize().is_err());
        assert_eq!(scene.click(0.0, 0.0, false), ClickAction::Nothing);
    }

    #[test]
    fn populate_before_initialize_builds_nothing() {
        let mut scene = SceneController::new(CountingBackend::default());
        let list = spaces(2);
        scene.populate(&list.iter().collect::<Vec<_>>());
        assert_eq!(scene.backend().created, 0);
    }

    #[test]
    fn empty_scene_frames_fallback_region() {
        let mut scene = ready_scene();
        scene.populate(&[]);
        assert_eq!(scene.bounds(), &Aabb::fallback());
    }

    #[test]
    fn shapes_are_tagged_with_space_ids() {
        let mut scene = ready_scene();
        let list = spaces(3);
        scene.populate(&list.iter().collect::<Vec<_>>());
        let ids: Vec<&str> = scene.shapes().map(|(s, _)| s.space_id.as_str()).collect();
        assert_eq!(ids, vec!["s0", "s1", "s2"]);
    }

    #[test]
    fn click_resolves_space_under_pointer() {
        let mut scene = ready_scene();
        let mut room = Space::new("room", "Room");
        room.geometry = Some(Geometry3D {
            vertices: vec![],
            indices: None,
            bounding_box: Some(BoundingBox {
                min: Point3D::new(0.0, 0.0, 0.0),
                max: Point3D::new(10.0, 10.0, 3.0),
            }),
        });
        scene.populate(&[&room]);

        // the camera is fitted on the only shape: the view center hits it
        assert_eq!(scene.click(0.0, 0.0, false), ClickAction::Replace("room".into()));
        assert_eq!(scene.click(0.0, 0.0, true), ClickAction::Toggle("room".into()));

        scene.set_mode(ViewMode::TwoD);
        assert_eq!(scene.pick(0.0, 0.0), Some("room"));
        assert_eq!(scene.click(0.99, 0.99, false), ClickAction::Clear);
        assert_eq!(scene.click(0.99, 0.99, true), ClickAction::Nothing);
    }

    #[test]
    fn recolor_reaches_every_shape() {
        let mut scene = ready_scene();
        let list = spaces(4);
        scene.populate(&list.iter().collect::<Vec<_>>());
        scene.recolor(|_| Appearance {
            color: DEFAULT_COLOR,
            opacity: DEFAULT_OPACITY,
        });
        assert!(scene.backend().live.values().all(Option::is_some));
    }
}
