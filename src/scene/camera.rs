//! Perspective/orthographic camera pair driven by one orbit rig.

use super::bounds::Aabb;
use super::picking::Ray;
use nalgebra::{Isometry3, Matrix4, Orthographic3, Perspective3, Point3, Vector3, Vector4};
use std::f64::consts::PI;

/// Distance from the content center, in multiples of its largest dimension.
const FIT_DISTANCE: f64 = 1.5;
/// Extra room around the content in the orthographic frustum.
const ORTHO_MARGIN: f64 = 1.2;
const MIN_POLAR: f64 = 0.05;
const MAX_POLAR: f64 = PI - 0.05;
const MIN_DISTANCE: f64 = 0.5;
const MAX_DISTANCE: f64 = 1.0e6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViewMode {
    /// Orbiting perspective view.
    #[default]
    ThreeD,
    /// Top-down orthographic plan view without rotation.
    TwoD,
}

impl ViewMode {
    #[must_use]
    pub fn toggled(self) -> Self {
        match self {
            Self::ThreeD => Self::TwoD,
            Self::TwoD => Self::ThreeD,
        }
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::ThreeD => "3D",
            Self::TwoD => "2D",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PerspectiveCamera {
    pub fov_y_deg: f64,
    pub near: f64,
    pub far: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrthographicCamera {
    /// Half height of the frustum at zoom 1; the width follows the aspect ratio.
    pub half_extent: f64,
    pub zoom: f64,
    pub near: f64,
    pub far: f64,
}

/// Reference grid on the ground plane.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GroundGrid {
    pub center: Point3<f64>,
    pub size: f64,
    pub divisions: u32,
}

impl GroundGrid {
    /// Grid about twice the content's largest dimension.
    #[must_use]
    pub fn around(bounds: &Aabb) -> Self {
        let size = (bounds.max_dimension() * 2.0).ceil().max(2.0);
        let center = bounds.center();
        Self {
            center: Point3::new(center.x, bounds.min.y, center.z),
            size,
            divisions: (size as u32).clamp(2, 40),
        }
    }

    /// Line segments of the grid, in render coordinates.
    #[must_use]
    pub fn lines(&self) -> Vec<(Point3<f64>, Point3<f64>)> {
        let half = self.size / 2.0;
        let step = self.size / f64::from(self.divisions);
        let (cx, y, cz) = (self.center.x, self.center.y, self.center.z);
        (0..=self.divisions)
            .flat_map(|i| {
                let offset = -half + step * f64::from(i);
                [
                    (Point3::new(cx + offset, y, cz - half), Point3::new(cx + offset, y, cz + half)),
                    (Point3::new(cx - half, y, cz + offset), Point3::new(cx + half, y, cz + offset)),
                ]
            })
            .collect()
    }
}

/// Orbit controls over a camera pair; the active camera follows the view mode.
#[derive(Debug, Clone, PartialEq)]
pub struct CameraRig {
    pub mode: ViewMode,
    pub target: Point3<f64>,
    pub distance: f64,
    /// Horizontal angle around the y axis, radians.
    pub azimuth: f64,
    /// Angle from the +y axis, radians; fixed at the top-down limit in 2D.
    pub polar: f64,
    pub aspect: f64,
    pub perspective: PerspectiveCamera,
    pub orthographic: OrthographicCamera,
    pub grid: GroundGrid,
}

impl CameraRig {
    #[must_use]
    pub fn new(aspect: f64) -> Self {
        let bounds = Aabb::fallback();
        let mut rig = Self {
            mode: ViewMode::ThreeD,
            target: Point3::origin(),
            distance: 30.0,
            azimuth: PI / 4.0,
            polar: PI / 3.0,
            aspect: sanitize_aspect(aspect),
            perspective: PerspectiveCamera {
                fov_y_deg: 50.0,
                near: 0.1,
                far: 1000.0,
            },
            orthographic: OrthographicCamera {
                half_extent: 10.0,
                zoom: 1.0,
                near: 0.1,
                far: 1000.0,
            },
            grid: GroundGrid::around(&bounds),
        };
        rig.fit(&bounds);
        rig
    }

    pub fn set_aspect(&mut self, aspect: f64) {
        self.aspect = sanitize_aspect(aspect);
    }

    /// Frames `bounds`: target on its center, distance and field of view from
    /// its largest dimension, orthographic frustum and grid scaled to match.
    pub fn fit(&mut self, bounds: &Aabb) {
        let bounds = if bounds.is_finite() { *bounds } else { Aabb::fallback() };
        let max_dim = bounds.max_dimension().max(super::shape::MIN_EXTENT);

        self.target = bounds.center();
        self.distance = (max_dim * FIT_DISTANCE).clamp(MIN_DISTANCE, MAX_DISTANCE);
        self.perspective.fov_y_deg = (2.0 * (max_dim / 2.0 / self.distance).atan()).to_degrees();
        self.perspective.near = (self.distance / 100.0).max(0.01);
        self.perspective.far = self.distance * 100.0;

        self.orthographic.half_extent = max_dim / 2.0 * ORTHO_MARGIN;
        self.orthographic.zoom = 1.0;
        self.orthographic.near = 0.01;
        self.orthographic.far = (self.distance + max_dim) * 4.0;

        self.grid = GroundGrid::around(&bounds);
    }

    /// Switches the driven camera; 2D pins the view straight down.
    pub fn set_mode(&mut self, mode: ViewMode) {
        self.mode = mode;
        if mode == ViewMode::TwoD {
            self.polar = 0.0;
            self.azimuth = 0.0;
        } else if self.polar < MIN_POLAR {
            self.polar = PI / 3.0;
            self.azimuth = PI / 4.0;
        }
    }

    #[must_use]
    pub fn rotation_enabled(&self) -> bool {
        self.mode == ViewMode::ThreeD
    }

    /// Orbits by the given angles; ignored in 2D.
    pub fn rotate(&mut self, d_azimuth: f64, d_polar: f64) {
        if !self.rotation_enabled() {
            return;
        }
        self.azimuth = (self.azimuth + d_azimuth).rem_euclid(2.0 * PI);
        self.polar = (self.polar + d_polar).clamp(MIN_POLAR, MAX_POLAR);
    }

    /// Multiplies the viewing distance (perspective) or divides the zoom (orthographic).
    pub fn zoom(&mut self, factor: f64) {
        if factor <= 0.0 || !factor.is_finite() {
            return;
        }
        match self.mode {
            ViewMode::ThreeD => {
                self.distance = (self.distance * factor).clamp(MIN_DISTANCE, MAX_DISTANCE);
            }
            ViewMode::TwoD => {
                self.orthographic.zoom = (self.orthographic.zoom / factor).clamp(0.01, 100.0);
            }
        }
    }

    /// Moves the target along the ground plane, relative to the view direction.
    pub fn pan(&mut self, right: f64, forward: f64) {
        let (sin, cos) = self.azimuth.sin_cos();
        let right_dir = Vector3::new(cos, 0.0, -sin);
        let forward_dir = Vector3::new(-sin, 0.0, -cos);
        self.target += right_dir * right + forward_dir * forward;
    }

    #[must_use]
    pub fn eye(&self) -> Point3<f64> {
        let (sin_p, cos_p) = self.polar.sin_cos();
        let (sin_a, cos_a) = self.azimuth.sin_cos();
        self.target + Vector3::new(sin_p * sin_a, cos_p, sin_p * cos_a) * self.distance
    }

    fn up(&self) -> Vector3<f64> {
        if self.polar < MIN_POLAR / 2.0 {
            // looking straight down: screen-up is away from the viewer
            let (sin_a, cos_a) = self.azimuth.sin_cos();
            Vector3::new(-sin_a, 0.0, -cos_a)
        } else {
            Vector3::y()
        }
    }

    #[must_use]
    pub fn view_matrix(&self) -> Matrix4<f64> {
        Isometry3::look_at_rh(&self.eye(), &self.target, &self.up()).to_homogeneous()
    }

    #[must_use]
    pub fn projection_matrix(&self) -> Matrix4<f64> {
        match self.mode {
            ViewMode::ThreeD => Perspective3::new(
                self.aspect,
                self.perspective.fov_y_deg.to_radians().clamp(0.01, PI - 0.01),
                self.perspective.near,
                self.perspective.far,
            )
            .to_homogeneous(),
            ViewMode::TwoD => {
                let half_h = self.orthographic.half_extent / self.orthographic.zoom;
                let half_h = if self.aspect < 1.0 { half_h / self.aspect } else { half_h };
                let half_w = half_h * self.aspect;
                Orthographic3::new(
                    -half_w,
                    half_w,
                    -half_h,
                    half_h,
                    self.orthographic.near,
                    self.orthographic.far,
                )
                .to_homogeneous()
            }
        }
    }

    #[must_use]
    pub fn view_projection(&self) -> Matrix4<f64> {
        self.projection_matrix() * self.view_matrix()
    }

    /// Normalized device coordinates of `point`, or `None` behind the camera.
    #[must_use]
    pub fn project(&self, point: &Point3<f64>) -> Option<Point3<f64>> {
        project_with(&self.view_projection(), point)
    }

    /// Ray from the active camera through normalized device coordinates.
    #[must_use]
    pub fn ray_through(&self, ndc_x: f64, ndc_y: f64) -> Option<Ray> {
        let inverse = self.view_projection().try_inverse()?;
        let near = dehomogenize(&(inverse * Vector4::new(ndc_x, ndc_y, -1.0, 1.0)))?;
        let far = dehomogenize(&(inverse * Vector4::new(ndc_x, ndc_y, 1.0, 1.0)))?;
        let direction = (far - near).try_normalize(f64::EPSILON)?;
        Some(Ray {
            origin: near,
            direction,
        })
    }
}

/// Projects through a precomputed view-projection matrix.
#[must_use]
pub fn project_with(view_projection: &Matrix4<f64>, point: &Point3<f64>) -> Option<Point3<f64>> {
    let clip = view_projection * point.to_homogeneous();
    if clip.w <= f64::EPSILON {
        return None;
    }
    Some(Point3::new(clip.x / clip.w, clip.y / clip.w, clip.z / clip.w))
}

fn dehomogenize(p: &Vector4<f64>) -> Option<Point3<f64>> {
    if p.w.abs() <= f64::EPSILON {
        None
    } else {
        Some(Point3::new(p.x / p.w, p.y / p.w, p.z / p.w))
    }
}

fn sanitize_aspect(aspect: f64) -> f64 {
    if aspect.is_finite() && aspect > 0.0 {
        aspect
    } else {
        1.0
    }
}
