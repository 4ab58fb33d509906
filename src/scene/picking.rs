//! Ray casting against space shapes.

use super::bounds::Aabb;
use super::shape::SpaceShape;
use nalgebra::{Point3, Vector3};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Point3<f64>,
    /// Unit length.
    pub direction: Vector3<f64>,
}

/// Entry distance of `ray` into `aabb` (slab method), if it hits at all.
#[must_use]
pub fn ray_aabb(ray: &Ray, aabb: &Aabb) -> Option<f64> {
    let mut t_enter = f64::NEG_INFINITY;
    let mut t_exit = f64::INFINITY;

    for axis in 0..3 {
        let origin = ray.origin[axis];
        let dir = ray.direction[axis];
        if dir.abs() < f64::EPSILON {
            if origin < aabb.min[axis] || origin > aabb.max[axis] {
                return None;
            }
            continue;
        }
        let inv = 1.0 / dir;
        let t1 = (aabb.min[axis] - origin) * inv;
        let t2 = (aabb.max[axis] - origin) * inv;
        t_enter = t_enter.max(t1.min(t2));
        t_exit = t_exit.min(t1.max(t2));
    }

    if t_enter <= t_exit && t_exit >= 0.0 {
        Some(t_enter.max(0.0))
    } else {
        None
    }
}

/// Möller–Trumbore ray/triangle test; both faces count.
#[must_use]
pub fn ray_triangle(ray: &Ray, [a, b, c]: &[Point3<f64>; 3]) -> Option<f64> {
    const EPS: f64 = 1e-12;

    let edge1 = b - a;
    let edge2 = c - a;
    let p = ray.direction.cross(&edge2);
    let det = edge1.dot(&p);
    if det.abs() < EPS {
        return None;
    }
    let inv_det = 1.0 / det;

    let s = ray.origin - a;
    let u = s.dot(&p) * inv_det;
    if !(0.0..=1.0).contains(&u) {
        return None;
    }
    let q = s.cross(&edge1);
    let v = ray.direction.dot(&q) * inv_det;
    if v < 0.0 || u + v > 1.0 {
        return None;
    }
    let t = edge2.dot(&q) * inv_det;
    (t >= 0.0).then_some(t)
}

/// Distance along `ray` to the nearest triangle of `shape`.
#[must_use]
pub fn ray_shape(ray: &Ray, shape: &SpaceShape) -> Option<f64> {
    ray_aabb(ray, &shape.bounds)?;
    shape
        .triangle_points()
        .filter_map(|tri| ray_triangle(ray, &tri))
        .min_by(f64::total_cmp)
        // shapes thinner than the clamp floor are still hit through their bounds
        .or_else(|| {
            if shape.bounds.size().min() <= super::shape::MIN_EXTENT {
                ray_aabb(ray, &shape.bounds)
            } else {
                None
            }
        })
}

/// Index of the first shape hit along `ray`.
#[must_use]
pub fn pick<'a>(ray: &Ray, shapes: impl IntoIterator<Item = &'a SpaceShape>) -> Option<(usize, f64)> {
    shapes
        .into_iter()
        .enumerate()
        .filter_map(|(i, shape)| ray_shape(ray, shape).map(|t| (i, t)))
        .min_by(|a, b| a.1.total_cmp(&b.1))
}
