//! Visual geometry for one space.
//!
//! Source coordinates are z-up; render coordinates are y-up, so a source
//! point (x, y, z) lands at (x, z, y). The representation is chosen in the
//! order mesh, planar footprint, bounding box, synthesized box.

use super::bounds::Aabb;
use crate::model::{BoundingBox, Geometry3D, Point3D, Space};
use nalgebra::Point3;
use std::collections::{BTreeMap, BTreeSet};

/// Smallest extent any produced shape may have along an axis.
pub const MIN_EXTENT: f64 = 0.1;
/// Elevation tolerance for treating a vertex list as a flat footprint.
pub const PLANAR_TOLERANCE: f64 = 0.05;
pub const DEFAULT_HEIGHT: f64 = 3.0;
pub const DEFAULT_AREA: f64 = 25.0;
/// Smallest side of a footprint derived from a floor area.
pub const MIN_FOOTPRINT: f64 = 1.0;
pub const GRID_SPACING: f64 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShapeKind {
    Mesh,
    Footprint,
    BoundingBox,
    Synthesized,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SpaceShape {
    pub space_id: String,
    pub kind: ShapeKind,
    pub vertices: Vec<Point3<f64>>,
    pub triangles: Vec<[usize; 3]>,
    /// Outline edges, used for wireframe drawing.
    pub edges: Vec<[usize; 2]>,
    pub bounds: Aabb,
}

impl SpaceShape {
    fn new(
        space_id: &str,
        kind: ShapeKind,
        vertices: Vec<Point3<f64>>,
        triangles: Vec<[usize; 3]>,
        edges: Vec<[usize; 2]>,
    ) -> Self {
        let bounds = Aabb::from_points(&vertices).padded_to(MIN_EXTENT);
        Self {
            space_id: space_id.to_string(),
            kind,
            vertices,
            triangles,
            edges,
            bounds,
        }
    }

    /// Triangle corner positions.
    pub fn triangle_points(&self) -> impl Iterator<Item = [Point3<f64>; 3]> + '_ {
        self.triangles
            .iter()
            .map(|t| [self.vertices[t[0]], self.vertices[t[1]], self.vertices[t[2]]])
    }
}

#[must_use]
pub fn to_render(p: Point3D) -> Point3<f64> {
    Point3::new(p.x, p.z, p.y)
}

/// Builds the shape for `space`, the `index`-th of `total` spaces in the scene.
#[must_use]
pub fn build_shape(space: &Space, index: usize, total: usize) -> SpaceShape {
    let geometry = space.geometry.as_ref();

    geometry
        .and_then(|g| mesh_shape(space, g))
        .or_else(|| geometry.and_then(|g| footprint_shape(space, g)))
        .or_else(|| {
            geometry
                .and_then(|g| g.bounding_box.as_ref())
                .map(|bbox| bounding_box_shape(space, bbox))
        })
        .unwrap_or_else(|| synthesized_shape(space, index, total))
}

fn mesh_shape(space: &Space, geometry: &Geometry3D) -> Option<SpaceShape> {
    let indices = geometry.indices.as_ref()?;
    let points = geometry.points();
    if points.len() < 3 || indices.len() < 3 || indices.len() % 3 != 0 {
        return None;
    }
    if indices.iter().any(|&i| i as usize >= points.len()) {
        return None;
    }

    let mut vertices: Vec<Point3<f64>> = points.into_iter().map(to_render).collect();
    let mut triangles: Vec<[usize; 3]> = indices
        .chunks_exact(3)
        .map(|t| [t[0] as usize, t[1] as usize, t[2] as usize])
        .collect();

    let mut unique = BTreeSet::new();
    for [a, b, c] in &triangles {
        for (u, v) in [(*a, *b), (*b, *c), (*c, *a)] {
            unique.insert([u.min(v), u.max(v)]);
        }
    }
    let mut edges = unique.into_iter().collect();

    thicken(&mut vertices, &mut triangles, &mut edges);
    Some(SpaceShape::new(&space.id, ShapeKind::Mesh, vertices, triangles, edges))
}

/// Gives a mesh at least `MIN_EXTENT` along every axis. A thin mesh is
/// doubled into two copies pushed apart around its own plane, joined along
/// its open rim.
fn thicken(vertices: &mut Vec<Point3<f64>>, triangles: &mut Vec<[usize; 3]>, edges: &mut Vec<[usize; 2]>) {
    for axis in 0..3 {
        let (low, high) = vertices
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(low, high), p| {
                (low.min(p[axis]), high.max(p[axis]))
            });
        let extent = high - low;
        if !extent.is_finite() || extent >= MIN_EXTENT {
            continue;
        }

        let half_pad = (MIN_EXTENT - extent) / 2.0;
        let n = vertices.len();
        let rim = open_edges(triangles);

        let mut copies = vertices.clone();
        for p in vertices.iter_mut() {
            p[axis] -= half_pad;
        }
        for p in &mut copies {
            p[axis] += half_pad;
        }
        vertices.extend(copies);

        let mirrored: Vec<[usize; 3]> = triangles.iter().map(|&[a, b, c]| [a + n, c + n, b + n]).collect();
        triangles.extend(mirrored);
        let copied: Vec<[usize; 2]> = edges.iter().map(|&[u, v]| [u + n, v + n]).collect();
        edges.extend(copied);

        let mut rim_vertices = BTreeSet::new();
        for [u, v] in rim {
            triangles.push([u, v, v + n]);
            triangles.push([u, v + n, u + n]);
            rim_vertices.insert(u);
            rim_vertices.insert(v);
        }
        edges.extend(rim_vertices.into_iter().map(|u| [u, u + n]));
    }
}

/// Directed edges used by exactly one triangle.
fn open_edges(triangles: &[[usize; 3]]) -> Vec<[usize; 2]> {
    let mut uses: BTreeMap<[usize; 2], (usize, [usize; 2])> = BTreeMap::new();
    for &[a, b, c] in triangles {
        for (u, v) in [(a, b), (b, c), (c, a)] {
            let entry = uses.entry([u.min(v), u.max(v)]).or_insert((0, [u, v]));
            entry.0 += 1;
        }
    }
    uses.into_values()
        .filter(|(count, _)| *count == 1)
        .map(|(_, edge)| edge)
        .collect()
}

/// True when every point lies within `PLANAR_TOLERANCE` of the first one's elevation.
#[must_use]
pub fn is_planar(points: &[Point3D]) -> bool {
    match points.first() {
        Some(first) => points.iter().all(|p| (p.z - first.z).abs() <= PLANAR_TOLERANCE),
        None => false,
    }
}

fn footprint_shape(space: &Space, geometry: &Geometry3D) -> Option<SpaceShape> {
    let mut outline = geometry.points();
    if outline.len() > 3 && outline.first() == outline.last() {
        outline.pop();
    }
    if outline.len() < 3 || !is_planar(&outline) {
        return None;
    }

    let n = outline.len();
    let base = outline.iter().map(|p| p.z).fold(f64::INFINITY, f64::min);
    let height = positive(space.height).unwrap_or(DEFAULT_HEIGHT).max(MIN_EXTENT);

    let flat: Vec<f64> = outline.iter().flat_map(|p| [p.x, p.y]).collect();
    let cap = match earcutr::earcut(&flat, &[], 2) {
        Ok(indices) if !indices.is_empty() => indices,
        _ => (1..n - 1).flat_map(|i| [0, i, i + 1]).collect(),
    };

    let mut vertices = Vec::with_capacity(n * 2);
    for p in &outline {
        vertices.push(Point3::new(p.x, base, p.y));
    }
    for p in &outline {
        vertices.push(Point3::new(p.x, base + height, p.y));
    }

    let mut triangles = Vec::with_capacity(cap.len() / 3 * 2 + n * 2);
    for t in cap.chunks_exact(3) {
        triangles.push([t[0], t[2], t[1]]);
        triangles.push([t[0] + n, t[1] + n, t[2] + n]);
    }
    let mut edges = Vec::with_capacity(n * 3);
    for i in 0..n {
        let j = (i + 1) % n;
        triangles.push([i, j, j + n]);
        triangles.push([i, j + n, i + n]);
        edges.push([i, j]);
        edges.push([i + n, j + n]);
        edges.push([i, i + n]);
    }

    Some(SpaceShape::new(&space.id, ShapeKind::Footprint, vertices, triangles, edges))
}

fn bounding_box_shape(space: &Space, bbox: &BoundingBox) -> SpaceShape {
    let side = area_side(space.area);
    let width = positive(Some(bbox.max.x - bbox.min.x)).unwrap_or(side);
    let depth = positive(Some(bbox.max.y - bbox.min.y)).unwrap_or(side);
    let height = positive(Some(bbox.max.z - bbox.min.z))
        .or_else(|| positive(space.height))
        .unwrap_or(DEFAULT_HEIGHT);

    let cx = (bbox.min.x + bbox.max.x) / 2.0;
    let cy = (bbox.min.y + bbox.max.y) / 2.0;
    let base = bbox.min.z.min(bbox.max.z);

    box_shape(
        &space.id,
        ShapeKind::BoundingBox,
        Point3::new(cx, base + height / 2.0, cy),
        [width, height, depth],
    )
}

fn synthesized_shape(space: &Space, index: usize, total: usize) -> SpaceShape {
    let side = area_side(space.area);
    let height = positive(space.height).unwrap_or(DEFAULT_HEIGHT);

    let center = match space.location {
        Some(location) => to_render(location),
        None => {
            let total = total.max(1);
            let cols = (total as f64).sqrt().ceil().max(1.0);
            let rows = (total as f64 / cols).ceil();
            let col = (index as f64 % cols).floor();
            let row = (index as f64 / cols).floor();
            Point3::new(
                (col - cols / 2.0) * GRID_SPACING,
                height / 2.0,
                (row - rows / 2.0) * GRID_SPACING,
            )
        }
    };

    box_shape(&space.id, ShapeKind::Synthesized, center, [side, height, side])
}

/// Side of a square with the given floor area (default area when unknown).
fn area_side(area: Option<f64>) -> f64 {
    positive(area)
        .unwrap_or(DEFAULT_AREA)
        .sqrt()
        .max(MIN_FOOTPRINT)
}

fn positive(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite() && *v > f64::EPSILON)
}

/// Axis-aligned box around `center` with `[x, y, z]` render dimensions.
fn box_shape(space_id: &str, kind: ShapeKind, center: Point3<f64>, dims: [f64; 3]) -> SpaceShape {
    let [hx, hy, hz] = dims.map(|d| d.max(MIN_EXTENT) / 2.0);
    let corner = |sx: f64, sy: f64, sz: f64| {
        Point3::new(center.x + sx * hx, center.y + sy * hy, center.z + sz * hz)
    };
    let vertices = vec![
        corner(-1.0, -1.0, -1.0),
        corner(1.0, -1.0, -1.0),
        corner(1.0, 1.0, -1.0),
        corner(-1.0, 1.0, -1.0),
        corner(-1.0, -1.0, 1.0),
        corner(1.0, -1.0, 1.0),
        corner(1.0, 1.0, 1.0),
        corner(-1.0, 1.0, 1.0),
    ];
    let triangles = vec![
        [0, 2, 1],
        [0, 3, 2],
        [4, 5, 6],
        [4, 6, 7],
        [0, 1, 5],
        [0, 5, 4],
        [3, 7, 6],
        [3, 6, 2],
        [0, 4, 7],
        [0, 7, 3],
        [1, 2, 6],
        [1, 6, 5],
    ];
    let edges = vec![
        [0, 1],
        [1, 2],
        [2, 3],
        [3, 0],
        [4, 5],
        [5, 6],
        [6, 7],
        [7, 4],
        [0, 4],
        [1, 5],
        [2, 6],
        [3, 7],
    ];
    SpaceShape::new(space_id, kind, vertices, triangles, edges)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use pretty_assertions::assert_eq;

    fn bbox(min: [f64; 3], max: [f64; 3]) -> BoundingBox {
        BoundingBox {
            min: Point3D::new(min[0], min[1], min[2]),
            max: Point3D::new(max[0], max[1], max[2]),
        }
    }

    fn tetra() -> Geometry3D {
        Geometry3D {
            vertices: vec![
                vec![0.0, 0.0, 0.0],
                vec![4.0, 0.0, 0.0],
                vec![0.0, 2.0, 0.0],
                vec![0.0, 0.0, 3.0],
            ],
            indices: Some(vec![0, 1, 2, 0, 1, 3, 0, 2, 3, 1, 2, 3]),
            bounding_box: Some(bbox([0.0; 3], [4.0, 2.0, 3.0])),
        }
    }

    #[test]
    fn valid_mesh_wins_and_axes_are_remapped() {
        let mut space = Space::new("m", "mesh");
        space.geometry = Some(tetra());

        let shape = build_shape(&space, 0, 1);
        assert_eq!(shape.kind, ShapeKind::Mesh);
        assert_eq!(shape.triangles.len(), 4);
        assert_eq!(shape.edges.len(), 6);
        // source z (3.0) becomes render y
        assert_relative_eq!(shape.bounds.max.y, 3.0);
        assert_relative_eq!(shape.bounds.max.z, 2.0);
    }

    #[test]
    fn flat_mesh_is_given_thickness() {
        let mut space = Space::new("q", "quad");
        space.geometry = Some(Geometry3D {
            vertices: vec![
                vec![0.0, 0.0, 1.0],
                vec![4.0, 0.0, 1.0],
                vec![4.0, 3.0, 1.0],
                vec![0.0, 3.0, 1.0],
            ],
            indices: Some(vec![0, 1, 2, 0, 2, 3]),
            bounding_box: None,
        });

        let shape = build_shape(&space, 0, 1);
        assert_eq!(shape.kind, ShapeKind::Mesh);
        let drawn = Aabb::from_points(&shape.vertices).size();
        assert!(drawn.min() >= MIN_EXTENT - 1e-9);
        assert_relative_eq!(drawn.y, MIN_EXTENT, epsilon = 1e-9);
        // centred on the source plane at z = 1
        assert_relative_eq!(Aabb::from_points(&shape.vertices).center().y, 1.0);
        // two faces plus a side quad per rim edge
        assert_eq!(shape.vertices.len(), 8);
        assert_eq!(shape.triangles.len(), 2 + 2 + 4 * 2);
        assert_eq!(shape.edges.len(), 5 + 5 + 4);
    }

    #[test]
    fn out_of_range_indices_fall_back() {
        let mut geometry = tetra();
        geometry.indices = Some(vec![0, 1, 9]);
        let mut space = Space::new("m", "mesh");
        space.geometry = Some(geometry);

        assert_eq!(build_shape(&space, 0, 1).kind, ShapeKind::BoundingBox);
    }

    #[test]
    fn flat_outline_is_extruded_by_height() {
        let mut space = Space::new("f", "footprint");
        space.height = Some(2.5);
        space.geometry = Some(Geometry3D {
            vertices: vec![
                vec![0.0, 0.0, 10.0],
                vec![6.0, 0.0, 10.02],
                vec![6.0, 4.0, 10.0],
                vec![0.0, 4.0, 9.99],
            ],
            indices: None,
            bounding_box: None,
        });

        let shape = build_shape(&space, 0, 1);
        assert_eq!(shape.kind, ShapeKind::Footprint);
        assert_eq!(shape.vertices.len(), 8);
        // two caps of two triangles each plus four side quads
        assert_eq!(shape.triangles.len(), 12);
        assert_relative_eq!(shape.bounds.min.y, 9.99);
        assert_relative_eq!(shape.bounds.max.y, 9.99 + 2.5);
    }

    #[test]
    fn sloped_outline_is_not_a_footprint() {
        let points = vec![
            Point3D::new(0.0, 0.0, 0.0),
            Point3D::new(1.0, 0.0, 0.2),
            Point3D::new(1.0, 1.0, 0.0),
        ];
        assert!(!is_planar(&points));
    }

    #[test]
    fn bounding_box_only_never_extrudes() {
        let mut space = Space::new("b", "box");
        space.geometry = Some(Geometry3D {
            vertices: vec![],
            indices: None,
            bounding_box: Some(bbox([2.0, 3.0, 0.0], [6.0, 5.0, 3.0])),
        });

        let shape = build_shape(&space, 0, 1);
        assert_eq!(shape.kind, ShapeKind::BoundingBox);
        assert_relative_eq!(shape.bounds.min, Point3::new(2.0, 0.0, 3.0));
        assert_relative_eq!(shape.bounds.max, Point3::new(6.0, 3.0, 5.0));
    }

    #[test]
    fn flat_bounding_box_uses_area_and_height() {
        let mut space = Space::new("b", "box");
        space.area = Some(16.0);
        space.height = Some(2.0);
        space.geometry = Some(Geometry3D {
            vertices: vec![],
            indices: None,
            bounding_box: Some(bbox([0.0, 0.0, 1.0], [0.0, 0.0, 1.0])),
        });

        let shape = build_shape(&space, 0, 1);
        assert_relative_eq!(shape.bounds.size(), nalgebra::Vector3::new(4.0, 2.0, 4.0));
    }

    #[test]
    fn spaces_without_geometry_are_laid_out_on_a_grid() {
        let spaces: Vec<Space> = (0..4).map(|i| Space::new(i.to_string(), "s")).collect();
        let shapes: Vec<SpaceShape> = spaces
            .iter()
            .enumerate()
            .map(|(i, s)| build_shape(s, i, spaces.len()))
            .collect();

        assert!(shapes.iter().all(|s| s.kind == ShapeKind::Synthesized));
        let centers: Vec<(f64, f64)> = shapes
            .iter()
            .map(|s| (s.bounds.center().x, s.bounds.center().z))
            .collect();
        assert_eq!(
            centers,
            vec![(-10.0, -10.0), (0.0, -10.0), (-10.0, 0.0), (0.0, 0.0)]
        );
        assert_relative_eq!(shapes[0].bounds.size().x, 5.0);
        assert_relative_eq!(shapes[0].bounds.size().y, DEFAULT_HEIGHT);
    }

    #[test]
    fn synthesized_box_uses_location_when_known() {
        let mut space = Space::new("l", "located");
        space.location = Some(Point3D::new(20.0, 30.0, 1.5));
        let shape = build_shape(&space, 3, 10);
        assert_relative_eq!(shape.bounds.center(), Point3::new(20.0, 1.5, 30.0));
    }

    #[test]
    fn degenerate_sizes_are_clamped() {
        let mut space = Space::new("z", "zero");
        space.area = Some(0.0);
        space.height = Some(1e-9);
        let shape = build_shape(&space, 0, 1);
        let size = shape.bounds.size();
        assert!(size.x >= MIN_EXTENT && size.y >= MIN_EXTENT && size.z >= MIN_EXTENT);
    }
}
