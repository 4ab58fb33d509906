use nalgebra::{Point3, Vector3};

/// Axis-aligned bounds in render coordinates (y up).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Point3<f64>,
    pub max: Point3<f64>,
}

impl Aabb {
    #[must_use]
    pub fn new(min: Point3<f64>, max: Point3<f64>) -> Self {
        Self { min, max }
    }

    /// Inverted bounds that any point will extend.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            min: Point3::new(f64::INFINITY, f64::INFINITY, f64::INFINITY),
            max: Point3::new(f64::NEG_INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY),
        }
    }

    /// Region framed when nothing in the scene has usable bounds.
    #[must_use]
    pub fn fallback() -> Self {
        Self::new(Point3::new(-10.0, 0.0, -10.0), Point3::new(10.0, 10.0, 10.0))
    }

    #[must_use]
    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a Point3<f64>>) -> Self {
        let mut bounds = Self::empty();
        for p in points {
            bounds.extend(p);
        }
        bounds
    }

    pub fn extend(&mut self, p: &Point3<f64>) {
        self.min = self.min.inf(p);
        self.max = self.max.sup(p);
    }

    pub fn union(&mut self, other: &Aabb) {
        if other.is_finite() {
            self.extend(&other.min);
            self.extend(&other.max);
        }
    }

    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.min.coords.iter().chain(self.max.coords.iter()).all(|c| c.is_finite())
            && self.min.x <= self.max.x
            && self.min.y <= self.max.y
            && self.min.z <= self.max.z
    }

    #[must_use]
    pub fn center(&self) -> Point3<f64> {
        nalgebra::center(&self.min, &self.max)
    }

    #[must_use]
    pub fn size(&self) -> Vector3<f64> {
        self.max - self.min
    }

    #[must_use]
    pub fn max_dimension(&self) -> f64 {
        self.size().max()
    }

    /// Grows every axis shorter than `extent` symmetrically to `extent`.
    #[must_use]
    pub fn padded_to(mut self, extent: f64) -> Self {
        for axis in 0..3 {
            let span = self.max[axis] - self.min[axis];
            if span < extent {
                let grow = (extent - span) / 2.0;
                self.min[axis] -= grow;
                self.max[axis] += grow;
            }
        }
        self
    }
}
