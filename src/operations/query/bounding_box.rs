use std::f64::consts::PI;

use crate::error::Result;
use crate::geometry::curve::{adjust_periodic, Curve};
use crate::math::{Point3, Vector3};
use crate::topology::{EdgeCurve, FaceId, FaceSurface, Shape, TopologyStore, TrimmedCurve};

/// An axis-aligned bounding box.
///
/// A freshly created box is empty (`min > max`) and absorbs anything added to it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    /// Minimum corner of the bounding box.
    pub min: Point3,
    /// Maximum corner of the bounding box.
    pub max: Point3,
}

impl Default for Aabb {
    fn default() -> Self {
        Self::empty()
    }
}

impl Aabb {
    /// Returns an empty box.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            min: Point3::new(f64::INFINITY, f64::INFINITY, f64::INFINITY),
            max: Point3::new(f64::NEG_INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY),
        }
    }

    /// Returns a box around a single point.
    #[must_use]
    pub fn from_point(point: Point3) -> Self {
        Self {
            min: point,
            max: point,
        }
    }

    /// Returns `true` if nothing was added to the box.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y || self.min.z > self.max.z
    }

    /// Grows the box to contain `point`.
    pub fn add_point(&mut self, point: &Point3) {
        self.min = self.min.inf(point);
        self.max = self.max.sup(point);
    }

    /// Grows the box to contain `other`.
    pub fn add_box(&mut self, other: &Aabb) {
        if other.is_empty() {
            return;
        }
        self.min = self.min.inf(&other.min);
        self.max = self.max.sup(&other.max);
    }

    /// Enlarges the box by `gap` on every side.
    pub fn enlarge(&mut self, gap: f64) {
        if self.is_empty() {
            return;
        }
        let g = Vector3::new(gap, gap, gap);
        self.min -= g;
        self.max += g;
    }

    /// Returns a copy enlarged by `gap`.
    #[must_use]
    pub fn enlarged(mut self, gap: f64) -> Self {
        self.enlarge(gap);
        self
    }

    /// Returns `true` if the boxes share at least one point.
    #[must_use]
    pub fn overlaps(&self, other: &Aabb) -> bool {
        !self.is_empty()
            && !other.is_empty()
            && self.min.x <= other.max.x
            && other.min.x <= self.max.x
            && self.min.y <= other.max.y
            && other.min.y <= self.max.y
            && self.min.z <= other.max.z
            && other.min.z <= self.max.z
    }

    /// Returns `true` if `other` lies entirely inside this box.
    #[must_use]
    pub fn contains_box(&self, other: &Aabb) -> bool {
        !other.is_empty()
            && self.min.x <= other.min.x
            && self.min.y <= other.min.y
            && self.min.z <= other.min.z
            && other.max.x <= self.max.x
            && other.max.y <= self.max.y
            && other.max.z <= self.max.z
    }

    /// Returns `true` if `point` lies inside the box.
    #[must_use]
    pub fn contains_point(&self, point: &Point3) -> bool {
        (0..3).all(|k| self.min[k] <= point[k] && point[k] <= self.max[k])
    }

    /// Length of the box diagonal.
    #[must_use]
    pub fn diagonal(&self) -> f64 {
        if self.is_empty() {
            0.0
        } else {
            (self.max - self.min).norm()
        }
    }

    /// Parameter range `[t_in, t_out]` of the line `origin + t * dir` inside the box.
    #[must_use]
    pub fn clip_line(&self, origin: &Point3, dir: &Vector3) -> Option<(f64, f64)> {
        if self.is_empty() {
            return None;
        }
        let mut t_in = f64::NEG_INFINITY;
        let mut t_out = f64::INFINITY;
        for k in 0..3 {
            if dir[k].abs() < f64::EPSILON {
                if origin[k] < self.min[k] || origin[k] > self.max[k] {
                    return None;
                }
                continue;
            }
            let a = (self.min[k] - origin[k]) / dir[k];
            let b = (self.max[k] - origin[k]) / dir[k];
            t_in = t_in.max(a.min(b));
            t_out = t_out.min(a.max(b));
        }
        (t_in <= t_out).then_some((t_in, t_out))
    }
}

/// Exact box of a trimmed line or circular arc.
///
/// # Errors
///
/// Returns an error if the curve cannot be evaluated.
pub fn curve_box(curve: &TrimmedCurve) -> Result<Aabb> {
    let mut bbox = Aabb::from_point(curve.evaluate(curve.t_start)?);
    bbox.add_point(&curve.evaluate(curve.t_end)?);
    if let EdgeCurve::Circle(circle) = &curve.curve {
        let a = circle.ref_dir();
        let b = circle.binormal();
        for k in 0..3 {
            // Coordinate k is extremal where the tangent has no k component.
            let phi = b[k].atan2(a[k]);
            for base in [phi, phi + PI] {
                let t = adjust_periodic(base, curve.t_start, 2.0 * PI);
                if t <= curve.t_end {
                    bbox.add_point(&circle.evaluate(t)?);
                }
            }
        }
    }
    Ok(bbox)
}

/// Box of a face: the box of its boundary, or the full sphere for spherical faces.
///
/// # Errors
///
/// Returns an error if an entity is missing.
pub fn face_box(store: &TopologyStore, face: FaceId) -> Result<Aabb> {
    let data = store.face(face)?;
    let mut bbox = Aabb::empty();
    for oe in store.face_edges(face)? {
        let edge = store.edge(oe.edge)?;
        if edge.degenerate {
            bbox.add_point(&store.vertex(edge.start)?.point);
        } else {
            bbox.add_box(&curve_box(&edge.trimmed())?);
        }
    }
    if let FaceSurface::Sphere(sphere) = &data.surface {
        let r = Vector3::new(sphere.radius(), sphere.radius(), sphere.radius());
        bbox.add_point(&(sphere.center() - r));
        bbox.add_point(&(sphere.center() + r));
    }
    Ok(bbox.enlarged(data.tolerance))
}

/// Computes the axis-aligned bounding box of a shape.
pub struct BoundingBox {
    shape: Shape,
}

impl BoundingBox {
    /// Creates a new `BoundingBox` query.
    #[must_use]
    pub fn new(shape: impl Into<Shape>) -> Self {
        Self {
            shape: shape.into(),
        }
    }

    /// Executes the query, returning the AABB.
    ///
    /// # Errors
    ///
    /// Returns an error if a referenced entity is missing.
    pub fn execute(&self, store: &TopologyStore) -> Result<Aabb> {
        shape_box(store, self.shape)
    }
}

fn shape_box(store: &TopologyStore, shape: Shape) -> Result<Aabb> {
    match shape {
        Shape::Vertex(id) => {
            let v = store.vertex(id)?;
            Ok(Aabb::from_point(v.point).enlarged(v.tolerance))
        }
        Shape::Edge(id) => {
            let e = store.edge(id)?;
            let mut bbox = if e.degenerate {
                Aabb::from_point(store.vertex(e.start)?.point)
            } else {
                curve_box(&e.trimmed())?
            };
            bbox.enlarge(e.tolerance);
            Ok(bbox)
        }
        Shape::Face(id) => face_box(store, id),
        Shape::Wire(_) | Shape::Shell(_) | Shape::Solid(_) | Shape::Compound(_) => {
            let mut bbox = Aabb::empty();
            for child in store.sub_shapes(shape)? {
                bbox.add_box(&shape_box(store, child)?);
            }
            Ok(bbox)
        }
    }
}
