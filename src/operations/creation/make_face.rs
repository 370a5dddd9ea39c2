use crate::error::{OperationError, Result, TopologyError};
use crate::geometry::curve::Curve;
use crate::geometry::surface::Plane;
use crate::math::{Point3, Vector3, PRECISION_CONFUSION, TOLERANCE};
use crate::topology::{FaceData, FaceId, FaceSurface, TopologyStore, WireId};

/// Creates a planar face from a closed outer wire and optional holes.
///
/// The plane normal is taken from the outer wire with Newell's method, so the
/// outer wire runs counter-clockwise around the face normal. Holes are
/// expected to run the other way.
pub struct MakeFace {
    outer_wire: WireId,
    inner_wires: Vec<WireId>,
}

impl MakeFace {
    /// Creates a new `MakeFace` operation.
    #[must_use]
    pub fn new(outer_wire: WireId, inner_wires: Vec<WireId>) -> Self {
        Self {
            outer_wire,
            inner_wires,
        }
    }

    /// Executes the operation, creating the face in the topology store.
    ///
    /// # Errors
    ///
    /// Returns an error if a wire is open, the outer wire encloses no area,
    /// or the wires are not coplanar.
    pub fn execute(&self, store: &mut TopologyStore) -> Result<FaceId> {
        let outer = wire_samples(store, self.outer_wire)?;
        let normal = newell_normal(&outer);
        let len = normal.norm();
        if len < TOLERANCE {
            return Err(OperationError::InvalidInput("outer wire encloses no area".into()).into());
        }
        let plane = Plane::from_normal(outer[0], normal / len)?;

        for &wire in std::iter::once(&self.outer_wire).chain(&self.inner_wires) {
            for p in wire_samples(store, wire)? {
                let offset = (p - plane.origin()).dot(plane.plane_normal());
                if offset.abs() > PRECISION_CONFUSION {
                    return Err(
                        OperationError::InvalidInput("face wires are not coplanar".into()).into(),
                    );
                }
            }
        }

        Ok(store.add_face(FaceData::new(
            FaceSurface::Plane(plane),
            self.outer_wire,
            self.inner_wires.clone(),
            true,
        )))
    }
}

/// Points along a closed wire in traversal order: every vertex plus interior
/// samples of curved edges.
fn wire_samples(store: &TopologyStore, wire: WireId) -> Result<Vec<Point3>> {
    let data = store.wire(wire)?;
    if !data.is_closed {
        return Err(TopologyError::WireNotClosed.into());
    }
    let mut points = Vec::new();
    for &oe in &data.edges {
        let edge = store.edge(oe.edge)?;
        let n = edge.curve.polyline_segments(edge.t_start, edge.t_end);
        for i in 0..n {
            #[allow(clippy::cast_precision_loss)]
            let f = i as f64 / n as f64;
            let t = if oe.forward {
                edge.t_start + (edge.t_end - edge.t_start) * f
            } else {
                edge.t_end - (edge.t_end - edge.t_start) * f
            };
            points.push(edge.curve.evaluate(t)?);
        }
    }
    Ok(points)
}

fn newell_normal(points: &[Point3]) -> Vector3 {
    let mut n = Vector3::zeros();
    for (i, a) in points.iter().enumerate() {
        let b = &points[(i + 1) % points.len()];
        n.x += (a.y - b.y) * (a.z + b.z);
        n.y += (a.z - b.z) * (a.x + b.x);
        n.z += (a.x - b.x) * (a.y + b.y);
    }
    n
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::operations::creation::MakeWire;

    fn square(store: &mut TopologyStore, z: f64, ccw: bool) -> WireId {
        let mut pts = vec![
            Point3::new(0.0, 0.0, z),
            Point3::new(1.0, 0.0, z),
            Point3::new(1.0, 1.0, z),
            Point3::new(0.0, 1.0, z),
        ];
        if !ccw {
            pts.reverse();
        }
        MakeWire::new(pts, true).execute(store).unwrap()
    }

    #[test]
    fn normal_follows_winding() {
        let mut store = TopologyStore::new();
        let up = square(&mut store, 0.0, true);
        let down = square(&mut store, 0.0, false);
        let f_up = MakeFace::new(up, vec![]).execute(&mut store).unwrap();
        let f_down = MakeFace::new(down, vec![]).execute(&mut store).unwrap();
        let n_up = store.face(f_up).unwrap().outward_normal(0.0, 0.0).unwrap();
        let n_down = store.face(f_down).unwrap().outward_normal(0.0, 0.0).unwrap();
        assert!((n_up - Vector3::z()).norm() < 1e-12);
        assert!((n_down + Vector3::z()).norm() < 1e-12);
    }

    #[test]
    fn non_coplanar_hole_rejected() {
        let mut store = TopologyStore::new();
        let outer = square(&mut store, 0.0, true);
        let hole = square(&mut store, 1.0, false);
        assert!(MakeFace::new(outer, vec![hole]).execute(&mut store).is_err());
    }

    #[test]
    fn open_wire_rejected() {
        let mut store = TopologyStore::new();
        let wire = MakeWire::new(
            vec![Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 0.0, 0.0)],
            false,
        )
        .execute(&mut store)
        .unwrap();
        assert!(MakeFace::new(wire, vec![]).execute(&mut store).is_err());
    }
}
