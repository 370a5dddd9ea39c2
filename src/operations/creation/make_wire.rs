use crate::error::{OperationError, Result};
use crate::geometry::curve::Line;
use crate::math::{Point3, TOLERANCE};
use crate::topology::{
    EdgeCurve, EdgeData, OrientedEdge, TopologyStore, VertexData, VertexId, WireData, WireId,
};

/// Creates a polyline wire from a sequence of 3D points.
///
/// Consecutive segments share their vertices; a closed wire reuses the first
/// vertex at the end.
pub struct MakeWire {
    points: Vec<Point3>,
    close: bool,
}

impl MakeWire {
    /// Creates a new `MakeWire` operation.
    #[must_use]
    pub fn new(points: Vec<Point3>, close: bool) -> Self {
        Self { points, close }
    }

    /// Executes the operation, creating the wire in the topology store.
    ///
    /// # Errors
    ///
    /// Returns an error if fewer than two points (three when closed) are given
    /// or two consecutive points coincide.
    pub fn execute(&self, store: &mut TopologyStore) -> Result<WireId> {
        let min_points = if self.close { 3 } else { 2 };
        if self.points.len() < min_points {
            return Err(OperationError::InvalidInput(format!(
                "wire needs at least {min_points} points, got {}",
                self.points.len()
            ))
            .into());
        }

        let vertices: Vec<VertexId> = self
            .points
            .iter()
            .map(|p| store.add_vertex(VertexData::new(*p)))
            .collect();

        let segment_count = if self.close {
            vertices.len()
        } else {
            vertices.len() - 1
        };
        let mut edges = Vec::with_capacity(segment_count);
        for i in 0..segment_count {
            let j = (i + 1) % vertices.len();
            let (a, b) = (self.points[i], self.points[j]);
            let length = (b - a).norm();
            if length < TOLERANCE {
                return Err(
                    OperationError::InvalidInput(format!("points {i} and {j} coincide")).into(),
                );
            }
            let line = Line::through(a, b)?;
            let edge = store.add_edge(EdgeData::new(
                vertices[i],
                vertices[j],
                EdgeCurve::Line(line),
                0.0,
                length,
            ));
            edges.push(OrientedEdge::new(edge, true));
        }

        Ok(store.add_wire(WireData {
            edges,
            is_closed: self.close,
        }))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn closed_triangle_shares_vertices() {
        let mut store = TopologyStore::new();
        let wire = MakeWire::new(
            vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(0.0, 1.0, 0.0),
            ],
            true,
        )
        .execute(&mut store)
        .unwrap();
        let data = store.wire(wire).unwrap();
        assert_eq!(data.edges.len(), 3);
        assert!(data.is_closed);
        let first = store.oriented_vertices(data.edges[0]).unwrap().0;
        let last = store.oriented_vertices(data.edges[2]).unwrap().1;
        assert_eq!(first, last);
    }

    #[test]
    fn duplicate_points_rejected() {
        let mut store = TopologyStore::new();
        let p = Point3::new(1.0, 1.0, 1.0);
        assert!(MakeWire::new(vec![p, p], false).execute(&mut store).is_err());
    }
}
