use crate::error::Result;
use crate::topology::{EdgeId, TopologyStore};

/// Computes the length of an edge.
pub struct Length {
    edge: EdgeId,
}

impl Length {
    /// Creates a new `Length` query.
    #[must_use]
    pub fn new(edge: EdgeId) -> Self {
        Self { edge }
    }

    /// Executes the query, returning the curve length.
    ///
    /// Lines are parameterized by arc length; circles by angle, so their
    /// length is `radius * |t_end - t_start|`. Degenerate edges have zero length.
    ///
    /// # Errors
    ///
    /// Returns an error if the edge is not found.
    pub fn execute(&self, store: &TopologyStore) -> Result<f64> {
        let edge = store.edge(self.edge)?;
        if edge.degenerate {
            return Ok(0.0);
        }
        Ok(edge.trimmed().length())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::math::{Point3, Vector3};
    use crate::operations::creation::{MakeCylinder, MakeWire};
    use crate::topology::EdgeCurve;
    use std::f64::consts::PI;

    #[test]
    fn line_length_3_4_5() {
        let mut store = TopologyStore::new();
        let wire = MakeWire::new(
            vec![Point3::new(0.0, 0.0, 0.0), Point3::new(3.0, 4.0, 0.0)],
            false,
        )
        .execute(&mut store)
        .unwrap();
        let edge_id = store.wire(wire).unwrap().edges[0].edge;

        let len = Length::new(edge_id).execute(&store).unwrap();
        assert!((len - 5.0).abs() < 1e-10);
    }

    #[test]
    fn full_circle_length() {
        let mut store = TopologyStore::new();
        let solid = MakeCylinder::new(Point3::origin(), 2.0, Vector3::z(), 1.0)
            .execute(&mut store)
            .unwrap();
        let faces = store.faces_of(solid.into()).unwrap();
        let circle = faces
            .iter()
            .flat_map(|&f| store.face_edges(f).unwrap())
            .find(|oe| matches!(store.edge(oe.edge).unwrap().curve, EdgeCurve::Circle(_)))
            .unwrap();
        let len = Length::new(circle.edge).execute(&store).unwrap();
        assert!((len - 4.0 * PI).abs() < 1e-10);
    }
}
