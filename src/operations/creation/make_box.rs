use std::collections::HashMap;

use crate::error::{OperationError, Result};
use crate::geometry::curve::Line;
use crate::geometry::surface::Plane;
use crate::math::{Point3, TOLERANCE};
use crate::topology::{
    EdgeCurve, EdgeData, EdgeId, FaceData, FaceSurface, OrientedEdge, SolidId, TopologyStore,
    VertexData, WireData,
};

use super::make_solid::solid_from_faces;

/// Corner indices of each face, counter-clockwise seen from outside.
/// Corner `i` has coordinates `(i & 1, (i >> 1) & 1, (i >> 2) & 1)`.
const FACES: [[usize; 4]; 6] = [
    [0, 2, 3, 1],
    [4, 5, 7, 6],
    [0, 1, 5, 4],
    [2, 6, 7, 3],
    [0, 4, 6, 2],
    [1, 3, 7, 5],
];

/// Creates an axis-aligned box solid from two corner points.
///
/// The box has 8 shared vertices, 12 line edges and 6 planar faces.
pub struct MakeBox {
    min_corner: Point3,
    max_corner: Point3,
}

impl MakeBox {
    /// Creates a new `MakeBox` operation.
    #[must_use]
    pub fn new(min_corner: Point3, max_corner: Point3) -> Self {
        Self {
            min_corner,
            max_corner,
        }
    }

    /// Executes the operation, creating the box in the topology store.
    ///
    /// # Errors
    ///
    /// Returns an error if the box is flat in any direction.
    pub fn execute(&self, store: &mut TopologyStore) -> Result<SolidId> {
        let (lo, hi) = (self.min_corner, self.max_corner);
        if (0..3).any(|k| hi[k] - lo[k] < TOLERANCE) {
            return Err(OperationError::InvalidInput(
                "box max corner must exceed min corner on every axis".into(),
            )
            .into());
        }

        let corners: Vec<Point3> = (0..8)
            .map(|i| {
                Point3::new(
                    if i & 1 == 0 { lo.x } else { hi.x },
                    if i & 2 == 0 { lo.y } else { hi.y },
                    if i & 4 == 0 { lo.z } else { hi.z },
                )
            })
            .collect();
        let vertices: Vec<_> = corners
            .iter()
            .map(|p| store.add_vertex(VertexData::new(*p)))
            .collect();

        let mut edges: HashMap<(usize, usize), EdgeId> = HashMap::new();
        let mut faces = Vec::with_capacity(6);
        for quad in FACES {
            let mut wire = Vec::with_capacity(4);
            for k in 0..4 {
                let (a, b) = (quad[k], quad[(k + 1) % 4]);
                let key = (a.min(b), a.max(b));
                let edge = match edges.get(&key) {
                    Some(&e) => e,
                    None => {
                        let (s, e) = key;
                        let line = Line::through(corners[s], corners[e])?;
                        let length = (corners[e] - corners[s]).norm();
                        let id = store.add_edge(EdgeData::new(
                            vertices[s],
                            vertices[e],
                            EdgeCurve::Line(line),
                            0.0,
                            length,
                        ));
                        edges.insert(key, id);
                        id
                    }
                };
                wire.push(OrientedEdge::new(edge, a < b));
            }
            let wire = store.add_wire(WireData {
                edges: wire,
                is_closed: true,
            });
            let origin = corners[quad[0]];
            let plane = Plane::new(
                origin,
                corners[quad[1]] - origin,
                corners[quad[3]] - origin,
            )?;
            let face = FaceData::new(FaceSurface::Plane(plane), wire, vec![], true);
            faces.push(store.add_face(face));
        }

        Ok(solid_from_faces(store, faces))
    }
}
