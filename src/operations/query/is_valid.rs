use std::collections::HashMap;

use crate::error::Result;
use crate::topology::{EdgeId, FaceId, Shape, TopologyStore};

/// Validates the topological consistency of a shape.
///
/// Every wire must chain vertex to vertex and close on itself, and every
/// shell of a solid must be closed: each non-degenerate edge is used exactly
/// twice, once in each direction.
pub struct IsValid {
    shape: Shape,
}

impl IsValid {
    /// Creates a new `IsValid` query.
    #[must_use]
    pub fn new(shape: impl Into<Shape>) -> Self {
        Self {
            shape: shape.into(),
        }
    }

    /// Executes the validation, returning `true` if the shape is valid.
    #[must_use]
    pub fn execute(&self, store: &TopologyStore) -> bool {
        self.check(store).unwrap_or(false)
    }

    fn check(&self, store: &TopologyStore) -> Result<bool> {
        for face in store.faces_of(self.shape)? {
            if !wires_are_closed(store, face)? {
                return Ok(false);
            }
        }
        for solid in store.solids_of(self.shape)? {
            for shell in store.solid(solid)?.shells() {
                if !faces_are_closed(store, &store.shell(shell)?.faces)? {
                    return Ok(false);
                }
            }
        }
        Ok(true)
    }
}

fn wires_are_closed(store: &TopologyStore, face: FaceId) -> Result<bool> {
    for wire in store.face(face)?.wires() {
        let edges = &store.wire(wire)?.edges;
        if edges.is_empty() {
            return Ok(false);
        }
        for (i, &oe) in edges.iter().enumerate() {
            let next = edges[(i + 1) % edges.len()];
            if store.oriented_vertices(oe)?.1 != store.oriented_vertices(next)?.0 {
                return Ok(false);
            }
        }
    }
    Ok(true)
}

/// Returns `true` if every non-degenerate edge of `faces` is used exactly
/// once forward and once reversed.
///
/// # Errors
///
/// Returns an error if a referenced entity is missing.
pub fn faces_are_closed(store: &TopologyStore, faces: &[FaceId]) -> Result<bool> {
    let mut uses: HashMap<EdgeId, (usize, usize)> = HashMap::new();
    for &face in faces {
        for oe in store.face_edges(face)? {
            if store.edge(oe.edge)?.degenerate {
                continue;
            }
            let entry = uses.entry(oe.edge).or_default();
            if oe.forward {
                entry.0 += 1;
            } else {
                entry.1 += 1;
            }
        }
    }
    Ok(!uses.is_empty() && uses.values().all(|&(f, r)| f == 1 && r == 1))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::math::{Point3, Vector3};
    use crate::operations::creation::{MakeBox, MakeCylinder, MakeSphere};

    #[test]
    fn primitives_are_valid() {
        let mut store = TopologyStore::new();
        let b = MakeBox::new(Point3::origin(), Point3::new(1.0, 1.0, 1.0))
            .execute(&mut store)
            .unwrap();
        let c = MakeCylinder::new(Point3::origin(), 1.0, Vector3::z(), 2.0)
            .execute(&mut store)
            .unwrap();
        let s = MakeSphere::new(Point3::origin(), 1.0).execute(&mut store).unwrap();
        assert!(IsValid::new(b).execute(&store));
        assert!(IsValid::new(c).execute(&store));
        assert!(IsValid::new(s).execute(&store));
    }

    #[test]
    fn open_shell_is_invalid() {
        let mut store = TopologyStore::new();
        let b = MakeBox::new(Point3::origin(), Point3::new(1.0, 1.0, 1.0))
            .execute(&mut store)
            .unwrap();
        let mut faces = store.faces_of(b.into()).unwrap();
        faces.pop();
        assert!(!faces_are_closed(&store, &faces).unwrap());
    }
}
