//! Results read off the arguments without splitting anything.
//!
//! Two solids that do not touch, one solid strictly inside the other, two
//! solids bounded by the same faces and two coinciding faces all have
//! results made of the arguments themselves.

use tracing::debug;

use crate::error::Result;
use crate::math::PRECISION_CONFUSION;
use crate::operations::query::Aabb;
use crate::topology::{CompoundData, FaceId, Shape, ShellData, SolidData, SolidId, TopologyStore};

use super::face_split::inner_point;
use super::select::Group;
use super::solid_build::flipped_face;
use super::Builder;
use crate::operations::boolean::ds::State;
use crate::operations::boolean::operation::Operation;
use crate::operations::boolean::oracle::SolidClassifier;

/// How the object solid sits relative to the tool solid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Placement {
    Disjoint,
    ObjectInside,
    ToolInside,
}

impl Builder<'_, '_> {
    /// Result of a known configuration, or `None` to take the general path.
    ///
    /// `operation` is already normalized: `CutReversed` arrives as `Cut`
    /// with the groups swapped.
    pub(super) fn known_partial(
        &self,
        store: &mut TopologyStore,
        operation: Operation,
        groups: &[Group],
    ) -> Result<Option<Option<Shape>>> {
        let arguments = self.filler.arguments();
        let [first, second] = arguments else {
            return Ok(None);
        };
        let (object, tool) = match groups {
            [Group::Object, Group::Tool] => (*first, *second),
            [Group::Tool, Group::Object] => (*second, *first),
            _ => return Ok(None),
        };
        match (object, tool) {
            (Shape::Solid(a), Shape::Solid(b)) => {
                if let Some(result) = self.same_domain_solids(store, operation, a, b)? {
                    return Ok(Some(result));
                }
                self.separated_solids(store, operation, a, b)
            }
            (Shape::Face(_), Shape::Face(_)) => self.same_faces(store, operation, object, tool),
            _ => Ok(None),
        }
    }

    fn separated_solids(
        &self,
        store: &mut TopologyStore,
        operation: Operation,
        a: SolidId,
        b: SolidId,
    ) -> Result<Option<Option<Shape>>> {
        if operation == Operation::Section || self.filler.ds().has_cross_rank_interferences() {
            return Ok(None);
        }
        let Some(placement) = self.placement(store, a, b)? else {
            return Ok(None);
        };
        debug!(?placement, ?operation, "known configuration of two solids");
        let result = match (placement, operation) {
            (Placement::Disjoint, Operation::Fuse) => {
                let shapes = vec![Shape::Solid(a), Shape::Solid(b)];
                Some(Shape::Compound(store.add_compound(CompoundData { shapes })))
            }
            (Placement::Disjoint, Operation::Cut) => Some(Shape::Solid(a)),
            (Placement::ObjectInside, Operation::Fuse)
            | (Placement::ToolInside, Operation::Common) => {
                Some(Shape::Solid(b))
            }
            (Placement::ObjectInside, Operation::Common)
            | (Placement::ToolInside, Operation::Fuse) => {
                Some(Shape::Solid(a))
            }
            (Placement::ToolInside, Operation::Cut) => Some(Shape::Solid(with_void(store, a, b)?)),
            _ => None,
        };
        Ok(Some(result))
    }

    /// Where `a` lies relative to `b`, for solids whose boundaries do not
    /// meet. `None` when a sample lands on the other boundary or a solid has
    /// voids of its own.
    fn placement(
        &self,
        store: &TopologyStore,
        a: SolidId,
        b: SolidId,
    ) -> Result<Option<Placement>> {
        if !store.solid(a)?.inner_shells.is_empty() || !store.solid(b)?.inner_shells.is_empty() {
            return Ok(None);
        }
        let a_in_b = self.sample_state(store, a, b)?;
        let b_in_a = self.sample_state(store, b, a)?;
        Ok(match (a_in_b, b_in_a) {
            (State::Out, State::Out) => Some(Placement::Disjoint),
            (State::In, State::Out) => Some(Placement::ObjectInside),
            (State::Out, State::In) => Some(Placement::ToolInside),
            _ => None,
        })
    }

    /// State of a point on the boundary of `solid` relative to `other`.
    fn sample_state(
        &self,
        store: &TopologyStore,
        solid: SolidId,
        other: SolidId,
    ) -> Result<State> {
        let Some(&face) = store.faces_of(Shape::Solid(solid))?.first() else {
            return Ok(State::On);
        };
        let sample = inner_point(store, face)?;
        let classifier = SolidClassifier::new(store, &[other])?;
        let ds = self.filler.ds();
        let tol = ds.index_of(Shape::Face(face)).map_or(PRECISION_CONFUSION, |i| ds.tolerance(i))
            + ds.fuzzy();
        classifier.classify(self.filler.oracle(), &sample, tol)
    }

    /// Solids bounded by coinciding faces: every face of either meets a face
    /// of the other tangentially and the boxes agree.
    fn same_domain_solids(
        &self,
        store: &TopologyStore,
        operation: Operation,
        a: SolidId,
        b: SolidId,
    ) -> Result<Option<Option<Shape>>> {
        if operation == Operation::Section || !self.boxes_match(Shape::Solid(a), Shape::Solid(b)) {
            return Ok(None);
        }
        let faces_a = store.faces_of(Shape::Solid(a))?;
        let faces_b = store.faces_of(Shape::Solid(b))?;
        if faces_a.len() != faces_b.len()
            || !self.all_tangent(&faces_a)
            || !self.all_tangent(&faces_b)
        {
            return Ok(None);
        }
        debug!(?operation, "arguments bound the same solid");
        Ok(Some(match operation {
            Operation::Fuse | Operation::Common => Some(Shape::Solid(a)),
            _ => None,
        }))
    }

    /// Two coinciding faces.
    fn same_faces(
        &self,
        store: &mut TopologyStore,
        operation: Operation,
        a: Shape,
        b: Shape,
    ) -> Result<Option<Option<Shape>>> {
        let (Shape::Face(fa), Shape::Face(_)) = (a, b) else {
            return Ok(None);
        };
        let ds = self.filler.ds();
        let (Some(ia), Some(ib)) = (ds.index_of(a), ds.index_of(b)) else {
            return Ok(None);
        };
        let tangent = ds.interf_ff().iter().any(|ff| {
            ff.tangent && ((ff.face1 == ia && ff.face2 == ib) || (ff.face1 == ib && ff.face2 == ia))
        });
        if !tangent || !self.boxes_match(a, b) {
            return Ok(None);
        }
        debug!(?operation, "arguments are the same face");
        Ok(Some(match operation {
            Operation::Fuse | Operation::Common => Some(a),
            Operation::Section => {
                let shapes = store
                    .face_edges(fa)?
                    .into_iter()
                    .map(|oe| Shape::Edge(oe.edge))
                    .collect();
                Some(Shape::Compound(store.add_compound(CompoundData { shapes })))
            }
            _ => None,
        }))
    }

    fn boxes_match(&self, a: Shape, b: Shape) -> bool {
        let ds = self.filler.ds();
        let boxes = (ds.index_of(a), ds.index_of(b));
        let (Some(ia), Some(ib)) = boxes else {
            return false;
        };
        let (Ok(sa), Ok(sb)) = (ds.shape_info(ia), ds.shape_info(ib)) else {
            return false;
        };
        let slack = PRECISION_CONFUSION + ds.fuzzy();
        same_box(&sa.bbox, &sb.bbox, slack)
    }

    /// Every face meets a face of another argument tangentially.
    fn all_tangent(&self, faces: &[FaceId]) -> bool {
        let ds = self.filler.ds();
        faces.iter().all(|&face| {
            let Some(i) = ds.index_of(Shape::Face(face)) else {
                return false;
            };
            ds.interf_ff().iter().any(|ff| {
                ff.tangent
                    && (ff.face1 == i || ff.face2 == i)
                    && ds.rank(ff.face1) != ds.rank(ff.face2)
            })
        })
    }
}

fn same_box(a: &Aabb, b: &Aabb, slack: f64) -> bool {
    (a.min - b.min).amax() <= slack && (a.max - b.max).amax() <= slack
}

/// `outer` with `inner` carved out as a void.
fn with_void(store: &mut TopologyStore, outer: SolidId, inner: SolidId) -> Result<SolidId> {
    let faces = store.faces_of(Shape::Solid(inner))?;
    let mut flipped = Vec::with_capacity(faces.len());
    for face in faces {
        flipped.push(flipped_face(store, face)?);
    }
    let void = store.add_shell(ShellData {
        faces: flipped,
        is_closed: true,
    });
    let data = store.solid(outer)?;
    let mut inner_shells = data.inner_shells.clone();
    inner_shells.push(void);
    Ok(store.add_solid(SolidData {
        outer_shell: data.outer_shell,
        inner_shells,
    }))
}
