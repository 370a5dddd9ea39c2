//! Construction of the result from a filled DS.
//!
//! Faces of the arguments are split along the section and in-face edges
//! recorded by the filler, coinciding fragments of different arguments are
//! paired, the others are classified against the opposite group of
//! arguments, and the fragments the operation keeps are sewn into solids.

mod classify;
mod face_split;
mod images;
mod known_partial;
mod same_domain;
mod section;
mod select;
mod solid_build;
mod unify;

pub use select::{should_keep_face, FaceState, Group, KeepDecision};

use std::collections::HashMap;

use tracing::{debug, info, instrument};

use crate::error::{BopError, Result};
use crate::topology::{FaceId, Shape, TopologyStore};

use super::filler::PaveFiller;
use super::operation::Operation;
use super::progress::check_cancelled;
use super::report::{Report, Warning};
use classify::Fragment;
use face_split::SplitFace;
use images::Images;
use solid_build::{assemble_solids, flipped_face, result_shape};

/// Builds Boolean results from the DS of a finished [`PaveFiller`].
///
/// Several operations may run one after the other on the same filler;
/// [`Builder::perform`] starts each from a clean state.
#[derive(Debug)]
pub struct Builder<'f, 'a> {
    filler: &'f PaveFiller<'a>,
    images: Images,
    splits: HashMap<usize, Vec<SplitFace>>,
    report: Report,
}

impl<'f, 'a> Builder<'f, 'a> {
    #[must_use]
    pub fn new(filler: &'f PaveFiller<'a>) -> Self {
        Self {
            filler,
            images: Images::new(!filler.options().non_destructive),
            splits: HashMap::new(),
            report: Report::new(),
        }
    }

    /// Warnings of the last run.
    #[must_use]
    pub fn report(&self) -> &Report {
        &self.report
    }

    /// Forgets the images, split faces and warnings of the last run. The DS
    /// is left untouched.
    pub fn clear(&mut self) {
        self.images.clear();
        self.splits.clear();
        self.report.clear();
    }

    /// Runs `operation`; the first `objects` arguments of the filler form
    /// the object group and the rest the tool group.
    ///
    /// Returns `None` for an empty result.
    ///
    /// # Errors
    ///
    /// Returns [`BopError::IntersectionFailed`] if the filler did not
    /// finish, [`BopError::Cancelled`] on cancellation and
    /// [`BopError::NoClassification`] if a fragment cannot be classified.
    #[instrument(skip_all, fields(operation = ?operation, objects = objects))]
    pub fn perform(
        &mut self,
        store: &mut TopologyStore,
        operation: Operation,
        objects: usize,
    ) -> Result<Option<Shape>> {
        if !self.filler.is_complete() {
            let message = "the intersection stage did not finish".into();
            return Err(BopError::IntersectionFailed(message).into());
        }
        self.clear();

        let (operation, groups) = self.groups(operation, objects);
        let result = match self.known_partial(store, operation, &groups)? {
            Some(result) => result,
            None if operation == Operation::Section => self.build_section(store)?,
            None => self.build_solids(store, operation, &groups)?,
        };
        if result.is_none() {
            self.report.add(Warning::EmptyResult);
        }
        info!(empty = result.is_none(), warnings = self.report.warnings().len(), "builder done");
        Ok(result)
    }

    fn check_cancelled(&self) -> Result<()> {
        check_cancelled(self.filler.options().cancel.as_ref())
    }

    /// Group of each argument; `CutReversed` becomes `Cut` of the swapped
    /// groups.
    fn groups(&self, operation: Operation, objects: usize) -> (Operation, Vec<Group>) {
        let swap = operation == Operation::CutReversed;
        let groups = (0..self.filler.arguments().len())
            .map(|rank| match (rank < objects, swap) {
                (true, false) | (false, true) => Group::Object,
                _ => Group::Tool,
            })
            .collect();
        let operation = if swap { Operation::Cut } else { operation };
        (operation, groups)
    }

    fn fragments(&mut self, store: &mut TopologyStore, groups: &[Group]) -> Result<Vec<Fragment>> {
        let filler = self.filler;
        let ds = filler.ds();
        let mut fragments = Vec::new();
        for (&argument, &group) in filler.arguments().iter().zip(groups) {
            for face in store.faces_of(argument)? {
                let Some(f) = ds.index_of(Shape::Face(face)) else {
                    continue;
                };
                for split in self.split_face(store, f)? {
                    fragments.push(Fragment { split, group });
                }
            }
        }
        Ok(fragments)
    }

    fn build_solids(
        &mut self,
        store: &mut TopologyStore,
        operation: Operation,
        groups: &[Group],
    ) -> Result<Option<Shape>> {
        let fragments = self.fragments(store, groups)?;
        self.check_cancelled()?;

        let coinciding = self.same_domain_faces(store, &fragments)?;
        let free: Vec<Fragment> = fragments
            .iter()
            .enumerate()
            .filter(|(i, _)| !coinciding.contains_key(i))
            .map(|(_, fragment)| fragment.clone())
            .collect();
        let mut states = self.classify_fragments(store, &free, groups)?.into_iter();
        self.check_cancelled()?;

        let mut kept: Vec<FaceId> = Vec::new();
        for (i, fragment) in fragments.iter().enumerate() {
            let state = match coinciding.get(&i) {
                Some(pair) if pair.representative != i => continue,
                Some(pair) => pair.state,
                None => match states.next() {
                    Some(state) => state,
                    None => {
                        let message = format!("fragment {i} has no state");
                        return Err(BopError::NoClassification(message).into());
                    }
                },
            };
            match should_keep_face(fragment.group, state, operation) {
                KeepDecision::Keep => kept.push(fragment.split.face),
                KeepDecision::KeepFlipped => kept.push(flipped_face(store, fragment.split.face)?),
                KeepDecision::Discard => {}
            }
        }
        debug!(
            fragments = fragments.len(),
            coinciding = coinciding.len(),
            kept = kept.len(),
            "faces selected"
        );

        if self.filler.options().unify_faces {
            kept = unify::unify_faces(store, kept)?;
        }
        let solids = assemble_solids(store, self.filler.oracle(), &kept, &mut self.report)?;
        Ok(result_shape(store, solids))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::math::Point3;
    use crate::operations::boolean::options::BooleanOptions;
    use crate::operations::creation::MakeBox;
    use crate::operations::query::Volume;

    fn filled(store: &mut TopologyStore, b_min: Point3, b_max: Point3) -> PaveFiller<'static> {
        let a = MakeBox::new(Point3::origin(), Point3::new(1.0, 1.0, 1.0))
            .execute(store)
            .unwrap();
        let b = MakeBox::new(b_min, b_max).execute(store).unwrap();
        let mut filler = PaveFiller::new(vec![a.into(), b.into()], BooleanOptions::default());
        filler.perform(store).unwrap();
        filler
    }

    fn volume(store: &TopologyStore, shape: Option<Shape>) -> f64 {
        Volume::new(shape.unwrap()).execute(store).unwrap()
    }

    #[test]
    fn unfinished_filler_is_refused() {
        let mut store = TopologyStore::new();
        let a = MakeBox::new(Point3::origin(), Point3::new(1.0, 1.0, 1.0))
            .execute(&mut store)
            .unwrap();
        let filler = PaveFiller::new(vec![a.into(), a.into()], BooleanOptions::default());
        let mut builder = Builder::new(&filler);
        let err = builder.perform(&mut store, Operation::Fuse, 1).unwrap_err();
        assert!(matches!(err, crate::GeolisError::Boolean(BopError::IntersectionFailed(_))));
    }

    #[test]
    fn one_filler_serves_every_operation() {
        let mut store = TopologyStore::new();
        let filler = filled(&mut store, Point3::new(0.5, 0.5, 0.5), Point3::new(1.5, 1.5, 1.5));
        let mut builder = Builder::new(&filler);
        let expected = [
            (Operation::Fuse, 1.875),
            (Operation::Common, 0.125),
            (Operation::Cut, 0.875),
            (Operation::CutReversed, 0.875),
        ];
        for (operation, v) in expected {
            let result = builder.perform(&mut store, operation, 1).unwrap();
            assert!((volume(&store, result) - v).abs() < 1e-9, "{operation:?}");
            assert!(!builder.report().has_warnings(), "{operation:?}");
        }
    }

    #[test]
    fn cut_reversed_swaps_the_groups() {
        let mut store = TopologyStore::new();
        let filler = filled(&mut store, Point3::new(0.5, 0.0, 0.0), Point3::new(2.0, 1.0, 1.0));
        let builder = Builder::new(&filler);
        let (operation, groups) = builder.groups(Operation::CutReversed, 1);
        assert_eq!(operation, Operation::Cut);
        assert_eq!(groups, vec![Group::Tool, Group::Object]);
    }

    #[test]
    fn touching_boxes_have_no_common_volume() {
        let mut store = TopologyStore::new();
        let filler = filled(&mut store, Point3::new(1.0, 0.0, 0.0), Point3::new(2.0, 1.0, 1.0));
        let mut builder = Builder::new(&filler);
        assert!(builder.perform(&mut store, Operation::Common, 1).unwrap().is_none());
        assert!(builder.report().contains(|w| *w == Warning::EmptyResult));

        let fused = builder.perform(&mut store, Operation::Fuse, 1).unwrap();
        assert!((volume(&store, fused) - 2.0).abs() < 1e-9);
        assert!(!builder.report().has_warnings());
    }

    #[test]
    fn unified_fuse_of_touching_boxes_has_six_faces() {
        let mut store = TopologyStore::new();
        let a = MakeBox::new(Point3::origin(), Point3::new(1.0, 1.0, 1.0))
            .execute(&mut store)
            .unwrap();
        let b = MakeBox::new(Point3::new(1.0, 0.0, 0.0), Point3::new(2.0, 1.0, 1.0))
            .execute(&mut store)
            .unwrap();
        let options = BooleanOptions::default().with_unify_faces(true);
        let mut filler = PaveFiller::new(vec![a.into(), b.into()], options);
        filler.perform(&store).unwrap();
        let mut builder = Builder::new(&filler);
        let fused = builder.perform(&mut store, Operation::Fuse, 1).unwrap().unwrap();
        assert_eq!(store.faces_of(fused).unwrap().len(), 6);
        assert!((volume(&store, Some(fused)) - 2.0).abs() < 1e-9);
    }

    #[test]
    fn disjoint_boxes_take_the_short_path() {
        let mut store = TopologyStore::new();
        let filler = filled(&mut store, Point3::new(3.0, 0.0, 0.0), Point3::new(4.0, 1.0, 1.0));
        let mut builder = Builder::new(&filler);
        let fused = builder.perform(&mut store, Operation::Fuse, 1).unwrap().unwrap();
        assert!(matches!(fused, Shape::Compound(_)));
        assert!((volume(&store, Some(fused)) - 2.0).abs() < 1e-9);
        assert!(builder.perform(&mut store, Operation::Common, 1).unwrap().is_none());
        let cut = builder.perform(&mut store, Operation::Cut, 1).unwrap();
        assert_eq!(cut, Some(filler.arguments()[0]));
    }

    #[test]
    fn nested_boxes_cut_leaves_a_void() {
        let mut store = TopologyStore::new();
        let outer = MakeBox::new(Point3::origin(), Point3::new(3.0, 3.0, 3.0))
            .execute(&mut store)
            .unwrap();
        let inner = MakeBox::new(Point3::new(1.0, 1.0, 1.0), Point3::new(2.0, 2.0, 2.0))
            .execute(&mut store)
            .unwrap();
        let arguments = vec![outer.into(), inner.into()];
        let mut filler = PaveFiller::new(arguments, BooleanOptions::default());
        filler.perform(&store).unwrap();
        let mut builder = Builder::new(&filler);
        let cut = builder.perform(&mut store, Operation::Cut, 1).unwrap();
        assert!((volume(&store, cut) - 26.0).abs() < 1e-9);
        let common = builder.perform(&mut store, Operation::Common, 1).unwrap();
        assert_eq!(common, Some(Shape::Solid(inner)));
        assert!(builder.perform(&mut store, Operation::CutReversed, 1).unwrap().is_none());
    }

    #[test]
    fn section_of_crossing_boxes() {
        let mut store = TopologyStore::new();
        let filler = filled(&mut store, Point3::new(0.5, 0.5, 0.5), Point3::new(1.5, 1.5, 1.5));
        let mut builder = Builder::new(&filler);
        let result = builder.perform(&mut store, Operation::Section, 1).unwrap();
        let Some(Shape::Compound(section)) = result else {
            panic!("expected a compound");
        };
        let shapes = &store.compound(section).unwrap().shapes;
        assert!(!shapes.is_empty());
        assert!(shapes.iter().all(|s| matches!(s, Shape::Edge(_))));
    }

    fn fused_volume(store: &mut TopologyStore, first: Shape, second: Shape) -> f64 {
        let mut filler = PaveFiller::new(vec![first, second], BooleanOptions::default());
        filler.perform(store).unwrap();
        let mut builder = Builder::new(&filler);
        let fused = builder.perform(store, Operation::Fuse, 1).unwrap();
        assert!(!builder.report().has_warnings(), "{:?}", builder.report());
        volume(store, fused)
    }

    #[test]
    fn fuse_does_not_depend_on_argument_order() {
        let cases = [
            // Diagonal overlap: B's bottom face splits into an L whose reflex
            // corner touches A's edge.
            ((0.0, 0.0, 0.0, 1.0, 1.0, 1.0), (0.5, 0.5, 0.5, 1.5, 1.5, 1.5), 1.875),
            ((0.0, 0.0, 0.0, 1.0, 1.0, 1.0), (0.5, 0.5, 0.0, 1.5, 1.5, 1.0), 1.75),
            ((0.0, 0.0, 0.0, 1.0, 1.0, 1.0), (0.25, 0.5, -0.5, 1.25, 1.5, 0.5), 1.8125),
            // A unit box standing on a slab.
            ((-2.0, -2.0, -1.0, 2.0, 2.0, 0.0), (0.0, 0.0, 0.0, 1.0, 1.0, 1.0), 17.0),
        ];
        for ((ax0, ay0, az0, ax1, ay1, az1), (bx0, by0, bz0, bx1, by1, bz1), expected) in cases {
            let mut store = TopologyStore::new();
            let a: Shape = MakeBox::new(Point3::new(ax0, ay0, az0), Point3::new(ax1, ay1, az1))
                .execute(&mut store)
                .unwrap()
                .into();
            let b: Shape = MakeBox::new(Point3::new(bx0, by0, bz0), Point3::new(bx1, by1, bz1))
                .execute(&mut store)
                .unwrap()
                .into();
            let ab = fused_volume(&mut store, a, b);
            let ba = fused_volume(&mut store, b, a);
            assert!((ab - expected).abs() < 1e-9, "fuse(a, b) = {ab}, expected {expected}");
            assert!((ba - expected).abs() < 1e-9, "fuse(b, a) = {ba}, expected {expected}");
        }
    }
}
