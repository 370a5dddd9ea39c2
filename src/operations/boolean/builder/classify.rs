use rayon::prelude::*;

use crate::error::{BopError, Result};
use crate::topology::TopologyStore;

use super::face_split::SplitFace;
use super::select::{FaceState, Group};
use super::Builder;
use crate::operations::boolean::ds::State;
use crate::operations::boolean::oracle::SolidClassifier;

/// A split face and the side of the operation it comes from.
#[derive(Debug, Clone)]
pub(super) struct Fragment {
    pub(super) split: SplitFace,
    pub(super) group: Group,
}

impl Builder<'_, '_> {
    /// Classifies each fragment against the solids of the other group.
    ///
    /// `groups` gives the group of every argument, by rank.
    ///
    /// # Errors
    ///
    /// Returns [`BopError::NoClassification`] if the other group has no
    /// solids or every inner point of a fragment lies on its boundary.
    pub(super) fn classify_fragments(
        &self,
        store: &TopologyStore,
        fragments: &[Fragment],
        groups: &[Group],
    ) -> Result<Vec<FaceState>> {
        let objects = self.group_classifier(store, Group::Object, groups)?;
        let tools = self.group_classifier(store, Group::Tool, groups)?;
        let ds = self.filler.ds();
        let oracle = self.filler.oracle();
        let classify = |fragment: &Fragment| -> Result<FaceState> {
            let against = match fragment.group {
                Group::Object => &tools,
                Group::Tool => &objects,
            };
            if against.is_empty() {
                return Err(BopError::NoClassification(format!(
                    "the {:?} group has no solids",
                    fragment.group.other()
                ))
                .into());
            }
            let tol = ds.tolerance(fragment.split.origin) + ds.fuzzy();
            // Unmatched fragments lie wholly in or out; On means the sample hit the boundary.
            for point in fragment.split.sample_points() {
                match against.classify(oracle, point, tol)? {
                    State::In => return Ok(FaceState::In),
                    State::Out => return Ok(FaceState::Out),
                    State::On => {}
                }
            }
            Err(BopError::NoClassification(format!(
                "every inner point of face {:?} lies on the {:?} boundary",
                fragment.split.face,
                fragment.group.other()
            ))
            .into())
        };
        if self.filler.options().parallel {
            fragments.par_iter().map(classify).collect()
        } else {
            fragments.iter().map(classify).collect()
        }
    }

    fn group_classifier(
        &self,
        store: &TopologyStore,
        group: Group,
        groups: &[Group],
    ) -> Result<SolidClassifier> {
        let mut solids = Vec::new();
        for (&argument, &g) in self.filler.arguments().iter().zip(groups) {
            if g == group {
                solids.extend(store.solids_of(argument)?);
            }
        }
        SolidClassifier::new(store, &solids)
    }
}
