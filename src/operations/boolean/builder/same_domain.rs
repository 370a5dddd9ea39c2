//! Split faces of different groups covering the same region.

use std::collections::HashMap;

use crate::error::Result;
use crate::geometry::Surface;
use crate::topology::{EdgeId, FaceId, TopologyStore};

use super::classify::Fragment;
use super::select::FaceState;
use super::Builder;
use crate::operations::boolean::oracle::GeometryOracle;

/// A fragment paired with a coinciding fragment of the other group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) struct Coinciding {
    /// The fragment deciding for both.
    pub(super) representative: usize,
    /// `OnSame` or `OnOpposite`.
    pub(super) state: FaceState,
}

impl Builder<'_, '_> {
    /// Pairs fragments of different groups bounded by the same edges and
    /// lying on the same surface.
    ///
    /// Both members of a pair map to the earlier one, which is an object
    /// fragment unless the groups were swapped.
    pub(super) fn same_domain_faces(
        &self,
        store: &TopologyStore,
        fragments: &[Fragment],
    ) -> Result<HashMap<usize, Coinciding>> {
        let oracle = self.filler.oracle();
        let fuzzy = self.filler.ds().fuzzy();
        let mut buckets: HashMap<Vec<EdgeId>, Vec<usize>> = HashMap::new();
        for (i, fragment) in fragments.iter().enumerate() {
            buckets.entry(edge_key(store, fragment.split.face)?).or_default().push(i);
        }
        let mut out = HashMap::new();
        for members in buckets.values().filter(|m| m.len() > 1) {
            for (k, &i) in members.iter().enumerate() {
                if out.contains_key(&i) {
                    continue;
                }
                for &j in &members[k + 1..] {
                    if out.contains_key(&j) || fragments[i].group == fragments[j].group {
                        continue;
                    }
                    let state = coincidence(oracle, store, &fragments[i], &fragments[j], fuzzy)?;
                    if let Some(state) = state {
                        let pair = Coinciding {
                            representative: i,
                            state,
                        };
                        out.insert(i, pair);
                        out.insert(j, pair);
                        break;
                    }
                }
            }
        }
        Ok(out)
    }
}

/// Sorted non-degenerate edges of a face.
fn edge_key(store: &TopologyStore, face: FaceId) -> Result<Vec<EdgeId>> {
    let mut key = Vec::new();
    for oe in store.face_edges(face)? {
        if !store.edge(oe.edge)?.degenerate {
            key.push(oe.edge);
        }
    }
    key.sort_unstable();
    key.dedup();
    Ok(key)
}

fn coincidence(
    oracle: &dyn GeometryOracle,
    store: &TopologyStore,
    a: &Fragment,
    b: &Fragment,
    fuzzy: f64,
) -> Result<Option<FaceState>> {
    if a.split.face == b.split.face {
        return Ok(Some(FaceState::OnSame));
    }
    let (fa, fb) = (store.face(a.split.face)?, store.face(b.split.face)?);
    let foot = oracle.project_point_on_surface(&b.split.inner_point, &fa.surface)?;
    if foot.distance > fa.tolerance + fb.tolerance + fuzzy {
        return Ok(None);
    }
    let na = fa.outward_normal(foot.uv.x, foot.uv.y)?;
    let (u, v) = fb.surface.inverse(&b.split.inner_point);
    let nb = fb.outward_normal(u, v)?;
    Ok(Some(if na.dot(&nb) > 0.0 {
        FaceState::OnSame
    } else {
        FaceState::OnOpposite
    }))
}
