//! Broad phase: candidate pairs of DS shapes with overlapping boxes.

use crate::topology::ShapeKind;

use super::ds::Ds;

/// Which pairs a sweep reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PairScope {
    /// Shapes of different arguments.
    CrossArgument,
    /// Shapes of the same argument.
    SameArgument,
}

/// Pairs `(i, j)` with `i` of `kind1` and `j` of `kind2` whose boxes
/// overlap, sorted ascending.
///
/// For equal kinds each pair is reported once with `i < j`. Boxes are
/// widened by the fuzzy value. Only argument shapes take part; degenerate
/// edges are skipped.
#[must_use]
pub fn candidate_pairs(
    ds: &Ds,
    kind1: ShapeKind,
    kind2: ShapeKind,
    scope: PairScope,
) -> Vec<(usize, usize)> {
    let eligible = |i: &usize| {
        ds.rank(*i).is_some()
            && ds.shape_info(*i).is_ok_and(|s| !s.is_degenerate() && !s.bbox.is_empty())
    };
    let first: Vec<usize> = ds.indices_of_kind(kind1).into_iter().filter(eligible).collect();
    let second: Vec<usize> = if kind1 == kind2 {
        first.clone()
    } else {
        ds.indices_of_kind(kind2).into_iter().filter(eligible).collect()
    };

    // Sweep along x over the second list.
    let min_x = |i: usize| ds.shape_info(i).map_or(f64::INFINITY, |s| s.bbox.min.x);
    let mut sorted = second;
    sorted.sort_by(|&a, &b| min_x(a).total_cmp(&min_x(b)));

    let mut out = Vec::new();
    for &i in &first {
        let Ok(info_i) = ds.shape_info(i) else {
            continue;
        };
        let box_i = info_i.bbox.enlarged(ds.fuzzy());
        let end = sorted.partition_point(|&j| min_x(j) <= box_i.max.x);
        for &j in &sorted[..end] {
            if kind1 == kind2 && j <= i {
                continue;
            }
            let same_rank = ds.rank(i) == ds.rank(j);
            let wanted = match scope {
                PairScope::CrossArgument => !same_rank,
                PairScope::SameArgument => same_rank,
            };
            if !wanted {
                continue;
            }
            if ds.shape_info(j).is_ok_and(|s| s.bbox.overlaps(&box_i)) {
                out.push((i, j));
            }
        }
    }
    out.sort_unstable();
    out
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::math::Point3;
    use crate::operations::creation::MakeBox;
    use crate::topology::TopologyStore;

    #[test]
    fn touching_boxes_pair_their_shared_faces() {
        let mut store = TopologyStore::new();
        let a = MakeBox::new(Point3::origin(), Point3::new(1.0, 1.0, 1.0))
            .execute(&mut store)
            .unwrap();
        let b = MakeBox::new(Point3::new(1.0, 0.0, 0.0), Point3::new(2.0, 1.0, 1.0))
            .execute(&mut store)
            .unwrap();
        let mut ds = Ds::new();
        ds.init(&store, &[a.into(), b.into()], 0.0).unwrap();
        let vv =
            candidate_pairs(&ds, ShapeKind::Vertex, ShapeKind::Vertex, PairScope::CrossArgument);
        assert_eq!(vv.len(), 4);
        assert!(vv.windows(2).all(|w| w[0] < w[1]));
        assert!(vv.iter().all(|&(i, j)| ds.rank(i) != ds.rank(j)));
        let own = candidate_pairs(&ds, ShapeKind::Face, ShapeKind::Face, PairScope::SameArgument);
        assert!(own.iter().all(|&(i, j)| ds.rank(i) == ds.rank(j) && i < j));
    }

    #[test]
    fn far_boxes_have_no_pairs() {
        let mut store = TopologyStore::new();
        let a = MakeBox::new(Point3::origin(), Point3::new(1.0, 1.0, 1.0))
            .execute(&mut store)
            .unwrap();
        let b = MakeBox::new(Point3::new(5.0, 5.0, 5.0), Point3::new(6.0, 6.0, 6.0))
            .execute(&mut store)
            .unwrap();
        let mut ds = Ds::new();
        ds.init(&store, &[a.into(), b.into()], 0.0).unwrap();
        assert!(
            candidate_pairs(&ds, ShapeKind::Face, ShapeKind::Face, PairScope::CrossArgument)
                .is_empty()
        );
    }
}
