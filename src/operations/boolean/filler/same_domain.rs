//! Merging of coinciding vertices into same-domain vertices.

use std::collections::BTreeMap;

use crate::error::Result;
use crate::math::Point3;

use super::PaveFiller;

/// Disjoint sets over DS indices.
#[derive(Debug, Default)]
struct UnionFind {
    parent: BTreeMap<usize, usize>,
}

impl UnionFind {
    fn find(&mut self, i: usize) -> usize {
        let mut root = i;
        while let Some(&p) = self.parent.get(&root) {
            if p == root {
                break;
            }
            root = p;
        }
        let mut current = i;
        while current != root {
            let next = self.parent.get(&current).copied().unwrap_or(root);
            self.parent.insert(current, root);
            current = next;
        }
        root
    }

    fn union(&mut self, a: usize, b: usize) {
        let (ra, rb) = (self.find(a), self.find(b));
        self.parent.entry(ra).or_insert(ra);
        self.parent.entry(rb).or_insert(rb);
        if ra != rb {
            // The smaller index wins so groups do not depend on pair order.
            let (lo, hi) = (ra.min(rb), ra.max(rb));
            self.parent.insert(hi, lo);
        }
    }

    fn groups(mut self) -> Vec<Vec<usize>> {
        let keys: Vec<usize> = self.parent.keys().copied().collect();
        let mut by_root: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
        for k in keys {
            let root = self.find(k);
            by_root.entry(root).or_default().push(k);
        }
        by_root.into_values().filter(|g| g.len() > 1).collect()
    }
}

impl PaveFiller<'_> {
    /// Replaces every connected group of `pairs` by one new vertex.
    ///
    /// The new vertex sits at the mean of the group and its tolerance covers
    /// every member's tolerance sphere. Returns `(members, new_vertex)` per
    /// group. Paves are rewritten to the new vertices.
    pub(super) fn merge_vertices(
        &mut self,
        pairs: &[(usize, usize)],
    ) -> Result<Vec<(Vec<usize>, usize)>> {
        let mut sets = UnionFind::default();
        for &(a, b) in pairs {
            let (a, b) = (self.ds.same_domain_index(a), self.ds.same_domain_index(b));
            if a != b {
                sets.union(a, b);
            }
        }
        let mut merged = Vec::new();
        for group in sets.groups() {
            let mut sum = Point3::origin().coords;
            for &m in &group {
                sum += self.ds.vertex_point(m)?.coords;
            }
            #[allow(clippy::cast_precision_loss)]
            let center = Point3::from(sum / group.len() as f64);
            let mut tolerance: f64 = 0.0;
            for &m in &group {
                let v = self.ds.vertex(m)?;
                tolerance = tolerance.max((v.point - center).norm() + v.tolerance);
            }
            let nv = self.ds.append_vertex(center, tolerance);
            for &m in &group {
                self.ds.add_same_domain(m, nv);
            }
            merged.push((group, nv));
        }
        if !merged.is_empty() {
            self.ds.rewrite_same_domain_paves();
        }
        Ok(merged)
    }

    /// Merges new vertices lying within each other's tolerance.
    pub(super) fn treat_new_vertices(&mut self, vertices: &[usize]) -> Result<()> {
        let live: Vec<usize> = {
            let mut v: Vec<usize> =
                vertices.iter().map(|&i| self.ds.same_domain_index(i)).collect();
            v.sort_unstable();
            v.dedup();
            v
        };
        let mut pairs = Vec::new();
        for (k, &a) in live.iter().enumerate() {
            let va = self.ds.vertex(a)?;
            for &b in &live[k + 1..] {
                let vb = self.ds.vertex(b)?;
                let reach = va.tolerance.max(vb.tolerance) + self.ds.fuzzy();
                if (va.point - vb.point).norm() <= reach {
                    pairs.push((a, b));
                }
            }
        }
        self.merge_vertices(&pairs)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn union_find_groups_transitively() {
        let mut sets = UnionFind::default();
        sets.union(4, 2);
        sets.union(2, 7);
        sets.union(9, 11);
        let groups = sets.groups();
        assert_eq!(groups, vec![vec![2, 4, 7], vec![9, 11]]);
    }
}
