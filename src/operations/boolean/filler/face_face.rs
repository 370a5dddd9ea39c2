use std::collections::BTreeSet;
use std::f64::consts::TAU;

use crate::error::Result;
use crate::math::{Point3, PRECISION_CONFUSION};
use crate::operations::query::{curve_box, Aabb};
use crate::topology::{ShapeKind, TrimmedCurve};

use super::{log_stage, run_pairs, PaveFiller};
use crate::operations::boolean::ds::{InterfFF, Pave, SectionCurve, State};
use crate::operations::boolean::iterator::{candidate_pairs, PairScope};
use crate::operations::boolean::oracle::{parameter_on, parameter_tolerance};
use crate::operations::boolean::report::Warning;

/// Common part of two boxes; empty if they are apart.
fn box_intersection(a: &Aabb, b: &Aabb) -> Aabb {
    let out = Aabb {
        min: a.min.sup(&b.min),
        max: a.max.inf(&b.max),
    };
    if out.is_empty() {
        Aabb::empty()
    } else {
        out
    }
}

impl PaveFiller<'_> {
    /// Intersects faces of different arguments.
    pub(super) fn perform_ff(&mut self) -> Result<()> {
        let before = self.ds.interf_ff().len();
        self.update_face_infos()?;
        let tasks =
            candidate_pairs(&self.ds, ShapeKind::Face, ShapeKind::Face, PairScope::CrossArgument);

        let ds = &self.ds;
        let oracle = self.oracle;
        let results = run_pairs(self.options.parallel, &tasks, |&(f1, f2)| {
            let (a, b) = (ds.face(f1)?, ds.face(f2)?);
            let region = box_intersection(&ds.shape_info(f1)?.bbox, &ds.shape_info(f2)?.bbox);
            let tol = a.tolerance + b.tolerance + ds.fuzzy();
            oracle.surface_surface(&a.surface, &b.surface, &region, tol)
        });

        let mut merge_pairs = Vec::new();
        for (&(f1, f2), result) in tasks.iter().zip(results) {
            self.check_cancelled()?;
            let found = match result {
                Ok(found) => found,
                Err(err) => {
                    self.report.add(Warning::IntersectionOfPairOfShapesFailed {
                        index1: f1,
                        index2: f2,
                        reason: err.to_string(),
                    });
                    continue;
                }
            };
            if found.coincident {
                self.ds.add_interf_ff(InterfFF {
                    face1: f1,
                    face2: f2,
                    tangent: true,
                    curves: Vec::new(),
                    points: Vec::new(),
                });
                continue;
            }
            if self.glue_skips_crossings(f1, f2) {
                continue;
            }
            let mut curves = Vec::new();
            for curve in found.curves {
                if let Some(section) = self.make_section_curve(f1, f2, curve, &mut merge_pairs)? {
                    curves.push(section);
                }
            }
            let mut points = Vec::new();
            for point in found.points {
                if let Some(v) = self.section_point(f1, f2, &point)? {
                    points.push(v);
                }
            }
            if !curves.is_empty() || !points.is_empty() {
                self.ds.add_interf_ff(InterfFF {
                    face1: f1,
                    face2: f2,
                    tangent: false,
                    curves,
                    points,
                });
            }
        }
        self.merge_vertices(&merge_pairs)?;
        log_stage("face/face", before, self.ds.interf_ff().len());
        Ok(())
    }

    /// Vertices that may bound sections of `f1` and `f2`: their boundary
    /// vertices, the paves of their edges and everything found inside them.
    fn section_candidates(&self, f1: usize, f2: usize) -> BTreeSet<usize> {
        let mut out = BTreeSet::new();
        for f in [f1, f2] {
            out.extend(self.ds.face_vertices(f));
            for e in self.ds.face_edges(f) {
                out.extend(self.ds.paves_of_edge(e).into_iter().map(|p| p.vertex));
            }
            if let Some(info) = self.ds.face_info(f) {
                out.extend(info.all_vertices());
            }
        }
        out.into_iter().map(|v| self.ds.same_domain_index(v)).collect()
    }

    /// Puts paves on a section curve and bounds closed curves.
    ///
    /// Returns `None` if fewer than two paves remain.
    fn make_section_curve(
        &mut self,
        f1: usize,
        f2: usize,
        mut curve: TrimmedCurve,
        merge_pairs: &mut Vec<(usize, usize)>,
    ) -> Result<Option<SectionCurve>> {
        let tolerance = self
            .ds
            .tolerance(f1)
            .max(self.ds.tolerance(f2))
            .max(PRECISION_CONFUSION);
        let mut paves = Vec::new();
        for v in self.section_candidates(f1, f2) {
            let vertex = self.ds.vertex(v)?;
            let reach = vertex.tolerance + tolerance + self.ds.fuzzy();
            if let Some(t) = parameter_on(&curve, &vertex.point, reach) {
                if (curve.evaluate(t)? - vertex.point).norm() <= reach {
                    paves.push(Pave::new(v, t));
                }
            }
        }
        paves.sort_by(|a, b| a.param.total_cmp(&b.param).then(a.vertex.cmp(&b.vertex)));
        let eps = parameter_tolerance(&curve.curve, tolerance);
        let mut kept: Vec<Pave> = Vec::with_capacity(paves.len());
        for pave in paves {
            match kept.last() {
                Some(last) if last.vertex == pave.vertex => {}
                Some(last) if pave.param - last.param <= eps => {
                    merge_pairs.push((last.vertex, pave.vertex));
                }
                _ => kept.push(pave),
            }
        }
        let mut paves = kept;

        let full_turn = curve.curve.period().is_some()
            && (curve.t_end - curve.t_start - TAU).abs() < 1e-9;
        if full_turn {
            match (paves.first().copied(), paves.last().copied()) {
                (None, _) | (_, None) => {
                    let point = curve.evaluate(curve.t_start)?;
                    let nv = self.ds.append_vertex(point, tolerance);
                    paves = vec![Pave::new(nv, curve.t_start), Pave::new(nv, curve.t_end)];
                }
                (Some(first), Some(last)) if (first.param - curve.t_start).abs() <= eps => {
                    if (curve.t_end - last.param).abs() <= eps && paves.len() > 1 {
                        if last.vertex != first.vertex {
                            merge_pairs.push((first.vertex, last.vertex));
                        }
                        paves.pop();
                    }
                    paves.push(Pave::new(first.vertex, curve.t_end));
                }
                (Some(_), Some(last)) if (curve.t_end - last.param).abs() <= eps => {
                    paves.insert(0, Pave::new(last.vertex, curve.t_start));
                    if let Some(end) = paves.last_mut() {
                        end.param = curve.t_end;
                    }
                }
                (Some(first), Some(_)) => {
                    curve = TrimmedCurve::new(curve.curve.clone(), first.param, first.param + TAU);
                    paves.push(Pave::new(first.vertex, first.param + TAU));
                }
            }
        }
        if paves.len() < 2 {
            return Ok(None);
        }
        let bbox = curve_box(&curve)?.enlarged(tolerance);
        Ok(Some(SectionCurve {
            curve,
            tolerance,
            bbox,
            paves,
            pave_blocks: Vec::new(),
        }))
    }

    /// Vertex of an isolated touching point lying on both faces.
    fn section_point(&mut self, f1: usize, f2: usize, point: &Point3) -> Result<Option<usize>> {
        let tolerance = self.ds.tolerance(f1).max(self.ds.tolerance(f2)).max(PRECISION_CONFUSION);
        for f in [f1, f2] {
            let face = self.ds.face(f)?;
            if self
                .oracle
                .classify_point_on_face(point, &face.surface, &face.loops, tolerance)?
                == State::Out
            {
                return Ok(None);
            }
        }
        for v in self.section_candidates(f1, f2) {
            let vertex = self.ds.vertex(v)?;
            if (vertex.point - point).norm() <= vertex.tolerance + tolerance + self.ds.fuzzy() {
                return Ok(Some(v));
            }
        }
        Ok(Some(self.ds.append_vertex(*point, tolerance)))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::operations::boolean::filler::PaveFiller;
    use crate::operations::boolean::options::BooleanOptions;
    use crate::operations::creation::{MakeBox, MakeSphere};
    use crate::topology::{EdgeCurve, TopologyStore};

    #[test]
    fn box_intersection_is_the_overlap() {
        let a = Aabb {
            min: Point3::origin(),
            max: Point3::new(2.0, 2.0, 2.0),
        };
        let b = Aabb {
            min: Point3::new(1.0, 1.0, 1.0),
            max: Point3::new(3.0, 3.0, 3.0),
        };
        let c = box_intersection(&a, &b);
        assert_eq!(c.min, Point3::new(1.0, 1.0, 1.0));
        assert_eq!(c.max, Point3::new(2.0, 2.0, 2.0));
        let far = Aabb {
            min: Point3::new(5.0, 5.0, 5.0),
            max: Point3::new(6.0, 6.0, 6.0),
        };
        assert!(box_intersection(&a, &far).is_empty());
    }

    #[test]
    fn sphere_through_slab_gives_closed_sections() {
        let mut store = TopologyStore::new();
        let sphere = MakeSphere::new(Point3::origin(), 1.0).execute(&mut store).unwrap();
        let slab = MakeBox::new(Point3::new(-2.0, -2.0, -0.5), Point3::new(2.0, 2.0, 0.5))
            .execute(&mut store)
            .unwrap();
        let mut filler =
            PaveFiller::new(vec![sphere.into(), slab.into()], BooleanOptions::default());
        filler.perform(&store).unwrap();
        let circles: Vec<_> = filler
            .ds()
            .interf_ff()
            .iter()
            .flat_map(|ff| &ff.curves)
            .filter(|c| matches!(c.curve.curve, EdgeCurve::Circle(_)))
            .collect();
        assert_eq!(circles.len(), 2);
        for circle in circles {
            let first = circle.paves.first().unwrap();
            let last = circle.paves.last().unwrap();
            assert_eq!(first.vertex, last.vertex);
            assert!((last.param - first.param - TAU).abs() < 1e-9);
            assert_eq!(circle.pave_blocks.len(), 1);
        }
    }
}
