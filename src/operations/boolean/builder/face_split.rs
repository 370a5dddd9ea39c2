//! Splitting of argument faces along the edges that cut them.
//!
//! A face is rebuilt in its parameter space. Boundary edges contribute
//! their split pieces once, in wire direction; edges running inside the
//! face (sections and edges of other arguments lying on it) contribute
//! both directions. Walking from every half-edge and always taking the
//! sharpest turn towards the face side traces each region of the face
//! once, with the region on that side. Loops bounding material become
//! faces, the others become holes of the smallest face around them.

use std::collections::{BTreeSet, HashMap};
use std::f64::consts::TAU;

use tracing::debug;

use crate::error::{BopError, Result};
use crate::geometry::pcurve::shift_into_period;
use crate::geometry::{Curve, Surface};
use crate::math::polygon_2d::{
    distance_to_segment, interior_points, point_in_polygon_2d, signed_area_2d,
};
use crate::math::{Point2, Point3, Vector2};
use crate::operations::query::{
    closest_point_bounded, edge_pcurve, placed_wires, FaceLoops, PlacedEdge,
};
use crate::topology::{
    EdgeId, FaceData, FaceId, FaceSurface, OrientedEdge, Shape, TopologyStore, TrimmedCurve,
    VertexId, WireData,
};

use super::Builder;

/// Loops with a smaller parameter-space area are slivers and dropped.
const AREA_EPS: f64 = 1e-12;
/// Turns closer than this to zero count as going straight back.
const ANGLE_EPS: f64 = 1e-9;
/// A hole sample this close to a loop lies on it.
const ON_LOOP_EPS: f64 = 1e-9;
/// Inner points kept per split face.
const SAMPLE_POINTS: usize = 4;

/// A face of the result cut out of one argument face.
#[derive(Debug, Clone)]
pub(super) struct SplitFace {
    pub(super) face: FaceId,
    /// DS index of the argument face.
    pub(super) origin: usize,
    /// A point inside the face, away from its boundary.
    pub(super) inner_point: Point3,
    /// Further inner points, nearer the boundary.
    pub(super) fallback_points: Vec<Point3>,
}

impl SplitFace {
    fn new(face: FaceId, origin: usize, mut points: Vec<Point3>) -> Option<Self> {
        if points.is_empty() {
            return None;
        }
        let inner_point = points.remove(0);
        Some(Self {
            face,
            origin,
            inner_point,
            fallback_points: points,
        })
    }

    /// Inner points in the order they should be tried.
    pub(super) fn sample_points(&self) -> impl Iterator<Item = &Point3> {
        std::iter::once(&self.inner_point).chain(&self.fallback_points)
    }
}

#[derive(Debug, Clone)]
struct HalfEdge {
    edge: OrientedEdge,
    start: VertexId,
    end: VertexId,
    uv: Vec<Point2>,
    boundary: bool,
}

#[derive(Debug)]
struct TracedLoop {
    halves: Vec<usize>,
    polygon: Vec<Point2>,
    /// Signed area, positive for loops bounding material.
    area: f64,
}

impl Builder<'_, '_> {
    /// Splits DS face `f`. Repeated calls return the same pieces.
    pub(super) fn split_face(
        &mut self,
        store: &mut TopologyStore,
        f: usize,
    ) -> Result<Vec<SplitFace>> {
        if let Some(done) = self.splits.get(&f) {
            return Ok(done.clone());
        }
        let pieces = self.build_split(store, f)?;
        self.splits.insert(f, pieces.clone());
        Ok(pieces)
    }

    fn build_split(&mut self, store: &mut TopologyStore, f: usize) -> Result<Vec<SplitFace>> {
        let filler = self.filler;
        let ds = filler.ds();
        let Some(Shape::Face(face)) = ds.shape_info(f)?.shape else {
            let message = format!("DS shape {f} is not an argument face");
            return Err(BopError::IntersectionFailed(message).into());
        };
        if self.is_untouched(store, f, face)? {
            let split = SplitFace::new(face, f, inner_points(store, face)?)
                .ok_or_else(|| no_inner_point(face))?;
            return Ok(vec![split]);
        }

        let geometry = ds.face(f)?;
        let surface = geometry.surface.clone();
        let (same_sense, tolerance) = (geometry.same_sense, geometry.tolerance);
        let period = surface.u_period();
        let mut halves = self.boundary_halves(store, f, face, &surface)?;
        self.add_inner_halves(store, f, &surface, &mut halves)?;

        let loops = trace_loops(&halves, period, same_sense);
        let mut pieces = Vec::new();
        for (outer, holes) in assign_holes(loops, period) {
            let mut polygons = vec![outer.polygon.clone()];
            polygons.extend(holes.iter().map(|h| h.polygon.clone()));
            let uvs = interior_points(&polygons);
            if uvs.is_empty() {
                debug!(face = f, "split face too thin for an inner point");
                continue;
            }
            let wire = |lp: &TracedLoop| WireData {
                edges: lp.halves.iter().map(|&h| halves[h].edge).collect(),
                is_closed: true,
            };
            let outer_wire = store.add_wire(wire(&outer));
            let inner_wires = holes.iter().map(|h| store.add_wire(wire(h))).collect();
            let mut data = FaceData::new(surface.clone(), outer_wire, inner_wires, same_sense);
            data.tolerance = tolerance;
            let points = uvs
                .iter()
                .take(SAMPLE_POINTS)
                .map(|uv| surface.evaluate(uv.x, uv.y))
                .collect::<Result<Vec<_>>>()?;
            pieces.extend(SplitFace::new(store.add_face(data), f, points));
        }
        debug!(face = f, pieces = pieces.len(), "face split");
        Ok(pieces)
    }

    /// Returns `true` if face `f` can go into the result as it is.
    fn is_untouched(&mut self, store: &mut TopologyStore, f: usize, face: FaceId) -> Result<bool> {
        let filler = self.filler;
        let ds = filler.ds();
        if ds.face_info(f).is_some_and(|info| info.cutting_blocks().next().is_some()) {
            return Ok(false);
        }
        for oe in store.face_edges(face)? {
            let Some(e) = ds.index_of(Shape::Edge(oe.edge)) else {
                return Ok(false);
            };
            if !ds.shape_info(e)?.is_degenerate() {
                let blocks = ds.pave_blocks_of(e);
                if blocks.len() != 1 || ds.pave_block(blocks[0])?.split_edge != Some(e) {
                    return Ok(false);
                }
            }
            if self.images.edge(ds, store, e)? != oe.edge {
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn boundary_halves(
        &mut self,
        store: &mut TopologyStore,
        f: usize,
        face: FaceId,
        surface: &FaceSurface,
    ) -> Result<Vec<HalfEdge>> {
        let filler = self.filler;
        let ds = filler.ds();
        let mut halves = Vec::new();
        for wire in placed_wires(store, face)? {
            for placed in wire {
                let e = ds
                    .index_of(Shape::Edge(placed.oriented.edge))
                    .ok_or_else(|| {
                        let message = format!("an edge of face {f} is missing from the DS");
                        BopError::IntersectionFailed(message)
                    })?;
                if placed.degenerate {
                    let image = self.images.edge(ds, store, e)?;
                    let edge = OrientedEdge::new(image, placed.oriented.forward);
                    let (start, end) = store.oriented_vertices(edge)?;
                    halves.push(HalfEdge {
                        edge,
                        start,
                        end,
                        uv: placed.uv,
                        boundary: true,
                    });
                } else {
                    // An edge whose blocks all collapsed leaves a merged vertex behind.
                    self.push_pieces(store, e, &placed, surface, &mut halves)?;
                }
            }
        }
        Ok(halves)
    }

    /// Adds the split pieces of boundary edge `e` in traversal order.
    fn push_pieces(
        &mut self,
        store: &mut TopologyStore,
        e: usize,
        placed: &PlacedEdge,
        surface: &FaceSurface,
        halves: &mut Vec<HalfEdge>,
    ) -> Result<()> {
        let filler = self.filler;
        let ds = filler.ds();
        let forward = placed.oriented.forward;
        let whole = &ds.edge(e)?.curve;
        let span = whole.t_end - whole.t_start;
        let mut blocks = ds.pave_blocks_of(e).to_vec();
        if !forward {
            blocks.reverse();
        }
        for id in blocks {
            let pb = ds.pave_block(id)?;
            let split = pb
                .split_edge
                .ok_or_else(|| {
                    BopError::IntersectionFailed(format!("a block of edge {e} has no split edge"))
                })?;
            let image = self.images.edge(ds, store, split)?;
            let piece = ds.pave_block_curve(id)?;
            let along = runs_along(&piece, &ds.edge(split)?.curve)?;
            let mut uv = edge_pcurve(&piece, forward, surface)?;
            if let Some(period) = surface.u_period().filter(|_| span > 0.0) {
                let entry = if forward { pb.pave1.param } else { pb.pave2.param };
                let fraction = (entry - whole.t_start) / span;
                let fraction = if forward { fraction } else { 1.0 - fraction };
                align_to(&mut uv, &placed.uv, fraction, period);
            }
            let edge = OrientedEdge::new(image, forward == along);
            let (start, end) = store.oriented_vertices(edge)?;
            halves.push(HalfEdge {
                edge,
                start,
                end,
                uv,
                boundary: true,
            });
        }
        Ok(())
    }

    /// Adds both directions of every edge cutting the inside of face `f`.
    fn add_inner_halves(
        &mut self,
        store: &mut TopologyStore,
        f: usize,
        surface: &FaceSurface,
        halves: &mut Vec<HalfEdge>,
    ) -> Result<()> {
        let filler = self.filler;
        let ds = filler.ds();
        let Some(info) = ds.face_info(f) else {
            return Ok(());
        };
        let on_boundary: BTreeSet<EdgeId> = halves.iter().map(|h| h.edge.edge).collect();
        let mut seen = BTreeSet::new();
        for id in info.cutting_blocks() {
            let Some(split) = ds.pave_block(id)?.split_edge else {
                continue;
            };
            if !seen.insert(split) {
                continue;
            }
            let image = self.images.edge(ds, store, split)?;
            if on_boundary.contains(&image) {
                continue;
            }
            let mut uv = match ds.pcurve(split, f) {
                Some(uv) => uv.to_vec(),
                None => edge_pcurve(&ds.edge(split)?.curve, true, surface)?,
            };
            if uv.len() < 2 {
                continue;
            }
            if let Some(period) = surface.u_period() {
                shift_into_period(&mut uv, 0.0, period);
            }
            let forward = OrientedEdge::new(image, true);
            let (start, end) = store.oriented_vertices(forward)?;
            let back: Vec<Point2> = uv.iter().rev().copied().collect();
            halves.push(HalfEdge {
                edge: forward,
                start,
                end,
                uv,
                boundary: false,
            });
            halves.push(HalfEdge {
                edge: forward.reversed(),
                start: end,
                end: start,
                uv: back,
                boundary: false,
            });
        }
        Ok(())
    }
}

/// A point strictly inside `face`.
///
/// # Errors
///
/// Returns [`BopError::NoClassification`] for faces too thin to hold one.
pub(super) fn inner_point(store: &TopologyStore, face: FaceId) -> Result<Point3> {
    inner_points(store, face)?
        .into_iter()
        .next()
        .ok_or_else(|| no_inner_point(face).into())
}

fn no_inner_point(face: FaceId) -> BopError {
    BopError::NoClassification(format!("face {face:?} has no inner point"))
}

/// Up to a few points strictly inside `face`, farthest from its boundary first.
fn inner_points(store: &TopologyStore, face: FaceId) -> Result<Vec<Point3>> {
    let loops = FaceLoops::new(store, face)?;
    let surface = &store.face(face)?.surface;
    interior_points(&loops.loops)
        .iter()
        .take(SAMPLE_POINTS)
        .map(|uv| surface.evaluate(uv.x, uv.y))
        .collect()
}

/// Returns `true` if `piece` and `image` run the same way.
fn runs_along(piece: &TrimmedCurve, image: &TrimmedCurve) -> Result<bool> {
    let t = 0.5 * (piece.t_start + piece.t_end);
    let mid = piece.evaluate(t)?;
    let s = closest_point_bounded(image, &mid)?.parameter;
    Ok(piece.curve.tangent(t)?.dot(&image.curve.tangent(s)?) >= 0.0)
}

/// Shifts `uv` by whole periods onto the placed polyline of its edge.
fn align_to(uv: &mut [Point2], placed: &[Point2], fraction: f64, period: f64) {
    let (Some(first), Some(target)) = (uv.first(), polyline_at(placed, fraction)) else {
        return;
    };
    let k = ((target.x - first.x) / period).round();
    if k != 0.0 {
        for p in uv.iter_mut() {
            p.x += k * period;
        }
    }
}

/// Point at `fraction` of the vertex count along a polyline.
#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn polyline_at(points: &[Point2], fraction: f64) -> Option<Point2> {
    match points.len() {
        0 => None,
        1 => Some(points[0]),
        n => {
            let s = fraction.clamp(0.0, 1.0) * (n - 1) as f64;
            let i = (s.floor() as usize).min(n - 2);
            let w = s - i as f64;
            Some(points[i] + (points[i + 1] - points[i]) * w)
        }
    }
}

/// Nodes of the parameter-space graph: a vertex, split by period copy on
/// periodic surfaces.
struct Nodes {
    period: Option<f64>,
    keys: Vec<(VertexId, Point2)>,
}

impl Nodes {
    fn node(&mut self, vertex: VertexId, at: Point2) -> usize {
        let reach = self.period.map(|p| 0.25 * p);
        let found = self
            .keys
            .iter()
            .position(|(v, uv)| *v == vertex && reach.is_none_or(|r| (uv.x - at.x).abs() < r));
        found.unwrap_or_else(|| {
            self.keys.push((vertex, at));
            self.keys.len() - 1
        })
    }
}

fn exit_direction(uv: &[Point2]) -> Vector2 {
    uv.windows(2)
        .map(|w| w[1] - w[0])
        .find(|d| d.norm() > f64::EPSILON)
        .map_or_else(Vector2::zeros, |d| d.normalize())
}

fn entry_direction(uv: &[Point2]) -> Vector2 {
    uv.windows(2)
        .rev()
        .map(|w| w[1] - w[0])
        .find(|d| d.norm() > f64::EPSILON)
        .map_or_else(Vector2::zeros, |d| d.normalize())
}

/// Turn from `back` to `out` towards the face side, in `(0, 2π]`.
///
/// The face lies left of its boundary in `(u, v)` when the face agrees
/// with the surface, right otherwise. Going straight back scores `2π`.
fn turn(back: &Vector2, out: &Vector2, same_sense: bool) -> f64 {
    let cross = back.x * out.y - back.y * out.x;
    let mut ccw = cross.atan2(back.dot(out));
    if ccw < 0.0 {
        ccw += TAU;
    }
    let angle = if same_sense { TAU - ccw } else { ccw };
    if angle <= ANGLE_EPS || angle >= TAU - ANGLE_EPS {
        TAU
    } else {
        angle
    }
}

/// Drops inner edges with a free end, repeatedly.
fn prune_dangling(halves: &[HalfEdge], starts: &[usize], ends: &[usize]) -> Vec<bool> {
    let mut alive = vec![true; halves.len()];
    loop {
        let mut degree: HashMap<usize, usize> = HashMap::new();
        for (i, h) in halves.iter().enumerate() {
            if alive[i] && (h.boundary || h.edge.forward) {
                *degree.entry(starts[i]).or_default() += 1;
                *degree.entry(ends[i]).or_default() += 1;
            }
        }
        let mut changed = false;
        for (i, h) in halves.iter().enumerate() {
            let free = |n: usize| degree.get(&n).copied().unwrap_or(0) <= 1;
            if alive[i] && !h.boundary && (free(starts[i]) || free(ends[i])) {
                alive[i] = false;
                changed = true;
            }
        }
        if !changed {
            return alive;
        }
    }
}

fn trace_loops(halves: &[HalfEdge], period: Option<f64>, same_sense: bool) -> Vec<TracedLoop> {
    let mut nodes = Nodes {
        period,
        keys: Vec::new(),
    };
    let mut starts = Vec::with_capacity(halves.len());
    let mut ends = Vec::with_capacity(halves.len());
    for h in halves {
        let (Some(first), Some(last)) = (h.uv.first(), h.uv.last()) else {
            starts.push(usize::MAX);
            ends.push(usize::MAX);
            continue;
        };
        starts.push(nodes.node(h.start, *first));
        ends.push(nodes.node(h.end, *last));
    }
    let alive = prune_dangling(halves, &starts, &ends);
    let mut outgoing: HashMap<usize, Vec<usize>> = HashMap::new();
    for (i, &n) in starts.iter().enumerate() {
        if alive[i] && n != usize::MAX {
            outgoing.entry(n).or_default().push(i);
        }
    }

    let mut used = vec![false; halves.len()];
    let mut loops = Vec::new();
    for seed in 0..halves.len() {
        if used[seed] || !alive[seed] || starts[seed] == usize::MAX {
            continue;
        }
        used[seed] = true;
        let mut chain = vec![seed];
        let mut current = seed;
        let closed = loop {
            let back = -entry_direction(&halves[current].uv);
            let next = outgoing
                .get(&ends[current])
                .into_iter()
                .flatten()
                .copied()
                .filter(|&c| c == seed || !used[c])
                .map(|c| (turn(&back, &exit_direction(&halves[c].uv), same_sense), c))
                .min_by(|a, b| a.0.total_cmp(&b.0))
                .map(|(_, c)| c);
            match next {
                Some(n) if n == seed => break true,
                Some(n) if chain.len() < halves.len() => {
                    used[n] = true;
                    chain.push(n);
                    current = n;
                }
                _ => break false,
            }
        };
        if closed {
            loops.push(make_loop(halves, chain, same_sense));
        }
    }
    loops
}

fn make_loop(halves: &[HalfEdge], chain: Vec<usize>, same_sense: bool) -> TracedLoop {
    let mut polygon = Vec::new();
    for &h in &chain {
        let uv = &halves[h].uv;
        polygon.extend_from_slice(&uv[..uv.len().saturating_sub(1)]);
    }
    let sign = if same_sense { 1.0 } else { -1.0 };
    let area = sign * signed_area_2d(&polygon);
    TracedLoop {
        halves: chain,
        polygon,
        area,
    }
}

fn on_loop(point: &Point2, polygon: &[Point2]) -> bool {
    let n = polygon.len();
    (0..n).any(|i| distance_to_segment(point, &polygon[i], &polygon[(i + 1) % n]) < ON_LOOP_EPS)
}

/// Pairs every face loop with the holes it directly contains.
fn assign_holes(loops: Vec<TracedLoop>, period: Option<f64>) -> Vec<(TracedLoop, Vec<TracedLoop>)> {
    let (mut outers, holes): (Vec<_>, Vec<_>) = loops
        .into_iter()
        .filter(|l| l.area.abs() > AREA_EPS)
        .partition(|l| l.area > 0.0);
    outers.sort_by(|a, b| a.area.total_cmp(&b.area));
    let mut out: Vec<(TracedLoop, Vec<TracedLoop>)> =
        outers.into_iter().map(|o| (o, Vec::new())).collect();
    let shifts = match period {
        Some(p) => vec![0.0, -p, p],
        None => vec![0.0],
    };
    for hole in holes {
        let Some(sample) = hole.polygon.get(hole.polygon.len() / 2).copied() else {
            continue;
        };
        let owner = out.iter().position(|(outer, _)| {
            shifts.iter().any(|s| {
                let p = Point2::new(sample.x + s, sample.y);
                !on_loop(&p, &outer.polygon) && point_in_polygon_2d(&p, &outer.polygon)
            })
        });
        match owner {
            Some(i) => out[i].1.push(hole),
            None => debug!(area = hole.area, "hole outside every face loop dropped"),
        }
    }
    out
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::math::Point3;
    use crate::operations::boolean::builder::Builder;
    use crate::operations::boolean::filler::PaveFiller;
    use crate::operations::boolean::options::BooleanOptions;
    use crate::operations::creation::{MakeBox, MakeCylinder};
    use crate::operations::query::faces_are_closed;

    #[test]
    fn turn_prefers_the_face_side() {
        let back = Vector2::new(0.0, -1.0);
        let left = Vector2::new(-1.0, 0.0);
        let diagonal = Vector2::new(-1.0, -1.0).normalize();
        assert!(turn(&back, &diagonal, true) < turn(&back, &left, true));
        assert!(turn(&back, &left, false) < turn(&back, &diagonal, false));
        assert!((turn(&back, &back, true) - TAU).abs() < 1e-12);
    }

    #[test]
    fn polyline_lookup() {
        let pts = [Point2::new(0.0, 0.0), Point2::new(2.0, 0.0), Point2::new(2.0, 2.0)];
        assert_eq!(polyline_at(&pts, 0.25), Some(Point2::new(1.0, 0.0)));
        assert_eq!(polyline_at(&pts, 1.0), Some(Point2::new(2.0, 2.0)));
        assert_eq!(polyline_at(&[], 0.5), None);
    }

    #[test]
    fn crossing_boxes_split_three_faces_each() {
        let mut store = TopologyStore::new();
        let a = MakeBox::new(Point3::origin(), Point3::new(1.0, 1.0, 1.0))
            .execute(&mut store)
            .unwrap();
        let b = MakeBox::new(Point3::new(0.5, 0.5, 0.5), Point3::new(1.5, 1.5, 1.5))
            .execute(&mut store)
            .unwrap();
        let mut filler = PaveFiller::new(vec![a.into(), b.into()], BooleanOptions::default());
        filler.perform(&store).unwrap();
        let mut builder = Builder::new(&filler);
        let mut pieces = Vec::new();
        for f in filler.ds().faces_of_rank(0) {
            let split = builder.split_face(&mut store, f).unwrap();
            assert!(split.len() == 1 || split.len() == 2);
            pieces.extend(split.into_iter().map(|s| s.face));
        }
        // Three faces of the first cube are crossed by the second one.
        assert_eq!(pieces.len(), 9);
        for &face in &pieces {
            assert!(inner_point(&store, face).is_ok());
        }
    }

    #[test]
    fn pierced_face_gets_a_hole() {
        let mut store = TopologyStore::new();
        let plate = MakeBox::new(Point3::new(-2.0, -2.0, 0.0), Point3::new(2.0, 2.0, 1.0))
            .execute(&mut store)
            .unwrap();
        let axis = crate::math::Vector3::z();
        let pin = MakeCylinder::new(Point3::new(0.0, 0.0, -1.0), 0.5, axis, 3.0)
            .execute(&mut store)
            .unwrap();
        let mut filler = PaveFiller::new(vec![plate.into(), pin.into()], BooleanOptions::default());
        filler.perform(&store).unwrap();
        let mut builder = Builder::new(&filler);
        let mut with_holes = 0;
        let mut all = Vec::new();
        for f in filler.ds().faces_of_rank(0) {
            for piece in builder.split_face(&mut store, f).unwrap() {
                if !store.face(piece.face).unwrap().inner_wires.is_empty() {
                    with_holes += 1;
                }
                all.push(piece.face);
            }
        }
        // Top and bottom faces each lose a disk.
        assert_eq!(with_holes, 2);
        assert_eq!(all.len(), 8);
        // Split faces with their disks close up again.
        assert!(faces_are_closed(&store, &all).unwrap());
    }

    #[test]
    fn splitting_is_cached() {
        let mut store = TopologyStore::new();
        let a = MakeBox::new(Point3::origin(), Point3::new(1.0, 1.0, 1.0))
            .execute(&mut store)
            .unwrap();
        let b = MakeBox::new(Point3::new(0.5, 0.5, 0.5), Point3::new(1.5, 1.5, 1.5))
            .execute(&mut store)
            .unwrap();
        let mut filler = PaveFiller::new(vec![a.into(), b.into()], BooleanOptions::default());
        filler.perform(&store).unwrap();
        let mut builder = Builder::new(&filler);
        let f = filler.ds().faces_of_rank(1)[0];
        let first: Vec<FaceId> =
            builder.split_face(&mut store, f).unwrap().iter().map(|s| s.face).collect();
        let second: Vec<FaceId> =
            builder.split_face(&mut store, f).unwrap().iter().map(|s| s.face).collect();
        assert_eq!(first, second);
    }
}
