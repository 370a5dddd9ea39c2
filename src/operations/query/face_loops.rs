//! Boundary loops of a face in its surface parameter space.
//!
//! Wires run counter-clockwise around the outward normal, so on a face whose
//! normal agrees with the surface (`same_sense`) the outer loop is
//! counter-clockwise in `(u, v)`. On periodic surfaces every loop is laid out
//! in the window `[0, period]`:
//!
//! - an edge used twice by the face is a seam; its occurrence that climbs in
//!   `v` sits at `u = period` on a `same_sense` face and at `u = 0` otherwise;
//! - a degenerate pole edge spans the whole window, `+u` at the south pole
//!   and `-u` at the north pole on a `same_sense` face;
//! - every other edge continues from the end of its predecessor.

use std::collections::HashMap;
use std::f64::consts::TAU;

use crate::error::Result;
use crate::geometry::pcurve::{project_polyline, shift_into_period, shift_towards};
use crate::geometry::Surface;
use crate::math::polygon_2d::point_in_loops;
use crate::math::{Point2, Point3};
use crate::topology::{
    EdgeId, FaceData, FaceId, FaceSurface, OrientedEdge, TopologyStore, TrimmedCurve, WireId,
};

use super::closest_point::closest_point_bounded;

/// An oriented edge together with its placed parameter-space polyline.
#[derive(Debug, Clone)]
pub struct PlacedEdge {
    /// The edge and its direction in the wire.
    pub oriented: OrientedEdge,
    /// The polyline in traversal order.
    pub uv: Vec<Point2>,
    /// Whether the edge collapses to a point.
    pub degenerate: bool,
}

/// The parameter-space loops of one face plus its 3D boundary curves.
#[derive(Debug, Clone)]
pub struct FaceLoops {
    /// One closed polyline per wire, outer wire first.
    pub loops: Vec<Vec<Point2>>,
    /// Non-degenerate boundary curves.
    pub edges: Vec<TrimmedCurve>,
    /// Period of the surface in `u`.
    pub period: Option<f64>,
}

impl FaceLoops {
    /// Builds the loops of a face.
    ///
    /// # Errors
    ///
    /// Returns an error if a referenced entity is missing or a curve fails to evaluate.
    pub fn new(store: &TopologyStore, face: FaceId) -> Result<Self> {
        let data = store.face(face)?;
        let mut loops = Vec::new();
        let mut edges = Vec::new();
        for placed_wire in placed_wires(store, face)? {
            let mut pts: Vec<Point2> = Vec::new();
            for placed in placed_wire {
                if !placed.degenerate {
                    edges.push(store.edge(placed.oriented.edge)?.trimmed());
                }
                let skip = usize::from(!pts.is_empty());
                pts.extend(placed.uv.into_iter().skip(skip));
            }
            if pts.len() > 1 && (pts[0] - pts[pts.len() - 1]).norm() < 1e-9 {
                pts.pop();
            }
            if pts.len() >= 3 {
                loops.push(pts);
            }
        }
        Ok(Self {
            loops,
            edges,
            period: data.surface.u_period(),
        })
    }

    /// Returns `true` if `uv` lies inside the loops (even-odd rule).
    ///
    /// On periodic surfaces the neighbouring periods are tried too.
    #[must_use]
    pub fn contains_uv(&self, uv: &Point2) -> bool {
        match self.period {
            None => point_in_loops(uv, &self.loops),
            Some(period) => [0.0, -period, period]
                .iter()
                .any(|shift| point_in_loops(&Point2::new(uv.x + shift, uv.y), &self.loops)),
        }
    }

    /// Distance from `point` to the nearest boundary curve.
    ///
    /// # Errors
    ///
    /// Returns an error if a boundary curve fails to evaluate.
    pub fn boundary_distance(&self, point: &Point3) -> Result<f64> {
        let mut best = f64::INFINITY;
        for edge in &self.edges {
            best = best.min(closest_point_bounded(edge, point)?.distance);
        }
        Ok(best)
    }
}

/// Lays out every wire of `face` in parameter space.
///
/// # Errors
///
/// Returns an error if a referenced entity is missing or a curve fails to evaluate.
pub fn placed_wires(store: &TopologyStore, face: FaceId) -> Result<Vec<Vec<PlacedEdge>>> {
    let data = store.face(face)?;
    let mut uses: HashMap<EdgeId, usize> = HashMap::new();
    for oe in store.face_edges(face)? {
        *uses.entry(oe.edge).or_default() += 1;
    }
    let wires: Vec<WireId> = data.wires().collect();
    wires
        .into_iter()
        .map(|w| place_wire(store, data, &store.wire(w)?.edges, &uses))
        .collect()
}

/// Raw polyline of a bounded curve on a surface, in traversal order.
///
/// # Errors
///
/// Returns an error if the curve fails to evaluate.
pub fn edge_pcurve(
    curve: &TrimmedCurve,
    forward: bool,
    surface: &FaceSurface,
) -> Result<Vec<Point2>> {
    let segments = curve.curve.polyline_segments(curve.t_start, curve.t_end);
    let mut uv = project_polyline(&curve.curve, curve.t_start, curve.t_end, segments, surface)?;
    if !forward {
        uv.reverse();
    }
    Ok(uv)
}

/// Polyline of a pole edge traversed inside a face.
#[must_use]
pub fn degenerate_pcurve(pole_v: f64, period: f64, same_sense: bool) -> Vec<Point2> {
    let increasing = (pole_v < 0.0) == same_sense;
    if increasing {
        vec![Point2::new(0.0, pole_v), Point2::new(period, pole_v)]
    } else {
        vec![Point2::new(period, pole_v), Point2::new(0.0, pole_v)]
    }
}

/// Places a seam occurrence at the window side given by its direction.
pub fn place_seam(uv: &mut [Point2], period: f64, same_sense: bool) {
    let climbs = match (uv.first(), uv.last()) {
        (Some(a), Some(b)) => b.y > a.y,
        _ => return,
    };
    let target = if climbs == same_sense { period } else { 0.0 };
    shift_towards(uv, target, period);
}

#[derive(Clone, Copy, PartialEq)]
enum Role {
    Regular,
    Seam,
    Pole,
}

fn place_wire(
    store: &TopologyStore,
    face: &FaceData,
    wire: &[OrientedEdge],
    uses: &HashMap<EdgeId, usize>,
) -> Result<Vec<PlacedEdge>> {
    let surface = &face.surface;
    let period = surface.u_period();
    let mut placed = Vec::with_capacity(wire.len());
    let mut roles = Vec::with_capacity(wire.len());
    for &oe in wire {
        let edge = store.edge(oe.edge)?;
        if edge.degenerate {
            let pole_v = surface.inverse(&store.vertex(edge.start)?.point).1;
            let uv = degenerate_pcurve(pole_v, period.unwrap_or(TAU), face.same_sense);
            placed.push(PlacedEdge {
                oriented: oe,
                uv,
                degenerate: true,
            });
            roles.push(Role::Pole);
            continue;
        }
        let mut uv = edge_pcurve(&edge.trimmed(), oe.forward, surface)?;
        let role = match period {
            Some(p) if uses.get(&oe.edge).copied().unwrap_or(0) >= 2 => {
                place_seam(&mut uv, p, face.same_sense);
                Role::Seam
            }
            _ => Role::Regular,
        };
        placed.push(PlacedEdge {
            oriented: oe,
            uv,
            degenerate: false,
        });
        roles.push(role);
    }

    let Some(period) = period else {
        return Ok(placed);
    };
    let Some(start) = roles.iter().position(|r| *r == Role::Regular) else {
        return Ok(placed);
    };

    let n = placed.len();
    let mut prev_end: Option<f64> = None;
    for step in 0..n {
        let i = (start + step) % n;
        match roles[i] {
            Role::Pole => prev_end = None,
            Role::Seam => prev_end = placed[i].uv.last().map(|p| p.x),
            Role::Regular => {
                let uv = &mut placed[i].uv;
                match (prev_end, uv.first().map(|p| p.x)) {
                    (Some(end), Some(first)) => {
                        let k = ((end - first) / period).round();
                        for p in uv.iter_mut() {
                            p.x += k * period;
                        }
                    }
                    _ => shift_into_period(uv, 0.0, period),
                }
                prev_end = uv.last().map(|p| p.x);
            }
        }
    }

    if !roles.contains(&Role::Seam) {
        let (sum, count) = placed
            .iter()
            .filter(|p| !p.degenerate)
            .flat_map(|p| p.uv.iter())
            .fold((0.0, 0usize), |(s, c), p| (s + p.x, c + 1));
        if count > 0 {
            #[allow(clippy::cast_precision_loss)]
            let mean = sum / count as f64;
            let k = (mean / period).floor();
            if k != 0.0 {
                for p in placed.iter_mut().flat_map(|p| p.uv.iter_mut()) {
                    p.x -= k * period;
                }
            }
        }
    }
    Ok(placed)
}
