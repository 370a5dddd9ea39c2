//! Merging of coplanar neighbouring faces of a result.

use std::collections::{HashMap, HashSet, VecDeque};

use crate::error::Result;
use crate::geometry::Line;
use crate::math::polygon_2d::signed_area_2d;
use crate::math::{Point2, Vector3};
use crate::operations::query::edge_pcurve;
use crate::topology::{
    EdgeCurve, EdgeData, EdgeId, FaceData, FaceId, FaceSurface, OrientedEdge, TopologyStore,
    VertexId, WireData,
};

/// Tolerance for grouping coplanar faces (plane distance comparison).
const COPLANAR_DISTANCE_TOL: f64 = 1e-6;

/// Tolerance for grouping coplanar faces (normal direction comparison).
const COPLANAR_NORMAL_TOL: f64 = 1e-6;

/// Tolerance for collinearity of neighbouring line edges.
const COLLINEAR_TOL: f64 = 1e-8;

struct PlanarFace {
    face: FaceId,
    /// Outward normal.
    normal: Vector3,
    /// Signed distance from origin to the face plane along the normal.
    plane_dist: f64,
}

/// Replaces each connected group of coplanar faces by one face, then joins
/// collinear line edges meeting at vertices used by no other edge.
///
/// Non-planar faces pass through untouched. Merged faces and edges are new
/// entities; the input faces are left as they are.
///
/// # Errors
///
/// Returns an error if the topology of a face cannot be read.
pub(super) fn unify_faces(store: &mut TopologyStore, faces: Vec<FaceId>) -> Result<Vec<FaceId>> {
    let mut planar = Vec::new();
    let mut out = Vec::new();
    for face in faces {
        match planar_info(store, face)? {
            Some(info) => planar.push(info),
            None => out.push(face),
        }
    }
    for group in group_coplanar(&planar) {
        for component in find_connected_components(store, &group, &planar)? {
            let merged = if component.len() > 1 {
                merge_component(store, &component, &planar)?
            } else {
                None
            };
            match merged {
                Some(face) => out.push(face),
                None => out.extend(component.iter().map(|&i| planar[i].face)),
            }
        }
    }
    merge_collinear_edges(store, &mut out)?;
    Ok(out)
}

fn planar_info(store: &TopologyStore, face: FaceId) -> Result<Option<PlanarFace>> {
    let data = store.face(face)?;
    let FaceSurface::Plane(ref plane) = data.surface else {
        return Ok(None);
    };
    let normal = data.outward_normal(0.0, 0.0)?;
    Ok(Some(PlanarFace {
        face,
        normal,
        plane_dist: plane.origin().coords.dot(&normal),
    }))
}

/// Groups face indices by coplanarity (same normal direction AND same plane distance).
fn group_coplanar(faces: &[PlanarFace]) -> Vec<Vec<usize>> {
    let mut visited = vec![false; faces.len()];
    let mut groups = Vec::new();
    for i in 0..faces.len() {
        if visited[i] {
            continue;
        }
        visited[i] = true;
        let mut group = vec![i];
        for j in (i + 1)..faces.len() {
            if !visited[j] && are_coplanar(&faces[i], &faces[j]) {
                visited[j] = true;
                group.push(j);
            }
        }
        groups.push(group);
    }
    groups
}

fn are_coplanar(a: &PlanarFace, b: &PlanarFace) -> bool {
    (a.normal.dot(&b.normal) - 1.0).abs() <= COPLANAR_NORMAL_TOL
        && (a.plane_dist - b.plane_dist).abs() < COPLANAR_DISTANCE_TOL
}

/// Splits a coplanar group into sets of faces connected through shared edges.
fn find_connected_components(
    store: &TopologyStore,
    group: &[usize],
    faces: &[PlanarFace],
) -> Result<Vec<Vec<usize>>> {
    let mut by_edge: HashMap<EdgeId, Vec<usize>> = HashMap::new();
    let mut edges_of = Vec::with_capacity(group.len());
    for (local, &global) in group.iter().enumerate() {
        let edges = store.face_edges(faces[global].face)?;
        for oe in &edges {
            by_edge.entry(oe.edge).or_default().push(local);
        }
        edges_of.push(edges);
    }

    let mut visited = vec![false; group.len()];
    let mut components = Vec::new();
    for start in 0..group.len() {
        if visited[start] {
            continue;
        }
        visited[start] = true;
        let mut component = vec![group[start]];
        let mut queue = VecDeque::from([start]);
        while let Some(current) = queue.pop_front() {
            for oe in &edges_of[current] {
                // Only edges between exactly two faces of the plane join them.
                let Some(users) = by_edge.get(&oe.edge).filter(|u| u.len() == 2) else {
                    continue;
                };
                for &neighbour in users {
                    if !visited[neighbour] {
                        visited[neighbour] = true;
                        component.push(group[neighbour]);
                        queue.push_back(neighbour);
                    }
                }
            }
        }
        components.push(component);
    }
    Ok(components)
}

/// Merges a connected component of coplanar faces into a single face.
///
/// Returns `None` when the boundary does not chain into closed loops.
fn merge_component(
    store: &mut TopologyStore,
    component: &[usize],
    faces: &[PlanarFace],
) -> Result<Option<FaceId>> {
    let mut uses: HashMap<EdgeId, usize> = HashMap::new();
    let mut all = Vec::new();
    for &i in component {
        for oe in store.face_edges(faces[i].face)? {
            *uses.entry(oe.edge).or_default() += 1;
            all.push(oe);
        }
    }
    let boundary: Vec<OrientedEdge> = all
        .into_iter()
        .filter(|oe| uses.get(&oe.edge).copied() == Some(1))
        .collect();
    if boundary.is_empty() {
        return Ok(None);
    }
    let Some(loops) = chain_into_loops(store, &boundary)? else {
        return Ok(None);
    };

    let first = store.face(faces[component[0]].face)?.clone();
    let (outer, inner) = classify_loops(store, &first.surface, loops)?;
    let outer_wire = store.add_wire(WireData {
        edges: outer,
        is_closed: true,
    });
    let inner_wires = inner
        .into_iter()
        .map(|edges| store.add_wire(WireData { edges, is_closed: true }))
        .collect();
    Ok(Some(store.add_face(FaceData {
        outer_wire,
        inner_wires,
        ..first
    })))
}

/// Chains oriented boundary edges into closed loops through their vertices.
fn chain_into_loops(
    store: &TopologyStore,
    edges: &[OrientedEdge],
) -> Result<Option<Vec<Vec<OrientedEdge>>>> {
    let mut ends = Vec::with_capacity(edges.len());
    let mut start_map: HashMap<VertexId, Vec<usize>> = HashMap::new();
    for (i, &oe) in edges.iter().enumerate() {
        let (start, end) = store.oriented_vertices(oe)?;
        ends.push((start, end));
        start_map.entry(start).or_default().push(i);
    }

    let mut used = vec![false; edges.len()];
    let mut loops = Vec::new();
    for seed in 0..edges.len() {
        if used[seed] {
            continue;
        }
        used[seed] = true;
        let mut chain = vec![edges[seed]];
        let (start, mut current) = ends[seed];
        while current != start {
            let next = start_map
                .get(&current)
                .and_then(|candidates| candidates.iter().copied().find(|&i| !used[i]));
            let Some(i) = next else {
                return Ok(None);
            };
            used[i] = true;
            chain.push(edges[i]);
            current = ends[i].1;
        }
        loops.push(chain);
    }
    Ok(Some(loops))
}

/// Splits loops into the outer boundary (largest area) and holes.
fn classify_loops(
    store: &TopologyStore,
    surface: &FaceSurface,
    mut loops: Vec<Vec<OrientedEdge>>,
) -> Result<(Vec<OrientedEdge>, Vec<Vec<OrientedEdge>>)> {
    let mut max_area = f64::NEG_INFINITY;
    let mut max_idx = 0;
    for (i, edges) in loops.iter().enumerate() {
        let mut polygon: Vec<Point2> = Vec::new();
        for oe in edges {
            let mut uv = edge_pcurve(&store.edge(oe.edge)?.trimmed(), oe.forward, surface)?;
            uv.pop();
            polygon.extend(uv);
        }
        let area = signed_area_2d(&polygon).abs();
        if area > max_area {
            max_area = area;
            max_idx = i;
        }
    }
    let outer = loops.swap_remove(max_idx);
    Ok((outer, loops))
}

fn line_direction(store: &TopologyStore, edge: EdgeId) -> Result<Option<Vector3>> {
    let data = store.edge(edge)?;
    Ok(match &data.curve {
        EdgeCurve::Line(line) if !data.degenerate => Some(*line.direction()),
        _ => None,
    })
}

/// A vertex where exactly two collinear line edges meet.
fn find_collinear_pair(
    store: &TopologyStore,
    faces: &[FaceId],
) -> Result<Option<(VertexId, EdgeId, EdgeId)>> {
    let mut incident: HashMap<VertexId, HashSet<EdgeId>> = HashMap::new();
    for &face in faces {
        for oe in store.face_edges(face)? {
            let edge = store.edge(oe.edge)?;
            incident.entry(edge.start).or_default().insert(oe.edge);
            incident.entry(edge.end).or_default().insert(oe.edge);
        }
    }
    let mut vertices: Vec<&VertexId> = incident.keys().collect();
    vertices.sort_unstable();
    for v in vertices {
        let edges: Vec<EdgeId> = incident[v].iter().copied().collect();
        let [e1, e2] = edges[..] else {
            continue;
        };
        let (Some(d1), Some(d2)) = (line_direction(store, e1)?, line_direction(store, e2)?) else {
            continue;
        };
        if d1.cross(&d2).norm() < COLLINEAR_TOL {
            return Ok(Some((*v, e1, e2)));
        }
    }
    Ok(None)
}

fn far_end(store: &TopologyStore, edge: EdgeId, at: VertexId) -> Result<VertexId> {
    let data = store.edge(edge)?;
    Ok(if data.start == at { data.end } else { data.start })
}

/// The line edge spanning `e1` and `e2` across their shared vertex `v`.
fn joined_edge(store: &mut TopologyStore, v: VertexId, e1: EdgeId, e2: EdgeId) -> Result<EdgeId> {
    let a = far_end(store, e1, v)?;
    let b = far_end(store, e2, v)?;
    let (pa, pb) = (store.vertex(a)?.point, store.vertex(b)?.point);
    let tolerance = store.edge(e1)?.tolerance.max(store.edge(e2)?.tolerance);
    let line = EdgeCurve::Line(Line::through(pa, pb)?);
    let mut data = EdgeData::new(a, b, line, 0.0, (pb - pa).norm());
    data.tolerance = tolerance;
    Ok(store.add_edge(data))
}

/// Replaces the consecutive pair `e1`, `e2` of a wire by `merged`.
fn join_in_wire(
    store: &TopologyStore,
    edges: &[OrientedEdge],
    e1: EdgeId,
    e2: EdgeId,
    merged: EdgeId,
) -> Result<Option<Vec<OrientedEdge>>> {
    let n = edges.len();
    let Some(i) = edges.iter().position(|oe| oe.edge == e1) else {
        return Ok(None);
    };
    let first = if edges[(i + 1) % n].edge == e2 {
        i
    } else if edges[(i + n - 1) % n].edge == e2 {
        (i + n - 1) % n
    } else {
        return Ok(None);
    };
    let (start, _) = store.oriented_vertices(edges[first])?;
    let forward = store.edge(merged)?.start == start;
    let mut joined = vec![OrientedEdge::new(merged, forward)];
    joined.extend((2..n).map(|k| edges[(first + k) % n]));
    Ok(Some(joined))
}

fn replace_pair(
    store: &mut TopologyStore,
    face: FaceId,
    e1: EdgeId,
    e2: EdgeId,
    merged: EdgeId,
) -> Result<Option<FaceId>> {
    let data = store.face(face)?.clone();
    let mut changed = false;
    let mut wires = Vec::new();
    for wire in data.wires() {
        let edges = store.wire(wire)?.edges.clone();
        match join_in_wire(store, &edges, e1, e2, merged)? {
            Some(edges) => {
                changed = true;
                wires.push(store.add_wire(WireData { edges, is_closed: true }));
            }
            None => wires.push(wire),
        }
    }
    if !changed {
        return Ok(None);
    }
    let outer_wire = wires.remove(0);
    Ok(Some(store.add_face(FaceData {
        outer_wire,
        inner_wires: wires,
        ..data
    })))
}

fn merge_collinear_edges(store: &mut TopologyStore, faces: &mut [FaceId]) -> Result<()> {
    while let Some((v, e1, e2)) = find_collinear_pair(store, faces)? {
        let merged = joined_edge(store, v, e1, e2)?;
        for face in faces.iter_mut() {
            if let Some(replaced) = replace_pair(store, *face, e1, e2, merged)? {
                *face = replaced;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::geometry::surface::Plane;
    use crate::math::Point3;
    use crate::operations::creation::MakeBox;
    use crate::topology::VertexData;

    #[test]
    fn coplanar_grouping_ignores_opposite_normals() {
        let up = PlanarFace {
            face: FaceId::default(),
            normal: Vector3::z(),
            plane_dist: 1.0,
        };
        let down = PlanarFace {
            face: FaceId::default(),
            normal: -Vector3::z(),
            plane_dist: -1.0,
        };
        let other = PlanarFace {
            face: FaceId::default(),
            normal: Vector3::z(),
            plane_dist: 1.0 + 1e-9,
        };
        let groups = group_coplanar(&[up, down, other]);
        assert_eq!(groups, vec![vec![0, 2], vec![1]]);
    }

    #[test]
    fn merged_box_faces_survive_as_is() {
        let mut store = TopologyStore::new();
        let solid = MakeBox::new(Point3::origin(), Point3::new(1.0, 1.0, 1.0))
            .execute(&mut store)
            .unwrap();
        let faces = store.faces_of(solid.into()).unwrap();
        let unified = unify_faces(&mut store, faces.clone()).unwrap();
        assert_eq!(unified.len(), 6);
        let mut before = faces;
        let mut after = unified;
        before.sort_unstable();
        after.sort_unstable();
        assert_eq!(before, after);
    }

    fn square_pair(store: &mut TopologyStore) -> Vec<FaceId> {
        let points = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(2.0, 0.0, 0.0),
            Point3::new(2.0, 1.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ];
        let v: Vec<VertexId> =
            points.iter().map(|&p| store.add_vertex(VertexData::new(p))).collect();
        let edge = |store: &mut TopologyStore, a: usize, b: usize| {
            let (pa, pb) = (points[a], points[b]);
            let line = Line::through(pa, pb).unwrap();
            store.add_edge(EdgeData::new(v[a], v[b], EdgeCurve::Line(line), 0.0, (pb - pa).norm()))
        };
        let bottom_left = edge(store, 0, 1);
        let bottom_right = edge(store, 1, 2);
        let right = edge(store, 2, 3);
        let top_right = edge(store, 3, 4);
        let top_left = edge(store, 4, 5);
        let left = edge(store, 5, 0);
        let middle = edge(store, 1, 4);
        let plane = FaceSurface::Plane(Plane::from_normal(Point3::origin(), Vector3::z()).unwrap());
        let face = |store: &mut TopologyStore, edges: Vec<OrientedEdge>| {
            let wire = store.add_wire(WireData { edges, is_closed: true });
            store.add_face(FaceData::new(plane.clone(), wire, vec![], true))
        };
        let f = OrientedEdge::new;
        vec![
            face(
                store,
                vec![f(bottom_left, true), f(middle, true), f(top_left, true), f(left, true)],
            ),
            face(
                store,
                vec![f(bottom_right, true), f(right, true), f(top_right, true), f(middle, false)],
            ),
        ]
    }

    #[test]
    fn neighbouring_squares_become_one_rectangle() {
        let mut store = TopologyStore::new();
        let faces = square_pair(&mut store);
        let unified = unify_faces(&mut store, faces).unwrap();
        assert_eq!(unified.len(), 1);
        let edges = store.face_edges(unified[0]).unwrap();
        assert_eq!(edges.len(), 4);
        let total: f64 =
            edges.iter().map(|oe| store.edge(oe.edge).unwrap().trimmed().length()).sum();
        assert!((total - 6.0).abs() < 1e-12);
        let mut polygon = Vec::new();
        for oe in &edges {
            let (start, _) = store.oriented_vertices(*oe).unwrap();
            let p = store.vertex(start).unwrap().point;
            polygon.push(Point2::new(p.x, p.y));
        }
        assert!((signed_area_2d(&polygon) - 2.0).abs() < 1e-12);
    }
}
