use std::f64::consts::TAU;

use crate::error::{GeometryError, Result};
use crate::geometry::curve::{Circle, Line};
use crate::geometry::surface::{Cylinder, Plane, Sphere};
use crate::math::intersect_3d::{plane_plane_intersect, PlanePairRelation};
use crate::math::{perpendicular, Point3, Vector3, PRECISION_ANGULAR};
use crate::operations::query::{curve_box, Aabb};
use crate::topology::{EdgeCurve, FaceSurface, TrimmedCurve};

use super::SurfaceSurfaceResult;

pub(super) fn intersect(
    s1: &FaceSurface,
    s2: &FaceSurface,
    region: &Aabb,
    tol: f64,
) -> Result<SurfaceSurfaceResult> {
    let region = region.enlarged(tol);
    let mut out = SurfaceSurfaceResult::default();
    let found = match (s1, s2) {
        (FaceSurface::Plane(a), FaceSurface::Plane(b)) => plane_plane(a, b, tol),
        (FaceSurface::Plane(p), FaceSurface::Cylinder(c))
        | (FaceSurface::Cylinder(c), FaceSurface::Plane(p)) => {
            plane_cylinder(p, c, tol)?
        }
        (FaceSurface::Plane(p), FaceSurface::Sphere(s))
        | (FaceSurface::Sphere(s), FaceSurface::Plane(p)) => {
            plane_sphere(p, s, tol)?
        }
        (FaceSurface::Cylinder(a), FaceSurface::Cylinder(b)) => cylinder_cylinder(a, b, tol)?,
        (FaceSurface::Cylinder(c), FaceSurface::Sphere(s))
        | (FaceSurface::Sphere(s), FaceSurface::Cylinder(c)) => {
            cylinder_sphere(c, s, tol)?
        }
        (FaceSurface::Sphere(a), FaceSurface::Sphere(b)) => sphere_sphere(a, b, tol)?,
    };
    match found {
        Found::Coincident => out.coincident = true,
        Found::Parts(parts) => {
            for part in parts {
                match part {
                    Part::Line(origin, dir) => {
                        let Some((t0, t1)) = region.clip_line(&origin, &dir) else {
                            continue;
                        };
                        if t1 - t0 > tol {
                            let line = Line::new(origin, dir)?;
                            out.curves.push(TrimmedCurve::new(EdgeCurve::Line(line), t0, t1));
                        }
                    }
                    Part::Circle(circle) => {
                        let full = TrimmedCurve::new(EdgeCurve::Circle(circle), 0.0, TAU);
                        if curve_box(&full)?.overlaps(&region) {
                            out.curves.push(full);
                        }
                    }
                    Part::Point(p) => {
                        if region.contains_point(&p) {
                            out.points.push(p);
                        }
                    }
                }
            }
        }
    }
    Ok(out)
}

enum Part {
    Line(Point3, Vector3),
    Circle(Circle),
    Point(Point3),
}

enum Found {
    Coincident,
    Parts(Vec<Part>),
}

fn parallel(a: &Vector3, b: &Vector3) -> bool {
    a.cross(b).norm() < PRECISION_ANGULAR.sqrt()
}

fn unsupported(what: &str) -> GeometryError {
    GeometryError::Unsupported(what.into())
}

fn plane_plane(a: &Plane, b: &Plane, tol: f64) -> Found {
    match plane_plane_intersect(a, b, tol) {
        PlanePairRelation::Coincident => Found::Coincident,
        PlanePairRelation::Parallel { .. } => Found::Parts(Vec::new()),
        PlanePairRelation::IntersectionLine { origin, direction } => {
            Found::Parts(vec![Part::Line(origin, direction)])
        }
    }
}

fn plane_cylinder(plane: &Plane, cyl: &Cylinder, tol: f64) -> Result<Found> {
    let n = plane.plane_normal();
    let axis = cyl.axis();
    let r = cyl.radius();
    if parallel(n, axis) {
        let s = (plane.origin() - cyl.center()).dot(n) / axis.dot(n);
        let center = cyl.center() + axis * s;
        let circle = Circle::new(center, r, *axis, *cyl.ref_dir())?;
        return Ok(Found::Parts(vec![Part::Circle(circle)]));
    }
    if n.dot(axis).abs() > PRECISION_ANGULAR.sqrt() {
        return Err(unsupported("oblique plane/cylinder section").into());
    }
    let d = (cyl.center() - plane.origin()).dot(n);
    if d.abs() > r + tol {
        return Ok(Found::Parts(Vec::new()));
    }
    let foot = cyl.center() - n * d;
    let across = n.cross(axis);
    let h = (r * r - d * d).max(0.0).sqrt();
    if h <= tol {
        return Ok(Found::Parts(vec![Part::Line(foot, *axis)]));
    }
    Ok(Found::Parts(vec![
        Part::Line(foot + across * h, *axis),
        Part::Line(foot - across * h, *axis),
    ]))
}

fn plane_sphere(plane: &Plane, sphere: &Sphere, tol: f64) -> Result<Found> {
    let n = plane.plane_normal();
    let big_r = sphere.radius();
    let d = (sphere.center() - plane.origin()).dot(n);
    if d.abs() > big_r + tol {
        return Ok(Found::Parts(Vec::new()));
    }
    let center = sphere.center() - n * d;
    let rho = (big_r * big_r - d * d).max(0.0).sqrt();
    if rho <= tol {
        return Ok(Found::Parts(vec![Part::Point(center)]));
    }
    let circle = if parallel(n, sphere.axis()) {
        Circle::new(center, rho, *sphere.axis(), *sphere.ref_dir())?
    } else {
        Circle::new(center, rho, *n, perpendicular(n))?
    };
    Ok(Found::Parts(vec![Part::Circle(circle)]))
}

fn cylinder_cylinder(a: &Cylinder, b: &Cylinder, tol: f64) -> Result<Found> {
    if !parallel(a.axis(), b.axis()) {
        return Err(unsupported("cylinders with crossing axes").into());
    }
    let axis = a.axis();
    let w = b.center() - a.center();
    let delta = w - axis * w.dot(axis);
    let d = delta.norm();
    let (r1, r2) = (a.radius(), b.radius());
    if d <= tol {
        return Ok(if (r1 - r2).abs() <= tol {
            Found::Coincident
        } else {
            Found::Parts(Vec::new())
        });
    }
    if d > r1 + r2 + tol || d < (r1 - r2).abs() - tol {
        return Ok(Found::Parts(Vec::new()));
    }
    let e = delta / d;
    let along = (d * d + r1 * r1 - r2 * r2) / (2.0 * d);
    let h = (r1 * r1 - along * along).max(0.0).sqrt();
    let base = a.center() + e * along;
    if h <= tol {
        return Ok(Found::Parts(vec![Part::Line(base, *axis)]));
    }
    let across = axis.cross(&e);
    Ok(Found::Parts(vec![
        Part::Line(base + across * h, *axis),
        Part::Line(base - across * h, *axis),
    ]))
}

fn cylinder_sphere(cyl: &Cylinder, sphere: &Sphere, tol: f64) -> Result<Found> {
    if cyl.axis_distance(sphere.center()) > tol {
        return Err(unsupported("sphere off the cylinder axis").into());
    }
    let axis = cyl.axis();
    let (r, big_r) = (cyl.radius(), sphere.radius());
    let s0 = (sphere.center() - cyl.center()).dot(axis);
    if big_r < r - tol {
        return Ok(Found::Parts(Vec::new()));
    }
    let h = (big_r * big_r - r * r).max(0.0).sqrt();
    let heights: Vec<f64> = if h <= tol { vec![s0] } else { vec![s0 - h, s0 + h] };
    let mut parts = Vec::new();
    for s in heights {
        let circle = Circle::new(cyl.center() + axis * s, r, *axis, *cyl.ref_dir())?;
        parts.push(Part::Circle(circle));
    }
    Ok(Found::Parts(parts))
}

fn sphere_sphere(a: &Sphere, b: &Sphere, tol: f64) -> Result<Found> {
    let delta = b.center() - a.center();
    let d = delta.norm();
    let (r1, r2) = (a.radius(), b.radius());
    if d <= tol {
        return Ok(if (r1 - r2).abs() <= tol {
            Found::Coincident
        } else {
            Found::Parts(Vec::new())
        });
    }
    if d > r1 + r2 + tol || d < (r1 - r2).abs() - tol {
        return Ok(Found::Parts(Vec::new()));
    }
    let e = delta / d;
    let along = (d * d + r1 * r1 - r2 * r2) / (2.0 * d);
    let h = (r1 * r1 - along * along).max(0.0).sqrt();
    let center = a.center() + e * along;
    if h <= tol {
        return Ok(Found::Parts(vec![Part::Point(center)]));
    }
    let circle = if parallel(&e, a.axis()) {
        Circle::new(center, h, *a.axis(), *a.ref_dir())?
    } else {
        Circle::new(center, h, e, perpendicular(&e))?
    };
    Ok(Found::Parts(vec![Part::Circle(circle)]))
}
