use crate::error::Result;
use crate::math::Point2;
use crate::topology::{FaceId, FaceSurface, Shape, TopologyStore};

use super::face_loops::FaceLoops;

/// Computes the enclosed volume of a solid, shell or compound.
///
/// By the divergence theorem `V = 1/3 * sum of the flux of p . n` over the
/// boundary faces. Each face flux is reduced to a loop integral `∮ Q dv` in
/// parameter space, where `dQ/du = p . (S_u x S_v)` has a closed form for
/// planes, cylinders and spheres. Wires traversed clockwise (flipped faces,
/// holes) contribute with the opposite sign on their own.
///
/// The result is signed: faces oriented outward give a positive volume.
pub struct Volume {
    shape: Shape,
}

impl Volume {
    /// Creates a new `Volume` query.
    #[must_use]
    pub fn new(shape: impl Into<Shape>) -> Self {
        Self {
            shape: shape.into(),
        }
    }

    /// Executes the query, returning the signed volume.
    ///
    /// # Errors
    ///
    /// Returns an error if a referenced entity is missing.
    pub fn execute(&self, store: &TopologyStore) -> Result<f64> {
        signed_volume(store, &store.faces_of(self.shape)?)
    }
}

/// Signed volume bounded by a set of faces.
///
/// # Errors
///
/// Returns an error if a referenced entity is missing.
pub fn signed_volume(store: &TopologyStore, faces: &[FaceId]) -> Result<f64> {
    let mut total = 0.0;
    for &face in faces {
        total += face_flux(store, face)?;
    }
    Ok(total / 3.0)
}

fn face_flux(store: &TopologyStore, face: FaceId) -> Result<f64> {
    let surface = &store.face(face)?.surface;
    let loops = FaceLoops::new(store, face)?;
    let mut flux = 0.0;
    for lp in &loops.loops {
        for (i, a) in lp.iter().enumerate() {
            let b = &lp[(i + 1) % lp.len()];
            let dv = b.y - a.y;
            if dv != 0.0 {
                flux += 0.5 * (potential(surface, a) + potential(surface, b)) * dv;
            }
        }
    }
    Ok(flux)
}

/// Antiderivative in `u` of `p(u, v) . (S_u x S_v)`.
fn potential(surface: &FaceSurface, uv: &Point2) -> f64 {
    let (u, v) = (uv.x, uv.y);
    match surface {
        FaceSurface::Plane(plane) => {
            // Any point of the plane gives the same p . N.
            let on_plane = plane.origin().coords.dot(plane.plane_normal());
            on_plane * u
        }
        FaceSurface::Cylinder(cyl) => {
            let r = cyl.radius();
            let c = cyl.center().coords;
            let a = c.dot(cyl.ref_dir());
            let b = c.dot(&cyl.binormal());
            r * r * u + r * (a * u.sin() - b * u.cos())
        }
        FaceSurface::Sphere(sph) => {
            let r = sph.radius();
            let c = sph.center().coords;
            let a = c.dot(sph.ref_dir());
            let b = c.dot(&sph.binormal());
            let d = c.dot(sph.axis());
            let (sv, cv) = v.sin_cos();
            r * r * r * u * cv
                + r * r * cv * cv * (a * u.sin() - b * u.cos())
                + r * r * d * u * cv * sv
        }
    }
}
