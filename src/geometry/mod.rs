pub mod curve;
pub mod pcurve;
pub mod surface;

pub use curve::{Circle, Curve, CurveDomain, Line};
pub use surface::{Cylinder, Plane, Sphere, Surface, SurfaceDomain};
