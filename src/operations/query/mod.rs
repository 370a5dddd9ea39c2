mod bounding_box;
mod closest_point;
mod face_loops;
mod is_valid;
mod length;
mod volume;

pub use bounding_box::{curve_box, face_box, Aabb, BoundingBox};
pub use closest_point::{closest_point_bounded, ClosestPointOnCurve, ClosestPointResult};
pub use face_loops::{
    degenerate_pcurve, edge_pcurve, place_seam, placed_wires, FaceLoops, PlacedEdge,
};
pub use is_valid::{faces_are_closed, IsValid};
pub use length::Length;
pub use volume::{signed_volume, Volume};
