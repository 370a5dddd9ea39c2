pub mod intersect_3d;
pub mod polygon_2d;

/// 2D point type.
pub type Point2 = nalgebra::Point2<f64>;

/// 3D point type.
pub type Point3 = nalgebra::Point3<f64>;

/// 2D vector type.
pub type Vector2 = nalgebra::Vector2<f64>;

/// 3D vector type.
pub type Vector3 = nalgebra::Vector3<f64>;

/// Global geometric tolerance for floating-point comparisons.
pub const TOLERANCE: f64 = 1e-10;

/// Default tolerance of new vertices, edges and faces.
pub const PRECISION_CONFUSION: f64 = 1e-7;

/// Angular tolerance used for parallelism tests.
pub const PRECISION_ANGULAR: f64 = 1e-12;

/// Finds a unit vector perpendicular to `dir`.
#[must_use]
pub fn perpendicular(dir: &Vector3) -> Vector3 {
    let candidate = if dir.x.abs() < 0.9 {
        Vector3::x()
    } else {
        Vector3::y()
    };
    dir.cross(&candidate).normalize()
}

/// Returns the real roots of `a*t^2 + b*t + c = 0` in ascending order.
///
/// Degenerates to the linear case when `a` vanishes. A double root is
/// returned once.
#[must_use]
pub fn solve_quadratic(a: f64, b: f64, c: f64) -> Vec<f64> {
    if a.abs() < TOLERANCE {
        if b.abs() < TOLERANCE {
            return Vec::new();
        }
        return vec![-c / b];
    }
    let disc = b * b - 4.0 * a * c;
    let scale = (b * b).max((4.0 * a * c).abs()).max(1.0);
    if disc < -TOLERANCE * scale {
        return Vec::new();
    }
    if disc.abs() <= TOLERANCE * scale {
        return vec![-b / (2.0 * a)];
    }
    let sq = disc.sqrt();
    // Numerically stable form avoids cancellation for the small root.
    let q = -0.5 * (b + b.signum() * sq);
    let mut roots = if q.abs() < TOLERANCE {
        vec![(-b - sq) / (2.0 * a), (-b + sq) / (2.0 * a)]
    } else {
        vec![q / a, c / q]
    };
    roots.sort_by(f64::total_cmp);
    roots
}
