use glam::{EulerRot, Quat, Vec2, Vec3, Vec4};
use kurbo::{CubicBez, ParamCurve, ParamCurveArclen, Point};

const ARCLEN_ACCURACY: f64 = 1e-3;

/// Values a keyframe segment can blend between.
pub trait Interpolatable: Sized + Clone + PartialEq {
    fn lerp(&self, other: &Self, t: f32) -> Self;

    /// Blend with an individual rate per component. `rates` is never empty;
    /// components beyond its length use the first rate.
    fn lerp_components(&self, other: &Self, rates: &[f32]) -> Self {
        self.lerp(other, rates[0])
    }

    /// The xy projection used to build spatial curves, if this type has one.
    fn planar(&self) -> Option<Vec2> {
        None
    }

    /// Value at `point` on a spatial curve; components off the plane blend by `t`.
    fn along_curve(&self, other: &Self, _point: Vec2, t: f32) -> Self {
        self.lerp(other, t)
    }
}

fn mix(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

fn rate_at(rates: &[f32], index: usize) -> f32 {
    rates.get(index).copied().unwrap_or(rates[0])
}

impl Interpolatable for f32 {
    fn lerp(&self, other: &Self, t: f32) -> Self {
        self + (other - self) * t
    }
}

impl Interpolatable for Vec2 {
    fn lerp(&self, other: &Self, t: f32) -> Self {
        Vec2::lerp(*self, *other, t)
    }

    fn lerp_components(&self, other: &Self, rates: &[f32]) -> Self {
        Vec2::new(
            mix(self.x, other.x, rate_at(rates, 0)),
            mix(self.y, other.y, rate_at(rates, 1)),
        )
    }

    fn planar(&self) -> Option<Vec2> {
        Some(*self)
    }

    fn along_curve(&self, _other: &Self, point: Vec2, _t: f32) -> Self {
        point
    }
}

impl Interpolatable for Vec3 {
    fn lerp(&self, other: &Self, t: f32) -> Self {
        Vec3::lerp(*self, *other, t)
    }

    fn lerp_components(&self, other: &Self, rates: &[f32]) -> Self {
        Vec3::new(
            mix(self.x, other.x, rate_at(rates, 0)),
            mix(self.y, other.y, rate_at(rates, 1)),
            mix(self.z, other.z, rate_at(rates, 2)),
        )
    }

    fn planar(&self) -> Option<Vec2> {
        Some(self.truncate())
    }

    fn along_curve(&self, other: &Self, point: Vec2, t: f32) -> Self {
        point.extend(mix(self.z, other.z, t))
    }
}

impl Interpolatable for Vec4 {
    fn lerp(&self, other: &Self, t: f32) -> Self {
        Vec4::lerp(*self, *other, t)
    }

    fn lerp_components(&self, other: &Self, rates: &[f32]) -> Self {
        Vec4::new(
            mix(self.x, other.x, rate_at(rates, 0)),
            mix(self.y, other.y, rate_at(rates, 1)),
            mix(self.z, other.z, rate_at(rates, 2)),
            mix(self.w, other.w, rate_at(rates, 3)),
        )
    }
}

// Gradient color arrays. Extra entries on either side keep the start value.
impl Interpolatable for Vec<f32> {
    fn lerp(&self, other: &Self, t: f32) -> Self {
        self.iter()
            .enumerate()
            .map(|(i, a)| match other.get(i) {
                Some(b) => a + (b - a) * t,
                None => *a,
            })
            .collect()
    }

    fn lerp_components(&self, other: &Self, rates: &[f32]) -> Self {
        self.iter()
            .enumerate()
            .map(|(i, a)| match other.get(i) {
                Some(b) => a + (b - a) * rate_at(rates, i),
                None => *a,
            })
            .collect()
    }
}

/// Euler angles in degrees (x, y, z) that interpolate through quaternions.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct EulerRotation(pub Vec3);

impl EulerRotation {
    pub fn to_quat(self) -> Quat {
        let r = self.0 * (std::f32::consts::PI / 180.0);
        Quat::from_euler(EulerRot::YXZ, r.y, r.x, r.z)
    }

    pub fn from_quat(q: Quat) -> Self {
        let (y, x, z) = q.to_euler(EulerRot::YXZ);
        EulerRotation(Vec3::new(x, y, z) * (180.0 / std::f32::consts::PI))
    }
}

impl Interpolatable for EulerRotation {
    fn lerp(&self, other: &Self, t: f32) -> Self {
        if t <= 0.0 {
            return *self;
        }
        if t >= 1.0 {
            return *other;
        }
        let q = self.to_quat().slerp(other.to_quat(), t);
        EulerRotation::from_quat(q)
    }
}

/// A spatial bezier between two keyframe positions, parameterized by arc length
/// so equal progress covers equal distance along the authored path.
#[derive(Debug, Clone)]
pub struct SpatialCurve {
    curve: CubicBez,
    length: f64,
}

impl SpatialCurve {
    /// Returns `None` when the tangents do not bend the path; such segments
    /// interpolate on a straight line.
    pub fn new(start: Vec2, end: Vec2, out_tangent: Vec2, in_tangent: Vec2) -> Option<Self> {
        let c1 = start + out_tangent;
        let c2 = end + in_tangent;

        if start == end && out_tangent == Vec2::ZERO && in_tangent == Vec2::ZERO {
            return None;
        }
        if start != end && on_line(start, end, c1) && on_line(start, end, c2) {
            return None;
        }

        let curve = CubicBez::new(to_point(start), to_point(c1), to_point(c2), to_point(end));
        let length = curve.arclen(ARCLEN_ACCURACY);
        if !length.is_finite() || length <= f64::EPSILON {
            return None;
        }
        Some(Self { curve, length })
    }

    pub fn length(&self) -> f32 {
        self.length as f32
    }

    /// Point at fraction `progress` of the curve's length.
    pub fn point_at(&self, progress: f32) -> Vec2 {
        let progress = progress as f64;
        let t = if progress <= 0.0 {
            0.0
        } else if progress >= 1.0 {
            1.0
        } else {
            self.curve.inv_arclen(progress * self.length, ARCLEN_ACCURACY)
        };
        let p = self.curve.eval(t);
        Vec2::new(p.x as f32, p.y as f32)
    }

    /// Tangent angle in degrees at `progress`.
    pub fn angle_at(&self, progress: f32) -> f32 {
        let a = self.point_at((progress - 0.01).max(0.0));
        let b = self.point_at((progress + 0.01).min(1.0));
        let d = b - a;
        d.y.atan2(d.x).to_degrees()
    }
}

fn to_point(v: Vec2) -> Point {
    Point::new(v.x as f64, v.y as f64)
}

fn on_line(a: Vec2, b: Vec2, p: Vec2) -> bool {
    let det = a.x * b.y + a.y * p.x + b.x * p.y - p.x * b.y - p.y * a.x - b.x * a.y;
    det.abs() < 0.001
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn per_component_rates_fall_back_to_first() {
        let a = Vec3::ZERO;
        let b = Vec3::new(10.0, 10.0, 10.0);
        let v = a.lerp_components(&b, &[0.5, 0.1]);
        assert_eq!(v, Vec3::new(5.0, 1.0, 5.0));
    }

    #[test]
    fn gradient_arrays_of_different_length_keep_extras() {
        let a = vec![0.0, 1.0, 2.0];
        let b = vec![2.0];
        assert_eq!(a.lerp(&b, 0.5), vec![1.0, 1.0, 2.0]);
    }

    #[test]
    fn single_axis_rotation_slerps_like_linear() {
        let a = EulerRotation(Vec3::ZERO);
        let b = EulerRotation(Vec3::new(0.0, 0.0, 90.0));
        let mid = a.lerp(&b, 0.5);
        assert!((mid.0.z - 45.0).abs() < 1e-3, "got {:?}", mid);
        assert!(mid.0.x.abs() < 1e-3 && mid.0.y.abs() < 1e-3);
    }

    #[test]
    fn multi_axis_rotation_follows_the_quaternion_arc() {
        let a = EulerRotation(Vec3::new(30.0, 0.0, 0.0));
        let b = EulerRotation(Vec3::new(0.0, 60.0, 45.0));
        let mid = a.lerp(&b, 0.5).to_quat();

        let r = std::f32::consts::PI / 180.0;
        let qa = Quat::from_euler(EulerRot::YXZ, 0.0, 30.0 * r, 0.0);
        let qb = Quat::from_euler(EulerRot::YXZ, 60.0 * r, 0.0, 45.0 * r);
        let expected = qa.slerp(qb, 0.5);
        // q and -q are the same rotation
        assert!(mid.dot(expected).abs() > 1.0 - 1e-5, "got {mid:?}, want {expected:?}");

        // per-axis lerp lands on a different orientation
        let naive = Quat::from_euler(EulerRot::YXZ, 30.0 * r, 15.0 * r, 22.5 * r);
        assert!(mid.dot(naive).abs() < 0.999);
    }

    #[test]
    fn collinear_tangents_are_straight() {
        let curve = SpatialCurve::new(
            Vec2::ZERO,
            Vec2::new(100.0, 0.0),
            Vec2::new(30.0, 0.0),
            Vec2::new(-30.0, 0.0),
        );
        assert!(curve.is_none());
    }

    #[test]
    fn spatial_curve_follows_arc_length() {
        let curve = SpatialCurve::new(
            Vec2::ZERO,
            Vec2::new(100.0, 0.0),
            Vec2::new(0.0, -50.0),
            Vec2::new(0.0, -50.0),
        )
        .expect("curved segment");
        assert!(curve.length() > 100.0);
        let mid = curve.point_at(0.5);
        // symmetric arch: halfway along its length is the apex
        assert!((mid.x - 50.0).abs() < 0.5, "got {:?}", mid);
        assert!(mid.y < -30.0);
        assert_eq!(curve.point_at(0.0), Vec2::ZERO);
        assert_eq!(curve.point_at(1.0), Vec2::new(100.0, 0.0));
    }
}
