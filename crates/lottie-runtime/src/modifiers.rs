use crate::container::{tick_all, DynamicProperty};
use crate::easing::EasingRegistry;
use crate::geometry::{ShapePath, ROUND_CORNER};
use crate::property::AnimatedProperty;
use crate::renderer::{Trim, TrimMode};
use glam::{Mat3, Vec2};
use lottie_data::model as data;
use tracing::warn;

/// A path-to-path transformation applied after a primitive is resolved.
pub trait GeometryModifier {
    /// Writes the modified form of `path` into `out`.
    fn modify(&self, path: &ShapePath, out: &mut ShapePath);
}

#[derive(Debug, Clone)]
pub struct RoundCornersModifier {
    radius: AnimatedProperty<f32>,
}

impl RoundCornersModifier {
    pub fn from_data(shape: &data::RoundCornersShape, easing: &mut EasingRegistry) -> Self {
        Self {
            radius: AnimatedProperty::from_property(&shape.r, |v| *v, 0.0, easing),
        }
    }

    pub fn radius(&self) -> f32 {
        *self.radius.value()
    }
}

impl DynamicProperty for RoundCornersModifier {
    fn tick(&mut self, frame: f32) -> bool {
        self.radius.tick(frame)
    }
}

impl GeometryModifier for RoundCornersModifier {
    fn modify(&self, path: &ShapePath, out: &mut ShapePath) {
        round_corners(path, self.radius(), out);
    }
}

/// Replaces every sharp vertex with two vertices pulled back along its edges,
/// joined by a near-circular arc. Endpoints of open paths are kept.
pub fn round_corners(path: &ShapePath, radius: f32, out: &mut ShapePath) {
    out.copy_from(path);
    let n = path.len();
    if radius <= 0.0 || n < 2 {
        return;
    }
    out.clear();
    out.set_closed(path.is_closed());

    let vertices = path.vertices();
    for i in 0..n {
        let corner = vertices[i];
        let open_end = !path.is_closed() && (i == 0 || i == n - 1);
        if open_end || !path.is_sharp(i) {
            out.push(corner, path.in_points()[i], path.out_points()[i]);
            continue;
        }

        let prev = vertices[(i + n - 1) % n];
        let next = vertices[(i + 1) % n];

        let a = pull_back(corner, prev, radius);
        let b = pull_back(corner, next, radius);
        out.push(a, a, a + (corner - a) * ROUND_CORNER);
        out.push(b, b + (corner - b) * ROUND_CORNER, b);
    }
}

/// Point on the edge `corner -> toward`, at most half the edge away.
fn pull_back(corner: Vec2, toward: Vec2, radius: f32) -> Vec2 {
    let len = corner.distance(toward);
    if len == 0.0 {
        return corner;
    }
    let t = (len / 2.0).min(radius) / len;
    corner + (toward - corner) * t
}

/// Trim paths. The renderer cuts the paths; this resolves the window.
#[derive(Debug, Clone)]
pub struct TrimModifier {
    start: AnimatedProperty<f32>,
    end: AnimatedProperty<f32>,
    offset: AnimatedProperty<f32>,
    mode: TrimMode,
}

impl TrimModifier {
    pub fn from_data(shape: &data::TrimShape, easing: &mut EasingRegistry) -> Self {
        Self {
            start: AnimatedProperty::from_property(&shape.s, |v| *v, 0.0, easing),
            end: AnimatedProperty::from_property(&shape.e, |v| *v, 100.0, easing),
            offset: AnimatedProperty::from_property(&shape.o, |v| *v, 0.0, easing),
            mode: if shape.m == 2 {
                TrimMode::Individually
            } else {
                TrimMode::Simultaneous
            },
        }
    }

    /// `None` when the whole path is drawn.
    pub fn resolve(&self) -> Option<Trim> {
        let mut start = (self.start.value() / 100.0).clamp(0.0, 1.0);
        let mut end = (self.end.value() / 100.0).clamp(0.0, 1.0);
        if start > end {
            std::mem::swap(&mut start, &mut end);
        }
        let offset = (self.offset.value() / 360.0).rem_euclid(1.0);
        if start == 0.0 && end == 1.0 {
            return None;
        }
        Some(Trim {
            start,
            end,
            offset,
            mode: self.mode,
        })
    }
}

impl DynamicProperty for TrimModifier {
    fn tick(&mut self, frame: f32) -> bool {
        self.start.tick(frame) | self.end.tick(frame) | self.offset.tick(frame)
    }
}

/// Most copies one repeater builds. Larger counts are clamped.
pub const MAX_REPEATER_COPIES: usize = 1000;

/// Stacking of repeater copies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Composite {
    /// Each copy sits above the previous one.
    Above,
    Below,
}

/// Copy count, per-copy transform and opacity ramp of a repeater.
#[derive(Debug, Clone)]
pub struct RepeaterModifier {
    copies: AnimatedProperty<f32>,
    offset: AnimatedProperty<f32>,
    anchor: AnimatedProperty<Vec2>,
    position: AnimatedProperty<Vec2>,
    scale: AnimatedProperty<Vec2>,
    rotation: AnimatedProperty<f32>,
    start_opacity: AnimatedProperty<f32>,
    end_opacity: AnimatedProperty<f32>,
    composite: Composite,
    step: Mat3,
    evaluated: bool,
    name: Option<String>,
    clamp_reported: bool,
}

impl RepeaterModifier {
    pub fn from_data(shape: &data::RepeaterShape, easing: &mut EasingRegistry) -> Self {
        let t = &shape.tr.t;
        let position = match &t.p {
            data::PositionProperty::Unified(p) => {
                AnimatedProperty::from_property(p, |v| Vec2::new(v.0[0], v.0[1]), Vec2::ZERO, easing)
            }
            data::PositionProperty::Split { .. } => {
                warn!(name = ?shape.nm, "split position on a repeater transform is not supported");
                AnimatedProperty::constant(Vec2::ZERO)
            }
        };
        Self {
            copies: AnimatedProperty::from_property(&shape.c, |v| *v, 1.0, easing),
            offset: AnimatedProperty::from_property(&shape.o, |v| *v, 0.0, easing),
            anchor: AnimatedProperty::from_property(
                &t.a,
                |v| Vec2::new(v.0[0], v.0[1]),
                Vec2::ZERO,
                easing,
            ),
            position,
            scale: AnimatedProperty::from_property(
                &t.s,
                |v| Vec2::new(v.0[0], v.0[1]),
                Vec2::splat(100.0),
                easing,
            ),
            rotation: AnimatedProperty::from_property(&t.rz, |v| *v, 0.0, easing),
            start_opacity: AnimatedProperty::from_property(&shape.tr.so, |v| *v, 100.0, easing),
            end_opacity: AnimatedProperty::from_property(&shape.tr.eo, |v| *v, 100.0, easing),
            composite: if shape.m == 2 {
                Composite::Below
            } else {
                Composite::Above
            },
            step: Mat3::IDENTITY,
            evaluated: false,
            name: shape.nm.clone(),
            clamp_reported: false,
        }
    }

    /// Requested copies, possibly fractional, at most
    /// [`MAX_REPEATER_COPIES`]. Invalid counts read as zero.
    pub fn count(&self) -> f32 {
        let c = *self.copies.value();
        if c.is_finite() && c > 0.0 {
            c.min(MAX_REPEATER_COPIES as f32)
        } else {
            0.0
        }
    }

    /// Number of copies drawn: the count rounded up.
    pub fn visible_copies(&self) -> usize {
        self.count().ceil() as usize
    }

    pub fn composite(&self) -> Composite {
        self.composite
    }

    /// The transform between consecutive copies.
    pub fn step(&self) -> Mat3 {
        self.step
    }

    /// Transform of `fraction` of one step.
    fn partial_step(&self, fraction: f32) -> Mat3 {
        let anchor = *self.anchor.value();
        let scale = *self.scale.value() / 100.0;
        let scale = Vec2::ONE + (scale - Vec2::ONE) * fraction;
        Mat3::from_translation(*self.position.value() * fraction)
            * Mat3::from_translation(anchor)
            * Mat3::from_angle((self.rotation.value() * fraction).to_radians())
            * Mat3::from_scale(scale)
            * Mat3::from_translation(-anchor)
    }

    /// Transform and opacity of copy `index` out of [`Self::visible_copies`].
    pub fn copy(&self, index: usize) -> (Mat3, f32) {
        let n = self.visible_copies();
        let limit = MAX_REPEATER_COPIES as f32;
        let steps = (index as f32 + self.offset.value()).clamp(-limit, limit);
        let matrix = self.power(steps);

        let so = self.start_opacity.value() / 100.0;
        let eo = self.end_opacity.value() / 100.0;
        let mut opacity = if n > 1 {
            so + (eo - so) * index as f32 / (n - 1) as f32
        } else {
            so
        };
        let fraction = self.count().fract();
        if index + 1 == n && fraction > 0.0 {
            opacity *= fraction;
        }
        (matrix, opacity.clamp(0.0, 1.0))
    }

    /// `step` raised to a real power; negative powers use the inverse.
    fn power(&self, steps: f32) -> Mat3 {
        let whole = steps.trunc();
        let fraction = steps - whole;
        let base = if steps < 0.0 {
            self.step.inverse()
        } else {
            self.step
        };
        let mut m = Mat3::IDENTITY;
        for _ in 0..whole.abs() as usize {
            m *= base;
        }
        if fraction > 0.0 {
            m *= self.partial_step(fraction);
        } else if fraction < 0.0 {
            m *= self.partial_step(-fraction).inverse();
        }
        m
    }

    /// Copy indices from the bottom of the stack to the top.
    pub fn draw_order(&self, copies: usize) -> Vec<usize> {
        match self.composite {
            Composite::Above => (0..copies).collect(),
            Composite::Below => (0..copies).rev().collect(),
        }
    }
}

impl DynamicProperty for RepeaterModifier {
    fn tick(&mut self, frame: f32) -> bool {
        let shape = tick_all(
            [
                &mut self.anchor as &mut dyn DynamicProperty,
                &mut self.position,
                &mut self.scale,
                &mut self.rotation,
            ],
            frame,
        );
        if shape || !self.evaluated {
            self.step = self.partial_step(1.0);
            self.evaluated = true;
        }
        let copies = self.copies.tick(frame);
        let requested = *self.copies.value();
        if requested > MAX_REPEATER_COPIES as f32 && !self.clamp_reported {
            warn!(
                name = ?self.name,
                requested,
                max = MAX_REPEATER_COPIES,
                "repeater copy count clamped"
            );
            self.clamp_reported = true;
        }
        let ramp = tick_all(
            [
                &mut self.offset,
                &mut self.start_opacity,
                &mut self.end_opacity,
            ],
            frame,
        );
        shape | copies | ramp
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn square() -> ShapePath {
        let mut p = ShapePath::new();
        for v in [
            Vec2::new(0.0, 0.0),
            Vec2::new(10.0, 0.0),
            Vec2::new(10.0, 10.0),
            Vec2::new(0.0, 10.0),
        ] {
            p.push(v, v, v);
        }
        p.set_closed(true);
        p
    }

    fn repeater(value: serde_json::Value) -> RepeaterModifier {
        let shape: data::RepeaterShape = serde_json::from_value(value).expect("valid repeater");
        let mut r = RepeaterModifier::from_data(&shape, &mut EasingRegistry::new());
        r.tick(0.0);
        r
    }

    #[test]
    fn round_corners_doubles_sharp_vertices() {
        let mut out = ShapePath::new();
        round_corners(&square(), 2.0, &mut out);
        assert_eq!(out.len(), 8);
        assert_eq!(out.vertices()[0], Vec2::new(0.0, 2.0));
        assert_eq!(out.vertices()[1], Vec2::new(2.0, 0.0));
        let handle = out.out_points()[0] - out.vertices()[0];
        assert!((handle.length() - 2.0 * ROUND_CORNER).abs() < 1e-5);
    }

    #[test]
    fn round_corners_radius_limited_by_edge() {
        let mut out = ShapePath::new();
        round_corners(&square(), 100.0, &mut out);
        assert_eq!(out.vertices()[0], Vec2::new(0.0, 5.0));
    }

    #[test]
    fn round_corners_keeps_smooth_vertices_and_open_ends() {
        let mut open = ShapePath::new();
        open.push(Vec2::ZERO, Vec2::ZERO, Vec2::ZERO);
        open.push(Vec2::new(10.0, 0.0), Vec2::new(10.0, 0.0), Vec2::new(10.0, 0.0));
        open.push(Vec2::new(10.0, 10.0), Vec2::new(10.0, 10.0), Vec2::new(10.0, 10.0));
        let mut out = ShapePath::new();
        round_corners(&open, 3.0, &mut out);
        assert_eq!(out.len(), 4);
        assert_eq!(out.vertices()[0], Vec2::ZERO);

        let mut zero = ShapePath::new();
        round_corners(&square(), 0.0, &mut zero);
        assert_eq!(zero, square());
    }

    #[test]
    fn trim_resolves_fractions() {
        let shape: data::TrimShape = serde_json::from_value(json!({
            "s": {"a": 0, "k": 75}, "e": {"a": 0, "k": 25}, "o": {"a": 0, "k": 450}, "m": 2
        }))
        .unwrap();
        let mut trim = TrimModifier::from_data(&shape, &mut EasingRegistry::new());
        trim.tick(0.0);
        let t = trim.resolve().unwrap();
        assert_eq!((t.start, t.end), (0.25, 0.75));
        assert_eq!(t.offset, 0.25);
        assert_eq!(t.mode, TrimMode::Individually);

        let full: data::TrimShape = serde_json::from_value(json!({})).unwrap();
        let mut full = TrimModifier::from_data(&full, &mut EasingRegistry::new());
        full.tick(0.0);
        assert!(full.resolve().is_none());
    }

    #[test]
    fn copies_compose_powers_of_the_step() {
        let r = repeater(json!({
            "c": {"a": 0, "k": 3},
            "tr": {"p": {"a": 0, "k": [10, 0]}, "so": {"a": 0, "k": 100}, "eo": {"a": 0, "k": 50}}
        }));
        assert_eq!(r.visible_copies(), 3);
        let origins: Vec<Vec2> = (0..3)
            .map(|i| r.copy(i).0.transform_point2(Vec2::ZERO))
            .collect();
        assert_eq!(origins, vec![Vec2::ZERO, Vec2::new(10.0, 0.0), Vec2::new(20.0, 0.0)]);
        assert_eq!(r.copy(0).1, 1.0);
        assert_eq!(r.copy(1).1, 0.75);
        assert_eq!(r.copy(2).1, 0.5);
    }

    #[test]
    fn fractional_count_fades_last_copy() {
        let r = repeater(json!({"c": {"a": 0, "k": 2.5}, "tr": {}}));
        assert_eq!(r.visible_copies(), 3);
        assert_eq!(r.copy(2).1, 0.5);
        assert_eq!(r.copy(1).1, 1.0);
    }

    #[test]
    fn offset_shifts_copies() {
        let r = repeater(json!({
            "c": {"a": 0, "k": 2}, "o": {"a": 0, "k": -1.5},
            "tr": {"p": {"a": 0, "k": [10, 0]}}
        }));
        let p = r.copy(0).0.transform_point2(Vec2::ZERO);
        assert!((p - Vec2::new(-15.0, 0.0)).length() < 1e-4);
    }

    #[test]
    fn invalid_count_is_zero() {
        let r = repeater(json!({"c": {"a": 0, "k": -4}, "tr": {}}));
        assert_eq!(r.visible_copies(), 0);
    }

    #[test]
    fn huge_count_is_clamped() {
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();
        let r = repeater(json!({
            "c": {"a": 0, "k": 1e12}, "o": {"a": 0, "k": 1e9},
            "tr": {"p": {"a": 0, "k": [1, 0]}}
        }));
        assert_eq!(r.visible_copies(), MAX_REPEATER_COPIES);
        let p = r.copy(0).0.transform_point2(Vec2::ZERO);
        assert!((p.x - MAX_REPEATER_COPIES as f32).abs() < 1e-2);
    }

    #[test]
    fn composite_controls_order() {
        let above = repeater(json!({"c": {"a": 0, "k": 3}, "m": 1, "tr": {}}));
        let below = repeater(json!({"c": {"a": 0, "k": 3}, "m": 2, "tr": {}}));
        assert_eq!(above.draw_order(3), vec![0, 1, 2]);
        assert_eq!(below.draw_order(3), vec![2, 1, 0]);
    }
}
