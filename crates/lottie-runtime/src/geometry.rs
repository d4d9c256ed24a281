use crate::animatable::Interpolatable;
use crate::container::DynamicProperty;
use crate::easing::EasingRegistry;
use crate::expressions::LoopRange;
use crate::property::{
    bind_expression, build_segments, AnimatedProperty, KeyframeTrack, Sample, SegmentEasing,
};
use glam::{Mat3, Vec2};
use kurbo::{BezPath, Point};
use lottie_data::model as data;
use std::f32::consts::PI;
use tracing::warn;

/// Handle length, as a fraction of the radius, of a cubic quarter circle.
pub const ROUND_CORNER: f32 = 0.5519;

/// Vertices with absolute in/out control points.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShapePath {
    vertices: Vec<Vec2>,
    in_points: Vec<Vec2>,
    out_points: Vec<Vec2>,
    closed: bool,
}

impl ShapePath {
    pub fn new() -> Self {
        Self::default()
    }

    /// Converts exported data, whose tangents are relative to their vertex.
    pub fn from_bezier(path: &data::BezierPath) -> Self {
        let mut shape = ShapePath::new();
        shape.set_from_bezier(path);
        shape
    }

    pub fn set_from_bezier(&mut self, path: &data::BezierPath) {
        self.clear();
        for (idx, v) in path.v.iter().enumerate() {
            let v = Vec2::from(*v);
            let i = path.i.get(idx).map(|p| Vec2::from(*p)).unwrap_or(Vec2::ZERO);
            let o = path.o.get(idx).map(|p| Vec2::from(*p)).unwrap_or(Vec2::ZERO);
            self.push(v, v + i, v + o);
        }
        self.closed = path.c;
    }

    /// Empties the path, keeping its buffers.
    pub fn clear(&mut self) {
        self.vertices.clear();
        self.in_points.clear();
        self.out_points.clear();
        self.closed = false;
    }

    pub fn push(&mut self, vertex: Vec2, in_point: Vec2, out_point: Vec2) {
        self.vertices.push(vertex);
        self.in_points.push(in_point);
        self.out_points.push(out_point);
    }

    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn set_closed(&mut self, closed: bool) {
        self.closed = closed;
    }

    pub fn vertices(&self) -> &[Vec2] {
        &self.vertices
    }

    pub fn in_points(&self) -> &[Vec2] {
        &self.in_points
    }

    pub fn out_points(&self) -> &[Vec2] {
        &self.out_points
    }

    /// Vertex `i` has no handles on either side.
    pub fn is_sharp(&self, i: usize) -> bool {
        let v = self.vertices[i];
        self.in_points[i] == v && self.out_points[i] == v
    }

    /// Overwrites this path with `other`, reusing buffers.
    pub fn copy_from(&mut self, other: &ShapePath) {
        self.vertices.clone_from(&other.vertices);
        self.in_points.clone_from(&other.in_points);
        self.out_points.clone_from(&other.out_points);
        self.closed = other.closed;
    }

    pub fn transform(&mut self, matrix: &Mat3) {
        if *matrix == Mat3::IDENTITY {
            return;
        }
        for p in self
            .vertices
            .iter_mut()
            .chain(self.in_points.iter_mut())
            .chain(self.out_points.iter_mut())
        {
            *p = matrix.transform_point2(*p);
        }
    }

    pub fn transformed(&self, matrix: &Mat3) -> ShapePath {
        let mut out = self.clone();
        out.transform(matrix);
        out
    }

    /// Writes the blend of `from` and `to` into `out`. Extra vertices on the
    /// longer side are ignored.
    pub fn blend_into(from: &ShapePath, to: &ShapePath, t: f32, out: &mut ShapePath) {
        out.clear();
        let n = from.len().min(to.len());
        for i in 0..n {
            out.push(
                from.vertices[i].lerp(to.vertices[i], t),
                from.in_points[i].lerp(to.in_points[i], t),
                from.out_points[i].lerp(to.out_points[i], t),
            );
        }
        out.closed = from.closed;
    }

    /// Segments as (start, start handle, end handle, end).
    pub fn segments(&self) -> impl Iterator<Item = [Vec2; 4]> + '_ {
        let n = self.len();
        let count = match n {
            0 | 1 => 0,
            _ if self.closed => n,
            _ => n - 1,
        };
        (0..count).map(move |i| {
            let j = (i + 1) % n;
            [
                self.vertices[i],
                self.out_points[i],
                self.in_points[j],
                self.vertices[j],
            ]
        })
    }

    /// Splits the segment with the longest control polygon at its midpoint.
    /// The drawn shape does not change.
    pub fn subdivide_longest(&mut self) {
        let longest = self
            .segments()
            .enumerate()
            .map(|(i, [a, b, c, d])| (i, a.distance(b) + b.distance(c) + c.distance(d)))
            .max_by(|x, y| x.1.total_cmp(&y.1))
            .map(|(i, _)| i);
        let Some(i) = longest else {
            return;
        };
        let j = (i + 1) % self.len();
        let (a, b, c, d) = (
            self.vertices[i],
            self.out_points[i],
            self.in_points[j],
            self.vertices[j],
        );
        let ab = a.lerp(b, 0.5);
        let bc = b.lerp(c, 0.5);
        let cd = c.lerp(d, 0.5);
        let abc = ab.lerp(bc, 0.5);
        let bcd = bc.lerp(cd, 0.5);
        let mid = abc.lerp(bcd, 0.5);

        self.out_points[i] = ab;
        self.in_points[j] = cd;
        self.vertices.insert(i + 1, mid);
        self.in_points.insert(i + 1, abc);
        self.out_points.insert(i + 1, bcd);
    }

    pub fn to_bez_path(&self) -> BezPath {
        let mut path = BezPath::new();
        let Some(first) = self.vertices.first() else {
            return path;
        };
        path.move_to(point(*first));
        for [_, c1, c2, end] in self.segments() {
            path.curve_to(point(c1), point(c2), point(end));
        }
        if self.closed {
            path.close_path();
        }
        path
    }
}

fn point(v: Vec2) -> Point {
    Point::new(v.x as f64, v.y as f64)
}

impl Interpolatable for ShapePath {
    fn lerp(&self, other: &Self, t: f32) -> Self {
        let mut out = ShapePath::new();
        ShapePath::blend_into(self, other, t, &mut out);
        out
    }
}

/// Keyframed free-form path. Evaluates into its own buffer so steady-state
/// playback does not allocate.
#[derive(Debug, Clone)]
pub struct ShapeProperty {
    track: Option<KeyframeTrack<ShapePath>>,
    value: ShapePath,
    sample: Option<Sample>,
    frame: Option<f32>,
    modified: bool,
    looping: Option<LoopRange>,
}

impl ShapeProperty {
    pub fn constant(path: ShapePath) -> Self {
        Self {
            track: None,
            value: path,
            sample: None,
            frame: None,
            modified: false,
            looping: None,
        }
    }

    pub fn from_property(
        prop: &data::Property<data::BezierPath>,
        easing: &mut EasingRegistry,
    ) -> Self {
        match &prop.k {
            data::Value::Default => Self::constant(ShapePath::new()),
            data::Value::Static(path) => Self::constant(ShapePath::from_bezier(path)),
            data::Value::Animated(keyframes) => {
                let mut segments = build_segments(
                    keyframes,
                    &ShapePath::from_bezier,
                    &ShapePath::new(),
                    easing,
                );
                if segments.is_empty() {
                    let path = keyframes
                        .first()
                        .and_then(|kf| kf.s.as_ref())
                        .map(ShapePath::from_bezier)
                        .unwrap_or_default();
                    return Self::constant(path);
                }
                for segment in &mut segments {
                    if segment.start.len() != segment.end.len() {
                        warn!(
                            at = segment.start_frame,
                            from = segment.start.len(),
                            to = segment.end.len(),
                            "morph keyframes differ in vertex count, padding the shorter path"
                        );
                        match_vertex_counts(&mut segment.start, &mut segment.end);
                    }
                }
                let track = KeyframeTrack::new(segments);
                let looping = bind_expression(prop.x.as_deref(), &track.times());
                let value = track.start_value().cloned().unwrap_or_default();
                Self {
                    track: Some(track),
                    value,
                    sample: None,
                    frame: None,
                    modified: false,
                    looping,
                }
            }
        }
    }

    pub fn value(&self) -> &ShapePath {
        &self.value
    }

    pub fn is_animated(&self) -> bool {
        self.track.is_some()
    }

    pub fn is_modified(&self) -> bool {
        self.modified
    }

    fn apply(&mut self, frame: f32) -> bool {
        let Some(track) = self.track.as_mut() else {
            return false;
        };
        let frame = match &self.looping {
            Some(range) => range.remap(frame),
            None => frame,
        };
        let mut sample = track.locate(frame);
        if let Sample::Within { index, .. } = sample {
            if matches!(track.segments()[index].easing, SegmentEasing::Hold) {
                sample = Sample::Within {
                    index,
                    progress: 0.0,
                };
            }
        }
        if self.sample == Some(sample) {
            return false;
        }
        self.sample = Some(sample);

        let segments = track.segments();
        match sample {
            Sample::Start => self.value.copy_from(&segments[0].start),
            Sample::End => self.value.copy_from(&segments[segments.len() - 1].end),
            Sample::Within { index, progress } => {
                let segment = &segments[index];
                let rate = match &segment.easing {
                    SegmentEasing::Hold => 0.0,
                    SegmentEasing::Curve(curve) => curve.ease(progress),
                    SegmentEasing::PerComponent(curves) => {
                        curves.first().map(|c| c.ease(progress)).unwrap_or(progress)
                    }
                };
                ShapePath::blend_into(&segment.start, &segment.end, rate, &mut self.value);
            }
        }
        true
    }
}

impl DynamicProperty for ShapeProperty {
    fn tick(&mut self, frame: f32) -> bool {
        if self.frame == Some(frame) {
            return self.modified;
        }
        let first = self.frame.is_none();
        self.frame = Some(frame);
        let changed = self.apply(frame);
        self.modified = first || changed;
        self.modified
    }
}

/// Pads the path with fewer vertices until both have the same count.
pub fn match_vertex_counts(a: &mut ShapePath, b: &mut ShapePath) {
    let (short, target) = if a.len() < b.len() {
        (a, b.len())
    } else {
        (b, a.len())
    };
    if short.len() < 2 {
        // nothing to subdivide; collapse extra vertices onto the single point
        let anchor = short.vertices().first().copied().unwrap_or(Vec2::ZERO);
        while short.len() < target {
            short.push(anchor, anchor, anchor);
        }
        return;
    }
    while short.len() < target {
        short.subdivide_longest();
    }
}

/// Which way a primitive winds. Exports use `d: 3` for counter-clockwise.
fn is_reversed(direction: Option<u8>) -> bool {
    direction == Some(3)
}

#[derive(Debug, Clone)]
pub struct RectGeometry {
    pub size: AnimatedProperty<Vec2>,
    pub position: AnimatedProperty<Vec2>,
    pub roundness: AnimatedProperty<f32>,
    pub reversed: bool,
}

impl RectGeometry {
    pub fn from_data(shape: &data::RectShape, easing: &mut EasingRegistry) -> Self {
        Self {
            size: AnimatedProperty::from_property(&shape.s, |v| Vec2::from(*v), Vec2::ZERO, easing),
            position: AnimatedProperty::from_property(
                &shape.p,
                |v| Vec2::from(*v),
                Vec2::ZERO,
                easing,
            ),
            roundness: AnimatedProperty::from_property(&shape.r, |v| *v, 0.0, easing),
            reversed: is_reversed(shape.d),
        }
    }

    pub fn write(&self, out: &mut ShapePath) {
        let p = *self.position.value();
        let half = *self.size.value() / 2.0;
        let round = half.x.min(half.y).min(self.roundness.value().max(0.0));
        let c = round * (1.0 - ROUND_CORNER);
        let (l, r, t, b) = (p.x - half.x, p.x + half.x, p.y - half.y, p.y + half.y);

        out.clear();
        out.set_closed(true);
        let v = Vec2::new;
        // (vertex, out, in)
        let mut triple = |vertex: Vec2, o: Vec2, i: Vec2| out.push(vertex, i, o);

        if round <= 0.0 {
            let corners = if self.reversed {
                [v(r, t), v(l, t), v(l, b), v(r, b)]
            } else {
                [v(r, t), v(r, b), v(l, b), v(l, t)]
            };
            for corner in corners {
                triple(corner, corner, corner);
            }
            return;
        }

        if self.reversed {
            triple(v(r, t + round), v(r, t + c), v(r, t + round));
            triple(v(r - round, t), v(r - round, t), v(r - c, t));
            triple(v(l + round, t), v(l + c, t), v(l + round, t));
            triple(v(l, t + round), v(l, t + round), v(l, t + c));
            triple(v(l, b - round), v(l, b - c), v(l, b - round));
            triple(v(l + round, b), v(l + round, b), v(l + c, b));
            triple(v(r - round, b), v(r - c, b), v(r - round, b));
            triple(v(r, b - round), v(r, b - round), v(r, b - c));
        } else {
            triple(v(r, t + round), v(r, t + round), v(r, t + c));
            triple(v(r, b - round), v(r, b - c), v(r, b - round));
            triple(v(r - round, b), v(r - round, b), v(r - c, b));
            triple(v(l + round, b), v(l + c, b), v(l + round, b));
            triple(v(l, b - round), v(l, b - round), v(l, b - c));
            triple(v(l, t + round), v(l, t + c), v(l, t + round));
            triple(v(l + round, t), v(l + round, t), v(l + c, t));
            triple(v(r - round, t), v(r - c, t), v(r - round, t));
        }
    }
}

#[derive(Debug, Clone)]
pub struct EllipseGeometry {
    pub size: AnimatedProperty<Vec2>,
    pub position: AnimatedProperty<Vec2>,
    pub reversed: bool,
}

impl EllipseGeometry {
    pub fn from_data(shape: &data::EllipseShape, easing: &mut EasingRegistry) -> Self {
        Self {
            size: AnimatedProperty::from_property(&shape.s, |v| Vec2::from(*v), Vec2::ZERO, easing),
            position: AnimatedProperty::from_property(
                &shape.p,
                |v| Vec2::from(*v),
                Vec2::ZERO,
                easing,
            ),
            reversed: is_reversed(shape.d),
        }
    }

    pub fn write(&self, out: &mut ShapePath) {
        let p = *self.position.value();
        let s = *self.size.value() / 2.0;
        let k = ROUND_CORNER;
        // +1 sweeps clockwise on screen
        let dir = if self.reversed { -1.0 } else { 1.0 };
        let v = Vec2::new;

        out.clear();
        out.set_closed(true);
        let top = v(p.x, p.y - s.y);
        let side_a = v(p.x + s.x * dir, p.y);
        let bottom = v(p.x, p.y + s.y);
        let side_b = v(p.x - s.x * dir, p.y);

        out.push(
            top,
            v(p.x - s.x * k * dir, p.y - s.y),
            v(p.x + s.x * k * dir, p.y - s.y),
        );
        out.push(
            side_a,
            v(p.x + s.x * dir, p.y - s.y * k),
            v(p.x + s.x * dir, p.y + s.y * k),
        );
        out.push(
            bottom,
            v(p.x + s.x * k * dir, p.y + s.y),
            v(p.x - s.x * k * dir, p.y + s.y),
        );
        out.push(
            side_b,
            v(p.x - s.x * dir, p.y + s.y * k),
            v(p.x - s.x * dir, p.y - s.y * k),
        );
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolystarKind {
    Star,
    Polygon,
}

#[derive(Debug, Clone)]
pub struct PolystarGeometry {
    pub kind: PolystarKind,
    pub position: AnimatedProperty<Vec2>,
    pub points: AnimatedProperty<f32>,
    pub rotation: AnimatedProperty<f32>,
    pub outer_radius: AnimatedProperty<f32>,
    pub outer_roundness: AnimatedProperty<f32>,
    pub inner_radius: AnimatedProperty<f32>,
    pub inner_roundness: AnimatedProperty<f32>,
    pub reversed: bool,
}

impl PolystarGeometry {
    pub fn from_data(shape: &data::PolystarShape, easing: &mut EasingRegistry) -> Self {
        let optional = |prop: &Option<data::Property<f32>>, easing: &mut EasingRegistry| match prop
        {
            Some(p) => AnimatedProperty::from_property(p, |v| *v, 0.0, easing),
            None => AnimatedProperty::constant(0.0),
        };
        Self {
            kind: if shape.sy == 2 {
                PolystarKind::Polygon
            } else {
                PolystarKind::Star
            },
            position: AnimatedProperty::from_property(
                &shape.p,
                |v| Vec2::from(*v),
                Vec2::ZERO,
                easing,
            ),
            points: AnimatedProperty::from_property(&shape.pt, |v| *v, 5.0, easing),
            rotation: AnimatedProperty::from_property(&shape.r, |v| *v, 0.0, easing),
            outer_radius: AnimatedProperty::from_property(&shape.or, |v| *v, 0.0, easing),
            outer_roundness: AnimatedProperty::from_property(&shape.os, |v| *v, 0.0, easing),
            inner_radius: optional(&shape.ir, easing),
            inner_roundness: optional(&shape.is, easing),
            reversed: is_reversed(shape.d),
        }
    }

    pub fn write(&self, out: &mut ShapePath) {
        out.clear();
        out.set_closed(true);

        let points = self.points.value().floor().max(0.0) as usize;
        if points == 0 {
            return;
        }
        let center = *self.position.value();
        let dir = if self.reversed { -1.0 } else { 1.0 };
        let mut angle = -PI / 2.0 + self.rotation.value().to_radians();

        // (radius, roundness, handle scale) per emitted vertex
        let outer = *self.outer_radius.value();
        let outer_round = self.outer_roundness.value() / 100.0;
        let (count, step, spokes) = match self.kind {
            PolystarKind::Star => {
                let inner = *self.inner_radius.value();
                let inner_round = self.inner_roundness.value() / 100.0;
                let count = points * 2;
                let outer_perimeter = 2.0 * PI * outer / (count as f32 * 2.0);
                let inner_perimeter = 2.0 * PI * inner / (count as f32 * 2.0);
                (
                    count,
                    2.0 * PI / count as f32,
                    [
                        (outer, outer_round, outer_perimeter),
                        (inner, inner_round, inner_perimeter),
                    ],
                )
            }
            PolystarKind::Polygon => {
                let perimeter = 2.0 * PI * outer / (points as f32 * 4.0);
                (
                    points,
                    2.0 * PI / points as f32,
                    [
                        (outer, outer_round, perimeter),
                        (outer, outer_round, perimeter),
                    ],
                )
            }
        };

        for i in 0..count {
            let (radius, roundness, perimeter) = spokes[i % 2];
            let x = radius * angle.cos();
            let y = radius * angle.sin();
            let len = (x * x + y * y).sqrt();
            let (ox, oy) = if len == 0.0 { (0.0, 0.0) } else { (y / len, -x / len) };
            let vertex = center + Vec2::new(x, y);
            let handle = Vec2::new(ox, oy) * perimeter * roundness * dir;
            out.push(vertex, vertex + handle, vertex - handle);
            angle += step * dir;
        }
    }
}

#[derive(Debug, Clone)]
pub struct PathGeometry {
    pub shape: ShapeProperty,
}

/// Every primitive a shape layer can draw.
#[derive(Debug, Clone)]
pub enum ShapeGeometry {
    Rect(RectGeometry),
    Ellipse(EllipseGeometry),
    Polystar(PolystarGeometry),
    Path(PathGeometry),
}

impl ShapeGeometry {
    /// `None` for shape items that are not geometry.
    pub fn from_shape(shape: &data::Shape, easing: &mut EasingRegistry) -> Option<Self> {
        Some(match shape {
            data::Shape::Rect(s) => ShapeGeometry::Rect(RectGeometry::from_data(s, easing)),
            data::Shape::Ellipse(s) => {
                ShapeGeometry::Ellipse(EllipseGeometry::from_data(s, easing))
            }
            data::Shape::Polystar(s) => {
                ShapeGeometry::Polystar(PolystarGeometry::from_data(s, easing))
            }
            data::Shape::Path(s) => ShapeGeometry::Path(PathGeometry {
                shape: ShapeProperty::from_property(&s.ks, easing),
            }),
            _ => return None,
        })
    }

    /// Writes the path for the last ticked frame into `out`.
    pub fn resolve(&self, out: &mut ShapePath) {
        match self {
            ShapeGeometry::Rect(g) => g.write(out),
            ShapeGeometry::Ellipse(g) => g.write(out),
            ShapeGeometry::Polystar(g) => g.write(out),
            ShapeGeometry::Path(g) => out.copy_from(g.shape.value()),
        }
    }
}

impl DynamicProperty for ShapeGeometry {
    fn tick(&mut self, frame: f32) -> bool {
        match self {
            ShapeGeometry::Rect(g) => {
                g.size.tick(frame) | g.position.tick(frame) | g.roundness.tick(frame)
            }
            ShapeGeometry::Ellipse(g) => g.size.tick(frame) | g.position.tick(frame),
            ShapeGeometry::Polystar(g) => {
                g.position.tick(frame)
                    | g.points.tick(frame)
                    | g.rotation.tick(frame)
                    | g.outer_radius.tick(frame)
                    | g.outer_roundness.tick(frame)
                    | g.inner_radius.tick(frame)
                    | g.inner_roundness.tick(frame)
            }
            ShapeGeometry::Path(g) => g.shape.tick(frame),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn build(value: serde_json::Value) -> ShapeGeometry {
        let shape: data::Shape = serde_json::from_value(value).expect("valid shape");
        let mut registry = EasingRegistry::new();
        let mut geometry = ShapeGeometry::from_shape(&shape, &mut registry).expect("geometry");
        geometry.tick(0.0);
        geometry
    }

    fn resolved(geometry: &ShapeGeometry) -> ShapePath {
        let mut out = ShapePath::new();
        geometry.resolve(&mut out);
        out
    }

    #[test]
    fn sharp_rect_has_four_corners() {
        let rect = build(json!({
            "ty": "rc", "s": {"a": 0, "k": [100, 50]}, "p": {"a": 0, "k": [0, 0]}, "r": {"a": 0, "k": 0}
        }));
        let path = resolved(&rect);
        assert_eq!(path.len(), 4);
        assert!(path.is_closed());
        assert_eq!(path.vertices()[0], Vec2::new(50.0, -25.0));
        assert_eq!(path.vertices()[1], Vec2::new(50.0, 25.0));
        assert!((0..4).all(|i| path.is_sharp(i)));
    }

    #[test]
    fn rounded_rect_clamps_radius_to_half_side() {
        let rect = build(json!({
            "ty": "rc", "s": {"a": 0, "k": [100, 20]}, "p": {"a": 0, "k": [0, 0]}, "r": {"a": 0, "k": 50}
        }));
        let path = resolved(&rect);
        assert_eq!(path.len(), 8);
        // radius limited to 10
        assert_eq!(path.vertices()[0], Vec2::new(50.0, 0.0));
        assert_eq!(path.vertices()[2], Vec2::new(40.0, 10.0));
    }

    #[test]
    fn ellipse_direction_flips_winding() {
        let cw = build(json!({"ty": "el", "s": {"a": 0, "k": [20, 10]}, "p": {"a": 0, "k": [5, 5]}}));
        let ccw = build(json!({"ty": "el", "d": 3, "s": {"a": 0, "k": [20, 10]}, "p": {"a": 0, "k": [5, 5]}}));
        let a = resolved(&cw);
        let b = resolved(&ccw);
        assert_eq!(a.vertices()[0], Vec2::new(5.0, 0.0));
        assert_eq!(a.vertices()[1], Vec2::new(15.0, 5.0));
        assert_eq!(b.vertices()[1], Vec2::new(-5.0, 5.0));
        let handle = a.out_points()[0] - a.vertices()[0];
        assert!((handle.x - 10.0 * ROUND_CORNER).abs() < 1e-5);
    }

    #[test]
    fn star_alternates_radii() {
        let star = build(json!({
            "ty": "sr", "sy": 1, "p": {"a": 0, "k": [0, 0]}, "pt": {"a": 0, "k": 5},
            "r": {"a": 0, "k": 0}, "or": {"a": 0, "k": 100}, "os": {"a": 0, "k": 0},
            "ir": {"a": 0, "k": 40}, "is": {"a": 0, "k": 0}
        }));
        let path = resolved(&star);
        assert_eq!(path.len(), 10);
        assert!((path.vertices()[0] - Vec2::new(0.0, -100.0)).length() < 1e-3);
        assert!((path.vertices()[1].length() - 40.0).abs() < 1e-3);
    }

    #[test]
    fn polygon_point_count_is_floored() {
        let polygon = build(json!({
            "ty": "sr", "sy": 2, "p": {"a": 0, "k": [0, 0]}, "pt": {"a": 0, "k": 6.7},
            "r": {"a": 0, "k": 0}, "or": {"a": 0, "k": 10}, "os": {"a": 0, "k": 0}
        }));
        let path = resolved(&polygon);
        assert_eq!(path.len(), 6);
        assert!(path.vertices().iter().all(|v| (v.length() - 10.0).abs() < 1e-3));
    }

    #[test]
    fn path_morph_blends_vertices() {
        let mut path = build(json!({
            "ty": "sh",
            "ks": {"a": 1, "k": [
                {"t": 0, "s": [{"c": false, "v": [[0, 0], [10, 0]], "i": [[0, 0], [0, 0]], "o": [[0, 0], [0, 0]]}]},
                {"t": 10, "s": [{"c": false, "v": [[0, 10], [10, 10]], "i": [[0, 0], [0, 0]], "o": [[0, 0], [0, 0]]}]}
            ]}
        }));
        assert!(path.tick(5.0));
        let out = resolved(&path);
        assert_eq!(out.vertices(), &[Vec2::new(0.0, 5.0), Vec2::new(10.0, 5.0)]);
        assert!(path.tick(12.0));
        assert!(!path.tick(14.0), "clamped end frame does not rewrite the path");
    }

    #[test]
    fn mismatched_morph_is_padded() {
        let mut path = build(json!({
            "ty": "sh",
            "ks": {"a": 1, "k": [
                {"t": 0, "s": [{"c": true, "v": [[0, 0], [10, 0], [10, 10]], "i": [[0, 0], [0, 0], [0, 0]], "o": [[0, 0], [0, 0], [0, 0]]}]},
                {"t": 10, "s": [{"c": true, "v": [[0, 0], [10, 0], [10, 10], [0, 10]], "i": [[0, 0], [0, 0], [0, 0], [0, 0]], "o": [[0, 0], [0, 0], [0, 0], [0, 0]]}]}
            ]}
        }));
        path.tick(5.0);
        assert_eq!(resolved(&path).len(), 4);
    }

    #[test]
    fn subdivision_keeps_endpoints() {
        let mut path = ShapePath::from_bezier(&data::BezierPath {
            c: false,
            v: vec![[0.0, 0.0], [10.0, 0.0]],
            i: vec![[0.0, 0.0], [0.0, 0.0]],
            o: vec![[0.0, 0.0], [0.0, 0.0]],
        });
        path.subdivide_longest();
        assert_eq!(path.len(), 3);
        assert_eq!(path.vertices()[1], Vec2::new(5.0, 0.0));
        assert_eq!(path.vertices()[2], Vec2::new(10.0, 0.0));
    }
}
