//! Fill and stroke items of a shape layer, resolved into paints.

use crate::container::DynamicProperty;
use crate::easing::EasingRegistry;
use crate::property::AnimatedProperty;
use crate::renderer::{
    DashPattern, FillRule, Gradient, GradientKind, GradientStop, LineCap, LineJoin, Paint,
    ShapePaint, Stroke,
};
use glam::{Vec2, Vec4};
use lottie_data::model as data;

fn to_color(raw: &data::Rgba) -> Vec4 {
    let c = Vec4::from(raw.0);
    // some exporters write 0-255 channels
    if c.truncate().max_element() > 1.0 {
        Vec4::new(c.x / 255.0, c.y / 255.0, c.z / 255.0, c.w.min(1.0))
    } else {
        c
    }
}

fn fill_rule(r: Option<u8>) -> FillRule {
    match r {
        Some(2) => FillRule::EvenOdd,
        _ => FillRule::NonZero,
    }
}

fn line_cap(lc: u8) -> LineCap {
    match lc {
        1 => LineCap::Butt,
        3 => LineCap::Square,
        _ => LineCap::Round,
    }
}

fn line_join(lj: u8) -> LineJoin {
    match lj {
        1 => LineJoin::Miter,
        3 => LineJoin::Bevel,
        _ => LineJoin::Round,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DashRole {
    Dash,
    Gap,
    Offset,
}

#[derive(Debug, Clone)]
struct Dashes {
    entries: Vec<(DashRole, AnimatedProperty<f32>)>,
}

impl Dashes {
    fn from_data(props: &[data::DashProperty], easing: &mut EasingRegistry) -> Self {
        let entries = props
            .iter()
            .filter_map(|p| {
                let role = match p.n.as_deref() {
                    Some("d") | Some("v") => DashRole::Dash,
                    Some("g") => DashRole::Gap,
                    Some("o") => DashRole::Offset,
                    _ => return None,
                };
                Some((role, AnimatedProperty::from_property(&p.v, |v| *v, 0.0, easing)))
            })
            .collect();
        Self { entries }
    }

    fn resolve(&self) -> Option<DashPattern> {
        let mut array = Vec::new();
        let mut offset = 0.0;
        for (role, value) in &self.entries {
            match role {
                DashRole::Offset => offset = *value.value(),
                _ => array.push(value.value().max(0.0)),
            }
        }
        if array.is_empty() || array.iter().all(|v| *v == 0.0) {
            return None;
        }
        if array.len() % 2 != 0 {
            let repeat = array.clone();
            array.extend(repeat);
        }
        Some(DashPattern { array, offset })
    }
}

impl DynamicProperty for Dashes {
    fn tick(&mut self, frame: f32) -> bool {
        self.entries
            .iter_mut()
            .fold(false, |m, (_, v)| v.tick(frame) | m)
    }
}

#[derive(Debug, Clone)]
struct GradientStyle {
    kind: GradientKind,
    start: AnimatedProperty<Vec2>,
    end: AnimatedProperty<Vec2>,
    colors: AnimatedProperty<Vec<f32>>,
    color_count: usize,
}

impl GradientStyle {
    fn from_data(
        t: u8,
        s: &data::Property<data::Vec2>,
        e: &data::Property<data::Vec2>,
        g: &data::GradientColors,
        easing: &mut EasingRegistry,
    ) -> Self {
        Self {
            kind: if t == 1 {
                GradientKind::Linear
            } else {
                GradientKind::Radial
            },
            start: AnimatedProperty::from_property(s, |v| Vec2::from(*v), Vec2::ZERO, easing),
            end: AnimatedProperty::from_property(e, |v| Vec2::from(*v), Vec2::ZERO, easing),
            colors: AnimatedProperty::from_property(&g.k, |v| v.clone(), Vec::new(), easing),
            color_count: g.p as usize,
        }
    }

    fn paint(&self) -> Paint {
        Paint::Gradient(Gradient {
            kind: self.kind,
            start: *self.start.value(),
            end: *self.end.value(),
            stops: gradient_stops(self.colors.value(), self.color_count),
        })
    }
}

impl DynamicProperty for GradientStyle {
    fn tick(&mut self, frame: f32) -> bool {
        self.start.tick(frame) | self.end.tick(frame) | self.colors.tick(frame)
    }
}

#[derive(Debug, Clone)]
struct StrokeParams {
    width: AnimatedProperty<f32>,
    cap: LineCap,
    join: LineJoin,
    miter_limit: f32,
    dashes: Dashes,
}

impl StrokeParams {
    fn new(
        w: &data::Property<f32>,
        lc: u8,
        lj: u8,
        ml: Option<f32>,
        d: &[data::DashProperty],
        easing: &mut EasingRegistry,
    ) -> Self {
        Self {
            width: AnimatedProperty::from_property(w, |v| *v, 1.0, easing),
            cap: line_cap(lc),
            join: line_join(lj),
            miter_limit: ml.unwrap_or(4.0),
            dashes: Dashes::from_data(d, easing),
        }
    }

    fn stroke(&self, paint: Paint) -> Stroke {
        Stroke {
            paint,
            width: self.width.value().max(0.0),
            cap: self.cap,
            join: self.join,
            miter_limit: self.miter_limit,
            dash: self.dashes.resolve(),
        }
    }
}

impl DynamicProperty for StrokeParams {
    fn tick(&mut self, frame: f32) -> bool {
        self.width.tick(frame) | self.dashes.tick(frame)
    }
}

#[derive(Debug, Clone)]
enum StyleKind {
    Fill {
        color: AnimatedProperty<Vec4>,
        rule: FillRule,
    },
    Stroke {
        color: AnimatedProperty<Vec4>,
        params: StrokeParams,
    },
    GradientFill {
        gradient: GradientStyle,
        rule: FillRule,
    },
    GradientStroke {
        gradient: GradientStyle,
        params: StrokeParams,
    },
}

/// One fill, stroke, gradient fill or gradient stroke item.
#[derive(Debug, Clone)]
pub struct ShapeStyle {
    kind: StyleKind,
    opacity: AnimatedProperty<f32>,
}

impl ShapeStyle {
    /// `None` for shape items that are not styles.
    pub fn from_shape(shape: &data::Shape, easing: &mut EasingRegistry) -> Option<Self> {
        let (kind, opacity) = match shape {
            data::Shape::Fill(f) => (
                StyleKind::Fill {
                    color: AnimatedProperty::from_property(&f.c, to_color, Vec4::ONE, easing),
                    rule: fill_rule(f.r),
                },
                &f.o,
            ),
            data::Shape::Stroke(s) => (
                StyleKind::Stroke {
                    color: AnimatedProperty::from_property(&s.c, to_color, Vec4::ONE, easing),
                    params: StrokeParams::new(&s.w, s.lc, s.lj, s.ml, &s.d, easing),
                },
                &s.o,
            ),
            data::Shape::GradientFill(g) => (
                StyleKind::GradientFill {
                    gradient: GradientStyle::from_data(g.t, &g.s, &g.e, &g.g, easing),
                    rule: fill_rule(g.r),
                },
                &g.o,
            ),
            data::Shape::GradientStroke(g) => (
                StyleKind::GradientStroke {
                    gradient: GradientStyle::from_data(g.t, &g.s, &g.e, &g.g, easing),
                    params: StrokeParams::new(&g.w, g.lc, g.lj, g.ml, &g.d, easing),
                },
                &g.o,
            ),
            _ => return None,
        };
        Some(Self {
            kind,
            opacity: AnimatedProperty::from_property(opacity, |v| *v, 100.0, easing),
        })
    }

    /// Own opacity in `[0, 1]`, before group opacity.
    pub fn opacity(&self) -> f32 {
        (self.opacity.value() / 100.0).clamp(0.0, 1.0)
    }

    pub fn is_stroke(&self) -> bool {
        matches!(
            self.kind,
            StyleKind::Stroke { .. } | StyleKind::GradientStroke { .. }
        )
    }

    pub fn paint(&self) -> ShapePaint {
        match &self.kind {
            StyleKind::Fill { color, rule } => ShapePaint::Fill {
                paint: Paint::Solid(*color.value()),
                rule: *rule,
            },
            StyleKind::Stroke { color, params } => {
                ShapePaint::Stroke(params.stroke(Paint::Solid(*color.value())))
            }
            StyleKind::GradientFill { gradient, rule } => ShapePaint::Fill {
                paint: gradient.paint(),
                rule: *rule,
            },
            StyleKind::GradientStroke { gradient, params } => {
                ShapePaint::Stroke(params.stroke(gradient.paint()))
            }
        }
    }
}

impl DynamicProperty for ShapeStyle {
    fn tick(&mut self, frame: f32) -> bool {
        let kind = match &mut self.kind {
            StyleKind::Fill { color, .. } => color.tick(frame),
            StyleKind::Stroke { color, params } => color.tick(frame) | params.tick(frame),
            StyleKind::GradientFill { gradient, .. } => gradient.tick(frame),
            StyleKind::GradientStroke { gradient, params } => {
                gradient.tick(frame) | params.tick(frame)
            }
        };
        kind | self.opacity.tick(frame)
    }
}

/// Unpacks `[offset, r, g, b] * color_count` followed by optional
/// `[offset, alpha]` pairs. With alpha stops present, stops are emitted at
/// every offset of either kind.
pub fn gradient_stops(raw: &[f32], color_count: usize) -> Vec<GradientStop> {
    let color_len = (color_count * 4).min(raw.len());
    let colors: Vec<(f32, Vec4)> = raw[..color_len]
        .chunks_exact(4)
        .map(|c| (c[0], Vec4::new(c[1], c[2], c[3], 1.0)))
        .collect();
    let alphas: Vec<(f32, f32)> = raw[color_len..]
        .chunks_exact(2)
        .map(|a| (a[0], a[1]))
        .collect();

    if alphas.is_empty() {
        return colors
            .into_iter()
            .map(|(offset, color)| GradientStop { offset, color })
            .collect();
    }

    let mut offsets: Vec<f32> = colors
        .iter()
        .map(|c| c.0)
        .chain(alphas.iter().map(|a| a.0))
        .collect();
    offsets.sort_by(|a, b| a.total_cmp(b));
    offsets.dedup();

    offsets
        .into_iter()
        .map(|t| {
            let rgb = sample(&colors, t, Vec4::ONE);
            let alpha = sample(&alphas, t, 1.0);
            GradientStop {
                offset: t,
                color: rgb.truncate().extend(alpha),
            }
        })
        .collect()
}

/// Piecewise-linear lookup over sorted `(offset, value)` stops.
fn sample<T>(stops: &[(f32, T)], t: f32, empty: T) -> T
where
    T: Copy + std::ops::Add<Output = T> + std::ops::Sub<Output = T> + std::ops::Mul<f32, Output = T>,
{
    let (Some(first), Some(last)) = (stops.first(), stops.last()) else {
        return empty;
    };
    if t <= first.0 {
        return first.1;
    }
    if t >= last.0 {
        return last.1;
    }
    for pair in stops.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        if t >= a.0 && t <= b.0 {
            let range = b.0 - a.0;
            let ratio = if range == 0.0 { 0.0 } else { (t - a.0) / range };
            return a.1 + (b.1 - a.1) * ratio;
        }
    }
    last.1
}
