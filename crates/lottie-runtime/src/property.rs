use crate::animatable::{Interpolatable, SpatialCurve};
use crate::container::DynamicProperty;
use crate::easing::{BezierEasing, EasingRegistry};
use crate::expressions::{LoopExpression, LoopRange};
use glam::Vec2;
use lottie_data::model::{Keyframe, Property, Value};
use std::sync::Arc;
use tracing::warn;

/// Largest component count that gets individual easing rates.
const MAX_EASED_COMPONENTS: usize = 4;

#[derive(Debug, Clone)]
pub enum SegmentEasing {
    Hold,
    Curve(Arc<BezierEasing>),
    PerComponent(Vec<Arc<BezierEasing>>),
}

/// Interpolation between two adjacent keyframes.
#[derive(Debug, Clone)]
pub struct Segment<T> {
    pub start_frame: f32,
    pub end_frame: f32,
    pub start: T,
    pub end: T,
    pub easing: SegmentEasing,
    pub spatial: Option<SpatialCurve>,
}

impl<T> Segment<T> {
    fn contains(&self, frame: f32) -> bool {
        frame >= self.start_frame && frame < self.end_frame
    }

    pub fn progress(&self, frame: f32) -> f32 {
        let duration = self.end_frame - self.start_frame;
        if duration <= 0.0 {
            return 0.0;
        }
        ((frame - self.start_frame) / duration).clamp(0.0, 1.0)
    }
}

/// Where a frame falls on a keyframed track.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Sample {
    /// Before the first keyframe.
    Start,
    /// At or after the last keyframe.
    End,
    /// Inside segment `index` at normalized time `progress`.
    Within { index: usize, progress: f32 },
}

/// Keyframe segments plus the index of the last segment resolved.
///
/// Sequential playback almost always lands in the cached segment or the one
/// after it; anything else falls back to a binary search.
#[derive(Debug, Clone)]
pub struct KeyframeTrack<T> {
    segments: Vec<Segment<T>>,
    cursor: usize,
}

impl<T: Clone> KeyframeTrack<T> {
    pub fn new(segments: Vec<Segment<T>>) -> Self {
        Self {
            segments,
            cursor: 0,
        }
    }

    pub fn segments(&self) -> &[Segment<T>] {
        &self.segments
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Keyframe times, first to last.
    pub fn times(&self) -> Vec<f32> {
        let mut times: Vec<f32> = self.segments.iter().map(|s| s.start_frame).collect();
        if let Some(last) = self.segments.last() {
            times.push(last.end_frame);
        }
        times
    }

    pub fn locate(&mut self, frame: f32) -> Sample {
        let (first, last) = match (self.segments.first(), self.segments.last()) {
            (Some(f), Some(l)) => (f.start_frame, l.end_frame),
            _ => return Sample::End,
        };
        if frame < first {
            self.cursor = 0;
            return Sample::Start;
        }
        if frame >= last {
            self.cursor = self.segments.len() - 1;
            return Sample::End;
        }

        let index = if self.segments[self.cursor].contains(frame) {
            self.cursor
        } else if self
            .segments
            .get(self.cursor + 1)
            .map(|s| s.contains(frame))
            .unwrap_or(false)
        {
            self.cursor + 1
        } else {
            // first segment ending after `frame`
            self.segments
                .partition_point(|s| s.end_frame <= frame)
                .min(self.segments.len() - 1)
        };

        self.cursor = index;
        let segment = &self.segments[index];
        Sample::Within {
            index,
            progress: segment.progress(frame),
        }
    }

    pub fn start_value(&self) -> Option<&T> {
        self.segments.first().map(|s| &s.start)
    }

    pub fn end_value(&self) -> Option<&T> {
        self.segments.last().map(|s| &s.end)
    }
}

/// Builds segments from exported keyframes.
///
/// A segment's end value is `e` of its start keyframe, else `s` of the next
/// keyframe, else its own start value. A keyframe earlier than the one before
/// it is dropped; two keyframes at the same time make an instant jump.
pub fn build_segments<S, T>(
    keyframes: &[Keyframe<S>],
    convert: &impl Fn(&S) -> T,
    default: &T,
    easing: &mut EasingRegistry,
) -> Vec<Segment<T>>
where
    T: Interpolatable,
{
    let mut ordered: Vec<&Keyframe<S>> = Vec::with_capacity(keyframes.len());
    for kf in keyframes {
        match ordered.last() {
            Some(last) if kf.t < last.t => {
                warn!(at = kf.t, after = last.t, "dropping keyframe out of time order");
            }
            _ => ordered.push(kf),
        }
    }

    let mut segments = Vec::with_capacity(ordered.len().saturating_sub(1));
    let mut previous_end: Option<T> = None;

    for pair in ordered.windows(2) {
        let (kf, next) = (pair[0], pair[1]);
        if next.t == kf.t {
            continue;
        }

        let start = kf
            .s
            .as_ref()
            .map(convert)
            .or_else(|| previous_end.clone())
            .unwrap_or_else(|| default.clone());
        let end = kf
            .e
            .as_ref()
            .map(convert)
            .or_else(|| next.s.as_ref().map(convert))
            .unwrap_or_else(|| start.clone());

        let segment_easing = if kf.is_hold() {
            SegmentEasing::Hold
        } else {
            resolve_easing(kf, easing)
        };

        let spatial = match (&kf.to, &kf.ti, start.planar(), end.planar()) {
            (Some(to), Some(ti), Some(p0), Some(p3)) => {
                SpatialCurve::new(p0, p3, tangent(to), tangent(ti))
            }
            _ => None,
        };

        previous_end = Some(end.clone());
        segments.push(Segment {
            start_frame: kf.t,
            end_frame: next.t,
            start,
            end,
            easing: segment_easing,
            spatial,
        });
    }

    segments
}

fn tangent(values: &[f32]) -> Vec2 {
    Vec2::new(
        values.first().copied().unwrap_or(0.0),
        values.get(1).copied().unwrap_or(0.0),
    )
}

fn resolve_easing<S>(kf: &Keyframe<S>, registry: &mut EasingRegistry) -> SegmentEasing {
    let (out_tangent, in_tangent) = match (&kf.o, &kf.i) {
        (Some(o), Some(i)) => (o, i),
        // linear
        _ => return SegmentEasing::Curve(registry.curve(Vec2::ZERO, Vec2::ONE)),
    };

    let components = out_tangent
        .components()
        .max(in_tangent.components())
        .clamp(1, MAX_EASED_COMPONENTS);

    let mut curves = Vec::with_capacity(components);
    for c in 0..components {
        let p1 = out_tangent.component(c).unwrap_or((0.0, 0.0));
        let p2 = in_tangent.component(c).unwrap_or((1.0, 1.0));
        curves.push(registry.curve(Vec2::new(p1.0, p1.1), Vec2::new(p2.0, p2.1)));
    }

    let shared = curves.windows(2).all(|w| Arc::ptr_eq(&w[0], &w[1]));
    if shared {
        SegmentEasing::Curve(curves.swap_remove(0))
    } else {
        SegmentEasing::PerComponent(curves)
    }
}

/// Blends a segment at `progress` for types that interpolate by value.
pub fn interpolate<T: Interpolatable>(segment: &Segment<T>, progress: f32) -> T {
    match &segment.easing {
        SegmentEasing::Hold => segment.start.clone(),
        SegmentEasing::Curve(curve) => {
            let rate = curve.ease(progress);
            match &segment.spatial {
                Some(path) => {
                    let point = path.point_at(rate);
                    segment.start.along_curve(&segment.end, point, rate)
                }
                None => segment.start.lerp(&segment.end, rate),
            }
        }
        SegmentEasing::PerComponent(curves) => {
            let mut rates = [0.0; MAX_EASED_COMPONENTS];
            for (rate, curve) in rates.iter_mut().zip(curves) {
                *rate = curve.ease(progress);
            }
            match &segment.spatial {
                // a curve point has one parameter; the first component drives it
                Some(path) => {
                    let point = path.point_at(rates[0]);
                    segment.start.along_curve(&segment.end, point, rates[0])
                }
                None => segment
                    .start
                    .lerp_components(&segment.end, &rates[..curves.len().max(1)]),
            }
        }
    }
}

/// Eased progress along a segment's spatial curve, if it moves on one.
fn path_rate(easing: &SegmentEasing, progress: f32) -> Option<f32> {
    match easing {
        SegmentEasing::Hold => None,
        SegmentEasing::Curve(curve) => Some(curve.ease(progress)),
        SegmentEasing::PerComponent(curves) => curves.first().map(|c| c.ease(progress)),
    }
}

/// Parses a property's expression into a loop bound to its keyframes.
/// Anything else is reported once and ignored.
pub(crate) fn bind_expression(source: Option<&str>, times: &[f32]) -> Option<LoopRange> {
    let source = source?;
    match LoopExpression::parse(source) {
        Ok(expr) => {
            let range = expr.bind(times);
            if range.is_none() {
                warn!(expression = source, "loop expression needs at least two keyframes");
            }
            range
        }
        Err(err) => {
            warn!(expression = source, %err, "expression not supported, ignoring");
            None
        }
    }
}

#[derive(Debug, Clone)]
enum Track<T> {
    Static,
    Keyframed(KeyframeTrack<T>),
}

/// One animated attribute: a constant or a keyframed track, the value for the
/// last ticked frame, and whether that tick changed it.
#[derive(Debug, Clone)]
pub struct AnimatedProperty<T> {
    track: Track<T>,
    value: T,
    modified: bool,
    frame: Option<f32>,
    looping: Option<LoopRange>,
}

impl<T: Interpolatable> AnimatedProperty<T> {
    pub fn constant(value: T) -> Self {
        Self {
            track: Track::Static,
            value,
            modified: false,
            frame: None,
            looping: None,
        }
    }

    /// Builds from exported data, converting raw values with `convert`.
    /// Missing data yields `default`.
    pub fn from_property<S>(
        prop: &Property<S>,
        convert: impl Fn(&S) -> T,
        default: T,
        easing: &mut EasingRegistry,
    ) -> Self {
        match &prop.k {
            Value::Default => Self::constant(default),
            Value::Static(v) => Self::constant(convert(v)),
            Value::Animated(keyframes) => {
                let property = Self::from_keyframes(keyframes, &convert, default, easing);
                let looping = match &property.track {
                    Track::Keyframed(track) => bind_expression(prop.x.as_deref(), &track.times()),
                    Track::Static => None,
                };
                property.with_loop(looping)
            }
        }
    }

    pub fn from_keyframes<S>(
        keyframes: &[Keyframe<S>],
        convert: &impl Fn(&S) -> T,
        default: T,
        easing: &mut EasingRegistry,
    ) -> Self {
        let segments = build_segments(keyframes, convert, &default, easing);
        if segments.is_empty() {
            let value = keyframes
                .first()
                .and_then(|kf| kf.s.as_ref().map(convert))
                .unwrap_or(default);
            return Self::constant(value);
        }
        let value = segments[0].start.clone();
        Self {
            track: Track::Keyframed(KeyframeTrack::new(segments)),
            value,
            modified: false,
            frame: None,
            looping: None,
        }
    }

    /// Attaches a loop expression's frame remap.
    pub fn with_loop(mut self, looping: Option<LoopRange>) -> Self {
        self.looping = looping;
        self
    }

    /// Value as of the last `tick`.
    pub fn value(&self) -> &T {
        &self.value
    }

    pub fn is_animated(&self) -> bool {
        matches!(self.track, Track::Keyframed(_))
    }

    pub fn is_modified(&self) -> bool {
        self.modified
    }

    pub fn looping(&self) -> Option<&LoopRange> {
        self.looping.as_ref()
    }

    /// Frames spanned by the keyframes.
    pub fn keyframe_range(&self) -> Option<(f32, f32)> {
        match &self.track {
            Track::Static => None,
            Track::Keyframed(track) => {
                let s = track.segments();
                Some((s.first()?.start_frame, s.last()?.end_frame))
            }
        }
    }

    /// Index of the segment the cache currently points at.
    pub fn cached_segment(&self) -> Option<usize> {
        match &self.track {
            Track::Static => None,
            Track::Keyframed(track) => Some(track.cursor()),
        }
    }

    /// Value at `frame`. Does not change the ticked value; only the segment
    /// cache moves, so repeated calls return identical results.
    pub fn evaluate(&mut self, frame: f32) -> T {
        let frame = match &self.looping {
            Some(range) => range.remap(frame),
            None => frame,
        };
        match &mut self.track {
            Track::Static => self.value.clone(),
            Track::Keyframed(track) => match track.locate(frame) {
                Sample::Start => track.segments[0].start.clone(),
                Sample::End => track.segments[track.segments.len() - 1].end.clone(),
                Sample::Within { index, progress } => {
                    interpolate(&track.segments[index], progress)
                }
            },
        }
    }

    /// Motion direction in degrees at `frame`, for auto-orient.
    pub fn heading(&mut self, frame: f32) -> Option<f32> {
        let local = match &self.looping {
            Some(range) => range.remap(frame),
            None => frame,
        };
        if let Track::Keyframed(track) = &mut self.track {
            if let Sample::Within { index, progress } = track.locate(local) {
                let segment = &track.segments[index];
                if let (Some(path), Some(rate)) =
                    (&segment.spatial, path_rate(&segment.easing, progress))
                {
                    return Some(path.angle_at(rate));
                }
            }
        }
        // `evaluate` applies the loop remap itself
        let before = self.evaluate(frame - 0.01).planar()?;
        let after = self.evaluate(frame + 0.01).planar()?;
        let d = after - before;
        if d.length_squared() <= f32::EPSILON {
            return None;
        }
        Some(d.y.atan2(d.x).to_degrees())
    }
}

impl<T: Interpolatable> DynamicProperty for AnimatedProperty<T> {
    fn tick(&mut self, frame: f32) -> bool {
        if self.frame == Some(frame) {
            return self.modified;
        }
        let first = self.frame.is_none();
        self.frame = Some(frame);
        if !self.is_animated() {
            self.modified = first;
            return self.modified;
        }
        let next = self.evaluate(frame);
        self.modified = first || next != self.value;
        self.value = next;
        self.modified
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::{Vec2, Vec3};
    use lottie_data::model::BezierTangent;

    fn linear_position() -> AnimatedProperty<Vec2> {
        let mut registry = EasingRegistry::new();
        let prop = Property::animated(vec![
            Keyframe::at(0.0, [0.0, 0.0]),
            Keyframe::at(30.0, [100.0, 0.0]),
        ]);
        AnimatedProperty::from_property(&prop, |v| Vec2::from(*v), Vec2::ZERO, &mut registry)
    }

    #[test]
    fn linear_position_scenario() {
        let mut p = linear_position();
        assert_eq!(p.evaluate(15.0), Vec2::new(50.0, 0.0));
        assert_eq!(p.evaluate(-5.0), Vec2::new(0.0, 0.0));
        assert_eq!(p.evaluate(35.0), Vec2::new(100.0, 0.0));
    }

    #[test]
    fn evaluate_is_repeatable() {
        let mut p = linear_position();
        let a = p.evaluate(12.3);
        let b = p.evaluate(12.3);
        assert_eq!(a, b);
        assert_eq!(*p.value(), Vec2::ZERO);
    }

    #[test]
    fn binary_search_over_many_segments() {
        let mut registry = EasingRegistry::new();
        let keyframes = vec![
            Keyframe::at(0.0, 0.0),
            Keyframe::at(10.0, 100.0),
            Keyframe::at(20.0, 200.0),
        ];
        let mut p =
            AnimatedProperty::from_keyframes(&keyframes, &|v: &f32| *v, 0.0, &mut registry);
        assert_eq!(p.evaluate(5.0), 50.0);
        assert_eq!(p.evaluate(15.0), 150.0);
        assert_eq!(p.cached_segment(), Some(1));
        // seek backwards
        assert_eq!(p.evaluate(2.0), 20.0);
        assert_eq!(p.cached_segment(), Some(0));
        assert_eq!(p.evaluate(10.0), 100.0);
        assert_eq!(p.evaluate(20.0), 200.0);
        assert_eq!(p.evaluate(25.0), 200.0);
    }

    #[test]
    fn hold_keyframe_steps() {
        let mut registry = EasingRegistry::new();
        let mut held = Keyframe::at(0.0, 1.0);
        held.h = Some(1);
        let keyframes = vec![held, Keyframe::at(10.0, 5.0)];
        let mut p =
            AnimatedProperty::from_keyframes(&keyframes, &|v: &f32| *v, 0.0, &mut registry);
        for f in [0.0, 3.0, 9.99] {
            assert_eq!(p.evaluate(f), 1.0);
        }
        assert_eq!(p.evaluate(10.0), 5.0);
        assert_eq!(p.evaluate(50.0), 5.0);
    }

    #[test]
    fn out_of_order_keyframe_is_dropped() {
        let mut registry = EasingRegistry::new();
        let keyframes = vec![
            Keyframe::at(0.0, 0.0),
            Keyframe::at(10.0, 100.0),
            Keyframe::at(5.0, -50.0),
            Keyframe::at(20.0, 200.0),
        ];
        let segments = build_segments(&keyframes, &|v: &f32| *v, &0.0, &mut registry);
        let spans: Vec<(f32, f32)> = segments
            .iter()
            .map(|s| (s.start_frame, s.end_frame))
            .collect();
        assert_eq!(spans, vec![(0.0, 10.0), (10.0, 20.0)]);
        assert_eq!(segments[1].start, 100.0);

        let mut p =
            AnimatedProperty::from_keyframes(&keyframes, &|v: &f32| *v, 0.0, &mut registry);
        assert_eq!(p.evaluate(7.0), 70.0);
        assert_eq!(p.evaluate(15.0), 150.0);
    }

    #[test]
    fn keyframes_sharing_a_time_jump() {
        let mut registry = EasingRegistry::new();
        let keyframes = vec![
            Keyframe::at(0.0, 0.0),
            Keyframe::at(10.0, 10.0),
            Keyframe::at(10.0, 50.0),
            Keyframe::at(20.0, 60.0),
        ];
        let mut p =
            AnimatedProperty::from_keyframes(&keyframes, &|v: &f32| *v, 0.0, &mut registry);
        assert_eq!(p.evaluate(5.0), 5.0);
        assert_eq!(p.evaluate(15.0), 55.0);
    }

    #[test]
    fn legacy_end_values_are_used() {
        let mut registry = EasingRegistry::new();
        let mut first = Keyframe::at(0.0, 0.0);
        first.e = Some(10.0);
        let last: Keyframe<f32> = Keyframe {
            s: None,
            ..Keyframe::at(10.0, 0.0)
        };
        let mut p =
            AnimatedProperty::from_keyframes(&[first, last], &|v: &f32| *v, 0.0, &mut registry);
        assert_eq!(p.evaluate(5.0), 5.0);
        assert_eq!(p.evaluate(11.0), 10.0);
    }

    #[test]
    fn per_component_easing() {
        let mut registry = EasingRegistry::new();
        let mut kf = Keyframe::at(0.0, [0.0, 0.0, 0.0]);
        // x linear, y ease-in (slow start)
        kf.o = Some(BezierTangent {
            x: vec![0.0, 0.9],
            y: vec![0.0, 0.0],
        });
        kf.i = Some(BezierTangent {
            x: vec![1.0, 1.0],
            y: vec![1.0, 1.0],
        });
        let keyframes = vec![kf, Keyframe::at(10.0, [10.0, 10.0, 10.0])];
        let mut p = AnimatedProperty::from_keyframes(
            &keyframes,
            &|v: &[f32; 3]| Vec3::from(*v),
            Vec3::ZERO,
            &mut registry,
        );
        let v = p.evaluate(5.0);
        assert!((v.x - 5.0).abs() < 1e-4);
        assert!(v.y < 4.0);
        // z falls back to the first component's curve
        assert!((v.z - 5.0).abs() < 1e-4);
    }

    #[test]
    fn spatial_position_leaves_the_straight_line() {
        let mut registry = EasingRegistry::new();
        let mut kf = Keyframe::at(0.0, [0.0, 0.0, 0.0]);
        kf.to = Some(vec![0.0, -50.0, 0.0]);
        kf.ti = Some(vec![0.0, -50.0, 0.0]);
        let keyframes = vec![kf, Keyframe::at(10.0, [100.0, 0.0, 0.0])];
        let mut p = AnimatedProperty::from_keyframes(
            &keyframes,
            &|v: &[f32; 3]| Vec3::from(*v),
            Vec3::ZERO,
            &mut registry,
        );
        let mid = p.evaluate(5.0);
        assert!(mid.y < -30.0);
        assert!((mid.x - 50.0).abs() < 0.5);
        assert_eq!(p.evaluate(10.0), Vec3::new(100.0, 0.0, 0.0));
    }

    #[test]
    fn spatial_curve_survives_per_component_easing() {
        let mut registry = EasingRegistry::new();
        let mut kf = Keyframe::at(0.0, [0.0, 0.0, 0.0]);
        kf.to = Some(vec![0.0, -50.0, 0.0]);
        kf.ti = Some(vec![0.0, -50.0, 0.0]);
        // first component linear, second eased
        kf.o = Some(BezierTangent {
            x: vec![0.0, 0.9],
            y: vec![0.0, 0.0],
        });
        kf.i = Some(BezierTangent {
            x: vec![1.0, 1.0],
            y: vec![1.0, 1.0],
        });
        let keyframes = vec![kf, Keyframe::at(10.0, [100.0, 0.0, 0.0])];
        let mut p = AnimatedProperty::from_keyframes(
            &keyframes,
            &|v: &[f32; 3]| Vec3::from(*v),
            Vec3::ZERO,
            &mut registry,
        );
        let mid = p.evaluate(5.0);
        assert!(mid.y < -30.0, "left the arc: {mid:?}");
        assert!((mid.x - 50.0).abs() < 0.5);
        let heading = p.heading(5.0).unwrap();
        assert!(heading.abs() < 1.0, "got {heading}");
    }

    #[test]
    fn tick_reports_modification() {
        let mut p = linear_position();
        assert!(p.tick(0.0), "first tick always reports");
        assert!(!p.tick(-3.0), "clamped before start");
        assert!(p.tick(10.0));
        assert!(p.tick(10.0), "same frame keeps its flag");
        assert!(p.tick(40.0));
        assert_eq!(*p.value(), Vec2::new(100.0, 0.0));
        assert!(!p.tick(45.0), "clamped after end");

        let mut c = AnimatedProperty::constant(3.0_f32);
        assert!(c.tick(0.0));
        assert!(!c.tick(1.0));
    }

    #[test]
    fn cycle_expression_repeats() {
        let mut registry = EasingRegistry::new();
        let mut prop = Property::animated(vec![Keyframe::at(0.0, 0.0), Keyframe::at(20.0, 40.0)]);
        prop.x = Some("loopOut('cycle')".into());
        let mut p = AnimatedProperty::from_property(&prop, |v: &f32| *v, 0.0, &mut registry);
        let at_end = p.evaluate(20.0);
        for k in 0..5 {
            assert_eq!(p.evaluate(20.0 + 20.0 * k as f32), at_end);
        }
        assert_eq!(p.evaluate(25.0), 10.0);
    }

    #[test]
    fn pingpong_expression_reflects() {
        let mut registry = EasingRegistry::new();
        let mut prop = Property::animated(vec![Keyframe::at(0.0, 0.0), Keyframe::at(20.0, 40.0)]);
        prop.x = Some("loopOut('pingpong')".into());
        let mut p = AnimatedProperty::from_property(&prop, |v: &f32| *v, 0.0, &mut registry);
        for d in [0.0, 2.5, 10.0, 20.0] {
            let ahead = p.evaluate(20.0 + d);
            let behind = p.evaluate(20.0 - d);
            assert_eq!(ahead, behind);
        }
    }

    #[test]
    fn pingpong_heading_reverses_on_the_way_back() {
        let mut registry = EasingRegistry::new();
        let mut prop = Property::animated(vec![
            Keyframe::at(0.0, [0.0, 0.0]),
            Keyframe::at(10.0, [100.0, 0.0]),
            Keyframe::at(20.0, [100.0, 100.0]),
        ]);
        prop.x = Some("loopOut('pingpong')".into());
        let mut p =
            AnimatedProperty::from_property(&prop, |v| Vec2::from(*v), Vec2::ZERO, &mut registry);
        let forward = p.heading(15.0).unwrap();
        assert!((forward - 90.0).abs() < 1e-3, "got {forward}");
        // frame 25 replays frame 15 in reverse
        let back = p.heading(25.0).unwrap();
        assert!((back + 90.0).abs() < 1e-3, "got {back}");
    }

    #[test]
    fn attached_loop_remaps_keyframes() {
        let mut registry = EasingRegistry::new();
        let keyframes = vec![Keyframe::at(0.0, 0.0), Keyframe::at(20.0, 40.0)];
        let looping = LoopExpression::parse("loopOut('cycle')")
            .unwrap()
            .bind(&[0.0, 20.0]);
        assert!(looping.is_some());
        let mut p = AnimatedProperty::from_keyframes(&keyframes, &|v: &f32| *v, 0.0, &mut registry)
            .with_loop(looping);
        assert_eq!(p.evaluate(25.0), 10.0);
    }

    #[test]
    fn unsupported_expression_is_ignored() {
        let mut registry = EasingRegistry::new();
        let mut prop = Property::animated(vec![Keyframe::at(0.0, 0.0), Keyframe::at(20.0, 40.0)]);
        prop.x = Some("wiggle(3, 30)".into());
        let mut p = AnimatedProperty::from_property(&prop, |v: &f32| *v, 0.0, &mut registry);
        assert!(p.looping().is_none());
        assert_eq!(p.evaluate(30.0), 40.0);
    }

    #[test]
    fn easing_curves_are_shared_through_registry() {
        let mut registry = EasingRegistry::new();
        let mut kf = Keyframe::at(0.0, 0.0);
        kf.o = Some(BezierTangent::new(0.33, 0.0));
        kf.i = Some(BezierTangent::new(0.67, 1.0));
        let mut kf2 = Keyframe::at(10.0, 10.0);
        kf2.o = Some(BezierTangent::new(0.33, 0.0));
        kf2.i = Some(BezierTangent::new(0.67, 1.0));
        let keyframes = vec![kf, kf2, Keyframe::at(20.0, 0.0)];
        let _a = AnimatedProperty::from_keyframes(&keyframes, &|v: &f32| *v, 0.0, &mut registry);
        let _b = AnimatedProperty::from_keyframes(&keyframes, &|v: &f32| *v, 0.0, &mut registry);
        assert_eq!(registry.len(), 1);
    }
}
