//! Playback of one loaded document: the timeline state machine that turns
//! wall-clock deltas into frames and drives the node tree.

use crate::assets::AssetTracker;
use crate::composition::{BuildContext, Composition, LayerState};
use crate::error::{Result, RuntimeError};
use crate::pool::Resources;
use crate::renderer::RenderTree;
use crate::shapes::GroupState;
use lottie_data::model as data;
use serde::Deserialize;
use tracing::{debug, info};

/// A sub-range to play: explicit frames or a marker name.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum SegmentSpec {
    Range([f32; 2]),
    Marker(String),
}

impl From<&str> for SegmentSpec {
    fn from(name: &str) -> Self {
        SegmentSpec::Marker(name.to_string())
    }
}

impl From<[f32; 2]> for SegmentSpec {
    fn from(range: [f32; 2]) -> Self {
        SegmentSpec::Range(range)
    }
}

/// Playback configuration. Every field has a default, so an empty JSON
/// object is a valid configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct PlayOptions {
    pub time_scale: f32,
    /// `1` forward, `-1` backward.
    pub direction: i8,
    /// Extra plays after the first.
    pub repeats: u32,
    pub infinite: bool,
    /// Reverse direction on every repeat instead of wrapping.
    pub alternate: bool,
    /// Seconds to hold before the first play.
    pub wait: f32,
    /// Seconds to hold before every play, repeats included.
    pub delay: f32,
    /// Keep advancing past the end once no repeats remain.
    pub overlap: bool,
    pub autoplay: bool,
    pub segment: Option<SegmentSpec>,
}

impl Default for PlayOptions {
    fn default() -> Self {
        Self {
            time_scale: 1.0,
            direction: 1,
            repeats: 0,
            infinite: false,
            alternate: false,
            wait: 0.0,
            delay: 0.0,
            overlap: false,
            autoplay: true,
            segment: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AnimationEvent {
    /// The playhead crossed into a new whole document frame.
    EnterFrame(i32),
    /// One play ended and a repeat began.
    LoopComplete,
    /// The last play ended. Emitted once per play-through.
    Complete,
    SegmentStart { begin: f32, end: f32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    Waiting,
    Delaying,
    Playing,
    Paused,
    Finished,
}

/// A document, its evaluated node tree and the playhead driving it.
#[derive(Debug)]
pub struct AnimationGroup {
    document: data::Document,
    composition: Composition,
    resources: Resources,
    assets: AssetTracker,
    options: PlayOptions,
    begin_frame: f32,
    end_frame: f32,
    /// Direction a fresh play starts in; negative for reversed segments.
    initial_direction: f32,
    frame_num: f32,
    direction: f32,
    repeats_remaining: u32,
    delay_remaining: f32,
    wait_remaining: f32,
    alive: bool,
    paused: bool,
    completed: bool,
    events: Vec<AnimationEvent>,
}

impl AnimationGroup {
    pub fn from_json(text: &str, options: PlayOptions) -> Result<Self> {
        let document = data::Document::from_json(text)?;
        Self::new(document, options)
    }

    pub fn new(document: data::Document, options: PlayOptions) -> Result<Self> {
        Self::with_resources(document, options, Resources::new())
    }

    /// Builds the group around caches shared with other groups.
    pub fn with_resources(
        document: data::Document,
        options: PlayOptions,
        mut resources: Resources,
    ) -> Result<Self> {
        let mut context = BuildContext::new(&document, &mut resources);
        let composition = Composition::build(&document.layers, &mut context);
        let assets = AssetTracker::from_document(&document);
        info!(
            name = ?document.nm,
            frames = document.duration(),
            frame_rate = document.fr,
            layers = document.layers.len(),
            images = assets.total(),
            "loaded animation"
        );

        let (begin_frame, end_frame) = (document.ip, document.op);
        let mut group = Self {
            document,
            composition,
            resources,
            assets,
            paused: !options.autoplay,
            options,
            begin_frame,
            end_frame,
            initial_direction: 1.0,
            frame_num: 0.0,
            direction: 1.0,
            repeats_remaining: 0,
            delay_remaining: 0.0,
            wait_remaining: 0.0,
            alive: true,
            completed: false,
            events: Vec::new(),
        };
        match group.options.segment.clone() {
            Some(segment) => group.set_segment(&segment)?,
            None => group.set_range(begin_frame, end_frame),
        }
        group.reset();
        group.evaluate();
        Ok(group)
    }

    fn frames(&self, seconds: f32) -> f32 {
        let frames = seconds * self.document.fr;
        if frames.is_finite() && frames > 0.0 {
            frames
        } else {
            0.0
        }
    }

    /// Frames in the active segment.
    pub fn duration(&self) -> f32 {
        (self.end_frame - self.begin_frame).max(0.0)
    }

    fn set_range(&mut self, begin: f32, end: f32) {
        if begin <= end {
            self.begin_frame = begin;
            self.end_frame = end;
            self.initial_direction = 1.0;
        } else {
            self.begin_frame = end;
            self.end_frame = begin;
            self.initial_direction = -1.0;
        }
        if self.options.direction < 0 {
            self.initial_direction = -self.initial_direction;
        }
    }

    fn set_segment(&mut self, segment: &SegmentSpec) -> Result<()> {
        let (begin, end) = match segment {
            SegmentSpec::Range([begin, end]) => (*begin, *end),
            SegmentSpec::Marker(name) => {
                let marker = self
                    .document
                    .marker(name)
                    .ok_or_else(|| RuntimeError::UnknownSegment(name.clone()))?;
                let begin = marker.tm.unwrap_or(self.document.ip);
                let end = match marker.dr {
                    Some(dr) if dr > 0.0 => begin + dr,
                    _ => self.document.op,
                };
                (begin, end)
            }
        };
        if !begin.is_finite() || !end.is_finite() || begin == end {
            return Err(RuntimeError::InvalidSegment { begin, end });
        }
        self.set_range(begin, end);
        Ok(())
    }

    /// Resets the playhead and budgets for a fresh play.
    fn reset(&mut self) {
        self.direction = self.initial_direction;
        self.frame_num = if self.direction > 0.0 {
            0.0
        } else {
            self.duration()
        };
        self.repeats_remaining = self.options.repeats;
        self.wait_remaining = self.frames(self.options.wait);
        self.delay_remaining = self.frames(self.options.delay);
        self.alive = true;
        self.completed = false;
    }

    pub fn play(&mut self) {
        if self.completed && !self.options.overlap {
            self.replay();
            return;
        }
        self.paused = false;
    }

    pub fn pause(&mut self) {
        self.paused = true;
    }

    pub fn resume(&mut self) {
        self.paused = false;
    }

    /// Starts over from the beginning of the active segment.
    pub fn replay(&mut self) {
        self.reset();
        self.paused = false;
        self.evaluate();
    }

    /// Playback speed multiplier. Non-finite or negative values are ignored;
    /// use [`Self::set_direction`] to reverse.
    pub fn set_speed(&mut self, scale: f32) {
        if scale.is_finite() && scale >= 0.0 {
            self.options.time_scale = scale;
        } else {
            debug!(scale, "ignoring invalid playback speed");
        }
    }

    pub fn set_direction(&mut self, direction: i8) {
        self.direction = if direction < 0 { -1.0 } else { 1.0 };
    }

    /// Switches to another segment and replays it. `options`, when given,
    /// replace the current ones.
    pub fn play_segment(
        &mut self,
        segment: impl Into<SegmentSpec>,
        options: Option<PlayOptions>,
    ) -> Result<()> {
        let segment = segment.into();
        let previous = (
            self.options.clone(),
            self.begin_frame,
            self.end_frame,
            self.initial_direction,
        );
        if let Some(options) = options {
            self.options = options;
        }
        if let Err(err) = self.set_segment(&segment) {
            (
                self.options,
                self.begin_frame,
                self.end_frame,
                self.initial_direction,
            ) = previous;
            return Err(err);
        }
        self.options.segment = Some(segment);
        let (begin, end) = if self.initial_direction > 0.0 {
            (self.begin_frame, self.end_frame)
        } else {
            (self.end_frame, self.begin_frame)
        };
        debug!(begin, end, "segment start");
        self.events.push(AnimationEvent::SegmentStart { begin, end });
        self.replay();
        Ok(())
    }

    /// Advances by `dt` seconds and evaluates the tree. Returns whether any
    /// node changed.
    pub fn tick(&mut self, dt: f32) -> bool {
        if !self.assets.is_settled() {
            return self.evaluate();
        }
        let step = (dt * self.document.fr * self.options.time_scale).abs();
        if !step.is_finite() {
            return self.evaluate();
        }

        if self.wait_remaining > 0.0 {
            consume(&mut self.wait_remaining, step);
            return self.evaluate();
        }
        if self.paused || !self.alive {
            return self.evaluate();
        }
        if self.delay_remaining > 0.0 {
            consume(&mut self.delay_remaining, step);
            return self.evaluate();
        }

        let before = self.current_frame();
        self.frame_num += step * self.direction;
        let mark = self.events.len();
        let wrap = self.handle_boundary();
        let after = self.current_frame();

        // frames crossed before the boundary precede the loop/complete events
        let mut crossed = Vec::new();
        push_enter_frames(&mut crossed, before, wrap.map_or(after, |w| w.boundary));
        self.events.splice(mark..mark, crossed);
        if let Some(Wrap { boundary, restart }) = wrap {
            if restart.floor() != boundary.floor() {
                self.events.push(AnimationEvent::EnterFrame(restart.floor() as i32));
            }
            push_enter_frames(&mut self.events, restart, after);
        }
        self.evaluate()
    }

    /// Moves the playhead to document frame `frame`, clamped to the active
    /// segment, and evaluates there. Counters and events are untouched.
    pub fn go_to_frame(&mut self, frame: f32) -> bool {
        if frame.is_finite() {
            self.frame_num = (frame - self.begin_frame).clamp(0.0, self.duration());
        }
        self.evaluate()
    }

    /// Applies repeat, alternate, overlap or completion once the playhead
    /// leaves the segment. Returns where a loop left and re-entered it.
    fn handle_boundary(&mut self) -> Option<Wrap> {
        let duration = self.duration();
        let spilled = if self.direction > 0.0 {
            self.frame_num >= duration
        } else {
            self.frame_num <= 0.0
        };
        if !spilled {
            return None;
        }

        if self.options.infinite || self.repeats_remaining > 0 {
            let boundary = if self.direction > 0.0 {
                self.end_frame
            } else {
                self.begin_frame
            };
            if !self.options.infinite {
                self.repeats_remaining -= 1;
            }
            self.delay_remaining = self.frames(self.options.delay);
            if self.options.alternate {
                self.frame_num = if self.direction > 0.0 {
                    2.0 * duration - self.frame_num
                } else {
                    -self.frame_num
                }
                .clamp(0.0, duration);
                self.direction = -self.direction;
            } else {
                self.direction = self.initial_direction;
                self.frame_num = if duration > 0.0 {
                    self.frame_num.rem_euclid(duration)
                } else {
                    0.0
                };
                if self.direction < 0.0 && self.frame_num == 0.0 {
                    self.frame_num = duration;
                }
            }
            debug!(
                repeats_remaining = self.repeats_remaining,
                direction = self.direction,
                "loop complete"
            );
            self.events.push(AnimationEvent::LoopComplete);
            let restart = if self.options.alternate {
                boundary
            } else if self.direction > 0.0 {
                self.begin_frame
            } else {
                self.end_frame
            };
            return Some(Wrap { boundary, restart });
        }

        if !self.options.overlap {
            self.frame_num = if self.direction > 0.0 { duration } else { 0.0 };
            self.alive = false;
        }
        if !self.completed {
            self.completed = true;
            debug!(frame = self.current_frame(), "complete");
            self.events.push(AnimationEvent::Complete);
        }
        None
    }

    fn evaluate(&mut self) -> bool {
        let frame = self.current_frame();
        self.composition
            .update(frame, self.options.overlap, &mut self.resources)
    }

    /// Document frame under the playhead.
    pub fn current_frame(&self) -> f32 {
        self.begin_frame + self.frame_num
    }

    /// Playhead offset from the start of the active segment.
    pub fn frame_num(&self) -> f32 {
        self.frame_num
    }

    pub fn direction(&self) -> f32 {
        self.direction
    }

    pub fn repeats_remaining(&self) -> u32 {
        self.repeats_remaining
    }

    pub fn segment(&self) -> (f32, f32) {
        (self.begin_frame, self.end_frame)
    }

    pub fn is_alive(&self) -> bool {
        self.alive
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn is_complete(&self) -> bool {
        self.completed
    }

    pub fn state(&self) -> PlaybackState {
        if self.completed {
            PlaybackState::Finished
        } else if self.wait_remaining > 0.0 {
            PlaybackState::Waiting
        } else if self.paused {
            PlaybackState::Paused
        } else if self.delay_remaining > 0.0 {
            PlaybackState::Delaying
        } else {
            PlaybackState::Playing
        }
    }

    pub fn options(&self) -> &PlayOptions {
        &self.options
    }

    /// Takes the events accumulated since the last call.
    pub fn drain_events(&mut self) -> Vec<AnimationEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn document(&self) -> &data::Document {
        &self.document
    }

    pub fn composition(&self) -> &Composition {
        &self.composition
    }

    pub fn assets(&self) -> &AssetTracker {
        &self.assets
    }

    pub fn assets_mut(&mut self) -> &mut AssetTracker {
        &mut self.assets
    }

    pub fn resources(&self) -> &Resources {
        &self.resources
    }

    pub fn find(&self, path: &str) -> Option<LayerState> {
        self.composition.find(path)
    }

    pub fn find_shape_group(&self, layer_path: &str, group_path: &str) -> Option<GroupState> {
        self.composition.find_shape_group(layer_path, group_path)
    }

    /// Snapshot of the last evaluated frame.
    pub fn render_tree(&self) -> RenderTree {
        RenderTree {
            width: self.document.w as f32,
            height: self.document.h as f32,
            frame: self.current_frame(),
            root: self.composition.render(&self.resources.pool, &self.assets),
        }
    }

    /// Tears the tree down and hands back the shared caches.
    pub fn into_resources(mut self) -> Resources {
        self.composition.release(&mut self.resources.pool);
        self.resources
    }
}

/// Most `EnterFrame` events one crossing may emit. Longer jumps only report
/// the frame they land on.
const MAX_ENTER_FRAMES: i64 = 1024;

/// Document frames where a loop left the segment and where it came back in.
#[derive(Debug, Clone, Copy)]
struct Wrap {
    boundary: f32,
    restart: f32,
}

/// Pushes one `EnterFrame` per whole frame crossed moving from `from` to
/// `to`, in the order they were crossed.
fn push_enter_frames(events: &mut Vec<AnimationEvent>, from: f32, to: f32) {
    let (start, end) = (from.floor() as i64, to.floor() as i64);
    if start == end {
        return;
    }
    if (end - start).abs() > MAX_ENTER_FRAMES {
        events.push(AnimationEvent::EnterFrame(end as i32));
        return;
    }
    if end > start {
        events.extend((start + 1..=end).map(|f| AnimationEvent::EnterFrame(f as i32)));
    } else {
        events.extend((end..start).rev().map(|f| AnimationEvent::EnterFrame(f as i32)));
    }
}

/// Spends `step` frames of a hold budget. Float residue from summing
/// fractional deltas does not count as time left.
fn consume(budget: &mut f32, step: f32) {
    *budget -= step;
    if *budget < 1e-3 {
        *budget = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn group(options: PlayOptions) -> AnimationGroup {
        let document: data::Document = serde_json::from_value(json!({
            "ip": 0, "op": 30, "fr": 30, "w": 10, "h": 10, "layers": [],
            "markers": [{"cm": "intro", "tm": 5, "dr": 10}]
        }))
        .unwrap();
        AnimationGroup::new(document, options).unwrap()
    }

    const FRAME: f32 = 1.0 / 30.0;

    #[test]
    fn options_deserialize_with_defaults() {
        let options: PlayOptions =
            serde_json::from_value(json!({"repeats": 2, "segment": "intro"})).unwrap();
        assert_eq!(options.repeats, 2);
        assert_eq!(options.time_scale, 1.0);
        assert!(options.autoplay);
        assert_eq!(options.segment, Some(SegmentSpec::Marker("intro".into())));

        let range: PlayOptions = serde_json::from_value(json!({"segment": [10, 0]})).unwrap();
        assert_eq!(range.segment, Some(SegmentSpec::Range([10.0, 0.0])));
    }

    #[test]
    fn wait_is_consumed_before_playing() {
        let mut g = group(PlayOptions {
            wait: 5.0 * FRAME,
            ..Default::default()
        });
        assert_eq!(g.state(), PlaybackState::Waiting);
        for _ in 0..5 {
            g.tick(FRAME);
        }
        assert_eq!(g.frame_num(), 0.0);
        assert_eq!(g.state(), PlaybackState::Playing);
        g.tick(FRAME);
        assert!(g.frame_num() > 0.0);
    }

    #[test]
    fn pause_holds_the_playhead() {
        let mut g = group(PlayOptions::default());
        g.tick(FRAME * 3.0);
        g.pause();
        let frame = g.frame_num();
        g.tick(FRAME * 3.0);
        assert_eq!(g.frame_num(), frame);
        g.resume();
        g.tick(FRAME);
        assert!(g.frame_num() > frame);
    }

    #[test]
    fn autoplay_off_starts_paused() {
        let mut g = group(PlayOptions {
            autoplay: false,
            ..Default::default()
        });
        g.tick(FRAME);
        assert_eq!(g.frame_num(), 0.0);
        g.play();
        g.tick(FRAME);
        assert!(g.frame_num() > 0.0);
    }

    #[test]
    fn marker_segments_resolve() {
        let mut g = group(PlayOptions::default());
        g.play_segment("intro", None).unwrap();
        assert_eq!(g.segment(), (5.0, 15.0));
        assert_eq!(g.current_frame(), 5.0);
        assert_eq!(
            g.drain_events(),
            vec![AnimationEvent::SegmentStart {
                begin: 5.0,
                end: 15.0
            }]
        );

        let err = g.play_segment("outro", None).unwrap_err();
        assert!(matches!(err, RuntimeError::UnknownSegment(name) if name == "outro"));
        assert_eq!(g.segment(), (5.0, 15.0));

        assert!(matches!(
            g.play_segment([3.0, 3.0], None),
            Err(RuntimeError::InvalidSegment { .. })
        ));
    }

    #[test]
    fn reversed_range_plays_backwards() {
        let mut g = group(PlayOptions::default());
        g.play_segment([20.0, 10.0], None).unwrap();
        assert_eq!(g.current_frame(), 20.0);
        assert_eq!(g.direction(), -1.0);
        g.tick(FRAME * 4.0);
        assert!((g.current_frame() - 16.0).abs() < 1e-4);
    }

    #[test]
    fn speed_scales_frame_delta() {
        let mut g = group(PlayOptions::default());
        g.set_speed(2.0);
        g.tick(FRAME);
        assert!((g.frame_num() - 2.0).abs() < 1e-4);
        g.set_speed(-1.0);
        assert_eq!(g.options().time_scale, 2.0);
    }
}
