//! Frame-accurate evaluation and playback of Lottie (Bodymovin) animations.
//!
//! An [`AnimationGroup`] owns a parsed document, the node tree built from it
//! and the playhead. Each [`AnimationGroup::tick`] advances the playhead and
//! re-evaluates only what changed; [`AnimationGroup::render_tree`] snapshots
//! the resolved transforms, paths and paints for a renderer.

pub mod animatable;
pub mod animation;
pub mod assets;
pub mod composition;
pub mod container;
pub mod easing;
pub mod error;
pub mod expressions;
pub mod geometry;
pub mod layer;
pub mod modifiers;
pub mod pool;
pub mod property;
pub mod renderer;
pub mod shapes;
pub mod styles;
pub mod transform;

pub use animation::{AnimationEvent, AnimationGroup, PlayOptions, PlaybackState, SegmentSpec};
pub use assets::{AssetState, AssetTracker};
pub use composition::{Composition, LayerState};
pub use container::{DynamicProperty, DynamicPropertyContainer};
pub use easing::{BezierEasing, EasingRegistry};
pub use error::{Result, RuntimeError};
pub use geometry::{ShapeGeometry, ShapePath};
pub use pool::{PathHandle, PathPool, Resources};
pub use property::AnimatedProperty;
pub use renderer::{RenderNode, RenderTree};
pub use shapes::{GroupState, RepeaterStats, ShapeContent};
pub use transform::{TransformChain, TransformProperties};

pub use lottie_data::model as data;
