//! One layer of a composition: its timing, masks and kind-specific content.
//!
//! Layer transforms live in the owning composition's transform store so that
//! parenting can share chains; a layer only keeps the ids.

use crate::assets::AssetTracker;
use crate::composition::{BuildContext, Composition};
use crate::container::{DynamicProperty, DynamicPropertyContainer};
use crate::easing::EasingRegistry;
use crate::geometry::ShapeProperty;
use crate::pool::{PathPool, Resources};
use crate::property::AnimatedProperty;
use crate::renderer::{Image, Mask, MaskMode, NodeContent, RenderNode};
use crate::shapes::ShapeContent;
use crate::transform::{ChainCache, ChainId, TransformId, TransformStore};
use glam::{Mat3, Vec4};
use lottie_data::model::{self as data, LayerKind};
use tracing::warn;

/// A mask resolved against the layer's own timeline.
#[derive(Debug, Clone)]
pub struct LayerMask {
    mode: MaskMode,
    inverted: bool,
    path: ShapeProperty,
    opacity: AnimatedProperty<f32>,
    expansion: AnimatedProperty<f32>,
}

impl LayerMask {
    /// `None` for mask modes the runtime does not know.
    pub fn from_data(mask: &data::MaskProperties, easing: &mut EasingRegistry) -> Option<Self> {
        let mode = match mask.mode.as_deref() {
            Some("n") => MaskMode::None,
            Some("a") | None => MaskMode::Add,
            Some("s") => MaskMode::Subtract,
            Some("i") => MaskMode::Intersect,
            Some("l") => MaskMode::Lighten,
            Some("d") => MaskMode::Darken,
            Some("f") => MaskMode::Difference,
            Some(other) => {
                warn!(mode = other, name = ?mask.nm, "unknown mask mode, skipping");
                return None;
            }
        };
        Some(Self {
            mode,
            inverted: mask.inv,
            path: ShapeProperty::from_property(&mask.pt, easing),
            opacity: AnimatedProperty::from_property(&mask.o, |v| *v, 100.0, easing),
            expansion: AnimatedProperty::from_property(&mask.x, |v| *v, 0.0, easing),
        })
    }

    pub fn resolve(&self) -> Mask {
        Mask {
            mode: self.mode,
            inverted: self.inverted,
            path: self.path.value().to_bez_path(),
            opacity: (self.opacity.value() / 100.0).clamp(0.0, 1.0),
            expansion: *self.expansion.value(),
        }
    }
}

impl DynamicProperty for LayerMask {
    fn tick(&mut self, frame: f32) -> bool {
        self.path.tick(frame) | self.opacity.tick(frame) | self.expansion.tick(frame)
    }
}

#[derive(Debug, Clone)]
pub enum LayerContent {
    Shapes(ShapeContent),
    Precomp {
        composition: Box<Composition>,
        time_remap: Option<AnimatedProperty<f32>>,
    },
    Image {
        asset_id: String,
        width: f32,
        height: f32,
    },
    Solid {
        color: Vec4,
        width: f32,
        height: f32,
    },
    /// Null layers, text layers and anything that failed to resolve.
    Empty,
}

/// Visibility and time mapping of one layer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayerTiming {
    pub in_point: f32,
    pub out_point: f32,
    pub start_time: f32,
    pub stretch: f32,
}

impl LayerTiming {
    pub fn from_data(layer: &data::Layer) -> Self {
        let stretch = if layer.sr.is_finite() && layer.sr != 0.0 {
            layer.sr
        } else {
            1.0
        };
        Self {
            in_point: layer.ip,
            out_point: layer.op,
            start_time: layer.st,
            stretch,
        }
    }

    /// `[ip, op)`, or unbounded above when the timeline overlaps its end.
    pub fn is_active(&self, frame: f32, overlap: bool) -> bool {
        frame >= self.in_point && (overlap || frame < self.out_point)
    }

    /// Frame of nested content for a frame of the enclosing composition.
    pub fn local_frame(&self, frame: f32) -> f32 {
        (frame - self.start_time) / self.stretch
    }
}

#[derive(Debug, Clone)]
pub struct Layer {
    name: Option<String>,
    index: Option<u32>,
    parent: Option<u32>,
    hidden: bool,
    timing: LayerTiming,
    frame_rate: f32,
    transform: TransformId,
    chain: Option<ChainId>,
    masks: DynamicPropertyContainer<LayerMask>,
    content: LayerContent,
    visible: bool,
}

impl Layer {
    pub(crate) fn build(
        layer: &data::Layer,
        transform: TransformId,
        context: &mut BuildContext<'_>,
    ) -> Self {
        let easing = &mut context.resources.easing;
        let mut masks = DynamicPropertyContainer::new();
        for mask in layer.masks_properties.iter().flatten() {
            if let Some(mask) = LayerMask::from_data(mask, easing) {
                masks.add_property(mask);
            }
        }
        let content = Self::build_content(layer, context);
        Self {
            name: layer.nm.clone(),
            index: layer.ind,
            parent: layer.parent,
            hidden: layer.is_hidden(),
            timing: LayerTiming::from_data(layer),
            frame_rate: context.document.fr,
            transform,
            chain: None,
            masks,
            content,
            visible: false,
        }
    }

    fn build_content(layer: &data::Layer, context: &mut BuildContext<'_>) -> LayerContent {
        let name = layer.nm.as_deref();
        let document = context.document;
        match layer.kind() {
            LayerKind::Shape => LayerContent::Shapes(ShapeContent::build(
                layer.shapes.as_deref().unwrap_or_default(),
                context.resources,
            )),
            LayerKind::PreComp => {
                let Some(ref_id) = layer.ref_id.as_deref() else {
                    warn!(layer = name, "precomposition layer without refId");
                    return LayerContent::Empty;
                };
                let Some(layers) = document.asset(ref_id).and_then(|a| a.layers.as_ref())
                else {
                    warn!(layer = name, asset = ref_id, "missing precomposition asset");
                    return LayerContent::Empty;
                };
                if context.nesting.iter().any(|id| id == ref_id) {
                    warn!(layer = name, asset = ref_id, "precomposition references itself");
                    return LayerContent::Empty;
                }
                let time_remap = layer.tm.as_ref().map(|tm| {
                    AnimatedProperty::from_property(tm, |v| *v, 0.0, &mut context.resources.easing)
                });
                context.nesting.push(ref_id.to_string());
                let composition = Composition::build(layers, context);
                context.nesting.pop();
                LayerContent::Precomp {
                    composition: Box::new(composition),
                    time_remap,
                }
            }
            LayerKind::Image => {
                let asset = layer
                    .ref_id
                    .as_deref()
                    .and_then(|id| document.asset(id))
                    .filter(|a| a.is_image());
                match asset {
                    Some(asset) => LayerContent::Image {
                        asset_id: asset.id.clone(),
                        width: asset.w.unwrap_or(0) as f32,
                        height: asset.h.unwrap_or(0) as f32,
                    },
                    None => {
                        warn!(layer = name, asset = ?layer.ref_id, "missing image asset");
                        LayerContent::Empty
                    }
                }
            }
            LayerKind::Solid => {
                let color = layer.color.as_deref().and_then(parse_hex_color);
                if color.is_none() {
                    warn!(layer = name, color = ?layer.color, "invalid solid color, using black");
                }
                LayerContent::Solid {
                    color: color.unwrap_or(Vec4::new(0.0, 0.0, 0.0, 1.0)),
                    width: layer.sw.unwrap_or(0) as f32,
                    height: layer.sh.unwrap_or(0) as f32,
                }
            }
            LayerKind::Null => LayerContent::Empty,
            LayerKind::Text => {
                warn!(layer = name, "text layers are not rendered");
                LayerContent::Empty
            }
            LayerKind::Unknown(ty) => {
                warn!(layer = name, ty, "unknown layer type");
                LayerContent::Empty
            }
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn index(&self) -> Option<u32> {
        self.index
    }

    pub fn parent(&self) -> Option<u32> {
        self.parent
    }

    pub fn timing(&self) -> LayerTiming {
        self.timing
    }

    pub fn transform(&self) -> TransformId {
        self.transform
    }

    pub(crate) fn set_chain(&mut self, chain: ChainId) {
        self.chain = Some(chain);
    }

    pub fn chain(&self) -> Option<ChainId> {
        self.chain
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn content(&self) -> &LayerContent {
        &self.content
    }

    pub fn shapes(&self) -> Option<&ShapeContent> {
        match &self.content {
            LayerContent::Shapes(shapes) => Some(shapes),
            _ => None,
        }
    }

    pub fn precomp(&self) -> Option<&Composition> {
        match &self.content {
            LayerContent::Precomp { composition, .. } => Some(composition),
            _ => None,
        }
    }

    /// Evaluates masks and content at `frame` of the enclosing composition.
    /// The layer's transform has already been ticked by its owner.
    pub fn update(&mut self, frame: f32, overlap: bool, resources: &mut Resources) -> bool {
        let visible = !self.hidden && self.timing.is_active(frame, overlap);
        let mut modified = visible != self.visible;
        self.visible = visible;
        if !visible {
            return modified;
        }

        modified |= self.masks.tick(frame);
        match &mut self.content {
            LayerContent::Shapes(shapes) => modified |= shapes.update(frame, resources),
            LayerContent::Precomp {
                composition,
                time_remap,
            } => {
                let local = match time_remap {
                    Some(tm) => {
                        modified |= tm.tick(frame);
                        tm.value() * self.frame_rate
                    }
                    None => self.timing.local_frame(frame),
                };
                modified |= composition.update(local, overlap, resources);
            }
            LayerContent::Image { .. } | LayerContent::Solid { .. } | LayerContent::Empty => {}
        }
        modified
    }

    pub(crate) fn render(
        &self,
        transforms: &TransformStore,
        chains: &ChainCache,
        pool: &PathPool,
        assets: &AssetTracker,
    ) -> RenderNode {
        let matrix = self
            .chain
            .map(|c| chains.matrix(c))
            .unwrap_or(Mat3::IDENTITY);
        let content = if !self.visible {
            NodeContent::Empty
        } else {
            match &self.content {
                LayerContent::Shapes(shapes) => NodeContent::Shapes(shapes.draws(pool)),
                LayerContent::Precomp { composition, .. } => {
                    NodeContent::Group(composition.render_children(pool, assets))
                }
                LayerContent::Image {
                    asset_id,
                    width,
                    height,
                } => {
                    let image = assets.image(asset_id);
                    NodeContent::Image(Image {
                        asset_id: asset_id.clone(),
                        width: *width,
                        height: *height,
                        data: image.and_then(|i| i.data.clone()),
                        path: image.and_then(|i| i.path.clone()),
                    })
                }
                LayerContent::Solid {
                    color,
                    width,
                    height,
                } => NodeContent::Solid {
                    color: *color,
                    width: *width,
                    height: *height,
                },
                LayerContent::Empty => NodeContent::Empty,
            }
        };
        RenderNode {
            name: self.name.clone(),
            matrix,
            // parents pass on their matrix but not their opacity
            opacity: transforms.opacity(self.transform),
            visible: self.visible,
            content,
            masks: if self.visible {
                self.masks.iter().map(LayerMask::resolve).collect()
            } else {
                Vec::new()
            },
        }
    }

    pub fn release(&mut self, pool: &mut PathPool) {
        match &mut self.content {
            LayerContent::Shapes(shapes) => shapes.release(pool),
            LayerContent::Precomp { composition, .. } => composition.release(pool),
            _ => {}
        }
    }
}

/// `#rrggbb` to an opaque color.
pub fn parse_hex_color(text: &str) -> Option<Vec4> {
    let hex = text.trim().trim_start_matches('#');
    if hex.len() != 6 || !hex.is_ascii() {
        return None;
    }
    let channel = |i: usize| {
        u8::from_str_radix(&hex[i..i + 2], 16)
            .ok()
            .map(|v| v as f32 / 255.0)
    };
    Some(Vec4::new(channel(0)?, channel(2)?, channel(4)?, 1.0))
}
