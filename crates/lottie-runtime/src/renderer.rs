//! Frame snapshot handed to a rendering back end.
//!
//! Nothing here is evaluated; every value is already resolved for the frame
//! the tree was built at.

use glam::{Mat3, Vec2, Vec4};
use kurbo::BezPath;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct RenderTree {
    pub width: f32,
    pub height: f32,
    /// Document frame the tree was resolved at.
    pub frame: f32,
    pub root: RenderNode,
}

impl RenderTree {
    /// Every node, depth first, parents before children.
    pub fn nodes(&self) -> Vec<&RenderNode> {
        let mut out = Vec::new();
        self.root.collect(&mut out);
        out
    }

    pub fn find(&self, name: &str) -> Option<&RenderNode> {
        self.nodes()
            .into_iter()
            .find(|n| n.name.as_deref() == Some(name))
    }
}

#[derive(Debug, Clone)]
pub struct RenderNode {
    pub name: Option<String>,
    /// Local transform relative to the enclosing node, parenting included.
    pub matrix: Mat3,
    pub opacity: f32,
    pub visible: bool,
    pub content: NodeContent,
    pub masks: Vec<Mask>,
}

impl RenderNode {
    pub fn group(name: Option<String>, children: Vec<RenderNode>) -> Self {
        Self {
            name,
            matrix: Mat3::IDENTITY,
            opacity: 1.0,
            visible: true,
            content: NodeContent::Group(children),
            masks: Vec::new(),
        }
    }

    pub fn children(&self) -> &[RenderNode] {
        match &self.content {
            NodeContent::Group(children) => children,
            _ => &[],
        }
    }

    fn collect<'a>(&'a self, out: &mut Vec<&'a RenderNode>) {
        out.push(self);
        for child in self.children() {
            child.collect(out);
        }
    }
}

#[derive(Debug, Clone)]
pub enum NodeContent {
    /// Children listed bottom to top.
    Group(Vec<RenderNode>),
    /// Draws listed bottom to top.
    Shapes(Vec<ShapeDraw>),
    Image(Image),
    Solid { color: Vec4, width: f32, height: f32 },
    Empty,
}

#[derive(Debug, Clone)]
pub struct Image {
    pub asset_id: String,
    pub width: f32,
    pub height: f32,
    /// Decoded bytes for embedded assets; external ones are fetched by the host.
    pub data: Option<Arc<[u8]>>,
    pub path: Option<String>,
}

/// One fill or stroke applied to a set of paths.
#[derive(Debug, Clone)]
pub struct ShapeDraw {
    pub paint: ShapePaint,
    /// Style opacity times every enclosing group's opacity.
    pub opacity: f32,
    /// In layer space.
    pub paths: Vec<BezPath>,
    pub trim: Option<Trim>,
}

#[derive(Debug, Clone)]
pub enum ShapePaint {
    Fill { paint: Paint, rule: FillRule },
    Stroke(Stroke),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Paint {
    Solid(Vec4),
    Gradient(Gradient),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FillRule {
    NonZero,
    EvenOdd,
}

#[derive(Debug, Clone)]
pub struct Stroke {
    pub paint: Paint,
    pub width: f32,
    pub cap: LineCap,
    pub join: LineJoin,
    pub miter_limit: f32,
    pub dash: Option<DashPattern>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineCap {
    Butt,
    Round,
    Square,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineJoin {
    Miter,
    Round,
    Bevel,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DashPattern {
    /// Alternating dash and gap lengths.
    pub array: Vec<f32>,
    pub offset: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GradientKind {
    Linear,
    Radial,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Gradient {
    pub kind: GradientKind,
    pub start: Vec2,
    pub end: Vec2,
    pub stops: Vec<GradientStop>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GradientStop {
    pub offset: f32,
    pub color: Vec4,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrimMode {
    /// All paths are trimmed as one.
    Simultaneous,
    /// Each path is trimmed on its own.
    Individually,
}

/// Portion of each path to draw, as fractions of its length.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Trim {
    pub start: f32,
    pub end: f32,
    /// Fraction of a full turn.
    pub offset: f32,
    pub mode: TrimMode,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaskMode {
    None,
    Add,
    Subtract,
    Intersect,
    Lighten,
    Darken,
    Difference,
}

#[derive(Debug, Clone)]
pub struct Mask {
    pub mode: MaskMode,
    pub inverted: bool,
    pub path: BezPath,
    pub opacity: f32,
    pub expansion: f32,
}
