use serde::{de::DeserializeOwned, de::SeqAccess, Deserialize, Deserializer, Serialize};
use std::fmt;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Document {
    pub v: Option<String>,
    #[serde(default)]
    pub nm: Option<String>,
    pub ip: f32,
    pub op: f32,
    #[serde(default = "default_frame_rate")]
    pub fr: f32,
    #[serde(default)]
    pub w: u32,
    #[serde(default)]
    pub h: u32,
    #[serde(default)]
    pub ddd: Option<u8>,
    #[serde(default)]
    pub layers: Vec<Layer>,
    #[serde(default)]
    pub assets: Vec<Asset>,
    #[serde(default)]
    pub markers: Vec<Marker>,
}

impl Document {
    /// Parses a document from its JSON text.
    pub fn from_json(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }

    /// Frames between the in and out point.
    pub fn duration(&self) -> f32 {
        (self.op - self.ip).max(0.0)
    }

    pub fn asset(&self, id: &str) -> Option<&Asset> {
        self.assets.iter().find(|a| a.id == id)
    }

    pub fn marker(&self, name: &str) -> Option<&Marker> {
        self.markers
            .iter()
            .find(|m| m.cm.as_deref() == Some(name))
    }
}

fn default_frame_rate() -> f32 {
    30.0
}

/// Layer type tag (`ty`) decoded into a closed set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerKind {
    PreComp,
    Solid,
    Image,
    Null,
    Shape,
    Text,
    Unknown(u8),
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Layer {
    #[serde(default)]
    pub ty: u8,
    #[serde(default)]
    pub ind: Option<u32>,
    #[serde(default)]
    pub parent: Option<u32>,
    #[serde(default)]
    pub nm: Option<String>,
    #[serde(default)]
    pub ip: f32,
    #[serde(default)]
    pub op: f32,
    #[serde(default)]
    pub st: f32, // Start time
    #[serde(default = "default_one")]
    pub sr: f32, // Time stretch (1.0 = normal, >1 = slower, <1 = faster)
    #[serde(default)]
    pub ks: Transform,
    #[serde(default)]
    pub ao: Option<u32>,
    #[serde(default)]
    pub tm: Option<Property<f32>>,
    #[serde(default)]
    pub ddd: Option<u8>, // 3D Layer Flag (0=2D, 1=3D)
    #[serde(default)]
    pub hd: Option<bool>,
    #[serde(default, rename = "masksProperties")]
    pub masks_properties: Option<Vec<MaskProperties>>,
    #[serde(default, rename = "hasMask")]
    pub has_mask: Option<bool>,
    #[serde(default)]
    pub bm: Option<u8>, // Blend mode: 0=Normal, 1=Multiply, 2=Screen, etc.

    // Type specific (flattened manually as optional fields)
    #[serde(default, rename = "refId")]
    pub ref_id: Option<String>, // PreComp, Image
    #[serde(default)]
    pub w: Option<u32>, // PreComp
    #[serde(default)]
    pub h: Option<u32>, // PreComp
    #[serde(default, rename = "sc")]
    pub color: Option<String>, // Solid color
    #[serde(default)]
    pub sw: Option<u32>, // Solid width
    #[serde(default)]
    pub sh: Option<u32>, // Solid height
    #[serde(default)]
    pub shapes: Option<Vec<Shape>>, // Shape Layer
    #[serde(default)]
    pub t: Option<serde_json::Value>, // Text Layer, kept opaque
}

impl Layer {
    pub fn kind(&self) -> LayerKind {
        match self.ty {
            0 => LayerKind::PreComp,
            1 => LayerKind::Solid,
            2 => LayerKind::Image,
            3 => LayerKind::Null,
            4 => LayerKind::Shape,
            5 => LayerKind::Text,
            other => LayerKind::Unknown(other),
        }
    }

    pub fn is_hidden(&self) -> bool {
        self.hd.unwrap_or(false)
    }

    pub fn is_3d(&self) -> bool {
        self.ddd == Some(1)
    }
}

fn default_one() -> f32 {
    1.0
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct MaskProperties {
    #[serde(default)]
    pub inv: bool,
    #[serde(default)]
    pub mode: Option<String>,
    #[serde(default)]
    pub pt: Property<BezierPath>,
    #[serde(default)]
    pub o: Property<f32>,
    #[serde(default)]
    pub x: Property<f32>,
    #[serde(default)]
    pub nm: Option<String>,
}

// Shapes

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(tag = "ty")]
pub enum Shape {
    #[serde(rename = "gr")]
    Group(GroupShape),
    #[serde(rename = "rc")]
    Rect(RectShape),
    #[serde(rename = "el")]
    Ellipse(EllipseShape),
    #[serde(rename = "fl")]
    Fill(FillShape),
    #[serde(rename = "st")]
    Stroke(StrokeShape),
    #[serde(rename = "gf")]
    GradientFill(GradientFillShape),
    #[serde(rename = "gs")]
    GradientStroke(GradientStrokeShape),
    #[serde(rename = "tr")]
    Transform(TransformShape),
    #[serde(rename = "sh")]
    Path(PathShape),
    #[serde(rename = "tm")]
    Trim(TrimShape),
    #[serde(rename = "sr")]
    Polystar(PolystarShape),
    #[serde(rename = "rp")]
    Repeater(RepeaterShape),
    #[serde(rename = "rd")]
    RoundCorners(RoundCornersShape),
    #[serde(rename = "zz")]
    ZigZag(UnsupportedShape),
    #[serde(rename = "pb")]
    PuckerBloat(UnsupportedShape),
    #[serde(rename = "tw")]
    Twist(UnsupportedShape),
    #[serde(rename = "op")]
    OffsetPath(UnsupportedShape),
    #[serde(rename = "wgl")]
    WigglePath(UnsupportedShape),
    #[serde(rename = "mm")]
    MergePaths(UnsupportedShape),
    #[serde(other)]
    Unknown,
}

impl Shape {
    /// The `ty` tag this shape was exported with.
    pub fn type_tag(&self) -> &'static str {
        match self {
            Shape::Group(_) => "gr",
            Shape::Rect(_) => "rc",
            Shape::Ellipse(_) => "el",
            Shape::Fill(_) => "fl",
            Shape::Stroke(_) => "st",
            Shape::GradientFill(_) => "gf",
            Shape::GradientStroke(_) => "gs",
            Shape::Transform(_) => "tr",
            Shape::Path(_) => "sh",
            Shape::Trim(_) => "tm",
            Shape::Polystar(_) => "sr",
            Shape::Repeater(_) => "rp",
            Shape::RoundCorners(_) => "rd",
            Shape::ZigZag(_) => "zz",
            Shape::PuckerBloat(_) => "pb",
            Shape::Twist(_) => "tw",
            Shape::OffsetPath(_) => "op",
            Shape::WigglePath(_) => "wgl",
            Shape::MergePaths(_) => "mm",
            Shape::Unknown => "unknown",
        }
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            Shape::Group(s) => s.nm.as_deref(),
            Shape::Rect(s) => s.nm.as_deref(),
            Shape::Ellipse(s) => s.nm.as_deref(),
            Shape::Fill(s) => s.nm.as_deref(),
            Shape::Stroke(s) => s.nm.as_deref(),
            Shape::GradientFill(s) => s.nm.as_deref(),
            Shape::GradientStroke(s) => s.nm.as_deref(),
            Shape::Path(s) => s.nm.as_deref(),
            Shape::Trim(s) => s.nm.as_deref(),
            Shape::Polystar(s) => s.nm.as_deref(),
            Shape::Repeater(s) => s.nm.as_deref(),
            Shape::RoundCorners(s) => s.nm.as_deref(),
            Shape::ZigZag(s)
            | Shape::PuckerBloat(s)
            | Shape::Twist(s)
            | Shape::OffsetPath(s)
            | Shape::WigglePath(s)
            | Shape::MergePaths(s) => s.nm.as_deref(),
            Shape::Transform(_) | Shape::Unknown => None,
        }
    }

    /// `hd` flag; hidden items are skipped when the tree is built.
    pub fn is_hidden(&self) -> bool {
        match self {
            Shape::Group(s) => s.hd,
            Shape::Rect(s) => s.hd,
            Shape::Ellipse(s) => s.hd,
            Shape::Fill(s) => s.hd,
            Shape::Stroke(s) => s.hd,
            Shape::Path(s) => s.hd,
            Shape::Polystar(s) => s.hd,
            _ => false,
        }
    }
}

/// Modifier kinds the runtime recognises but does not evaluate.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct UnsupportedShape {
    #[serde(default)]
    pub nm: Option<String>,
}

/// Star (`sy == 1`) or polygon (`sy == 2`).
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PolystarShape {
    #[serde(default)]
    pub nm: Option<String>,
    #[serde(default)]
    pub hd: bool,
    #[serde(default)]
    pub d: Option<u8>,
    #[serde(default)]
    pub p: Property<Vec2>,
    #[serde(default)]
    pub or: Property<f32>,
    #[serde(default)]
    pub os: Property<f32>,
    #[serde(default)]
    pub r: Property<f32>,
    #[serde(default)]
    pub pt: Property<f32>,
    #[serde(default = "default_star_type")]
    pub sy: u8,
    #[serde(default)]
    pub ir: Option<Property<f32>>,
    #[serde(default)]
    pub is: Option<Property<f32>>,
}

fn default_star_type() -> u8 {
    1
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RepeaterShape {
    #[serde(default)]
    pub nm: Option<String>,
    #[serde(default)]
    pub c: Property<f32>,
    #[serde(default)]
    pub o: Property<f32>,
    /// Composite: 1 = above, 2 = below.
    #[serde(default = "default_composite")]
    pub m: u8,
    #[serde(default)]
    pub tr: RepeaterTransform,
}

fn default_composite() -> u8 {
    1
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct RepeaterTransform {
    #[serde(flatten)]
    pub t: Transform,
    #[serde(default)]
    pub so: Property<f32>,
    #[serde(default)]
    pub eo: Property<f32>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RoundCornersShape {
    #[serde(default)]
    pub nm: Option<String>,
    #[serde(default)]
    pub r: Property<f32>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct GroupShape {
    #[serde(default)]
    pub nm: Option<String>,
    #[serde(default)]
    pub hd: bool,
    #[serde(default)]
    pub it: Vec<Shape>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RectShape {
    #[serde(default)]
    pub nm: Option<String>,
    #[serde(default)]
    pub hd: bool,
    #[serde(default)]
    pub d: Option<u8>,
    #[serde(default)]
    pub s: Property<Vec2>,
    #[serde(default)]
    pub p: Property<Vec2>,
    #[serde(default)]
    pub r: Property<f32>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct EllipseShape {
    #[serde(default)]
    pub nm: Option<String>,
    #[serde(default)]
    pub hd: bool,
    #[serde(default)]
    pub d: Option<u8>,
    #[serde(default)]
    pub s: Property<Vec2>,
    #[serde(default)]
    pub p: Property<Vec2>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct FillShape {
    #[serde(default)]
    pub nm: Option<String>,
    #[serde(default)]
    pub hd: bool,
    #[serde(default)]
    pub c: Property<Rgba>,
    #[serde(default)]
    pub o: Property<f32>,
    #[serde(default)]
    pub r: Option<u8>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct StrokeShape {
    #[serde(default)]
    pub nm: Option<String>,
    #[serde(default)]
    pub hd: bool,
    #[serde(default)]
    pub c: Property<Rgba>,
    #[serde(default)]
    pub w: Property<f32>,
    #[serde(default)]
    pub o: Property<f32>,
    #[serde(default)]
    pub lc: u8,
    #[serde(default)]
    pub lj: u8,
    #[serde(default)]
    pub ml: Option<f32>,
    #[serde(default)]
    pub d: Vec<DashProperty>,
}

/// One entry of a stroke dash pattern: `n` is `d` (dash), `g` (gap) or `o` (offset).
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct DashProperty {
    #[serde(default)]
    pub n: Option<String>,
    #[serde(default)]
    pub v: Property<f32>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct GradientFillShape {
    #[serde(default)]
    pub nm: Option<String>,
    #[serde(default)]
    pub o: Property<f32>,
    #[serde(default)]
    pub s: Property<Vec2>,
    #[serde(default)]
    pub e: Property<Vec2>,
    #[serde(default = "default_gradient_type")]
    pub t: u8,
    #[serde(default)]
    pub g: GradientColors,
    #[serde(default)]
    pub r: Option<u8>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct GradientStrokeShape {
    #[serde(default)]
    pub nm: Option<String>,
    #[serde(default)]
    pub o: Property<f32>,
    #[serde(default)]
    pub w: Property<f32>,
    #[serde(default)]
    pub s: Property<Vec2>,
    #[serde(default)]
    pub e: Property<Vec2>,
    #[serde(default = "default_gradient_type")]
    pub t: u8,
    #[serde(default)]
    pub g: GradientColors,
    #[serde(default)]
    pub lc: u8,
    #[serde(default)]
    pub lj: u8,
    #[serde(default)]
    pub ml: Option<f32>,
    #[serde(default)]
    pub d: Vec<DashProperty>,
}

fn default_gradient_type() -> u8 {
    1
}

/// `p` color stops packed as `[offset, r, g, b]*p` followed by optional `[offset, alpha]` pairs.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct GradientColors {
    #[serde(default)]
    pub p: u32,
    #[serde(default)]
    pub k: Property<Vec<f32>>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PathShape {
    #[serde(default)]
    pub nm: Option<String>,
    #[serde(default)]
    pub hd: bool,
    #[serde(default)]
    pub d: Option<u8>,
    #[serde(default)]
    pub ks: Property<BezierPath>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TrimShape {
    #[serde(default)]
    pub nm: Option<String>,
    #[serde(default)]
    pub s: Property<f32>,
    #[serde(default)]
    pub e: Property<f32>,
    #[serde(default)]
    pub o: Property<f32>,
    #[serde(default)]
    pub m: u8,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TransformShape {
    #[serde(flatten)]
    pub t: Transform,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct Transform {
    #[serde(default)]
    pub a: Property<Vec3DefaultZero>, // Anchor: Vec3, default z=0
    #[serde(default)]
    pub p: PositionProperty, // Position: Vec3, default z=0
    #[serde(default)]
    pub s: Property<Vec3Scale>, // Scale: Vec3, default z=100
    #[serde(default, alias = "r")]
    pub rz: Property<f32>, // Rotation Z
    #[serde(default)]
    pub rx: Option<Property<f32>>, // Rotation X
    #[serde(default)]
    pub ry: Option<Property<f32>>, // Rotation Y
    #[serde(default)]
    pub or: Option<Property<Vec3DefaultZero>>, // Orientation
    #[serde(default)]
    pub sk: Property<f32>, // Skew amount in degrees
    #[serde(default)]
    pub sa: Property<f32>, // Skew axis in degrees (0 = X axis, 90 = Y axis)
    #[serde(default)]
    pub o: Property<f32>, // Opacity
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(untagged)]
pub enum PositionProperty {
    Unified(Property<Vec3DefaultZero>),
    Split {
        x: Property<f32>,
        y: Property<f32>,
        #[serde(default)]
        z: Option<Property<f32>>,
    },
}

impl Default for PositionProperty {
    fn default() -> Self {
        PositionProperty::Unified(Property::default())
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Property<T> {
    #[serde(default)]
    pub a: u8,
    #[serde(default)]
    #[serde(bound(deserialize = "T: DeserializeOwned"))]
    pub k: Value<T>,
    #[serde(default)]
    pub ix: Option<u32>,
    #[serde(default)]
    pub x: Option<String>,
}

impl<T> Property<T> {
    pub fn constant(value: T) -> Self {
        Property {
            a: 0,
            k: Value::Static(value),
            ix: None,
            x: None,
        }
    }

    pub fn animated(keyframes: Vec<Keyframe<T>>) -> Self {
        Property {
            a: 1,
            k: Value::Animated(keyframes),
            ix: None,
            x: None,
        }
    }
}

impl<T> Default for Property<T> {
    fn default() -> Self {
        Property {
            a: 0,
            k: Value::Default,
            ix: None,
            x: None,
        }
    }
}

#[derive(Debug, Serialize, Clone)]
pub enum Value<T> {
    Default,
    Static(T),
    Animated(Vec<Keyframe<T>>),
}

impl<'de, T: DeserializeOwned> Deserialize<'de> for Value<T> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let v = serde_json::Value::deserialize(deserializer)?;

        if v.is_null() {
            return Ok(Value::Default);
        }

        // Keyframe arrays are arrays of objects; a plain numeric array is a static vector.
        let looks_keyframed = v
            .as_array()
            .and_then(|arr| arr.first())
            .map(|first| first.is_object() && first.get("t").is_some())
            .unwrap_or(false);
        if looks_keyframed {
            if let Ok(keyframes) = serde_json::from_value::<Vec<Keyframe<T>>>(v.clone()) {
                return Ok(Value::Animated(keyframes));
            }
        }

        if let Ok(val) = serde_json::from_value::<T>(v.clone()) {
            return Ok(Value::Static(val));
        }

        if let Ok(vec) = serde_json::from_value::<Vec<T>>(v) {
            if let Some(first) = vec.into_iter().next() {
                return Ok(Value::Static(first));
            }
        }

        Ok(Value::Default)
    }
}

impl<T> Default for Value<T> {
    fn default() -> Self {
        Value::Default
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(bound(deserialize = "T: DeserializeOwned"))]
pub struct Keyframe<T> {
    pub t: f32,
    #[serde(default, deserialize_with = "deserialize_keyframe_value")]
    pub s: Option<T>,
    #[serde(default, deserialize_with = "deserialize_keyframe_value")]
    pub e: Option<T>,
    #[serde(default)]
    pub i: Option<BezierTangent>,
    #[serde(default)]
    pub o: Option<BezierTangent>,
    #[serde(default)]
    pub to: Option<Vec<f32>>,
    #[serde(default)]
    pub ti: Option<Vec<f32>>,
    #[serde(default)]
    pub h: Option<u8>,
}

impl<T> Keyframe<T> {
    /// A linear keyframe holding `s` at frame `t`.
    pub fn at(t: f32, s: T) -> Self {
        Keyframe {
            t,
            s: Some(s),
            e: None,
            i: None,
            o: None,
            to: None,
            ti: None,
            h: None,
        }
    }

    pub fn is_hold(&self) -> bool {
        self.h == Some(1)
    }
}

fn deserialize_keyframe_value<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let v = serde_json::Value::deserialize(deserializer)?;
    if v.is_null() {
        return Ok(None);
    }

    if let Ok(val) = serde_json::from_value(v.clone()) {
        return Ok(Some(val));
    }

    if let Ok(vec) = serde_json::from_value::<Vec<T>>(v) {
        if let Some(first) = vec.into_iter().next() {
            return Ok(Some(first));
        }
    }

    Ok(None)
}

pub type Vec2 = [f32; 2];
pub type Vec3 = [f32; 3];
pub type Vec4 = [f32; 4];

/// Bezier tangent control points for keyframe easing.
/// Exports write either `{"x": [0.48], "y": [1]}` (one entry per component) or `{"x": 0.48, "y": 1}`.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct BezierTangent {
    #[serde(deserialize_with = "deserialize_number_or_vec")]
    pub x: Vec<f32>,
    #[serde(deserialize_with = "deserialize_number_or_vec")]
    pub y: Vec<f32>,
}

impl BezierTangent {
    pub fn new(x: f32, y: f32) -> Self {
        BezierTangent {
            x: vec![x],
            y: vec![y],
        }
    }

    /// Control point for component `index`, falling back to the first entry.
    pub fn component(&self, index: usize) -> Option<(f32, f32)> {
        let x = self.x.get(index).or_else(|| self.x.first())?;
        let y = self.y.get(index).or_else(|| self.y.first())?;
        Some((*x, *y))
    }

    pub fn components(&self) -> usize {
        self.x.len().max(self.y.len())
    }
}

fn deserialize_number_or_vec<'de, D>(deserializer: D) -> Result<Vec<f32>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumberOrVec {
        Number(f32),
        Vec(Vec<f32>),
    }

    Ok(match NumberOrVec::deserialize(deserializer)? {
        NumberOrVec::Number(n) => vec![n],
        NumberOrVec::Vec(v) => v,
    })
}

// Wrapper for Vec3 with Z defaulting to 0.0
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Vec3DefaultZero(pub Vec3);

impl Default for Vec3DefaultZero {
    fn default() -> Self {
        Vec3DefaultZero([0.0, 0.0, 0.0])
    }
}

impl<'de> Deserialize<'de> for Vec3DefaultZero {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct Vec3Visitor;
        impl<'de> serde::de::Visitor<'de> for Vec3Visitor {
            type Value = Vec3DefaultZero;
            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a sequence of 2 or 3 floats")
            }
            fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
            where
                A: SeqAccess<'de>,
            {
                let x = seq.next_element()?.unwrap_or(0.0);
                let y = seq.next_element()?.unwrap_or(0.0);
                let z = seq.next_element()?.unwrap_or(0.0);
                while seq.next_element::<f32>()?.is_some() {}
                Ok(Vec3DefaultZero([x, y, z]))
            }
        }
        deserializer.deserialize_seq(Vec3Visitor)
    }
}

// Wrapper for Vec3 with Z defaulting to 100.0 (for Scale)
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Vec3Scale(pub Vec3);

impl Default for Vec3Scale {
    fn default() -> Self {
        Vec3Scale([100.0, 100.0, 100.0])
    }
}

impl<'de> Deserialize<'de> for Vec3Scale {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct Vec3ScaleVisitor;
        impl<'de> serde::de::Visitor<'de> for Vec3ScaleVisitor {
            type Value = Vec3Scale;
            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a sequence of 2 or 3 floats")
            }
            fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
            where
                A: SeqAccess<'de>,
            {
                let x = seq.next_element()?.unwrap_or(0.0);
                let y = seq.next_element()?.unwrap_or(0.0);
                let z = seq.next_element()?.unwrap_or(100.0); // Default to 100%
                while seq.next_element::<f32>()?.is_some() {}
                Ok(Vec3Scale([x, y, z]))
            }
        }
        deserializer.deserialize_seq(Vec3ScaleVisitor)
    }
}

/// Color channels as exported, alpha defaulting to 1 when only RGB is given.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Rgba(pub Vec4);

impl Default for Rgba {
    fn default() -> Self {
        Rgba([0.0, 0.0, 0.0, 1.0])
    }
}

impl<'de> Deserialize<'de> for Rgba {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct RgbaVisitor;
        impl<'de> serde::de::Visitor<'de> for RgbaVisitor {
            type Value = Rgba;
            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a sequence of 3 or 4 floats")
            }
            fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
            where
                A: SeqAccess<'de>,
            {
                let r = seq.next_element()?.unwrap_or(0.0);
                let g = seq.next_element()?.unwrap_or(0.0);
                let b = seq.next_element()?.unwrap_or(0.0);
                let a = seq.next_element()?.unwrap_or(1.0);
                while seq.next_element::<f32>()?.is_some() {}
                Ok(Rgba([r, g, b, a]))
            }
        }
        deserializer.deserialize_seq(RgbaVisitor)
    }
}

/// Vertices with tangents stored relative to their vertex.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct BezierPath {
    #[serde(default)]
    pub c: bool,
    #[serde(default)]
    pub i: Vec<Vec2>,
    #[serde(default)]
    pub o: Vec<Vec2>,
    #[serde(default)]
    pub v: Vec<Vec2>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Asset {
    pub id: String,
    #[serde(default)]
    pub nm: Option<String>,
    #[serde(default)]
    pub layers: Option<Vec<Layer>>,
    #[serde(default)]
    pub w: Option<u32>,
    #[serde(default)]
    pub h: Option<u32>,
    #[serde(default)]
    pub u: Option<String>,
    #[serde(default)]
    pub p: Option<String>,
    #[serde(default)]
    pub e: Option<u8>, // 1 = embedded data URI
    #[serde(default)]
    pub fr: Option<f32>,
}

impl Asset {
    pub fn is_image(&self) -> bool {
        self.layers.is_none() && self.p.is_some()
    }

    pub fn is_embedded(&self) -> bool {
        self.e == Some(1)
            || self
                .p
                .as_deref()
                .map(|p| p.starts_with("data:"))
                .unwrap_or(false)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct Marker {
    #[serde(default)]
    pub cm: Option<String>,
    #[serde(default)]
    pub tm: Option<f32>,
    #[serde(default)]
    pub dr: Option<f32>,
}
