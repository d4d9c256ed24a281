//! Affine transforms built from animated transform blocks, and cached
//! compositions of transform chains.

use crate::animatable::EulerRotation;
use crate::container::DynamicProperty;
use crate::easing::EasingRegistry;
use crate::property::AnimatedProperty;
use glam::{Mat3, Mat4, Vec2, Vec3};
use lottie_data::model as data;
use std::collections::HashMap;

#[derive(Debug, Clone)]
enum Position {
    Unified(AnimatedProperty<Vec3>),
    Split {
        x: AnimatedProperty<f32>,
        y: AnimatedProperty<f32>,
        z: Option<AnimatedProperty<f32>>,
    },
}

impl Position {
    fn from_data(p: &data::PositionProperty, easing: &mut EasingRegistry) -> Self {
        match p {
            data::PositionProperty::Unified(p) => Position::Unified(
                AnimatedProperty::from_property(p, |v| Vec3::from(v.0), Vec3::ZERO, easing),
            ),
            data::PositionProperty::Split { x, y, z } => Position::Split {
                x: AnimatedProperty::from_property(x, |v| *v, 0.0, easing),
                y: AnimatedProperty::from_property(y, |v| *v, 0.0, easing),
                z: z.as_ref()
                    .map(|z| AnimatedProperty::from_property(z, |v| *v, 0.0, easing)),
            },
        }
    }

    fn value(&self) -> Vec3 {
        match self {
            Position::Unified(p) => *p.value(),
            Position::Split { x, y, z } => Vec3::new(
                *x.value(),
                *y.value(),
                z.as_ref().map(|z| *z.value()).unwrap_or(0.0),
            ),
        }
    }

    fn heading(&mut self, frame: f32) -> Option<f32> {
        match self {
            Position::Unified(p) => p.heading(frame),
            Position::Split { x, y, .. } => {
                let before = Vec2::new(x.evaluate(frame - 0.01), y.evaluate(frame - 0.01));
                let after = Vec2::new(x.evaluate(frame + 0.01), y.evaluate(frame + 0.01));
                let d = after - before;
                (d.length_squared() > f32::EPSILON).then(|| d.y.atan2(d.x).to_degrees())
            }
        }
    }
}

impl DynamicProperty for Position {
    fn tick(&mut self, frame: f32) -> bool {
        match self {
            Position::Unified(p) => p.tick(frame),
            Position::Split { x, y, z } => {
                let z = z.as_mut().map(|z| z.tick(frame)).unwrap_or(false);
                x.tick(frame) | y.tick(frame) | z
            }
        }
    }
}

/// Layer-level flags that change how a transform block is interpreted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransformFlags {
    /// Rotate along the motion path (`ao`).
    pub auto_orient: bool,
    /// Honour z, x/y rotation and orientation (`ddd`).
    pub three_d: bool,
}

/// The animated properties of one transform block plus the matrix and
/// opacity they resolve to.
#[derive(Debug, Clone)]
pub struct TransformProperties {
    anchor: AnimatedProperty<Vec3>,
    position: Position,
    scale: AnimatedProperty<Vec3>,
    rotation: AnimatedProperty<f32>,
    rotation_x: Option<AnimatedProperty<f32>>,
    rotation_y: Option<AnimatedProperty<f32>>,
    orientation: Option<AnimatedProperty<EulerRotation>>,
    skew: AnimatedProperty<f32>,
    skew_axis: AnimatedProperty<f32>,
    opacity: AnimatedProperty<f32>,
    flags: TransformFlags,
    matrix: Mat3,
    heading: f32,
    frame: Option<f32>,
    modified: bool,
}

impl TransformProperties {
    pub fn from_data(
        ks: &data::Transform,
        flags: TransformFlags,
        easing: &mut EasingRegistry,
    ) -> Self {
        let optional = |p: &Option<data::Property<f32>>, easing: &mut EasingRegistry| {
            p.as_ref()
                .map(|p| AnimatedProperty::from_property(p, |v| *v, 0.0, easing))
        };
        Self {
            anchor: AnimatedProperty::from_property(
                &ks.a,
                |v| Vec3::from(v.0),
                Vec3::ZERO,
                easing,
            ),
            position: Position::from_data(&ks.p, easing),
            scale: AnimatedProperty::from_property(
                &ks.s,
                |v| Vec3::from(v.0),
                Vec3::splat(100.0),
                easing,
            ),
            rotation: AnimatedProperty::from_property(&ks.rz, |v| *v, 0.0, easing),
            rotation_x: optional(&ks.rx, easing),
            rotation_y: optional(&ks.ry, easing),
            orientation: ks.or.as_ref().map(|or| {
                AnimatedProperty::from_property(
                    or,
                    |v| EulerRotation(Vec3::from(v.0)),
                    EulerRotation::default(),
                    easing,
                )
            }),
            skew: AnimatedProperty::from_property(&ks.sk, |v| *v, 0.0, easing),
            skew_axis: AnimatedProperty::from_property(&ks.sa, |v| *v, 0.0, easing),
            opacity: AnimatedProperty::from_property(&ks.o, |v| *v, 100.0, easing),
            flags,
            matrix: Mat3::IDENTITY,
            heading: 0.0,
            frame: None,
            modified: false,
        }
    }

    pub fn matrix(&self) -> Mat3 {
        self.matrix
    }

    /// Opacity in `[0, 1]`.
    pub fn opacity(&self) -> f32 {
        (self.opacity.value() / 100.0).clamp(0.0, 1.0)
    }

    pub fn is_modified(&self) -> bool {
        self.modified
    }

    pub fn is_animated(&self) -> bool {
        let position = match &self.position {
            Position::Unified(p) => p.is_animated(),
            Position::Split { x, y, z } => {
                x.is_animated() || y.is_animated() || z.as_ref().is_some_and(|z| z.is_animated())
            }
        };
        position
            || self.anchor.is_animated()
            || self.scale.is_animated()
            || self.rotation.is_animated()
            || self.skew.is_animated()
            || self.skew_axis.is_animated()
            || self.opacity.is_animated()
            || self.rotation_x.as_ref().is_some_and(|p| p.is_animated())
            || self.rotation_y.as_ref().is_some_and(|p| p.is_animated())
            || self.orientation.as_ref().is_some_and(|p| p.is_animated())
    }

    fn compose(&self) -> Mat3 {
        let anchor = *self.anchor.value();
        let position = self.position.value();
        let scale = *self.scale.value() / 100.0;
        let rotation = (self.rotation.value() + self.heading).to_radians();
        let skew = self.skew.value().to_radians();
        let skew_axis = self.skew_axis.value().to_radians();

        if !self.flags.three_d {
            return Mat3::from_translation(position.truncate())
                * Mat3::from_angle(rotation)
                * skew_matrix(skew, skew_axis)
                * Mat3::from_scale(scale.truncate())
                * Mat3::from_translation(-anchor.truncate());
        }

        let rx = self.rotation_x.as_ref().map(|p| *p.value()).unwrap_or(0.0);
        let ry = self.rotation_y.as_ref().map(|p| *p.value()).unwrap_or(0.0);
        let orientation = self
            .orientation
            .as_ref()
            .map(|p| p.value().to_quat())
            .unwrap_or_default();
        let skew = skew_matrix(skew, skew_axis);
        let m = Mat4::from_translation(position)
            * Mat4::from_quat(orientation)
            * Mat4::from_rotation_x(rx.to_radians())
            * Mat4::from_rotation_y(ry.to_radians())
            * Mat4::from_rotation_z(rotation)
            * Mat4::from_mat3(skew)
            * Mat4::from_scale(scale)
            * Mat4::from_translation(-anchor);
        flatten(m)
    }
}

impl DynamicProperty for TransformProperties {
    fn tick(&mut self, frame: f32) -> bool {
        if self.frame == Some(frame) {
            return self.modified;
        }
        let first = self.frame.is_none();
        self.frame = Some(frame);

        let mut changed = self.anchor.tick(frame)
            | self.position.tick(frame)
            | self.scale.tick(frame)
            | self.rotation.tick(frame)
            | self.skew.tick(frame)
            | self.skew_axis.tick(frame);
        for p in [&mut self.rotation_x, &mut self.rotation_y].into_iter().flatten() {
            changed |= p.tick(frame);
        }
        if let Some(or) = &mut self.orientation {
            changed |= or.tick(frame);
        }
        if self.flags.auto_orient {
            let heading = self.position.heading(frame).unwrap_or(self.heading);
            changed |= heading != self.heading;
            self.heading = heading;
        }
        let opacity = self.opacity.tick(frame);

        if first || changed {
            self.matrix = self.compose();
        }
        self.modified = first || changed || opacity;
        self.modified
    }
}

/// Shear by `skew` along the axis at angle `axis`, both in radians.
pub fn skew_matrix(skew: f32, axis: f32) -> Mat3 {
    if skew == 0.0 {
        return Mat3::IDENTITY;
    }
    let shear = Mat3::from_cols(
        Vec3::new(1.0, 0.0, 0.0),
        Vec3::new(-skew.tan(), 1.0, 0.0),
        Vec3::Z,
    );
    Mat3::from_angle(-axis) * shear * Mat3::from_angle(axis)
}

/// Orthographic projection of a 3D transform onto the xy plane.
fn flatten(m: Mat4) -> Mat3 {
    Mat3::from_cols(
        Vec3::new(m.x_axis.x, m.x_axis.y, 0.0),
        Vec3::new(m.y_axis.x, m.y_axis.y, 0.0),
        Vec3::new(m.w_axis.x, m.w_axis.y, 1.0),
    )
}

/// Index into a [`TransformStore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TransformId(pub u32);

#[derive(Debug, Clone)]
enum TransformEntry {
    Authored(Box<TransformProperties>),
    /// Set from outside each frame, e.g. one repeater copy.
    Driven {
        matrix: Mat3,
        opacity: f32,
        modified: bool,
    },
}

/// Every transform owned by one node tree, addressable by id.
#[derive(Debug, Clone, Default)]
pub struct TransformStore {
    entries: Vec<TransformEntry>,
}

impl TransformStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, transform: TransformProperties) -> TransformId {
        self.entries
            .push(TransformEntry::Authored(Box::new(transform)));
        TransformId(self.entries.len() as u32 - 1)
    }

    /// Adds an entry whose matrix is assigned with [`TransformStore::drive`].
    pub fn add_driven(&mut self) -> TransformId {
        self.entries.push(TransformEntry::Driven {
            matrix: Mat3::IDENTITY,
            opacity: 1.0,
            modified: true,
        });
        TransformId(self.entries.len() as u32 - 1)
    }

    /// Assigns a driven entry. Marks it modified only when the value changes.
    pub fn drive(&mut self, id: TransformId, matrix: Mat3, opacity: f32) {
        if let Some(TransformEntry::Driven {
            matrix: m,
            opacity: o,
            modified,
        }) = self.entries.get_mut(id.0 as usize)
        {
            if *m != matrix || *o != opacity {
                *m = matrix;
                *o = opacity;
                *modified = true;
            }
        }
    }

    /// Ticks authored entries added at or after index `start`, leaving the
    /// rest untouched.
    pub fn tick_from(&mut self, start: usize, frame: f32) -> bool {
        let mut modified = false;
        for entry in self.entries.iter_mut().skip(start) {
            if let TransformEntry::Authored(t) = entry {
                modified |= t.tick(frame);
            }
        }
        modified
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn matrix(&self, id: TransformId) -> Mat3 {
        match self.entries.get(id.0 as usize) {
            Some(TransformEntry::Authored(t)) => t.matrix(),
            Some(TransformEntry::Driven { matrix, .. }) => *matrix,
            None => Mat3::IDENTITY,
        }
    }

    pub fn opacity(&self, id: TransformId) -> f32 {
        match self.entries.get(id.0 as usize) {
            Some(TransformEntry::Authored(t)) => t.opacity(),
            Some(TransformEntry::Driven { opacity, .. }) => *opacity,
            None => 1.0,
        }
    }

    pub fn is_modified(&self, id: TransformId) -> bool {
        match self.entries.get(id.0 as usize) {
            Some(TransformEntry::Authored(t)) => t.is_modified(),
            Some(TransformEntry::Driven { modified, .. }) => *modified,
            None => false,
        }
    }

    pub fn properties(&self, id: TransformId) -> Option<&TransformProperties> {
        match self.entries.get(id.0 as usize) {
            Some(TransformEntry::Authored(t)) => Some(t),
            _ => None,
        }
    }
}

impl DynamicProperty for TransformStore {
    /// Ticks authored entries. Driven entries start the frame unmodified.
    fn tick(&mut self, frame: f32) -> bool {
        let mut modified = false;
        for entry in &mut self.entries {
            match entry {
                TransformEntry::Authored(t) => modified |= t.tick(frame),
                TransformEntry::Driven { modified: m, .. } => *m = false,
            }
        }
        modified
    }
}

/// Transforms from outermost to innermost.
pub type ChainKey = Vec<TransformId>;

/// A cached composition of a chain of transforms.
#[derive(Debug, Clone)]
pub struct TransformChain {
    key: ChainKey,
    matrix: Mat3,
    opacity: f32,
    evaluated: bool,
}

impl TransformChain {
    pub fn new(key: ChainKey) -> Self {
        Self {
            key,
            matrix: Mat3::IDENTITY,
            opacity: 1.0,
            evaluated: false,
        }
    }

    pub fn key(&self) -> &[TransformId] {
        &self.key
    }

    pub fn matrix(&self) -> Mat3 {
        self.matrix
    }

    /// Product of member opacities.
    pub fn opacity(&self) -> f32 {
        self.opacity
    }

    /// Recomposes if any member changed this frame or the chain has never been
    /// evaluated. Returns whether the composition was redone.
    pub fn update(&mut self, store: &TransformStore) -> bool {
        let dirty = !self.evaluated || self.key.iter().any(|id| store.is_modified(*id));
        if !dirty {
            return false;
        }
        let (matrix, opacity) = self
            .key
            .iter()
            .fold((Mat3::IDENTITY, 1.0), |(m, o), id| {
                (m * store.matrix(*id), o * store.opacity(*id))
            });
        self.matrix = matrix;
        self.opacity = opacity;
        self.evaluated = true;
        true
    }
}

/// Index of a chain in a [`ChainCache`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChainId(pub u32);

/// Chains deduplicated by key.
#[derive(Debug, Clone, Default)]
pub struct ChainCache {
    chains: Vec<TransformChain>,
    index: HashMap<ChainKey, ChainId>,
}

impl ChainCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn intern(&mut self, key: ChainKey) -> ChainId {
        if let Some(id) = self.index.get(&key) {
            return *id;
        }
        let id = ChainId(self.chains.len() as u32);
        self.chains.push(TransformChain::new(key.clone()));
        self.index.insert(key, id);
        id
    }

    pub fn get(&self, id: ChainId) -> Option<&TransformChain> {
        self.chains.get(id.0 as usize)
    }

    pub fn len(&self) -> usize {
        self.chains.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chains.is_empty()
    }

    /// Brings every chain up to date. Returns how many were recomposed.
    pub fn update(&mut self, store: &TransformStore) -> usize {
        self.chains
            .iter_mut()
            .map(|chain| chain.update(store) as usize)
            .sum()
    }

    pub fn matrix(&self, id: ChainId) -> Mat3 {
        self.get(id).map(|c| c.matrix()).unwrap_or(Mat3::IDENTITY)
    }

    pub fn opacity(&self, id: ChainId) -> f32 {
        self.get(id).map(|c| c.opacity()).unwrap_or(1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn transform(value: serde_json::Value) -> TransformProperties {
        let ks: data::Transform = serde_json::from_value(value).expect("valid transform");
        TransformProperties::from_data(&ks, TransformFlags::default(), &mut EasingRegistry::new())
    }

    fn close(a: Vec2, b: Vec2) -> bool {
        (a - b).length() < 1e-3
    }

    #[test]
    fn translate_rotate_scale_about_anchor() {
        let mut t = transform(json!({
            "a": {"a": 0, "k": [10, 0]},
            "p": {"a": 0, "k": [100, 100]},
            "s": {"a": 0, "k": [200, 200]},
            "r": {"a": 0, "k": 90},
            "o": {"a": 0, "k": 50}
        }));
        assert!(t.tick(0.0));
        // anchor lands on position
        assert!(close(t.matrix().transform_point2(Vec2::new(10.0, 0.0)), Vec2::new(100.0, 100.0)));
        // +x turns clockwise on screen, i.e. towards +y
        assert!(close(t.matrix().transform_point2(Vec2::new(11.0, 0.0)), Vec2::new(100.0, 102.0)));
        assert_eq!(t.opacity(), 0.5);
    }

    #[test]
    fn skew_shears_along_axis() {
        let m = skew_matrix(45f32.to_radians(), 0.0);
        assert!(close(m.transform_point2(Vec2::new(0.0, 1.0)), Vec2::new(-1.0, 1.0)));
        assert!(close(m.transform_point2(Vec2::new(1.0, 0.0)), Vec2::new(1.0, 0.0)));
    }

    #[test]
    fn static_transform_reports_once() {
        let mut t = transform(json!({"p": {"a": 0, "k": [5, 5]}}));
        assert!(t.tick(0.0));
        assert!(!t.tick(1.0));
    }

    #[test]
    fn three_d_rotation_projects_flat() {
        let ks: data::Transform = serde_json::from_value(json!({
            "ry": {"a": 0, "k": 60}
        }))
        .unwrap();
        let mut t = TransformProperties::from_data(
            &ks,
            TransformFlags {
                three_d: true,
                ..Default::default()
            },
            &mut EasingRegistry::new(),
        );
        t.tick(0.0);
        // cos(60) foreshortening on x
        assert!(close(t.matrix().transform_point2(Vec2::new(10.0, 0.0)), Vec2::new(5.0, 0.0)));
    }

    #[test]
    fn auto_orient_follows_motion() {
        let ks: data::Transform = serde_json::from_value(json!({
            "p": {"a": 1, "k": [{"t": 0, "s": [0, 0, 0]}, {"t": 10, "s": [0, 100, 0]}]}
        }))
        .unwrap();
        let mut t = TransformProperties::from_data(
            &ks,
            TransformFlags {
                auto_orient: true,
                ..Default::default()
            },
            &mut EasingRegistry::new(),
        );
        t.tick(5.0);
        let dir = t.matrix().transform_vector2(Vec2::X);
        assert!(close(dir, Vec2::Y));
    }

    #[test]
    fn chain_recomposes_only_when_members_change() {
        let mut store = TransformStore::new();
        let outer = store.add(transform(json!({"p": {"a": 0, "k": [10, 0]}})));
        let inner = store.add(transform(json!({
            "p": {"a": 1, "k": [{"t": 0, "s": [0, 0]}, {"t": 10, "s": [10, 0]}]}
        })));
        let still = store.add(transform(json!({"s": {"a": 0, "k": [50, 50]}})));
        let mut chains = ChainCache::new();
        let moving = chains.intern(vec![outer, inner]);
        let fixed = chains.intern(vec![outer, still]);
        assert_eq!(chains.intern(vec![outer, inner]), moving);

        store.tick(0.0);
        assert_eq!(chains.update(&store), 2);
        store.tick(5.0);
        assert_eq!(chains.update(&store), 1);
        assert!(close(
            chains.matrix(moving).transform_point2(Vec2::ZERO),
            Vec2::new(15.0, 0.0)
        ));
        let before = chains.matrix(fixed);
        store.tick(6.0);
        chains.update(&store);
        assert_eq!(chains.matrix(fixed), before);
    }

    #[test]
    fn chain_applies_innermost_first() {
        let mut store = TransformStore::new();
        let outer = store.add(transform(json!({"s": {"a": 0, "k": [200, 200]}})));
        let inner = store.add(transform(json!({"p": {"a": 0, "k": [5, 0]}})));
        store.tick(0.0);
        let mut chain = TransformChain::new(vec![outer, inner]);
        chain.update(&store);
        // translate then scale
        assert!(close(chain.matrix().transform_point2(Vec2::ZERO), Vec2::new(10.0, 0.0)));
    }

    #[test]
    fn driven_entries_flag_changes() {
        let mut store = TransformStore::new();
        let id = store.add_driven();
        store.tick(0.0);
        assert!(!store.is_modified(id));
        store.drive(id, Mat3::from_translation(Vec2::ONE), 0.5);
        assert!(store.is_modified(id));
        store.tick(1.0);
        store.drive(id, Mat3::from_translation(Vec2::ONE), 0.5);
        assert!(!store.is_modified(id));
        assert_eq!(store.opacity(id), 0.5);
    }
}
