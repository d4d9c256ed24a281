//! The content tree of a shape layer.
//!
//! Groups, primitives, styles and modifiers live in flat arenas owned by
//! [`ShapeContent`]; groups refer to their items by index. Every group's
//! transform goes into one [`TransformStore`] and the transform stack above
//! each group is interned once in a [`ChainCache`], so a frame recomposes
//! each distinct stack at most once however many paths share it.
//!
//! Repeaters are expanded into real groups. Copy zero owns the items built
//! with the layer; further copies are built from the authored items when the
//! copy count first needs them and are hidden, not destroyed, when it drops.

use crate::container::DynamicProperty;
use crate::geometry::ShapeGeometry;
use crate::modifiers::{GeometryModifier, RepeaterModifier, RoundCornersModifier, TrimModifier};
use crate::pool::{PathHandle, PathPool, Resources};
use crate::renderer::{ShapeDraw, Trim};
use crate::styles::ShapeStyle;
use crate::transform::{
    ChainCache, ChainId, ChainKey, TransformFlags, TransformId, TransformProperties,
    TransformStore,
};
use glam::Mat3;
use kurbo::BezPath;
use lottie_data::model as data;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ShapeNode {
    Group(usize),
    Geometry(usize),
    Style(usize),
    Modifier(usize),
    Repeater(usize),
}

#[derive(Debug, Clone)]
struct ShapeGroup {
    name: Option<String>,
    items: Vec<ShapeNode>,
    transform: Option<TransformId>,
    visible: bool,
    chain: Option<ChainId>,
    /// Trim in effect for styles in this group, own or inherited.
    trim: Option<usize>,
}

#[derive(Debug, Clone)]
struct GeometryEntry {
    geometry: ShapeGeometry,
    /// Round-corner modifiers applied in order.
    modifiers: Vec<usize>,
    output: Option<PathHandle>,
    scratch: Vec<PathHandle>,
    dirty: bool,
}

#[derive(Debug, Clone)]
enum Modifier {
    RoundCorners(RoundCornersModifier),
    Trim(TrimModifier),
}

impl DynamicProperty for Modifier {
    fn tick(&mut self, frame: f32) -> bool {
        match self {
            Modifier::RoundCorners(m) => m.tick(frame),
            Modifier::Trim(m) => m.tick(frame),
        }
    }
}

#[derive(Debug, Clone)]
struct ModifierEntry {
    modifier: Modifier,
    modified: bool,
}

/// What a subtree inherits from the items around it.
#[derive(Debug, Clone, Default)]
struct Placement {
    key: ChainKey,
    trim: Option<usize>,
    round_corners: Vec<usize>,
}

#[derive(Debug, Clone)]
struct RepeaterEntry {
    name: Option<String>,
    modifier: RepeaterModifier,
    /// Items the copies are built from.
    template: Vec<data::Shape>,
    /// Copy group and the driven transform placing it.
    copies: Vec<(usize, TransformId)>,
    visible: usize,
    placement: Option<Placement>,
}

/// Resolved state of one named group, for inspection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GroupState {
    /// Group transform in layer space.
    pub matrix: Mat3,
    /// Product of the group's opacity and all its ancestors'.
    pub opacity: f32,
    pub visible: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepeaterStats {
    pub name: Option<String>,
    /// Copies drawn this frame.
    pub visible: usize,
    /// Copies built so far.
    pub built: usize,
}

/// Evaluable content of one shape layer.
#[derive(Debug, Clone)]
pub struct ShapeContent {
    groups: Vec<ShapeGroup>,
    geometries: Vec<GeometryEntry>,
    styles: Vec<ShapeStyle>,
    modifiers: Vec<ModifierEntry>,
    repeaters: Vec<RepeaterEntry>,
    transforms: TransformStore,
    chains: ChainCache,
    root: usize,
    frame: Option<f32>,
    modified: bool,
    report_unsupported: bool,
}

impl ShapeContent {
    pub fn build(shapes: &[data::Shape], resources: &mut Resources) -> Self {
        let mut content = Self {
            groups: Vec::new(),
            geometries: Vec::new(),
            styles: Vec::new(),
            modifiers: Vec::new(),
            repeaters: Vec::new(),
            transforms: TransformStore::new(),
            chains: ChainCache::new(),
            root: 0,
            frame: None,
            modified: false,
            report_unsupported: true,
        };
        content.root = content.build_group(None, shapes, resources);
        content.place_group(content.root, &Placement::default());
        content.report_unsupported = false;
        debug!(
            groups = content.groups.len(),
            geometries = content.geometries.len(),
            styles = content.styles.len(),
            chains = content.chains.len(),
            "built shape content"
        );
        content
    }

    fn build_group(
        &mut self,
        name: Option<String>,
        items: &[data::Shape],
        resources: &mut Resources,
    ) -> usize {
        let transform = items.iter().find_map(|item| match item {
            data::Shape::Transform(tr) => Some(tr),
            _ => None,
        });
        let transform = transform.map(|tr| {
            self.transforms.add(TransformProperties::from_data(
                &tr.t,
                TransformFlags::default(),
                &mut resources.easing,
            ))
        });
        let nodes = self.build_items(items, resources);
        self.push_group(name, nodes, transform)
    }

    fn push_group(
        &mut self,
        name: Option<String>,
        items: Vec<ShapeNode>,
        transform: Option<TransformId>,
    ) -> usize {
        self.groups.push(ShapeGroup {
            name,
            items,
            transform,
            visible: true,
            chain: None,
            trim: None,
        });
        self.groups.len() - 1
    }

    fn build_items(&mut self, items: &[data::Shape], resources: &mut Resources) -> Vec<ShapeNode> {
        let mut nodes = Vec::new();
        for (index, item) in items.iter().enumerate() {
            if item.is_hidden() {
                continue;
            }
            let node = match item {
                data::Shape::Transform(_) => continue,
                data::Shape::Group(group) => {
                    ShapeNode::Group(self.build_group(group.nm.clone(), &group.it, resources))
                }
                data::Shape::RoundCorners(rd) => self.push_modifier(Modifier::RoundCorners(
                    RoundCornersModifier::from_data(rd, &mut resources.easing),
                )),
                data::Shape::Trim(tm) => self.push_modifier(Modifier::Trim(
                    TrimModifier::from_data(tm, &mut resources.easing),
                )),
                data::Shape::Repeater(rp) => {
                    let template = items[..index]
                        .iter()
                        .filter(|s| !matches!(s, data::Shape::Transform(_)))
                        .cloned()
                        .collect();
                    let driven = self.transforms.add_driven();
                    let first = self.push_group(None, std::mem::take(&mut nodes), Some(driven));
                    self.repeaters.push(RepeaterEntry {
                        name: rp.nm.clone(),
                        modifier: RepeaterModifier::from_data(rp, &mut resources.easing),
                        template,
                        copies: vec![(first, driven)],
                        visible: 1,
                        placement: None,
                    });
                    ShapeNode::Repeater(self.repeaters.len() - 1)
                }
                data::Shape::ZigZag(_)
                | data::Shape::PuckerBloat(_)
                | data::Shape::Twist(_)
                | data::Shape::OffsetPath(_)
                | data::Shape::WigglePath(_)
                | data::Shape::MergePaths(_) => {
                    if self.report_unsupported {
                        warn!(
                            ty = item.type_tag(),
                            name = item.name(),
                            "shape modifier not supported, skipping"
                        );
                    }
                    continue;
                }
                data::Shape::Unknown => {
                    if self.report_unsupported {
                        warn!("unknown shape item, skipping");
                    }
                    continue;
                }
                other => {
                    if let Some(geometry) = ShapeGeometry::from_shape(other, &mut resources.easing)
                    {
                        self.geometries.push(GeometryEntry {
                            geometry,
                            modifiers: Vec::new(),
                            output: None,
                            scratch: Vec::new(),
                            dirty: true,
                        });
                        ShapeNode::Geometry(self.geometries.len() - 1)
                    } else if let Some(style) = ShapeStyle::from_shape(other, &mut resources.easing)
                    {
                        self.styles.push(style);
                        ShapeNode::Style(self.styles.len() - 1)
                    } else {
                        continue;
                    }
                }
            };
            nodes.push(node);
        }
        nodes
    }

    fn push_modifier(&mut self, modifier: Modifier) -> ShapeNode {
        self.modifiers.push(ModifierEntry {
            modifier,
            modified: true,
        });
        ShapeNode::Modifier(self.modifiers.len() - 1)
    }

    fn as_trim(&self, node: &ShapeNode) -> Option<usize> {
        match node {
            ShapeNode::Modifier(m) if matches!(self.modifiers[*m].modifier, Modifier::Trim(_)) => {
                Some(*m)
            }
            _ => None,
        }
    }

    fn as_round_corners(&self, node: &ShapeNode) -> Option<usize> {
        match node {
            ShapeNode::Modifier(m)
                if matches!(self.modifiers[*m].modifier, Modifier::RoundCorners(_)) =>
            {
                Some(*m)
            }
            _ => None,
        }
    }

    /// Assigns chains, trims and geometry modifiers below `id`.
    fn place_group(&mut self, id: usize, parent: &Placement) {
        let mut key = parent.key.clone();
        key.extend(self.groups[id].transform);
        let chain = self.chains.intern(key.clone());
        let items = self.groups[id].items.clone();
        let trim = items
            .iter()
            .find_map(|n| self.as_trim(n))
            .or(parent.trim);
        let group = &mut self.groups[id];
        group.chain = Some(chain);
        group.trim = trim;

        for (index, node) in items.iter().enumerate() {
            if !matches!(
                node,
                ShapeNode::Geometry(_) | ShapeNode::Group(_) | ShapeNode::Repeater(_)
            ) {
                continue;
            }
            let round_corners: Vec<usize> = items[index + 1..]
                .iter()
                .filter_map(|n| self.as_round_corners(n))
                .chain(parent.round_corners.iter().copied())
                .collect();
            let below = Placement {
                key: key.clone(),
                trim,
                round_corners,
            };
            match *node {
                ShapeNode::Geometry(g) => self.geometries[g].modifiers = below.round_corners,
                ShapeNode::Group(child) => self.place_group(child, &below),
                ShapeNode::Repeater(r) => {
                    let copies: Vec<usize> = self.repeaters[r].copies.iter().map(|c| c.0).collect();
                    for copy in copies {
                        self.place_group(copy, &below);
                    }
                    self.repeaters[r].placement = Some(below);
                }
                _ => {}
            }
        }
    }

    /// Evaluates everything at `frame`. Returns whether any output changed
    /// since the previous call.
    pub fn update(&mut self, frame: f32, resources: &mut Resources) -> bool {
        if self.frame == Some(frame) {
            return false;
        }
        let first = self.frame.is_none();
        self.frame = Some(frame);

        let mut modified = self.transforms.tick(frame);
        for style in &mut self.styles {
            modified |= style.tick(frame);
        }
        for entry in &mut self.modifiers {
            entry.modified = entry.modifier.tick(frame);
            modified |= entry.modified;
        }
        for entry in &mut self.geometries {
            let changed = entry.geometry.tick(frame);
            entry.dirty = changed || entry.output.is_none();
            modified |= entry.dirty;
        }
        // Growing a repeater can append nested repeaters; they are reached
        // by the same loop.
        let mut index = 0;
        while index < self.repeaters.len() {
            modified |= self.update_repeater(index, frame, resources);
            index += 1;
        }
        modified |= self.chains.update(&self.transforms) > 0;
        self.refresh_geometries(&mut resources.pool);

        self.modified = first || modified;
        self.modified
    }

    fn update_repeater(&mut self, index: usize, frame: f32, resources: &mut Resources) -> bool {
        let changed = self.repeaters[index].modifier.tick(frame);
        let wanted = self.repeaters[index].modifier.visible_copies();
        while self.repeaters[index].copies.len() < wanted {
            self.grow_repeater(index, frame, resources);
        }

        let Self {
            repeaters,
            groups,
            transforms,
            ..
        } = self;
        let entry = &mut repeaters[index];
        let resized = entry.visible != wanted;
        entry.visible = wanted;
        for (i, (group, transform)) in entry.copies.iter().enumerate() {
            let shown = i < wanted;
            groups[*group].visible = shown;
            if shown {
                let (matrix, opacity) = entry.modifier.copy(i);
                transforms.drive(*transform, matrix, opacity);
            }
        }
        changed || resized
    }

    /// Builds one more copy and brings it to `frame`.
    fn grow_repeater(&mut self, index: usize, frame: f32, resources: &mut Resources) {
        let (geometries, styles, modifiers, transforms) = (
            self.geometries.len(),
            self.styles.len(),
            self.modifiers.len(),
            self.transforms.len(),
        );
        let template = self.repeaters[index].template.clone();
        let nodes = self.build_items(&template, resources);
        let driven = self.transforms.add_driven();
        let group = self.push_group(None, nodes, Some(driven));
        self.repeaters[index].copies.push((group, driven));
        if let Some(placement) = self.repeaters[index].placement.clone() {
            self.place_group(group, &placement);
        }

        self.transforms.tick_from(transforms, frame);
        for style in &mut self.styles[styles..] {
            style.tick(frame);
        }
        for entry in &mut self.modifiers[modifiers..] {
            entry.modified = entry.modifier.tick(frame);
        }
        for entry in &mut self.geometries[geometries..] {
            entry.geometry.tick(frame);
            entry.dirty = true;
        }
        debug!(
            repeater = ?self.repeaters[index].name,
            copies = self.repeaters[index].copies.len(),
            "built repeater copy"
        );
    }

    fn refresh_geometries(&mut self, pool: &mut PathPool) {
        let Self {
            geometries,
            modifiers,
            ..
        } = self;
        for entry in geometries.iter_mut() {
            let modifier_changed = entry.modifiers.iter().any(|m| modifiers[*m].modified);
            if !entry.dirty && !modifier_changed {
                continue;
            }
            pool.release_all(&mut entry.scratch);
            if let Some(old) = entry.output.take() {
                pool.release(old);
            }

            let mut current = pool.checkout();
            if let Some(path) = pool.get_mut(current) {
                entry.geometry.resolve(path);
            }
            for m in &entry.modifiers {
                let Modifier::RoundCorners(round) = &modifiers[*m].modifier else {
                    continue;
                };
                let next = pool.checkout();
                if let Some((source, target)) = pool.read_write(current, next) {
                    round.modify(source, target);
                }
                entry.scratch.push(current);
                current = next;
            }
            entry.output = Some(current);
            entry.dirty = false;
        }
    }

    /// Returns every pooled path to `pool`.
    pub fn release(&mut self, pool: &mut PathPool) {
        for entry in &mut self.geometries {
            pool.release_all(&mut entry.scratch);
            if let Some(handle) = entry.output.take() {
                pool.release(handle);
            }
            entry.dirty = true;
        }
        self.frame = None;
    }

    pub fn is_modified(&self) -> bool {
        self.modified
    }

    /// Fills and strokes for the last updated frame, bottom first.
    pub fn draws(&self, pool: &PathPool) -> Vec<ShapeDraw> {
        let mut stack = Vec::new();
        let mut draws = Vec::new();
        self.walk(self.root, &mut stack, &mut draws, pool);
        draws.reverse();
        draws
    }

    /// Visits items top first. A style paints every path collected since its
    /// group started.
    fn walk(
        &self,
        id: usize,
        stack: &mut Vec<(usize, ChainId)>,
        draws: &mut Vec<ShapeDraw>,
        pool: &PathPool,
    ) {
        let group = &self.groups[id];
        let Some(chain) = group.chain.filter(|_| group.visible) else {
            return;
        };
        let start = stack.len();
        for node in &group.items {
            match *node {
                ShapeNode::Group(child) => self.walk(child, stack, draws, pool),
                ShapeNode::Geometry(g) => stack.push((g, chain)),
                ShapeNode::Style(s) => {
                    if let Some(draw) = self.draw(s, &stack[start..], chain, group.trim, pool) {
                        draws.push(draw);
                    }
                }
                ShapeNode::Repeater(r) => {
                    let entry = &self.repeaters[r];
                    for i in entry.modifier.draw_order(entry.visible).into_iter().rev() {
                        self.walk(entry.copies[i].0, stack, draws, pool);
                    }
                }
                ShapeNode::Modifier(_) => {}
            }
        }
    }

    fn draw(
        &self,
        style: usize,
        geometries: &[(usize, ChainId)],
        chain: ChainId,
        trim: Option<usize>,
        pool: &PathPool,
    ) -> Option<ShapeDraw> {
        let paths: Vec<BezPath> = geometries
            .iter()
            .filter_map(|(g, c)| {
                let path = pool.get(self.geometries[*g].output?)?;
                (!path.is_empty()).then(|| path.transformed(&self.chains.matrix(*c)).to_bez_path())
            })
            .collect();
        if paths.is_empty() {
            return None;
        }
        let style = &self.styles[style];
        Some(ShapeDraw {
            paint: style.paint(),
            opacity: style.opacity() * self.chains.opacity(chain),
            paths,
            trim: trim.and_then(|m| self.trim(m)),
        })
    }

    fn trim(&self, modifier: usize) -> Option<Trim> {
        match &self.modifiers[modifier].modifier {
            Modifier::Trim(trim) => trim.resolve(),
            Modifier::RoundCorners(_) => None,
        }
    }

    fn child_group(&self, parent: usize, name: &str) -> Option<usize> {
        self.groups[parent].items.iter().find_map(|node| match *node {
            ShapeNode::Group(g) if self.groups[g].name.as_deref() == Some(name) => Some(g),
            ShapeNode::Repeater(r) => self.child_group(self.repeaters[r].copies[0].0, name),
            _ => None,
        })
    }

    /// Looks up a group by its `/`-separated name path from the layer root.
    /// Inside a repeater the first copy answers.
    pub fn find_group(&self, path: &str) -> Option<GroupState> {
        let mut current = self.root;
        for name in path.split('/').filter(|s| !s.is_empty()) {
            current = self.child_group(current, name)?;
        }
        let group = &self.groups[current];
        let chain = group.chain?;
        Some(GroupState {
            matrix: self.chains.matrix(chain),
            opacity: self.chains.opacity(chain),
            visible: group.visible,
        })
    }

    pub fn repeaters(&self) -> Vec<RepeaterStats> {
        self.repeaters
            .iter()
            .map(|r| RepeaterStats {
                name: r.name.clone(),
                visible: r.visible,
                built: r.copies.len(),
            })
            .collect()
    }

    pub fn geometry_count(&self) -> usize {
        self.geometries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::{Paint, ShapePaint};
    use glam::{Vec2, Vec4};
    use kurbo::PathEl;
    use serde_json::{json, Value};

    fn content(items: Value, resources: &mut Resources) -> ShapeContent {
        let shapes: Vec<data::Shape> = serde_json::from_value(items).unwrap();
        ShapeContent::build(&shapes, resources)
    }

    fn rect(x: f32, y: f32, size: f32) -> Value {
        json!({"ty": "rc", "p": {"a": 0, "k": [x, y]}, "s": {"a": 0, "k": [size, size]}, "r": {"a": 0, "k": 0}})
    }

    fn fill(r: f32, g: f32, b: f32) -> Value {
        json!({"ty": "fl", "c": {"a": 0, "k": [r, g, b, 1]}, "o": {"a": 0, "k": 100}})
    }

    fn fill_color(draw: &ShapeDraw) -> Vec4 {
        match &draw.paint {
            ShapePaint::Fill {
                paint: Paint::Solid(c),
                ..
            } => *c,
            other => panic!("expected solid fill, got {other:?}"),
        }
    }

    fn first_point(path: &BezPath) -> Vec2 {
        match path.elements()[0] {
            PathEl::MoveTo(p) => Vec2::new(p.x as f32, p.y as f32),
            ref other => panic!("path starts with {other:?}"),
        }
    }

    #[test]
    fn fill_paints_every_path_above_it() {
        let mut res = Resources::new();
        let mut shapes = content(
            json!([rect(0.0, 0.0, 10.0), rect(20.0, 0.0, 10.0), fill(1.0, 0.0, 0.0)]),
            &mut res,
        );
        assert!(shapes.update(0.0, &mut res));
        let draws = shapes.draws(&res.pool);
        assert_eq!(draws.len(), 1);
        assert_eq!(draws[0].paths.len(), 2);
        assert_eq!(fill_color(&draws[0]), Vec4::new(1.0, 0.0, 0.0, 1.0));
    }

    #[test]
    fn groups_draw_bottom_first() {
        let mut res = Resources::new();
        let mut shapes = content(
            json!([
                {"ty": "gr", "nm": "top", "it": [rect(0.0, 0.0, 10.0), fill(1.0, 0.0, 0.0), {"ty": "tr"}]},
                {"ty": "gr", "nm": "bottom", "it": [rect(0.0, 0.0, 10.0), fill(0.0, 0.0, 1.0), {"ty": "tr"}]}
            ]),
            &mut res,
        );
        shapes.update(0.0, &mut res);
        let draws = shapes.draws(&res.pool);
        assert_eq!(draws.len(), 2);
        assert_eq!(fill_color(&draws[0]).z, 1.0);
        assert_eq!(fill_color(&draws[1]).x, 1.0);
    }

    #[test]
    fn group_transform_and_opacity_reach_paths() {
        let mut res = Resources::new();
        let mut shapes = content(
            json!([{"ty": "gr", "nm": "outer", "it": [
                {"ty": "gr", "nm": "inner", "it": [
                    rect(0.0, 0.0, 10.0), fill(1.0, 1.0, 1.0),
                    {"ty": "tr", "p": {"a": 0, "k": [0, 5]}, "o": {"a": 0, "k": 50}}
                ]},
                {"ty": "tr", "p": {"a": 0, "k": [10, 0]}, "o": {"a": 0, "k": 50}}
            ]}]),
            &mut res,
        );
        shapes.update(0.0, &mut res);
        let draws = shapes.draws(&res.pool);
        assert_eq!(draws.len(), 1);
        assert!((draws[0].opacity - 0.25).abs() < 1e-6);
        // rect path starts at its top-right corner
        assert_eq!(first_point(&draws[0].paths[0]), Vec2::new(15.0, 0.0));

        let inner = shapes.find_group("outer/inner").unwrap();
        assert_eq!(inner.matrix.transform_point2(Vec2::ZERO), Vec2::new(10.0, 5.0));
        assert!(shapes.find_group("outer/missing").is_none());
    }

    #[test]
    fn repeater_places_copies_with_step_powers() {
        let mut res = Resources::new();
        let mut shapes = content(
            json!([
                rect(0.0, 0.0, 10.0),
                fill(1.0, 0.0, 0.0),
                {"ty": "rp", "c": {"a": 0, "k": 3}, "o": {"a": 0, "k": 0}, "m": 1,
                 "tr": {"p": {"a": 0, "k": [20, 0]}, "so": {"a": 0, "k": 100}, "eo": {"a": 0, "k": 100}}}
            ]),
            &mut res,
        );
        shapes.update(0.0, &mut res);
        let draws = shapes.draws(&res.pool);
        assert_eq!(draws.len(), 3);
        // composite above: copy 0 at the bottom
        let xs: Vec<f32> = draws.iter().map(|d| first_point(&d.paths[0]).x).collect();
        assert_eq!(xs, vec![5.0, 25.0, 45.0]);
        assert_eq!(
            shapes.repeaters(),
            vec![RepeaterStats {
                name: None,
                visible: 3,
                built: 3
            }]
        );
    }

    #[test]
    fn shrinking_repeater_hides_copies() {
        let mut res = Resources::new();
        let mut shapes = content(
            json!([
                rect(0.0, 0.0, 10.0),
                fill(1.0, 0.0, 0.0),
                {"ty": "rp", "nm": "row",
                 "c": {"a": 1, "k": [{"t": 0, "s": [4]}, {"t": 10, "s": [1]}]},
                 "o": {"a": 0, "k": 0},
                 "tr": {"p": {"a": 0, "k": [20, 0]}}}
            ]),
            &mut res,
        );
        shapes.update(0.0, &mut res);
        assert_eq!(shapes.draws(&res.pool).len(), 4);
        let live = res.pool.live();

        shapes.update(10.0, &mut res);
        assert_eq!(shapes.draws(&res.pool).len(), 1);
        let stats = &shapes.repeaters()[0];
        assert_eq!((stats.visible, stats.built), (1, 4));
        assert_eq!(res.pool.live(), live);
    }

    #[test]
    fn growing_repeater_builds_copies_on_demand() {
        let mut res = Resources::new();
        let mut shapes = content(
            json!([
                rect(0.0, 0.0, 10.0),
                fill(1.0, 0.0, 0.0),
                {"ty": "rp",
                 "c": {"a": 1, "k": [{"t": 0, "s": [1]}, {"t": 10, "s": [3]}]},
                 "tr": {"p": {"a": 0, "k": [20, 0]}}}
            ]),
            &mut res,
        );
        shapes.update(0.0, &mut res);
        assert_eq!(shapes.repeaters()[0].built, 1);
        assert_eq!(shapes.geometry_count(), 1);

        shapes.update(10.0, &mut res);
        assert_eq!(shapes.repeaters()[0].built, 3);
        assert_eq!(shapes.geometry_count(), 3);
        let xs: Vec<f32> = shapes
            .draws(&res.pool)
            .iter()
            .map(|d| first_point(&d.paths[0]).x)
            .collect();
        assert_eq!(xs, vec![5.0, 25.0, 45.0]);
    }

    #[test]
    fn huge_repeater_count_stops_at_the_cap() {
        let mut res = Resources::new();
        let mut shapes = content(
            json!([
                rect(0.0, 0.0, 10.0),
                fill(1.0, 0.0, 0.0),
                {"ty": "rp", "nm": "runaway", "c": {"a": 0, "k": 1e12},
                 "tr": {"p": {"a": 0, "k": [1, 0]}}}
            ]),
            &mut res,
        );
        shapes.update(0.0, &mut res);
        let stats = &shapes.repeaters()[0];
        assert_eq!(stats.built, crate::modifiers::MAX_REPEATER_COPIES);
        assert_eq!(stats.visible, crate::modifiers::MAX_REPEATER_COPIES);
    }

    #[test]
    fn round_corners_apply_to_paths_above() {
        let mut res = Resources::new();
        let mut shapes = content(
            json!([rect(0.0, 0.0, 20.0), {"ty": "rd", "r": {"a": 0, "k": 4}}, fill(1.0, 0.0, 0.0)]),
            &mut res,
        );
        shapes.update(0.0, &mut res);
        let draws = shapes.draws(&res.pool);
        let curves = draws[0].paths[0]
            .elements()
            .iter()
            .filter(|el| matches!(el, PathEl::CurveTo(..)))
            .count();
        assert_eq!(curves, 8);
    }

    #[test]
    fn trim_is_inherited_by_nested_groups() {
        let mut res = Resources::new();
        let mut shapes = content(
            json!([
                {"ty": "gr", "it": [
                    rect(0.0, 0.0, 10.0),
                    {"ty": "st", "c": {"a": 0, "k": [0, 0, 0]}, "o": {"a": 0, "k": 100}, "w": {"a": 0, "k": 2}},
                    {"ty": "tr"}
                ]},
                {"ty": "tm", "s": {"a": 0, "k": 0}, "e": {"a": 0, "k": 50}, "o": {"a": 0, "k": 0}}
            ]),
            &mut res,
        );
        shapes.update(0.0, &mut res);
        let draws = shapes.draws(&res.pool);
        let trim = draws[0].trim.unwrap();
        assert_eq!((trim.start, trim.end), (0.0, 0.5));
    }

    #[test]
    fn unsupported_and_hidden_items_are_skipped() {
        let mut res = Resources::new();
        let mut shapes = content(
            json!([
                rect(0.0, 0.0, 10.0),
                {"ty": "rc", "hd": true, "p": {"a": 0, "k": [0, 0]}, "s": {"a": 0, "k": [5, 5]}},
                {"ty": "zz", "nm": "zig"},
                {"ty": "nope"},
                fill(1.0, 0.0, 0.0)
            ]),
            &mut res,
        );
        shapes.update(0.0, &mut res);
        let draws = shapes.draws(&res.pool);
        assert_eq!(draws.len(), 1);
        assert_eq!(draws[0].paths.len(), 1);
    }

    #[test]
    fn static_content_settles_and_reuses_paths() {
        let mut res = Resources::new();
        let mut shapes = content(
            json!([
                {"ty": "rc", "p": {"a": 0, "k": [0, 0]}, "r": {"a": 0, "k": 0},
                 "s": {"a": 1, "k": [{"t": 0, "s": [10, 10]}, {"t": 10, "s": [20, 20]}]}},
                fill(1.0, 0.0, 0.0)
            ]),
            &mut res,
        );
        assert!(shapes.update(0.0, &mut res));
        assert!(!shapes.update(0.0, &mut res), "same frame is cached");
        assert!(shapes.update(5.0, &mut res));
        let capacity = res.pool.capacity();
        for frame in 6..10 {
            shapes.update(frame as f32, &mut res);
        }
        assert_eq!(res.pool.capacity(), capacity);
        shapes.update(20.0, &mut res);
        assert!(!shapes.update(21.0, &mut res));

        shapes.release(&mut res.pool);
        assert_eq!(res.pool.live(), 0);
    }
}
