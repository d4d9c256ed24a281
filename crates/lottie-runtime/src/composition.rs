//! A list of layers sharing one timeline: the document root or the contents
//! of a precomposition asset.

use crate::assets::AssetTracker;
use crate::container::DynamicProperty;
use crate::layer::Layer;
use crate::pool::{PathPool, Resources};
use crate::renderer::RenderNode;
use crate::shapes::GroupState;
use crate::transform::{ChainCache, ChainKey, TransformFlags, TransformProperties, TransformStore};
use glam::Mat3;
use lottie_data::model as data;
use std::collections::HashMap;
use tracing::{debug, warn};

/// Shared state while a document is turned into runtime nodes.
pub(crate) struct BuildContext<'a> {
    pub document: &'a data::Document,
    pub resources: &'a mut Resources,
    /// Precomposition assets currently being built, outermost first.
    pub nesting: Vec<String>,
}

impl<'a> BuildContext<'a> {
    pub fn new(document: &'a data::Document, resources: &'a mut Resources) -> Self {
        Self {
            document,
            resources,
            nesting: Vec::new(),
        }
    }
}

/// Resolved state of one layer, for inspection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayerState {
    /// Parenting included, relative to the enclosing composition.
    pub matrix: Mat3,
    pub opacity: f32,
    pub visible: bool,
}

#[derive(Debug, Clone)]
pub struct Composition {
    /// Top layer first, as exported.
    layers: Vec<Layer>,
    transforms: TransformStore,
    chains: ChainCache,
    frame: Option<f32>,
}

impl Composition {
    pub(crate) fn build(layers: &[data::Layer], context: &mut BuildContext<'_>) -> Self {
        let mut transforms = TransformStore::new();
        let mut built = Vec::with_capacity(layers.len());
        for layer in layers {
            let flags = TransformFlags {
                auto_orient: layer.ao == Some(1),
                three_d: layer.is_3d(),
            };
            let transform = transforms.add(TransformProperties::from_data(
                &layer.ks,
                flags,
                &mut context.resources.easing,
            ));
            built.push(Layer::build(layer, transform, context));
        }

        let mut composition = Self {
            layers: built,
            transforms,
            chains: ChainCache::new(),
            frame: None,
        };
        composition.link_parents();
        debug!(
            layers = composition.layers.len(),
            chains = composition.chains.len(),
            "built composition"
        );
        composition
    }

    /// Interns each layer's parenting chain, outermost parent first.
    fn link_parents(&mut self) {
        let by_index: HashMap<u32, usize> = self
            .layers
            .iter()
            .enumerate()
            .filter_map(|(i, l)| l.index().map(|ind| (ind, i)))
            .collect();

        for i in 0..self.layers.len() {
            let mut key: ChainKey = Vec::new();
            let mut visited = Vec::new();
            let mut current = Some(i);
            while let Some(c) = current {
                if visited.contains(&c) {
                    warn!(layer = self.layers[i].name(), "parenting cycle, cutting chain");
                    break;
                }
                visited.push(c);
                key.push(self.layers[c].transform());
                current = self.layers[c].parent().and_then(|parent| {
                    let found = by_index.get(&parent).copied();
                    if found.is_none() && c == i {
                        warn!(layer = self.layers[c].name(), parent, "parent layer not found");
                    }
                    found
                });
            }
            key.reverse();
            let chain = self.chains.intern(key);
            self.layers[i].set_chain(chain);
        }
    }

    /// Evaluates every layer at `frame`. Transforms and parenting chains are
    /// resolved before any layer content.
    pub fn update(&mut self, frame: f32, overlap: bool, resources: &mut Resources) -> bool {
        if self.frame == Some(frame) {
            return false;
        }
        self.frame = Some(frame);

        let mut modified = self.transforms.tick(frame);
        modified |= self.chains.update(&self.transforms) > 0;
        for layer in &mut self.layers {
            modified |= layer.update(frame, overlap, resources);
        }
        modified
    }

    pub fn frame(&self) -> Option<f32> {
        self.frame
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    /// Layer nodes listed bottom to top.
    pub fn render_children(&self, pool: &PathPool, assets: &AssetTracker) -> Vec<RenderNode> {
        self.layers
            .iter()
            .rev()
            .map(|layer| layer.render(&self.transforms, &self.chains, pool, assets))
            .collect()
    }

    pub fn render(&self, pool: &PathPool, assets: &AssetTracker) -> RenderNode {
        RenderNode::group(None, self.render_children(pool, assets))
    }

    fn layer(&self, path: &str) -> Option<(&Composition, &Layer)> {
        let mut names = path.split('/').filter(|s| !s.is_empty()).peekable();
        let mut composition = self;
        while let Some(name) = names.next() {
            let layer = composition
                .layers
                .iter()
                .find(|l| l.name() == Some(name))?;
            if names.peek().is_none() {
                return Some((composition, layer));
            }
            composition = layer.precomp()?;
        }
        None
    }

    /// Looks up a layer by its `/`-separated name path, descending through
    /// precompositions.
    pub fn find(&self, path: &str) -> Option<LayerState> {
        let (composition, layer) = self.layer(path)?;
        Some(LayerState {
            matrix: layer
                .chain()
                .map(|c| composition.chains.matrix(c))
                .unwrap_or(Mat3::IDENTITY),
            opacity: composition.transforms.opacity(layer.transform()),
            visible: layer.is_visible(),
        })
    }

    /// Looks up a shape group inside the shape layer at `layer_path`.
    pub fn find_shape_group(&self, layer_path: &str, group_path: &str) -> Option<GroupState> {
        let (_, layer) = self.layer(layer_path)?;
        layer.shapes()?.find_group(group_path)
    }

    /// Returns every pooled path held by this composition.
    pub fn release(&mut self, pool: &mut PathPool) {
        for layer in &mut self.layers {
            layer.release(pool);
        }
        self.frame = None;
    }
}
