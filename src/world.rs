//! Layered spatial world
//!
//! A fixed set of painter's-order layers, each holding a background and a
//! set of owned simulation objects keyed by a world-wide monotonically
//! increasing identifier. The world is agnostic to game semantics: the
//! payload type `B` carries whatever the gameplay layer needs.
//!
//! Exactly one owner mutates the world per frame; the exclusive borrow
//! replaces the defensive lock a shared-static design would need.

use std::collections::BTreeMap;

use glam::Vec2;

use crate::platform::{Image, Renderer};

/// Identifier assigned on insertion, unique for the lifetime of the world.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObjectId(u32);

/// A simulation object: an axis-aligned box with a velocity, an optional
/// renderable image, and a gameplay payload.
#[derive(Debug, Clone)]
pub struct Object<B> {
    pub position: Vec2,
    pub size: Vec2,
    pub velocity: Vec2,
    /// Per-object scalar applied on top of the global frame multiplier.
    pub speed_multiplier: f32,
    pub image: Option<Image>,
    pub body: B,
}

impl<B> Object<B> {
    pub fn new(body: B) -> Self {
        Self {
            position: Vec2::ZERO,
            size: Vec2::ZERO,
            velocity: Vec2::ZERO,
            speed_multiplier: 1.0,
            image: None,
            body,
        }
    }

    /// AABB overlap against another object. Touching edges do not collide.
    pub fn overlaps<C>(&self, other: &Object<C>) -> bool {
        aabb_overlap(self.position, self.size, other.position, other.size)
    }
}

#[derive(Debug, Default)]
struct Layer<B> {
    background: Option<Image>,
    objects: BTreeMap<ObjectId, Object<B>>,
}

/// The spatial world: ordered layers of owned objects.
#[derive(Debug)]
pub struct World<B> {
    layers: Vec<Layer<B>>,
    /// Which layer each live object sits in.
    locations: BTreeMap<ObjectId, usize>,
    next_id: u32,
}

impl<B> World<B> {
    /// Allocate `layer_count` empty layers. Index 0 draws furthest back.
    pub fn new(layer_count: usize) -> Self {
        log::debug!(target: "world", "initializing world with {layer_count} layers");
        let mut layers = Vec::with_capacity(layer_count);
        layers.resize_with(layer_count, || Layer {
            background: None,
            objects: BTreeMap::new(),
        });
        Self {
            layers,
            locations: BTreeMap::new(),
            next_id: 0,
        }
    }

    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    /// Total number of live objects across all layers.
    pub fn len(&self) -> usize {
        self.locations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }

    /// Reset every layer's background and empty every object map. Layer
    /// count and the identifier counter are untouched, so identifiers are
    /// never reused across a clear.
    pub fn clear(&mut self) {
        for layer in &mut self.layers {
            layer.background = None;
            layer.objects.clear();
        }
        self.locations.clear();
        log::debug!(target: "world", "cleared");
    }

    /// Advance every object by `velocity * object_multiplier * multiplier`.
    /// No bounds checking; clamping is each state's own responsibility.
    pub fn update(&mut self, speed_multiplier: f32) {
        for layer in &mut self.layers {
            for object in layer.objects.values_mut() {
                object.position += object.velocity * object.speed_multiplier * speed_multiplier;
            }
        }
    }

    /// Draw layers in ascending index order: background first, then every
    /// object in stable key order.
    pub fn render(&self, renderer: &mut dyn Renderer) {
        for layer in &self.layers {
            if let Some(background) = layer.background {
                renderer.splash(background);
            }
            for object in layer.objects.values() {
                renderer.draw(object.image, object.position, object.size);
            }
        }
    }

    /// Set (or unset) a layer's full-viewport background. Out-of-range
    /// indices are logged and skipped.
    pub fn set_layer_background(&mut self, layer: usize, image: Option<Image>) {
        match self.layers.get_mut(layer) {
            Some(layer) => layer.background = image,
            None => {
                log::debug!(target: "world", "background for out-of-range layer {layer} ignored")
            }
        }
    }

    /// Insert an object into a layer, assigning it the next identifier.
    /// Out-of-range layers are logged and skipped.
    pub fn insert(&mut self, layer: usize, object: Object<B>) -> Option<ObjectId> {
        if layer >= self.layers.len() {
            log::debug!(target: "world", "insert into out-of-range layer {layer} ignored");
            return None;
        }
        let id = ObjectId(self.next_id);
        self.next_id += 1;
        self.layers[layer].objects.insert(id, object);
        self.locations.insert(id, layer);
        Some(id)
    }

    /// Remove an object. Removing an id that is absent (or already removed)
    /// is a no-op.
    pub fn remove(&mut self, id: ObjectId) -> Option<Object<B>> {
        let layer = self.locations.remove(&id)?;
        self.layers[layer].objects.remove(&id)
    }

    pub fn get(&self, id: ObjectId) -> Option<&Object<B>> {
        let layer = *self.locations.get(&id)?;
        self.layers[layer].objects.get(&id)
    }

    pub fn get_mut(&mut self, id: ObjectId) -> Option<&mut Object<B>> {
        let layer = *self.locations.get(&id)?;
        self.layers[layer].objects.get_mut(&id)
    }

    /// Iterate a layer's objects in stable key order.
    pub fn layer_objects(&self, layer: usize) -> impl Iterator<Item = (ObjectId, &Object<B>)> {
        self.layers
            .get(layer)
            .into_iter()
            .flat_map(|layer| layer.objects.iter().map(|(id, object)| (*id, object)))
    }
}

/// Strict-inequality AABB overlap test: boxes that only touch at an edge
/// do not collide.
pub fn aabb_overlap(a_pos: Vec2, a_size: Vec2, b_pos: Vec2, b_size: Vec2) -> bool {
    a_pos.x + a_size.x > b_pos.x
        && a_pos.x < b_pos.x + b_size.x
        && a_pos.y + a_size.y > b_pos.y
        && a_pos.y < b_pos.y + b_size.y
}
