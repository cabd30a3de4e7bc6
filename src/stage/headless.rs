//! An in-memory stage for tests and windowless hosts.

use std::collections::HashMap;

use super::{LayerId, SpriteSource, Stage};
use crate::assets::AssetError;
use crate::draw2d::Canvas;

/// One recorded stage operation, in call order.
#[derive(Clone, Debug, PartialEq)]
pub enum StageEvent {
    Created(LayerId),
    Disposed(LayerId),
    Attached(LayerId),
    Detached(LayerId),
    Opacity(LayerId, f32),
    SpriteLoaded(String),
}

struct HeadlessLayer {
    label: String,
    opacity: f32,
    canvas: Canvas,
}

/// A [`Stage`] that records every operation instead of rendering.
///
/// Layers hold real canvases, so scenes paint exactly as they would on
/// the windowed stage; sprites are registered by name without decoding
/// pixels. The event log is what the test suite asserts against.
#[derive(Default)]
pub struct HeadlessStage {
    width: u32,
    height: u32,
    next_id: u64,
    layers: HashMap<LayerId, HeadlessLayer>,
    attached: Vec<LayerId>,
    sprites: Vec<String>,
    events: Vec<StageEvent>,
}

impl HeadlessStage {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            ..Default::default()
        }
    }

    /// All recorded events, in call order.
    pub fn events(&self) -> &[StageEvent] {
        &self.events
    }

    /// Drain the event log.
    pub fn take_events(&mut self) -> Vec<StageEvent> {
        std::mem::take(&mut self.events)
    }

    /// Layers currently attached, in composite order.
    pub fn attached(&self) -> &[LayerId] {
        &self.attached
    }

    pub fn is_attached(&self, layer: LayerId) -> bool {
        self.attached.contains(&layer)
    }

    /// Number of live (not disposed) layers.
    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    /// Label a layer was created with, if it is still alive.
    pub fn layer_label(&self, layer: LayerId) -> Option<&str> {
        self.layers.get(&layer).map(|l| l.label.as_str())
    }
}

impl Stage for HeadlessStage {
    fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn create_layer(&mut self, label: &str) -> LayerId {
        let id = LayerId(self.next_id);
        self.next_id += 1;
        self.layers.insert(
            id,
            HeadlessLayer {
                label: label.to_string(),
                opacity: 1.0,
                canvas: Canvas::new(),
            },
        );
        self.events.push(StageEvent::Created(id));
        id
    }

    fn dispose_layer(&mut self, layer: LayerId) {
        if self.layers.remove(&layer).is_some() {
            self.attached.retain(|&l| l != layer);
            self.events.push(StageEvent::Disposed(layer));
        }
    }

    fn attach(&mut self, layer: LayerId) {
        if self.layers.contains_key(&layer) && !self.attached.contains(&layer) {
            self.attached.push(layer);
            self.events.push(StageEvent::Attached(layer));
        }
    }

    fn detach(&mut self, layer: LayerId) {
        if self.attached.contains(&layer) {
            self.attached.retain(|&l| l != layer);
            self.events.push(StageEvent::Detached(layer));
        }
    }

    fn set_opacity(&mut self, layer: LayerId, opacity: f32) {
        if let Some(l) = self.layers.get_mut(&layer) {
            l.opacity = opacity.clamp(0.0, 1.0);
            self.events.push(StageEvent::Opacity(layer, l.opacity));
        }
    }

    fn opacity(&self, layer: LayerId) -> f32 {
        self.layers.get(&layer).map(|l| l.opacity).unwrap_or(1.0)
    }

    fn canvas(&mut self, layer: LayerId) -> Option<&mut Canvas> {
        self.layers.get_mut(&layer).map(|l| &mut l.canvas)
    }

    fn load_sprite(&mut self, name: &str, _source: SpriteSource<'_>) -> Result<(), AssetError> {
        if !self.sprites.iter().any(|s| s == name) {
            self.sprites.push(name.to_string());
        }
        self.events.push(StageEvent::SpriteLoaded(name.to_string()));
        Ok(())
    }

    fn has_sprite(&self, name: &str) -> bool {
        self.sprites.iter().any(|s| s == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attach_detach_round_trip() {
        let mut stage = HeadlessStage::new(320, 240);
        let a = stage.create_layer("a");
        let b = stage.create_layer("b");
        assert_ne!(a, b);

        stage.attach(a);
        stage.attach(a); // second attach ignored
        assert_eq!(stage.attached(), &[a]);

        stage.detach(a);
        assert!(stage.attached().is_empty());
        assert_eq!(stage.layer_count(), 2);
    }

    #[test]
    fn dispose_detaches_and_forgets() {
        let mut stage = HeadlessStage::new(320, 240);
        let a = stage.create_layer("a");
        stage.attach(a);
        stage.dispose_layer(a);
        assert!(!stage.is_attached(a));
        assert_eq!(stage.layer_count(), 0);
        assert!(stage.canvas(a).is_none());
        // Unknown layers read as fully opaque.
        assert_eq!(stage.opacity(a), 1.0);
    }

    #[test]
    fn opacity_is_clamped_and_recorded() {
        let mut stage = HeadlessStage::new(320, 240);
        let a = stage.create_layer("a");
        stage.set_opacity(a, 1.5);
        assert_eq!(stage.opacity(a), 1.0);
        stage.set_opacity(a, -0.25);
        assert_eq!(stage.opacity(a), 0.0);
        assert_eq!(
            stage.events(),
            &[
                StageEvent::Created(a),
                StageEvent::Opacity(a, 1.0),
                StageEvent::Opacity(a, 0.0),
            ]
        );
    }
}
