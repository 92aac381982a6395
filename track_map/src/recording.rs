//! In-memory renderer that records every port call. Behaves like a typical web map engine:
//! nothing can be added before the style loads, ids are unique and a source cannot go
//! while a layer still uses it.

use std::collections::{HashMap, HashSet};

use geo_types::Coord;
use geojson::GeoJson;
use track_lib::geometry::LngLatBounds;

use crate::renderer::{
    FitBoundsOptions, FlyToOptions, LinePaint, MapRenderer, MarkerElement, MarkerHandle, ReadyCallback, RendererError, SharedRenderer,
};

#[derive(Debug, Clone, PartialEq)]
pub enum RendererCall {
    AddSource(String),
    RemoveSource(String),
    AddLayer(String),
    RemoveLayer(String),
    FitBounds(LngLatBounds, FitBoundsOptions),
    FlyTo(Coord, f64),
    AddMarker(String, Coord),
    RemoveMarker(MarkerHandle),
}

impl RendererCall {
    fn is_layer_mutation(&self) -> bool {
        matches!(self, Self::AddSource(_) | Self::RemoveSource(_) | Self::AddLayer(_) | Self::RemoveLayer(_))
    }
}

#[derive(Debug, Clone)]
pub struct RecordedLayer {
    pub id: String,
    pub source_id: String,
    pub paint: LinePaint,
}

#[derive(Debug, Clone)]
pub struct RecordedMarker {
    pub id: String,
    pub coordinates: Coord,
    pub element: MarkerElement,
}

#[derive(Default)]
pub struct RecordingRenderer {
    pub calls: Vec<RendererCall>,
    pub sources: HashMap<String, GeoJson>,
    /// In insertion order, which is drawing order.
    pub layers: Vec<RecordedLayer>,
    pub markers: HashMap<MarkerHandle, RecordedMarker>,
    ready: bool,
    ready_callbacks: Vec<ReadyCallback>,
    failing_ids: HashSet<String>,
    failing_removals: HashSet<String>,
    next_marker: u64,
    layer_hook: Option<Box<dyn FnMut(&str)>>,
}

impl RecordingRenderer {
    pub fn ready() -> Self {
        Self {
            ready: true,
            ..Default::default()
        }
    }

    pub fn loading() -> Self {
        Self::default()
    }

    /// Finishes "loading" and fires the ready callbacks with the renderer released.
    pub fn finish_loading(renderer: &SharedRenderer<Self>) {
        let callbacks = {
            let mut renderer = renderer.borrow_mut();
            renderer.ready = true;
            std::mem::take(&mut renderer.ready_callbacks)
        };
        for callback in callbacks {
            callback();
        }
    }

    pub fn ready_callback_count(&self) -> usize {
        self.ready_callbacks.len()
    }

    /// Every add or remove touching `id` fails from now on.
    pub fn fail_on(&mut self, id: impl Into<String>) {
        self.failing_ids.insert(id.into());
    }

    /// Only removals of `id` fail; adding it still works.
    pub fn fail_removal_of(&mut self, id: impl Into<String>) {
        self.failing_removals.insert(id.into());
    }

    pub fn stop_failing(&mut self, id: &str) {
        self.failing_ids.remove(id);
        self.failing_removals.remove(id);
    }

    /// Called after each successful `add_layer`, while the renderer is still borrowed.
    pub fn on_layer_added(&mut self, hook: impl FnMut(&str) + 'static) {
        self.layer_hook = Some(Box::new(hook));
    }

    pub fn take_calls(&mut self) -> Vec<RendererCall> {
        std::mem::take(&mut self.calls)
    }

    pub fn layer_mutations(&self) -> usize {
        self.calls.iter().filter(|call| call.is_layer_mutation()).count()
    }

    pub fn layer_ids(&self) -> Vec<&str> {
        self.layers.iter().map(|layer| layer.id.as_str()).collect()
    }

    pub fn layer(&self, id: &str) -> Option<&RecordedLayer> {
        self.layers.iter().find(|layer| layer.id == id)
    }

    pub fn markers_at(&self, coordinates: impl Into<Coord>) -> Vec<&RecordedMarker> {
        let coordinates = coordinates.into();
        self.markers.values().filter(|marker| marker.coordinates == coordinates).collect()
    }

    pub fn last_fit(&self) -> Option<(LngLatBounds, FitBoundsOptions)> {
        self.calls.iter().rev().find_map(|call| match call {
            RendererCall::FitBounds(bounds, options) => Some((*bounds, *options)),
            _ => None,
        })
    }

    fn check(&self, id: &str) -> Result<(), RendererError> {
        if !self.ready {
            return Err(RendererError::NotReady);
        }
        self.check_failing(id)
    }

    fn check_removal(&self, id: &str) -> Result<(), RendererError> {
        self.check(id)?;
        if self.failing_removals.contains(id) {
            return Err(RendererError::Rejected {
                id: id.to_string(),
                reason: "injected removal failure".to_string(),
            });
        }
        Ok(())
    }

    fn check_failing(&self, id: &str) -> Result<(), RendererError> {
        if self.failing_ids.contains(id) {
            return Err(RendererError::Rejected {
                id: id.to_string(),
                reason: "injected failure".to_string(),
            });
        }
        Ok(())
    }
}

impl MapRenderer for RecordingRenderer {
    fn add_source(&mut self, id: &str, data: &GeoJson) -> Result<(), RendererError> {
        self.calls.push(RendererCall::AddSource(id.to_string()));
        self.check(id)?;
        if self.sources.contains_key(id) {
            return Err(RendererError::Duplicate { kind: "source", id: id.to_string() });
        }
        self.sources.insert(id.to_string(), data.clone());
        Ok(())
    }

    fn remove_source(&mut self, id: &str) -> Result<(), RendererError> {
        self.calls.push(RendererCall::RemoveSource(id.to_string()));
        self.check_removal(id)?;
        if self.layers.iter().any(|layer| layer.source_id == id) {
            return Err(RendererError::SourceInUse(id.to_string()));
        }
        self.sources
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| RendererError::Missing { kind: "source", id: id.to_string() })
    }

    fn has_source(&self, id: &str) -> bool {
        self.sources.contains_key(id)
    }

    fn add_layer(&mut self, id: &str, source_id: &str, paint: &LinePaint) -> Result<(), RendererError> {
        self.calls.push(RendererCall::AddLayer(id.to_string()));
        self.check(id)?;
        if self.has_layer(id) {
            return Err(RendererError::Duplicate { kind: "layer", id: id.to_string() });
        }
        if !self.has_source(source_id) {
            return Err(RendererError::Missing { kind: "source", id: source_id.to_string() });
        }
        self.layers.push(RecordedLayer {
            id: id.to_string(),
            source_id: source_id.to_string(),
            paint: paint.clone(),
        });

        if let Some(mut hook) = self.layer_hook.take() {
            hook(id);
            self.layer_hook = Some(hook);
        }
        Ok(())
    }

    fn remove_layer(&mut self, id: &str) -> Result<(), RendererError> {
        self.calls.push(RendererCall::RemoveLayer(id.to_string()));
        self.check_removal(id)?;
        let Some(index) = self.layers.iter().position(|layer| layer.id == id) else {
            return Err(RendererError::Missing { kind: "layer", id: id.to_string() });
        };
        self.layers.remove(index);
        Ok(())
    }

    fn has_layer(&self, id: &str) -> bool {
        self.layers.iter().any(|layer| layer.id == id)
    }

    fn fit_bounds(&mut self, bounds: &LngLatBounds, options: &FitBoundsOptions) {
        self.calls.push(RendererCall::FitBounds(*bounds, *options));
    }

    fn fly_to(&mut self, center: Coord, zoom: f64, _options: &FlyToOptions) {
        self.calls.push(RendererCall::FlyTo(center, zoom));
    }

    fn add_marker(&mut self, id: &str, coordinates: Coord, element: &MarkerElement) -> Result<MarkerHandle, RendererError> {
        self.calls.push(RendererCall::AddMarker(id.to_string(), coordinates));
        self.check_failing(id)?;
        self.next_marker += 1;
        let handle = MarkerHandle(self.next_marker);
        self.markers.insert(
            handle,
            RecordedMarker {
                id: id.to_string(),
                coordinates,
                element: element.clone(),
            },
        );
        Ok(handle)
    }

    fn remove_marker(&mut self, handle: MarkerHandle) {
        self.calls.push(RendererCall::RemoveMarker(handle));
        self.markers.remove(&handle);
    }

    fn is_ready(&self) -> bool {
        self.ready
    }

    fn on_ready(&mut self, callback: ReadyCallback) {
        self.ready_callbacks.push(callback);
    }
}
