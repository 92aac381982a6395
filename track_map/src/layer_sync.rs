use std::{
    cell::{Cell, RefCell},
    collections::{BTreeMap, HashSet},
    rc::{Rc, Weak},
};

use geojson::{Feature, GeoJson, Geometry, JsonObject, Value};
use thiserror::Error;
use track_lib::{Track, TrackId, TrackPoint};

use crate::renderer::{LinePaint, MapRenderer, RendererError, SharedRenderer};

pub const LINE_WIDTH: f64 = 3.;

#[derive(Debug, Error)]
pub enum LayerSyncError {
    #[error("renderer mutation failed for layer `{layer_id}`: {source}")]
    RendererMutationFailed {
        layer_id: String,
        #[source]
        source: RendererError,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
struct BindingKey {
    track_id: TrackId,
    segment_index: usize,
}

/// A source/layer pair this synchronizer has put on the map.
#[derive(Debug, Clone)]
struct LayerBinding {
    track_id: TrackId,
    segment_index: usize,
    source_id: String,
    layer_id: String,
}

impl LayerBinding {
    fn new(key: BindingKey) -> Self {
        Self {
            track_id: key.track_id,
            segment_index: key.segment_index,
            source_id: format!("track-{}-{}", key.track_id, key.segment_index),
            layer_id: format!("track-line-{}-{}", key.track_id, key.segment_index),
        }
    }
}

/// One segment of a visible track, captured so it can wait for the renderer.
struct DesiredLayer {
    key: BindingKey,
    color: String,
    positions: Vec<Vec<f64>>,
}

impl DesiredLayer {
    fn source_data(&self) -> GeoJson {
        GeoJson::Feature(Feature {
            bbox: None,
            geometry: Some(Geometry::new(Value::LineString(self.positions.clone()))),
            id: None,
            properties: Some(JsonObject::new()),
            foreign_members: None,
        })
    }
}

fn desired_layers(tracks: &[Track]) -> Vec<DesiredLayer> {
    tracks
        .iter()
        .filter(|track| track.visible())
        .flat_map(|track| {
            track.segments().iter().enumerate().map(move |(segment_index, segment)| DesiredLayer {
                key: BindingKey {
                    track_id: track.id(),
                    segment_index,
                },
                color: track.color().to_string(),
                positions: segment.points.iter().map(TrackPoint::to_position).collect(),
            })
        })
        .collect()
}

enum SyncState {
    /// Renderer still loading. Only the latest request is kept.
    Pending { latest: Option<Vec<DesiredLayer>>, subscribed: bool },
    Ready,
}

struct SyncInner<R> {
    renderer: SharedRenderer<R>,
    bindings: BTreeMap<BindingKey, LayerBinding>,
    state: SyncState,
}

impl<R: MapRenderer> SyncInner<R> {
    /// Applies `desired` or parks it until the renderer is ready. Returns true when the
    /// caller has to subscribe to the ready signal.
    fn submit(&mut self, desired: Vec<DesiredLayer>, ready_signalled: bool) -> bool {
        if matches!(self.state, SyncState::Pending { .. }) && (ready_signalled || self.renderer.borrow().is_ready()) {
            self.state = SyncState::Ready;
        }

        match &mut self.state {
            SyncState::Ready => {}
            SyncState::Pending { latest, subscribed } => {
                tracing::debug!("Renderer not ready, deferring {} track layers", desired.len());
                *latest = Some(desired);
                return !std::mem::replace(subscribed, true);
            }
        }

        self.apply(&desired);
        false
    }

    fn mark_ready(&mut self) -> Option<Vec<DesiredLayer>> {
        match std::mem::replace(&mut self.state, SyncState::Ready) {
            SyncState::Pending { latest, .. } => latest,
            SyncState::Ready => None,
        }
    }

    fn apply(&mut self, desired: &[DesiredLayer]) {
        let wanted = desired.iter().map(|layer| layer.key).collect::<HashSet<_>>();
        let stale = self.bindings.keys().filter(|key| !wanted.contains(key)).copied().collect::<Vec<_>>();

        // All removals go first so a re-added id never collides with one on its way out
        let removed = stale.into_iter().filter(|key| self.unbind(*key)).count();

        let mut added = 0;
        for layer in desired {
            if self.bindings.get(&layer.key).is_some_and(|binding| self.on_map(binding)) {
                continue;
            }
            match self.bind(layer) {
                Ok(binding) => {
                    self.bindings.insert(layer.key, binding);
                    added += 1;
                }
                Err(err) => {
                    tracing::warn!("{err}, skipping");
                    self.keep_leftovers(layer.key);
                }
            }
        }

        tracing::debug!("Reconciled track layers: {} added, {} removed, {} bound", added, removed, self.bindings.len());
    }

    /// Both halves of the pair are on the map.
    fn on_map(&self, binding: &LayerBinding) -> bool {
        let renderer = self.renderer.borrow();
        renderer.has_layer(&binding.layer_id) && renderer.has_source(&binding.source_id)
    }

    /// After a failed bind, keeps a binding for whatever the renderer still holds under the
    /// key's ids so a later reconcile or `clear` can remove it. Drops the binding otherwise.
    fn keep_leftovers(&mut self, key: BindingKey) {
        let binding = LayerBinding::new(key);
        let held = {
            let renderer = self.renderer.borrow();
            renderer.has_layer(&binding.layer_id) || renderer.has_source(&binding.source_id)
        };
        if held {
            tracing::debug!("Keeping partial binding for {}", binding.layer_id);
            self.bindings.insert(key, binding);
        } else {
            self.bindings.remove(&key);
        }
    }

    fn bind(&mut self, layer: &DesiredLayer) -> Result<LayerBinding, LayerSyncError> {
        let binding = LayerBinding::new(layer.key);
        let failed = |source| LayerSyncError::RendererMutationFailed {
            layer_id: binding.layer_id.clone(),
            source,
        };

        let mut renderer = self.renderer.borrow_mut();
        remove_pair(&mut *renderer, &binding.layer_id, &binding.source_id).map_err(failed)?;
        renderer.add_source(&binding.source_id, &layer.source_data()).map_err(failed)?;

        let paint = LinePaint {
            color: layer.color.clone(),
            width: LINE_WIDTH,
        };
        if let Err(err) = renderer.add_layer(&binding.layer_id, &binding.source_id, &paint) {
            if let Err(rollback) = renderer.remove_source(&binding.source_id) {
                tracing::warn!("Could not roll back source {}: {rollback}", binding.source_id);
            }
            return Err(failed(err));
        }

        Ok(binding)
    }

    /// Returns true when the binding is gone. A binding whose objects the renderer still
    /// holds after a failed removal is kept, so bindings never claim less than is on the map.
    /// `apply` re-binds such a half-removed pair when its segment is wanted again.
    fn unbind(&mut self, key: BindingKey) -> bool {
        let Some(binding) = self.bindings.get(&key).cloned() else {
            return false;
        };

        let mut renderer = self.renderer.borrow_mut();
        match remove_pair(&mut *renderer, &binding.layer_id, &binding.source_id) {
            Ok(()) => {}
            Err(err) => {
                let err = LayerSyncError::RendererMutationFailed {
                    layer_id: binding.layer_id.clone(),
                    source: err,
                };
                tracing::warn!("{err}, skipping");
                if renderer.has_layer(&binding.layer_id) || renderer.has_source(&binding.source_id) {
                    return false;
                }
            }
        }

        tracing::trace!("Unbound segment {} of track {}", binding.segment_index, binding.track_id);
        self.bindings.remove(&key);
        true
    }

    fn unbind_all(&mut self, keys: Vec<BindingKey>) {
        for key in keys {
            self.unbind(key);
        }
    }
}

/// Layer before source, skipping whatever the renderer does not have.
fn remove_pair<R: MapRenderer + ?Sized>(renderer: &mut R, layer_id: &str, source_id: &str) -> Result<(), RendererError> {
    if renderer.has_layer(layer_id) {
        renderer.remove_layer(layer_id)?;
    }
    if renderer.has_source(source_id) {
        renderer.remove_source(source_id)?;
    }
    Ok(())
}

struct Shared<R> {
    inner: RefCell<SyncInner<R>>,
    /// Latest request made while a reconcile was already running.
    coalesced: RefCell<Option<Vec<DesiredLayer>>>,
    ready_signalled: Cell<bool>,
}

impl<R: MapRenderer + 'static> Shared<R> {
    fn reconcile(self: &Rc<Self>, desired: Vec<DesiredLayer>) {
        let mut next = Some(desired);
        while let Some(desired) = next.take() {
            let Ok(mut inner) = self.inner.try_borrow_mut() else {
                tracing::debug!("Reconcile requested while one is running, coalescing");
                *self.coalesced.borrow_mut() = Some(desired);
                return;
            };
            let subscribe = inner.submit(desired, self.ready_signalled.get());
            let renderer = inner.renderer.clone();
            drop(inner);

            if subscribe {
                let shared: Weak<Self> = Rc::downgrade(self);
                renderer.borrow_mut().on_ready(Box::new(move || {
                    if let Some(shared) = shared.upgrade() {
                        shared.signal_ready();
                    }
                }));
            }

            next = self.coalesced.borrow_mut().take();
            if next.is_none() && self.ready_signalled.get() {
                next = self.inner.borrow_mut().mark_ready();
            }
        }
    }

    fn signal_ready(self: &Rc<Self>) {
        tracing::debug!("Renderer ready");
        self.ready_signalled.set(true);

        // When a reconcile is running it picks the signal up itself
        let latest = match self.inner.try_borrow_mut() {
            Ok(mut inner) => inner.mark_ready(),
            Err(_) => None,
        };
        if let Some(desired) = latest {
            self.reconcile(desired);
        }
    }
}

/// Keeps the renderer's track line layers equal to the segments of the visible tracks.
///
/// Each segment gets its own source and layer. Bindings that are already on the map are left
/// alone, so calling [`reconcile`](Self::reconcile) again with the same tracks does nothing.
/// Before the renderer has loaded, only the most recent request is remembered and applied
/// once the renderer signals that it is ready.
///
/// The synchronizer owns every source and layer it creates. Nothing else may remove them.
pub struct LayerSynchronizer<R: MapRenderer + 'static> {
    shared: Rc<Shared<R>>,
}

impl<R: MapRenderer + 'static> LayerSynchronizer<R> {
    pub fn new(renderer: SharedRenderer<R>) -> Self {
        Self {
            shared: Rc::new(Shared {
                inner: RefCell::new(SyncInner {
                    renderer,
                    bindings: BTreeMap::new(),
                    state: SyncState::Pending {
                        latest: None,
                        subscribed: false,
                    },
                }),
                coalesced: RefCell::new(None),
                ready_signalled: Cell::new(false),
            }),
        }
    }

    /// Adds layers for newly visible segments and removes those no longer wanted.
    ///
    /// A renderer failure for one segment is logged and skipped; the rest still render.
    /// Calls made from a renderer callback while a reconcile is running are coalesced and
    /// run after it, latest input only.
    pub fn reconcile(&self, tracks: &[Track]) {
        self.shared.reconcile(desired_layers(tracks));
    }

    /// Takes one track's layers off the map. Call before dropping a track.
    pub fn remove_track(&self, track_id: TrackId) {
        let Ok(mut inner) = self.shared.inner.try_borrow_mut() else {
            tracing::warn!("Cannot remove track {} while reconciling", track_id);
            return;
        };
        let keys = inner.bindings.keys().filter(|key| key.track_id == track_id).copied().collect();
        inner.unbind_all(keys);
    }

    /// Removes every layer and source this synchronizer created and forgets any pending request.
    pub fn clear(&self) {
        let Ok(mut inner) = self.shared.inner.try_borrow_mut() else {
            tracing::warn!("Cannot clear track layers while reconciling");
            return;
        };
        if let SyncState::Pending { latest, .. } = &mut inner.state {
            *latest = None;
        }
        self.shared.coalesced.borrow_mut().take();

        let keys = inner.bindings.keys().copied().collect();
        inner.unbind_all(keys);
        tracing::debug!("Cleared track layers, {} left bound", inner.bindings.len());
    }

    pub fn is_ready(&self) -> bool {
        match self.shared.inner.try_borrow() {
            Ok(inner) => matches!(inner.state, SyncState::Ready),
            // Only a pass applying changes calls into the renderer, and that needs Ready
            Err(_) => true,
        }
    }

    /// `(track, segment index)` of every segment whose layer is on the map, in key order.
    /// Empty when asked from a renderer callback in the middle of a reconcile.
    pub fn bound_segments(&self) -> Vec<(TrackId, usize)> {
        let Ok(inner) = self.shared.inner.try_borrow() else {
            tracing::warn!("Bound segments requested while reconciling");
            return Vec::new();
        };
        let Ok(renderer) = inner.renderer.try_borrow() else {
            tracing::warn!("Bound segments requested while the renderer is busy");
            return Vec::new();
        };
        inner
            .bindings
            .values()
            .filter(|binding| renderer.has_layer(&binding.layer_id))
            .map(|binding| (binding.track_id, binding.segment_index))
            .collect()
    }
}

impl<R: MapRenderer + 'static> Drop for LayerSynchronizer<R> {
    fn drop(&mut self) {
        self.clear();
    }
}
