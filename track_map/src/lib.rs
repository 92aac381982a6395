pub mod renderer;
pub mod layer_sync;
pub mod viewport;
pub mod markers;
pub mod trip_overlay;

#[cfg(any(test, feature = "test-util"))]
pub mod recording;

pub use layer_sync::LayerSynchronizer;
pub use markers::{MarkerManager, MarkerStyle};
pub use renderer::{MapRenderer, RendererError, SharedRenderer};
pub use trip_overlay::TripOverlay;
pub use viewport::ViewportFitter;
