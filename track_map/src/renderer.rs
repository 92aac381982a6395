use std::{cell::RefCell, rc::Rc};

use geo_types::Coord;
use geojson::GeoJson;
use thiserror::Error;
use track_lib::geometry::LngLatBounds;

/// The renderer is driven from a single UI thread, so components share it through `Rc<RefCell<_>>`.
/// Components borrow it for one port call at a time and never across a callback.
pub type SharedRenderer<R> = Rc<RefCell<R>>;

pub type ReadyCallback = Box<dyn FnOnce()>;

pub fn shared<R: MapRenderer>(renderer: R) -> SharedRenderer<R> {
    Rc::new(RefCell::new(renderer))
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum RendererError {
    #[error("style is not done loading")]
    NotReady,
    #[error("{kind} `{id}` already exists")]
    Duplicate { kind: &'static str, id: String },
    #[error("{kind} `{id}` does not exist")]
    Missing { kind: &'static str, id: String },
    #[error("source `{0}` is still used by a layer")]
    SourceInUse(String),
    #[error("renderer rejected `{id}`: {reason}")]
    Rejected { id: String, reason: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct LinePaint {
    pub color: String,
    pub width: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FitBoundsOptions {
    pub padding: f64,
    pub max_zoom: Option<f64>,
    pub animate: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlyToOptions {
    pub animate: bool,
}

/// What a marker looks like. Renderers turn this into their native overlay element.
#[derive(Debug, Clone, PartialEq)]
pub struct MarkerElement {
    pub label: String,
    pub color: String,
    pub class_name: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MarkerHandle(pub u64);

/// The capabilities the track subsystem needs from a map engine. Points are `x` = longitude,
/// `y` = latitude.
///
/// `on_ready` registers a callback fired once when the style has loaded. Implementations
/// must not call it from inside `on_ready` itself; when the renderer is already loaded,
/// `is_ready` reports it instead.
pub trait MapRenderer {
    fn add_source(&mut self, id: &str, data: &GeoJson) -> Result<(), RendererError>;
    fn remove_source(&mut self, id: &str) -> Result<(), RendererError>;
    fn has_source(&self, id: &str) -> bool;

    fn add_layer(&mut self, id: &str, source_id: &str, paint: &LinePaint) -> Result<(), RendererError>;
    fn remove_layer(&mut self, id: &str) -> Result<(), RendererError>;
    fn has_layer(&self, id: &str) -> bool;

    /// Starting a new camera animation replaces any animation in flight.
    fn fit_bounds(&mut self, bounds: &LngLatBounds, options: &FitBoundsOptions);
    fn fly_to(&mut self, center: Coord, zoom: f64, options: &FlyToOptions);

    fn add_marker(&mut self, id: &str, coordinates: Coord, element: &MarkerElement) -> Result<MarkerHandle, RendererError>;
    fn remove_marker(&mut self, handle: MarkerHandle);

    fn is_ready(&self) -> bool;
    fn on_ready(&mut self, callback: ReadyCallback);
}
