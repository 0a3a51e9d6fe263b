//! Interactive map core: configuration, zoom/pan, context and the map handle.

pub mod config;
pub mod context;
pub mod error;
pub mod handle;
pub mod render;
pub mod zoom;

pub use config::*;
pub use context::{MapContainer, MapContext};
pub use error::{ConfigurationError, MapError};
pub use handle::Map;
pub use zoom::{GestureEvent, WheelDeltaMode, ZoomBehaviour, ZoomState, fit_bounds};
