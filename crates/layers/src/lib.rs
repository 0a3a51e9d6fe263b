pub mod canvas;
pub mod layer;
pub mod line;
pub mod point;
pub mod polygon;
pub mod prerendered;
pub mod registry;
pub mod symbology;
#[cfg(feature = "web")]
pub mod web;

pub use canvas::*;
pub use layer::*;
pub use line::LineLayer;
pub use point::PointLayer;
pub use polygon::PolygonLayer;
pub use prerendered::PrerenderedLayer;
pub use registry::LayerRegistry;
pub use symbology::*;
