pub mod geojson;
pub mod svg;

pub use geojson::*;
pub use svg::*;
