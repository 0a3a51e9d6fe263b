pub mod path;
pub mod picking;
pub mod projection;
pub mod spatial;

pub use path::*;
pub use picking::*;
pub use projection::*;
