pub mod precision;
pub mod projection;
pub mod transform;
pub mod vec;

pub use precision::*;
pub use projection::*;
pub use transform::*;
pub use vec::*;
