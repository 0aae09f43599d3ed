pub mod asset;
pub mod dimensions;
pub mod transform;

pub use asset::*;
pub use dimensions::*;
pub use transform::*;
