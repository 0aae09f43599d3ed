pub mod aspect;
pub mod resize;

pub use aspect::closest_dimensions;
pub use resize::{
    prepare_for_model, prepare_for_model_blocking, probe_dimensions, resize_cover, PreparedImage,
};
