pub mod buffer;
pub mod composite;
pub mod deferred;
pub mod layer;
pub mod pixel_format;
