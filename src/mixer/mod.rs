pub mod audio;
pub mod blend;
pub mod executor;
pub mod image;
#[allow(clippy::module_inception)]
pub mod mixer;
