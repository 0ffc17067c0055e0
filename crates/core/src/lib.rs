pub mod audio;
pub mod pipeline;
pub mod project;
pub mod segment;
pub mod shared;
pub mod translation;
pub mod video;
pub mod voice;
