pub mod radar;
pub mod standard_renderer;
pub mod timeline_bar;
pub mod traits;
pub mod types;
