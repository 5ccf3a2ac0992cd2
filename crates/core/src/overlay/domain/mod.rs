pub mod overlay_renderer;
pub mod overlay_style;
pub mod overlay_surface;
