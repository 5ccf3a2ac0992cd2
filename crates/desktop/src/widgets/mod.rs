pub mod control_button;
pub mod overlay_layer;
