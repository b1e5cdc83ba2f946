use crate::config::{WindowConfig, WindowMode};
use gtk::prelude::*;
use gtk4 as gtk;
use gtk4_layer_shell::{Edge, Layer, LayerShell};

/// Fullscreen overlay surface covering the whole output.
pub fn init_layer_shell(window: &gtk::ApplicationWindow) {
    window.init_layer_shell();
    window.set_layer(Layer::Overlay);
    window.set_namespace(Some("rondo"));
    window.set_exclusive_zone(-1);
    for edge in [Edge::Left, Edge::Right, Edge::Top, Edge::Bottom] {
        window.set_anchor(edge, true);
    }
    window.set_keyboard_mode(gtk4_layer_shell::KeyboardMode::OnDemand);
}

pub fn configure(window: &gtk::ApplicationWindow, config: &WindowConfig) {
    match config.mode {
        WindowMode::Layer if gtk4_layer_shell::is_supported() => init_layer_shell(window),
        WindowMode::Layer => {
            log::warn!("Layer shell unavailable, falling back to a regular window");
            window.set_default_size(config.width, config.height);
        }
        WindowMode::Windowed => window.set_default_size(config.width, config.height),
    }
}
