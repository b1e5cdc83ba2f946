pub mod app;
pub mod media;
pub mod ring;
pub mod theme;
pub mod window;
