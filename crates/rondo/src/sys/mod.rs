pub mod manifest;
pub mod runtime;
pub mod server;
