use relm4::prelude::*;
use rondo::config;
use rondo::gui::app::{AppInit, AppModel};
use rondo::gui::ring::Artwork;
use rondo::sys::manifest::{self, ManifestError};
use rondo::sys::runtime;
use rondo::sys::server::SharedStatus;

fn main() {
    env_logger::init();

    let config = config::load_or_setup();

    let Some(manifest_path) = manifest::locate(config.manifest.as_deref()) else {
        log::error!("{}", ManifestError::NotFound);
        std::process::exit(1);
    };
    let mut cards = match manifest::load(&manifest_path) {
        Ok(cards) => cards,
        Err(e) => {
            log::error!("Failed to load {}: {}", manifest_path.display(), e);
            std::process::exit(1);
        }
    };
    if cards.is_empty() {
        log::error!("{} has no image blocks to show", manifest_path.display());
        std::process::exit(1);
    }
    let artwork = Artwork::load(&mut cards);

    let (tx, rx) = async_channel::bounded(32);
    let status = SharedStatus::default();

    // Start Background Services
    runtime::start_background_services(tx, status.clone(), Some(manifest_path));

    let app = RelmApp::new("org.troia.rondo");

    app.run::<AppModel>(AppInit {
        config,
        cards,
        artwork,
        status,
        rx,
    });
}
