use crate::events::AppEvent;
use crate::sys::server::SharedStatus;
use async_channel::Sender;
use std::path::PathBuf;
use std::thread;
use tokio::runtime::Runtime;

/// Runs the control socket and the file watcher on their own thread.
pub fn start_background_services(
    tx: Sender<AppEvent>,
    status: SharedStatus,
    manifest: Option<PathBuf>,
) {
    thread::spawn(move || {
        let rt = match Runtime::new() {
            Ok(rt) => rt,
            Err(e) => {
                log::error!("Failed to create Tokio runtime, running without services: {}", e);
                return;
            }
        };

        rt.block_on(async {
            {
                let tx = tx.clone();
                tokio::spawn(async move {
                    crate::sys::server::run_server(tx, status).await;
                });
            }

            {
                let tx = tx.clone();
                tokio::spawn(async move {
                    crate::config::run_async_watcher(tx, manifest).await;
                });
            }

            std::future::pending::<()>().await;
        });
    });
}
