use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use crossbeam_channel::{Receiver, Sender};

use facelens_core::detection::domain::detector_options::DetectorOptions;
use facelens_core::detection::infrastructure::detector_factory::{create_detector, ExpressionModel};
use facelens_core::detection::infrastructure::expression_detector::ExpressionDetector;

pub enum LoaderMessage {
    DownloadProgress(u64, u64),
    Ready(ExpressionDetector),
    Error(String),
}

impl std::fmt::Debug for LoaderMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoaderMessage::DownloadProgress(dl, total) => {
                write!(f, "DownloadProgress({dl}, {total})")
            }
            LoaderMessage::Ready(_) => write!(f, "Ready"),
            LoaderMessage::Error(e) => write!(f, "Error({e})"),
        }
    }
}

/// Handle to a detector being built in the background. Dropping it
/// abandons the result.
pub struct DetectorLoader {
    pub messages: Receiver<LoaderMessage>,
    cancelled: Arc<AtomicBool>,
}

impl Drop for DetectorLoader {
    fn drop(&mut self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }
}

/// Resolves the models (downloading them on first run) and builds the
/// detection adapter off the UI thread.
pub fn spawn(options: DetectorOptions, expressions: ExpressionModel) -> DetectorLoader {
    let (tx, rx) = crossbeam_channel::unbounded::<LoaderMessage>();
    let cancelled = Arc::new(AtomicBool::new(false));
    let cancelled_clone = cancelled.clone();

    thread::spawn(move || {
        let message = match load(&tx, &options, &expressions) {
            Ok(detector) => LoaderMessage::Ready(detector),
            Err(e) => LoaderMessage::Error(e.to_string()),
        };
        if cancelled_clone.load(Ordering::Relaxed) {
            log::debug!("Detector load abandoned");
            return;
        }
        let _ = tx.send(message);
    });

    DetectorLoader {
        messages: rx,
        cancelled,
    }
}

fn load(
    tx: &Sender<LoaderMessage>,
    options: &DetectorOptions,
    expressions: &ExpressionModel,
) -> Result<ExpressionDetector, Box<dyn std::error::Error>> {
    let tx_dl = tx.clone();
    create_detector(
        options,
        expressions,
        Some(Box::new(move |downloaded, total| {
            let _ = tx_dl.send(LoaderMessage::DownloadProgress(downloaded, total));
        })),
    )
}
