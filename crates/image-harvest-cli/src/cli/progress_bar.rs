//! Terminal spinner driven by pipeline progress events.

use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;

use crate::progress::{ProgressEventKind, ProgressReceiver};

fn describe(event: &ProgressEventKind) -> String {
    match event {
        ProgressEventKind::CategoryStarted { category, searches } => {
            format!("{category}: {searches} searches")
        }
        ProgressEventKind::SearchCompleted { term, found } => {
            format!("'{term}': {found} results")
        }
        ProgressEventKind::UrlsFiltered {
            term,
            kept,
            dropped,
        } => format!("'{term}': {kept} images, {dropped} dropped"),
        ProgressEventKind::DownloadCompleted {
            term,
            saved,
            failed,
        } => format!("'{term}': saved {saved}, failed {failed}"),
        ProgressEventKind::Resized {
            category,
            resized,
            total,
        } => format!("{category}: resized {resized}/{total}"),
        ProgressEventKind::Pruned { category, failed } => {
            format!("{category}: removed {failed} unreadable")
        }
        ProgressEventKind::CategoryCompleted {
            category,
            elapsed_ms,
        } => format!("{category}: done in {:.1}s", *elapsed_ms as f64 / 1000.0),
        ProgressEventKind::Waiting { seconds } => format!("pausing {seconds}s"),
        ProgressEventKind::Warning { message } => format!("warning: {message}"),
    }
}

/// Render events until the sending side is dropped.
pub fn spawn(mut rx: ProgressReceiver) -> JoinHandle<()> {
    tokio::spawn(async move {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::with_template("{spinner} [{elapsed}] {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        bar.enable_steady_tick(Duration::from_millis(120));

        loop {
            match rx.recv().await {
                Ok(ev) => {
                    let line = describe(&ev.event);
                    if matches!(ev.event, ProgressEventKind::CategoryCompleted { .. }) {
                        bar.println(&line);
                    }
                    bar.set_message(line);
                }
                Err(RecvError::Lagged(_)) => continue,
                Err(RecvError::Closed) => break,
            }
        }
        bar.finish_and_clear();
    })
}
