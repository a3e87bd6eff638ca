//! Progress reporting for the read loop. Totals are unknown up front (the cursor
//! is lazy), so bars are spinners counting items.

use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

pub fn make_read_spinner(label: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    let style = ProgressStyle::with_template("{spinner:.green} {msg} {pos} read  it/s: {per_sec}  elapsed: {elapsed_precise}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner());
    pb.set_style(style);
    if !label.is_empty() {
        pb.set_message(label.to_string());
    }
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}
