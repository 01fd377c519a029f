use gale_core::prelude::ShutdownListener;
use indicatif::{ProgressBar, ProgressStyle};
use std::cmp::min;
use std::time::{Duration, Instant};

/// Displays a progress bar while the scenario runs to show how much of the
/// planned runtime is left.
pub(crate) fn start_progress(planned_runtime: Duration, shutdown_listener: ShutdownListener) {
    std::thread::Builder::new()
        .name("progress".to_string())
        .spawn(move || {
            let start_time = Instant::now();
            let bar = ProgressBar::new(planned_runtime.as_secs());
            bar.set_style(
                ProgressStyle::with_template(
                    "{spinner:.green} [{wide_bar:.cyan/blue}] {pos}s / {len}s",
                )
                .expect("Failed to set progress style")
                .progress_chars("#>-"),
            );

            loop {
                if shutdown_listener.should_shutdown() {
                    bar.finish_and_clear();
                    break;
                }

                bar.set_position(min(
                    start_time.elapsed().as_secs(),
                    planned_runtime.as_secs(),
                ));
                std::thread::sleep(Duration::from_secs(1));
            }
        })
        .expect("Failed to start progress thread");
}
