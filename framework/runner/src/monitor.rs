use gale_core::prelude::ShutdownListener;
use sysinfo::{Pid, ProcessRefreshKind, System};

/// Watch the runner's own CPU usage and warn when it gets high.
///
/// This won't stop the run. A saturated load generator produces latency
/// numbers that say more about the generator than the target, so the operator
/// should know when that is happening.
pub(crate) fn start_monitor(shutdown_listener: ShutdownListener) {
    std::thread::Builder::new()
        .name("monitor".to_string())
        .spawn(move || {
            let own_pid = Pid::from_u32(std::process::id());
            let mut sys = System::new();

            sys.refresh_cpu();
            let cpu_count = sys.cpus().len().max(1);

            loop {
                if shutdown_listener.should_shutdown() {
                    break;
                }

                sys.refresh_process_specifics(own_pid, ProcessRefreshKind::new().with_cpu());

                if let Some(process) = sys.process(own_pid) {
                    let usage = process.cpu_usage() / cpu_count as f32;
                    if usage > 10.0 {
                        log::warn!(
                            "Load generator is using {usage:.2}% of {cpu_count} CPU cores; latency samples may be skewed"
                        );
                    }
                }

                std::thread::sleep(sysinfo::MINIMUM_CPU_UPDATE_INTERVAL);
            }
        })
        .expect("Failed to start monitor thread");
}
