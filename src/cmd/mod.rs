pub mod attack;
pub mod simulate;

use m209_analyzer::attack::StopHandle;
use std::thread;
use std::time::Duration;
use tracing::{info, warn};

/// Requests a stop once `seconds` have passed. The timer thread is detached;
/// it dies with the process.
pub fn spawn_deadline(handle: StopHandle, seconds: Option<u64>) {
    let Some(secs) = seconds else {
        return;
    };
    info!("⏱️  Time limit: {}s", secs);
    let spawned = thread::Builder::new()
        .name("m209-deadline".to_string())
        .spawn(move || {
            thread::sleep(Duration::from_secs(secs));
            if !handle.is_stopped() {
                info!("⏱️  Time limit reached, stopping");
                handle.stop();
            }
        });
    if let Err(e) = spawned {
        warn!("⚠️  Could not start deadline timer: {}", e);
    }
}
