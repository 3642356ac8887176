//! Fixed-interval readiness polling.

use std::thread;
use std::time::Duration;

use reqwest::blocking::Client;
use tracing::debug;

use crate::error::{RuntimeError, RuntimeResult};

const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// GET `url` until it answers 2xx, sleeping `interval` between attempts.
pub fn wait_for_health(url: &str, attempts: u32, interval: Duration) -> RuntimeResult<()> {
    let client = Client::builder()
        .timeout(PROBE_TIMEOUT)
        .build()
        .map_err(RuntimeError::Probe)?;

    let ready = poll(attempts, interval, |attempt| {
        match client.get(url).send() {
            Ok(resp) if resp.status().is_success() => true,
            Ok(resp) => {
                debug!(url, attempt, status = resp.status().as_u16(), "not ready yet");
                false
            }
            Err(e) => {
                debug!(url, attempt, error = %e, "not ready yet");
                false
            }
        }
    });

    if ready {
        Ok(())
    } else {
        Err(RuntimeError::Unhealthy {
            url: url.to_string(),
            attempts,
        })
    }
}

/// Run `probe` up to `attempts` times; no sleep after the last failure.
pub(crate) fn poll(attempts: u32, interval: Duration, mut probe: impl FnMut(u32) -> bool) -> bool {
    for attempt in 1..=attempts {
        if probe(attempt) {
            return true;
        }
        if attempt < attempts {
            thread::sleep(interval);
        }
    }
    false
}
