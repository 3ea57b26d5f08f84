//! Startup readiness polling.
//!
//! The host surface may come up after the editor is constructed. The poll
//! checks a probe at a fixed interval for a bounded number of attempts and
//! stops at the first success.

use std::time::Duration;

use quire_config::StartupConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Readiness {
    Ready { attempts: u32 },
    TimedOut { attempts: u32 },
}

impl Readiness {
    pub fn is_ready(self) -> bool {
        matches!(self, Readiness::Ready { .. })
    }
}

pub fn poll_until_ready(
    mut probe: impl FnMut() -> bool,
    interval: Duration,
    max_attempts: u32,
) -> Readiness {
    for attempt in 1..=max_attempts {
        if probe() {
            log::debug!("ready after {attempt} attempt(s)");
            return Readiness::Ready { attempts: attempt };
        }
        if attempt < max_attempts {
            std::thread::sleep(interval);
        }
    }
    log::warn!("not ready after {max_attempts} attempt(s)");
    Readiness::TimedOut {
        attempts: max_attempts,
    }
}

pub fn poll_with_config(probe: impl FnMut() -> bool, config: &StartupConfig) -> Readiness {
    poll_until_ready(
        probe,
        Duration::from_millis(config.poll_interval_ms),
        config.max_attempts,
    )
}
