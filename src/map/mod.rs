//! Map widget capability.
//!
//! The map is driven through `MapWidget`; callers wait for it with
//! `wait_until_ready` before pushing markers, routes or viewports.

mod scene;

pub use scene::*;

use crate::dashboard::{LonLat, Marker, Viewport};

use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum MapError {
    #[error("map widget is not initialized")]
    NotReady,
    #[error("map widget unavailable after {0} attempts")]
    Unavailable(u32),
    #[error("map widget not ready within {0:?}")]
    Timeout(Duration),
}

/// Operations a map widget must support.
pub trait MapWidget {
    /// Whether the underlying map library is loaded.
    fn is_available(&self) -> bool;
    fn initialize(&mut self) -> Result<(), MapError>;
    fn set_markers(&mut self, markers: &[Marker]) -> Result<(), MapError>;
    fn set_route(&mut self, route: &[LonLat]) -> Result<(), MapError>;
    fn set_viewport(&mut self, viewport: Viewport) -> Result<(), MapError>;
}

/// Retry schedule for `wait_until_ready`.
#[derive(Debug, Clone, Copy)]
pub struct ReadyPolicy {
    pub retry_interval: Duration,
    pub max_attempts: u32,
    pub timeout: Duration,
}

impl Default for ReadyPolicy {
    fn default() -> Self {
        Self {
            retry_interval: Duration::from_millis(500),
            max_attempts: 20,
            timeout: Duration::from_secs(10),
        }
    }
}

/// Poll until the widget is available, then initialize it.
pub async fn wait_until_ready<W: MapWidget>(widget: &mut W, policy: ReadyPolicy) -> Result<(), MapError> {
    let attempts = async {
        for attempt in 1..=policy.max_attempts {
            if widget.is_available() {
                return widget.initialize();
            }
            tracing::debug!("Map: Widget not available yet (attempt {})", attempt);
            if attempt < policy.max_attempts {
                tokio::time::sleep(policy.retry_interval).await;
            }
        }
        Err(MapError::Unavailable(policy.max_attempts))
    };

    match tokio::time::timeout(policy.timeout, attempts).await {
        Ok(result) => result,
        Err(_) => {
            tracing::warn!("Map: Widget not ready within {:?}", policy.timeout);
            Err(MapError::Timeout(policy.timeout))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Becomes available after a number of readiness checks.
    struct SlowWidget {
        checks_until_ready: u32,
        checks: std::cell::Cell<u32>,
        initialized: bool,
    }

    impl SlowWidget {
        fn new(checks_until_ready: u32) -> Self {
            Self { checks_until_ready, checks: std::cell::Cell::new(0), initialized: false }
        }
    }

    impl MapWidget for SlowWidget {
        fn is_available(&self) -> bool {
            self.checks.set(self.checks.get() + 1);
            self.checks.get() > self.checks_until_ready
        }

        fn initialize(&mut self) -> Result<(), MapError> {
            self.initialized = true;
            Ok(())
        }

        fn set_markers(&mut self, _: &[Marker]) -> Result<(), MapError> {
            Ok(())
        }

        fn set_route(&mut self, _: &[LonLat]) -> Result<(), MapError> {
            Ok(())
        }

        fn set_viewport(&mut self, _: Viewport) -> Result<(), MapError> {
            Ok(())
        }
    }

    fn policy(max_attempts: u32, timeout_ms: u64) -> ReadyPolicy {
        ReadyPolicy {
            retry_interval: Duration::from_millis(10),
            max_attempts,
            timeout: Duration::from_millis(timeout_ms),
        }
    }

    #[tokio::test]
    async fn test_ready_after_retries() {
        let mut widget = SlowWidget::new(3);
        wait_until_ready(&mut widget, policy(10, 1000)).await.unwrap();
        assert!(widget.initialized);
        assert_eq!(widget.checks.get(), 4);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_attempts() {
        let mut widget = SlowWidget::new(100);
        let err = wait_until_ready(&mut widget, policy(3, 1000)).await.unwrap_err();
        assert_eq!(err, MapError::Unavailable(3));
        assert!(!widget.initialized);
    }

    #[tokio::test]
    async fn test_times_out() {
        let mut widget = SlowWidget::new(100);
        let err = wait_until_ready(&mut widget, policy(1000, 50)).await.unwrap_err();
        assert_eq!(err, MapError::Timeout(Duration::from_millis(50)));
    }
}
