//! Host environment info.
//!
//! The engine never touches the OS directly; everything
//! platform-dependent funnels through this struct so hosts (and tests)
//! can inject their own platform tag, clock and id source. The platform
//! picks the primary shortcut modifier; the clock stamps interactions;
//! the id source feeds paste and provisional edges.

use fb_core::Id;
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    MacOs,
    Windows,
    Linux,
    Other,
}

pub struct Environment {
    pub platform: Platform,
    clock: Box<dyn Fn() -> u64>,
    ids: Box<dyn Fn(&str) -> Id>,
}

impl Environment {
    /// Detect the platform from the compile target; wall-clock time and
    /// counter-based ids.
    pub fn detect() -> Self {
        let platform = match std::env::consts::OS {
            "macos" | "ios" => Platform::MacOs,
            "windows" => Platform::Windows,
            "linux" | "android" => Platform::Linux,
            _ => Platform::Other,
        };
        Self::new(platform)
    }

    pub fn new(platform: Platform) -> Self {
        Self {
            platform,
            clock: Box::new(|| {
                SystemTime::now()
                    .duration_since(UNIX_EPOCH)
                    .map(|d| d.as_millis() as u64)
                    .unwrap_or(0)
            }),
            ids: Box::new(Id::with_prefix),
        }
    }

    /// Override the timestamp source (tests, replay).
    pub fn with_clock(mut self, clock: impl Fn() -> u64 + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    /// Override the id source (tests, deterministic exports).
    pub fn with_id_source(mut self, ids: impl Fn(&str) -> Id + 'static) -> Self {
        self.ids = Box::new(ids);
        self
    }

    /// Milliseconds since some fixed epoch.
    pub fn now(&self) -> u64 {
        (self.clock)()
    }

    /// A fresh, never-before-seen id with the given prefix.
    pub fn fresh_id(&self, prefix: &str) -> Id {
        (self.ids)(prefix)
    }

    /// On macOS the primary shortcut modifier is ⌘ (reported as `meta`);
    /// everywhere else it is Ctrl.
    pub fn primary_modifier_is_meta(&self) -> bool {
        self.platform == Platform::MacOs
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::detect()
    }
}

impl fmt::Debug for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Environment").field("platform", &self.platform).finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn injected_clock_and_ids() {
        let env = Environment::new(Platform::MacOs)
            .with_clock(|| 42)
            .with_id_source(|p| Id::intern(&format!("{p}-fixed")));
        assert_eq!(env.now(), 42);
        assert_eq!(env.fresh_id("node"), Id::intern("node-fixed"));
        assert!(env.primary_modifier_is_meta());
    }
}
