/// Ctrl+C handling.
///
/// SIGINT/SIGTERM only raise a flag; the tracing loop polls it between
/// steps and stops at the next safe point.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};
use signal_hook::consts::{SIGINT, SIGTERM};

use crate::ports::Interrupt;

#[derive(Clone, Default)]
pub struct InterruptFlag {
    flag: Arc<AtomicBool>,
}

impl InterruptFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register SIGINT and SIGTERM to set this flag.
    pub fn register_signals(&self) -> Result<()> {
        for signal in [SIGINT, SIGTERM] {
            signal_hook::flag::register(signal, Arc::clone(&self.flag))
                .with_context(|| format!("Failed to register handler for signal {signal}"))?;
        }
        Ok(())
    }

    pub fn raise(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }
}

impl Interrupt for InterruptFlag {
    fn is_interrupted(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raise_is_visible_through_clones() {
        let flag = InterruptFlag::new();
        let other = flag.clone();
        assert!(!other.is_interrupted());
        flag.raise();
        assert!(other.is_interrupted());
    }
}
