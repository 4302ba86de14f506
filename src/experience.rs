//! Experience ledger
//!
//! Reward sink for pops. Persisted to LocalStorage; level math is left to
//! whoever reads the totals.

use serde::{Deserialize, Serialize};

use crate::consts::{BUBBLE_POP_REWARD, MINI_POP_REWARD};

/// Receives experience grants (fire-and-forget)
pub trait RewardSink {
    fn grant(&mut self, points: u32);
}

impl<T: RewardSink> RewardSink for std::rc::Rc<std::cell::RefCell<T>> {
    fn grant(&mut self, points: u32) {
        self.borrow_mut().grant(points);
    }
}

/// Running experience totals
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ExperienceLedger {
    /// Total experience earned
    pub total: u64,
    /// Top-level bubbles popped
    pub pops: u32,
    /// Minis popped
    pub mini_pops: u32,
}

impl ExperienceLedger {
    /// LocalStorage key (used only in wasm32)
    #[allow(dead_code)]
    const STORAGE_KEY: &'static str = "bubble_galaxy_experience";

    pub fn new() -> Self {
        Self::default()
    }

    /// Record a grant, counting the pop by its reward size
    pub fn record(&mut self, points: u32) {
        self.total += u64::from(points);
        match points {
            BUBBLE_POP_REWARD => self.pops += 1,
            MINI_POP_REWARD => self.mini_pops += 1,
            _ => {}
        }
    }

    /// Load the ledger from LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(Some(json)) = storage.get_item(Self::STORAGE_KEY) {
                if let Ok(ledger) = serde_json::from_str::<ExperienceLedger>(&json) {
                    log::info!("Loaded experience ledger ({} XP)", ledger.total);
                    return ledger;
                }
            }
        }

        log::info!("No experience found, starting fresh");
        Self::new()
    }

    /// Save the ledger to LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn save(&self) {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            match serde_json::to_string(self) {
                Ok(json) => {
                    if storage.set_item(Self::STORAGE_KEY, &json).is_err() {
                        log::warn!("Could not persist experience ({} XP)", self.total);
                    }
                }
                Err(e) => log::warn!("Could not encode experience: {}", e),
            }
        }
    }

    /// Native stubs
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load() -> Self {
        Self::new()
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn save(&self) {
        // No-op for native
    }
}

impl RewardSink for ExperienceLedger {
    fn grant(&mut self, points: u32) {
        self.record(points);
        self.save();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grants_accumulate() {
        let mut ledger = ExperienceLedger::new();
        ledger.grant(BUBBLE_POP_REWARD);
        ledger.grant(MINI_POP_REWARD);
        ledger.grant(MINI_POP_REWARD);
        assert_eq!(ledger.total, 20);
        assert_eq!(ledger.pops, 1);
        assert_eq!(ledger.mini_pops, 2);
    }

    #[test]
    fn test_odd_grant_only_adds_points() {
        let mut ledger = ExperienceLedger::new();
        ledger.grant(3);
        assert_eq!(ledger.total, 3);
        assert_eq!(ledger.pops + ledger.mini_pops, 0);
    }
}
