//! Core infrastructure module for tabimpute.
//!
//! - [`types`]: cell type, column layout, per-column policies
//! - [`constants`]: sentinel, sorter tuning, artifact naming
//! - [`error`]: error types shared by every module
//! - [`missing`]: missing-value detection and the missing-last order

pub mod constants;
pub mod error;
pub mod missing;
pub mod types;

pub use constants::*;
pub use error::{ImputeError, Result};
pub use missing::{compare_missing_last, count_present, is_missing};
pub use types::*;

use std::sync::atomic::{AtomicBool, Ordering};

static CORE_INITIALIZED: AtomicBool = AtomicBool::new(false);

/// Initialize logging. Safe to call more than once.
pub fn initialize_core() -> Result<()> {
    if CORE_INITIALIZED.swap(true, Ordering::SeqCst) {
        return Ok(());
    }

    // Try to initialize env_logger, ignore if already initialized
    let _ = env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or("info"),
    )
    .try_init();

    log::debug!("tabimpute {} initialized", TABIMPUTE_VERSION);
    Ok(())
}

/// Check whether [`initialize_core`] has run.
pub fn is_core_initialized() -> bool {
    CORE_INITIALIZED.load(Ordering::SeqCst)
}
