//! WebAssembly bindings for the hybrid PoW/PoS minting engine.
//!
//! This crate provides JavaScript-accessible APIs for:
//! - Computing the next required target from a header window
//! - Checking proof-of-work digests
//! - Estimating minting probability and listing mintable coins
//! - Decoding compact targets for display

use wasm_bindgen::prelude::*;

pub mod engine;
pub mod logger;
pub mod state;

// Re-export main types for JS access
pub use engine::ConsensusEngine;

/// Initialize the WASM module with better panic messages and console logging.
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();

    logger::init(log::LevelFilter::Info);
}

/// Set the console log level ("off", "error", "warn", "info", "debug", "trace").
#[wasm_bindgen]
pub fn set_log_level(level: &str) -> Result<(), JsValue> {
    let filter = logger::parse_level(level).ok_or_else(|| JsValue::from_str("Invalid log level"))?;
    logger::init(filter);
    Ok(())
}

/// Get the library version.
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}
