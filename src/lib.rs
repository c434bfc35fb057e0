#![doc(test(attr(deny(warnings))))]

//! MealBank tracks meals against a fortnightly dietary budget and lets
//! unused budget roll over into a bank.
//!
//! The accounting itself lives in [`ledger`] as pure functions over
//! borrowed snapshots. [`core::MealBook`] wires those functions to a
//! [`storage::StateStore`], and [`cli`] puts a shell on top.

pub mod cli;
pub mod config;
pub mod core;
pub mod errors;
pub mod ledger;
pub mod storage;
pub mod utils;

use std::sync::Once;

static INIT_TRACING: Once = Once::new();

/// Initializes global tracing and emits a startup log line.
pub fn init() {
    INIT_TRACING.call_once(|| {
        utils::init_tracing();
        tracing::debug!(version = env!("CARGO_PKG_VERSION"), "mealbank tracing initialized");
    });
}
