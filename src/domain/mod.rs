//! Domain types used throughout the crate.
//!
//! This module defines:
//!
//! - command-line selectable enums (`MmsCase`, `FitModelKind`, `CoalescenceModel`, `ViewPreset`)
//! - per-command configuration (`VerifyConfig`, `FitConfig`, `OdeConfig`, `MapConfig`)
//! - fit outputs (`FitReport`, `FitQuality`, `FitGrid`)

pub mod types;

pub use types::*;
