//! # stylepack - bounded stylesheet rule packing
//!
//! Components contribute CSS incrementally as they appear on a page and take
//! it away again when they leave. A page can only hold a small number of
//! style containers, and each container only a fixed number of rules. This
//! crate packs the rules into those containers:
//!
//! - **[`RuleSet`]**: one atomic batch of decorated CSS files, each carrying
//!   its server-declared rule count
//! - **[`Stylesheet`]**: one container with a hard rule ceiling and a queued
//!   append/remove transaction flushed by [`Stylesheet::write`]
//! - **[`StylesheetAllocator`]**: first-fit placement over an ordered list of
//!   sheets, with per-component file deduplication and a sheet ceiling
//!
//! ## Quick Start
//!
//! ```rust
//! use stylepack::{CssRule, RuleSet, StylesheetAllocator};
//!
//! let mut allocator = StylesheetAllocator::new();
//! let rules = RuleSet::new(vec![CssRule::new("button.css", 12, ".button { color: red }")]);
//!
//! assert!(allocator.register("button@1.0", &rules));
//! allocator.save();
//!
//! let (id, text) = allocator.style_blocks().next().unwrap();
//! assert_eq!(id, "pagelet-sheet-0");
//! assert_eq!(text, ".button { color: red }");
//! ```
//!
//! ## Limits
//!
//! - [`SHEET_CAPACITY`]: 4095 rules per sheet
//! - [`MAX_SHEETS`]: 31 sheets per page
//!
//! Both can be lowered through [`AllocatorLimits`].

pub mod allocator;
pub mod error;
pub mod rule_set;
pub mod stylesheet;

pub use allocator::{AllocatorLimits, AllocatorStats, DEFAULT_SHEET_PREFIX, MAX_SHEETS, StylesheetAllocator};
pub use error::AllocError;
pub use rule_set::{CssRule, RuleId, RuleSet};
pub use stylesheet::{RuleRecord, SHEET_CAPACITY, Stylesheet};
