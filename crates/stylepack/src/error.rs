//! Allocation failures.
//!
//! None of these escape as panics. [`StylesheetAllocator::register`] turns
//! them into a logged `false`; callers that want the reason use
//! [`StylesheetAllocator::try_register`].
//!
//! [`StylesheetAllocator::register`]: crate::StylesheetAllocator::register
//! [`StylesheetAllocator::try_register`]: crate::StylesheetAllocator::try_register

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AllocError {
    /// The rule set alone exceeds the capacity of an empty sheet.
    #[error("{component}: {rules} rules can never fit a sheet of {capacity}")]
    TooLarge {
        component: String,
        rules: usize,
        capacity: usize,
    },

    /// Every sheet up to the container ceiling is full.
    #[error("{component}: all {max_sheets} stylesheets are full, {rules} rules dropped")]
    Exhausted {
        component: String,
        rules: usize,
        max_sheets: usize,
    },
}
