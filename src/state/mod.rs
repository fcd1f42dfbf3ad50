//! State comparison: flattening diff and managed-key filtering.

mod diff;
mod filter;

pub use diff::{Diff, DiffValue, compute_diff, compute_flat_diff, flatten_for_diff};
pub use filter::{compute_diff_with_current, filter_managed_keys};
