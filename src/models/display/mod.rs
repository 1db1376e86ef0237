//! Display model implementations for table and JSON output
//!
//! Display models flatten pipeline types into CLI-friendly rows with
//! appropriate column names.

mod key;
mod suggestion;

pub use key::KeyDisplay;
pub use suggestion::SuggestionDisplay;
