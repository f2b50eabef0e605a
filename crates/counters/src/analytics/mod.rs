//! Interval analytics built on the date spine.
//!
//! Each analysis has a pure `*_query` function returning the compiled
//! builder, plus blocking and async runners.

pub mod completions;
pub mod date_range;
pub mod history;
pub mod streaks;

pub use completions::{Completions, completions, completions_async};
pub use date_range::{DATE_RANGE, dates_cte, day_filter};
pub use history::{HistoryPoint, history, history_async, history_query};
pub use streaks::{Streak, StreakSummary, streaks, streaks_async, streaks_query};
