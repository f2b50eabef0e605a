//! Stored records and their operations.

pub mod counter;
pub mod entry;
pub mod interval;

pub use counter::{Counter, CounterChanges, NewCounter};
pub use entry::{Entry, NewEntry};
pub use interval::{Interval, IntervalModifiers};
