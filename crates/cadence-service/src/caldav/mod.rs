pub mod filter;
pub mod fingerprint;
pub mod index;
pub mod item;
pub mod limit;
pub mod recurrence;
pub mod time;
