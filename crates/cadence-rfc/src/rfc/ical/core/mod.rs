//! The component model a recurring series is built from.
//!
//! Properties keep their raw text next to the typed value, so anything the
//! limiter does not rewrite is emitted exactly as received.

mod component;
mod datetime;
mod duration;
mod parameter;
mod property;
mod value;

pub use component::{Component, ComponentKind, ICalendar};
pub use datetime::{DateTime, DateTimeForm};
pub use duration::Duration;
pub use parameter::Parameter;
pub use property::Property;
pub use value::Value;
