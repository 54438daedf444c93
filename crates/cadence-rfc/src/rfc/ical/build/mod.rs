//! Writing components back to iCalendar text.
//!
//! Values are escaped, content lines folded at 75 octets, and calendars
//! written with VTIMEZONEs ahead of the items that reference them.

mod escape;
mod fold;
mod serializer;

pub use escape::{escape_param_value, escape_text};
pub use fold::fold_line;
pub use serializer::{serialize, serialize_property};
