pub mod entry;
pub mod reply;

pub use entry::{current_month_code, month_code, EntryParser};
pub use reply::ReplyParser;
