pub mod dedup;
pub mod dispatcher;

pub use dedup::DedupWindow;
pub use dispatcher::{Dispatcher, Outcome};
