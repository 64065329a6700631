#![forbid(unsafe_code)]

pub mod model;
pub mod normalize;
pub mod progress;
pub mod suit_log;
pub mod time;

pub use normalize::{MalformedQuestError, normalize};
pub use suit_log::{SortMode, SuitLog};
pub use time::Clock;
