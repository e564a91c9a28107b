pub mod progress;
pub mod record;
pub mod search;
