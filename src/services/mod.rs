pub mod collector;
pub mod droid;
pub mod enumerator;
pub mod export;
pub mod extractor;
pub mod monitor;
pub mod reconciler;
pub mod search;
pub mod surface;
pub mod text_codec;

pub use collector::*;
pub use droid::*;
pub use monitor::*;
pub use search::*;
pub use surface::*;
