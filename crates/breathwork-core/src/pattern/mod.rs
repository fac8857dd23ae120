mod library;
mod model;
mod presets;

pub use library::{NamedPattern, PatternEntry, PatternLibrary};
pub use model::{Pattern, Phase};
pub(crate) use model::{secs_to_us, us_to_secs};
pub use presets::{preset, presets, Preset, DEFAULT_PRESET};
