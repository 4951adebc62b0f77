mod backend;
mod backends;
mod registry;
mod result;

pub use backend::DetectorBackend;
pub use backends::{ScriptedBackend, SyntheticBackend};
pub use registry::TierRegistry;
pub use result::BoundingBox;
