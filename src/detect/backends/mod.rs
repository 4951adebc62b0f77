mod scripted;
mod synthetic;

pub use scripted::ScriptedBackend;
pub use synthetic::SyntheticBackend;
