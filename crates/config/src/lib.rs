// Configuration loading

pub mod settings;

pub use settings::{CacheSettings, DirectorySettings, Settings, SettingsError};
