//! # wsecho-settings
//!
//! Configuration for the wsecho server, loaded from three layers (in
//! priority order):
//! 1. **Compiled defaults**: [`EchoSettings::default()`]
//! 2. **User file**: `~/.wsecho/settings.json` (deep-merged over defaults)
//! 3. **Environment variables**: `WSECHO_*` overrides (highest priority)
//!
//! With no file and no environment the server listens on port 81 on all
//! interfaces with one I/O worker thread.

#![deny(unsafe_code)]

pub mod errors;
pub mod loader;
pub mod types;

pub use errors::{Result, SettingsError};
pub use loader::{apply_env_overrides, deep_merge, load_settings, load_settings_from_path, settings_path};
pub use types::*;
