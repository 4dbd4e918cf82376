//! Platform event backends.

pub mod mock;

#[cfg(target_os = "macos")]
mod macos;
#[cfg(target_os = "macos")]
pub use macos::QuartzBackend;

use crate::backend::EventBackend;
use crate::error::Result;
use std::sync::Arc;

/// The backend that posts to and intercepts from the running OS.
#[cfg(target_os = "macos")]
pub fn system_backend() -> Result<Arc<dyn EventBackend>> {
    Ok(Arc::new(QuartzBackend::new()))
}

/// The backend that posts to and intercepts from the running OS.
#[cfg(not(target_os = "macos"))]
pub fn system_backend() -> Result<Arc<dyn EventBackend>> {
    Err(crate::error::Error::NotSupported(
        "only the macOS Quartz event backend is available".into(),
    ))
}
