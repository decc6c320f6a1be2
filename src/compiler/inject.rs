//! Build-context injection
//!
//! Project compose files describe their build relative to their own
//! folder. Once merged into a file that lives elsewhere, the project's
//! service needs an absolute context pointing back at that folder.

use thiserror::Error;
use tracing::debug;

use crate::domain::Service;
use crate::storage::MergeSettings;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum InjectError {
    #[error("build field not found")]
    BuildNotFound,
}

/// Points a service's build context at `<projectPath>/<projectFolder>/<service_name>`
///
/// Overwrites whatever context was there. Fails without touching the
/// service when it has no `build` section.
pub fn inject_build_context(
    service: &mut Service,
    service_name: &str,
    settings: &MergeSettings,
) -> Result<(), InjectError> {
    let build = service.build.as_mut().ok_or(InjectError::BuildNotFound)?;

    let context = settings.build_context(service_name).display().to_string();
    debug!(service = service_name, %context, "setting build context");
    build.context = Some(context);

    Ok(())
}
