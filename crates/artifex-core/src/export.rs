use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use crate::state::Artifact;

pub const ARTIFACT_FILE_NAME: &str = "generated-app.html";
pub const ARTIFACT_MEDIA_TYPE: &str = "text/html";

/// Save the artifact verbatim as `generated-app.html` in `dir`, overwriting any previous export.
pub fn save_artifact(artifact: &Artifact, dir: &Path) -> Result<PathBuf> {
    fs::create_dir_all(dir)
        .with_context(|| format!("Could not create export directory {}", dir.display()))?;

    let path = dir.join(ARTIFACT_FILE_NAME);
    fs::write(&path, artifact.markup())
        .with_context(|| format!("Could not write {}", path.display()))?;

    log::info!("Exported artifact ({}) to {}", ARTIFACT_MEDIA_TYPE, path.display());
    Ok(path)
}
