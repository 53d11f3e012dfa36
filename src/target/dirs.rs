use std::path::{Path, PathBuf};

use tracing::debug;

use crate::errors::SqlsentryError;

/// Per-host output layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetPaths {
    pub output: PathBuf,
    pub dump: Option<PathBuf>,
    pub files: Option<PathBuf>,
}

/// Create `<root>/<host>` plus the dump and files directories when the run
/// needs them. Existing directories are left as they are.
pub async fn create_output_directories(
    root: &Path,
    host: &str,
    needs_dump: bool,
    needs_files: bool,
) -> Result<TargetPaths, SqlsentryError> {
    let output = root.join(host);
    create_dir(&output).await?;

    let dump = if needs_dump {
        let dump = output.join("dump");
        create_dir(&dump).await?;
        Some(dump)
    } else {
        None
    };

    let files = if needs_files {
        let files = output.join("files");
        create_dir(&files).await?;
        Some(files)
    } else {
        None
    };

    Ok(TargetPaths { output, dump, files })
}

async fn create_dir(path: &Path) -> Result<(), SqlsentryError> {
    tokio::fs::create_dir_all(path).await.map_err(|e| {
        SqlsentryError::FilePath(format!(
            "unable to create output directory '{}' ({})",
            path.display(),
            e
        ))
    })?;
    debug!(path = %path.display(), "Output directory ready");
    Ok(())
}
