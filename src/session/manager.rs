use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::Local;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use crate::errors::SqlsentryError;
use super::resume::ResumeSink;
use super::state::{ResumedQueries, SessionLine};

/// File name of the session log inside a target's output directory.
pub const SESSION_FILE_NAME: &str = "session";

/// Session log path for a target: the configured one, else `<output>/session`.
pub fn session_path(configured: Option<&Path>, output_path: &Path) -> PathBuf {
    configured
        .map(Path::to_path_buf)
        .unwrap_or_else(|| output_path.join(SESSION_FILE_NAME))
}

/// Result of [`load_session`]: prior results plus the append handle for the
/// rest of the target's scan.
pub struct LoadedSession {
    pub queries: ResumedQueries,
    pub writer: SessionWriter,
}

/// Append-only handle on a session log.
pub struct SessionWriter {
    path: PathBuf,
    file: File,
}

impl SessionWriter {
    pub async fn open(path: &Path) -> Result<Self, SqlsentryError> {
        let file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .await
            .map_err(|e| unwritable(path, e))?;
        Ok(Self { path: path.to_path_buf(), file })
    }

    /// Mark where this run's records start.
    pub async fn write_marker(&mut self) -> Result<(), SqlsentryError> {
        let marker = format!("\n[{}]\n", Local::now().format("%X %x"));
        self.write(&marker).await
    }

    pub async fn append(&mut self, line: &SessionLine) -> Result<(), SqlsentryError> {
        self.write(&format!("{}\n", line)).await
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn write(&mut self, data: &str) -> Result<(), SqlsentryError> {
        self.file
            .write_all(data.as_bytes())
            .await
            .map_err(|e| unwritable(&self.path, e))?;
        self.file.flush().await.map_err(|e| unwritable(&self.path, e))?;
        Ok(())
    }
}

fn unwritable(path: &Path, e: std::io::Error) -> SqlsentryError {
    SqlsentryError::FilePath(format!(
        "unable to write on the session file specified '{}' ({})",
        path.display(),
        e
    ))
}

/// Read prior results for the current target from the session log.
///
/// Only lines whose URL is `current_url` or `current_host` are kept;
/// malformed lines and empty values are skipped. Every kept line is passed
/// to `resume`, whether or not it survives the longest-value merge. A
/// missing file yields an empty set.
pub async fn read_session<R>(
    path: &Path,
    current_url: &str,
    current_host: &str,
    resume: &mut R,
) -> Result<ResumedQueries, SqlsentryError>
where
    R: ResumeSink + ?Sized,
{
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(ResumedQueries::default()),
        Err(e) => {
            return Err(SqlsentryError::FilePath(format!(
                "unable to read the session file '{}' ({})",
                path.display(),
                e
            )))
        }
    };
    let content = String::from_utf8_lossy(&bytes);

    let mut queries = ResumedQueries::default();
    let mut skipped = 0usize;
    // '\r' alone also ends a record
    for raw in content.split(['\r', '\n']).filter(|raw| !raw.is_empty()) {
        let Some(line) = SessionLine::parse(raw) else {
            skipped += 1;
            continue;
        };
        if line.value.is_empty() {
            continue;
        }
        if line.url != current_url && line.url != current_host {
            continue;
        }

        queries.merge(&line.url, &line.expression, &line.value);
        resume.resume(&line.expression, &line.url, &line.value);
    }

    debug!(records = queries.len(), skipped, "Session file read");

    Ok(queries)
}

/// Load (or flush) the session log, then open it for appending and write a
/// run boundary marker.
pub async fn load_session<R>(
    path: &Path,
    current_url: &str,
    current_host: &str,
    flush: bool,
    resume: &mut R,
) -> Result<LoadedSession, SqlsentryError>
where
    R: ResumeSink + ?Sized,
{
    info!("using '{}' as session file", path.display());

    let queries = if flush {
        match tokio::fs::remove_file(path).await {
            Ok(()) => info!("flushing session file"),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => {
                return Err(SqlsentryError::FilePath(format!(
                    "unable to flush the session file ({})",
                    e
                )))
            }
        }
        ResumedQueries::default()
    } else {
        read_session(path, current_url, current_host, resume).await?
    };

    let mut writer = SessionWriter::open(path).await?;
    writer.write_marker().await?;

    Ok(LoadedSession { queries, writer })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::NoResume;
    use tempfile::TempDir;

    #[test]
    fn test_session_path_default() {
        let out = Path::new("/tmp/out/x");
        assert_eq!(session_path(None, out), PathBuf::from("/tmp/out/x/session"));
        assert_eq!(
            session_path(Some(Path::new("/var/s.log")), out),
            PathBuf::from("/var/s.log")
        );
    }

    #[tokio::test]
    async fn test_missing_file_is_empty_and_created() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("session");
        let loaded = load_session(&path, "http://x/", "x", false, &mut NoResume).await.unwrap();
        assert!(loaded.queries.is_empty());
        let content = tokio::fs::read_to_string(&path).await.unwrap();
        assert!(content.starts_with("\n["));
        assert!(content.ends_with("]\n"));
    }

    #[tokio::test]
    async fn test_writer_appends_records() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("session");
        let mut loaded = load_session(&path, "http://x/", "x", false, &mut NoResume).await.unwrap();
        loaded.writer.append(&SessionLine::new("http://x/", "DBMS", "MySQL")).await.unwrap();
        drop(loaded);

        let queries = read_session(&path, "http://x/", "x", &mut NoResume).await.unwrap();
        assert_eq!(queries.get("http://x/", "DBMS"), Some("MySQL"));
    }

    #[tokio::test]
    async fn test_unwritable_path_is_file_path_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing-dir").join("session");
        let err = load_session(&path, "http://x/", "x", false, &mut NoResume).await.err().unwrap();
        assert!(matches!(err, SqlsentryError::FilePath(_)));
    }
}
