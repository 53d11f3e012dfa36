use std::path::{Path, PathBuf};

use quick_xml::escape::escape;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tracing::info;

use crate::errors::SqlsentryError;
use crate::target::ParameterMap;

const PLAIN_LOG_NAME: &str = "log";
const XML_DEFAULT_NAME: &str = "results.xml";
const XML_DECLARATION: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n";

/// Output sink for results of the current target.
pub enum Dumper {
    Plain(OutputFile),
    Xml(OutputFile),
}

/// Lazily opened append-only output file.
#[derive(Default)]
pub struct OutputFile {
    path: Option<PathBuf>,
    file: Option<File>,
}

pub fn select_dumper(use_xml: bool) -> Dumper {
    if use_xml {
        Dumper::Xml(OutputFile::default())
    } else {
        Dumper::Plain(OutputFile::default())
    }
}

impl Dumper {
    /// Open the output file: `<output>/log` for the plain dumper, the
    /// configured XML file (or `<output>/results.xml`) for the XML one.
    pub async fn set_output_file(
        &mut self,
        output_path: &Path,
        xml_file: Option<&Path>,
    ) -> Result<(), SqlsentryError> {
        let path = match self {
            Self::Plain(_) => output_path.join(PLAIN_LOG_NAME),
            Self::Xml(_) => xml_file
                .map(Path::to_path_buf)
                .unwrap_or_else(|| output_path.join(XML_DEFAULT_NAME)),
        };

        let fresh = !path.exists();
        let file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await
            .map_err(|e| {
                SqlsentryError::FilePath(format!(
                    "unable to open output file '{}' ({})",
                    path.display(),
                    e
                ))
            })?;

        info!("results will be written to '{}'", path.display());

        let is_xml = matches!(self, Self::Xml(_));
        let out = self.output_mut();
        out.path = Some(path);
        out.file = Some(file);

        if is_xml && fresh {
            out.write(XML_DECLARATION).await?;
        }
        Ok(())
    }

    pub fn output_file(&self) -> Option<&Path> {
        match self {
            Self::Plain(out) | Self::Xml(out) => out.path.as_deref(),
        }
    }

    /// Write one labelled value.
    pub async fn string(&mut self, header: &str, data: &str) -> Result<(), SqlsentryError> {
        let entry = match self {
            Self::Plain(_) => format!("{}:    '{}'\n\n", header, data),
            Self::Xml(_) => format!(
                "<string header=\"{}\">{}</string>\n",
                escape(header),
                escape(data)
            ),
        };
        self.output_mut().write(&entry).await
    }

    /// Record the parameter sources found for the target.
    pub async fn parameters(&mut self, map: &ParameterMap) -> Result<(), SqlsentryError> {
        for (source, raw) in &map.raw {
            let header = if map.is_testable(*source) {
                format!("{} parameters (testable)", source)
            } else {
                format!("{} parameters", source)
            };
            self.string(&header, raw).await?;
        }
        Ok(())
    }

    fn output_mut(&mut self) -> &mut OutputFile {
        match self {
            Self::Plain(out) | Self::Xml(out) => out,
        }
    }
}

impl OutputFile {
    async fn write(&mut self, data: &str) -> Result<(), SqlsentryError> {
        let (Some(path), Some(file)) = (&self.path, &mut self.file) else {
            return Err(SqlsentryError::FilePath(
                "output file not set; call set_output_file first".into(),
            ));
        };
        let failed = |e: std::io::Error| {
            SqlsentryError::FilePath(format!("unable to write on '{}' ({})", path.display(), e))
        };
        file.write_all(data.as_bytes()).await.map_err(failed)?;
        file.flush().await.map_err(failed)?;
        Ok(())
    }
}
