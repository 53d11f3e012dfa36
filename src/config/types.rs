use std::path::PathBuf;

use reqwest::Method;
use serde::{Deserialize, Serialize};

/// On-disk YAML configuration. Every field is optional; CLI flags win.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct SqlsentryConfig {
    pub target: Option<TargetSection>,
    pub session: Option<SessionSection>,
    pub output: Option<OutputSection>,
    pub enumeration: Option<EnumerationSection>,
    pub files: Option<FilesSection>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct TargetSection {
    pub url: Option<String>,
    pub targets_file: Option<String>,
    pub method: Option<String>,
    pub data: Option<String>,
    pub cookie: Option<String>,
    pub headers: Option<Vec<HeaderEntry>>,
    pub test_parameter: Option<Vec<String>>,
    pub direct: Option<bool>,
    pub dbms: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HeaderEntry {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct SessionSection {
    pub file: Option<String>,
    pub flush: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct OutputSection {
    pub directory: Option<String>,
    pub xml_file: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct EnumerationSection {
    pub dump_table: Option<bool>,
    pub dump_all: Option<bool>,
    pub search: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct FilesSection {
    pub read: Option<String>,
    pub write: Option<String>,
}

/// Live request description for the target currently being set up.
///
/// Parameter extraction mutates it: the `*` marker is stripped from `url`,
/// POST data is newline-normalized and the method is forced to POST when a
/// body is present.
#[derive(Debug, Clone)]
pub struct TargetConfig {
    pub url: String,
    /// Explicit GET query string; falls back to the query part of `url`.
    pub query: Option<String>,
    pub method: Option<Method>,
    pub data: Option<String>,
    pub cookie: Option<String>,
    pub headers: Vec<(String, String)>,
    pub direct: bool,
    pub test_parameter: Vec<String>,
    /// Back-end DBMS forced by the user; resumed values may not override it.
    pub dbms: Option<String>,
    pub session_file: Option<PathBuf>,
    pub flush_session: bool,
    pub output_dir: PathBuf,
    pub xml_file: Option<PathBuf>,
    pub dump_table: bool,
    pub dump_all: bool,
    pub search: bool,
    pub read_file: Option<String>,
    pub write_file: Option<String>,
    pub multiple_targets: bool,
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            query: None,
            method: None,
            data: None,
            cookie: None,
            headers: Vec::new(),
            direct: false,
            test_parameter: Vec::new(),
            dbms: None,
            session_file: None,
            flush_session: false,
            output_dir: PathBuf::from("./output"),
            xml_file: None,
            dump_table: false,
            dump_all: false,
            search: false,
            read_file: None,
            write_file: None,
            multiple_targets: false,
        }
    }
}

impl TargetConfig {
    pub fn for_url(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    /// Query string to analyse as the GET source.
    pub fn get_query(&self) -> Option<&str> {
        if let Some(query) = &self.query {
            return Some(query.as_str());
        }
        let (_, rest) = self.url.split_once('?')?;
        Some(rest.split('#').next().unwrap_or(rest))
    }

    pub fn needs_dump_dir(&self) -> bool {
        self.dump_table || self.dump_all || self.search
    }

    pub fn needs_files_dir(&self) -> bool {
        self.read_file.is_some() || self.write_file.is_some()
    }
}
