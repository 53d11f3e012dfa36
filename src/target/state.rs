use std::path::PathBuf;
use std::sync::Arc;

use reqwest::cookie::Jar;

use crate::session::ResumedQueries;
use super::params::ParameterMap;
use super::source::ParameterSource;

/// Placeholder version recorded until fingerprinting learns better.
pub const UNKNOWN_DBMS_VERSION: &str = "Unknown";

/// Database Management System types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dbms {
    MySQL,
    PostgreSQL,
    MSSQL,
    Oracle,
    SQLite,
    Access,
}

impl Dbms {
    const ALIASES: &'static [(&'static str, Dbms)] = &[
        ("microsoft sql server", Dbms::MSSQL),
        ("microsoft access", Dbms::Access),
        ("sql server", Dbms::MSSQL),
        ("postgresql", Dbms::PostgreSQL),
        ("postgres", Dbms::PostgreSQL),
        ("sqlite3", Dbms::SQLite),
        ("sqlite", Dbms::SQLite),
        ("oracle", Dbms::Oracle),
        ("access", Dbms::Access),
        ("mysql", Dbms::MySQL),
        ("mssql", Dbms::MSSQL),
        ("pgsql", Dbms::PostgreSQL),
    ];

    /// Split a fingerprint such as `Microsoft SQL Server 2005` into the DBMS
    /// and its version list.
    pub fn parse_fingerprint(fingerprint: &str) -> Option<(Dbms, Vec<String>)> {
        let lower = fingerprint.trim().to_lowercase();
        let (alias, dbms) = Self::ALIASES
            .iter()
            .filter(|(alias, _)| {
                lower.starts_with(alias)
                    && lower[alias.len()..].chars().next().map_or(true, char::is_whitespace)
            })
            .max_by_key(|(alias, _)| alias.len())?;

        let version = fingerprint.trim().get(alias.len()..).unwrap_or_default().trim();
        let versions = if version.is_empty() {
            vec![UNKNOWN_DBMS_VERSION.to_string()]
        } else {
            vec![version.to_string()]
        };
        Some((*dbms, versions))
    }
}

impl std::fmt::Display for Dbms {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Dbms::MySQL => write!(f, "MySQL"),
            Dbms::PostgreSQL => write!(f, "PostgreSQL"),
            Dbms::MSSQL => write!(f, "Microsoft SQL Server"),
            Dbms::Oracle => write!(f, "Oracle"),
            Dbms::SQLite => write!(f, "SQLite"),
            Dbms::Access => write!(f, "Microsoft Access"),
        }
    }
}

impl std::str::FromStr for Dbms {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_lowercase();
        Self::ALIASES
            .iter()
            .find(|(alias, _)| *alias == lower)
            .map(|(_, dbms)| *dbms)
            .ok_or_else(|| format!("unsupported DBMS '{}'", s))
    }
}

/// How the injected value is wrapped in the back-end query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InjectionType {
    Numeric,
    StringSingle,
    StringDouble,
    LikeSingle,
    LikeDouble,
}

impl InjectionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Numeric => "numeric",
            Self::StringSingle => "stringsingle",
            Self::StringDouble => "stringdouble",
            Self::LikeSingle => "likesingle",
            Self::LikeDouble => "likedouble",
        }
    }
}

impl std::fmt::Display for InjectionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for InjectionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "numeric" => Ok(Self::Numeric),
            "stringsingle" => Ok(Self::StringSingle),
            "stringdouble" => Ok(Self::StringDouble),
            "likesingle" => Ok(Self::LikeSingle),
            "likedouble" => Ok(Self::LikeDouble),
            other => Err(format!("unknown injection type '{}'", other)),
        }
    }
}

/// UNION query technique metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UnionMeta {
    pub comment: String,
    pub count: Option<u32>,
    pub position: Option<u32>,
}

/// Scan state that belongs to one target and must not leak into the next.
#[derive(Debug, Clone)]
pub struct TargetState {
    pub cookie_jar: Arc<Jar>,
    pub parameters: ParameterMap,
    /// Session log bound to this target; recomputed per target.
    pub session_file: Option<PathBuf>,
    pub resumed_queries: ResumedQueries,
    pub dbms: Option<Dbms>,
    pub dbms_detected: bool,
    pub dbms_version: Vec<String>,
    pub inj_parameter: Option<String>,
    pub inj_place: Option<ParameterSource>,
    pub inj_type: Option<InjectionType>,
    pub parenthesis: Option<u32>,
    pub union: UnionMeta,
}

impl TargetState {
    /// The "nothing known yet" baseline.
    pub fn new() -> Self {
        Self {
            cookie_jar: Arc::new(Jar::default()),
            parameters: ParameterMap::default(),
            session_file: None,
            resumed_queries: ResumedQueries::default(),
            dbms: None,
            dbms_detected: false,
            dbms_version: vec![UNKNOWN_DBMS_VERSION.to_string()],
            inj_parameter: None,
            inj_place: None,
            inj_type: None,
            parenthesis: None,
            union: UnionMeta::default(),
        }
    }

    pub fn is_baseline(&self) -> bool {
        self.parameters.is_empty()
            && self.session_file.is_none()
            && self.resumed_queries.is_empty()
            && self.dbms.is_none()
            && !self.dbms_detected
            && self.dbms_version == [UNKNOWN_DBMS_VERSION]
            && self.inj_parameter.is_none()
            && self.inj_place.is_none()
            && self.inj_type.is_none()
            && self.parenthesis.is_none()
            && self.union == UnionMeta::default()
    }
}

impl Default for TargetState {
    fn default() -> Self {
        Self::new()
    }
}

/// Bring `state` back to the baseline before the next target of a
/// multi-target run. A single-target run keeps its state as is.
pub fn reset_target_state(state: TargetState, multiple_targets: bool) -> TargetState {
    if !multiple_targets {
        return state;
    }

    // Fresh jar: cookies gathered from the previous host must not be replayed
    TargetState::new()
}
