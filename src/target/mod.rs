pub mod dirs;
pub mod param_dict;
pub mod params;
pub mod source;
pub mod state;

pub use dirs::{create_output_directories, TargetPaths};
pub use param_dict::{param_to_dict, ParamDict};
pub use params::{extract_parameters, ParameterMap};
pub use source::ParameterSource;
pub use state::{reset_target_state, Dbms, InjectionType, TargetState, UnionMeta};

use tracing::info;
use url::Url;

use crate::config::TargetConfig;
use crate::errors::SqlsentryError;
use crate::reporting::{select_dumper, Dumper};
use crate::session::{load_session, session_path, SessionWriter, TargetResumer};

/// Handles that live for the rest of one target's scan.
pub struct TargetEnv {
    pub host: String,
    pub paths: TargetPaths,
    pub dumper: Dumper,
    pub session: SessionWriter,
}

/// Host name used for file-based DBMS connections that have none.
pub const LOCAL_HOST: &str = "localhost";

/// Host name of the target URL (or DSN for direct connections).
pub fn target_host(url: &str) -> Result<String, SqlsentryError> {
    let parsed = Url::parse(url)
        .map_err(|e| SqlsentryError::InvalidTarget(format!("'{}' is not a valid URL ({})", url, e)))?;
    parsed
        .host_str()
        .filter(|h| !h.is_empty())
        .map(str::to_string)
        .ok_or_else(|| SqlsentryError::InvalidTarget(format!("'{}' has no host", url)))
}

/// Host the output directory and session records are keyed on. Direct
/// connections to file-based databases (`sqlite:///app.db`, a bare path)
/// fall back to [`LOCAL_HOST`].
pub fn connection_host(conf: &TargetConfig) -> Result<String, SqlsentryError> {
    if !conf.direct {
        return target_host(&conf.url);
    }
    Ok(target_host(&conf.url).unwrap_or_else(|_| LOCAL_HOST.to_string()))
}

/// Called before each target; clears the previous target's state when
/// several targets are processed in one run.
pub fn init_target_env(conf: &TargetConfig, state: TargetState) -> TargetState {
    reset_target_state(state, conf.multiple_targets)
}

/// Prepare everything needed to scan the target described by `conf`.
pub async fn setup_target_env(
    conf: &mut TargetConfig,
    state: &mut TargetState,
) -> Result<TargetEnv, SqlsentryError> {
    let host = connection_host(conf)?;
    let forced_dbms = conf
        .dbms
        .as_deref()
        .map(str::parse::<Dbms>)
        .transpose()
        .map_err(SqlsentryError::Config)?;

    let paths = create_output_directories(
        &conf.output_dir,
        &host,
        conf.needs_dump_dir(),
        conf.needs_files_dir(),
    )
    .await?;

    let mut dumper = select_dumper(conf.xml_file.is_some());
    dumper.set_output_file(&paths.output, conf.xml_file.as_deref()).await?;

    state.parameters = extract_parameters(conf)?;
    info!(
        target = %conf.url,
        sources = state.parameters.raw.len(),
        testable = state.parameters.testable.len(),
        "Testable parameters identified"
    );

    let session_file = session_path(conf.session_file.as_deref(), &paths.output);
    state.session_file = Some(session_file.clone());

    let loaded = {
        let mut resumer = TargetResumer::new(state, &conf.url, forced_dbms);
        load_session(&session_file, &conf.url, &host, conf.flush_session, &mut resumer).await?
    };
    state.resumed_queries = loaded.queries;

    Ok(TargetEnv {
        host,
        paths,
        dumper,
        session: loaded.writer,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_host() {
        assert_eq!(target_host("http://example.com:8080/a.php?id=1").unwrap(), "example.com");
        assert_eq!(target_host("http://x/*").unwrap(), "x");
        assert_eq!(target_host("mysql://root:pw@db.local:3306/app").unwrap(), "db.local");
        assert!(matches!(target_host("not a url"), Err(SqlsentryError::InvalidTarget(_))));
    }

    #[test]
    fn test_direct_connection_host_falls_back_to_localhost() {
        let mut conf = TargetConfig::for_url("sqlite:///tmp/app.db");
        assert!(matches!(connection_host(&conf), Err(SqlsentryError::InvalidTarget(_))));

        conf.direct = true;
        assert_eq!(connection_host(&conf).unwrap(), LOCAL_HOST);
        conf.url = "/tmp/app.db".into();
        assert_eq!(connection_host(&conf).unwrap(), LOCAL_HOST);
        conf.url = "mysql://root:pw@db.local:3306/app".into();
        assert_eq!(connection_host(&conf).unwrap(), "db.local");
    }

    #[test]
    fn test_init_resets_only_in_multi_target_mode() {
        let mut conf = TargetConfig::for_url("http://x/?id=1");
        let mut state = TargetState::new();
        state.dbms = Some(Dbms::Oracle);

        let state = init_target_env(&conf, state);
        assert_eq!(state.dbms, Some(Dbms::Oracle));

        conf.multiple_targets = true;
        let state = init_target_env(&conf, state);
        assert!(state.is_baseline());
    }
}
