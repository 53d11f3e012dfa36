use reqwest::Method;
use sqlsentry::config::TargetConfig;
use sqlsentry::errors::SqlsentryError;
use sqlsentry::target::{
    init_target_env, setup_target_env, Dbms, InjectionType, ParameterSource, TargetState,
};
use std::fs;
use tempfile::TempDir;

fn config(dir: &TempDir, url: &str) -> TargetConfig {
    TargetConfig {
        output_dir: dir.path().join("output"),
        ..TargetConfig::for_url(url)
    }
}

#[tokio::test]
async fn test_get_target_end_to_end() {
    let dir = TempDir::new().unwrap();
    let mut conf = config(&dir, "http://x/a.php?id=1");
    conf.method = Some(Method::GET);
    let mut state = TargetState::new();

    let env = setup_target_env(&mut conf, &mut state).await.unwrap();

    let get = state.parameters.testable(ParameterSource::Get).unwrap();
    assert_eq!(get.len(), 1);
    assert_eq!(get["id"], "1");
    assert_eq!(state.parameters.testable.len(), 1);
    assert_eq!(env.host, "x");
    assert_eq!(env.paths.output, dir.path().join("output").join("x"));
    assert_eq!(state.session_file.as_deref(), Some(env.paths.output.join("session").as_path()));
    assert!(env.paths.output.join("session").exists());
    assert!(env.paths.output.join("log").exists());
}

#[tokio::test]
async fn test_post_without_body_fails() {
    let dir = TempDir::new().unwrap();
    let mut conf = config(&dir, "http://x/login.php");
    conf.method = Some(Method::POST);
    conf.data = Some(String::new());
    let mut state = TargetState::new();

    let err = setup_target_env(&mut conf, &mut state).await.err().unwrap();
    assert!(matches!(err, SqlsentryError::Syntax(_)));
    assert!(state.parameters.is_empty());
}

#[tokio::test]
async fn test_uri_marker_stripped_from_live_url() {
    let dir = TempDir::new().unwrap();
    let mut conf = config(&dir, "http://x/*");
    let mut state = TargetState::new();

    setup_target_env(&mut conf, &mut state).await.unwrap();

    assert_eq!(conf.url, "http://x/");
    let uri = state.parameters.testable(ParameterSource::Uri).unwrap();
    assert_eq!(uri["URI"], "http://x/*");
}

#[tokio::test]
async fn test_previous_results_resumed_into_state() {
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("output").join("x");
    fs::create_dir_all(&output).unwrap();
    fs::write(
        output.join("session"),
        "[http://x/a.php?id=1][][][Injection point][GET]\n\
         [http://x/a.php?id=1][][][Injection parameter][id]\n\
         [http://x/a.php?id=1][][][Injection type][numeric]\n\
         [http://x/a.php?id=1][][][DBMS][MySQL 5]\n\
         [http://x/a.php?id=1][][][DBMS][MySQL 5.0]\n\
         [http://x/a.php?id=1][][][DBMS][MySQL]\n\
         [http://x/a.php?id=1][][][SELECT user()][root@loc]\n\
         [http://x/a.php?id=1][][][SELECT user()][root@localhost]\n\
         [http://other/][][][DBMS][Oracle]\n",
    )
    .unwrap();

    let mut conf = config(&dir, "http://x/a.php?id=1");
    let mut state = TargetState::new();
    setup_target_env(&mut conf, &mut state).await.unwrap();

    let url = "http://x/a.php?id=1";
    assert_eq!(state.resumed_queries.get(url, "DBMS"), Some("MySQL 5.0"));
    assert_eq!(state.resumed_queries.get(url, "SELECT user()"), Some("root@localhost"));
    assert_eq!(state.inj_place, Some(ParameterSource::Get));
    assert_eq!(state.inj_parameter.as_deref(), Some("id"));
    assert_eq!(state.inj_type, Some(InjectionType::Numeric));
    // The callback saw the superseded values too; the last one absorbed wins there
    assert_eq!(state.dbms, Some(Dbms::MySQL));
    assert_eq!(state.dbms_version, vec!["Unknown".to_string()]);
    assert!(state.dbms_detected);
}

#[tokio::test]
async fn test_flush_session_ignores_previous_results() {
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("output").join("x");
    fs::create_dir_all(&output).unwrap();
    fs::write(output.join("session"), "[http://x/?id=1][][][DBMS][MySQL]\n").unwrap();

    let mut conf = config(&dir, "http://x/?id=1");
    conf.flush_session = true;
    let mut state = TargetState::new();
    setup_target_env(&mut conf, &mut state).await.unwrap();

    assert!(state.resumed_queries.is_empty());
    assert!(state.dbms.is_none());
    let content = fs::read_to_string(output.join("session")).unwrap();
    assert!(!content.contains("MySQL"));
}

#[tokio::test]
async fn test_dump_and_files_directories_created_on_demand() {
    let dir = TempDir::new().unwrap();
    let mut conf = config(&dir, "http://x/?id=1");
    conf.dump_all = true;
    conf.write_file = Some("/tmp/shell.php".into());
    conf.xml_file = Some(dir.path().join("results.xml"));
    let mut state = TargetState::new();

    let env = setup_target_env(&mut conf, &mut state).await.unwrap();

    assert!(env.paths.dump.unwrap().is_dir());
    assert!(env.paths.files.unwrap().is_dir());
    assert_eq!(env.dumper.output_file(), Some(dir.path().join("results.xml").as_path()));
}

#[tokio::test]
async fn test_multiple_targets_do_not_share_state() {
    let dir = TempDir::new().unwrap();
    let first_out = dir.path().join("output").join("a.local");
    fs::create_dir_all(&first_out).unwrap();
    fs::write(first_out.join("session"), "[http://a.local/?id=1][][][DBMS][PostgreSQL]\n").unwrap();

    let mut state = TargetState::new();

    let mut first = config(&dir, "http://a.local/?id=1");
    first.multiple_targets = true;
    state = init_target_env(&first, state);
    setup_target_env(&mut first, &mut state).await.unwrap();
    assert_eq!(state.dbms, Some(Dbms::PostgreSQL));

    let mut second = config(&dir, "http://b.local/?cat=2");
    second.multiple_targets = true;
    state = init_target_env(&second, state);
    assert!(state.is_baseline());
    setup_target_env(&mut second, &mut state).await.unwrap();

    assert!(state.dbms.is_none());
    assert!(state.parameters.testable(ParameterSource::Get).unwrap().contains_key("cat"));
    assert_eq!(
        state.session_file.as_deref(),
        Some(dir.path().join("output").join("b.local").join("session").as_path())
    );
}

#[tokio::test]
async fn test_direct_connection() {
    let dir = TempDir::new().unwrap();
    let mut conf = config(&dir, "mysql://root:pw@db.local:3306/app");
    conf.direct = true;
    conf.data = Some("ignored=1".into());
    let mut state = TargetState::new();

    let env = setup_target_env(&mut conf, &mut state).await.unwrap();
    assert_eq!(env.host, "db.local");
    assert_eq!(state.parameters.raw.len(), 1);
    assert!(state.parameters.raw(ParameterSource::Direct).is_some());
}

#[tokio::test]
async fn test_unknown_forced_dbms_rejected() {
    let dir = TempDir::new().unwrap();
    let mut conf = config(&dir, "http://x/?id=1");
    conf.dbms = Some("Informix".into());
    let mut state = TargetState::new();

    let err = setup_target_env(&mut conf, &mut state).await.err().unwrap();
    assert!(err.is_config_kind());
}

#[tokio::test]
async fn test_direct_connection_without_host() {
    let dir = TempDir::new().unwrap();
    for dsn in ["sqlite:///tmp/app.db", "/tmp/app.db"] {
        let mut conf = config(&dir, dsn);
        conf.direct = true;
        let mut state = TargetState::new();

        let env = setup_target_env(&mut conf, &mut state).await.unwrap();
        assert_eq!(env.host, "localhost");
        assert_eq!(env.paths.output, dir.path().join("output").join("localhost"));
        assert!(state.parameters.raw(ParameterSource::Direct).is_some());
        assert_eq!(
            state.session_file.as_deref(),
            Some(dir.path().join("output").join("localhost").join("session").as_path())
        );
    }
}
