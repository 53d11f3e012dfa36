use crate::cli::commands::InitArgs;
use crate::config::{self, SqlsentryConfig, TargetConfig};
use crate::errors::SqlsentryError;
use crate::target::{init_target_env, setup_target_env, TargetEnv, TargetState};
use std::path::PathBuf;
use tracing::{error, info};

pub async fn handle_init(args: InitArgs, quiet: bool) -> Result<(), SqlsentryError> {
    let file_config = if let Some(config_path) = &args.config {
        Some(config::parse_config(&PathBuf::from(config_path)).await?)
    } else {
        None
    };

    let targets = resolve_targets(&args, file_config.as_ref()).await?;
    let mut base = build_target_config(&args, file_config.as_ref())?;
    base.multiple_targets = targets.len() > 1 || args.targets.is_some();

    let mut state = TargetState::new();
    for url in targets {
        let mut conf = TargetConfig { url, ..base.clone() };
        info!(target = %conf.url, "Initializing target environment");

        state = init_target_env(&conf, state);
        match prepare_target(&mut conf, &mut state).await {
            Ok(env) => {
                if !quiet {
                    print_summary(&conf, &state, &env);
                }
            }
            Err(e) if conf.multiple_targets => {
                error!(target = %conf.url, "{}, skipping to next target", e);
            }
            Err(e) => return Err(e),
        }
    }

    Ok(())
}

async fn prepare_target(
    conf: &mut TargetConfig,
    state: &mut TargetState,
) -> Result<TargetEnv, SqlsentryError> {
    let mut env = setup_target_env(conf, state).await?;
    env.dumper.parameters(&state.parameters).await?;
    Ok(env)
}

async fn resolve_targets(
    args: &InitArgs,
    file_config: Option<&SqlsentryConfig>,
) -> Result<Vec<String>, SqlsentryError> {
    let section = file_config.and_then(|c| c.target.as_ref());

    if let Some(url) = &args.url {
        return Ok(vec![url.clone()]);
    }
    if let Some(path) = &args.targets {
        return config::load_targets_file(&PathBuf::from(path)).await;
    }
    if let Some(url) = section.and_then(|t| t.url.clone()) {
        return Ok(vec![url]);
    }
    if let Some(path) = section.and_then(|t| t.targets_file.as_ref()) {
        return config::load_targets_file(&PathBuf::from(path)).await;
    }

    Err(SqlsentryError::Config(
        "missing target: provide --url, --targets or target.url in the config file".into(),
    ))
}

/// Merge CLI flags over the config file into the per-run request template.
fn build_target_config(
    args: &InitArgs,
    file_config: Option<&SqlsentryConfig>,
) -> Result<TargetConfig, SqlsentryError> {
    let target = file_config.and_then(|c| c.target.clone()).unwrap_or_default();
    let session = file_config.and_then(|c| c.session.clone()).unwrap_or_default();
    let output = file_config.and_then(|c| c.output.clone()).unwrap_or_default();
    let enumeration = file_config.and_then(|c| c.enumeration.clone()).unwrap_or_default();
    let files = file_config.and_then(|c| c.files.clone()).unwrap_or_default();

    let method = args
        .method
        .as_deref()
        .or(target.method.as_deref())
        .map(config::parse_method)
        .transpose()?;

    let mut headers = target
        .headers
        .unwrap_or_default()
        .into_iter()
        .map(|h| (h.name, h.value))
        .collect::<Vec<_>>();
    for raw in &args.headers {
        headers.push(config::parse_header(raw)?);
    }

    let test_parameter = match &args.test_parameter {
        Some(list) => list
            .split(',')
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(str::to_string)
            .collect(),
        None => target.test_parameter.unwrap_or_default(),
    };

    let defaults = TargetConfig::default();
    Ok(TargetConfig {
        url: String::new(),
        query: None,
        method,
        data: args.data.clone().or(target.data),
        cookie: args.cookie.clone().or(target.cookie),
        headers,
        direct: args.direct || target.direct.unwrap_or(false),
        test_parameter,
        dbms: args.dbms.clone().or(target.dbms),
        session_file: args.session_file.clone().or(session.file).map(PathBuf::from),
        flush_session: args.flush_session || session.flush.unwrap_or(false),
        output_dir: args
            .output_dir
            .clone()
            .or(output.directory)
            .map(PathBuf::from)
            .unwrap_or(defaults.output_dir),
        xml_file: args.xml_file.clone().or(output.xml_file).map(PathBuf::from),
        dump_table: args.dump_table || enumeration.dump_table.unwrap_or(false),
        dump_all: args.dump_all || enumeration.dump_all.unwrap_or(false),
        search: args.search || enumeration.search.unwrap_or(false),
        read_file: args.read_file.clone().or(files.read),
        write_file: args.write_file.clone().or(files.write),
        multiple_targets: false,
    })
}

fn print_summary(conf: &TargetConfig, state: &TargetState, env: &TargetEnv) {
    println!("target: {} (host {})", conf.url, env.host);
    println!("  output directory: {}", env.paths.output.display());
    println!("  session file: {}", env.session.path().display());
    for (source, raw) in &state.parameters.raw {
        let marker = if state.parameters.is_testable(*source) { "testable" } else { "not testable" };
        println!("  {} [{}]: {}", source, marker, raw);
    }
    println!("  resumed records: {}", state.resumed_queries.len());
    if let Some(dbms) = state.dbms {
        println!("  back-end DBMS: {} {}", dbms, state.dbms_version.join(", "));
    }
    if let (Some(place), Some(parameter)) = (state.inj_place, &state.inj_parameter) {
        println!("  injection point: {} parameter '{}'", place, parameter);
    }
}
