use crate::cli::commands::SessionArgs;
use crate::errors::SqlsentryError;
use crate::session::{read_session, NoResume};
use crate::target::target_host;
use std::path::PathBuf;
use tracing::info;

pub async fn handle_session(args: SessionArgs) -> Result<(), SqlsentryError> {
    info!(url = %args.url, "Reading session file");

    let path = PathBuf::from(&args.session_file);
    if !path.exists() {
        return Err(SqlsentryError::FilePath(format!(
            "No session file found at {}",
            path.display()
        )));
    }

    let url = args.url.replace('*', "");
    let host = target_host(&url)?;
    let queries = read_session(&path, &url, &host, &mut NoResume).await?;

    if queries.is_empty() {
        println!("no records for {} in {}", url, path.display());
        return Ok(());
    }

    let mut urls: Vec<&str> = queries.urls().collect();
    urls.sort_unstable();
    for recorded_url in urls {
        println!("[{}]", recorded_url);
        let Some(records) = queries.for_url(recorded_url) else {
            continue;
        };
        let mut expressions: Vec<(&String, &String)> = records.iter().collect();
        expressions.sort();
        for (expression, value) in expressions {
            println!("  {}: {}", expression, value);
        }
    }

    Ok(())
}
