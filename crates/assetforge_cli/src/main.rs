//! Operator entry point for the item store.
//!
//! # Responsibility
//! - Apply schema migrations to a store file and report what ran.
//! - Run integrity checks without starting the desktop application.
//!
//! Set `ASSETFORGE_LOG_DIR` (absolute path) to also write core log files.

use assetforge_core::db::migrations::apply_pending;
use assetforge_core::{
    core_version, default_log_level, ensure_store_ready, init_logging, open_db, ping,
    verify_database,
};
use log::info;
use std::process::ExitCode;

const USAGE: &str = "usage: assetforge <ping | migrate <db> [scripts_dir] | verify <db>>";

fn main() -> ExitCode {
    if let Ok(log_dir) = std::env::var("ASSETFORGE_LOG_DIR") {
        if let Err(err) = init_logging(default_log_level(), &log_dir) {
            eprintln!("logging disabled: {err}");
        }
    }

    let args: Vec<String> = std::env::args().skip(1).collect();
    let args: Vec<&str> = args.iter().map(String::as_str).collect();
    let outcome = match args.as_slice() {
        [] | ["ping"] => {
            println!("assetforge_core ping={}", ping());
            println!("assetforge_core version={}", core_version());
            Ok(())
        }
        ["migrate", db_path] => migrate(db_path, None),
        ["migrate", db_path, scripts_dir] => migrate(db_path, Some(*scripts_dir)),
        ["verify", db_path] => verify(db_path),
        _ => Err(USAGE.to_string()),
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("{message}");
            ExitCode::FAILURE
        }
    }
}

fn migrate(db_path: &str, scripts_dir: Option<&str>) -> Result<(), String> {
    let mut conn = open_db(db_path).map_err(|err| err.to_string())?;
    if let Some(scripts_dir) = scripts_dir {
        let applied = apply_pending(&mut conn, scripts_dir).map_err(|err| err.to_string())?;
        info!(
            "event=cli_migrate module=cli status=ok applied={}",
            applied.len()
        );
        if applied.is_empty() {
            println!("no pending scripts in {scripts_dir}");
        }
        for name in applied {
            println!("applied {name}");
        }
    }
    println!("store ready: {db_path}");
    Ok(())
}

fn verify(db_path: &str) -> Result<(), String> {
    let conn = open_db(db_path).map_err(|err| err.to_string())?;
    verify_database(&conn).map_err(|err| err.to_string())?;
    ensure_store_ready(&conn).map_err(|err| err.to_string())?;
    info!("event=cli_verify module=cli status=ok");
    println!("ok");
    Ok(())
}
