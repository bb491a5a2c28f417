// ==========================================
// 人道反馈看板 - 命令行入口
// ==========================================
// 用法:
//   feedback-dashboard init
//   feedback-dashboard import <profile_label> <file.xlsx>
//   feedback-dashboard profiles
//
// 数据库路径: FEEDBACK_DASHBOARD_DB_PATH（默认用户数据目录）
// 界面语言: FEEDBACK_DASHBOARD_LOCALE（默认 en）
// ==========================================

use anyhow::{bail, Context};
use feedback_dashboard::config::{seed_builtin_profiles, seed_default_taxonomies, AppConfig};
use feedback_dashboard::db::open_sqlite_connection;
use feedback_dashboard::repository::{SqliteItemStore, SqliteProfileStore, SqliteTaxonomyRepository};
use feedback_dashboard::{i18n, logging, SheetImporter};
use rusqlite::Connection;
use std::fs::File;
use std::io::BufReader;
use std::process::ExitCode;
use std::sync::{Arc, Mutex};

const USAGE: &str = "usage: feedback-dashboard <init | import <profile_label> <file.xlsx> | profiles>";

fn main() -> anyhow::Result<ExitCode> {
    logging::init();

    let config = AppConfig::from_env();
    i18n::set_locale(&config.locale);

    tracing::info!(
        version = feedback_dashboard::VERSION,
        db_path = %config.db_path,
        locale = %config.locale,
        "{}",
        feedback_dashboard::APP_NAME
    );

    let args: Vec<String> = std::env::args().skip(1).collect();
    let conn = Arc::new(Mutex::new(
        open_sqlite_connection(&config.db_path)
            .with_context(|| format!("无法打开数据库: {}", config.db_path))?,
    ));

    match args.iter().map(String::as_str).collect::<Vec<_>>().as_slice() {
        ["init"] => {
            init(conn)?;
            Ok(ExitCode::SUCCESS)
        }
        ["import", label, path] => import(conn, label, path),
        ["profiles"] => {
            let store = SqliteProfileStore::from_connection(conn)?;
            for label in store.list_labels()? {
                println!("{}", label);
            }
            Ok(ExitCode::SUCCESS)
        }
        _ => bail!(USAGE),
    }
}

fn init(conn: Arc<Mutex<Connection>>) -> anyhow::Result<()> {
    let taxonomies = SqliteTaxonomyRepository::from_connection(conn.clone())?;
    let profiles = SqliteProfileStore::from_connection(conn)?;

    let taxonomy_count = seed_default_taxonomies(&taxonomies)?;
    let profile_count = seed_builtin_profiles(&profiles)?;

    println!(
        "initialised: {} taxonomies, {} profiles",
        taxonomy_count, profile_count
    );
    Ok(())
}

fn import(conn: Arc<Mutex<Connection>>, label: &str, path: &str) -> anyhow::Result<ExitCode> {
    let file = File::open(path).with_context(|| format!("无法打开文件: {}", path))?;

    let importer = SheetImporter::new(
        SqliteProfileStore::from_connection(conn.clone())?,
        SqliteItemStore::from_connection(conn)?,
    );

    match importer.store_spreadsheet(label, BufReader::new(file)) {
        Ok(outcome) => {
            println!("{}", outcome.notice());
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            // 消息原样展示给用户
            eprintln!("{}", e);
            Ok(ExitCode::FAILURE)
        }
    }
}
