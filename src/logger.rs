// 日志初始化 - 同时输出到控制台和按天轮转的日志文件

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::time::LocalTime;
use tracing_subscriber::fmt::writer::MakeWriterExt;

/// 默认日志目录
pub fn default_log_dir() -> PathBuf {
    if cfg!(target_os = "macos") {
        let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
        PathBuf::from(home).join("Library/Logs/service-ledger")
    } else if cfg!(target_os = "windows") {
        let appdata = std::env::var("APPDATA").unwrap_or_else(|_| ".".to_string());
        PathBuf::from(appdata).join("service-ledger").join("logs")
    } else {
        let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
        PathBuf::from(home).join(".local/share/service-ledger/logs")
    }
}

/// 解析日志级别，无法识别时使用 INFO
pub fn parse_level(level: &str) -> Level {
    level.trim().parse::<Level>().unwrap_or(Level::INFO)
}

/// 构建日志订阅器（不注册为全局）
///
/// 返回的 guard 需要在程序生命周期内保持，drop 时刷新文件缓冲
pub fn build_subscriber(
    log_dir: &Path,
    level: Level,
) -> Result<(impl tracing::Subscriber + Send + Sync + 'static, WorkerGuard)> {
    std::fs::create_dir_all(log_dir)
        .with_context(|| format!("无法创建日志目录: {:?}", log_dir))?;

    // 配置日志输出到文件（每天轮转）
    let file_appender = tracing_appender::rolling::daily(log_dir, "ledger.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let writer = std::io::stdout.and(non_blocking);

    // 使用本地时区
    let timer = LocalTime::new(time::macros::format_description!(
        "[year]-[month]-[day] [hour]:[minute]:[second].[subsecond digits:3]"
    ));

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(writer)
        .with_timer(timer)
        .with_ansi(cfg!(debug_assertions)) // release 版本不使用颜色代码
        .finish();

    Ok((subscriber, guard))
}

/// 初始化日志系统并注册为全局订阅器
pub fn init(log_dir: &Path, level: Level) -> Result<WorkerGuard> {
    let (subscriber, guard) = build_subscriber(log_dir, level)?;
    tracing::subscriber::set_global_default(subscriber).context("日志系统已初始化")?;

    eprintln!("日志文件位置: {:?}", log_dir);
    Ok(guard)
}
