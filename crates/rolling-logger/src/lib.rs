//! Rolling Logger
//!
//! A rolling file logger with a circular buffer.
//!
//! - Log lines go to `<dir>/<app>.log` and to stderr.
//! - When the active file passes `max_file_bytes` it is rotated to
//!   `<app>.1.log`, `<app>.2.log`, ... and the oldest file is dropped, so at
//!   most `max_files` files exist at any time.
//! - The last `buffer_lines` lines are kept in memory for in-app diagnostics.
//!
//! `log` records are bridged into the same subscriber, so crates using the
//! `log` facade end up in the same files.

use std::collections::VecDeque;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};

use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::time::FormatTime;
use tracing_subscriber::fmt::writer::MakeWriterExt;
use tracing_subscriber::fmt::MakeWriter;

static LOGGER: OnceLock<RollingWriter> = OnceLock::new();

#[derive(Debug, thiserror::Error)]
pub enum LoggerError {
    #[error("log directory error: {0}")]
    Io(#[from] io::Error),
    #[error("logger already initialized")]
    AlreadyInitialized,
    #[error("logger not initialized")]
    NotInitialized,
}

/// Logger settings
#[derive(Debug, Clone)]
pub struct LoggerConfig {
    pub max_file_bytes: u64,
    pub max_files: usize,
    pub buffer_lines: usize,
    pub level: log::LevelFilter,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            max_file_bytes: 1024 * 1024,
            max_files: 5,
            buffer_lines: 500,
            level: log::LevelFilter::Info,
        }
    }
}

// ========================
// Rolling file
// ========================

struct RollingFile {
    dir: PathBuf,
    app_name: String,
    file: File,
    written: u64,
    config: LoggerConfig,
    recent: VecDeque<String>,
}

impl RollingFile {
    fn open(dir: &Path, app_name: &str, config: LoggerConfig) -> io::Result<Self> {
        fs::create_dir_all(dir)?;
        let path = active_path(dir, app_name);
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        let written = file.metadata().map(|m| m.len()).unwrap_or(0);

        Ok(Self {
            dir: dir.to_path_buf(),
            app_name: app_name.to_string(),
            file,
            written,
            recent: VecDeque::with_capacity(config.buffer_lines),
            config,
        })
    }

    fn rotate(&mut self) -> io::Result<()> {
        self.file.flush()?;
        let keep = self.config.max_files.max(1);

        // Drop the oldest, shift the rest up by one
        let oldest = rotated_path(&self.dir, &self.app_name, keep - 1);
        if keep > 1 && oldest.exists() {
            fs::remove_file(&oldest)?;
        }
        for index in (1..keep.saturating_sub(1)).rev() {
            let from = rotated_path(&self.dir, &self.app_name, index);
            if from.exists() {
                fs::rename(&from, rotated_path(&self.dir, &self.app_name, index + 1))?;
            }
        }

        let active = active_path(&self.dir, &self.app_name);
        if keep > 1 {
            fs::rename(&active, rotated_path(&self.dir, &self.app_name, 1))?;
        }
        self.file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&active)?;
        self.written = 0;
        Ok(())
    }

    fn remember(&mut self, buf: &[u8]) {
        if self.config.buffer_lines == 0 {
            return;
        }
        for line in String::from_utf8_lossy(buf).lines() {
            if line.is_empty() {
                continue;
            }
            if self.recent.len() == self.config.buffer_lines {
                self.recent.pop_front();
            }
            self.recent.push_back(line.to_string());
        }
    }
}

fn active_path(dir: &Path, app_name: &str) -> PathBuf {
    dir.join(format!("{}.log", app_name))
}

fn rotated_path(dir: &Path, app_name: &str, index: usize) -> PathBuf {
    dir.join(format!("{}.{}.log", app_name, index))
}

/// Shared handle to the rolling file, usable as a tracing writer
#[derive(Clone)]
pub struct RollingWriter {
    inner: Arc<Mutex<RollingFile>>,
}

impl RollingWriter {
    pub fn open(dir: impl AsRef<Path>, app_name: &str, config: LoggerConfig) -> io::Result<Self> {
        let file = RollingFile::open(dir.as_ref(), app_name, config)?;
        Ok(Self {
            inner: Arc::new(Mutex::new(file)),
        })
    }

    fn lock(&self) -> MutexGuard<'_, RollingFile> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Most recent lines, oldest first
    pub fn recent_lines(&self) -> Vec<String> {
        self.lock().recent.iter().cloned().collect()
    }

    /// Path of the file currently written to
    pub fn active_file(&self) -> PathBuf {
        let file = self.lock();
        active_path(&file.dir, &file.app_name)
    }
}

impl Write for RollingWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut file = self.lock();
        if file.written > 0 && file.written + buf.len() as u64 > file.config.max_file_bytes {
            file.rotate()?;
        }
        file.file.write_all(buf)?;
        file.written += buf.len() as u64;
        file.remember(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.lock().file.flush()
    }
}

impl<'a> MakeWriter<'a> for RollingWriter {
    type Writer = RollingWriter;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

struct LocalTime;

impl FormatTime for LocalTime {
    fn format_time(&self, w: &mut Writer<'_>) -> std::fmt::Result {
        write!(w, "{}", chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f"))
    }
}

fn to_tracing_level(level: log::LevelFilter) -> LevelFilter {
    match level {
        log::LevelFilter::Off => LevelFilter::OFF,
        log::LevelFilter::Error => LevelFilter::ERROR,
        log::LevelFilter::Warn => LevelFilter::WARN,
        log::LevelFilter::Info => LevelFilter::INFO,
        log::LevelFilter::Debug => LevelFilter::DEBUG,
        log::LevelFilter::Trace => LevelFilter::TRACE,
    }
}

// ========================
// Global logger
// ========================

/// Initialize the global logger with default settings
pub fn init_logger(log_dir: impl AsRef<Path>, app_name: &str) -> Result<(), LoggerError> {
    init_logger_with(log_dir, app_name, LoggerConfig::default())
}

/// Initialize the global logger. Can only succeed once per process.
pub fn init_logger_with(
    log_dir: impl AsRef<Path>,
    app_name: &str,
    config: LoggerConfig,
) -> Result<(), LoggerError> {
    if LOGGER.get().is_some() {
        return Err(LoggerError::AlreadyInitialized);
    }

    let level = to_tracing_level(config.level);
    let writer = RollingWriter::open(log_dir, app_name, config)?;

    tracing_subscriber::fmt()
        .with_timer(LocalTime)
        .with_ansi(false)
        .with_max_level(level)
        .with_writer(writer.clone().and(io::stderr))
        .try_init()
        .map_err(|_| LoggerError::AlreadyInitialized)?;

    LOGGER
        .set(writer)
        .map_err(|_| LoggerError::AlreadyInitialized)?;

    tracing::info!(app = app_name, "logger initialized");
    Ok(())
}

fn installed() -> Result<&'static RollingWriter, LoggerError> {
    LOGGER.get().ok_or(LoggerError::NotInitialized)
}

pub fn info(message: &str) -> Result<(), LoggerError> {
    installed()?;
    tracing::info!("{}", message);
    Ok(())
}

pub fn warn(message: &str) -> Result<(), LoggerError> {
    installed()?;
    tracing::warn!("{}", message);
    Ok(())
}

pub fn error(message: &str) -> Result<(), LoggerError> {
    installed()?;
    tracing::error!("{}", message);
    Ok(())
}

/// Recent lines from the global logger's circular buffer
pub fn recent_lines() -> Vec<String> {
    LOGGER.get().map(|w| w.recent_lines()).unwrap_or_default()
}
