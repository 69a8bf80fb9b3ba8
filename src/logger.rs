//! Session log for the colouring engine.
//!
//! One file per process, truncated when it is opened, so it only ever holds
//! the latest run. Until [`init`] or [`init_at`] succeeds every `log_*!` call
//! is a cheap no-op: the library never needs a writable filesystem.
//!
//! Default location:
//!   Windows:  `%APPDATA%\InkFill\inkfill.log`
//!   Linux:    `$XDG_DATA_HOME/InkFill/inkfill.log` or `~/.local/share/InkFill/inkfill.log`
//!   macOS:    `~/Library/Application Support/InkFill/inkfill.log`
//!
//! [`set_echo`] additionally mirrors every line to stderr (the CLI's `-v`).

use std::fmt;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, OnceLock};
use std::time::{SystemTime, UNIX_EPOCH};

struct Sink {
    path: PathBuf,
    file: Mutex<File>,
}

static SINK: OnceLock<Sink> = OnceLock::new();
static ECHO: AtomicBool = AtomicBool::new(false);

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Level {
    Info,
    Warn,
    Error,
    Panic,
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Level::Info => "INFO",
            Level::Warn => "WARN",
            Level::Error => "ERROR",
            Level::Panic => "PANIC",
        })
    }
}

#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => {
        $crate::logger::write($crate::logger::Level::Info, &format!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_warn {
    ($($arg:tt)*) => {
        $crate::logger::write($crate::logger::Level::Warn, &format!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_err {
    ($($arg:tt)*) => {
        $crate::logger::write($crate::logger::Level::Error, &format!($($arg)*))
    };
}

/// Path of the open log file, if any.
pub fn log_path() -> Option<&'static Path> {
    SINK.get().map(|s| s.path.as_path())
}

/// Mirror log lines to stderr as well.
pub fn set_echo(on: bool) {
    ECHO.store(on, Ordering::Relaxed);
}

/// Append one `[HH:MM:SS] [LEVEL] msg` line. I/O errors are swallowed.
pub fn write(level: Level, msg: &str) {
    let sink = SINK.get();
    let echo = ECHO.load(Ordering::Relaxed);
    if sink.is_none() && !echo {
        return;
    }

    let line = format!("[{}] [{}] {}", clock(now_secs()), level, msg);
    if echo {
        eprintln!("{}", line);
    }
    if let Some(sink) = sink {
        write_raw(sink, &line);
    }
}

fn write_raw(sink: &Sink, line: &str) {
    if let Ok(mut file) = sink.file.lock() {
        let _ = writeln!(file, "{}", line);
    }
}

/// Open the log at [`default_log_path`].
pub fn init() -> bool {
    init_at(&default_log_path())
}

/// Open (truncating) the log at `path` and install a panic hook that records
/// panics before the previous hook runs. Returns `false` if a log is already
/// open or the file cannot be created.
pub fn init_at(path: &Path) -> bool {
    if SINK.get().is_some() {
        return false;
    }
    if let Some(parent) = path.parent() {
        let _ = fs::create_dir_all(parent);
    }

    let file = match OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(path)
    {
        Ok(f) => f,
        Err(e) => {
            eprintln!("[logger] cannot open {}: {}", path.display(), e);
            return false;
        }
    };

    let sink = Sink {
        path: path.to_path_buf(),
        file: Mutex::new(file),
    };
    if SINK.set(sink).is_err() {
        return false;
    }
    if let Some(sink) = SINK.get() {
        write_raw(sink, &format!("=== InkFill {} ===", env!("CARGO_PKG_VERSION")));
        write_raw(sink, &format!("started (unix {})", now_secs()));
        write_raw(sink, "");
    }

    let prev = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        write(Level::Panic, &info.to_string());
        prev(info);
    }));
    true
}

/// `<data dir>/InkFill/inkfill.log` for the current platform.
pub fn default_log_path() -> PathBuf {
    data_dir().join("InkFill").join("inkfill.log")
}

/// Platform data directory (without the app sub-folder).
fn data_dir() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        if let Ok(appdata) = std::env::var("APPDATA") {
            return PathBuf::from(appdata);
        }
    }
    #[cfg(target_os = "macos")]
    {
        if let Ok(home) = std::env::var("HOME") {
            return PathBuf::from(home).join("Library").join("Application Support");
        }
    }
    std::env::var("XDG_DATA_HOME")
        .map(PathBuf::from)
        .or_else(|_| std::env::var("HOME").map(|h| PathBuf::from(h).join(".local").join("share")))
        .unwrap_or_else(|_| PathBuf::from("."))
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// `HH:MM:SS` (UTC) within the day.
fn clock(secs: u64) -> String {
    format!(
        "{:02}:{:02}:{:02}",
        (secs % 86_400) / 3600,
        (secs % 3600) / 60,
        secs % 60
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clock_wraps_at_midnight() {
        assert_eq!(clock(0), "00:00:00");
        assert_eq!(clock(86_399), "23:59:59");
        assert_eq!(clock(86_400 + 3_723), "01:02:03");
    }

    #[test]
    fn default_log_lives_in_app_folder() {
        let path = default_log_path();
        assert!(path.ends_with(Path::new("InkFill").join("inkfill.log")));
    }

    #[test]
    fn levels_print_upper_case() {
        assert_eq!(Level::Warn.to_string(), "WARN");
        assert!(Level::Error > Level::Info);
    }

    #[test]
    fn file_receives_lines_once_opened() {
        let path = std::env::temp_dir().join(format!("inkfill-log-{}.log", std::process::id()));
        if !init_at(&path) {
            // Another test already opened the process-wide log.
            return;
        }
        assert_eq!(log_path(), Some(path.as_path()));
        assert!(!init_at(&path));

        crate::log_warn!("stroke {}", 42);
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("=== InkFill "));
        assert!(text.contains("started (unix "));
        assert!(text.contains("[WARN] stroke 42"));
        let _ = std::fs::remove_file(&path);
    }
}
