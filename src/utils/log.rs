//! Leveled stderr logging.
//!
//! Output is one line per message: UTC timestamp, level label, text. The
//! minimum level is process-wide; binaries pick it with [`set_level`] or
//! [`init_from_env`]. Library code only emits through the exported macros,
//! which are silent in unit tests.

use std::fmt;
use std::io::Write;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Level {
    Debug = 0,
    Info = 1,
    Warn = 2,
    Error = 3,
}

impl Level {
    fn label(self) -> &'static str {
        match self {
            Level::Debug => "DEBUG",
            Level::Info => "INFO",
            Level::Warn => "WARN",
            Level::Error => "ERROR",
        }
    }

    fn color(self) -> ColorSpec {
        let mut spec = ColorSpec::new();
        match self {
            Level::Debug => {
                spec.set_dimmed(true);
            }
            Level::Info => {}
            Level::Warn => {
                spec.set_fg(Some(Color::Yellow)).set_bold(true);
            }
            Level::Error => {
                spec.set_fg(Some(Color::Red)).set_bold(true);
            }
        }
        spec
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.label())
    }
}

impl FromStr for Level {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "debug" | "trace" => Ok(Level::Debug),
            "info" => Ok(Level::Info),
            "warn" | "warning" => Ok(Level::Warn),
            "error" => Ok(Level::Error),
            _ => Err(()),
        }
    }
}

const OFF: u8 = u8::MAX;

static MIN_LEVEL: AtomicU8 = AtomicU8::new(Level::Info as u8);
pub static SHOW_TIMESTAMP: AtomicBool = AtomicBool::new(true);
pub static SHOW_LEVEL: AtomicBool = AtomicBool::new(true);

pub fn set_level(level: Level) {
    MIN_LEVEL.store(level as u8, Ordering::Relaxed);
}

/// Silences all output.
pub fn disable() {
    MIN_LEVEL.store(OFF, Ordering::Relaxed);
}

pub fn enabled(level: Level) -> bool {
    level as u8 >= MIN_LEVEL.load(Ordering::Relaxed)
}

/// Applies the level named by environment variable `var`: a [`Level`] name
/// or `off`. An unset variable keeps the current level.
///
/// Returns the unrecognized value, if any.
pub fn init_from_env(var: &str) -> Result<(), String> {
    let Ok(value) = std::env::var(var) else {
        return Ok(());
    };
    if value.trim().eq_ignore_ascii_case("off") {
        disable();
        return Ok(());
    }
    let level = value.parse::<Level>().map_err(|()| value.clone())?;
    set_level(level);
    Ok(())
}

/// UTC wall-clock time with millisecond precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Timestamp {
    year: i64,
    month: u32,
    day: u32,
    seconds_of_day: u64,
    millis: u32,
}

impl Timestamp {
    fn now() -> Self {
        let elapsed = SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default();
        Self::from_unix(elapsed.as_secs(), elapsed.subsec_millis())
    }

    /// Civil date from days since 1970-01-01 (proleptic Gregorian).
    fn from_unix(secs: u64, millis: u32) -> Self {
        // Shift the epoch to 0000-03-01 so leap days fall at the end of a year.
        let days = (secs / 86_400) as i64 + 719_468;
        let era = days.div_euclid(146_097);
        let day_of_era = days.rem_euclid(146_097);
        let year_of_era = (day_of_era - day_of_era / 1_460 + day_of_era / 36_524
            - day_of_era / 146_096)
            / 365;
        let day_of_year = day_of_era - (365 * year_of_era + year_of_era / 4 - year_of_era / 100);
        let month_index = (5 * day_of_year + 2) / 153;
        let day = (day_of_year - (153 * month_index + 2) / 5 + 1) as u32;
        let month = (if month_index < 10 {
            month_index + 3
        } else {
            month_index - 9
        }) as u32;
        let year = year_of_era + era * 400 + i64::from(month <= 2);
        Timestamp {
            year,
            month,
            day,
            seconds_of_day: secs % 86_400,
            millis,
        }
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = self.seconds_of_day;
        write!(
            f,
            "{:04}-{:02}-{:02} {:02}:{:02}:{:02}.{:03}",
            self.year,
            self.month,
            self.day,
            s / 3_600,
            s / 60 % 60,
            s % 60,
            self.millis
        )
    }
}

/// Writes one line to stderr. Use the level macros instead.
#[doc(hidden)]
pub fn log(level: Level, message: fmt::Arguments<'_>) {
    if !enabled(level) {
        return;
    }
    let mut stderr = StandardStream::stderr(ColorChoice::Auto);
    let _ = stderr.set_color(&level.color());
    if SHOW_TIMESTAMP.load(Ordering::Relaxed) {
        let _ = write!(stderr, "{} ", Timestamp::now());
    }
    if SHOW_LEVEL.load(Ordering::Relaxed) {
        let _ = write!(stderr, "[{level:5}] ");
    }
    let _ = writeln!(stderr, "{message}");
    let _ = stderr.reset();
}

#[doc(hidden)]
#[macro_export]
macro_rules! __log {
    ($level:ident, $($arg:tt)*) => {{
        if cfg!(not(test)) && $crate::utils::log::enabled($crate::utils::log::Level::$level) {
            $crate::utils::log::log($crate::utils::log::Level::$level, format_args!($($arg)*))
        }
    }};
}

#[macro_export]
macro_rules! debug {
    ($($arg:tt)*) => { $crate::__log!(Debug, $($arg)*) };
}

#[macro_export]
macro_rules! info {
    ($($arg:tt)*) => { $crate::__log!(Info, $($arg)*) };
}

#[macro_export]
macro_rules! warn {
    ($($arg:tt)*) => { $crate::__log!(Warn, $($arg)*) };
}

#[macro_export]
macro_rules! error {
    ($($arg:tt)*) => { $crate::__log!(Error, $($arg)*) };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn levels_are_ordered() {
        assert!(Level::Debug < Level::Info);
        assert!(Level::Warn < Level::Error);
    }

    #[test]
    fn level_names_parse() {
        assert_eq!("debug".parse::<Level>(), Ok(Level::Debug));
        assert_eq!(" WARN ".parse::<Level>(), Ok(Level::Warn));
        assert_eq!("warning".parse::<Level>(), Ok(Level::Warn));
        assert!("loud".parse::<Level>().is_err());
        assert_eq!(format!("[{:5}]", Level::Info), "[INFO ]");
    }

    #[test]
    fn timestamp_at_epoch() {
        assert_eq!(Timestamp::from_unix(0, 0).to_string(), "1970-01-01 00:00:00.000");
    }

    #[test]
    fn timestamp_on_leap_day() {
        // 2024-02-29 12:34:56
        let secs = 19_782 * 86_400 + 12 * 3_600 + 34 * 60 + 56;
        assert_eq!(Timestamp::from_unix(secs, 7).to_string(), "2024-02-29 12:34:56.007");
    }
}
