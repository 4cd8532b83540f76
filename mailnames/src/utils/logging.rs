//
// mailnames
//
// Copyright 2019 Manos Pitsidianakis
//
// This file is part of mailnames.
//
// mailnames is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// mailnames is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with mailnames. If not, see <http://www.gnu.org/licenses/>.
//
// SPDX-License-Identifier: EUPL-1.2 OR GPL-3.0-or-later

//! A [`log::Log`] implementation for binaries that use this crate.
//!
//! The library itself only ever uses the [`log`] macros.

use std::{
    fs::{File, OpenOptions},
    io::{BufWriter, Write},
    path::{Path, PathBuf},
    sync::{
        atomic::{AtomicU8, Ordering},
        Arc, Mutex,
    },
};

use log::{Level, LevelFilter, Log, Metadata, Record};

use crate::error::{Result, ResultIntoError};

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, Hash, PartialEq, PartialOrd, Serialize)]
#[repr(u8)]
pub enum LogLevel {
    OFF = 0,
    ERROR,
    WARN,
    #[default]
    INFO,
    DEBUG,
    TRACE,
}

impl From<u8> for LogLevel {
    fn from(verbosity: u8) -> Self {
        match verbosity {
            0 => Self::OFF,
            1 => Self::ERROR,
            2 => Self::WARN,
            3 => Self::INFO,
            4 => Self::DEBUG,
            _ => Self::TRACE,
        }
    }
}

impl From<Level> for LogLevel {
    fn from(l: Level) -> Self {
        match l {
            Level::Error => Self::ERROR,
            Level::Warn => Self::WARN,
            Level::Info => Self::INFO,
            Level::Debug => Self::DEBUG,
            Level::Trace => Self::TRACE,
        }
    }
}

impl From<LogLevel> for Level {
    fn from(l: LogLevel) -> Self {
        match l {
            LogLevel::ERROR => Self::Error,
            LogLevel::WARN => Self::Warn,
            LogLevel::OFF | LogLevel::INFO => Self::Info,
            LogLevel::DEBUG => Self::Debug,
            LogLevel::TRACE => Self::Trace,
        }
    }
}

impl From<LevelFilter> for LogLevel {
    fn from(l: LevelFilter) -> Self {
        match l {
            LevelFilter::Off => Self::OFF,
            LevelFilter::Error => Self::ERROR,
            LevelFilter::Warn => Self::WARN,
            LevelFilter::Info => Self::INFO,
            LevelFilter::Debug => Self::DEBUG,
            LevelFilter::Trace => Self::TRACE,
        }
    }
}

impl From<LogLevel> for LevelFilter {
    fn from(l: LogLevel) -> Self {
        match l {
            LogLevel::OFF => Self::Off,
            LogLevel::ERROR => Self::Error,
            LogLevel::WARN => Self::Warn,
            LogLevel::INFO => Self::Info,
            LogLevel::DEBUG => Self::Debug,
            LogLevel::TRACE => Self::Trace,
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                OFF => "OFF",
                ERROR => "ERROR",
                WARN => "WARN",
                INFO => "INFO",
                DEBUG => "DEBUG",
                TRACE => "TRACE",
            }
        )
    }
}

use LogLevel::*;

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub enum Destination {
    File,
    #[default]
    Stderr,
    None,
}

struct FileOutput {
    writer: BufWriter<File>,
    path: PathBuf,
}

#[derive(Clone)]
pub struct StderrLogger {
    file: Arc<Mutex<Option<FileOutput>>>,
    level: Arc<AtomicU8>,
    print_level: bool,
    print_module_names: bool,
    dest: Destination,
}

impl std::fmt::Debug for StderrLogger {
    fn fmt(&self, fmt: &mut std::fmt::Formatter) -> std::fmt::Result {
        fmt.debug_struct(stringify!(StderrLogger))
            .field("level", &self.log_level())
            .field("print_level", &self.print_level)
            .field("print_module_names", &self.print_module_names)
            .field("dest", &self.dest)
            .finish()
    }
}

impl Default for StderrLogger {
    fn default() -> Self {
        Self::new(LogLevel::default())
    }
}

impl StderrLogger {
    /// Create a logger and install it as the global [`log`] logger, unless
    /// one is already installed.
    pub fn new(level: LogLevel) -> Self {
        use std::sync::Once;

        static INIT_STDERR_LOGGING: Once = Once::new();

        let logger = Self::unregistered(level);

        #[cfg(feature = "debug-tracing")]
        log::set_max_level(
            if matches!(LevelFilter::from(logger.log_level()), LevelFilter::Off) {
                LevelFilter::Off
            } else {
                LevelFilter::Trace
            },
        );
        #[cfg(not(feature = "debug-tracing"))]
        log::set_max_level(LevelFilter::from(logger.log_level()));

        INIT_STDERR_LOGGING.call_once(|| {
            if let Err(err) = log::set_boxed_logger(Box::new(logger.clone())) {
                eprintln!("Could not install logger: {}", err);
            }
        });
        logger
    }

    /// Create a logger without installing it.
    pub fn unregistered(level: LogLevel) -> Self {
        Self {
            file: Arc::new(Mutex::new(None)),
            level: Arc::new(AtomicU8::new(level as u8)),
            print_level: true,
            print_module_names: true,
            dest: Destination::Stderr,
        }
    }

    pub fn log_level(&self) -> LogLevel {
        self.level.load(Ordering::SeqCst).into()
    }

    pub fn change_log_level(&self, new_val: LogLevel) {
        self.level.store(new_val as u8, Ordering::SeqCst);
    }

    /// Write log lines to the file at `path` instead of stderr.
    pub fn change_log_dest(&mut self, path: &Path) -> Result<()> {
        let file = OpenOptions::new()
            .append(true)
            .create(true)
            .open(path)
            .chain_err_summary(|| format!("Could not open log file {}", path.display()))?;
        if let Ok(mut dest) = self.file.lock() {
            *dest = Some(FileOutput {
                writer: BufWriter::new(file),
                path: path.to_path_buf(),
            });
        }
        self.dest = Destination::File;
        Ok(())
    }

    pub fn log_dest(&self) -> Option<PathBuf> {
        self.file
            .lock()
            .ok()
            .and_then(|d| d.as_ref().map(|f| f.path.clone()))
    }
}

impl Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        !matches!(self.dest, Destination::None)
            && metadata.level() <= LevelFilter::from(self.log_level())
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        fn write(
            writer: &mut impl Write,
            record: &Record,
            (print_level, print_module_names): (bool, bool),
        ) -> Option<()> {
            writer.write_all(b"[").ok()?;
            if print_level {
                writer
                    .write_all(record.level().to_string().as_bytes())
                    .ok()?;
            }
            write!(writer, "]: ").ok()?;
            if print_module_names {
                write!(writer, "{}: ", record.metadata().target()).ok()?;
            }
            write!(writer, "{}", record.args()).ok()?;
            writer.write_all(b"\n").ok()?;
            writer.flush().ok()?;
            Some(())
        }

        let flags = (self.print_level, self.print_module_names);
        match self.dest {
            Destination::None => {}
            Destination::File => {
                _ = self.file.lock().ok().and_then(|mut d| {
                    d.as_mut()
                        .and_then(|out| write(&mut out.writer, record, flags))
                });
            }
            Destination::Stderr => {
                _ = write(&mut std::io::stderr(), record, flags);
            }
        }
    }

    fn flush(&self) {
        self.file
            .lock()
            .ok()
            .and_then(|mut w| w.as_mut().and_then(|out| out.writer.flush().ok()));
    }
}
