// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Tracing subscriber setup. On Android each formatted event becomes one
// logcat line under the configured tag; elsewhere events go to stderr.

use mapview_core::BridgeConfig;
use tracing_subscriber::EnvFilter;

/// Install the global subscriber. Returns `false` if one was already set,
/// which is expected when the library is loaded a second time.
pub fn init(config: &BridgeConfig) -> bool {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter(config))
        .with_target(true);

    #[cfg(target_os = "android")]
    let installed = builder
        .with_ansi(false)
        .without_time()
        .with_writer(logcat::Logcat::new(&config.log_tag))
        .try_init();

    #[cfg(not(target_os = "android"))]
    let installed = builder.with_writer(std::io::stderr).try_init();

    installed.is_ok()
}

/// `RUST_LOG` wins over the configured directive; an unparsable directive
/// falls back to `info`.
pub fn filter(config: &BridgeConfig) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_filter))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

#[cfg(target_os = "android")]
mod logcat {
    use std::ffi::{CString, c_char, c_int};
    use std::io;

    use tracing::{Level, Metadata};
    use tracing_subscriber::fmt::MakeWriter;

    const ANDROID_LOG_VERBOSE: c_int = 2;
    const ANDROID_LOG_DEBUG: c_int = 3;
    const ANDROID_LOG_INFO: c_int = 4;
    const ANDROID_LOG_WARN: c_int = 5;
    const ANDROID_LOG_ERROR: c_int = 6;

    #[link(name = "log")]
    unsafe extern "C" {
        fn __android_log_write(prio: c_int, tag: *const c_char, text: *const c_char) -> c_int;
    }

    pub struct Logcat {
        tag: CString,
    }

    impl Logcat {
        pub fn new(tag: &str) -> Self {
            Self {
                tag: CString::new(tag.replace('\0', "")).unwrap_or_default(),
            }
        }
    }

    /// Buffers one event and writes it when dropped.
    pub struct Line<'a> {
        tag: &'a CString,
        priority: c_int,
        buffer: Vec<u8>,
    }

    impl io::Write for Line<'_> {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.buffer.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl Drop for Line<'_> {
        fn drop(&mut self) {
            while self.buffer.last() == Some(&b'\n') {
                self.buffer.pop();
            }
            self.buffer.retain(|b| *b != 0);
            if let Ok(text) = CString::new(std::mem::take(&mut self.buffer)) {
                // SAFETY: tag and text are NUL-terminated and outlive the call.
                unsafe {
                    __android_log_write(self.priority, self.tag.as_ptr(), text.as_ptr());
                }
            }
        }
    }

    impl<'a> MakeWriter<'a> for Logcat {
        type Writer = Line<'a>;

        fn make_writer(&'a self) -> Self::Writer {
            Line {
                tag: &self.tag,
                priority: ANDROID_LOG_INFO,
                buffer: Vec::new(),
            }
        }

        fn make_writer_for(&'a self, meta: &Metadata<'_>) -> Self::Writer {
            let priority = match *meta.level() {
                Level::TRACE => ANDROID_LOG_VERBOSE,
                Level::DEBUG => ANDROID_LOG_DEBUG,
                Level::INFO => ANDROID_LOG_INFO,
                Level::WARN => ANDROID_LOG_WARN,
                _ => ANDROID_LOG_ERROR,
            };
            Line {
                tag: &self.tag,
                priority,
                buffer: Vec::new(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_init_is_harmless() {
        let config = BridgeConfig::default();
        init(&config);
        assert!(!init(&config));
    }

    #[test]
    fn bad_directive_falls_back() {
        let config = BridgeConfig {
            log_filter: "mapview=shouting".into(),
            ..BridgeConfig::default()
        };
        // Must not panic whatever RUST_LOG holds.
        let _ = filter(&config);
    }
}
