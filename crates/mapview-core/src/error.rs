// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for the map engine and its configuration.

use thiserror::Error;

/// Top-level error type for engine and configuration operations.
///
/// The `Display` output of [`MapviewError::Engine`] is the bare engine
/// message; the JNI boundary adds its own prefix when it re-raises it.
#[derive(Debug, Error)]
pub enum MapviewError {
    // -- Engine --
    #[error("{0}")]
    Engine(String),

    #[error("invalid style: {0}")]
    Style(String),

    // -- Configuration --
    #[error("configuration error: {0}")]
    Config(String),

    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, MapviewError>;
