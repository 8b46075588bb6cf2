// Copyright 2014 Nick Fitzgerald
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Error types for everything that isn't a Scheme-level `Value::Error`:
//! malformed input text and driver-level I/O failures. These never reach
//! a running program as a value; they stop the reader or the CLI outright.

use thiserror::Error;

/// A failure while tokenizing or parsing source text into `Value`s.
#[derive(Debug, Error)]
pub enum ReadError {
    #[error("unexpected end of input")]
    UnexpectedEof,

    #[error("unexpected closing paren")]
    UnexpectedCloseParen,

    #[error("unterminated string literal")]
    UnterminatedString,

    #[error("malformed number literal: {0:?}")]
    MalformedNumber(String),

    #[error("malformed dotted pair")]
    MalformedDottedPair,

    #[error("token exceeds maximum length ({max} bytes)")]
    TokenTooLong { max: usize },

    #[error("list literal exceeds maximum length ({max} elements)")]
    ListTooLong { max: usize },
}

/// Top-level driver failures: reading a source file, or the REPL's line
/// editor reporting something other than ordinary EOF/interrupt.
#[derive(Debug, Error)]
pub enum DriverError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Read(#[from] ReadError),

    #[error("line editor error: {0}")]
    Readline(#[from] rustyline::error::ReadlineError),
}
