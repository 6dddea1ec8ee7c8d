// Copyright 2026 The Sedge Authors
//
// Licensed under the Apache License, Version 2.0 (the "License"); you may not
// use this file except in compliance with the License. You may obtain a copy of
// the License at
//
//     https://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS, WITHOUT
// WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied. See the
// License for the specific language governing permissions and limitations under
// the License.

//! # status
//!
//! Error codes produced by the IPC fabric.  In order to keep the interface
//! idiomatic for Rust, the "no error" code is omitted from the [`Error`] enum
//! and a [`StatusCode`] trait is provided to turn a `Result` into a canonical
//! numeric status code for the syscall boundary.
//!
//! # Example
//!
//! ```
//! use status::{Error, Result};
//!
//! fn div(numerator: u32, denominator: u32) -> Result<u32> {
//!     if denominator == 0 {
//!         Err(Error::BadArgument)
//!     } else {
//!         Ok(numerator / denominator)
//!     }
//! }
//!
//! assert_eq!(div(4, 2), Ok(2));
//! assert_eq!(div(4, 0), Err(Error::BadArgument));
//! ```

#![no_std]

/// Status code for no error.
pub const OK: u32 = 0;

/// Error type shared by every layer of the IPC fabric.
///
/// The discriminants are the numeric codes returned across the syscall
/// boundary; they are stable ABI.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[repr(u32)]
pub enum Error {
    /// Handle does not resolve, the resolved object has the wrong type, or a
    /// set element is not a member.
    NotFound = 1,
    /// Object state forbids the operation (already queued, already finished,
    /// already a caplist member).
    Busy = 2,
    /// Semantic mismatch, e.g. a caplist tag wrong for the operation.
    BadArgument = 3,
    /// Payload exceeds the buffer's capacity.
    LimitExceeded = 4,
    /// Allocation failed.
    OutOfMemory = 5,
    /// A blocking wait ran out of time.
    TimedOut = 6,
    /// A blocking wait was interrupted.
    Interrupted = 7,
    /// A non-blocking wait found nothing to consume.
    WouldBlock = 8,
    /// User-space memory could not be read.
    FaultCopyIn = 9,
    /// User-space memory could not be written.
    FaultCopyOut = 10,
}

impl Error {
    /// Maps a raw status code back to an [`Error`].
    ///
    /// Returns `None` for [`OK`] and for codes outside the defined range.
    #[must_use]
    pub const fn from_code(code: u32) -> Option<Error> {
        Some(match code {
            1 => Error::NotFound,
            2 => Error::Busy,
            3 => Error::BadArgument,
            4 => Error::LimitExceeded,
            5 => Error::OutOfMemory,
            6 => Error::TimedOut,
            7 => Error::Interrupted,
            8 => Error::WouldBlock,
            9 => Error::FaultCopyIn,
            10 => Error::FaultCopyOut,
            _ => return None,
        })
    }
}

pub type Result<T> = core::result::Result<T, Error>;

/// Convert a Result into a numeric status code.
pub trait StatusCode {
    /// Return the canonical status code ([`OK`] for success).
    fn status_code(self) -> u32;
}

impl<T> StatusCode for Result<T> {
    fn status_code(self) -> u32 {
        match self {
            Ok(_) => OK,
            Err(e) => e as u32,
        }
    }
}
