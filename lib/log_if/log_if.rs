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

//! Logging macros that are compiled out unless a `const` condition holds.
//!
//! Subsystems keep a `const <NAME>_DEBUG: bool` next to their code and guard
//! chatty trace lines with it, so release builds pay nothing and turning the
//! traces on is a one-character diff.  Messages are forwarded to the [`log`]
//! facade.

#![no_std]

// Re-export dependencies of the macros to be accessed via `$crate::__private`.
#[doc(hidden)]
pub mod __private {
    pub use log;
}

/// Emit a debug level log message if `condition` is true.
///
/// ```
/// use log_if::debug_if;
///
/// const QUEUE_DEBUG: bool = false;
/// debug_if!(QUEUE_DEBUG, "queue depth {}", 3);
/// ```
#[macro_export]
macro_rules! debug_if {
  ($condition:expr, $($args:expr),* $(,)?) => {{
    if $condition {
      $crate::__private::log::debug!($($args),*);
    }
  }};
}

/// Emit an info level log message if `condition` is true.
#[macro_export]
macro_rules! info_if {
  ($condition:expr, $($args:expr),* $(,)?) => {{
    if $condition {
      $crate::__private::log::info!($($args),*);
    }
  }};
}

/// Emit a warn level log message if `condition` is true.
#[macro_export]
macro_rules! warn_if {
  ($condition:expr, $($args:expr),* $(,)?) => {{
    if $condition {
      $crate::__private::log::warn!($($args),*);
    }
  }};
}

/// Emit an error level log message if `condition` is true.
#[macro_export]
macro_rules! error_if {
  ($condition:expr, $($args:expr),* $(,)?) => {{
    if $condition {
      $crate::__private::log::error!($($args),*);
    }
  }};
}
