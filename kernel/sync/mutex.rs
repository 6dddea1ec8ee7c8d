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

use core::ops::{Deref, DerefMut};
use std::sync::{self, PoisonError};

/// A sleeping mutual exclusion lock.
///
/// Lock poisoning is not propagated: a panicking holder is a kernel bug and
/// the remaining state is handed to the next holder as-is.
pub struct Mutex<T> {
    inner: sync::Mutex<T>,
}

pub struct MutexGuard<'lock, T>(pub(super) sync::MutexGuard<'lock, T>);

impl<T> Mutex<T> {
    #[must_use]
    pub const fn new(initial_value: T) -> Self {
        Self {
            inner: sync::Mutex::new(initial_value),
        }
    }

    pub fn lock(&self) -> MutexGuard<'_, T> {
        MutexGuard(self.inner.lock().unwrap_or_else(PoisonError::into_inner))
    }
}

impl<T> Deref for MutexGuard<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.0
    }
}

impl<T> DerefMut for MutexGuard<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.0
    }
}
