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

use std::collections::VecDeque;
use std::sync::Arc;

use crate::object::Kobject;
use crate::sync::{Condvar, Mutex, MutexGuard};

/// An IPC endpoint: a many-to-one FIFO of pending buffers.
///
/// The queue holds one strong reference per linked buffer; the condition
/// variable is signalled on every append.
pub struct Endpoint {
    label: usize,
    queue: Mutex<VecDeque<Arc<Kobject>>>,
    cv: Condvar,
}

impl Endpoint {
    #[must_use]
    pub fn new(label: usize) -> Endpoint {
        Self {
            label,
            queue: Mutex::new(VecDeque::new()),
            cv: Condvar::new(),
        }
    }

    #[must_use]
    pub fn label(&self) -> usize {
        self.label
    }

    pub(crate) fn lock(&self) -> MutexGuard<'_, VecDeque<Arc<Kobject>>> {
        self.queue.lock()
    }

    pub(crate) fn cv(&self) -> &Condvar {
        &self.cv
    }
}
