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

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;

use super::condvar::CondvarCore;

/// Registry of a task's interruptible sleepers.
///
/// Every interruptible wait registers its condition variable here before
/// blocking.  [`WaitSet::interrupt`] marks and wakes all registered sleepers
/// and the mark is sticky: once a task has been interrupted, every later
/// interruptible wait fails immediately.
pub struct WaitSet {
    inner: Arc<Mutex<WaitSetInner>>,
}

struct WaitSetInner {
    interrupted: bool,
    next_id: u64,
    sleepers: Vec<Sleeper>,
}

struct Sleeper {
    id: u64,
    flag: Arc<AtomicBool>,
    cv: Arc<CondvarCore>,
}

impl WaitSet {
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(WaitSetInner {
                interrupted: false,
                next_id: 0,
                sleepers: Vec::new(),
            })),
        }
    }

    pub(super) fn register(&self, cv: Arc<CondvarCore>) -> Registration {
        let mut inner = lock(&self.inner);
        let flag = Arc::new(AtomicBool::new(inner.interrupted));
        let id = inner.next_id;
        inner.next_id += 1;
        inner.sleepers.push(Sleeper {
            id,
            flag: Arc::clone(&flag),
            cv,
        });
        Registration {
            set: Arc::clone(&self.inner),
            id,
            flag,
        }
    }

    /// Interrupts every registered sleeper and marks the set interrupted.
    ///
    /// A sleeper can be between its interrupt check and the condvar sleep and
    /// miss a single notification; renotify until every sleeper has observed
    /// its flag and deregistered.
    pub fn interrupt(&self) {
        let mut inner = lock(&self.inner);
        inner.interrupted = true;
        loop {
            for sleeper in &inner.sleepers {
                sleeper.flag.store(true, Ordering::SeqCst);
                sleeper.cv.cv.notify_all();
            }
            if inner.sleepers.is_empty() {
                break;
            }
            drop(inner);
            thread::yield_now();
            inner = lock(&self.inner);
        }
    }
}

impl Default for WaitSet {
    fn default() -> Self {
        Self::new()
    }
}

/// Membership of one sleeper in a [`WaitSet`]; deregisters on drop.
pub(super) struct Registration {
    set: Arc<Mutex<WaitSetInner>>,
    id: u64,
    flag: Arc<AtomicBool>,
}

impl Registration {
    pub(super) fn interrupted(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

impl Drop for Registration {
    fn drop(&mut self) {
        let mut inner = lock(&self.set);
        inner.sleepers.retain(|sleeper| sleeper.id != self.id);
    }
}

fn lock(mutex: &Mutex<WaitSetInner>) -> std::sync::MutexGuard<'_, WaitSetInner> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
