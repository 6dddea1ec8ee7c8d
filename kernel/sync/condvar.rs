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

use std::sync::{self, Arc, PoisonError};
use std::time::{Duration, Instant};

use status::{Error, Result};
use syscall_defs::{Timeout, TimeoutFlags};

use super::mutex::MutexGuard;
use super::wait::{Registration, WaitSet};

pub(super) struct CondvarCore {
    pub(super) cv: sync::Condvar,
}

/// A condition variable paired with a [`super::Mutex`].
///
/// [`Condvar::wait`] performs a single iteration of a timed, interruptible
/// wait; callers loop on their predicate around it and carry a [`Sleep`]
/// across iterations so that spurious wake-ups cannot extend the contracted
/// timeout.
pub struct Condvar {
    core: Arc<CondvarCore>,
}

impl Condvar {
    #[must_use]
    pub fn new() -> Self {
        Self {
            core: Arc::new(CondvarCore {
                cv: sync::Condvar::new(),
            }),
        }
    }

    /// Wakes one waiter.
    ///
    /// Queue appends signal while holding the queue's mutex so that a
    /// concurrent blocking waiter cannot miss the wake.
    pub fn signal(&self) {
        self.core.cv.notify_one();
    }

    /// Blocks until signalled, the sleep's deadline passes, or the sleep is
    /// interrupted.
    ///
    /// Returns the re-acquired guard together with `Ok(())` on a wake-up
    /// (possibly spurious; the caller re-checks its predicate), or
    /// `WouldBlock` / `TimedOut` / `Interrupted` per the sleep's mode.
    pub fn wait<'lock, T>(
        &self,
        guard: MutexGuard<'lock, T>,
        sleep: &mut Sleep<'_>,
    ) -> (MutexGuard<'lock, T>, Result<()>) {
        if sleep.non_blocking {
            return (guard, Err(Error::WouldBlock));
        }

        if let Some(wait_set) = sleep.wait_set {
            if sleep.registration.is_none() {
                sleep.registration = Some(wait_set.register(Arc::clone(&self.core)));
            }
        }
        if sleep.interrupted() {
            return (guard, Err(Error::Interrupted));
        }

        let inner = guard.0;
        let (inner, result) = match sleep.deadline {
            None => (
                self.core
                    .cv
                    .wait(inner)
                    .unwrap_or_else(PoisonError::into_inner),
                Ok(()),
            ),
            Some(deadline) => {
                let now = Instant::now();
                if now >= deadline {
                    return (MutexGuard(inner), Err(Error::TimedOut));
                }
                // A wait that runs out is reported as an ordinary wake-up;
                // only the deadline check above decides expiry, so spurious
                // wake-ups and early returns both deduct elapsed time.
                let (inner, _) = self
                    .core
                    .cv
                    .wait_timeout(inner, deadline - now)
                    .unwrap_or_else(PoisonError::into_inner);
                (inner, Ok(()))
            }
        };

        let guard = MutexGuard(inner);
        if sleep.interrupted() {
            return (guard, Err(Error::Interrupted));
        }
        (guard, result)
    }
}

impl Default for Condvar {
    fn default() -> Self {
        Self::new()
    }
}

/// Bookkeeping of one blocking operation.
///
/// The deadline is computed once when the sleep begins; every subsequent
/// wait iteration recomputes the remaining time, so a sequence of spurious
/// wake-ups still honours the contracted timeout.
pub struct Sleep<'task> {
    deadline: Option<Instant>,
    non_blocking: bool,
    wait_set: Option<&'task WaitSet>,
    registration: Option<Registration>,
}

impl<'task> Sleep<'task> {
    #[must_use]
    pub fn new(timeout: Timeout, wait_set: &'task WaitSet) -> Self {
        let flags = timeout.flags();
        let deadline = match timeout.usec() {
            0 => None,
            usec => Some(Instant::now() + Duration::from_micros(u64::from(usec))),
        };
        Self {
            deadline,
            non_blocking: flags.contains(TimeoutFlags::NON_BLOCKING),
            wait_set: flags
                .contains(TimeoutFlags::INTERRUPTIBLE)
                .then_some(wait_set),
            registration: None,
        }
    }

    fn interrupted(&self) -> bool {
        self.registration
            .as_ref()
            .is_some_and(Registration::interrupted)
    }
}
