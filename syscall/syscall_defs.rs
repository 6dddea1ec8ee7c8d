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

//! # IPC fabric user space API
//!
//! ## Core Concepts
//!
//! ### Objects
//! Three kernel object types are exposed to user space:
//!
//! - [Buffer](#buffer)
//! - [Endpoint](#endpoint)
//! - [Capability list](#capability-list)
//!
//! ### Handles
//! All system calls reference objects through a `u32` handle which indexes
//! into a task-local capability table.  Handle `0` is the nil sentinel and is
//! used to mean "no capability list" where one is optional.
//!
//! ## Object Types
//!
//! ### Buffer
//! A buffer is a fixed-size byte carrier and the unit of IPC payload.  It
//! moves through the states `READY → PENDING → FINISHED → READY`: a send
//! copies the payload in and queues the buffer on an endpoint, a receive
//! hands it to the endpoint's owner under a fresh temporary handle, a finish
//! writes the reply into the same storage, and a wait returns the reply to
//! the original sender and recycles the buffer.
//!
//! ### Endpoint
//! An endpoint is a many-to-one FIFO of pending buffers, addressed by
//! capability and owned by a receiver.  Each endpoint carries an opaque
//! user-defined label which is imprinted on every buffer it receives, so the
//! receiver learns which endpoint delivered a buffer.
//!
//! ### Capability list
//! A capability list ("caplist") is a homogeneous set of kernel objects that
//! doubles as a blocking multiplexer.  An endpoint caplist steers sends to
//! all member endpoints into a single ready-queue, so one receiver serves the
//! whole group; a buffer caplist collects finished member buffers, so one
//! waiter can wait for any outstanding reply.
//!
//! ## System Calls
//!
//! ### Registry
//! - `cap_alloc`, `cap_free`
//!
//! ### Capability list
//! - `caplist_create`, `caplist_destroy`, `caplist_add`, `caplist_del`
//!
//! ### Endpoint
//! - `ep_create`, `ep_destroy`
//!
//! ### Buffer
//! - `buf_alloc`, `buf_free`, `buf_send`, `buf_receive`, `buf_finish`,
//!   `buf_wait`
//!
//! All entries take and return word-sized arguments.  Out parameters (handles
//! and info structures) are written through validated user pointers, and only
//! on success unless stated otherwise.

#![no_std]

use bitflags::bitflags;
use status::{Error, Result};
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

/// Raw return value of a system call.
///
/// Non-negative values carry the call's result; negative values carry the
/// negated [`Error`] code.
pub struct SysCallReturnValue(pub i64);

impl SysCallReturnValue {
    pub fn to_result_unit(self) -> Result<()> {
        self.to_result_u64().map(|_| ())
    }

    pub fn to_result_u64(self) -> Result<u64> {
        let value = self.0;
        if value < 0 {
            #[allow(clippy::cast_possible_truncation)]
            let code = value.unsigned_abs() as u32;
            Err(Error::from_code(code).unwrap_or(Error::BadArgument))
        } else {
            Ok(value.cast_unsigned())
        }
    }
}

impl From<Result<u64>> for SysCallReturnValue {
    fn from(value: Result<u64>) -> Self {
        match value {
            Ok(val) => Self(val.cast_signed()),
            Err(error) => Self(-(error as i64)),
        }
    }
}

#[repr(u16)]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SysCallId {
    CapAlloc = 0x0001,
    CapFree = 0x0002,
    CaplistCreate = 0x0003,
    CaplistDestroy = 0x0004,
    CaplistAdd = 0x0005,
    CaplistDel = 0x0006,
    EpCreate = 0x0007,
    EpDestroy = 0x0008,
    BufAlloc = 0x0009,
    BufFree = 0x000a,
    BufSend = 0x000b,
    BufReceive = 0x000c,
    BufFinish = 0x000d,
    BufWait = 0x000e,
}

impl TryFrom<u16> for SysCallId {
    type Error = Error;

    fn try_from(value: u16) -> core::result::Result<Self, Error> {
        match value {
            // Safety: values in this range map 1:1 onto enum discriminants.
            0x0001..=0x000e => Ok(unsafe { core::mem::transmute::<u16, SysCallId>(value) }),
            _ => Err(Error::BadArgument),
        }
    }
}

bitflags! {
    /// Flags of a packed [`Timeout`].
    #[derive(Clone, Copy, Debug, Eq, PartialEq)]
    pub struct TimeoutFlags: u32 {
        /// Do not block; an empty queue fails with `WouldBlock`.
        const NON_BLOCKING = 1 << 0;
        /// The wait may be interrupted when the task is interrupted.
        const INTERRUPTIBLE = 1 << 1;
    }
}

/// Synchronization timeout packed into a single 64-bit word.
///
/// The upper 32 bits carry the timeout in microseconds, the lower 32 bits
/// carry [`TimeoutFlags`].  A zero microsecond value without `NON_BLOCKING`
/// means "block forever".
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Timeout(u64);

impl Timeout {
    /// Block forever, uninterruptible.
    pub const BLOCKING: Timeout = Timeout(0);

    #[must_use]
    pub const fn new(usec: u32, flags: TimeoutFlags) -> Self {
        Self(((usec as u64) << 32) | flags.bits() as u64)
    }

    #[must_use]
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }

    #[must_use]
    pub const fn usec(self) -> u32 {
        (self.0 >> 32) as u32
    }

    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub const fn flags(self) -> TimeoutFlags {
        TimeoutFlags::from_bits_truncate(self.0 as u32)
    }

    /// Returns the same timeout with [`TimeoutFlags::INTERRUPTIBLE`] set.
    #[must_use]
    pub const fn interruptible(self) -> Self {
        Self(self.0 | TimeoutFlags::INTERRUPTIBLE.bits() as u64)
    }
}

/// Info structure written to user space after a successful `buf_receive`.
#[repr(C)]
#[derive(Clone, Copy, Debug, Eq, PartialEq, FromBytes, IntoBytes, KnownLayout, Immutable)]
pub struct BufReceiveInfo {
    /// Label of the endpoint which received the buffer.
    pub ep_label: usize,
    /// How much data is in the buffer.
    pub used: usize,
    /// Total size of the buffer.
    pub size: usize,
}

/// Info structure written to user space after a successful `buf_wait`.
#[repr(C)]
#[derive(Clone, Copy, Debug, Eq, PartialEq, FromBytes, IntoBytes, KnownLayout, Immutable)]
pub struct BufWaitInfo {
    /// Label of the buffer which was successfully waited for.
    pub buf_label: usize,
    /// How much data is in the buffer.
    pub used: usize,
    /// Total size of the buffer.
    pub size: usize,
    /// Terminal result of the round-trip (`status::OK` or an error code).
    pub result: u32,
    pub _reserved: u32,
}
