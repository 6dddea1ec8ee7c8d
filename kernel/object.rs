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

use std::sync::{Arc, Weak};

use crate::object::buffer::Buffer;
use crate::object::caplist::Caplist;
use crate::object::endpoint::Endpoint;
use crate::sync::{Mutex, MutexGuard};

pub mod buffer;
pub mod caplist;
pub mod endpoint;

/// Runtime type tag of a kernel object.
///
/// The discriminants are ABI: `caplist_create` takes one as a raw word.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[repr(u32)]
pub enum ObjectType {
    Buffer = 1,
    Endpoint = 2,
    Caplist = 3,
}

impl ObjectType {
    #[must_use]
    pub const fn from_raw(raw: u32) -> Option<ObjectType> {
        Some(match raw {
            1 => ObjectType::Buffer,
            2 => ObjectType::Endpoint,
            3 => ObjectType::Caplist,
            _ => return None,
        })
    }
}

/// A reference-counted kernel object: a shared header plus a typed payload.
///
/// The header lock only guards caplist membership; the payload carries its
/// own lock.  Strong references are held by capability-table slots and by
/// queue linkages; back-references between objects are weak.
pub struct Kobject {
    header: Mutex<KobjectHeader>,
    payload: Payload,
}

pub struct KobjectHeader {
    /// Back-pointer to the caplist this object is a member of, if any.
    pub(crate) in_caplist: Option<Weak<Kobject>>,
}

impl KobjectHeader {
    /// The live caplist this object is a member of, if any.
    ///
    /// A membership whose caplist has already been destroyed reads as
    /// `None` here while [`Self::in_caplist`] stays set; insertion checks
    /// treat such a stale membership as absent.
    #[must_use]
    pub fn member_of(&self) -> Option<Arc<Kobject>> {
        self.in_caplist.as_ref().and_then(Weak::upgrade)
    }
}

pub enum Payload {
    Buffer(Buffer),
    Endpoint(Endpoint),
    Caplist(Caplist),
}

impl Kobject {
    fn new(payload: Payload) -> Arc<Kobject> {
        Arc::new(Self {
            header: Mutex::new(KobjectHeader { in_caplist: None }),
            payload,
        })
    }

    #[must_use]
    pub fn new_buffer(buffer: Buffer) -> Arc<Kobject> {
        Self::new(Payload::Buffer(buffer))
    }

    #[must_use]
    pub fn new_endpoint(endpoint: Endpoint) -> Arc<Kobject> {
        Self::new(Payload::Endpoint(endpoint))
    }

    #[must_use]
    pub fn new_caplist(caplist: Caplist) -> Arc<Kobject> {
        Self::new(Payload::Caplist(caplist))
    }

    #[must_use]
    pub fn object_type(&self) -> ObjectType {
        match &self.payload {
            Payload::Buffer(_) => ObjectType::Buffer,
            Payload::Endpoint(_) => ObjectType::Endpoint,
            Payload::Caplist(_) => ObjectType::Caplist,
        }
    }

    #[must_use]
    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    #[must_use]
    pub fn buffer(&self) -> Option<&Buffer> {
        match &self.payload {
            Payload::Buffer(buffer) => Some(buffer),
            _ => None,
        }
    }

    #[must_use]
    pub fn endpoint(&self) -> Option<&Endpoint> {
        match &self.payload {
            Payload::Endpoint(endpoint) => Some(endpoint),
            _ => None,
        }
    }

    #[must_use]
    pub fn caplist(&self) -> Option<&Caplist> {
        match &self.payload {
            Payload::Caplist(caplist) => Some(caplist),
            _ => None,
        }
    }

    pub fn lock_header(&self) -> MutexGuard<'_, KobjectHeader> {
        self.header.lock()
    }
}
