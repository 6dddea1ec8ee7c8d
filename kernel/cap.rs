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

use std::sync::Arc;

use status::{Error, Result};

use crate::object::{Kobject, ObjectType};
use crate::sync::Mutex;
use crate::task::Task;

/// A per-task capability handle.
///
/// Handles are dense indices into the task's capability table; `NIL` (raw
/// value 0) never resolves and is used to mean "no capability" where one is
/// optional.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct Handle(u32);

impl Handle {
    pub const NIL: Handle = Handle(0);

    #[must_use]
    pub const fn from_raw(raw: u32) -> Handle {
        Handle(raw)
    }

    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }

    #[must_use]
    pub const fn is_nil(self) -> bool {
        self.0 == 0
    }
}

enum CapSlot {
    Free,
    /// Reserved by `alloc()`, not yet associated with an object.
    Allocated,
    /// Holds one strong reference to the published object.
    Published(Arc<Kobject>),
}

/// The per-task handle-to-object registry.
///
/// Slots move `Free → Allocated → Published` and back: `alloc()` reserves a
/// slot, `publish()` associates an object with it, `unpublish()` detaches
/// the object but keeps the slot reserved (receive's temporary-handle
/// protocol depends on this), and `free()` releases the slot entirely.
pub struct CapTable {
    slots: Mutex<Vec<CapSlot>>,
}

// TODO: enforce a per-task handle quota once task resource accounting lands.

impl CapTable {
    #[must_use]
    pub fn new() -> Self {
        Self {
            slots: Mutex::new(Vec::new()),
        }
    }

    /// Reserves a handle.
    #[allow(clippy::cast_possible_truncation)]
    pub fn alloc(&self) -> Result<Handle> {
        let mut slots = self.slots.lock();
        if let Some(index) = slots.iter().position(|slot| matches!(slot, CapSlot::Free)) {
            slots[index] = CapSlot::Allocated;
            return Ok(Handle(index as u32 + 1));
        }
        slots.try_reserve(1).map_err(|_| Error::OutOfMemory)?;
        slots.push(CapSlot::Allocated);
        Ok(Handle(slots.len() as u32))
    }

    /// Releases a handle, dropping the published object's reference if any.
    pub fn free(&self, handle: Handle) -> Result<()> {
        let mut slots = self.slots.lock();
        let slot = Self::slot_mut(&mut slots, handle).ok_or(Error::NotFound)?;
        if matches!(slot, CapSlot::Free) {
            return Err(Error::NotFound);
        }
        *slot = CapSlot::Free;
        Ok(())
    }

    /// Associates `obj` with a reserved handle.
    pub fn publish(&self, handle: Handle, obj: &Arc<Kobject>) -> Result<()> {
        let mut slots = self.slots.lock();
        let slot = Self::slot_mut(&mut slots, handle).ok_or(Error::NotFound)?;
        if !matches!(slot, CapSlot::Allocated) {
            return Err(Error::NotFound);
        }
        *slot = CapSlot::Published(Arc::clone(obj));
        Ok(())
    }

    /// Detaches the object of the expected type from `handle`, keeping the
    /// slot reserved.  The table's reference is transferred to the caller.
    pub fn unpublish(&self, handle: Handle, object_type: ObjectType) -> Option<Arc<Kobject>> {
        let mut slots = self.slots.lock();
        let slot = Self::slot_mut(&mut slots, handle)?;
        match slot {
            CapSlot::Published(obj) if obj.object_type() == object_type => {
                let obj = Arc::clone(obj);
                *slot = CapSlot::Allocated;
                Some(obj)
            }
            _ => None,
        }
    }

    /// Resolves `handle` to an object of the expected type.
    pub fn get(&self, handle: Handle, object_type: ObjectType) -> Option<Arc<Kobject>> {
        self.get_any(handle)
            .filter(|obj| obj.object_type() == object_type)
    }

    /// Resolves `handle` to an object of any type.
    pub fn get_any(&self, handle: Handle) -> Option<Arc<Kobject>> {
        let mut slots = self.slots.lock();
        match Self::slot_mut(&mut slots, handle)? {
            CapSlot::Published(obj) => Some(Arc::clone(obj)),
            _ => None,
        }
    }

    fn slot_mut(slots: &mut Vec<CapSlot>, handle: Handle) -> Option<&mut CapSlot> {
        if handle.is_nil() {
            return None;
        }
        slots.get_mut(handle.0 as usize - 1)
    }
}

impl Default for CapTable {
    fn default() -> Self {
        Self::new()
    }
}

/// Allocates a handle and writes it to user address `handle_uaddr`.
pub fn cap_alloc(task: &Task, handle_uaddr: usize) -> Result<()> {
    let handle = task.caps().alloc()?;
    if let Err(e) = task.space().copy_obj_to_user(handle_uaddr, &handle.raw()) {
        let _ = task.caps().free(handle);
        return Err(e);
    }
    Ok(())
}

/// Releases `handle`.
pub fn cap_free(task: &Task, handle: Handle) -> Result<()> {
    task.caps().free(handle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::buffer::Buffer;

    fn buffer_kobj() -> Arc<Kobject> {
        Kobject::new_buffer(Buffer::alloc(4, 0).unwrap())
    }

    #[test]
    fn nil_never_resolves() {
        let table = CapTable::new();
        assert!(table.get_any(Handle::NIL).is_none());
        assert_eq!(table.free(Handle::NIL), Err(Error::NotFound));
    }

    #[test]
    fn alloc_publish_get_unpublish_free() {
        let table = CapTable::new();
        let handle = table.alloc().unwrap();

        // Reserved but unpublished: does not resolve.
        assert!(table.get_any(handle).is_none());

        let obj = buffer_kobj();
        table.publish(handle, &obj).unwrap();
        assert!(Arc::ptr_eq(&table.get_any(handle).unwrap(), &obj));
        assert!(table.get(handle, ObjectType::Buffer).is_some());
        assert!(table.get(handle, ObjectType::Endpoint).is_none());

        let detached = table.unpublish(handle, ObjectType::Buffer).unwrap();
        assert!(Arc::ptr_eq(&detached, &obj));
        // Slot stays reserved and can be republished.
        assert!(table.get_any(handle).is_none());
        table.publish(handle, &obj).unwrap();

        table.free(handle).unwrap();
        assert_eq!(table.free(handle), Err(Error::NotFound));
    }

    #[test]
    fn publish_requires_a_reserved_slot() {
        let table = CapTable::new();
        let obj = buffer_kobj();
        assert_eq!(
            table.publish(Handle::from_raw(7), &obj),
            Err(Error::NotFound)
        );

        let handle = table.alloc().unwrap();
        table.publish(handle, &obj).unwrap();
        // Double publish is rejected.
        assert_eq!(table.publish(handle, &obj), Err(Error::NotFound));
    }

    #[test]
    fn unpublish_checks_the_type() {
        let table = CapTable::new();
        let handle = table.alloc().unwrap();
        table.publish(handle, &buffer_kobj()).unwrap();

        assert!(table.unpublish(handle, ObjectType::Endpoint).is_none());
        assert!(table.unpublish(handle, ObjectType::Buffer).is_some());
        // Already unpublished.
        assert!(table.unpublish(handle, ObjectType::Buffer).is_none());
    }

    #[test]
    fn freed_slots_are_reused() {
        let table = CapTable::new();
        let first = table.alloc().unwrap();
        let second = table.alloc().unwrap();
        assert_ne!(first, second);

        table.free(first).unwrap();
        let third = table.alloc().unwrap();
        assert_eq!(first, third);
    }
}
