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

use core::mem::size_of;
use core::ptr::NonNull;

use status::{Error, Result};
use zerocopy::{FromBytes, Immutable, IntoBytes};

use crate::sync::Mutex;

// An emulated per-task user address space backing the copy-in/copy-out
// helpers.
//
// INVARIANTS:
// * All access to a region's memory goes through the copy helpers; the
//   backing allocation is never exposed as a reference.
// * Every copy validates its range against the region table; a copy touching
//   unmapped memory fails with a fault code and never crashes the kernel.
// * Regions live for the lifetime of the address space; addresses handed out
//   by `map_anonymous()` stay valid until the owning task goes away.
pub struct AddressSpace {
    regions: Mutex<Vec<Region>>,
}

struct Region {
    ptr: NonNull<u8>,
    len: usize,
}

// Safety: a `Region` exclusively owns the allocation behind `ptr`.
unsafe impl Send for Region {}
unsafe impl Sync for Region {}

impl Drop for Region {
    fn drop(&mut self) {
        // Reconstitute the Box leaked in `map_anonymous()`.
        unsafe {
            drop(Box::from_raw(core::ptr::slice_from_raw_parts_mut(
                self.ptr.as_ptr(),
                self.len,
            )));
        }
    }
}

impl AddressSpace {
    #[must_use]
    pub fn new() -> Self {
        Self {
            regions: Mutex::new(Vec::new()),
        }
    }

    /// Maps a zero-filled region of `len` bytes and returns its base address.
    pub fn map_anonymous(&self, len: usize) -> Result<usize> {
        let mut backing: Vec<u8> = Vec::new();
        backing
            .try_reserve_exact(len)
            .map_err(|_| Error::OutOfMemory)?;
        backing.resize(len, 0);

        let raw = Box::into_raw(backing.into_boxed_slice());
        let Some(ptr) = NonNull::new(raw.cast::<u8>()) else {
            return Err(Error::OutOfMemory);
        };
        let base = ptr.as_ptr() as usize;
        self.regions.lock().push(Region { ptr, len });
        Ok(base)
    }

    fn lookup(&self, addr: usize, len: usize) -> Option<*mut u8> {
        let regions = self.regions.lock();
        for region in regions.iter() {
            let base = region.ptr.as_ptr() as usize;
            if addr >= base && len <= region.len && addr - base <= region.len - len {
                // Safety: the offset stays inside the region's allocation.
                return Some(unsafe { region.ptr.as_ptr().add(addr - base) });
            }
        }
        None
    }

    /// Copies `dst.len()` bytes from user address `src` into `dst`.
    pub fn copy_from_user(&self, dst: &mut [u8], src: usize) -> Result<()> {
        if dst.is_empty() {
            return Ok(());
        }
        let src_ptr = self.lookup(src, dst.len()).ok_or(Error::FaultCopyIn)?;
        // Safety: `lookup()` bounds-checked the range against a live mapping.
        unsafe { core::ptr::copy_nonoverlapping(src_ptr, dst.as_mut_ptr(), dst.len()) };
        Ok(())
    }

    /// Copies `src` to user address `dst`.
    pub fn copy_to_user(&self, dst: usize, src: &[u8]) -> Result<()> {
        if src.is_empty() {
            return Ok(());
        }
        let dst_ptr = self.lookup(dst, src.len()).ok_or(Error::FaultCopyOut)?;
        // Safety: `lookup()` bounds-checked the range against a live mapping.
        unsafe { core::ptr::copy_nonoverlapping(src.as_ptr(), dst_ptr, src.len()) };
        Ok(())
    }

    /// Copies a plain-data value to user address `dst`.
    pub fn copy_obj_to_user<T: IntoBytes + Immutable>(&self, dst: usize, obj: &T) -> Result<()> {
        self.copy_to_user(dst, obj.as_bytes())
    }

    /// Reads a plain-data value from user address `src`.
    pub fn read_obj_from_user<T: FromBytes>(&self, src: usize) -> Result<T> {
        let mut bytes = vec![0u8; size_of::<T>()];
        self.copy_from_user(&mut bytes, src)?;
        T::read_from_bytes(&bytes).map_err(|_| Error::FaultCopyIn)
    }
}

impl Default for AddressSpace {
    fn default() -> Self {
        Self::new()
    }
}
