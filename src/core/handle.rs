//! Generation-checked Handle System
//!
//! Every pooled resource (mesh, texture, material, shader) is addressed by a
//! [`Handle<Tag>`]: a slot index plus the generation the slot had when the
//! handle was issued.
//!
//! # Safety Contract
//!
//! A handle is valid only while its slot is occupied **and** the slot's
//! generation equals the handle's generation. [`HandlePool::remove`] bumps the
//! generation of the backing [`SlotMap`] slot, so every handle issued for
//! that slot before the removal is permanently invalid, even after the slot
//! is reused.
//!
//! Dereferencing an invalid handle through [`HandlePool::get`] is a programmer
//! error and panics with the caller's location. [`HandlePool::try_get`] is the
//! non-panicking variant.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

use slotmap::{Key, KeyData, SlotMap, new_key_type};

/// Typed reference into a [`HandlePool`].
///
/// `Tag` is a zero-sized marker that keeps mesh handles from being used as
/// texture handles and so on.
pub struct Handle<Tag> {
    index: u32,
    generation: u32,
    _tag: PhantomData<fn() -> Tag>,
}

impl<Tag> Handle<Tag> {
    /// A handle that never resolves.
    pub const INVALID: Self = Self::from_raw_parts(u32::MAX, 0);

    #[inline]
    #[must_use]
    pub const fn from_raw_parts(index: u32, generation: u32) -> Self {
        Self {
            index,
            generation,
            _tag: PhantomData,
        }
    }

    #[inline]
    #[must_use]
    pub const fn index(self) -> u32 {
        self.index
    }

    #[inline]
    #[must_use]
    pub const fn generation(self) -> u32 {
        self.generation
    }

    #[inline]
    #[must_use]
    pub const fn is_null(self) -> bool {
        self.index == u32::MAX
    }
}

// Manual impls: derives would require `Tag: Clone + Eq + ...`.
impl<Tag> Clone for Handle<Tag> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<Tag> Copy for Handle<Tag> {}

impl<Tag> PartialEq for Handle<Tag> {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index && self.generation == other.generation
    }
}

impl<Tag> Eq for Handle<Tag> {}

impl<Tag> Hash for Handle<Tag> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.index.hash(state);
        self.generation.hash(state);
    }
}

impl<Tag> Default for Handle<Tag> {
    fn default() -> Self {
        Self::INVALID
    }
}

impl<Tag> fmt::Debug for Handle<Tag> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = std::any::type_name::<Tag>();
        let short = name.rsplit("::").next().unwrap_or(name);
        write!(f, "Handle<{short}>({}v{})", self.index, self.generation)
    }
}

// ============================================================================
// Resource tags
// ============================================================================

#[derive(Debug)]
pub enum MeshTag {}
#[derive(Debug)]
pub enum TextureTag {}
#[derive(Debug)]
pub enum MaterialTag {}
#[derive(Debug)]
pub enum ShaderTag {}

pub type MeshHandle = Handle<MeshTag>;
pub type TextureHandle = Handle<TextureTag>;
pub type MaterialHandle = Handle<MaterialTag>;
pub type ShaderHandle = Handle<ShaderTag>;

// ============================================================================
// HandlePool
// ============================================================================

new_key_type! {
    /// Untyped key of the backing slot map; [`Handle`] is its typed face.
    struct PoolKey;
}

// slotmap keys encode `(version << 32) | index` with odd versions for
// occupied slots, so `generation = version >> 1`.
impl<Tag> Handle<Tag> {
    fn from_key(key: PoolKey) -> Self {
        let ffi = key.data().as_ffi();
        Self::from_raw_parts(ffi as u32, (ffi >> 33) as u32)
    }

    fn to_key(self) -> PoolKey {
        let version = (u64::from(self.generation) << 1) | 1;
        PoolKey::from(KeyData::from_ffi((version << 32) | u64::from(self.index)))
    }
}

/// Typed generational storage over a [`SlotMap`].
///
/// Freed slots are reused most-recently-freed first; reuse bumps the
/// generation by one.
#[derive(Debug)]
pub struct HandlePool<T, Tag> {
    slots: SlotMap<PoolKey, T>,
    /// One past the highest slot index ever issued.
    slot_count: u32,
    _tag: PhantomData<fn() -> Tag>,
}

impl<T, Tag> Default for HandlePool<T, Tag> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, Tag> HandlePool<T, Tag> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            slots: SlotMap::with_key(),
            slot_count: 0,
            _tag: PhantomData,
        }
    }

    /// Stores `value`, reusing a freed slot when one is available.
    pub fn insert(&mut self, value: T) -> Handle<Tag> {
        let handle = Handle::from_key(self.slots.insert(value));
        self.slot_count = self.slot_count.max(handle.index.saturating_add(1));
        handle
    }

    #[inline]
    #[must_use]
    pub fn is_valid(&self, handle: Handle<Tag>) -> bool {
        !handle.is_null() && self.slots.contains_key(handle.to_key())
    }

    #[must_use]
    pub fn try_get(&self, handle: Handle<Tag>) -> Option<&T> {
        if handle.is_null() {
            return None;
        }
        self.slots.get(handle.to_key())
    }

    #[must_use]
    pub fn try_get_mut(&mut self, handle: Handle<Tag>) -> Option<&mut T> {
        if handle.is_null() {
            return None;
        }
        self.slots.get_mut(handle.to_key())
    }

    /// Resolves `handle`.
    ///
    /// # Panics
    ///
    /// Panics if the handle is null, out of range, vacant, or stale.
    #[track_caller]
    #[must_use]
    pub fn get(&self, handle: Handle<Tag>) -> &T {
        match self.try_get(handle) {
            Some(value) => value,
            None => self.invalid_handle(handle),
        }
    }

    /// Mutable variant of [`HandlePool::get`].
    #[track_caller]
    pub fn get_mut(&mut self, handle: Handle<Tag>) -> &mut T {
        if !self.is_valid(handle) {
            self.invalid_handle(handle);
        }
        match self.try_get_mut(handle) {
            Some(value) => value,
            None => unreachable!(),
        }
    }

    /// Takes the value out of its slot and invalidates every handle to it.
    ///
    /// # Panics
    ///
    /// Panics if `handle` is not valid.
    #[track_caller]
    pub fn remove(&mut self, handle: Handle<Tag>) -> T {
        if !self.is_valid(handle) {
            self.invalid_handle(handle);
        }
        match self.slots.remove(handle.to_key()) {
            Some(value) => value,
            None => unreachable!(),
        }
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Occupied slots in index order.
    pub fn iter(&self) -> impl Iterator<Item = (Handle<Tag>, &T)> {
        self.slots.iter().map(|(key, v)| (Handle::from_key(key), v))
    }

    #[track_caller]
    fn invalid_handle(&self, handle: Handle<Tag>) -> ! {
        let reason = if handle.is_null() {
            "null handle".to_string()
        } else if handle.index >= self.slot_count {
            format!("index out of range (pool has {} slots)", self.slot_count)
        } else {
            "stale generation or vacant slot".to_string()
        };
        panic!("invalid {handle:?}: {reason}");
    }
}
