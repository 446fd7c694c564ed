//! Lexical scope chain and slot storage.
//!
//! A [`Scope`] maps names to flagged slots and optionally points at a parent
//! scope; reads walk the parent chain unless told otherwise. Scopes are
//! reference-counted handles: cloning one yields another handle onto the same
//! slot table, which is how closures, class captures and per-value member
//! scopes all share state.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use bitflags::bitflags;
use indexmap::IndexMap;

use crate::value::Value;

bitflags! {
    /// Flags controlling slot writes and reads.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct SlotFlags: u8 {
        /// Create the slot in the current scope instead of mutating the
        /// nearest existing one.
        const INIT = 1 << 0;
        /// Mark the slot immutable after initialization.
        const CONSTANT = 1 << 1;
        /// Restrict reads and containment checks to the current scope.
        const IGNORE_PARENT = 1 << 2;
    }
}

/// A named storage cell inside a scope.
#[derive(Debug, Clone)]
pub struct Slot {
    pub value: Value,
    pub flags: SlotFlags,
}

impl Slot {
    #[must_use]
    pub fn is_constant(&self) -> bool {
        self.flags.contains(SlotFlags::CONSTANT)
    }
}

/// Failure modes of slot access. The interpreter maps these onto runtime
/// errors with location and trace information attached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeError {
    NotDefined,
    ConstantAssignment,
}

#[derive(Default)]
struct ScopeInner {
    parent: Option<Scope>,
    slots: IndexMap<String, Slot, ahash::RandomState>,
}

/// A reference-counted handle onto one node of the scope tree.
#[derive(Clone, Default)]
pub struct Scope {
    inner: Rc<RefCell<ScopeInner>>,
}

impl PartialEq for Scope {
    /// Two handles are equal iff they point at the same scope node.
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Scope {
    /// Creates a root scope with no parent.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a fresh empty scope whose parent is this one.
    #[must_use]
    pub fn child(&self) -> Self {
        Self {
            inner: Rc::new(RefCell::new(ScopeInner {
                parent: Some(self.clone()),
                slots: IndexMap::default(),
            })),
        }
    }

    /// Returns a handle to the parent scope, if any.
    #[must_use]
    pub fn parent(&self) -> Option<Self> {
        self.inner.borrow().parent.clone()
    }

    /// Whether two handles refer to the same scope node. This is the
    /// identity relation used for object equality.
    #[must_use]
    pub fn same(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    /// Whether `name` resolves in this scope or any ancestor.
    #[must_use]
    pub fn defined(&self, name: &str) -> bool {
        self.contains(name, SlotFlags::empty())
    }

    /// Whether `name` is present in this scope, or in an ancestor unless
    /// `IGNORE_PARENT` is set.
    #[must_use]
    pub fn contains(&self, name: &str, flags: SlotFlags) -> bool {
        self.find_slot(name, flags).is_some()
    }

    /// Resolves `name` and returns a copy of its value.
    pub fn get(&self, name: &str, flags: SlotFlags) -> Result<Value, ScopeError> {
        self.find_slot(name, flags)
            .map(|slot| slot.value)
            .ok_or(ScopeError::NotDefined)
    }

    /// Returns the slot for `name` including its metadata, walking the
    /// parent chain.
    #[must_use]
    pub fn slot(&self, name: &str) -> Option<Slot> {
        self.find_slot(name, SlotFlags::empty())
    }

    /// Writes `value` under `name`.
    ///
    /// With `INIT`, the slot is created in this scope; re-initializing an
    /// existing constant slot fails. Without `INIT`, the nearest existing
    /// slot is mutated (restricted to this scope under `IGNORE_PARENT`);
    /// missing slots and constant slots fail.
    pub fn write(&self, name: &str, value: Value, flags: SlotFlags) -> Result<(), ScopeError> {
        if flags.contains(SlotFlags::INIT) {
            let mut inner = self.inner.borrow_mut();
            if let Some(existing) = inner.slots.get(name) {
                if existing.is_constant() {
                    return Err(ScopeError::ConstantAssignment);
                }
            }
            let stored = flags & (SlotFlags::INIT | SlotFlags::CONSTANT);
            inner.slots.insert(name.to_owned(), Slot { value, flags: stored });
            return Ok(());
        }

        let mut current = self.clone();
        loop {
            {
                let mut inner = current.inner.borrow_mut();
                if let Some(slot) = inner.slots.get_mut(name) {
                    if slot.is_constant() {
                        return Err(ScopeError::ConstantAssignment);
                    }
                    slot.value = value;
                    return Ok(());
                }
            }
            if flags.contains(SlotFlags::IGNORE_PARENT) {
                return Err(ScopeError::NotDefined);
            }
            let parent = current.parent();
            match parent {
                Some(parent) => current = parent,
                None => return Err(ScopeError::NotDefined),
            }
        }
    }

    /// Removes the slot for `name`, walking the parent chain unless
    /// `IGNORE_PARENT` is set. Returns whether a slot was removed.
    pub fn delete(&self, name: &str, flags: SlotFlags) -> bool {
        let mut current = self.clone();
        loop {
            let removed = current.inner.borrow_mut().slots.shift_remove(name).is_some();
            if removed {
                return true;
            }
            if flags.contains(SlotFlags::IGNORE_PARENT) {
                return false;
            }
            let parent = current.parent();
            match parent {
                Some(parent) => current = parent,
                None => return false,
            }
        }
    }

    /// The number of slots stored directly in this scope.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.borrow().slots.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The names stored directly in this scope, in insertion order.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        self.inner.borrow().slots.keys().cloned().collect()
    }

    fn find_slot(&self, name: &str, flags: SlotFlags) -> Option<Slot> {
        let mut current = self.clone();
        loop {
            {
                let inner = current.inner.borrow();
                if let Some(slot) = inner.slots.get(name) {
                    return Some(slot.clone());
                }
            }
            if flags.contains(SlotFlags::IGNORE_PARENT) {
                return None;
            }
            let parent = current.parent();
            match parent {
                Some(parent) => current = parent,
                None => return None,
            }
        }
    }
}

// Scope chains can contain cycles through captured closures, so Debug stays
// shallow: slot names only, no values, no parent traversal.
impl fmt::Debug for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("Scope")
            .field("slots", &inner.slots.keys().collect::<Vec<_>>())
            .field("has_parent", &inner.parent.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_creates_slot_in_current_scope() {
        let scope = Scope::new();
        scope.write("a", Value::numeric(1.0), SlotFlags::INIT).unwrap();
        assert!(scope.defined("a"));
        assert_eq!(scope.get("a", SlotFlags::empty()).unwrap().as_numeric(), Some(1.0));
    }

    #[test]
    fn plain_write_mutates_nearest_ancestor_slot() {
        let root = Scope::new();
        root.write("a", Value::numeric(1.0), SlotFlags::INIT).unwrap();
        let child = root.child();
        child.write("a", Value::numeric(2.0), SlotFlags::empty()).unwrap();
        assert_eq!(root.get("a", SlotFlags::empty()).unwrap().as_numeric(), Some(2.0));
        assert!(!child.contains("a", SlotFlags::IGNORE_PARENT));
    }

    #[test]
    fn plain_write_fails_when_missing() {
        let scope = Scope::new();
        let err = scope.write("ghost", Value::null(), SlotFlags::empty());
        assert_eq!(err, Err(ScopeError::NotDefined));
    }

    #[test]
    fn constant_slots_reject_rewrites() {
        let scope = Scope::new();
        scope
            .write("pi", Value::numeric(3.14), SlotFlags::INIT | SlotFlags::CONSTANT)
            .unwrap();
        let plain = scope.write("pi", Value::numeric(3.0), SlotFlags::empty());
        assert_eq!(plain, Err(ScopeError::ConstantAssignment));
        let reinit = scope.write("pi", Value::numeric(3.0), SlotFlags::INIT);
        assert_eq!(reinit, Err(ScopeError::ConstantAssignment));
    }

    #[test]
    fn child_init_shadows_parent_slot() {
        let root = Scope::new();
        root.write("a", Value::numeric(1.0), SlotFlags::INIT).unwrap();
        let child = root.child();
        child.write("a", Value::numeric(9.0), SlotFlags::INIT).unwrap();
        assert_eq!(child.get("a", SlotFlags::empty()).unwrap().as_numeric(), Some(9.0));
        assert_eq!(root.get("a", SlotFlags::empty()).unwrap().as_numeric(), Some(1.0));
    }

    #[test]
    fn ignore_parent_restricts_reads() {
        let root = Scope::new();
        root.write("a", Value::numeric(1.0), SlotFlags::INIT).unwrap();
        let child = root.child();
        assert!(child.defined("a"));
        assert!(!child.contains("a", SlotFlags::IGNORE_PARENT));
        assert_eq!(child.get("a", SlotFlags::IGNORE_PARENT), Err(ScopeError::NotDefined));
    }

    #[test]
    fn delete_removes_nearest_slot() {
        let root = Scope::new();
        root.write("a", Value::numeric(1.0), SlotFlags::INIT).unwrap();
        let child = root.child();
        assert!(child.delete("a", SlotFlags::empty()));
        assert!(!root.defined("a"));
        assert!(!child.delete("a", SlotFlags::empty()));
    }

    #[test]
    fn delete_with_ignore_parent_stays_local() {
        let root = Scope::new();
        root.write("a", Value::numeric(1.0), SlotFlags::INIT).unwrap();
        let child = root.child();
        assert!(!child.delete("a", SlotFlags::IGNORE_PARENT));
        assert!(root.defined("a"));
    }

    #[test]
    fn slot_exposes_flag_metadata() {
        let root = Scope::new();
        root.write("pi", Value::numeric(3.14), SlotFlags::INIT | SlotFlags::CONSTANT)
            .unwrap();
        let child = root.child();
        let slot = child.slot("pi").expect("slot resolves through the chain");
        assert!(slot.is_constant());
        assert_eq!(slot.value.as_numeric(), Some(3.14));
        assert!(child.slot("ghost").is_none());
    }

    #[test]
    fn names_preserve_insertion_order() {
        let scope = Scope::new();
        scope.write("b", Value::null(), SlotFlags::INIT).unwrap();
        scope.write("a", Value::null(), SlotFlags::INIT).unwrap();
        scope.write("c", Value::null(), SlotFlags::INIT).unwrap();
        assert_eq!(scope.names(), vec!["b", "a", "c"]);
    }

    #[test]
    fn identity_is_per_handle_target() {
        let scope = Scope::new();
        let alias = scope.clone();
        assert!(scope.same(&alias));
        assert!(!scope.same(&Scope::new()));
    }
}
