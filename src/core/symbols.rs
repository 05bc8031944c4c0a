// This module provides the SymbolTable that assigns argument slots to symbol names during a
// single compilation. Slots are dense, start at zero and are handed out in first-appearance
// order, so the same tree always produces the same buffer layout. Names are interned into the
// compilation arena and indexed by an arena-allocated hashbrown map, while an arena vector keeps
// the slot order for callers that need to lay out the argument buffer. The table only grows;
// it is discarded together with the arena at the end of the compile call.

//! Symbol to slot assignment.

use bumpalo::collections::Vec as BumpVec;
use bumpalo::Bump;
use hashbrown::{DefaultHashBuilder, HashMap};
use std::fmt;

/// Size in bytes of one argument slot.
pub const SLOT_SIZE: u64 = std::mem::size_of::<f64>() as u64;

/// Position of a symbol in the flat argument buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Slot(usize);

impl Slot {
    pub fn new(index: usize) -> Self {
        Slot(index)
    }

    pub fn index(self) -> usize {
        self.0
    }

    /// Byte offset of the slot from the buffer base pointer.
    pub fn byte_offset(self) -> u64 {
        self.0 as u64 * SLOT_SIZE
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${}", self.0)
    }
}

/// Ordered bijection between symbol names and slots.
pub struct SymbolTable<'arena> {
    arena: &'arena Bump,
    slots: HashMap<&'arena str, Slot, DefaultHashBuilder, &'arena Bump>,
    order: BumpVec<'arena, &'arena str>,
}

impl<'arena> SymbolTable<'arena> {
    /// Create an empty table allocating from `arena`.
    pub fn new(arena: &'arena Bump) -> Self {
        Self {
            arena,
            slots: HashMap::new_in(arena),
            order: BumpVec::new_in(arena),
        }
    }

    /// Return the slot of `name`, assigning the next free one on first sight.
    pub fn register(&mut self, name: &str) -> Slot {
        if let Some(&slot) = self.slots.get(name) {
            return slot;
        }

        let interned: &'arena str = self.arena.alloc_str(name);
        let slot = Slot(self.order.len());
        self.order.push(interned);
        self.slots.insert(interned, slot);
        log::trace!("symbol `{}` -> slot {}", name, slot.index());
        slot
    }

    /// Slot previously assigned to `name`.
    pub fn slot(&self, name: &str) -> Option<Slot> {
        self.slots.get(name).copied()
    }

    /// Name bound to `slot`.
    pub fn name(&self, slot: Slot) -> Option<&'arena str> {
        self.order.get(slot.0).copied()
    }

    /// Number of distinct symbols seen so far.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Names in slot order.
    pub fn names(&self) -> impl ExactSizeIterator<Item = &'arena str> + '_ {
        self.order.iter().copied()
    }
}

impl fmt::Debug for SymbolTable<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.order.iter()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slots_are_dense_in_first_appearance_order() {
        let arena = Bump::new();
        let mut table = SymbolTable::new(&arena);

        assert_eq!(table.register("a"), Slot::new(0));
        assert_eq!(table.register("b"), Slot::new(1));
        assert_eq!(table.register("a"), Slot::new(0));
        assert_eq!(table.register("c"), Slot::new(2));

        assert_eq!(table.len(), 3);
        assert_eq!(table.names().collect::<Vec<_>>(), ["a", "b", "c"]);
        assert_eq!(table.name(Slot::new(1)), Some("b"));
        assert_eq!(table.slot("c"), Some(Slot::new(2)));
        assert_eq!(table.slot("d"), None);
    }

    #[test]
    fn test_byte_offsets_are_eight_byte_strided() {
        assert_eq!(Slot::new(0).byte_offset(), 0);
        assert_eq!(Slot::new(3).byte_offset(), 24);
    }

    #[test]
    fn test_names_live_in_the_arena() {
        let arena = Bump::new();
        let before = arena.allocated_bytes();
        let mut table = SymbolTable::new(&arena);
        let owned = String::from("velocity");
        table.register(&owned);
        drop(owned);

        assert_eq!(table.name(Slot::new(0)), Some("velocity"));
        assert!(arena.allocated_bytes() > before);
    }
}
