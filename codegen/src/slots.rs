use std::collections::HashMap;

/// Identity of a local storage location within one function.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SlotKey {
    /// A user variable or parameter.
    Var(String),
    /// Backing array of the n-th list literal lowered in the function.
    ListLiteral(usize),
    /// Argument array for calls to a callee at a given call nesting depth.
    CallArgs(String, usize),
}

impl SlotKey {
    pub fn var(name: &str) -> Self {
        SlotKey::Var(name.to_string())
    }
}

/// Assigns slots in first-reference order. Slot 0 holds the receiver, so
/// numbering starts at 1.
#[derive(Debug, Default)]
pub struct SlotAllocator {
    slots: HashMap<SlotKey, u16>,
}

impl SlotAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Slot for `key`, allocating the next free one on first reference.
    pub fn slot(&mut self, key: SlotKey) -> u16 {
        let next = self.slots.len() as u16 + 1;
        *self.slots.entry(key).or_insert(next)
    }

    pub fn get(&self, key: &SlotKey) -> Option<u16> {
        self.slots.get(key).copied()
    }

    /// Number of slots handed out, not counting the receiver.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Forget every assignment; called before each function.
    pub fn reset(&mut self) {
        self.slots.clear();
    }
}
