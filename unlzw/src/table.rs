//! LZW code table (dictionary).
//!
//! The table is an arena of fixed capacity `2^max_code_size`. Each dynamic
//! entry names its string as "string of `parent`" plus one appended byte, so
//! parent links are plain indices into the same array. Strings are never
//! stored; they are rebuilt by walking parent links back to a static root.

use unlzw_core::error::{LzwError, Result};

/// An LZW code: an index into the code table.
pub type Code = u16;

/// Number of single-byte static codes.
pub const STATIC_CODES: usize = 256;

/// Role of a table slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EntryKind {
    /// Free dynamic slot.
    #[default]
    Unused,
    /// Preloaded single-byte code.
    Static,
    /// Dynamic code created during decoding.
    DynamicUsed,
    /// Full dictionary reset (Unix compress).
    Clear,
    /// End of stream. Neither supported dialect preloads one.
    Stop,
    /// Escape prefix (ZIP Shrink code 256).
    Special,
}

/// One slot of the code table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TableEntry {
    /// Code whose string this entry extends. Meaningful for dynamic entries.
    pub parent: Code,
    /// Last byte of this entry's string.
    pub value: u8,
    /// Role of the slot.
    pub kind: EntryKind,
}

/// How a dialect picks the slot for a new entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotPolicy {
    /// Always the next never-used slot; nothing is reused before a full
    /// clear, and a full table silently stops growing (Unix compress).
    Append,
    /// The first unused slot at or after the cursor, since partial clears
    /// leave holes. Finding none means the stream is corrupt (ZIP Shrink).
    FirstUnused,
}

/// Fixed-capacity LZW dictionary.
#[derive(Debug, Clone)]
pub struct CodeTable {
    entries: Vec<TableEntry>,
    first_dynamic: usize,
    /// Where the next free-slot search starts. May equal the capacity.
    free_cursor: usize,
    highest_used: usize,
    policy: SlotPolicy,
}

impl CodeTable {
    /// Build a table for `max_code_size`-bit codes.
    ///
    /// Codes 0-255 are preloaded as static entries, followed by the given
    /// control codes in order; every slot after them is dynamic.
    pub fn new(max_code_size: u8, controls: &[EntryKind], policy: SlotPolicy) -> Result<Self> {
        if !(9..=16).contains(&max_code_size) {
            return Err(LzwError::protocol(format!(
                "code table cannot hold {max_code_size}-bit codes"
            )));
        }
        let capacity = 1usize << max_code_size;
        let first_dynamic = STATIC_CODES + controls.len();

        let mut entries = vec![TableEntry::default(); capacity];
        for (i, entry) in entries.iter_mut().take(STATIC_CODES).enumerate() {
            entry.kind = EntryKind::Static;
            entry.value = i as u8;
        }
        for (entry, &kind) in entries[STATIC_CODES..first_dynamic].iter_mut().zip(controls) {
            entry.kind = kind;
        }

        Ok(Self {
            entries,
            first_dynamic,
            free_cursor: first_dynamic,
            highest_used: first_dynamic - 1,
            policy,
        })
    }

    /// Number of slots, `2^max_code_size`.
    pub fn capacity(&self) -> usize {
        self.entries.len()
    }

    /// First code that can hold a dynamic entry.
    pub fn first_dynamic_code(&self) -> usize {
        self.first_dynamic
    }

    /// Where the next free-slot search starts.
    pub fn free_cursor(&self) -> usize {
        self.free_cursor
    }

    /// Highest code that has ever held an entry in this session.
    pub fn highest_code_ever_used(&self) -> usize {
        self.highest_used
    }

    /// Slot-allocation policy.
    pub fn policy(&self) -> SlotPolicy {
        self.policy
    }

    /// Look up a slot.
    pub fn entry(&self, code: Code) -> Option<&TableEntry> {
        self.entries.get(usize::from(code))
    }

    /// Role of a slot, or `None` past the capacity.
    pub fn kind(&self, code: Code) -> Option<EntryKind> {
        self.entry(code).map(|e| e.kind)
    }

    /// Whether a code currently stands for a byte string.
    pub fn resolves(&self, code: Code) -> bool {
        matches!(
            self.kind(code),
            Some(EntryKind::Static | EntryKind::DynamicUsed)
        )
    }

    /// Number of dynamic entries currently in use.
    pub fn dynamic_len(&self) -> usize {
        self.dynamic_range()
            .filter(|&i| self.entries[i].kind == EntryKind::DynamicUsed)
            .count()
    }

    fn dynamic_range(&self) -> std::ops::RangeInclusive<usize> {
        self.first_dynamic..=self.highest_used
    }

    /// The slot the next [`add_entry`](Self::add_entry) would fill, if any.
    pub fn next_free_slot(&self) -> Option<Code> {
        let slot = match self.policy {
            SlotPolicy::Append => Some(self.free_cursor).filter(|&c| c < self.capacity()),
            SlotPolicy::FirstUnused => (self.free_cursor..self.capacity())
                .find(|&i| self.entries[i].kind == EntryKind::Unused),
        };
        slot.map(|s| s as Code)
    }

    /// Add the string of `parent` extended by `value`.
    ///
    /// Returns the new code, or `None` when an append-only table is full and
    /// simply stops growing. The parent must currently have a string; a
    /// parent reclaimed by a partial clear is an error.
    pub fn add_entry(&mut self, parent: Code, value: u8) -> Result<Option<Code>> {
        if !self.resolves(parent) {
            self.dump();
            return Err(LzwError::protocol(format!(
                "parent code {parent} of new entry has no string"
            )));
        }

        let Some(slot) = self.next_free_slot() else {
            return match self.policy {
                SlotPolicy::Append => Ok(None),
                SlotPolicy::FirstUnused => Err(LzwError::protocol("no free dictionary slot")),
            };
        };

        let index = usize::from(slot);
        if index < self.first_dynamic {
            return Err(LzwError::protocol(format!(
                "dictionary slot {slot} is reserved"
            )));
        }

        self.entries[index] = TableEntry {
            parent,
            value,
            kind: EntryKind::DynamicUsed,
        };
        self.free_cursor = index + 1;
        self.highest_used = self.highest_used.max(index);

        Ok(Some(slot))
    }

    /// Rebuild the string of `code` at the end of `scratch`.
    ///
    /// Walks parent links back to a static root, filling `scratch` from the
    /// end, and returns the filled tail. Fails if the chain leaves the table,
    /// passes through a slot without a string, loops on itself, or does not
    /// reach a root within `scratch.len()` steps.
    pub fn expand<'s>(&self, code: Code, scratch: &'s mut [u8]) -> Result<&'s [u8]> {
        let mut code = code;
        let mut pos = scratch.len();

        loop {
            let Some(entry) = self.entry(code) else {
                return Err(LzwError::protocol(format!("code {code} is out of range")));
            };
            if pos == 0 {
                self.dump();
                return Err(LzwError::protocol(format!(
                    "dictionary chain through code {code} does not terminate"
                )));
            }
            pos -= 1;
            scratch[pos] = entry.value;

            match entry.kind {
                EntryKind::Static => break,
                EntryKind::DynamicUsed if entry.parent == code => {
                    self.dump();
                    return Err(LzwError::protocol(format!(
                        "code {code} refers to itself"
                    )));
                }
                EntryKind::DynamicUsed => code = entry.parent,
                other => {
                    self.dump();
                    return Err(LzwError::protocol(format!(
                        "code {code} ({other:?}) has no string"
                    )));
                }
            }
        }

        Ok(&scratch[pos..])
    }

    /// Forget every dynamic entry and restart allocation at the first
    /// dynamic code.
    pub fn full_clear(&mut self) {
        let range = self.dynamic_range();
        for entry in &mut self.entries[range] {
            *entry = TableEntry::default();
        }
        self.free_cursor = self.first_dynamic;
    }

    /// Reclaim dynamic entries that no other dynamic entry extends.
    ///
    /// A two-pass mark and sweep: first every in-use entry marks its parent
    /// as having a child, then every unmarked dynamic slot is freed. All
    /// marks must be in place before anything is freed, otherwise an
    /// ancestor could be swept before its descendant is seen.
    pub fn partial_clear(&mut self) {
        let range = self.dynamic_range();
        let mut has_child = vec![false; self.capacity()];

        for entry in &self.entries[range.clone()] {
            let parent = usize::from(entry.parent);
            if entry.kind == EntryKind::DynamicUsed && parent >= self.first_dynamic {
                has_child[parent] = true;
            }
        }

        for i in range {
            if !has_child[i] {
                self.entries[i] = TableEntry::default();
            }
        }

        self.free_cursor = self.first_dynamic;
    }

    /// Log every slot up to the highest used code.
    pub fn dump(&self) {
        for (code, entry) in self.entries.iter().enumerate().take(self.highest_used + 1) {
            tracing::trace!(
                "[{code}] p={} v={} ty={:?}",
                entry.parent,
                entry.value,
                entry.kind
            );
        }
    }
}
