use super::{Iter, RestorableStack, StackError, StackResult};
use crate::hash::NameHash;
use crate::strings::StringTable;
use crate::value::{FrameKind, Offset, Value};

/// One slot of the call stack: a named variable, or a frame boundary when
/// `name` is `NameHash::INVALID`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Entry {
    pub name: NameHash,
    pub value: Value,
}

impl Entry {
    pub const NULL: Entry = Entry { name: NameHash::INVALID, value: Value::None };

    #[inline]
    pub fn is_boundary(&self) -> bool {
        !self.name.is_valid() && !self.value.is_none()
    }
}

impl std::fmt::Display for Entry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_boundary() {
            write!(f, "{}", self.value)
        } else {
            write!(f, "#{:08x}={}", self.name.0, self.value)
        }
    }
}

/// Call frames and their local variables.
///
/// A frame is a boundary entry followed by the variables set inside it.
/// Lookups never cross the nearest boundary below the top.
#[derive(Debug)]
pub struct CallStack<S = Box<[Entry]>> {
    stack: RestorableStack<Entry, S>,
}

impl CallStack<Box<[Entry]>> {
    pub fn with_capacity(capacity: usize) -> Self {
        CallStack { stack: RestorableStack::with_capacity(capacity, Entry::NULL) }
    }
}

impl<const N: usize> CallStack<[Entry; N]> {
    pub fn inline() -> Self {
        CallStack { stack: RestorableStack::inline(Entry::NULL) }
    }
}

impl<S: AsRef<[Entry]> + AsMut<[Entry]>> CallStack<S> {
    pub fn new(buffer: S) -> Self {
        CallStack { stack: RestorableStack::new(buffer, Entry::NULL) }
    }

    /// Assign `name` in the current frame.
    ///
    /// While a save is outstanding this always appends, shadowing any older
    /// entry, so the saved region stays untouched for `restore()`.
    pub fn set(&mut self, name: NameHash, value: Value) -> StackResult<()> {
        if !name.is_valid() {
            return Err(StackError::InvalidArgument("variable name hashes to the frame marker"));
        }
        if !self.stack.has_snapshot() {
            if let Some(idx) = self.find(name) {
                self.stack.slot_mut(idx).value = value;
                return Ok(());
            }
        }
        self.stack.push(Entry { name, value })
    }

    /// Most recent binding of `name` in the current frame.
    pub fn get(&self, name: NameHash) -> Option<&Value> {
        self.find(name).map(|idx| &self.stack.slot(idx).value)
    }

    fn find(&self, name: NameHash) -> Option<usize> {
        if !name.is_valid() {
            return None;
        }
        for idx in self.stack.indices() {
            let entry = self.stack.slot(idx);
            if entry.name == name {
                return Some(idx);
            }
            if entry.is_boundary() {
                return None;
            }
        }
        None
    }

    pub fn push_frame(&mut self, return_to: Offset, kind: FrameKind) -> StackResult<()> {
        self.stack.push(Entry { name: NameHash::INVALID, value: Value::frame(return_to, kind) })
    }

    /// Discard the current frame and its variables, returning where to
    /// resume and how the frame was entered.
    pub fn pop_frame(&mut self) -> StackResult<(Offset, FrameKind)> {
        if self.stack.is_empty() {
            return Err(StackError::Underflow);
        }
        if !self.has_frame() {
            return Err(StackError::InvalidState("pop_frame() with no frame on the call stack"));
        }
        loop {
            let entry = self.stack.pop()?;
            if entry.is_boundary() {
                let frame = entry.value.as_frame()
                    .ok_or(StackError::InvalidState("frame boundary without a frame record"))?;
                log::trace!("pop_frame -> {:?} returning to {}", frame.1, frame.0);
                return Ok(frame);
            }
        }
    }

    pub fn has_frame(&self) -> bool {
        self.stack.iter().any(Entry::is_boundary)
    }

    /// Number of frames currently on the stack.
    pub fn depth(&self) -> usize {
        self.stack.iter().filter(|e| e.is_boundary()).count()
    }

    pub fn size(&self) -> usize {
        self.stack.size()
    }

    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.stack.capacity()
    }

    pub fn iter(&self) -> Iter<'_, Entry, S> {
        self.stack.iter()
    }

    pub fn clear(&mut self) -> StackResult<()> {
        self.stack.clear()
    }

    pub fn reset(&mut self) {
        self.stack.reset()
    }

    pub fn has_snapshot(&self) -> bool {
        self.stack.has_snapshot()
    }

    pub fn save(&mut self) -> StackResult<()> {
        self.stack.save()
    }

    pub fn restore(&mut self) -> StackResult<()> {
        self.stack.restore()
    }

    pub fn forget(&mut self) -> StackResult<()> {
        self.stack.forget()
    }

    /// Mark every string the stack may still hand back, including entries
    /// hidden behind an outstanding save.
    pub fn mark_strings(&self, strings: &mut StringTable) {
        for entry in self.stack.live() {
            entry.value.mark_strings(strings);
        }
    }
}
