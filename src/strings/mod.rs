use serde::{Deserialize, Serialize};

/// Handle to a string owned by a [`StringTable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StringId(pub u32);

struct Slot {
    text: String,
    marked: bool,
}

/// Mark-and-sweep table for strings created at run time.
///
/// Every owner of a [`StringId`] (the stacks, the globals) marks what it still
/// references; `gc()` then frees everything left unmarked.
#[derive(Default)]
pub struct StringTable {
    slots: Vec<Option<Slot>>,
    free: Vec<u32>,
}

impl StringTable {
    pub fn new() -> Self {
        StringTable::default()
    }

    pub fn create(&mut self, text: &str) -> StringId {
        let slot = Slot { text: text.to_string(), marked: false };
        match self.free.pop() {
            Some(idx) => {
                self.slots[idx as usize] = Some(slot);
                StringId(idx)
            }
            None => {
                let idx = self.slots.len() as u32;
                self.slots.push(Some(slot));
                StringId(idx)
            }
        }
    }

    pub fn get(&self, id: StringId) -> Option<&str> {
        self.slots
            .get(id.0 as usize)
            .and_then(|s| s.as_ref())
            .map(|s| s.text.as_str())
    }

    /// Mark `id` as reachable for the next collection. Unknown ids are ignored.
    pub fn mark_used(&mut self, id: StringId) {
        if let Some(Some(slot)) = self.slots.get_mut(id.0 as usize) {
            slot.marked = true;
        }
    }

    /// Free every string not marked since the last collection and clear all
    /// marks. Returns the number of strings freed.
    pub fn gc(&mut self) -> usize {
        let mut freed = 0;
        for (idx, entry) in self.slots.iter_mut().enumerate() {
            match entry {
                Some(slot) if slot.marked => slot.marked = false,
                Some(_) => {
                    *entry = None;
                    self.free.push(idx as u32);
                    freed += 1;
                }
                None => {}
            }
        }
        log::debug!("string table gc: freed {}, {} live", freed, self.len());
        freed
    }

    /// Number of live strings.
    pub fn len(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
