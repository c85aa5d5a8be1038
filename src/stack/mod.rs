pub mod call;
pub mod eval;

pub use call::{CallStack, Entry};
pub use eval::EvalStack;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StackError {
    #[error("stack overflow (capacity {capacity})")]
    Overflow { capacity: usize },
    #[error("stack underflow")]
    Underflow,
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),
    #[error("invalid state: {0}")]
    InvalidState(&'static str),
}

pub type StackResult<T> = Result<T, StackError>;

// ── Snapshot stack engine ───────────────────────────────────────────
//
// One snapshot at a time. While it is outstanding:
//
//   [0, jump)       pre-snapshot data still reachable by pop
//   [jump, save)    pre-snapshot data bypassed by a push; kept for restore()
//   [save, top)     data pushed since the snapshot
//
// Writes never land in [jump, save). A push made while top < save moves the
// write cursor to `save` and records where it came from in `jump`; a pop that
// reaches `save` drops back to `jump`.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Snapshot {
    save: usize,
    jump: usize,
    /// Tombstone count at the time of save().
    dead: usize,
}

/// Restartable position for [`RestorableStack::step`].
///
/// Holds the physical index of the last element handed out. A fresh cursor,
/// or one that no longer points into the reachable region, starts at the top.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Cursor(Option<usize>);

impl Cursor {
    pub const START: Cursor = Cursor(None);

    pub fn position(&self) -> Option<usize> {
        self.0
    }
}

/// Fixed-capacity stack with a single level of save / restore / forget.
///
/// The buffer is handed in at construction and never reallocated: an inline
/// array, a caller-owned slice, or a boxed slice the owner allocated once.
/// `null` is reserved. It can't be pushed, and slots holding it (tombstones
/// left by [`forget`](Self::forget)) are invisible to every read.
#[derive(Debug)]
pub struct RestorableStack<T, S = Box<[T]>> {
    buffer: S,
    null: T,
    top: usize,
    /// Tombstones inside the reachable region.
    dead: usize,
    snapshot: Option<Snapshot>,
}

pub type InlineStack<T, const N: usize> = RestorableStack<T, [T; N]>;

impl<T: Clone + PartialEq, const N: usize> RestorableStack<T, [T; N]> {
    pub fn inline(null: T) -> Self {
        let buffer = std::array::from_fn(|_| null.clone());
        RestorableStack::new(buffer, null)
    }
}

impl<T: Clone + PartialEq> RestorableStack<T, Box<[T]>> {
    /// Allocate a boxed buffer of `capacity` null slots. The only allocation
    /// this stack will ever make.
    pub fn with_capacity(capacity: usize, null: T) -> Self {
        let buffer = vec![null.clone(); capacity].into_boxed_slice();
        RestorableStack::new(buffer, null)
    }
}

impl<T, S> RestorableStack<T, S>
where
    T: Clone + PartialEq,
    S: AsRef<[T]> + AsMut<[T]>,
{
    pub fn new(buffer: S, null: T) -> Self {
        RestorableStack { buffer, null, top: 0, dead: 0, snapshot: None }
    }

    pub fn capacity(&self) -> usize {
        self.buffer.as_ref().len()
    }

    pub fn null(&self) -> &T {
        &self.null
    }

    pub fn push(&mut self, value: T) -> StackResult<()> {
        if value == self.null {
            return Err(StackError::InvalidArgument("the null value can not be pushed"));
        }

        // Don't overwrite saved data: jump over it and remember where from
        let relocate = matches!(self.snapshot, Some(s) if self.top < s.save);
        let target = match self.snapshot {
            Some(s) if relocate => s.save,
            _ => self.top,
        };
        if target >= self.capacity() {
            return Err(StackError::Overflow { capacity: self.capacity() });
        }
        if relocate {
            if let Some(s) = self.snapshot.as_mut() {
                s.jump = self.top;
            }
            self.top = target;
        }

        self.buffer.as_mut()[self.top] = value;
        self.top += 1;
        Ok(())
    }

    pub fn pop(&mut self) -> StackResult<T> {
        let (idx, skipped) = self.seek_below(self.top);
        let idx = idx.ok_or(StackError::Underflow)?;
        self.dead -= skipped;
        self.top = idx;
        Ok(self.buffer.as_ref()[idx].clone())
    }

    pub fn top(&self) -> StackResult<&T> {
        self.below(self.top)
            .map(|idx| &self.buffer.as_ref()[idx])
            .ok_or(StackError::Underflow)
    }

    /// Number of values reachable by `pop`.
    pub fn size(&self) -> usize {
        let span = match self.snapshot {
            Some(s) if self.top >= s.save => self.top - (s.save - s.jump),
            _ => self.top,
        };
        span - self.dead
    }

    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    /// Empty the stack. Refused while a snapshot is outstanding, since the
    /// snapshot would silently vanish with it; use [`reset`](Self::reset) to
    /// drop both.
    pub fn clear(&mut self) -> StackResult<()> {
        if self.snapshot.is_some() {
            return Err(StackError::InvalidState("can not clear() with an outstanding save; restore() or forget() first"));
        }
        self.reset();
        Ok(())
    }

    pub fn reset(&mut self) {
        self.top = 0;
        self.dead = 0;
        self.snapshot = None;
    }

    // ── Iteration ────────────────────────────────────────────────────

    /// Advance `cursor` one element down the stack and return it, or `None`
    /// (resetting the cursor) once the bottom has been passed.
    pub fn step(&self, cursor: &mut Cursor) -> Option<&T> {
        let from = match cursor.0 {
            Some(i) if self.is_reachable(i) => i,
            _ => self.top,
        };
        match self.below(from) {
            Some(idx) => {
                cursor.0 = Some(idx);
                Some(&self.buffer.as_ref()[idx])
            }
            None => {
                cursor.0 = None;
                None
            }
        }
    }

    /// Top-to-bottom iterator over the reachable values.
    pub fn iter(&self) -> Iter<'_, T, S> {
        Iter { indices: self.indices() }
    }

    pub(crate) fn indices(&self) -> Indices<'_, T, S> {
        Indices { stack: self, pos: Some(self.top) }
    }

    pub(crate) fn slot(&self, idx: usize) -> &T {
        &self.buffer.as_ref()[idx]
    }

    pub(crate) fn slot_mut(&mut self, idx: usize) -> &mut T {
        &mut self.buffer.as_mut()[idx]
    }

    /// Every slot that may still hold live data, saved region included.
    pub fn live(&self) -> &[T] {
        let end = match self.snapshot {
            Some(s) => self.top.max(s.save),
            None => self.top,
        };
        &self.buffer.as_ref()[..end]
    }

    fn is_reachable(&self, idx: usize) -> bool {
        if idx >= self.top {
            return false;
        }
        match self.snapshot {
            Some(s) if self.top >= s.save => idx < s.jump || idx >= s.save,
            _ => true,
        }
    }

    fn below(&self, pos: usize) -> Option<usize> {
        self.seek_below(pos).0
    }

    /// Find the first non-null slot below `pos`, hopping over the bypassed
    /// region. Also returns how many tombstones were passed on the way.
    fn seek_below(&self, mut pos: usize) -> (Option<usize>, usize) {
        let buf = self.buffer.as_ref();
        let mut skipped = 0;
        loop {
            if let Some(s) = self.snapshot {
                if pos == s.save {
                    pos = s.jump;
                }
            }
            if pos == 0 {
                return (None, skipped);
            }
            pos -= 1;
            if buf[pos] != self.null {
                return (Some(pos), skipped);
            }
            skipped += 1;
        }
    }

    // ── Save / restore ───────────────────────────────────────────────

    pub fn has_snapshot(&self) -> bool {
        self.snapshot.is_some()
    }

    pub fn save(&mut self) -> StackResult<()> {
        if self.snapshot.is_some() {
            return Err(StackError::InvalidState("can not save stack twice; restore() or forget() first"));
        }
        self.snapshot = Some(Snapshot { save: self.top, jump: self.top, dead: self.dead });
        log::trace!("stack save at {}", self.top);
        Ok(())
    }

    /// Return to exactly the state at the last `save()`.
    pub fn restore(&mut self) -> StackResult<()> {
        let s = self.snapshot.take()
            .ok_or(StackError::InvalidState("can not restore() when there is no save"))?;
        log::trace!("stack restore {} -> {}", self.top, s.save);
        self.top = s.save;
        self.dead = s.dead;
        Ok(())
    }

    /// Keep everything done since the last `save()`. Saved data that was
    /// jumped over is tombstoned so it stops holding on to anything.
    pub fn forget(&mut self) -> StackResult<()> {
        let s = self.snapshot.take()
            .ok_or(StackError::InvalidState("can not forget() when the stack has never been saved"))?;
        if s.jump < s.save {
            let null = self.null.clone();
            for slot in &mut self.buffer.as_mut()[s.jump..s.save] {
                *slot = null.clone();
            }
            // Only counts if the tombstones now sit under the top
            if self.top >= s.save {
                self.dead += s.save - s.jump;
            }
            log::trace!("stack forget: tombstoned {}..{}", s.jump, s.save);
        }
        Ok(())
    }
}

/// Physical indices of reachable, non-tombstoned slots, top first.
pub(crate) struct Indices<'a, T, S> {
    stack: &'a RestorableStack<T, S>,
    /// Exclusive bound for the next search; `None` once exhausted.
    pos: Option<usize>,
}

impl<'a, T, S> Iterator for Indices<'a, T, S>
where
    T: Clone + PartialEq,
    S: AsRef<[T]> + AsMut<[T]>,
{
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        let idx = self.stack.below(self.pos?);
        self.pos = idx;
        idx
    }
}

pub struct Iter<'a, T, S> {
    indices: Indices<'a, T, S>,
}

impl<'a, T, S> Iterator for Iter<'a, T, S>
where
    T: Clone + PartialEq,
    S: AsRef<[T]> + AsMut<[T]>,
{
    type Item = &'a T;

    fn next(&mut self) -> Option<&'a T> {
        let idx = self.indices.next()?;
        let stack: &'a RestorableStack<T, S> = self.indices.stack;
        Some(stack.slot(idx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NULL: char = '\0';

    fn stack5() -> InlineStack<char, 5> {
        RestorableStack::inline(NULL)
    }

    fn contents<S: AsRef<[char]> + AsMut<[char]>>(s: &RestorableStack<char, S>) -> String {
        s.iter().collect()
    }

    #[test]
    fn push_pop_top() {
        let mut s = stack5();
        s.push('a').unwrap();
        s.push('b').unwrap();
        assert_eq!(s.size(), 2);
        assert_eq!(*s.top().unwrap(), 'b');
        assert_eq!(s.pop().unwrap(), 'b');
        assert_eq!(s.pop().unwrap(), 'a');
        assert!(s.is_empty());
    }

    #[test]
    fn null_push_rejected() {
        let mut s = stack5();
        assert!(matches!(s.push(NULL), Err(StackError::InvalidArgument(_))));
        assert_eq!(s.size(), 0);
    }

    #[test]
    fn overflow_at_capacity() {
        let mut s = stack5();
        for c in "abcde".chars() {
            s.push(c).unwrap();
        }
        assert_eq!(s.push('f'), Err(StackError::Overflow { capacity: 5 }));
        assert_eq!(s.size(), 5);
    }

    #[test]
    fn underflow_when_empty() {
        let mut s = stack5();
        assert_eq!(s.pop(), Err(StackError::Underflow));
        assert_eq!(s.top(), Err(StackError::Underflow));
    }

    #[test]
    fn save_pop_push_restore() {
        let mut s = stack5();
        s.push('A').unwrap();
        s.push('B').unwrap();
        s.save().unwrap();
        assert_eq!(s.pop().unwrap(), 'B');
        s.push('C').unwrap();
        assert_eq!(s.size(), 2);
        assert_eq!(*s.top().unwrap(), 'C');
        assert_eq!(contents(&s), "CA");
        s.restore().unwrap();
        assert_eq!(s.size(), 2);
        assert_eq!(*s.top().unwrap(), 'B');
        assert_eq!(s.pop().unwrap(), 'B');
        assert_eq!(s.pop().unwrap(), 'A');
        assert_eq!(s.pop(), Err(StackError::Underflow));
    }

    #[test]
    fn pop_past_jump_reaches_pre_save_data() {
        let mut s = stack5();
        s.push('A').unwrap();
        s.push('B').unwrap();
        s.save().unwrap();
        s.pop().unwrap();
        s.push('C').unwrap();
        assert_eq!(s.pop().unwrap(), 'C');
        // back at the save point: drop to where we jumped from
        assert_eq!(*s.top().unwrap(), 'A');
        assert_eq!(s.pop().unwrap(), 'A');
        assert!(s.is_empty());
        s.restore().unwrap();
        assert_eq!(contents(&s), "BA");
    }

    #[test]
    fn forget_keeps_new_top_and_tombstones_hole() {
        let mut s = stack5();
        s.push('A').unwrap();
        s.push('B').unwrap();
        s.save().unwrap();
        s.pop().unwrap();
        s.push('C').unwrap();
        s.forget().unwrap();
        assert!(!s.has_snapshot());
        assert_eq!(s.size(), 2);
        assert_eq!(contents(&s), "CA");
        assert_eq!(s.live(), &['A', NULL, 'C']);
        assert_eq!(s.pop().unwrap(), 'C');
        // tombstone skipped
        assert_eq!(s.pop().unwrap(), 'A');
        assert_eq!(s.size(), 0);
        assert_eq!(s.pop(), Err(StackError::Underflow));
    }

    #[test]
    fn forget_without_jump_is_plain_commit() {
        let mut s = stack5();
        s.push('A').unwrap();
        s.save().unwrap();
        s.push('B').unwrap();
        s.push('C').unwrap();
        s.forget().unwrap();
        assert_eq!(contents(&s), "CBA");
        assert_eq!(s.size(), 3);
    }

    #[test]
    fn forget_after_popping_below_save() {
        let mut s = stack5();
        for c in "ABC".chars() {
            s.push(c).unwrap();
        }
        s.save().unwrap();
        s.pop().unwrap();
        s.pop().unwrap();
        s.forget().unwrap();
        assert_eq!(contents(&s), "A");
        s.push('D').unwrap();
        assert_eq!(contents(&s), "DA");
        assert_eq!(s.size(), 2);
    }

    #[test]
    fn snapshot_after_forget_tracks_tombstones() {
        let mut s = stack5();
        s.push('A').unwrap();
        s.push('B').unwrap();
        s.save().unwrap();
        s.pop().unwrap();
        s.push('C').unwrap();
        s.forget().unwrap();

        s.save().unwrap();
        assert_eq!(s.pop().unwrap(), 'C');
        assert_eq!(s.pop().unwrap(), 'A');
        assert_eq!(s.size(), 0);
        s.restore().unwrap();
        assert_eq!(s.size(), 2);
        assert_eq!(contents(&s), "CA");
    }

    #[test]
    fn single_outstanding_snapshot() {
        let mut s = stack5();
        assert!(matches!(s.restore(), Err(StackError::InvalidState(_))));
        assert!(matches!(s.forget(), Err(StackError::InvalidState(_))));
        s.save().unwrap();
        assert!(matches!(s.save(), Err(StackError::InvalidState(_))));
        s.forget().unwrap();
        s.save().unwrap();
    }

    #[test]
    fn clear_refused_while_saved() {
        let mut s = stack5();
        s.push('A').unwrap();
        s.save().unwrap();
        assert!(matches!(s.clear(), Err(StackError::InvalidState(_))));
        s.restore().unwrap();
        s.clear().unwrap();
        assert!(s.is_empty());

        s.push('B').unwrap();
        s.save().unwrap();
        s.reset();
        assert!(!s.has_snapshot());
        assert!(s.is_empty());
    }

    #[test]
    fn step_cursor_restarts() {
        let mut s = stack5();
        for c in "ABC".chars() {
            s.push(c).unwrap();
        }
        let mut cur = Cursor::START;
        assert_eq!(s.step(&mut cur), Some(&'C'));
        assert_eq!(cur.position(), Some(2));
        assert_eq!(s.step(&mut cur), Some(&'B'));
        assert_eq!(s.step(&mut cur), Some(&'A'));
        assert_eq!(s.step(&mut cur), None);
        assert_eq!(cur, Cursor::START);
        // exhausted cursor starts over
        assert_eq!(s.step(&mut cur), Some(&'C'));

        // a cursor past the top restarts too
        s.pop().unwrap();
        let mut stale = Cursor(Some(2));
        assert_eq!(s.step(&mut stale), Some(&'B'));
    }

    #[test]
    fn step_hops_bypassed_region() {
        let mut s = stack5();
        for c in "ABC".chars() {
            s.push(c).unwrap();
        }
        s.save().unwrap();
        s.pop().unwrap();
        s.pop().unwrap();
        s.push('D').unwrap();
        assert_eq!(contents(&s), "DA");
        // cursor parked inside the bypassed region is not reachable
        let mut inside = Cursor(Some(1));
        assert_eq!(s.step(&mut inside), Some(&'D'));
    }

    #[test]
    fn live_covers_saved_region() {
        let mut s = stack5();
        for c in "ABC".chars() {
            s.push(c).unwrap();
        }
        s.save().unwrap();
        s.pop().unwrap();
        s.pop().unwrap();
        assert_eq!(s.live().len(), 3);
        s.restore().unwrap();
        assert_eq!(s.live().len(), 3);
    }

    #[test]
    fn caller_owned_buffer() {
        let mut buf = [0u32; 3];
        {
            let mut s = RestorableStack::new(&mut buf[..], 0u32);
            assert_eq!(s.capacity(), 3);
            s.push(7).unwrap();
            s.push(8).unwrap();
            assert_eq!(s.iter().copied().collect::<Vec<_>>(), vec![8, 7]);
        }
        assert_eq!(buf, [7, 8, 0]);
    }

    #[test]
    fn boxed_buffer() {
        let mut s = RestorableStack::with_capacity(2, u32::MAX);
        s.push(1).unwrap();
        s.push(2).unwrap();
        assert!(matches!(s.push(3), Err(StackError::Overflow { capacity: 2 })));
    }

    #[test]
    fn overflow_on_jump_leaves_state_intact() {
        let mut s: InlineStack<char, 2> = RestorableStack::inline(NULL);
        s.push('A').unwrap();
        s.push('B').unwrap();
        s.save().unwrap();
        s.pop().unwrap();
        assert!(matches!(s.push('C'), Err(StackError::Overflow { .. })));
        assert_eq!(s.size(), 1);
        s.restore().unwrap();
        assert_eq!(contents(&s), "BA");
    }
}
