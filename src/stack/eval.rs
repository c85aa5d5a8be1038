use super::{Iter, RestorableStack, StackResult};
use crate::strings::StringTable;
use crate::value::Value;

/// Expression evaluation stack. `Value::None` is the reserved null, so slots
/// tombstoned by `forget()` are skipped by `pop()` and iteration.
#[derive(Debug)]
pub struct EvalStack<S = Box<[Value]>> {
    stack: RestorableStack<Value, S>,
}

impl EvalStack<Box<[Value]>> {
    pub fn with_capacity(capacity: usize) -> Self {
        EvalStack { stack: RestorableStack::with_capacity(capacity, Value::None) }
    }
}

impl<const N: usize> EvalStack<[Value; N]> {
    pub fn inline() -> Self {
        EvalStack { stack: RestorableStack::inline(Value::None) }
    }
}

impl<S: AsRef<[Value]> + AsMut<[Value]>> EvalStack<S> {
    pub fn new(buffer: S) -> Self {
        EvalStack { stack: RestorableStack::new(buffer, Value::None) }
    }

    pub fn push(&mut self, value: Value) -> StackResult<()> {
        self.stack.push(value)
    }

    pub fn pop(&mut self) -> StackResult<Value> {
        self.stack.pop()
    }

    pub fn top(&self) -> StackResult<&Value> {
        self.stack.top()
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

    pub fn clear(&mut self) -> StackResult<()> {
        self.stack.clear()
    }

    pub fn reset(&mut self) {
        self.stack.reset()
    }

    pub fn iter(&self) -> Iter<'_, Value, S> {
        self.stack.iter()
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

    pub fn mark_strings(&self, strings: &mut StringTable) {
        for v in self.stack.live() {
            v.mark_strings(strings);
        }
    }
}
