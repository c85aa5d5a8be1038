use serde::{Deserialize, Serialize};

use crate::config::{ConfigError, StackConfig};
use crate::stack::{CallStack, EvalStack, RestorableStack, StackError, StackResult};
use crate::strings::StringTable;

/// Index of a container in the compiled story.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContainerId(pub u32);

impl ContainerId {
    pub const NONE: ContainerId = ContainerId(u32::MAX);
}

/// The mutable stacks of one running story: call frames and variables,
/// expression values, and the containers currently entered.
///
/// Snapshots are taken across all three at once, so speculative execution
/// rolls back or commits everything it touched together.
#[derive(Debug)]
pub struct ExecutionContext {
    calls: CallStack,
    eval: EvalStack,
    containers: RestorableStack<ContainerId>,
}

impl ExecutionContext {
    pub fn new(config: &StackConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        log::debug!(
            "execution context: call {}, eval {}, container {}",
            config.call_stack_size, config.eval_stack_size, config.container_stack_size,
        );
        Ok(ExecutionContext {
            calls: CallStack::with_capacity(config.call_stack_size),
            eval: EvalStack::with_capacity(config.eval_stack_size),
            containers: RestorableStack::with_capacity(config.container_stack_size, ContainerId::NONE),
        })
    }

    pub fn calls(&self) -> &CallStack {
        &self.calls
    }

    pub fn calls_mut(&mut self) -> &mut CallStack {
        &mut self.calls
    }

    pub fn eval(&self) -> &EvalStack {
        &self.eval
    }

    pub fn eval_mut(&mut self) -> &mut EvalStack {
        &mut self.eval
    }

    // ── Containers ───────────────────────────────────────────────────

    pub fn enter_container(&mut self, id: ContainerId) -> StackResult<()> {
        self.containers.push(id)
    }

    pub fn leave_container(&mut self) -> StackResult<ContainerId> {
        self.containers.pop()
    }

    pub fn current_container(&self) -> Option<ContainerId> {
        self.containers.top().ok().copied()
    }

    pub fn container_depth(&self) -> usize {
        self.containers.size()
    }

    // ── Snapshots ────────────────────────────────────────────────────

    pub fn has_snapshot(&self) -> bool {
        self.calls.has_snapshot() || self.eval.has_snapshot() || self.containers.has_snapshot()
    }

    fn all_saved(&self) -> bool {
        self.calls.has_snapshot() && self.eval.has_snapshot() && self.containers.has_snapshot()
    }

    pub fn save(&mut self) -> StackResult<()> {
        if self.has_snapshot() {
            return Err(StackError::InvalidState("can not save context twice; restore() or forget() first"));
        }
        self.calls.save()?;
        self.eval.save()?;
        self.containers.save()?;
        log::debug!("context saved");
        Ok(())
    }

    pub fn restore(&mut self) -> StackResult<()> {
        if !self.all_saved() {
            return Err(StackError::InvalidState("can not restore() context without a save on every stack"));
        }
        self.calls.restore()?;
        self.eval.restore()?;
        self.containers.restore()?;
        log::debug!("context restored");
        Ok(())
    }

    pub fn forget(&mut self) -> StackResult<()> {
        if !self.all_saved() {
            return Err(StackError::InvalidState("can not forget() context without a save on every stack"));
        }
        self.calls.forget()?;
        self.eval.forget()?;
        self.containers.forget()?;
        log::debug!("context save forgotten");
        Ok(())
    }

    /// Mark every string reachable from this context, then sweep the table.
    /// Returns the number of strings freed.
    pub fn collect_garbage(&self, strings: &mut StringTable) -> usize {
        self.calls.mark_strings(strings);
        self.eval.mark_strings(strings);
        strings.gc()
    }

    /// Drop all state, any outstanding save included.
    pub fn reset(&mut self) {
        self.calls.reset();
        self.eval.reset();
        self.containers.reset();
    }
}
