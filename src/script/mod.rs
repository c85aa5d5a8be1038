//! JSON operation scripts replayed against an [`ExecutionContext`].
//!
//! Used by the `storyvm` binary to reproduce stack behaviour outside a
//! running story.

use serde::Deserialize;

use crate::context::ExecutionContext;
use crate::hash::hash_name;
use crate::stack::StackError;
use crate::value::{FrameKind, Offset, Value};

#[derive(Debug, thiserror::Error)]
pub enum ScriptError {
    #[error("invalid script: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("op {index} ({op}): {source}")]
    Step {
        index: usize,
        op: &'static str,
        #[source]
        source: StackError,
    },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Target {
    #[default]
    Eval,
    Call,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Op {
    Push { value: Value },
    Pop,
    Top,
    Set { name: String, value: Value },
    Get { name: String },
    PushFrame { return_to: Offset, kind: FrameKind },
    PopFrame,
    HasFrame,
    /// Without `stack`, applies to the whole context.
    Save { #[serde(default)] stack: Option<Target> },
    Restore { #[serde(default)] stack: Option<Target> },
    Forget { #[serde(default)] stack: Option<Target> },
    Size { #[serde(default)] stack: Target },
    Dump { #[serde(default)] stack: Target },
    Clear { #[serde(default)] stack: Target },
}

impl Op {
    pub fn name(&self) -> &'static str {
        match self {
            Op::Push { .. } => "push",
            Op::Pop => "pop",
            Op::Top => "top",
            Op::Set { .. } => "set",
            Op::Get { .. } => "get",
            Op::PushFrame { .. } => "push_frame",
            Op::PopFrame => "pop_frame",
            Op::HasFrame => "has_frame",
            Op::Save { .. } => "save",
            Op::Restore { .. } => "restore",
            Op::Forget { .. } => "forget",
            Op::Size { .. } => "size",
            Op::Dump { .. } => "dump",
            Op::Clear { .. } => "clear",
        }
    }
}

pub fn parse(src: &str) -> Result<Vec<Op>, ScriptError> {
    Ok(serde_json::from_str(src)?)
}

fn kind_name(kind: FrameKind) -> &'static str {
    match kind {
        FrameKind::Tunnel => "tunnel",
        FrameKind::Function => "function",
    }
}

fn join<I: Iterator<Item = String>>(items: I) -> String {
    format!("[{}]", items.collect::<Vec<_>>().join(", "))
}

/// Apply one operation. Returns the line to print, if the op produces one.
pub fn execute(ctx: &mut ExecutionContext, op: &Op) -> Result<Option<String>, StackError> {
    let out = match op {
        Op::Push { value } => {
            ctx.eval_mut().push(*value)?;
            None
        }
        Op::Pop => Some(ctx.eval_mut().pop()?.to_string()),
        Op::Top => Some(ctx.eval().top()?.to_string()),
        Op::Set { name, value } => {
            ctx.calls_mut().set(hash_name(name), *value)?;
            None
        }
        Op::Get { name } => Some(match ctx.calls().get(hash_name(name)) {
            Some(v) => v.to_string(),
            None => "not found".to_string(),
        }),
        Op::PushFrame { return_to, kind } => {
            ctx.calls_mut().push_frame(*return_to, *kind)?;
            None
        }
        Op::PopFrame => {
            let (ret, kind) = ctx.calls_mut().pop_frame()?;
            Some(format!("{} {}", ret, kind_name(kind)))
        }
        Op::HasFrame => Some(ctx.calls().has_frame().to_string()),
        Op::Save { stack } => {
            match stack {
                None => ctx.save()?,
                Some(Target::Eval) => ctx.eval_mut().save()?,
                Some(Target::Call) => ctx.calls_mut().save()?,
            }
            None
        }
        Op::Restore { stack } => {
            match stack {
                None => ctx.restore()?,
                Some(Target::Eval) => ctx.eval_mut().restore()?,
                Some(Target::Call) => ctx.calls_mut().restore()?,
            }
            None
        }
        Op::Forget { stack } => {
            match stack {
                None => ctx.forget()?,
                Some(Target::Eval) => ctx.eval_mut().forget()?,
                Some(Target::Call) => ctx.calls_mut().forget()?,
            }
            None
        }
        Op::Size { stack } => Some(match stack {
            Target::Eval => ctx.eval().size(),
            Target::Call => ctx.calls().size(),
        }.to_string()),
        Op::Dump { stack } => Some(match stack {
            Target::Eval => join(ctx.eval().iter().map(|v| v.to_string())),
            Target::Call => join(ctx.calls().iter().map(|e| e.to_string())),
        }),
        Op::Clear { stack } => {
            match stack {
                Target::Eval => ctx.eval_mut().clear()?,
                Target::Call => ctx.calls_mut().clear()?,
            }
            None
        }
    };
    Ok(out)
}

/// Run `ops` in order, handing each output line to `emit`. Stops at the
/// first failing operation.
pub fn run(
    ctx: &mut ExecutionContext,
    ops: &[Op],
    mut emit: impl FnMut(&str),
) -> Result<(), ScriptError> {
    for (index, op) in ops.iter().enumerate() {
        log::trace!("op {}: {:?}", index, op);
        let line = execute(ctx, op).map_err(|source| ScriptError::Step { index, op: op.name(), source })?;
        if let Some(line) = line {
            emit(&line);
        }
    }
    Ok(())
}
