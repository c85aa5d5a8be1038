use serde::{Deserialize, Serialize};

use crate::strings::{StringId, StringTable};

/// Location in the story's instruction stream.
pub type Offset = u32;

/// How a frame was entered, which decides how a diversion returns from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FrameKind {
    Tunnel,
    Function,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Value {
    /// Reserved. Never pushed as data; marks forgotten slots.
    #[default]
    None,
    Int(i32),
    Float(f32),
    Bool(bool),
    Str(StringId),
    Divert(Offset),
    TunnelFrame(Offset),
    FunctionFrame(Offset),
}

impl Value {
    #[inline]
    pub fn is_none(&self) -> bool {
        matches!(self, Value::None)
    }

    pub fn frame(return_to: Offset, kind: FrameKind) -> Self {
        match kind {
            FrameKind::Tunnel => Value::TunnelFrame(return_to),
            FrameKind::Function => Value::FunctionFrame(return_to),
        }
    }

    /// Split a frame record back into its return offset and kind.
    pub fn as_frame(&self) -> Option<(Offset, FrameKind)> {
        match *self {
            Value::TunnelFrame(o) => Some((o, FrameKind::Tunnel)),
            Value::FunctionFrame(o) => Some((o, FrameKind::Function)),
            _ => None,
        }
    }

    pub fn mark_strings(&self, strings: &mut StringTable) {
        if let Value::Str(id) = *self {
            strings.mark_used(id);
        }
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::None => write!(f, "none"),
            Value::Int(n) => write!(f, "{}", n),
            Value::Float(n) => write!(f, "{}", n),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Str(id) => write!(f, "str#{}", id.0),
            Value::Divert(o) => write!(f, "-> {}", o),
            Value::TunnelFrame(o) => write!(f, "tunnel(ret {})", o),
            Value::FunctionFrame(o) => write!(f, "function(ret {})", o),
        }
    }
}
