pub mod config;
pub mod context;
pub mod hash;
pub mod script;
pub mod stack;
pub mod strings;
pub mod value;

pub use config::StackConfig;
pub use context::{ContainerId, ExecutionContext};
pub use hash::{NameHash, hash_name};
pub use stack::{CallStack, Cursor, EvalStack, InlineStack, RestorableStack, StackError, StackResult};
pub use strings::{StringId, StringTable};
pub use value::{FrameKind, Offset, Value};
