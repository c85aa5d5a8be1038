use serde::{Deserialize, Serialize};

/// Hash of a variable name as it appears in compiled story bytecode.
///
/// `NameHash::INVALID` never comes out of [`hash_name`]; the call stack uses it
/// to mark the base of a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NameHash(pub u32);

impl NameHash {
    pub const INVALID: NameHash = NameHash(0);

    #[inline]
    pub fn is_valid(self) -> bool {
        self != NameHash::INVALID
    }
}

const FNV_OFFSET: u32 = 0x811c_9dc5;
const FNV_PRIME: u32 = 0x0100_0193;

/// 32-bit FNV-1a over the UTF-8 bytes of `name`.
pub fn hash_name(name: &str) -> NameHash {
    let mut h = FNV_OFFSET;
    for b in name.bytes() {
        h ^= b as u32;
        h = h.wrapping_mul(FNV_PRIME);
    }
    // 0 is reserved for frame boundaries
    if h == 0 { NameHash(1) } else { NameHash(h) }
}

impl From<&str> for NameHash {
    fn from(name: &str) -> Self {
        hash_name(name)
    }
}
