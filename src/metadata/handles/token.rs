use std::fmt;

use crate::{
    metadata::handles::{
        EntityHandle, Handle, HandleKind, HeapKind, UserStringHandle, ROW_ID_MASK,
    },
    Error, Result,
};

/// A 32-bit metadata token as it appears in IL instruction streams and signatures
///
/// The high byte is the token type (the table number, or `0x70` for user strings), the low
/// 24 bits are the row id or `#US` offset. This is the serialization form of
/// [`EntityHandle`] and [`UserStringHandle`], virtual handles have no token.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Token(pub u32);

impl Token {
    /// Create a token from its raw value
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Token(value)
    }

    /// The raw value
    #[must_use]
    pub const fn value(&self) -> u32 {
        self.0
    }

    /// The token type byte
    #[must_use]
    pub const fn table(&self) -> u8 {
        (self.0 >> 24) as u8
    }

    /// The row id or heap offset
    #[must_use]
    pub const fn row(&self) -> u32 {
        self.0 & ROW_ID_MASK
    }

    /// Returns `true` if the row / offset part is zero
    #[must_use]
    pub const fn is_null(&self) -> bool {
        self.row() == 0
    }
}

impl From<u32> for Token {
    fn from(value: u32) -> Self {
        Token(value)
    }
}

impl From<Token> for u32 {
    fn from(token: Token) -> Self {
        token.0
    }
}

impl TryFrom<Token> for Handle {
    type Error = Error;

    fn try_from(token: Token) -> Result<Self> {
        if token.table() == HeapKind::UserString as u8 {
            return Handle::new(HandleKind::Heap(HeapKind::UserString), token.row());
        }
        Ok(Handle::from(EntityHandle::try_from(token)?))
    }
}

impl TryFrom<Token> for EntityHandle {
    type Error = Error;

    fn try_from(token: Token) -> Result<Self> {
        if token.0 & 0x8000_0000 != 0 {
            return Err(Error::InvalidHandle(format!("{token} is not a table token")));
        }
        EntityHandle::from_raw(token.0)
    }
}

impl TryFrom<EntityHandle> for Token {
    type Error = Error;

    fn try_from(handle: EntityHandle) -> Result<Self> {
        if handle.is_virtual() {
            return Err(Error::InvalidCast {
                from: handle.kind(),
                to: "Token",
            });
        }
        Ok(Token(handle.raw()))
    }
}

impl TryFrom<Handle> for Token {
    type Error = Error;

    fn try_from(handle: Handle) -> Result<Self> {
        match handle.kind() {
            HandleKind::Heap(HeapKind::UserString) => {
                Ok(Token::from(UserStringHandle::try_from(handle)?))
            }
            HandleKind::Heap(_) => Err(Error::InvalidCast {
                from: handle.kind(),
                to: "Token",
            }),
            HandleKind::Table(_) => Token::try_from(EntityHandle::try_from(handle)?),
        }
    }
}

impl From<UserStringHandle> for Token {
    fn from(handle: UserStringHandle) -> Self {
        Token((u32::from(HeapKind::UserString as u8) << 24) | handle.offset())
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Token(0x{:08x}, table: 0x{:02x}, row: {})",
            self.0,
            self.table(),
            self.row()
        )
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:08x}", self.0)
    }
}
