//! Element types and byte order - how raw bytes become numbers.
//!
//! Container metadata declares element types with short string tokens
//! (`u16`, `uint32`, `dbl`, ...) and byte order with MATLAB-style machine
//! format tokens (`ieee-le`, `ieee-be`, ...). Both resolvers live here so
//! every backend interprets the tokens the same way.

use tracing::warn;

use super::{Error, Result};

/// Fixed-width numeric element type of a dataset.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ElementType {
    Uint8,
    Int8,
    Uint16,
    Int16,
    #[default]
    Uint32,
    Int32,
    Uint64,
    Int64,
    Float32,
    Float64,
}

impl ElementType {
    /// Returns the size in bytes of a single element of this type.
    #[inline]
    pub const fn num_bytes(self) -> usize {
        match self {
            Self::Uint8 | Self::Int8 => 1,
            Self::Uint16 | Self::Int16 => 2,
            Self::Uint32 | Self::Int32 | Self::Float32 => 4,
            Self::Uint64 | Self::Int64 | Self::Float64 => 8,
        }
    }

    /// Canonical token for this type, usable in headers.
    #[inline]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Uint8 => "uint8",
            Self::Int8 => "int8",
            Self::Uint16 => "uint16",
            Self::Int16 => "int16",
            Self::Uint32 => "uint32",
            Self::Int32 => "int32",
            Self::Uint64 => "uint64",
            Self::Int64 => "int64",
            Self::Float32 => "single",
            Self::Float64 => "double",
        }
    }

    /// Resolve a dtype token to an element type, if it is a known alias.
    ///
    /// The alias set is closed. `float` maps to single precision: volumes
    /// tend to be large, so the unspecific token gets the narrow type.
    pub fn try_resolve(token: &str) -> Option<Self> {
        match token {
            "u8" | "uint8" => Some(Self::Uint8),
            "i8" | "int8" => Some(Self::Int8),
            "u16" | "uint16" => Some(Self::Uint16),
            "i16" | "int16" => Some(Self::Int16),
            "u32" | "uint32" => Some(Self::Uint32),
            "i32" | "int32" => Some(Self::Int32),
            "u64" | "uint64" => Some(Self::Uint64),
            "i64" | "int64" => Some(Self::Int64),
            "sgl" | "single" | "float" => Some(Self::Float32),
            "dbl" | "double" => Some(Self::Float64),
            _ => None,
        }
    }

    /// Total resolution: unknown or empty tokens warn and default to
    /// unsigned 32-bit. This never fails; [`ElementType::try_resolve`] is
    /// the strict form.
    pub fn resolve(token: &str) -> Self {
        Self::try_resolve(token).unwrap_or_else(|| {
            warn!("dtype token {:?} is invalid or empty; defaulting to uint32", token);
            Self::Uint32
        })
    }

    #[inline]
    pub const fn is_integer(self) -> bool {
        !matches!(self, Self::Float32 | Self::Float64)
    }

    #[inline]
    pub const fn is_float(self) -> bool {
        matches!(self, Self::Float32 | Self::Float64)
    }
}

impl std::fmt::Display for ElementType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Endianness of on-disk element data.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ByteOrder {
    #[default]
    Little,
    Big,
}

impl ByteOrder {
    /// Canonical machine-format token.
    #[inline]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Little => "ieee-le",
            Self::Big => "ieee-be",
        }
    }

    /// Resolve a machine-format token. Exactly six tokens are accepted;
    /// anything else is fatal - unlike dtype resolution there is no default
    /// here, a wrong guess silently corrupts every multi-byte element.
    pub fn resolve(token: &str) -> Result<Self> {
        match token {
            "ieee-le" | "little-endian" | "le" => Ok(Self::Little),
            "ieee-be" | "big-endian" | "be" => Ok(Self::Big),
            _ => Err(Error::InvalidByteOrder(token.to_string())),
        }
    }
}

impl std::fmt::Display for ByteOrder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}
