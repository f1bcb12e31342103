//! Scalar value types of the SVD schema and their text parsers.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Errors produced while parsing a scalar token.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScalarError {
    /// Digits do not form a non-negative integer in the detected radix.
    #[error("invalid base-{radix} integer")]
    InvalidInteger { radix: u32 },
    /// Shift is not one of the k/M/G/T multipliers.
    #[error("unsupported shift {shift}")]
    UnsupportedShift { shift: u32 },
    /// Scaled value exceeds 64 bits.
    #[error("value {base} << {shift} does not fit 64 bits")]
    Overflow { base: u64, shift: u32 },
    #[error("expected a bit range of the form [<msb>:<lsb>]")]
    BitRangeSyntax,
    #[error("bit range has zero width")]
    ZeroWidth,
    #[error("expected one of 1, true, 0, false")]
    Boolean,
    #[error("unknown access token")]
    Access,
    #[error("not a valid identifier")]
    Identifier,
}

const SHIFTS: [u32; 5] = [0, 10, 20, 30, 40];

/// Non-negative magnitude optionally written with a k/M/G/T suffix.
///
/// Equality, ordering and hashing use [`value`](Self::value) only; the shift
/// is kept to remember how the number was written.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScaledNonNegativeInteger {
    base: u64,
    shift: u32,
}

impl ScaledNonNegativeInteger {
    /// Build `base << shift`, where `shift` is 0, 10, 20, 30 or 40.
    pub fn new(base: u64, shift: u32) -> Result<Self, ScalarError> {
        if !SHIFTS.contains(&shift) {
            return Err(ScalarError::UnsupportedShift { shift });
        }
        if base.leading_zeros() < shift {
            return Err(ScalarError::Overflow { base, shift });
        }
        Ok(Self { base, shift })
    }

    pub fn base(&self) -> u64 {
        self.base
    }

    pub fn shift(&self) -> u32 {
        self.shift
    }

    /// The logical magnitude `base << shift`.
    pub fn value(&self) -> u64 {
        self.base << self.shift
    }

    /// Suffix the value was written with, if any.
    pub fn suffix(&self) -> Option<char> {
        match self.shift {
            10 => Some('k'),
            20 => Some('M'),
            30 => Some('G'),
            40 => Some('T'),
            _ => None,
        }
    }
}

impl From<u64> for ScaledNonNegativeInteger {
    fn from(value: u64) -> Self {
        Self {
            base: value,
            shift: 0,
        }
    }
}

impl PartialEq for ScaledNonNegativeInteger {
    fn eq(&self, other: &Self) -> bool {
        self.value() == other.value()
    }
}

impl Eq for ScaledNonNegativeInteger {}

impl std::hash::Hash for ScaledNonNegativeInteger {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.value().hash(state);
    }
}

impl PartialOrd for ScaledNonNegativeInteger {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ScaledNonNegativeInteger {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.value().cmp(&other.value())
    }
}

impl FromStr for ScaledNonNegativeInteger {
    type Err = ScalarError;

    fn from_str(token: &str) -> Result<Self, Self::Err> {
        let lowered = token.to_ascii_lowercase();
        let mut digits = lowered.as_str();

        let shift = match digits.chars().last() {
            Some('k') => 10,
            Some('m') => 20,
            Some('g') => 30,
            Some('t') => 40,
            _ => 0,
        };
        if shift != 0 {
            digits = &digits[..digits.len() - 1];
        }

        let radix = if let Some(rest) = digits.strip_prefix("0x") {
            digits = rest;
            16
        } else if let Some(rest) = digits.strip_prefix("0b") {
            digits = rest;
            2
        } else if let Some(rest) = digits.strip_prefix('#') {
            digits = rest;
            2
        } else {
            10
        };

        let base = u64::from_str_radix(digits, radix)
            .map_err(|_| ScalarError::InvalidInteger { radix })?;
        Self::new(base, shift)
    }
}

impl fmt::Display for ScaledNonNegativeInteger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = self.value();
        if value < 0x1_0000 {
            write!(f, "0x{value:04x}")
        } else {
            write!(f, "0x{value:08x}")
        }
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for ScaledNonNegativeInteger {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(self.value())
    }
}

/// Inclusive `[msb:lsb]` span of register bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct BitRange {
    pub lsb: u32,
    pub msb: u32,
}

impl BitRange {
    pub fn new(lsb: u32, msb: u32) -> Self {
        Self { lsb, msb }
    }

    /// Range starting at bit `offset` spanning `width` bits.
    pub fn from_offset_width(offset: u32, width: u32) -> Result<Self, ScalarError> {
        if width == 0 {
            return Err(ScalarError::ZeroWidth);
        }
        let msb = offset
            .checked_add(width - 1)
            .ok_or(ScalarError::BitRangeSyntax)?;
        Ok(Self { lsb: offset, msb })
    }

    /// Number of bits covered; zero when `msb < lsb`.
    pub fn count(&self) -> u32 {
        self.msb.saturating_add(1).saturating_sub(self.lsb)
    }

    /// Mask selecting the range within a 64-bit register value.
    pub fn mask(&self) -> u64 {
        let count = self.count();
        let ones = if count >= 64 {
            u64::MAX
        } else {
            (1u64 << count) - 1
        };
        ones.checked_shl(self.lsb).unwrap_or(0)
    }
}

impl FromStr for BitRange {
    type Err = ScalarError;

    fn from_str(token: &str) -> Result<Self, Self::Err> {
        let inner = token
            .strip_prefix('[')
            .and_then(|rest| rest.strip_suffix(']'))
            .ok_or(ScalarError::BitRangeSyntax)?;
        let (msb, lsb) = inner.split_once(':').ok_or(ScalarError::BitRangeSyntax)?;
        let msb = msb.parse().map_err(|_| ScalarError::BitRangeSyntax)?;
        let lsb = lsb.parse().map_err(|_| ScalarError::BitRangeSyntax)?;
        Ok(Self { lsb, msb })
    }
}

impl fmt::Display for BitRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}:{}]", self.msb, self.lsb)
    }
}

/// Parse an SVD boolean token.
pub fn parse_bool(token: &str) -> Result<bool, ScalarError> {
    match token.to_ascii_lowercase().as_str() {
        "1" | "true" => Ok(true),
        "0" | "false" => Ok(false),
        _ => Err(ScalarError::Boolean),
    }
}

/// Predefined access rights of registers and fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum Access {
    #[cfg_attr(feature = "serde", serde(rename = "read-only"))]
    ReadOnly,
    #[cfg_attr(feature = "serde", serde(rename = "write-only"))]
    WriteOnly,
    #[cfg_attr(feature = "serde", serde(rename = "read-write"))]
    ReadWrite,
    /// Only the first write after reset takes effect; reads are undefined.
    #[cfg_attr(feature = "serde", serde(rename = "writeOnce"))]
    WriteOnce,
    /// Reads are permitted; only the first write after reset takes effect.
    #[cfg_attr(feature = "serde", serde(rename = "read-writeOnce"))]
    ReadWriteOnce,
}

impl Access {
    /// Token used for this access in SVD files.
    pub fn as_str(&self) -> &'static str {
        match self {
            Access::ReadOnly => "read-only",
            Access::WriteOnly => "write-only",
            Access::ReadWrite => "read-write",
            Access::WriteOnce => "writeOnce",
            Access::ReadWriteOnce => "read-writeOnce",
        }
    }

    pub fn is_readable(&self) -> bool {
        !matches!(self, Access::WriteOnly | Access::WriteOnce)
    }

    pub fn is_writable(&self) -> bool {
        !matches!(self, Access::ReadOnly)
    }
}

impl FromStr for Access {
    type Err = ScalarError;

    fn from_str(token: &str) -> Result<Self, Self::Err> {
        match token {
            "read-only" => Ok(Access::ReadOnly),
            "write-only" => Ok(Access::WriteOnly),
            "read-write" => Ok(Access::ReadWrite),
            "writeOnce" => Ok(Access::WriteOnce),
            "read-writeOnce" => Ok(Access::ReadWriteOnce),
            _ => Err(ScalarError::Access),
        }
    }
}

impl fmt::Display for Access {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A string that is a legal bare identifier: `[A-Za-z_][A-Za-z0-9_]*`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize), serde(transparent))]
pub struct Identifier(String);

impl Identifier {
    pub fn new(raw: impl Into<String>) -> Result<Self, ScalarError> {
        let raw = raw.into();
        let mut chars = raw.chars();
        let valid_start = chars
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
        if !valid_start || !chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(ScalarError::Identifier);
        }
        Ok(Self(raw))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl FromStr for Identifier {
    type Err = ScalarError;

    fn from_str(token: &str) -> Result<Self, Self::Err> {
        Self::new(token)
    }
}

impl AsRef<str> for Identifier {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for Identifier {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for Identifier {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
