use std::cmp::Ordering;
use std::fmt::{self, Debug, Display};

use num_bigint::BigInt;
use num_traits::{NumCast, Signed, ToPrimitive};

#[derive(Clone, Debug, PartialEq, Eq)]
enum IntRepr {
    /// Any value representable as `i64`.
    Small(i64),
    /// Always outside the `i64` range.
    Big(BigInt),
}

/// A signed arbitrary-precision Bencodex integer.
///
/// Values within the `i64` range are kept inline; anything larger falls back
/// to a heap-allocated big integer. A `Value` containing an integer can be
/// constructed through the `From` trait.
#[derive(Clone, PartialEq, Eq)]
pub struct Integer {
    n: IntRepr,
}

impl Integer {
    /// Returns `true` if the integer is zero.
    #[inline]
    pub fn is_zero(&self) -> bool {
        matches!(self.n, IntRepr::Small(0))
    }

    /// Returns `true` if the integer is less than zero.
    #[inline]
    pub fn is_negative(&self) -> bool {
        match &self.n {
            IntRepr::Small(n) => *n < 0,
            IntRepr::Big(n) => n.is_negative(),
        }
    }

    /// Returns `true` if the integer can be represented as `i64`.
    #[inline]
    pub fn is_i64(&self) -> bool {
        matches!(self.n, IntRepr::Small(_))
    }

    /// Returns `true` if the integer can be represented as `u64`.
    #[inline]
    pub fn is_u64(&self) -> bool {
        self.as_u64().is_some()
    }

    /// Returns the integer represented as `i64` if possible, or else `None`.
    #[inline]
    pub fn as_i64(&self) -> Option<i64> {
        match &self.n {
            IntRepr::Small(n) => Some(*n),
            IntRepr::Big(_) => None,
        }
    }

    /// Returns the integer represented as `u64` if possible, or else `None`.
    #[inline]
    pub fn as_u64(&self) -> Option<u64> {
        match &self.n {
            IntRepr::Small(n) => u64::try_from(*n).ok(),
            IntRepr::Big(n) => n.to_u64(),
        }
    }

    /// Returns the integer as a freshly-built `BigInt`.
    pub fn to_bigint(&self) -> BigInt {
        match &self.n {
            IntRepr::Small(n) => BigInt::from(*n),
            IntRepr::Big(n) => n.clone(),
        }
    }

    /// Decimal digits of the absolute value, without sign.
    ///
    /// This is the byte run the encoder writes between the sign and the
    /// integer suffix.
    pub(crate) fn abs_decimal(&self) -> String {
        match &self.n {
            IntRepr::Small(n) => n.unsigned_abs().to_string(),
            IntRepr::Big(n) => n.magnitude().to_str_radix(10),
        }
    }

    /// Exact count of decimal digits in the absolute value.
    pub(crate) fn decimal_digits(&self) -> usize {
        match &self.n {
            IntRepr::Small(0) => 1,
            IntRepr::Small(n) => (n.unsigned_abs().ilog10() + 1) as usize,
            IntRepr::Big(n) => n.magnitude().to_str_radix(10).len(),
        }
    }

    /// Upper bound on [`decimal_digits`](Self::decimal_digits) that avoids
    /// rendering big integers: `digits <= bits / 3 + 1` since
    /// `log10(2) < 1/3`.
    pub(crate) fn decimal_digits_bound(&self) -> usize {
        match &self.n {
            IntRepr::Small(_) => self.decimal_digits(),
            IntRepr::Big(n) => (n.magnitude().bits() / 3 + 1) as usize,
        }
    }
}

impl Default for Integer {
    fn default() -> Self {
        Self {
            n: IntRepr::Small(0),
        }
    }
}

impl Ord for Integer {
    fn cmp(&self, other: &Integer) -> Ordering {
        match (&self.n, &other.n) {
            (IntRepr::Small(lhs), IntRepr::Small(rhs)) => lhs.cmp(rhs),
            (IntRepr::Big(lhs), IntRepr::Big(rhs)) => lhs.cmp(rhs),
            // A Big value is always outside the i64 range, so its sign alone
            // settles the comparison against any Small value.
            (IntRepr::Small(_), IntRepr::Big(rhs)) => {
                if rhs.is_negative() {
                    Ordering::Greater
                } else {
                    Ordering::Less
                }
            }
            (IntRepr::Big(lhs), IntRepr::Small(_)) => {
                if lhs.is_negative() {
                    Ordering::Less
                } else {
                    Ordering::Greater
                }
            }
        }
    }
}

impl PartialOrd for Integer {
    fn partial_cmp(&self, other: &Integer) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Debug for Integer {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        Debug::fmt(&self.n, fmt)
    }
}

impl Display for Integer {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        match &self.n {
            IntRepr::Small(n) => Display::fmt(n, fmt),
            IntRepr::Big(n) => Display::fmt(n, fmt),
        }
    }
}

impl From<BigInt> for Integer {
    fn from(n: BigInt) -> Self {
        match n.to_i64() {
            Some(small) => Integer {
                n: IntRepr::Small(small),
            },
            None => Integer { n: IntRepr::Big(n) },
        }
    }
}

macro_rules! impl_from_small {
    ($t: ty) => {
        impl From<$t> for Integer {
            fn from(n: $t) -> Self {
                Integer {
                    n: IntRepr::Small(n as i64),
                }
            }
        }
    };
}

macro_rules! impl_from_wide {
    ($t: ty) => {
        impl From<$t> for Integer {
            fn from(n: $t) -> Self {
                match i64::try_from(n) {
                    Ok(small) => Integer {
                        n: IntRepr::Small(small),
                    },
                    Err(_) => Integer {
                        n: IntRepr::Big(BigInt::from(n)),
                    },
                }
            }
        }
    };
}

impl_from_small!(u8);
impl_from_small!(u16);
impl_from_small!(u32);
impl_from_small!(i8);
impl_from_small!(i16);
impl_from_small!(i32);
impl_from_small!(i64);
impl_from_wide!(u64);
impl_from_wide!(usize);
impl_from_wide!(isize);
impl_from_wide!(u128);
impl_from_wide!(i128);

macro_rules! impl_try_from {
    ($t: ty) => {
        impl TryFrom<Integer> for $t {
            type Error = Integer;
            fn try_from(v: Integer) -> Result<Self, Self::Error> {
                let cast = match &v.n {
                    IntRepr::Small(n) => <$t as NumCast>::from(*n),
                    IntRepr::Big(n) => n
                        .to_i128()
                        .and_then(<$t as NumCast>::from)
                        .or_else(|| n.to_u128().and_then(<$t as NumCast>::from)),
                };
                cast.ok_or(v)
            }
        }
    };
}

impl_try_from!(u8);
impl_try_from!(u16);
impl_try_from!(u32);
impl_try_from!(u64);
impl_try_from!(u128);
impl_try_from!(usize);
impl_try_from!(i8);
impl_try_from!(i16);
impl_try_from!(i32);
impl_try_from!(i64);
impl_try_from!(i128);
impl_try_from!(isize);

use serde::{
    de::{Deserialize, Deserializer},
    ser::{Error as _, Serialize, Serializer},
};

impl Serialize for Integer {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match &self.n {
            IntRepr::Small(n) => serializer.serialize_i64(*n),
            IntRepr::Big(n) => {
                if let Some(v) = n.to_u64() {
                    serializer.serialize_u64(v)
                } else if let Some(v) = n.to_i128() {
                    serializer.serialize_i128(v)
                } else if let Some(v) = n.to_u128() {
                    serializer.serialize_u128(v)
                } else {
                    Err(S::Error::custom("integer exceeds 128 bits"))
                }
            }
        }
    }
}

impl<'de> Deserialize<'de> for Integer {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct IntVisitor;
        impl<'de> serde::de::Visitor<'de> for IntVisitor {
            type Value = Integer;

            fn expecting(&self, fmt: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
                write!(fmt, "an integer")
            }

            fn visit_i64<E: serde::de::Error>(self, v: i64) -> Result<Self::Value, E> {
                Ok(Integer::from(v))
            }

            fn visit_u64<E: serde::de::Error>(self, v: u64) -> Result<Self::Value, E> {
                Ok(Integer::from(v))
            }

            fn visit_i128<E: serde::de::Error>(self, v: i128) -> Result<Self::Value, E> {
                Ok(Integer::from(v))
            }

            fn visit_u128<E: serde::de::Error>(self, v: u128) -> Result<Self::Value, E> {
                Ok(Integer::from(v))
            }
        }

        deserializer.deserialize_any(IntVisitor)
    }
}
