//! 128- and 256-bit integer encoding.
//!
//! Every accepted native form is first widened into a 32-byte big-endian
//! two's-complement buffer, then split into the XDR parts of the target
//! width.

use primitive_types::U256;
use stellar_xdr::curr::{Int128Parts, Int256Parts, ScVal, UInt128Parts, UInt256Parts};

use crate::error::{EncodingError, Result, SpecError};
use crate::native::NativeValue;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum IntWidth {
    U128,
    I128,
    U256,
    I256,
}

impl IntWidth {
    fn byte_len(self) -> usize {
        match self {
            IntWidth::U128 | IntWidth::I128 => 16,
            IntWidth::U256 | IntWidth::I256 => 32,
        }
    }

    fn signed(self) -> bool {
        matches!(self, IntWidth::I128 | IntWidth::I256)
    }

    fn name(self) -> &'static str {
        match self {
            IntWidth::U128 => "u128",
            IntWidth::I128 => "i128",
            IntWidth::U256 => "U256",
            IntWidth::I256 => "I256",
        }
    }
}

type Buf = [u8; 32];

pub(crate) fn to_wire(value: &NativeValue, width: IntWidth) -> Result<ScVal> {
    let buf = match value {
        NativeValue::Int(i) => {
            if *i < 0 && !width.signed() {
                return Err(SpecError::invalid_type(format!(
                    "negative value {i} for unsigned {}",
                    width.name()
                )));
            }
            sign_extend(&i.to_be_bytes(), true)
        }
        NativeValue::DecimalString(s) | NativeValue::String(s) => parse_decimal(s, width)?,
        NativeValue::Bytes(b) => {
            if b.len() > width.byte_len() {
                return Err(EncodingError::IntegerTooLarge {
                    len: b.len(),
                    max: width.byte_len(),
                }
                .into());
            }
            sign_extend(b, width.signed())
        }
        other => {
            return Err(SpecError::invalid_type(format!(
                "expected integer, decimal string or bytes for {}, got {}",
                width.name(),
                other.kind()
            )))
        }
    };
    Ok(split(&buf, width))
}

/// Left-pad to 32 bytes, replicating the sign bit when `signed`.
fn sign_extend(bytes: &[u8], signed: bool) -> Buf {
    let negative = signed && bytes.first().is_some_and(|b| b & 0x80 != 0);
    let mut buf = if negative { [0xff; 32] } else { [0; 32] };
    buf[32 - bytes.len()..].copy_from_slice(bytes);
    buf
}

fn parse_decimal(s: &str, width: IntWidth) -> Result<Buf> {
    let (negative, digits) = match s.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, s),
    };
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(EncodingError::InvalidInteger(s.to_string()).into());
    }
    if negative && !width.signed() {
        return Err(SpecError::invalid_type(format!(
            "negative value {s} for unsigned {}",
            width.name()
        )));
    }
    let out_of_range = || SpecError::invalid_type(format!("{s} out of range for {}", width.name()));

    match width {
        IntWidth::U128 => {
            let v: u128 = digits.parse().map_err(|_| out_of_range())?;
            Ok(sign_extend(&v.to_be_bytes(), false))
        }
        IntWidth::I128 => {
            let v: i128 = s.parse().map_err(|_| out_of_range())?;
            Ok(sign_extend(&v.to_be_bytes(), true))
        }
        IntWidth::U256 | IntWidth::I256 => {
            let magnitude = U256::from_dec_str(digits).map_err(|_| out_of_range())?;
            let value = if width == IntWidth::I256 {
                let limit = U256::one() << 255;
                if (negative && magnitude > limit) || (!negative && magnitude >= limit) {
                    return Err(out_of_range());
                }
                if negative {
                    (!magnitude).overflowing_add(U256::one()).0
                } else {
                    magnitude
                }
            } else {
                magnitude
            };
            let mut buf = [0u8; 32];
            value.to_big_endian(&mut buf);
            Ok(buf)
        }
    }
}

fn word(buf: &Buf, index: usize) -> [u8; 8] {
    let mut w = [0u8; 8];
    w.copy_from_slice(&buf[index * 8..index * 8 + 8]);
    w
}

fn split(buf: &Buf, width: IntWidth) -> ScVal {
    match width {
        IntWidth::U128 => ScVal::U128(UInt128Parts {
            hi: u64::from_be_bytes(word(buf, 2)),
            lo: u64::from_be_bytes(word(buf, 3)),
        }),
        IntWidth::I128 => ScVal::I128(Int128Parts {
            hi: i64::from_be_bytes(word(buf, 2)),
            lo: u64::from_be_bytes(word(buf, 3)),
        }),
        IntWidth::U256 => ScVal::U256(UInt256Parts {
            hi_hi: u64::from_be_bytes(word(buf, 0)),
            hi_lo: u64::from_be_bytes(word(buf, 1)),
            lo_hi: u64::from_be_bytes(word(buf, 2)),
            lo_lo: u64::from_be_bytes(word(buf, 3)),
        }),
        IntWidth::I256 => ScVal::I256(Int256Parts {
            hi_hi: i64::from_be_bytes(word(buf, 0)),
            hi_lo: u64::from_be_bytes(word(buf, 1)),
            lo_hi: u64::from_be_bytes(word(buf, 2)),
            lo_lo: u64::from_be_bytes(word(buf, 3)),
        }),
    }
}

/// Join XDR parts back into a buffer. Returns `None` when `value` is not an
/// integer of the given width.
fn join(value: &ScVal, width: IntWidth) -> Option<Buf> {
    let mut words = [[0u8; 8]; 4];
    match (value, width) {
        (ScVal::U128(p), IntWidth::U128) => {
            words[2] = p.hi.to_be_bytes();
            words[3] = p.lo.to_be_bytes();
        }
        (ScVal::I128(p), IntWidth::I128) => {
            let fill = if p.hi < 0 { [0xff; 8] } else { [0; 8] };
            words = [fill, fill, p.hi.to_be_bytes(), p.lo.to_be_bytes()];
        }
        (ScVal::U256(p), IntWidth::U256) => {
            words = [
                p.hi_hi.to_be_bytes(),
                p.hi_lo.to_be_bytes(),
                p.lo_hi.to_be_bytes(),
                p.lo_lo.to_be_bytes(),
            ];
        }
        (ScVal::I256(p), IntWidth::I256) => {
            words = [
                p.hi_hi.to_be_bytes(),
                p.hi_lo.to_be_bytes(),
                p.lo_hi.to_be_bytes(),
                p.lo_lo.to_be_bytes(),
            ];
        }
        _ => return None,
    }
    let mut buf = [0u8; 32];
    for (i, w) in words.iter().enumerate() {
        buf[i * 8..i * 8 + 8].copy_from_slice(w);
    }
    Some(buf)
}

/// Decode a wide integer `ScVal`. Values that fit an `i128` come back as
/// [`NativeValue::Int`], anything larger as a decimal string.
pub(crate) fn to_native(value: &ScVal, width: IntWidth) -> Option<NativeValue> {
    let buf = join(value, width)?;
    let negative = width.signed() && buf[0] & 0x80 != 0;

    let fill = if negative { 0xff } else { 0 };
    let high_is_extension = buf[..16].iter().all(|&b| b == fill) && ((buf[16] & 0x80 != 0) == negative);
    if high_is_extension {
        let mut low = [0u8; 16];
        low.copy_from_slice(&buf[16..]);
        return Some(NativeValue::Int(i128::from_be_bytes(low)));
    }

    let raw = U256::from_big_endian(&buf);
    let text = if negative {
        format!("-{}", (!raw).overflowing_add(U256::one()).0)
    } else {
        raw.to_string()
    };
    Some(NativeValue::DecimalString(text))
}
