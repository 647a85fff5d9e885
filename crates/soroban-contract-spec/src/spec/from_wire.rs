//! `ScVal` to native value conversion.

use std::collections::BTreeMap;

use stellar_xdr::curr::{
    ScError, ScSpecEntry, ScSpecTypeDef, ScSpecUdtStructV0, ScSpecUdtUnionCaseV0,
    ScSpecUdtUnionV0, ScVal,
};

use super::int::{self, IntWidth};
use super::to_wire::{case_name, is_tuple_struct};
use super::{address, Spec};
use crate::error::{Result, SpecError};
use crate::native::NativeValue;
use crate::type_fmt::format_type;

pub(super) struct Converter<'s, 'a> {
    spec: &'s Spec<'a>,
}

impl<'s, 'a> Converter<'s, 'a> {
    pub(super) fn new(spec: &'s Spec<'a>) -> Self {
        Self { spec }
    }

    pub(super) fn convert(&self, value: &ScVal, ty: &ScSpecTypeDef, depth: usize) -> Result<NativeValue> {
        if depth > self.spec.max_depth() {
            return Err(SpecError::DepthLimitExceeded(self.spec.max_depth()));
        }
        let next = depth + 1;

        let mismatch = || {
            SpecError::invalid_type(format!(
                "expected {}, got {}",
                format_type(ty),
                describe(value)
            ))
        };

        match (ty, value) {
            (ScSpecTypeDef::Option(_), ScVal::Void) => Ok(NativeValue::Null),
            (ScSpecTypeDef::Option(o), v) => self.convert(v, &o.value_type, next),
            (ScSpecTypeDef::Result(_), ScVal::Error(e)) => Err(SpecError::invalid_type(format!(
                "contract returned error {e:?}"
            ))),
            (ScSpecTypeDef::Result(r), v) => self.convert(v, &r.ok_type, next),
            (ScSpecTypeDef::Val, v) => self.infer(v, next),
            (ScSpecTypeDef::Void, ScVal::Void) => Ok(NativeValue::Null),
            (ScSpecTypeDef::Bool, ScVal::Bool(b)) => Ok(NativeValue::Bool(*b)),
            (ScSpecTypeDef::U32, ScVal::U32(v)) => Ok(NativeValue::from(*v)),
            (ScSpecTypeDef::I32, ScVal::I32(v)) => Ok(NativeValue::from(*v)),
            (ScSpecTypeDef::U64, ScVal::U64(v)) => Ok(NativeValue::from(*v)),
            (ScSpecTypeDef::I64, ScVal::I64(v)) => Ok(NativeValue::from(*v)),
            (ScSpecTypeDef::Timepoint, ScVal::Timepoint(t)) => Ok(NativeValue::from(t.0)),
            (ScSpecTypeDef::Duration, ScVal::Duration(d)) => Ok(NativeValue::from(d.0)),
            (ScSpecTypeDef::U128, v) => int::to_native(v, IntWidth::U128).ok_or_else(mismatch),
            (ScSpecTypeDef::I128, v) => int::to_native(v, IntWidth::I128).ok_or_else(mismatch),
            (ScSpecTypeDef::U256, v) => int::to_native(v, IntWidth::U256).ok_or_else(mismatch),
            (ScSpecTypeDef::I256, v) => int::to_native(v, IntWidth::I256).ok_or_else(mismatch),
            (ScSpecTypeDef::Bytes, ScVal::Bytes(b)) => Ok(NativeValue::Bytes(b.0.to_vec())),
            (ScSpecTypeDef::BytesN(n), ScVal::Bytes(b)) => {
                if b.0.len() != n.n as usize {
                    return Err(mismatch());
                }
                Ok(NativeValue::Bytes(b.0.to_vec()))
            }
            (ScSpecTypeDef::String, ScVal::String(s)) => Ok(NativeValue::String(utf8(s.0.as_slice())?)),
            (ScSpecTypeDef::Symbol, ScVal::Symbol(s)) => Ok(NativeValue::String(utf8(s.0.as_slice())?)),
            (ScSpecTypeDef::Address | ScSpecTypeDef::MuxedAddress, ScVal::Address(a)) => {
                Ok(NativeValue::String(address::to_strkey(a)?))
            }
            (ScSpecTypeDef::Error, ScVal::Error(ScError::Contract(code))) => Ok(NativeValue::from(*code)),
            (ScSpecTypeDef::Vec(v), ScVal::Vec(Some(items))) => Ok(NativeValue::Seq(
                items
                    .0
                    .iter()
                    .map(|item| self.convert(item, &v.element_type, next))
                    .collect::<Result<_>>()?,
            )),
            (ScSpecTypeDef::Tuple(t), ScVal::Vec(Some(items))) => {
                if items.0.len() != t.value_types.len() {
                    return Err(mismatch());
                }
                Ok(NativeValue::Seq(
                    items
                        .0
                        .iter()
                        .zip(t.value_types.iter())
                        .map(|(item, item_ty)| self.convert(item, item_ty, next))
                        .collect::<Result<_>>()?,
                ))
            }
            (ScSpecTypeDef::Map(m), ScVal::Map(Some(entries))) => {
                let mut out = BTreeMap::new();
                for entry in entries.0.iter() {
                    let key = match self.convert(&entry.key, &m.key_type, next)? {
                        NativeValue::String(s) | NativeValue::DecimalString(s) => s,
                        NativeValue::Int(i) => i.to_string(),
                        other => {
                            return Err(SpecError::invalid_type(format!(
                                "map key of kind {} cannot be a native map key",
                                other.kind()
                            )))
                        }
                    };
                    out.insert(key, self.convert(&entry.val, &m.value_type, next)?);
                }
                Ok(NativeValue::Map(out))
            }
            (ScSpecTypeDef::Udt(udt), v) => {
                let name = udt.name.to_utf8_string_lossy();
                match (self.spec.resolve(&name)?, v) {
                    (ScSpecEntry::UdtEnumV0(e), ScVal::U32(code)) => {
                        if e.cases.iter().any(|c| c.value == *code) {
                            Ok(NativeValue::from(*code))
                        } else {
                            Err(SpecError::InvalidEnumValue { name, value: i128::from(*code) })
                        }
                    }
                    (
                        ScSpecEntry::UdtErrorEnumV0(e),
                        ScVal::Error(ScError::Contract(code)) | ScVal::U32(code),
                    ) => {
                        if e.cases.iter().any(|c| c.value == *code) {
                            Ok(NativeValue::from(*code))
                        } else {
                            Err(SpecError::InvalidEnumValue { name, value: i128::from(*code) })
                        }
                    }
                    (ScSpecEntry::UdtUnionV0(u), ScVal::Vec(Some(items))) => self.union(u, items.0.as_slice(), next),
                    (ScSpecEntry::UdtStructV0(s), v) => self.structure(s, v, next),
                    _ => Err(mismatch()),
                }
            }
            _ => Err(mismatch()),
        }
    }

    fn union(&self, union: &ScSpecUdtUnionV0, items: &[ScVal], depth: usize) -> Result<NativeValue> {
        let union_name = union.name.to_utf8_string_lossy();
        let Some((ScVal::Symbol(tag), rest)) = items.split_first() else {
            return Err(SpecError::invalid_type(format!(
                "union {union_name} value must start with a symbol"
            )));
        };
        let tag = utf8(tag.0.as_slice())?;
        let case = union
            .cases
            .iter()
            .find(|c| case_name(c) == tag)
            .ok_or_else(|| SpecError::invalid_type(format!("no case `{tag}` in union {union_name}")))?;

        match case {
            ScSpecUdtUnionCaseV0::VoidV0(_) if rest.is_empty() => Ok(NativeValue::variant(tag)),
            ScSpecUdtUnionCaseV0::TupleV0(t) if rest.len() == t.type_.len() => {
                let values = rest
                    .iter()
                    .zip(t.type_.iter())
                    .map(|(v, ty)| self.convert(v, ty, depth))
                    .collect::<Result<Vec<_>>>()?;
                Ok(NativeValue::variant_with(tag, values))
            }
            _ => Err(SpecError::invalid_type(format!(
                "case `{tag}` of union {union_name} has wrong arity {}",
                rest.len()
            ))),
        }
    }

    fn structure(&self, st: &ScSpecUdtStructV0, value: &ScVal, depth: usize) -> Result<NativeValue> {
        let struct_name = st.name.to_utf8_string_lossy();

        if is_tuple_struct(st)? {
            return match value {
                ScVal::Vec(Some(items)) if items.0.len() == st.fields.len() => Ok(NativeValue::Seq(
                    items
                        .0
                        .iter()
                        .zip(st.fields.iter())
                        .map(|(v, f)| self.convert(v, &f.type_, depth))
                        .collect::<Result<_>>()?,
                )),
                other => Err(SpecError::invalid_type(format!(
                    "tuple struct {struct_name} expects a vec of {} values, got {}",
                    st.fields.len(),
                    describe(other)
                ))),
            };
        }

        let ScVal::Map(Some(entries)) = value else {
            return Err(SpecError::invalid_type(format!(
                "struct {struct_name} expects a map, got {}",
                describe(value)
            )));
        };

        let mut out = BTreeMap::new();
        for field in st.fields.iter() {
            let name = field.name.to_utf8_string_lossy();
            let entry = entries
                .0
                .iter()
                .find(|e| matches!(&e.key, ScVal::Symbol(s) if s.0.as_slice() == name.as_bytes()))
                .ok_or_else(|| {
                    SpecError::invalid_type(format!("struct {struct_name} is missing field `{name}`"))
                })?;
            out.insert(name, self.convert(&entry.val, &field.type_, depth)?);
        }
        Ok(NativeValue::Map(out))
    }

    /// Untyped `Val`: map each wire variant to its natural native form.
    fn infer(&self, value: &ScVal, depth: usize) -> Result<NativeValue> {
        if depth > self.spec.max_depth() {
            return Err(SpecError::DepthLimitExceeded(self.spec.max_depth()));
        }
        let next = depth + 1;
        Ok(match value {
            ScVal::Void => NativeValue::Null,
            ScVal::Bool(b) => NativeValue::Bool(*b),
            ScVal::U32(v) => NativeValue::from(*v),
            ScVal::I32(v) => NativeValue::from(*v),
            ScVal::U64(v) => NativeValue::from(*v),
            ScVal::I64(v) => NativeValue::from(*v),
            ScVal::Timepoint(t) => NativeValue::from(t.0),
            ScVal::Duration(d) => NativeValue::from(d.0),
            ScVal::U128(_) => int::to_native(value, IntWidth::U128).unwrap_or(NativeValue::Null),
            ScVal::I128(_) => int::to_native(value, IntWidth::I128).unwrap_or(NativeValue::Null),
            ScVal::U256(_) => int::to_native(value, IntWidth::U256).unwrap_or(NativeValue::Null),
            ScVal::I256(_) => int::to_native(value, IntWidth::I256).unwrap_or(NativeValue::Null),
            ScVal::Bytes(b) => NativeValue::Bytes(b.0.to_vec()),
            ScVal::String(s) => NativeValue::String(utf8(s.0.as_slice())?),
            ScVal::Symbol(s) => NativeValue::String(utf8(s.0.as_slice())?),
            ScVal::Address(a) => NativeValue::String(address::to_strkey(a)?),
            ScVal::Error(ScError::Contract(code)) => NativeValue::from(*code),
            ScVal::Vec(Some(items)) => NativeValue::Seq(
                items
                    .0
                    .iter()
                    .map(|v| self.infer(v, next))
                    .collect::<Result<_>>()?,
            ),
            ScVal::Map(Some(entries)) => {
                let mut out = BTreeMap::new();
                for entry in entries.0.iter() {
                    let key = match self.infer(&entry.key, next)? {
                        NativeValue::String(s) | NativeValue::DecimalString(s) => s,
                        NativeValue::Int(i) => i.to_string(),
                        other => {
                            return Err(SpecError::invalid_type(format!(
                                "map key of kind {} cannot be a native map key",
                                other.kind()
                            )))
                        }
                    };
                    out.insert(key, self.infer(&entry.val, next)?);
                }
                NativeValue::Map(out)
            }
            other => {
                return Err(SpecError::invalid_type(format!(
                    "cannot represent {} natively",
                    describe(other)
                )))
            }
        })
    }
}

fn utf8(bytes: &[u8]) -> Result<String> {
    String::from_utf8(bytes.to_vec())
        .map_err(|e| SpecError::invalid_type(format!("value is not valid UTF-8: {e}")))
}

/// Short name of an `ScVal` variant for error messages.
pub(super) fn describe(value: &ScVal) -> &'static str {
    match value {
        ScVal::Bool(_) => "Bool",
        ScVal::Void => "Void",
        ScVal::Error(_) => "Error",
        ScVal::U32(_) => "U32",
        ScVal::I32(_) => "I32",
        ScVal::U64(_) => "U64",
        ScVal::I64(_) => "I64",
        ScVal::Timepoint(_) => "Timepoint",
        ScVal::Duration(_) => "Duration",
        ScVal::U128(_) => "U128",
        ScVal::I128(_) => "I128",
        ScVal::U256(_) => "U256",
        ScVal::I256(_) => "I256",
        ScVal::Bytes(_) => "Bytes",
        ScVal::String(_) => "String",
        ScVal::Symbol(_) => "Symbol",
        ScVal::Vec(_) => "Vec",
        ScVal::Map(_) => "Map",
        ScVal::Address(_) => "Address",
        _ => "ledger value",
    }
}
