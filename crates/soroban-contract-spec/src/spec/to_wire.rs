//! Native value to `ScVal` conversion.

use stellar_xdr::curr::{
    Duration, ScBytes, ScError, ScMap, ScMapEntry, ScSpecEntry, ScSpecTypeDef, ScSpecUdtEnumV0,
    ScSpecUdtErrorEnumV0, ScSpecUdtStructV0, ScSpecUdtUnionCaseV0, ScSpecUdtUnionV0, ScString,
    ScSymbol, ScVal, ScVec, TimePoint,
};

use super::int::{self, IntWidth};
use super::{address, Spec};
use crate::error::{Result, SpecError};
use crate::native::NativeValue;
use crate::type_fmt::format_type;

/// Longest symbol the host accepts.
const MAX_SYMBOL_LEN: usize = 32;

pub(super) struct Converter<'s, 'a> {
    spec: &'s Spec<'a>,
}

impl<'s, 'a> Converter<'s, 'a> {
    pub(super) fn new(spec: &'s Spec<'a>) -> Self {
        Self { spec }
    }

    pub(super) fn convert(&self, value: &NativeValue, ty: &ScSpecTypeDef, depth: usize) -> Result<ScVal> {
        if depth > self.spec.max_depth() {
            return Err(SpecError::DepthLimitExceeded(self.spec.max_depth()));
        }
        let next = depth + 1;

        match (ty, value) {
            (ScSpecTypeDef::Option(o), v) => {
                if v.is_null() {
                    Ok(ScVal::Void)
                } else {
                    self.convert(v, &o.value_type, next)
                }
            }
            (ScSpecTypeDef::Void, NativeValue::Null) => Ok(ScVal::Void),
            (ScSpecTypeDef::Val, v) => self.infer(v, next),
            (ScSpecTypeDef::Bool, NativeValue::Bool(b)) => Ok(ScVal::Bool(*b)),
            (ScSpecTypeDef::U32, NativeValue::Int(i)) => Ok(ScVal::U32(in_range(*i, ty)?)),
            (ScSpecTypeDef::I32, NativeValue::Int(i)) => Ok(ScVal::I32(in_range(*i, ty)?)),
            (ScSpecTypeDef::U64, NativeValue::Int(i)) => Ok(ScVal::U64(in_range(*i, ty)?)),
            (ScSpecTypeDef::I64, NativeValue::Int(i)) => Ok(ScVal::I64(in_range(*i, ty)?)),
            (ScSpecTypeDef::Timepoint, NativeValue::Int(i)) => {
                Ok(ScVal::Timepoint(TimePoint(in_range(*i, ty)?)))
            }
            (ScSpecTypeDef::Duration, NativeValue::Int(i)) => {
                Ok(ScVal::Duration(Duration(in_range(*i, ty)?)))
            }
            (ScSpecTypeDef::U128, v) => int::to_wire(v, IntWidth::U128),
            (ScSpecTypeDef::I128, v) => int::to_wire(v, IntWidth::I128),
            (ScSpecTypeDef::U256, v) => int::to_wire(v, IntWidth::U256),
            (ScSpecTypeDef::I256, v) => int::to_wire(v, IntWidth::I256),
            (ScSpecTypeDef::Bytes, NativeValue::String(s)) => {
                Ok(ScVal::Bytes(ScBytes(s.as_bytes().to_vec().try_into()?)))
            }
            (ScSpecTypeDef::Bytes, NativeValue::Bytes(b)) => Ok(ScVal::Bytes(ScBytes(b.clone().try_into()?))),
            (ScSpecTypeDef::BytesN(n), NativeValue::Bytes(b)) => {
                if b.len() != n.n as usize {
                    return Err(SpecError::invalid_type(format!(
                        "expected {} bytes for BytesN<{}>, got {}",
                        n.n,
                        n.n,
                        b.len()
                    )));
                }
                Ok(ScVal::Bytes(ScBytes(b.clone().try_into()?)))
            }
            (ScSpecTypeDef::String, NativeValue::String(s)) => {
                Ok(ScVal::String(ScString(s.as_str().try_into()?)))
            }
            (ScSpecTypeDef::Symbol, NativeValue::String(s)) => symbol(s),
            (ScSpecTypeDef::Address, NativeValue::String(s)) => {
                Ok(ScVal::Address(address::parse(s, false)?))
            }
            (ScSpecTypeDef::MuxedAddress, NativeValue::String(s)) => {
                Ok(ScVal::Address(address::parse(s, true)?))
            }
            (ScSpecTypeDef::Error, NativeValue::Int(i)) => {
                Ok(ScVal::Error(ScError::Contract(in_range(*i, ty)?)))
            }
            (ScSpecTypeDef::Result(r), v) => self.convert(v, &r.ok_type, next),
            (ScSpecTypeDef::Vec(v), NativeValue::Seq(items)) => {
                let items = items
                    .iter()
                    .map(|item| self.convert(item, &v.element_type, next))
                    .collect::<Result<Vec<_>>>()?;
                vec_val(items)
            }
            (ScSpecTypeDef::Map(m), NativeValue::Map(map)) => {
                let entries = map
                    .iter()
                    .map(|(k, v)| {
                        Ok(ScMapEntry {
                            key: self.convert(&NativeValue::String(k.clone()), &m.key_type, next)?,
                            val: self.convert(v, &m.value_type, next)?,
                        })
                    })
                    .collect::<Result<Vec<_>>>()?;
                map_val(entries)
            }
            (ScSpecTypeDef::Map(m), NativeValue::Seq(pairs)) => {
                let entries = pairs
                    .iter()
                    .map(|pair| match pair {
                        NativeValue::Seq(kv) if kv.len() == 2 => Ok(ScMapEntry {
                            key: self.convert(&kv[0], &m.key_type, next)?,
                            val: self.convert(&kv[1], &m.value_type, next)?,
                        }),
                        other => Err(SpecError::invalid_type(format!(
                            "map entries must be [key, value] pairs, got {}",
                            other.kind()
                        ))),
                    })
                    .collect::<Result<Vec<_>>>()?;
                map_val(entries)
            }
            (ScSpecTypeDef::Tuple(t), NativeValue::Seq(items)) => {
                if items.len() != t.value_types.len() {
                    return Err(SpecError::invalid_type(format!(
                        "tuple {} expects {} values, got {}",
                        format_type(ty),
                        t.value_types.len(),
                        items.len()
                    )));
                }
                let items = items
                    .iter()
                    .zip(t.value_types.iter())
                    .map(|(item, item_ty)| self.convert(item, item_ty, next))
                    .collect::<Result<Vec<_>>>()?;
                vec_val(items)
            }
            (ScSpecTypeDef::Udt(udt), v) => {
                let name = udt.name.to_utf8_string_lossy();
                match self.spec.resolve(&name)? {
                    ScSpecEntry::UdtEnumV0(e) => enum_case(e, v),
                    ScSpecEntry::UdtErrorEnumV0(e) => error_case(e, v),
                    ScSpecEntry::UdtUnionV0(u) => self.union(u, v, next),
                    ScSpecEntry::UdtStructV0(s) => self.structure(s, v, next),
                    _ => Err(SpecError::TypeNotFound(name)),
                }
            }
            (ty, v) => Err(SpecError::invalid_type(format!(
                "cannot convert {} to {}",
                v.kind(),
                format_type(ty)
            ))),
        }
    }

    fn union(&self, union: &ScSpecUdtUnionV0, value: &NativeValue, depth: usize) -> Result<ScVal> {
        let union_name = union.name.to_utf8_string_lossy();
        let NativeValue::Variant { tag, values } = value else {
            return Err(SpecError::invalid_type(format!(
                "expected variant for union {union_name}, got {}",
                value.kind()
            )));
        };
        let values = values.as_deref().unwrap_or(&[]);

        let case = union
            .cases
            .iter()
            .find(|c| case_name(c) == *tag)
            .ok_or_else(|| {
                SpecError::invalid_type(format!("no case `{tag}` in union {union_name}"))
            })?;

        let mut items = vec![symbol(tag)?];
        match case {
            ScSpecUdtUnionCaseV0::VoidV0(_) => {
                if !values.is_empty() {
                    return Err(SpecError::invalid_type(format!(
                        "case `{tag}` of union {union_name} takes no values, got {}",
                        values.len()
                    )));
                }
            }
            ScSpecUdtUnionCaseV0::TupleV0(t) => {
                if values.len() != t.type_.len() {
                    return Err(SpecError::invalid_type(format!(
                        "case `{tag}` of union {union_name} expects {} values, got {}",
                        t.type_.len(),
                        values.len()
                    )));
                }
                for (v, ty) in values.iter().zip(t.type_.iter()) {
                    items.push(self.convert(v, ty, depth)?);
                }
            }
        }
        vec_val(items)
    }

    fn structure(&self, st: &ScSpecUdtStructV0, value: &NativeValue, depth: usize) -> Result<ScVal> {
        let struct_name = st.name.to_utf8_string_lossy();

        if is_tuple_struct(st)? {
            let NativeValue::Seq(items) = value else {
                return Err(SpecError::invalid_type(format!(
                    "expected sequence for tuple struct {struct_name}, got {}",
                    value.kind()
                )));
            };
            if items.len() != st.fields.len() {
                return Err(SpecError::invalid_type(format!(
                    "tuple struct {struct_name} expects {} values, got {}",
                    st.fields.len(),
                    items.len()
                )));
            }
            let items = items
                .iter()
                .zip(st.fields.iter())
                .map(|(v, f)| self.convert(v, &f.type_, depth))
                .collect::<Result<Vec<_>>>()?;
            return vec_val(items);
        }

        let NativeValue::Map(map) = value else {
            return Err(SpecError::invalid_type(format!(
                "expected map for struct {struct_name}, got {}",
                value.kind()
            )));
        };

        let mut entries = Vec::with_capacity(st.fields.len());
        for field in st.fields.iter() {
            let name = field.name.to_utf8_string_lossy();
            let v = map.get(&name).ok_or_else(|| {
                SpecError::invalid_type(format!("struct {struct_name} is missing field `{name}`"))
            })?;
            entries.push(ScMapEntry {
                key: symbol(&name)?,
                val: self.convert(v, &field.type_, depth)?,
            });
        }
        if let Some(extra) = map
            .keys()
            .find(|k| !st.fields.iter().any(|f| f.name.to_utf8_string_lossy() == **k))
        {
            return Err(SpecError::invalid_type(format!(
                "struct {struct_name} has no field `{extra}`"
            )));
        }
        map_val(entries)
    }

    /// Best-effort conversion for the untyped `Val`.
    fn infer(&self, value: &NativeValue, depth: usize) -> Result<ScVal> {
        if depth > self.spec.max_depth() {
            return Err(SpecError::DepthLimitExceeded(self.spec.max_depth()));
        }
        let next = depth + 1;
        match value {
            NativeValue::Null => Ok(ScVal::Void),
            NativeValue::Bool(b) => Ok(ScVal::Bool(*b)),
            NativeValue::Int(i) => match i64::try_from(*i) {
                Ok(v) => Ok(ScVal::I64(v)),
                Err(_) => int::to_wire(value, IntWidth::I128),
            },
            NativeValue::DecimalString(_) => int::to_wire(value, IntWidth::I128)
                .or_else(|_| int::to_wire(value, IntWidth::I256)),
            NativeValue::Bytes(b) => Ok(ScVal::Bytes(ScBytes(b.clone().try_into()?))),
            NativeValue::String(s) => Ok(ScVal::String(ScString(s.as_str().try_into()?))),
            NativeValue::Seq(items) => {
                let items = items
                    .iter()
                    .map(|v| self.infer(v, next))
                    .collect::<Result<Vec<_>>>()?;
                vec_val(items)
            }
            NativeValue::Map(map) => {
                let entries = map
                    .iter()
                    .map(|(k, v)| {
                        Ok(ScMapEntry {
                            key: symbol(k)?,
                            val: self.infer(v, next)?,
                        })
                    })
                    .collect::<Result<Vec<_>>>()?;
                map_val(entries)
            }
            NativeValue::Variant { tag, values } => {
                let mut items = vec![symbol(tag)?];
                for v in values.iter().flatten() {
                    items.push(self.infer(v, next)?);
                }
                vec_val(items)
            }
        }
    }
}

fn in_range<T: TryFrom<i128>>(i: i128, ty: &ScSpecTypeDef) -> Result<T> {
    T::try_from(i).map_err(|_| SpecError::invalid_type(format!("{i} out of range for {}", format_type(ty))))
}

fn enum_case(e: &ScSpecUdtEnumV0, value: &NativeValue) -> Result<ScVal> {
    let name = e.name.to_utf8_string_lossy();
    let code = discriminant(&name, value)?;
    match e.cases.iter().find(|c| i128::from(c.value) == code) {
        Some(c) => Ok(ScVal::U32(c.value)),
        None => Err(SpecError::InvalidEnumValue { name, value: code }),
    }
}

fn error_case(e: &ScSpecUdtErrorEnumV0, value: &NativeValue) -> Result<ScVal> {
    let name = e.name.to_utf8_string_lossy();
    let code = discriminant(&name, value)?;
    match e.cases.iter().find(|c| i128::from(c.value) == code) {
        Some(c) => Ok(ScVal::Error(ScError::Contract(c.value))),
        None => Err(SpecError::InvalidEnumValue { name, value: code }),
    }
}

fn discriminant(enum_name: &str, value: &NativeValue) -> Result<i128> {
    match value {
        NativeValue::Int(i) => Ok(*i),
        other => Err(SpecError::invalid_type(format!(
            "expected integer for enum {enum_name}, got {}",
            other.kind()
        ))),
    }
}

pub(super) fn case_name(case: &ScSpecUdtUnionCaseV0) -> String {
    match case {
        ScSpecUdtUnionCaseV0::VoidV0(v) => v.name.to_utf8_string_lossy(),
        ScSpecUdtUnionCaseV0::TupleV0(t) => t.name.to_utf8_string_lossy(),
    }
}

/// Structs whose field names are all numeric (`"0"`, `"1"`, ...) are
/// tuple structs and travel as vectors.
pub(super) fn is_tuple_struct(st: &ScSpecUdtStructV0) -> Result<bool> {
    let numeric = st
        .fields
        .iter()
        .filter(|f| {
            let name = f.name.to_utf8_string_lossy();
            !name.is_empty() && name.bytes().all(|b| b.is_ascii_digit())
        })
        .count();
    if numeric > 0 && numeric != st.fields.len() {
        return Err(SpecError::invalid_type(format!(
            "struct {} mixes numeric and named fields",
            st.name.to_utf8_string_lossy()
        )));
    }
    Ok(numeric > 0)
}

fn symbol(s: &str) -> Result<ScVal> {
    if s.len() > MAX_SYMBOL_LEN {
        return Err(SpecError::invalid_type(format!(
            "symbol `{s}` is longer than {MAX_SYMBOL_LEN} characters"
        )));
    }
    if let Some(c) = s.chars().find(|c| !(c.is_ascii_alphanumeric() || *c == '_')) {
        return Err(SpecError::invalid_type(format!(
            "symbol `{s}` contains invalid character {c:?}"
        )));
    }
    Ok(ScVal::Symbol(ScSymbol(s.try_into()?)))
}

fn vec_val(items: Vec<ScVal>) -> Result<ScVal> {
    Ok(ScVal::Vec(Some(ScVec(items.try_into()?))))
}

/// Build a map with entries sorted by key. Duplicate keys are rejected.
fn map_val(mut entries: Vec<ScMapEntry>) -> Result<ScVal> {
    entries.sort_by(|a, b| a.key.cmp(&b.key));
    if let Some(w) = entries.windows(2).find(|w| w[0].key == w[1].key) {
        return Err(SpecError::invalid_type(format!(
            "duplicate map key {:?}",
            w[0].key
        )));
    }
    Ok(ScVal::Map(Some(ScMap(entries.try_into()?))))
}
