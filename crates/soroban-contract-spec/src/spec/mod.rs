//! Contract spec engine.
//!
//! [`Spec`] indexes a flat list of [`ScSpecEntry`] declarations by name and
//! converts values between the dynamically typed [`NativeValue`] model and
//! `ScVal`, driven by declared [`ScSpecTypeDef`]s. Named types are resolved
//! through the index at conversion time, so mutually referencing
//! declarations need no pointer graph.
//!
//! A `Spec` is immutable once built and can be shared across threads.

use std::borrow::Cow;
use std::collections::HashMap;
use std::io::Cursor;

use stellar_xdr::curr::{
    Limited, ReadXdr, ScSpecEntry, ScSpecEventV0, ScSpecFunctionV0, ScSpecTypeDef,
    ScSpecUdtEnumV0, ScSpecUdtErrorEnumV0, ScSpecUdtStructV0, ScSpecUdtUnionV0, ScVal,
};

use crate::contract_info::decode_limits;
use crate::error::{EncodingError, Result, SpecError};
use crate::native::NativeValue;

mod address;
mod from_wire;
mod int;
mod to_wire;

/// Default bound on conversion nesting.
pub const DEFAULT_MAX_DEPTH: usize = 128;

/// Name-indexed view over a contract's declaration entries.
#[derive(Debug, Clone)]
pub struct Spec<'a> {
    entries: Cow<'a, [ScSpecEntry]>,
    /// Struct, union, enum and error-enum names.
    udts: HashMap<String, usize>,
    functions: HashMap<String, usize>,
    events: HashMap<String, usize>,
    max_depth: usize,
}

impl<'a> Spec<'a> {
    /// Index borrowed entries. When a name is declared twice in the same
    /// namespace the first declaration wins.
    pub fn new(entries: &'a [ScSpecEntry]) -> Self {
        Self::index(Cow::Borrowed(entries))
    }

    fn index(entries: Cow<'a, [ScSpecEntry]>) -> Self {
        let mut udts = HashMap::new();
        let mut functions = HashMap::new();
        let mut events = HashMap::new();

        for (i, entry) in entries.iter().enumerate() {
            let (table, name) = match entry {
                ScSpecEntry::FunctionV0(f) => (&mut functions, f.name.to_utf8_string_lossy()),
                ScSpecEntry::EventV0(e) => (&mut events, e.name.to_utf8_string_lossy()),
                ScSpecEntry::UdtStructV0(s) => (&mut udts, s.name.to_utf8_string_lossy()),
                ScSpecEntry::UdtUnionV0(u) => (&mut udts, u.name.to_utf8_string_lossy()),
                ScSpecEntry::UdtEnumV0(e) => (&mut udts, e.name.to_utf8_string_lossy()),
                ScSpecEntry::UdtErrorEnumV0(e) => (&mut udts, e.name.to_utf8_string_lossy()),
            };
            table.entry(name).or_insert(i);
        }

        Self {
            entries,
            udts,
            functions,
            events,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    /// Override the conversion depth limit.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// All indexed entries in declaration order.
    pub fn entries(&self) -> &[ScSpecEntry] {
        &self.entries
    }

    /// Look up a function declaration by name.
    pub fn function(&self, name: &str) -> Option<&ScSpecFunctionV0> {
        match self.functions.get(name).map(|&i| &self.entries[i]) {
            Some(ScSpecEntry::FunctionV0(f)) => Some(f),
            _ => None,
        }
    }

    /// Look up an event declaration by name.
    pub fn event(&self, name: &str) -> Option<&ScSpecEventV0> {
        match self.events.get(name).map(|&i| &self.entries[i]) {
            Some(ScSpecEntry::EventV0(e)) => Some(e),
            _ => None,
        }
    }

    /// Resolve a user-defined type name (struct, union, enum, error enum).
    pub fn udt(&self, name: &str) -> Option<&ScSpecEntry> {
        self.udts.get(name).map(|&i| &self.entries[i])
    }

    /// Flat lookup across every namespace. User-defined types shadow
    /// functions, which shadow events; check the returned variant when a
    /// name may be ambiguous.
    pub fn find(&self, name: &str) -> Option<&ScSpecEntry> {
        self.udts
            .get(name)
            .or_else(|| self.functions.get(name))
            .or_else(|| self.events.get(name))
            .map(|&i| &self.entries[i])
    }

    /// Function declarations in declaration order.
    pub fn functions(&self) -> Vec<&ScSpecFunctionV0> {
        functions(&self.entries)
    }

    /// Struct declarations in declaration order.
    pub fn structs(&self) -> Vec<&ScSpecUdtStructV0> {
        structs(&self.entries)
    }

    /// Union declarations in declaration order.
    pub fn unions(&self) -> Vec<&ScSpecUdtUnionV0> {
        unions(&self.entries)
    }

    /// Enum declarations in declaration order.
    pub fn enums(&self) -> Vec<&ScSpecUdtEnumV0> {
        enums(&self.entries)
    }

    /// Error enum declarations in declaration order.
    pub fn error_enums(&self) -> Vec<&ScSpecUdtErrorEnumV0> {
        error_enums(&self.entries)
    }

    /// Event declarations in declaration order.
    pub fn events(&self) -> Vec<&ScSpecEventV0> {
        events(&self.entries)
    }

    /// Every error-enum case as `(enum name, case name, code)`.
    pub fn error_cases(&self) -> Vec<(String, String, u32)> {
        self.error_enums()
            .into_iter()
            .flat_map(|e| {
                let enum_name = e.name.to_utf8_string_lossy();
                e.cases.iter().map(move |c| {
                    (enum_name.clone(), c.name.to_utf8_string_lossy(), c.value)
                })
            })
            .collect()
    }

    /// Convert named call arguments to `ScVal`s in declared parameter order.
    /// A missing argument is converted as [`NativeValue::Null`].
    pub fn function_args_to_wire(
        &self,
        function_name: &str,
        args: &HashMap<String, NativeValue>,
    ) -> Result<Vec<ScVal>> {
        let function = self
            .function(function_name)
            .ok_or_else(|| SpecError::FunctionNotFound(function_name.to_string()))?;

        tracing::debug!(
            function = function_name,
            params = function.inputs.len(),
            "converting function arguments"
        );

        function
            .inputs
            .iter()
            .map(|input| {
                let name = input.name.to_utf8_string_lossy();
                let value = args.get(&name).unwrap_or(&NativeValue::Null);
                self.to_wire(value, &input.type_).map_err(|e| {
                    tracing::debug!(function = function_name, param = %name, error = %e, "argument rejected");
                    e
                })
            })
            .collect()
    }

    /// Convert a function's return value back to a native value.
    pub fn function_result_to_native(&self, function_name: &str, value: &ScVal) -> Result<NativeValue> {
        let function = self
            .function(function_name)
            .ok_or_else(|| SpecError::FunctionNotFound(function_name.to_string()))?;

        match function.outputs.to_option() {
            Some(ty) => self.to_native(value, &ty),
            None => match value {
                ScVal::Void => Ok(NativeValue::Null),
                other => Err(SpecError::invalid_type(format!(
                    "function `{function_name}` returns nothing but got {}",
                    from_wire::describe(other)
                ))),
            },
        }
    }

    /// Convert a native value to an `ScVal` of the declared type.
    pub fn to_wire(&self, value: &NativeValue, ty: &ScSpecTypeDef) -> Result<ScVal> {
        to_wire::Converter::new(self).convert(value, ty, 0)
    }

    /// Convert an `ScVal` to a native value of the declared type.
    pub fn to_native(&self, value: &ScVal, ty: &ScSpecTypeDef) -> Result<NativeValue> {
        from_wire::Converter::new(self).convert(value, ty, 0)
    }

    pub(crate) fn max_depth(&self) -> usize {
        self.max_depth
    }

    pub(crate) fn resolve(&self, name: &str) -> Result<&ScSpecEntry> {
        self.udt(name)
            .ok_or_else(|| SpecError::TypeNotFound(name.to_string()))
    }
}

impl Spec<'static> {
    /// Decode entries from a raw `contractspecv0` payload.
    pub fn from_xdr(data: &[u8]) -> Result<Self> {
        let mut limited = Limited::new(Cursor::new(data), decode_limits(data.len()));
        let entries = ScSpecEntry::read_xdr_iter(&mut limited)
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(EncodingError::Xdr)?;
        Ok(Self::from_entries(entries))
    }

    /// Decode entries given one base64 XDR string each.
    pub fn from_base64_entries<S: AsRef<str>>(entries: &[S]) -> Result<Self> {
        let entries = entries
            .iter()
            .map(|e| ScSpecEntry::from_xdr_base64(e.as_ref(), decode_limits(e.as_ref().len())))
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(EncodingError::Xdr)?;
        Ok(Self::from_entries(entries))
    }

    /// Index an owned list of entries.
    pub fn from_entries(entries: Vec<ScSpecEntry>) -> Self {
        Self::index(Cow::Owned(entries))
    }
}

pub(crate) fn functions(entries: &[ScSpecEntry]) -> Vec<&ScSpecFunctionV0> {
    entries
        .iter()
        .filter_map(|e| match e {
            ScSpecEntry::FunctionV0(f) => Some(f),
            _ => None,
        })
        .collect()
}

pub(crate) fn structs(entries: &[ScSpecEntry]) -> Vec<&ScSpecUdtStructV0> {
    entries
        .iter()
        .filter_map(|e| match e {
            ScSpecEntry::UdtStructV0(s) => Some(s),
            _ => None,
        })
        .collect()
}

pub(crate) fn unions(entries: &[ScSpecEntry]) -> Vec<&ScSpecUdtUnionV0> {
    entries
        .iter()
        .filter_map(|e| match e {
            ScSpecEntry::UdtUnionV0(u) => Some(u),
            _ => None,
        })
        .collect()
}

pub(crate) fn enums(entries: &[ScSpecEntry]) -> Vec<&ScSpecUdtEnumV0> {
    entries
        .iter()
        .filter_map(|e| match e {
            ScSpecEntry::UdtEnumV0(u) => Some(u),
            _ => None,
        })
        .collect()
}

pub(crate) fn error_enums(entries: &[ScSpecEntry]) -> Vec<&ScSpecUdtErrorEnumV0> {
    entries
        .iter()
        .filter_map(|e| match e {
            ScSpecEntry::UdtErrorEnumV0(u) => Some(u),
            _ => None,
        })
        .collect()
}

pub(crate) fn events(entries: &[ScSpecEntry]) -> Vec<&ScSpecEventV0> {
    entries
        .iter()
        .filter_map(|e| match e {
            ScSpecEntry::EventV0(ev) => Some(ev),
            _ => None,
        })
        .collect()
}
