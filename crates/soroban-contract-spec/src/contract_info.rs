//! Decoded contract metadata.
//!
//! [`ContractInfo`] is built once from a module's three contract custom
//! sections (see [`crate::wasm_sections`]) and never mutated afterwards.
//! Each section payload is a back-to-back run of XDR records with no
//! leading count; decoding stops exactly at the end of the payload and a
//! trailing partial record is an error.

use std::io::Cursor;

use stellar_xdr::curr::{
    Limited, Limits, ReadXdr, ScEnvMetaEntry, ScMetaEntry, ScSpecEntry, ScSpecEventV0,
    ScSpecFunctionV0, ScSpecUdtEnumV0, ScSpecUdtErrorEnumV0, ScSpecUdtStructV0, ScSpecUdtUnionV0,
};

use crate::error::ParseError;
use crate::spec::{self, Spec};
use crate::wasm_sections::{self, ENV_META_SECTION, META_SECTION, SPEC_SECTION};

/// Meta key listing the SEP numbers a contract implements.
pub const SEP_META_KEY: &str = "sep";

/// Everything a contract module publishes about its interface.
#[derive(Debug, Clone, PartialEq)]
pub struct ContractInfo {
    env_interface_version: u64,
    meta: Vec<(String, String)>,
    entries: Vec<ScSpecEntry>,
}

impl ContractInfo {
    /// Parse a compiled contract module.
    pub fn from_wasm(wasm: &[u8]) -> Result<Self, ParseError> {
        let sections = wasm_sections::find_contract_sections(wasm)?;

        let env_payload = sections
            .env_meta
            .as_deref()
            .map(wasm_sections::join)
            .ok_or(ParseError::EnvironmentMetaMissing)?;
        let env_interface_version = decode_records::<ScEnvMetaEntry>(&env_payload, ENV_META_SECTION)?
            .into_iter()
            .map(|entry| match entry {
                ScEnvMetaEntry::ScEnvMetaKindInterfaceVersion(v) => {
                    (u64::from(v.protocol) << 32) | u64::from(v.pre_release)
                }
            })
            .next()
            .ok_or(ParseError::EnvironmentMetaMissing)?;

        let mut meta: Vec<(String, String)> = Vec::new();
        if let Some(parts) = sections.meta.as_deref() {
            for entry in decode_records::<ScMetaEntry>(&wasm_sections::join(parts), META_SECTION)? {
                let ScMetaEntry::ScMetaV0(v) = entry;
                let key = v.key.to_utf8_string_lossy();
                let val = v.val.to_utf8_string_lossy();
                match meta.iter_mut().find(|(k, _)| *k == key) {
                    Some(slot) => slot.1 = val,
                    None => meta.push((key, val)),
                }
            }
        }

        let spec_payload = sections
            .spec
            .as_deref()
            .map(wasm_sections::join)
            .ok_or(ParseError::DeclarationsMissing)?;
        let entries = decode_records::<ScSpecEntry>(&spec_payload, SPEC_SECTION)?;

        tracing::debug!(
            env_interface_version,
            meta = meta.len(),
            entries = entries.len(),
            "parsed contract module"
        );

        Ok(Self {
            env_interface_version,
            meta,
            entries,
        })
    }

    /// Combined interface version: protocol in the high 32 bits,
    /// pre-release in the low 32 bits.
    pub fn env_interface_version(&self) -> u64 {
        self.env_interface_version
    }

    /// Ledger protocol the contract was built against.
    pub fn protocol_version(&self) -> u32 {
        (self.env_interface_version >> 32) as u32
    }

    /// Pre-release number; zero for contracts built for a released protocol.
    pub fn pre_release_version(&self) -> u32 {
        self.env_interface_version as u32
    }

    /// Meta key/value pairs in first-seen order. A repeated key keeps its
    /// first position and takes its last value.
    pub fn meta(&self) -> &[(String, String)] {
        &self.meta
    }

    /// Value of a meta key, if present.
    pub fn meta_value(&self, key: &str) -> Option<&str> {
        self.meta
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// All declaration entries in module order.
    pub fn entries(&self) -> &[ScSpecEntry] {
        &self.entries
    }

    /// Function declarations in module order.
    pub fn functions(&self) -> Vec<&ScSpecFunctionV0> {
        spec::functions(&self.entries)
    }

    /// Struct declarations in module order.
    pub fn structs(&self) -> Vec<&ScSpecUdtStructV0> {
        spec::structs(&self.entries)
    }

    /// Union declarations in module order.
    pub fn unions(&self) -> Vec<&ScSpecUdtUnionV0> {
        spec::unions(&self.entries)
    }

    /// Enum declarations in module order.
    pub fn enums(&self) -> Vec<&ScSpecUdtEnumV0> {
        spec::enums(&self.entries)
    }

    /// Error enum declarations in module order.
    pub fn error_enums(&self) -> Vec<&ScSpecUdtErrorEnumV0> {
        spec::error_enums(&self.entries)
    }

    /// Event declarations in module order.
    pub fn events(&self) -> Vec<&ScSpecEventV0> {
        spec::events(&self.entries)
    }

    /// SEP identifiers from the `sep` meta entry: comma separated, trimmed,
    /// empty pieces dropped, duplicates removed keeping first occurrence.
    pub fn supported_extensions(&self) -> Vec<String> {
        self.meta_value(SEP_META_KEY)
            .map(parse_extension_list)
            .unwrap_or_default()
    }

    /// Build a conversion engine over this contract's declarations.
    pub fn spec(&self) -> Spec<'_> {
        Spec::new(&self.entries)
    }
}

fn parse_extension_list(raw: &str) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for piece in raw.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        if !out.iter().any(|seen| seen == piece) {
            out.push(piece.to_string());
        }
    }
    out
}

/// Nesting bound for decoding declaration records from untrusted bytes.
pub(crate) const DECODE_DEPTH_LIMIT: u32 = 500;

/// Decoder limits for a payload of `len` bytes.
pub(crate) fn decode_limits(len: usize) -> Limits {
    Limits {
        depth: DECODE_DEPTH_LIMIT,
        len,
    }
}

/// Decode a payload as consecutive XDR records until it is exhausted.
pub(crate) fn decode_records<T: ReadXdr>(data: &[u8], section: &str) -> Result<Vec<T>, ParseError> {
    let mut limited = Limited::new(Cursor::new(data), decode_limits(data.len()));
    T::read_xdr_iter(&mut limited)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| ParseError::InvalidModule(format!("section `{section}`: {e}")))
}
