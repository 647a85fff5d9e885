//! Soroban contract spec extraction and value marshalling.
//!
//! Reads the interface a compiled Soroban WASM contract publishes about
//! itself and uses it to convert call arguments between plain native values
//! and the `ScVal` wire format.
//!
//! # Architecture
//!
//! 1. **Section discovery** ([`wasm_sections`]) walks the module with
//!    `wasmparser` and collects the `contractenvmetav0`, `contractmetav0`
//!    and `contractspecv0` custom sections.
//! 2. **Section decoding** ([`ContractInfo`]) reads each payload as a run
//!    of XDR records: interface version, meta key/value pairs, and
//!    [`ScSpecEntry`] declarations.
//! 3. **Spec engine** ([`Spec`]) indexes the declarations by name and
//!    converts [`NativeValue`]s to `ScVal`s (and back) guided by the
//!    declared [`ScSpecTypeDef`]s.
//!
//! ```no_run
//! use std::collections::HashMap;
//! use soroban_contract_spec::{ContractInfo, NativeValue};
//!
//! # fn run(wasm: &[u8]) -> Result<(), Box<dyn std::error::Error>> {
//! let info = ContractInfo::from_wasm(wasm)?;
//! let spec = info.spec();
//!
//! let mut args = HashMap::new();
//! args.insert("to".to_string(), NativeValue::from("GA7QYNF7SOWQ3GLR2BGMZEHXAVIRZA4KVWLTJJFC7MGXUA74P7UJVSGZ"));
//! args.insert("amount".to_string(), NativeValue::decimal("1000000000"));
//! let vals = spec.function_args_to_wire("mint", &args)?;
//! # Ok(())
//! # }
//! ```

pub mod wasm_sections;

mod contract_info;
mod error;
mod native;
mod spec;
mod type_fmt;

pub use contract_info::{ContractInfo, SEP_META_KEY};
pub use error::{EncodingError, ParseError, SpecError};
pub use native::NativeValue;
pub use spec::{Spec, DEFAULT_MAX_DEPTH};
pub use type_fmt::format_type;

pub use stellar_xdr::curr::{ScSpecEntry, ScSpecTypeDef, ScVal};

/// Extract contract spec entries from a compiled Soroban WASM.
///
/// Only the `contractspecv0` section is required.
pub fn extract_spec(wasm: &[u8]) -> Result<Vec<ScSpecEntry>, ParseError> {
    let sections = wasm_sections::find_contract_sections(wasm)?;
    let parts = sections.spec.ok_or(ParseError::DeclarationsMissing)?;
    contract_info::decode_records(&parts.concat(), wasm_sections::SPEC_SECTION)
}
