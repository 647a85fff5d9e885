use wasmparser::{Parser, Payload};

use crate::error::ParseError;

/// Custom section holding the single `ScEnvMetaEntry` interface version.
pub const ENV_META_SECTION: &str = "contractenvmetav0";
/// Custom section holding `ScMetaEntry` key/value records.
pub const META_SECTION: &str = "contractmetav0";
/// Custom section holding `ScSpecEntry` interface declarations.
pub const SPEC_SECTION: &str = "contractspecv0";

const WASM_MAGIC: &[u8; 4] = b"\0asm";

/// Raw payloads of the three contract custom sections.
///
/// A section that appears more than once has its payloads concatenated in
/// module order. `None` means the section never appeared.
#[derive(Debug, Default)]
pub struct ContractSections<'a> {
    pub env_meta: Option<Vec<&'a [u8]>>,
    pub meta: Option<Vec<&'a [u8]>>,
    pub spec: Option<Vec<&'a [u8]>>,
}

/// Walk a WASM module and collect the payloads of the contract custom
/// sections. Any malformed section header is reported as
/// [`ParseError::InvalidModule`].
pub fn find_contract_sections(wasm: &[u8]) -> Result<ContractSections<'_>, ParseError> {
    if !wasm.starts_with(WASM_MAGIC) {
        return Err(ParseError::InvalidModule("missing WASM magic header".into()));
    }

    let mut sections = ContractSections::default();

    for payload in Parser::new(0).parse_all(wasm) {
        let payload = payload.map_err(|e| ParseError::InvalidModule(e.to_string()))?;
        if let Payload::CustomSection(reader) = payload {
            let slot = match reader.name() {
                ENV_META_SECTION => &mut sections.env_meta,
                META_SECTION => &mut sections.meta,
                SPEC_SECTION => &mut sections.spec,
                _ => continue,
            };
            tracing::trace!(
                section = reader.name(),
                len = reader.data().len(),
                "found contract custom section"
            );
            slot.get_or_insert_with(Vec::new).push(reader.data());
        }
    }

    Ok(sections)
}

/// Concatenate the payload fragments of one section.
pub(crate) fn join(parts: &[&[u8]]) -> Vec<u8> {
    parts.concat()
}
