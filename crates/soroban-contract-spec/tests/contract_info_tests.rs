//! Module parsing tests against sample modules built in code.

mod common;

use common::{
    env_meta, meta, nested_option_function, sample_entries, sample_module, xdr_records,
    ModuleBuilder,
};
use soroban_contract_spec::{extract_spec, ContractInfo, ParseError, Spec};

// ==================== Golden Module ====================

#[test]
fn test_sample_module_counts() {
    let info = ContractInfo::from_wasm(&sample_module()).unwrap();

    assert_eq!(info.entries().len(), 11);
    assert_eq!(info.functions().len(), 5);
    assert_eq!(info.structs().len(), 2);
    assert_eq!(info.unions().len(), 1);
    assert_eq!(info.enums().len(), 1);
    assert_eq!(info.error_enums().len(), 1);
    assert_eq!(info.events().len(), 1);
}

#[test]
fn test_sample_module_preserves_declaration_order() {
    let info = ContractInfo::from_wasm(&sample_module()).unwrap();
    let names: Vec<String> = info
        .functions()
        .iter()
        .map(|f| f.name.to_utf8_string_lossy())
        .collect();
    assert_eq!(names, ["hello", "add", "mint", "set_flag", "store"]);
    assert_eq!(info.entries(), sample_entries().as_slice());
}

#[test]
fn test_sample_module_meta_and_version() {
    let info = ContractInfo::from_wasm(&sample_module()).unwrap();

    assert_eq!(info.protocol_version(), 22);
    assert_eq!(info.pre_release_version(), 0);
    assert_eq!(info.env_interface_version(), 22u64 << 32);
    assert_eq!(info.meta_value("rsver"), Some("1.81.0"));
    assert_eq!(info.supported_extensions(), ["41", "40"]);
}

#[test]
fn test_extract_spec_matches_contract_info() {
    let wasm = sample_module();
    let entries = extract_spec(&wasm).unwrap();
    assert_eq!(entries, ContractInfo::from_wasm(&wasm).unwrap().entries());
}

// ==================== Missing Sections ====================

#[test]
fn test_missing_env_meta() {
    let wasm = ModuleBuilder::new()
        .custom("contractspecv0", xdr_records(&sample_entries()))
        .build();
    assert!(matches!(
        ContractInfo::from_wasm(&wasm),
        Err(ParseError::EnvironmentMetaMissing)
    ));
}

#[test]
fn test_missing_spec() {
    let wasm = ModuleBuilder::new()
        .custom("contractenvmetav0", env_meta(22, 0))
        .build();
    assert!(matches!(
        ContractInfo::from_wasm(&wasm),
        Err(ParseError::DeclarationsMissing)
    ));
}

#[test]
fn test_missing_meta_is_empty() {
    let wasm = ModuleBuilder::new()
        .custom("contractenvmetav0", env_meta(21, 1))
        .custom("contractspecv0", xdr_records(&sample_entries()))
        .build();
    let info = ContractInfo::from_wasm(&wasm).unwrap();
    assert!(info.meta().is_empty());
    assert!(info.supported_extensions().is_empty());
    assert_eq!(info.pre_release_version(), 1);
}

#[test]
fn test_empty_spec_section_is_valid() {
    let wasm = ModuleBuilder::new()
        .custom("contractenvmetav0", env_meta(22, 0))
        .custom("contractspecv0", Vec::new())
        .build();
    let info = ContractInfo::from_wasm(&wasm).unwrap();
    assert!(info.entries().is_empty());
}

// ==================== Malformed Payloads ====================

#[test]
fn test_trailing_partial_record_fails() {
    let mut spec = xdr_records(&sample_entries());
    spec.extend_from_slice(&[0, 0, 0]);
    let wasm = ModuleBuilder::new()
        .custom("contractenvmetav0", env_meta(22, 0))
        .custom("contractspecv0", spec)
        .build();
    assert!(matches!(
        ContractInfo::from_wasm(&wasm),
        Err(ParseError::InvalidModule(_))
    ));
}

#[test]
fn test_garbled_meta_fails() {
    let wasm = ModuleBuilder::new()
        .custom("contractenvmetav0", env_meta(22, 0))
        .custom("contractmetav0", vec![0xff, 0xff, 0xff, 0xff])
        .custom("contractspecv0", Vec::new())
        .build();
    assert!(matches!(
        ContractInfo::from_wasm(&wasm),
        Err(ParseError::InvalidModule(_))
    ));
}

#[test]
fn test_deeply_nested_declaration_fails() {
    let wasm = ModuleBuilder::new()
        .custom("contractenvmetav0", env_meta(22, 0))
        .custom("contractspecv0", nested_option_function(2000))
        .build();
    assert!(matches!(
        ContractInfo::from_wasm(&wasm),
        Err(ParseError::InvalidModule(_))
    ));
    assert!(matches!(extract_spec(&wasm), Err(ParseError::InvalidModule(_))));
}

#[test]
fn test_moderately_nested_declaration_parses() {
    let wasm = ModuleBuilder::new()
        .custom("contractenvmetav0", env_meta(22, 0))
        .custom("contractspecv0", nested_option_function(10))
        .build();
    let info = ContractInfo::from_wasm(&wasm).unwrap();
    assert_eq!(info.functions().len(), 1);
    assert_eq!(
        soroban_contract_spec::format_type(&info.functions()[0].inputs.as_slice()[0].type_),
        format!("{}u32{}", "Option<".repeat(10), ">".repeat(10))
    );
}

#[test]
fn test_not_a_module() {
    assert!(matches!(
        ContractInfo::from_wasm(b"\x7fELF"),
        Err(ParseError::InvalidModule(_))
    ));
}

// ==================== Meta Semantics ====================

#[test]
fn test_repeated_meta_key_last_value_wins() {
    let wasm = ModuleBuilder::new()
        .custom("contractenvmetav0", env_meta(22, 0))
        .custom(
            "contractmetav0",
            meta(&[("sep", "1"), ("rsver", "1.80.0"), ("sep", "1, 10, 1, 24, 10")]),
        )
        .custom("contractspecv0", Vec::new())
        .build();
    let info = ContractInfo::from_wasm(&wasm).unwrap();

    let keys: Vec<&str> = info.meta().iter().map(|(k, _)| k.as_str()).collect();
    assert_eq!(keys, ["sep", "rsver"]);
    assert_eq!(info.supported_extensions(), ["1", "10", "24"]);
}

#[test]
fn test_split_sections_are_concatenated() {
    let entries = sample_entries();
    let (first, second) = entries.split_at(4);
    let wasm = ModuleBuilder::new()
        .custom("contractenvmetav0", env_meta(22, 0))
        .custom("contractspecv0", xdr_records(first))
        .custom("contractspecv0", xdr_records(second))
        .build();
    let info = ContractInfo::from_wasm(&wasm).unwrap();
    assert_eq!(info.entries(), entries.as_slice());
}

// ==================== Spec From Raw Entries ====================

#[test]
fn test_spec_from_xdr_payload() {
    let spec = Spec::from_xdr(&xdr_records(&sample_entries())).unwrap();
    assert_eq!(spec.entries().len(), 11);
    assert!(spec.function("mint").is_some());

    let mut bad = xdr_records(&sample_entries());
    bad.pop();
    assert!(Spec::from_xdr(&bad).unwrap_err().is_encoding());
}

#[test]
fn test_spec_from_deeply_nested_xdr_fails() {
    let err = Spec::from_xdr(&nested_option_function(2000)).unwrap_err();
    assert!(err.is_encoding());
    assert!(Spec::from_xdr(&nested_option_function(10)).is_ok());
}

#[test]
fn test_spec_from_base64_entries() {
    use stellar_xdr::curr::{Limits, WriteXdr};

    let encoded: Vec<String> = sample_entries()
        .iter()
        .map(|e| e.to_xdr_base64(Limits::none()).unwrap())
        .collect();
    let spec = Spec::from_base64_entries(encoded.as_slice()).unwrap();
    assert_eq!(spec.structs().len(), 2);
    assert!(Spec::from_base64_entries(&["not base64!"][..]).is_err());
}
