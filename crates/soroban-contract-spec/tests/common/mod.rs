//! Shared fixtures: a sample contract interface and a minimal WASM module
//! writer that embeds it in custom sections.

#![allow(dead_code)]

use stellar_xdr::curr::{
    Limits, ScEnvMetaEntry, ScEnvMetaEntryInterfaceVersion, ScMetaEntry, ScMetaV0,
    ScSpecEntry, ScSpecEventDataFormat, ScSpecEventParamLocationV0, ScSpecEventParamV0,
    ScSpecEventV0, ScSpecFunctionInputV0, ScSpecFunctionV0, ScSpecTypeDef, ScSpecTypeOption,
    ScSpecTypeTuple, ScSpecTypeUdt, ScSpecTypeVec, ScSpecUdtEnumCaseV0, ScSpecUdtEnumV0,
    ScSpecUdtErrorEnumCaseV0, ScSpecUdtErrorEnumV0, ScSpecUdtStructFieldV0, ScSpecUdtStructV0,
    ScSpecUdtUnionCaseTupleV0, ScSpecUdtUnionCaseV0, ScSpecUdtUnionCaseVoidV0, ScSpecUdtUnionV0,
    ScSymbol, StringM, WriteXdr,
};

pub fn udt(name: &str) -> ScSpecTypeDef {
    ScSpecTypeDef::Udt(ScSpecTypeUdt {
        name: name.try_into().unwrap(),
    })
}

pub fn option(t: ScSpecTypeDef) -> ScSpecTypeDef {
    ScSpecTypeDef::Option(Box::new(ScSpecTypeOption {
        value_type: Box::new(t),
    }))
}

pub fn vec_of(t: ScSpecTypeDef) -> ScSpecTypeDef {
    ScSpecTypeDef::Vec(Box::new(ScSpecTypeVec {
        element_type: Box::new(t),
    }))
}

pub fn tuple(types: Vec<ScSpecTypeDef>) -> ScSpecTypeDef {
    ScSpecTypeDef::Tuple(Box::new(ScSpecTypeTuple {
        value_types: types.try_into().unwrap(),
    }))
}

fn text<const N: u32>(s: &str) -> StringM<N> {
    s.try_into().unwrap()
}

pub fn function(name: &str, inputs: &[(&str, ScSpecTypeDef)], output: Option<ScSpecTypeDef>) -> ScSpecEntry {
    ScSpecEntry::FunctionV0(ScSpecFunctionV0 {
        doc: StringM::default(),
        name: ScSymbol(text(name)),
        inputs: inputs
            .iter()
            .map(|(n, t)| ScSpecFunctionInputV0 {
                doc: StringM::default(),
                name: text(n),
                type_: t.clone(),
            })
            .collect::<Vec<_>>()
            .try_into()
            .unwrap(),
        outputs: output.into_iter().collect::<Vec<_>>().try_into().unwrap(),
    })
}

pub fn structure(name: &str, fields: &[(&str, ScSpecTypeDef)]) -> ScSpecEntry {
    ScSpecEntry::UdtStructV0(ScSpecUdtStructV0 {
        doc: StringM::default(),
        lib: StringM::default(),
        name: text(name),
        fields: fields
            .iter()
            .map(|(n, t)| ScSpecUdtStructFieldV0 {
                doc: StringM::default(),
                name: text(n),
                type_: t.clone(),
            })
            .collect::<Vec<_>>()
            .try_into()
            .unwrap(),
    })
}

/// Union cases: `None` types make a void case.
pub fn union(name: &str, cases: &[(&str, Option<Vec<ScSpecTypeDef>>)]) -> ScSpecEntry {
    ScSpecEntry::UdtUnionV0(ScSpecUdtUnionV0 {
        doc: StringM::default(),
        lib: StringM::default(),
        name: text(name),
        cases: cases
            .iter()
            .map(|(n, types)| match types {
                None => ScSpecUdtUnionCaseV0::VoidV0(ScSpecUdtUnionCaseVoidV0 {
                    doc: StringM::default(),
                    name: text(n),
                }),
                Some(types) => ScSpecUdtUnionCaseV0::TupleV0(ScSpecUdtUnionCaseTupleV0 {
                    doc: StringM::default(),
                    name: text(n),
                    type_: types.clone().try_into().unwrap(),
                }),
            })
            .collect::<Vec<_>>()
            .try_into()
            .unwrap(),
    })
}

pub fn enumeration(name: &str, cases: &[(&str, u32)]) -> ScSpecEntry {
    ScSpecEntry::UdtEnumV0(ScSpecUdtEnumV0 {
        doc: StringM::default(),
        lib: StringM::default(),
        name: text(name),
        cases: cases
            .iter()
            .map(|(n, v)| ScSpecUdtEnumCaseV0 {
                doc: StringM::default(),
                name: text(n),
                value: *v,
            })
            .collect::<Vec<_>>()
            .try_into()
            .unwrap(),
    })
}

pub fn error_enumeration(name: &str, cases: &[(&str, u32)]) -> ScSpecEntry {
    ScSpecEntry::UdtErrorEnumV0(ScSpecUdtErrorEnumV0 {
        doc: StringM::default(),
        lib: StringM::default(),
        name: text(name),
        cases: cases
            .iter()
            .map(|(n, v)| ScSpecUdtErrorEnumCaseV0 {
                doc: StringM::default(),
                name: text(n),
                value: *v,
            })
            .collect::<Vec<_>>()
            .try_into()
            .unwrap(),
    })
}

pub fn event(name: &str, topics: &[(&str, ScSpecTypeDef)], data: &[(&str, ScSpecTypeDef)]) -> ScSpecEntry {
    let param = |location: ScSpecEventParamLocationV0| {
        move |(n, t): &(&str, ScSpecTypeDef)| ScSpecEventParamV0 {
            doc: StringM::default(),
            name: text(n),
            type_: t.clone(),
            location,
        }
    };
    let params: Vec<ScSpecEventParamV0> = topics
        .iter()
        .map(param(ScSpecEventParamLocationV0::TopicList))
        .chain(data.iter().map(param(ScSpecEventParamLocationV0::Data)))
        .collect();

    ScSpecEntry::EventV0(ScSpecEventV0 {
        doc: StringM::default(),
        lib: StringM::default(),
        name: ScSymbol(text(name)),
        prefix_topics: vec![ScSymbol(text(name))].try_into().unwrap(),
        params: params.try_into().unwrap(),
        data_format: ScSpecEventDataFormat::SingleValue,
    })
}

/// The interface of a small token-like sample contract.
pub fn sample_entries() -> Vec<ScSpecEntry> {
    vec![
        function("hello", &[("to", ScSpecTypeDef::Symbol)], Some(vec_of(ScSpecTypeDef::Symbol))),
        function(
            "add",
            &[("a", ScSpecTypeDef::U32), ("b", ScSpecTypeDef::U32)],
            Some(ScSpecTypeDef::U32),
        ),
        function(
            "mint",
            &[("to", ScSpecTypeDef::Address), ("amount", ScSpecTypeDef::I128)],
            None,
        ),
        function("set_flag", &[("flag", udt("Flag"))], Some(udt("Flag"))),
        function(
            "store",
            &[
                ("data", udt("Data")),
                ("choice", udt("Choice")),
                ("pair", tuple(vec![ScSpecTypeDef::String, ScSpecTypeDef::U32])),
                ("memo", option(ScSpecTypeDef::String)),
            ],
            Some(udt("Data")),
        ),
        structure("Data", &[("count", ScSpecTypeDef::U32), ("label", ScSpecTypeDef::Symbol)]),
        structure("Point", &[("0", ScSpecTypeDef::I32), ("1", ScSpecTypeDef::I32)]),
        union(
            "Choice",
            &[
                ("none", None),
                ("some", Some(vec![ScSpecTypeDef::String, ScSpecTypeDef::U32])),
            ],
        ),
        enumeration("Flag", &[("optionA", 1), ("optionB", 2), ("optionC", 3)]),
        error_enumeration("Error", &[("NotFound", 1), ("Unauthorized", 2)]),
        event(
            "transfer",
            &[("from", ScSpecTypeDef::Address), ("to", ScSpecTypeDef::Address)],
            &[("amount", ScSpecTypeDef::I128)],
        ),
    ]
}

/// XDR-encode records back to back, as they appear in a custom section.
pub fn xdr_records<T: WriteXdr>(records: &[T]) -> Vec<u8> {
    records
        .iter()
        .flat_map(|r| r.to_xdr(Limits::none()).unwrap())
        .collect()
}

pub fn env_meta(protocol: u32, pre_release: u32) -> Vec<u8> {
    xdr_records(&[ScEnvMetaEntry::ScEnvMetaKindInterfaceVersion(
        ScEnvMetaEntryInterfaceVersion {
            protocol,
            pre_release,
        },
    )])
}

pub fn meta(pairs: &[(&str, &str)]) -> Vec<u8> {
    let entries: Vec<ScMetaEntry> = pairs
        .iter()
        .map(|(k, v)| {
            ScMetaEntry::ScMetaV0(ScMetaV0 {
                key: (*k).try_into().unwrap(),
                val: (*v).try_into().unwrap(),
            })
        })
        .collect();
    xdr_records(&entries)
}

fn xdr_str(s: &str, out: &mut Vec<u8>) {
    out.extend_from_slice(&(s.len() as u32).to_be_bytes());
    out.extend_from_slice(s.as_bytes());
    out.resize(out.len() + (4 - s.len() % 4) % 4, 0);
}

/// Raw XDR of a function `deep(x)` whose parameter type is `depth` nested
/// options around `u32`. Written by hand so building it never recurses.
pub fn nested_option_function(depth: usize) -> Vec<u8> {
    const FUNCTION_V0: u32 = 0;
    const TYPE_U32: u32 = 4;
    const TYPE_OPTION: u32 = 1000;

    let mut out = FUNCTION_V0.to_be_bytes().to_vec();
    xdr_str("", &mut out);
    xdr_str("deep", &mut out);
    out.extend_from_slice(&1u32.to_be_bytes());
    xdr_str("", &mut out);
    xdr_str("x", &mut out);
    for _ in 0..depth {
        out.extend_from_slice(&TYPE_OPTION.to_be_bytes());
    }
    out.extend_from_slice(&TYPE_U32.to_be_bytes());
    out.extend_from_slice(&0u32.to_be_bytes());
    out
}

fn leb128(mut n: usize, out: &mut Vec<u8>) {
    loop {
        let byte = (n & 0x7f) as u8;
        n >>= 7;
        if n == 0 {
            out.push(byte);
            return;
        }
        out.push(byte | 0x80);
    }
}

/// Minimal WASM module builder: header plus custom sections.
#[derive(Default)]
pub struct ModuleBuilder {
    sections: Vec<(String, Vec<u8>)>,
}

impl ModuleBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn custom(mut self, name: &str, payload: Vec<u8>) -> Self {
        self.sections.push((name.to_string(), payload));
        self
    }

    pub fn build(self) -> Vec<u8> {
        let mut out = b"\0asm\x01\0\0\0".to_vec();
        for (name, payload) in self.sections {
            let mut body = Vec::new();
            leb128(name.len(), &mut body);
            body.extend_from_slice(name.as_bytes());
            body.extend(payload);
            out.push(0);
            leb128(body.len(), &mut out);
            out.extend(body);
        }
        out
    }
}

/// A complete sample contract module.
pub fn sample_module() -> Vec<u8> {
    ModuleBuilder::new()
        .custom("contractenvmetav0", env_meta(22, 0))
        .custom("contractmetav0", meta(&[("rsver", "1.81.0"), ("sep", "41, 40")]))
        .custom("contractspecv0", xdr_records(&sample_entries()))
        .build()
}
