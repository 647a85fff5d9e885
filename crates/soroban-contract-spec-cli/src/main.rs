use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use stellar_xdr::curr::{
    Limits, ScSpecEntry, ScSpecEventDataFormat, ScSpecEventParamLocationV0, ScSpecEventV0,
    ScSpecTypeDef, ScSpecUdtUnionCaseV0, WriteXdr,
};
use tracing_subscriber::{fmt, EnvFilter};

use soroban_contract_spec::{format_type, ContractInfo, NativeValue};

#[derive(Parser)]
#[command(name = "soroban-spec")]
#[command(about = "Inspect Soroban contract specs and encode invocation arguments")]
struct Cli {
    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the contract's environment version, meta and declarations as JSON
    Inspect {
        /// Path to the input .wasm file
        #[arg(short, long)]
        input: PathBuf,
    },
    /// Encode a JSON object of named arguments as base64 XDR `ScVal`s
    Args {
        /// Path to the input .wasm file
        #[arg(short, long)]
        input: PathBuf,

        /// Contract function to encode arguments for
        #[arg(short, long)]
        function: String,

        /// Arguments as a JSON object keyed by parameter name
        #[arg(short, long, default_value = "{}")]
        args: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Inspect { input } => {
            let wasm = read_wasm(&input)?;
            let info = ContractInfo::from_wasm(&wasm)
                .with_context(|| format!("failed to parse {}", input.display()))?;
            println!("{}", info_to_json(&info, wasm.len())?);
        }
        Commands::Args {
            input,
            function,
            args,
        } => {
            let wasm = read_wasm(&input)?;
            let info = ContractInfo::from_wasm(&wasm)
                .with_context(|| format!("failed to parse {}", input.display()))?;
            let args = parse_args(&args)?;
            tracing::debug!(%function, supplied = args.len(), "encoding arguments");

            let vals = info
                .spec()
                .function_args_to_wire(&function, &args)
                .with_context(|| format!("failed to encode arguments for `{function}`"))?;
            for val in vals {
                println!("{}", val.to_xdr_base64(Limits::none())?);
            }
        }
    }

    Ok(())
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn read_wasm(path: &PathBuf) -> Result<Vec<u8>> {
    fs::read(path).with_context(|| format!("failed to read {}", path.display()))
}

fn parse_args(raw: &str) -> Result<HashMap<String, NativeValue>> {
    let json: serde_json::Value = serde_json::from_str(raw).context("--args is not valid JSON")?;
    let serde_json::Value::Object(obj) = json else {
        bail!("--args must be a JSON object keyed by parameter name");
    };
    obj.iter()
        .map(|(name, value)| -> Result<(String, NativeValue)> {
            let native = NativeValue::from_json(value)
                .with_context(|| format!("argument `{name}`"))?;
            Ok((name.clone(), native))
        })
        .collect()
}

// -- JSON serialization (CLI-only concern) --

fn info_to_json(info: &ContractInfo, wasm_size: usize) -> Result<String> {
    let output = ContractJson {
        wasm_size,
        protocol_version: info.protocol_version(),
        pre_release_version: info.pre_release_version(),
        meta: info
            .meta()
            .iter()
            .map(|(key, value)| MetaJson { key, value })
            .collect(),
        supported_extensions: info.supported_extensions(),
        declarations: info.entries().iter().map(DeclJson::from).collect(),
    };
    serde_json::to_string_pretty(&output).context("failed to serialize")
}

fn typed(name: String, ty: &ScSpecTypeDef) -> TypedJson {
    TypedJson {
        name,
        r#type: format_type(ty),
    }
}

fn event_params(event: &ScSpecEventV0, location: ScSpecEventParamLocationV0) -> Vec<TypedJson> {
    event
        .params
        .iter()
        .filter(|p| p.location == location)
        .map(|p| typed(p.name.to_utf8_string_lossy(), &p.type_))
        .collect()
}

impl From<&ScSpecEntry> for DeclJson {
    fn from(entry: &ScSpecEntry) -> Self {
        match entry {
            ScSpecEntry::FunctionV0(f) => DeclJson::Function {
                name: f.name.to_utf8_string_lossy(),
                inputs: f
                    .inputs
                    .iter()
                    .map(|i| typed(i.name.to_utf8_string_lossy(), &i.type_))
                    .collect(),
                output: f.outputs.to_option().map(|t| format_type(&t)),
            },
            ScSpecEntry::UdtStructV0(s) => DeclJson::Struct {
                name: s.name.to_utf8_string_lossy(),
                fields: s
                    .fields
                    .iter()
                    .map(|f| typed(f.name.to_utf8_string_lossy(), &f.type_))
                    .collect(),
            },
            ScSpecEntry::UdtUnionV0(u) => DeclJson::Union {
                name: u.name.to_utf8_string_lossy(),
                cases: u
                    .cases
                    .iter()
                    .map(|c| match c {
                        ScSpecUdtUnionCaseV0::VoidV0(v) => UnionCaseJson {
                            name: v.name.to_utf8_string_lossy(),
                            types: Vec::new(),
                        },
                        ScSpecUdtUnionCaseV0::TupleV0(t) => UnionCaseJson {
                            name: t.name.to_utf8_string_lossy(),
                            types: t.type_.iter().map(format_type).collect(),
                        },
                    })
                    .collect(),
            },
            ScSpecEntry::UdtEnumV0(e) => DeclJson::Enum {
                name: e.name.to_utf8_string_lossy(),
                cases: e
                    .cases
                    .iter()
                    .map(|c| CodeJson {
                        name: c.name.to_utf8_string_lossy(),
                        value: c.value,
                    })
                    .collect(),
            },
            ScSpecEntry::UdtErrorEnumV0(e) => DeclJson::ErrorEnum {
                name: e.name.to_utf8_string_lossy(),
                cases: e
                    .cases
                    .iter()
                    .map(|c| CodeJson {
                        name: c.name.to_utf8_string_lossy(),
                        value: c.value,
                    })
                    .collect(),
            },
            ScSpecEntry::EventV0(e) => DeclJson::Event {
                name: e.name.to_utf8_string_lossy(),
                prefix_topics: e
                    .prefix_topics
                    .iter()
                    .map(|t| t.to_utf8_string_lossy())
                    .collect(),
                topics: event_params(e, ScSpecEventParamLocationV0::TopicList),
                data: event_params(e, ScSpecEventParamLocationV0::Data),
                data_format: match e.data_format {
                    ScSpecEventDataFormat::SingleValue => "single_value",
                    ScSpecEventDataFormat::Vec => "vec",
                    ScSpecEventDataFormat::Map => "map",
                },
            },
        }
    }
}

// -- JSON types --

#[derive(Serialize)]
struct ContractJson<'a> {
    wasm_size: usize,
    protocol_version: u32,
    pre_release_version: u32,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    meta: Vec<MetaJson<'a>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    supported_extensions: Vec<String>,
    declarations: Vec<DeclJson>,
}

#[derive(Serialize)]
struct MetaJson<'a> {
    key: &'a str,
    value: &'a str,
}

/// One declaration entry, tagged by `kind` and listed in module order.
#[derive(Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum DeclJson {
    Function {
        name: String,
        inputs: Vec<TypedJson>,
        #[serde(skip_serializing_if = "Option::is_none")]
        output: Option<String>,
    },
    Struct {
        name: String,
        fields: Vec<TypedJson>,
    },
    Union {
        name: String,
        cases: Vec<UnionCaseJson>,
    },
    Enum {
        name: String,
        cases: Vec<CodeJson>,
    },
    ErrorEnum {
        name: String,
        cases: Vec<CodeJson>,
    },
    Event {
        name: String,
        prefix_topics: Vec<String>,
        topics: Vec<TypedJson>,
        data: Vec<TypedJson>,
        data_format: &'static str,
    },
}

#[derive(Serialize)]
struct TypedJson {
    name: String,
    r#type: String,
}

#[derive(Serialize)]
struct UnionCaseJson {
    name: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    types: Vec<String>,
}

#[derive(Serialize)]
struct CodeJson {
    name: String,
    value: u32,
}
