//! CLI: enumerate, resolve and narrow over schema files; read, check and
//! infer over JSON/NDJSON inputs.
use std::path::PathBuf;

use anyhow::{Context, Result, anyhow, bail};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use rayon::prelude::*;
use serde_json::Value;
use tracing::{debug, warn};

use json_paths::conform::conforms;
use json_paths::{Depth, EngineConfig, Path, Schema, Ty, ValidationError, accessor, infer};

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// enumerate, resolve and narrow dot-separated paths over a JSON schema description
#[derive(Parser, Debug)]
#[command(name = "json-paths", version)]
pub struct CommandLineInterface {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// list every path of the schema up to the depth budget
    Paths(PathsOut),
    /// print the type a path resolves to
    Resolve(ResolveOut),
    /// print the schema type after the slot at a path is known to hold a type
    Narrow(NarrowOut),
    /// print an object type holding only the given paths
    Pick(PickOut),
    /// read the value at a path from each input document
    Get(GetOut),
    /// check that paths are present (and conform to the schema) in each input document
    Check(CheckOut),
    /// infer a schema file from sample documents
    Infer(InferOut),
}

#[derive(Args, Debug, Clone)]
struct SchemaSettings {
    /// schema file: { "root": Ty, "defs": { name: Ty }, "opaque": [name] }
    #[arg(long, short)]
    schema: PathBuf,

    /// engine config file (JSON): { "depth": 5, "opaque": [name] }
    #[arg(long)]
    config: Option<PathBuf>,

    /// depth budget, overrides the config file
    #[arg(long)]
    depth: Option<u8>,
}

#[derive(Args, Debug, Clone)]
struct InputSettings {
    /// treat input as newline-delimited JSON (NDJSON)
    #[arg(long, default_value_t = false)]
    ndjson: bool,

    /// JSON Pointer to select a subnode in each document (e.g. /data/items/0/payload)
    #[arg(long)]
    json_pointer: Option<String>,

    /// JQ pre-process filter for each document.
    #[arg(long)]
    jq_expr: Option<String>,

    /// One or more inputs. May be literal paths or quoted glob patterns
    #[arg(long, short, num_args = 1.., required = true)]
    input: Vec<String>,
}

#[derive(clap::Parser, Debug)]
struct PathsOut {
    #[command(flatten)]
    schema_settings: SchemaSettings,

    /// only paths whose declared type fits this one (a primitive name or a Ty as JSON)
    #[arg(long, value_parser = parse_ty)]
    ending_in: Option<Ty>,

    /// print a JSON array instead of one path per line
    #[arg(long)]
    json: bool,
}

#[derive(clap::Parser, Debug)]
struct ResolveOut {
    #[command(flatten)]
    schema_settings: SchemaSettings,

    #[arg(long, short)]
    path: Path,
}

#[derive(clap::Parser, Debug)]
struct NarrowOut {
    #[command(flatten)]
    schema_settings: SchemaSettings,

    #[arg(long, short)]
    path: Path,

    /// type the slot is known to hold (a primitive name or a Ty as JSON)
    #[arg(long, value_parser = parse_ty)]
    refined: Ty,

    /// print the narrowed type as a Ty JSON document
    #[arg(long)]
    json: bool,
}

#[derive(clap::Parser, Debug)]
struct PickOut {
    #[command(flatten)]
    schema_settings: SchemaSettings,

    #[arg(long, short, num_args = 1.., required = true)]
    path: Vec<Path>,

    /// print the picked type as a Ty JSON document
    #[arg(long)]
    json: bool,
}

#[derive(clap::Parser, Debug)]
struct GetOut {
    #[command(flatten)]
    input_settings: InputSettings,

    #[arg(long, short)]
    path: Path,
}

#[derive(clap::Parser, Debug)]
struct CheckOut {
    #[command(flatten)]
    input_settings: InputSettings,

    /// paths that must be present and not null
    #[arg(long, short, num_args = 1..)]
    path: Vec<Path>,

    /// also check each document against this schema file
    #[arg(long, short)]
    schema: Option<PathBuf>,

    /// engine config file used with --schema
    #[arg(long)]
    config: Option<PathBuf>,

    /// exit with an error when any document fails
    #[arg(long)]
    assert: bool,
}

#[derive(clap::Parser, Debug)]
struct InferOut {
    #[command(flatten)]
    input_settings: InputSettings,

    /// output schema file (stdout if omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl SchemaSettings {
    fn load(&self) -> Result<(Schema, Depth)> {
        let config = load_config(self.config.as_ref())?;
        let schema = load_schema(&self.schema, &config)?;
        let depth = match self.depth {
            Some(depth) => Depth::new(depth)?,
            None => config.depth,
        };
        Ok((schema, depth))
    }
}

impl InputSettings {
    fn load_documents(&self) -> Result<Vec<Value>> {
        let source_paths = resolve_file_path_patterns(&self.input)
            .context("failed to resolve input file paths")?;
        let mut documents = Vec::new();
        for source_path in source_paths {
            let source = std::fs::read_to_string(&source_path)
                .with_context(|| format!("failed to read source file {}", source_path.display()))?;
            let parsed = if self.ndjson {
                source
                    .lines()
                    .enumerate()
                    .filter(|(_, line)| !line.trim().is_empty())
                    .map(|(i, line)| {
                        serde_json::from_str::<Value>(line).with_context(|| {
                            format!("failed to parse NDJSON line {} of {}", i + 1, source_path.display())
                        })
                    })
                    .collect::<Result<Vec<_>>>()?
            } else {
                vec![serde_json::from_str::<Value>(&source)
                    .with_context(|| format!("failed to parse JSON source file {}", source_path.display()))?]
            };
            for document in parsed {
                self.select(document, &source_path, &mut documents)?;
            }
        }
        debug!(count = documents.len(), "loaded input documents");
        Ok(documents)
    }

    fn select(&self, document: Value, source_path: &std::path::Path, out: &mut Vec<Value>) -> Result<()> {
        let document = match self.json_pointer.as_deref() {
            None => document,
            Some(pointer) => match document.pointer(pointer) {
                Some(node) => node.clone(),
                None => {
                    warn!(pointer, source = %source_path.display(), "JSON pointer matched nothing, document skipped");
                    return Ok(());
                }
            },
        };
        match self.jq_expr.as_ref() {
            None => out.push(document),
            Some(jq_expr) => {
                let results = crate::jq_exec::run_jaq(jq_expr, &document).with_context(|| {
                    format!("failed to apply jq expression to source file {}", source_path.display())
                })?;
                out.extend(results);
            }
        }
        Ok(())
    }
}

impl CommandLineInterface {
    pub fn load() -> Self {
        Self::parse()
    }

    pub fn run(&self) -> Result<()> {
        match &self.cmd {
            Command::Paths(target) => {
                let (schema, depth) = target.schema_settings.load()?;
                let paths = match target.ending_in.as_ref() {
                    Some(ty) => schema.paths_ending_in(ty, depth),
                    None => schema.enumerate_paths(depth),
                };
                if target.json {
                    let list: Vec<String> = paths.iter().map(Path::to_string).collect();
                    println!("{}", serde_json::to_string_pretty(&list)?);
                } else {
                    for path in &paths {
                        println!("{path}");
                    }
                }
            }
            Command::Resolve(target) => {
                let (schema, _) = target.schema_settings.load()?;
                println!("{}", schema.resolve(&target.path));
            }
            Command::Narrow(target) => {
                let (schema, _) = target.schema_settings.load()?;
                let narrowed = schema.narrow(&target.path, &target.refined);
                print_ty(&narrowed, target.json)?;
            }
            Command::Pick(target) => {
                let (schema, _) = target.schema_settings.load()?;
                let picked = schema.pick_paths(&target.path);
                print_ty(&picked, target.json)?;
            }
            Command::Get(target) => {
                for document in target.input_settings.load_documents()? {
                    match accessor::get(&document, &target.path) {
                        Some(value) => println!("{value}"),
                        None => println!("{}", "absent".dimmed()),
                    }
                }
            }
            Command::Check(target) => {
                let schema = match target.schema.as_ref() {
                    Some(path) => Some(load_schema(path, &load_config(target.config.as_ref())?)?),
                    None => None,
                };
                let documents = target.input_settings.load_documents()?;
                let outcomes: Vec<Result<(), ValidationError>> = documents
                    .par_iter()
                    .map(|document| check_document(document, &target.path, schema.as_ref()))
                    .collect();

                let mut failed = 0usize;
                for (i, outcome) in outcomes.iter().enumerate() {
                    match outcome {
                        Ok(()) => println!("{} document {i}", "✓".green()),
                        Err(error) => {
                            failed += 1;
                            println!("{} document {i}: {error}", "✗".red());
                        }
                    }
                }
                eprintln!("{} passed, {} failed", outcomes.len() - failed, failed);
                if target.assert && failed > 0 {
                    bail!("{failed} of {} documents failed the check", outcomes.len());
                }
            }
            Command::Infer(target) => {
                let documents = target.input_settings.load_documents()?;
                let root = infer::infer_from_values(&documents);
                let schema_src = serde_json::to_string_pretty(&Schema::new(root).to_json()?)?;
                if let Some(out) = target.out.as_ref() {
                    if let Some(parent) = out.parent() {
                        std::fs::create_dir_all(parent)
                            .with_context(|| format!("failed to create {}", parent.display()))?;
                    }
                    std::fs::write(out, &schema_src)
                        .with_context(|| format!("failed to write {}", out.display()))?;
                } else {
                    println!("{schema_src}");
                }
            }
        }
        Ok(())
    }
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

fn check_document(document: &Value, paths: &[Path], schema: Option<&Schema>) -> Result<(), ValidationError> {
    accessor::assert_all_present(document, paths)?;
    match schema {
        Some(schema) if !conforms(schema, document, schema.root()) => Err(ValidationError::new(
            "Document does not conform to the schema",
            Vec::new(),
            document,
        )),
        _ => Ok(()),
    }
}

fn load_config(path: Option<&PathBuf>) -> Result<EngineConfig> {
    let Some(path) = path else {
        return Ok(EngineConfig::default());
    };
    let bytes = std::fs::read(path).with_context(|| format!("failed to read config {}", path.display()))?;
    EngineConfig::from_json_slice(&bytes).with_context(|| format!("invalid config {}", path.display()))
}

fn load_schema(path: &PathBuf, config: &EngineConfig) -> Result<Schema> {
    let bytes = std::fs::read(path).with_context(|| format!("failed to read schema {}", path.display()))?;
    let schema = Schema::from_json_slice(&bytes)
        .with_context(|| format!("invalid schema {}", path.display()))?
        .with_config(config);
    Ok(schema)
}

fn print_ty(ty: &Ty, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(ty)?);
    } else {
        println!("{ty}");
    }
    Ok(())
}

/// `string`, `integer`, ... or a full Ty document such as `{"type":"array_list","item":{"type":"string"}}`.
fn parse_ty(src: &str) -> Result<Ty> {
    let src = src.trim();
    let value = if src.starts_with('{') {
        serde_json::from_str::<Value>(src)?
    } else {
        serde_json::json!({ "type": src })
    };
    serde_json::from_value(value).map_err(|error| anyhow!("not a type: {src} ({error})"))
}

fn resolve_file_path_patterns<I>(patterns: I) -> Result<Vec<PathBuf>>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    fn has_glob_chars(s: &str) -> bool {
        // Minimal glob detection for the `glob` crate syntax.
        s.bytes().any(|b| matches!(b, b'*' | b'?' | b'[' | b'{' ))
    }

    let mut out = Vec::<PathBuf>::new();

    for raw in patterns {
        let pattern = raw.as_ref();

        if has_glob_chars(pattern) {
            let mut matched_any = false;
            for entry in glob::glob(pattern)? {
                out.push(entry?);
                matched_any = true;
            }
            if !matched_any {
                // Pattern was explicitly a glob but matched nothing -> surface as an error
                bail!("glob pattern matched no files: {pattern}");
            }
        } else {
            out.push(PathBuf::from(pattern));
        }
    }

    Ok(out)
}
