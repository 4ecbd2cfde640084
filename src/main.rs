//! Binary to generate C# model classes from a JSON Schema.
//!
//! Usage: `jsonschemacs <SCHEMA> [OUTPUT] [--array-type <list|array>] [--namespace <NAME>]`
//!
//! Writes generated C# source to `OUTPUT`, or to stdout when `OUTPUT` is
//! omitted.

use std::io::stdout;
use std::path::PathBuf;
use std::process;

use clap::{Parser, ValueEnum};
use json_schema_cs::{CodeGenError, GenerateSettings, generate_from_file, generate_to_writer};

/// Generate C# model classes from a JSON Schema document.
#[derive(Parser, Debug)]
struct Cli {
    /// Path to the JSON Schema document.
    schema: PathBuf,

    /// Output .cs file (stdout if omitted).
    output: Option<PathBuf>,

    /// Collection form for array-typed properties and default initializers.
    #[arg(long, value_enum, default_value = "list")]
    array_type: ArrayForm,

    /// C# namespace wrapping the generated types.
    #[arg(long, default_value = "Models")]
    namespace: String,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ArrayForm {
    /// `List<T>` properties, `new List<T> {..}` initializers.
    List,
    /// `T[]` properties, `new[] {..}` initializers.
    Array,
}

fn run(cli: Cli) -> Result<(), CodeGenError> {
    let settings: GenerateSettings = GenerateSettings {
        use_list: matches!(cli.array_type, ArrayForm::List),
        namespace: cli.namespace,
    };
    match cli.output {
        Some(output) => generate_from_file(&cli.schema, &output, &settings),
        None => {
            let schema_json: String = std::fs::read_to_string(&cli.schema)?;
            generate_to_writer(&schema_json, &mut stdout(), &settings)
        }
    }
}

fn main() {
    let cli: Cli = Cli::parse();
    if let Err(e) = run(cli) {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}
