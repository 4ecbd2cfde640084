//! Generate C# model classes from JSON Schema, with per-property
//! `default`-value initializers.

mod attributes;
mod csharp;
mod error;
mod graph;
mod schema;
mod settings;

pub use error::CodeGenError;
pub use schema::JsonSchema;
pub use settings::GenerateSettings;

use std::io::Write;
use std::path::Path;

/// Generate C# model classes from a JSON Schema string and write to `writer`.
///
/// The writer can be any type implementing `Write`, such as `File`, `Vec<u8>`, or
/// `Cursor<Vec<u8>>`, enabling easy unit testing without file system interaction.
/// The artifact is rendered in full before any byte is written, so a failed
/// run leaves no partial output.
///
/// # Errors
///
/// Returns `CodeGenError` if the schema JSON is invalid, the root is not an
/// object, a default value cannot be formatted for its resolved type, or
/// writing to the writer fails.
pub fn generate_to_writer<W: Write>(
    schema_json: &str,
    writer: &mut W,
    settings: &GenerateSettings,
) -> Result<(), CodeGenError> {
    csharp::generate_to_writer(schema_json, writer, settings)
}

/// Generate C# model classes from a JSON Schema file and write to an output file.
///
/// The output file is only created after generation has fully succeeded.
///
/// # Errors
///
/// Returns `CodeGenError` if reading the input file fails, the schema JSON is
/// invalid, the root is not an object, a default value cannot be formatted
/// for its resolved type, or writing the output file fails.
pub fn generate_from_file(
    input_path: impl AsRef<Path>,
    output_path: impl AsRef<Path>,
    settings: &GenerateSettings,
) -> Result<(), CodeGenError> {
    let schema_json: String = std::fs::read_to_string(input_path)?;
    let mut buffer: Vec<u8> = Vec::new();
    generate_to_writer(&schema_json, &mut buffer, settings)?;
    std::fs::write(output_path, buffer)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generate_from_file_writes_output() {
        let dir: tempfile::TempDir = tempfile::tempdir().expect("tempdir should create");
        let input: std::path::PathBuf = dir.path().join("schema.json");
        let output: std::path::PathBuf = dir.path().join("models.cs");
        std::fs::write(
            &input,
            r#"{
                "type": "object",
                "title": "Widget",
                "properties": { "name": { "type": "string" } }
            }"#,
        )
        .expect("schema file should write");

        generate_from_file(&input, &output, &GenerateSettings::default())
            .expect("generation should succeed");

        let generated: String = std::fs::read_to_string(&output).expect("output file exists");
        assert!(generated.contains("public partial class Widget : GameObject"));
    }

    #[test]
    fn generate_from_file_failed_run_creates_no_output() {
        let dir: tempfile::TempDir = tempfile::tempdir().expect("tempdir should create");
        let input: std::path::PathBuf = dir.path().join("schema.json");
        let output: std::path::PathBuf = dir.path().join("models.cs");
        std::fs::write(&input, r#"{ "type": "string" }"#).expect("schema file should write");

        let result = generate_from_file(&input, &output, &GenerateSettings::default());
        assert!(result.is_err(), "a non-object root must fail");
        assert!(
            !output.exists(),
            "no output file may exist after a failed run"
        );
    }
}
