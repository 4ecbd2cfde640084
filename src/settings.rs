//! Settings for C# code generation.

/// Settings that control code generation behavior.
#[derive(Debug, Clone)]
pub struct GenerateSettings {
    /// When true, array-typed properties use `List<T>` and multi-element
    /// default arrays render as `new List<T> {..}`; when false, `T[]` and
    /// `new[] {..}`.
    ///
    /// **Default: true (generic list form).**
    pub use_list: bool,

    /// C# namespace wrapping all generated types.
    ///
    /// **Default: `"Models"`.**
    pub namespace: String,
}

impl Default for GenerateSettings {
    fn default() -> Self {
        Self {
            use_list: true,
            namespace: "Models".to_string(),
        }
    }
}
