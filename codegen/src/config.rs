/// Settings for one code generation run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodegenConfig {
    /// Name of the single emitted class.
    pub class_name: String,
    /// `.limit stack` declared on every method.
    pub stack_limit: u16,
    /// `.limit locals` declared on every method.
    pub locals_limit: u16,
}

impl Default for CodegenConfig {
    fn default() -> Self {
        Self {
            class_name: "Main".to_string(),
            stack_limit: 128,
            locals_limit: 128,
        }
    }
}
