use crate::error::CompilerError;
use serde::Deserialize;

/// Host configuration for one compilation.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CompileOptions {
    /// 0 disables fast calls entirely; 1 and above enable them.
    pub optimization_level: u8,
    /// Name of the vector constructor (`vector` or `lib.vector`), if any.
    pub vector_ctor: Option<String>,
    /// Library holding `vector_ctor`; unset means it is a bare global.
    pub vector_lib: Option<String>,
    /// Globals the host may replace at runtime; never treated as builtins.
    pub mutable_globals: Vec<String>,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            optimization_level: 1,
            vector_ctor: None,
            vector_lib: None,
            mutable_globals: Vec::new(),
        }
    }
}

impl CompileOptions {
    /// Parse options from a TOML document. Missing keys take their defaults.
    pub fn from_toml(content: &str) -> Result<Self, CompilerError> {
        let options: CompileOptions = toml::from_str(content)?;
        if options.vector_lib.is_some() && options.vector_ctor.is_none() {
            return Err(CompilerError::InvalidOptions(
                "vector_lib is set without vector_ctor".into(),
            ));
        }
        Ok(options)
    }

    pub fn fast_calls_enabled(&self) -> bool {
        self.optimization_level >= 1
    }
}
