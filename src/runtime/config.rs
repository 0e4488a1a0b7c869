use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Interpreter settings a host may tune or load from JSON
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InterpreterConfig {
    /// Maximum nesting of function calls before `StackOverflow` is raised
    pub max_call_depth: usize,
    /// Directories searched (in order) for program files and user code
    pub source_dirs: Vec<PathBuf>,
    /// Number of parsed programs kept in the cache
    pub program_cache_size: usize,
    /// Number of compiled regular expressions kept in the cache
    pub regex_cache_size: usize,
    /// Log failed evaluations at debug level
    pub verbose: bool,
}

impl Default for InterpreterConfig {
    fn default() -> Self {
        InterpreterConfig {
            max_call_depth: 10_000,
            source_dirs: Vec::new(),
            program_cache_size: 64,
            regex_cache_size: 32,
            verbose: false,
        }
    }
}

impl InterpreterConfig {
    /// Sets the call depth limit
    pub fn with_max_call_depth(mut self, depth: usize) -> Self {
        self.max_call_depth = depth;
        self
    }

    /// Appends a source directory
    pub fn with_source_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.source_dirs.push(dir.into());
        self
    }

    /// Enables or disables verbose diagnostics
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Parses a configuration from JSON, filling unspecified fields with defaults
    pub fn from_json(json: &str) -> crate::Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| crate::Error::runtime(format!("invalid interpreter configuration: {}", e)))
    }
}
