//! Configuration loading
//!
//! Settings come from `searchleaks.toml` / `.searchleaks.yml` (or an explicit
//! `--config` file) and are then overridden by CLI flags.

use crate::analysis::pairs::AllocationPairDefinition;
use crate::error::{LeakError, LeakResult};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

const DEFAULT_LOCATIONS: &[&str] = &[
    "searchleaks.toml",
    ".searchleaks.toml",
    "searchleaks.yml",
    ".searchleaks.yml",
    "searchleaks.yaml",
    ".searchleaks.yaml",
];

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Extra pair definition files (`class ## opener ## closer` per line)
    pub pair_files: Vec<PathBuf>,

    /// Inline pair definitions
    pub pairs: Vec<AllocationPairDefinition>,

    /// Load the embedded Android pair catalog
    pub builtin_pairs: bool,

    /// Lifecycle methods that terminate a component
    pub exit_methods: Vec<String>,

    /// Lifecycle callbacks used as path-finder roots when the model declares
    /// no entry methods
    pub lifecycle_methods: Vec<String>,

    /// Platform base classes of Android components
    pub component_bases: Vec<String>,

    /// Treat subclasses of `component_bases` as entry-point classes
    pub infer_components: bool,

    /// Seed of the context-container computation
    pub context_class: String,

    /// UI classes whose static references are always leak candidates
    pub ui_classes: Vec<String>,

    /// Regexes on class names; findings anchored in matching classes are
    /// suppressed
    pub exclude: Vec<String>,

    /// Analyze pairs in parallel
    pub parallel: bool,

    /// Compute entry-point paths for each finding
    pub find_paths: bool,

    /// Run the static context field detector
    pub context_leaks: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            pair_files: Vec::new(),
            pairs: Vec::new(),
            builtin_pairs: true,
            exit_methods: vec![
                "onStop".to_string(),
                "onPause".to_string(),
                "onDestroy".to_string(),
            ],
            lifecycle_methods: [
                "onCreate",
                "onStart",
                "onResume",
                "onRestart",
                "onPause",
                "onStop",
                "onDestroy",
                "onReceive",
                "onBind",
                "onStartCommand",
                "onCreateView",
                "onHandleIntent",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            component_bases: [
                "android.app.Activity",
                "android.app.Service",
                "android.content.BroadcastReceiver",
                "android.content.ContentProvider",
                "android.app.Application",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            infer_components: true,
            context_class: "android.content.Context".to_string(),
            ui_classes: vec![
                "android.view.View".to_string(),
                "android.app.Activity".to_string(),
            ],
            exclude: Vec::new(),
            parallel: true,
            find_paths: true,
            context_leaks: false,
        }
    }
}

impl Config {
    /// Load from an explicit file; format chosen by extension
    pub fn from_file(path: &Path) -> LeakResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| LeakError::io(path, e))?;
        let parse_error = |message: String| LeakError::ConfigParse {
            path: path.to_path_buf(),
            message,
        };

        let mut config: Config = match path.extension().and_then(|e| e.to_str()) {
            Some("yml") | Some("yaml") => {
                serde_yaml::from_str(&content).map_err(|e| parse_error(e.to_string()))?
            }
            _ => toml::from_str(&content).map_err(|e| parse_error(e.to_string()))?,
        };

        // pair files are relative to the config file
        if let Some(dir) = path.parent() {
            for file in &mut config.pair_files {
                if file.is_relative() {
                    *file = dir.join(&*file);
                }
            }
        }

        config.compile_exclusions()?;
        debug!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    /// Look for a config file in `base`, falling back to defaults
    pub fn from_default_locations(base: &Path) -> LeakResult<Self> {
        for name in DEFAULT_LOCATIONS {
            let candidate = base.join(name);
            if candidate.is_file() {
                return Self::from_file(&candidate);
            }
        }
        Ok(Self::default())
    }

    /// Compile the exclusion patterns, failing on the first invalid one
    pub fn compile_exclusions(&self) -> LeakResult<Vec<Regex>> {
        self.exclude
            .iter()
            .map(|pattern| {
                Regex::new(pattern).map_err(|source| LeakError::InvalidPattern {
                    pattern: pattern.clone(),
                    source,
                })
            })
            .collect()
    }
}
