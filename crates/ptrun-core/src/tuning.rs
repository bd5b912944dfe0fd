//! Engine tuning parameters shared by every solver invocation.
//!
//! Defaults match the settings the engine is normally run with; any
//! subset can be overridden from a YAML file.

use serde::{Deserialize, Serialize};

/// Solver tuning passed as JVM system properties
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineTuning {
    /// JVM max heap (`-mx`)
    pub max_heap: String,

    /// BDD operation cache size
    pub bdd_cache: u64,

    /// BDD node table size
    pub bdd_nodes: u64,

    /// Context numbering scheme
    pub numbering_type: String,

    // === Analysis flags ===
    pub learn_best_order: bool,
    pub single_ignore: bool,
    pub clinit: bool,
    pub filter_null: bool,
    pub unknown_types: bool,
}

impl Default for EngineTuning {
    fn default() -> Self {
        Self {
            max_heap: "1024m".to_string(),
            bdd_cache: 1_500_000,
            bdd_nodes: 40_000_000,
            numbering_type: "scc".to_string(),
            learn_best_order: false,
            single_ignore: true,
            clinit: false,
            filter_null: true,
            unknown_types: false,
        }
    }
}

impl EngineTuning {
    /// Load tuning from YAML
    pub fn from_yaml(yaml: &str) -> Result<Self, String> {
        serde_yaml::from_str(yaml).map_err(|e| e.to_string())
    }

    /// Solver system properties, in the order the engine expects them.
    pub fn solver_properties(&self) -> Vec<(&'static str, String)> {
        vec![
            ("learnbestorder", yes_no(self.learn_best_order)),
            ("singleignore", yes_no(self.single_ignore)),
            ("bddcache", self.bdd_cache.to_string()),
            ("bddnodes", self.bdd_nodes.to_string()),
            ("numberingtype", self.numbering_type.clone()),
            ("pa.clinit", yes_no(self.clinit)),
            ("pa.filternull", yes_no(self.filter_null)),
            ("pa.unknowntypes", yes_no(self.unknown_types)),
        ]
    }
}

fn yes_no(flag: bool) -> String {
    let value = if flag { "yes" } else { "no" };
    value.to_string()
}
