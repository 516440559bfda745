use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::{debug, info};

use crate::sorter::{bubble_sort_with, SortStats};
use crate::trace::TracingSink;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct SampleCase {
    pub name: String,
    pub values: Vec<i64>,
}

impl SampleCase {
    pub fn new(name: &str, values: &[i64]) -> Self {
        Self {
            name: name.to_string(),
            values: values.to_vec(),
        }
    }
}

/// Cases run by the `demo` command. `trace_case` names the case whose
/// steps are printed one by one.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct DemoConfig {
    pub cases: Vec<SampleCase>,
    #[serde(default)]
    pub trace_case: Option<String>,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            cases: vec![
                SampleCase::new("example", &[64, 34, 25, 12, 22, 11, 90]),
                SampleCase::new("already_sorted", &[1, 2, 3, 4, 5]),
                SampleCase::new("reverse_sorted", &[5, 4, 3, 2, 1]),
                SampleCase::new("with_duplicates", &[3, 1, 4, 1, 5, 9, 2, 6, 5]),
            ],
            trace_case: Some("example".to_string()),
        }
    }
}

impl DemoConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;
        let config: DemoConfig = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config: {}", path.display()))?;
        config
            .validate()
            .with_context(|| format!("Invalid config: {}", path.display()))?;
        info!(path = %path.display(), cases = config.cases.len(), "loaded demo config");
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.cases.is_empty() {
            bail!("at least one case is required");
        }
        let mut seen = HashSet::new();
        for case in &self.cases {
            if !seen.insert(case.name.as_str()) {
                bail!("duplicate case name: {}", case.name);
            }
        }
        if let Some(name) = &self.trace_case {
            if !seen.contains(name.as_str()) {
                bail!("trace_case {} does not name a case", name);
            }
        }
        Ok(())
    }

    pub fn traced_case(&self) -> Option<&SampleCase> {
        let name = self.trace_case.as_deref()?;
        self.cases.iter().find(|c| c.name == name)
    }
}

#[derive(Serialize, Debug, Clone)]
pub struct CaseReport {
    pub name: String,
    pub input: Vec<i64>,
    pub output: Vec<i64>,
    pub stats: SortStats,
}

#[derive(Serialize, Debug, Clone)]
pub struct DemoReport {
    pub generated_at: DateTime<Utc>,
    pub cases: Vec<CaseReport>,
}

/// Sorts a copy of the case's values; the case itself is left untouched.
pub fn run_case(case: &SampleCase) -> CaseReport {
    let mut output = case.values.clone();
    let stats = bubble_sort_with(&mut output, &mut TracingSink);
    debug!(
        case = %case.name,
        passes = stats.passes,
        comparisons = stats.comparisons,
        swaps = stats.swaps,
        "case sorted"
    );
    CaseReport {
        name: case.name.clone(),
        input: case.values.clone(),
        output,
        stats,
    }
}

pub fn run_demo(config: &DemoConfig) -> DemoReport {
    DemoReport {
        generated_at: Utc::now(),
        cases: config.cases.iter().map(run_case).collect(),
    }
}

pub fn write_report(report: &DemoReport, out: &mut dyn Write) -> Result<()> {
    let mut buf = BufWriter::new(out);
    serde_json::to_writer_pretty(&mut buf, report)?;
    buf.write_all(b"\n")?;
    buf.flush()?;
    Ok(())
}
