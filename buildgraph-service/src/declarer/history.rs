// Run History
// Declarers backed by a recorded YAML history of runs and what they triggered

use super::{DeclarerError, DeclarerRegistry, DownstreamDeclarer, RelationKind};
use crate::error::{ServiceError, ServiceResult};
use crate::run::BuildRun;

use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
struct HistoryFile {
    #[serde(default)]
    runs: Vec<RunRecordFile>,
}

#[derive(Debug, Deserialize)]
struct RunRecordFile {
    id: String,
    #[serde(default)]
    subprojects: Vec<Option<String>>,
    #[serde(default)]
    flow: Vec<Option<String>>,
    #[serde(default)]
    upstream_cause: Vec<Option<String>>,
}

/// What one recorded run declared downstream
#[derive(Debug, Clone)]
pub struct RunRecord {
    pub run: BuildRun,
    pub subprojects: Vec<Option<BuildRun>>,
    pub flow: Vec<Option<BuildRun>>,
    pub upstream_cause: Vec<Option<BuildRun>>,
}

impl RunRecord {
    pub fn downstream(&self, kind: RelationKind) -> &[Option<BuildRun>] {
        match kind {
            RelationKind::SubProjects => &self.subprojects,
            RelationKind::Flow => &self.flow,
            RelationKind::UpstreamCause => &self.upstream_cause,
        }
    }
}

/// Recorded runs indexed by id
#[derive(Debug, Clone, Default)]
pub struct RunHistory {
    records: Vec<RunRecord>,
    by_id: HashMap<BuildRun, usize>,
}

impl RunHistory {
    pub fn from_file<P: AsRef<Path>>(path: P) -> ServiceResult<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> ServiceResult<Self> {
        let file: HistoryFile = serde_yaml::from_str(content)?;

        let mut history = Self::default();
        for record in file.runs {
            let run: BuildRun = record.id.parse()?;
            if history.by_id.contains_key(&run) {
                return Err(ServiceError::DuplicateRun(record.id));
            }
            history.by_id.insert(run.clone(), history.records.len());
            history.records.push(RunRecord {
                run,
                subprojects: parse_ids(record.subprojects)?,
                flow: parse_ids(record.flow)?,
                upstream_cause: parse_ids(record.upstream_cause)?,
            });
        }

        Ok(history)
    }

    pub fn record(&self, run: &BuildRun) -> Option<&RunRecord> {
        self.by_id.get(run).map(|&idx| &self.records[idx])
    }

    /// Look a run up by its `job#number` id
    pub fn run(&self, id: &str) -> ServiceResult<Option<BuildRun>> {
        let run: BuildRun = id.parse()?;
        Ok(self.record(&run).map(|r| r.run.clone()))
    }

    /// Recorded runs of a job, newest first
    pub fn runs_of(&self, job: &str) -> Vec<BuildRun> {
        let mut runs: Vec<BuildRun> = self
            .records
            .iter()
            .filter(|r| r.run.job == job)
            .map(|r| r.run.clone())
            .collect();
        runs.sort_by(|a, b| b.number.cmp(&a.number));
        runs
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// A registry answering every relationship kind from this history,
    /// registered in the order sub-projects, flow, upstream cause.
    pub fn registry(self: Arc<Self>) -> DeclarerRegistry<BuildRun> {
        let mut registry = DeclarerRegistry::new();
        for kind in RelationKind::ALL {
            registry.register(kind, HistoryDeclarer::new(Arc::clone(&self), kind));
        }
        registry
    }
}

fn parse_ids(ids: Vec<Option<String>>) -> ServiceResult<Vec<Option<BuildRun>>> {
    ids.into_iter()
        .map(|id| id.map(|id| id.parse::<BuildRun>()).transpose())
        .collect()
}

/// Declarer answering one relationship kind from a shared history.
///
/// Runs without a record have no downstream runs.
pub struct HistoryDeclarer {
    history: Arc<RunHistory>,
    kind: RelationKind,
}

impl HistoryDeclarer {
    pub fn new(history: Arc<RunHistory>, kind: RelationKind) -> Self {
        Self { history, kind }
    }
}

impl DownstreamDeclarer<BuildRun> for HistoryDeclarer {
    fn downstream(&self, run: &BuildRun) -> Result<Vec<Option<BuildRun>>, DeclarerError> {
        Ok(self
            .history
            .record(run)
            .map(|record| record.downstream(self.kind).to_vec())
            .unwrap_or_default())
    }
}
