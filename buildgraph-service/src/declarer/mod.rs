// Downstream Declarers
// Pluggable strategies reporting which runs a given run triggered

pub mod history;

pub use history::{HistoryDeclarer, RunHistory};

use crate::run::Run;

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Relationship a declarer reports between a run and its downstream runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationKind {
    /// Sub-jobs triggered (and usually blocked on) by the run
    SubProjects,
    /// Jobs chained one hop at a time by a flow definition
    Flow,
    /// Runs whose upstream cause points back at the run
    UpstreamCause,
}

impl RelationKind {
    pub const ALL: [RelationKind; 3] = [
        RelationKind::SubProjects,
        RelationKind::Flow,
        RelationKind::UpstreamCause,
    ];

    /// Whether newly discovered runs are linked from every current sink of
    /// the graph rather than from the run that declared them.
    pub fn fans_in(self) -> bool {
        !matches!(self, RelationKind::Flow)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RelationKind::SubProjects => "subprojects",
            RelationKind::Flow => "flow",
            RelationKind::UpstreamCause => "upstream_cause",
        }
    }
}

impl fmt::Display for RelationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure of the machinery behind a declarer
#[derive(Debug, Error)]
pub enum DeclarerError {
    #[error("downstream data unavailable for {run}: {reason}")]
    Unavailable { run: String, reason: String },

    #[error("downstream lookup interrupted for {0}")]
    Interrupted(String),
}

impl DeclarerError {
    pub fn unavailable(run: impl fmt::Display, reason: impl Into<String>) -> Self {
        Self::Unavailable {
            run: run.to_string(),
            reason: reason.into(),
        }
    }
}

/// Strategy reporting the downstream runs of a run.
///
/// `None` entries stand for runs that were declared but could not be
/// resolved; the registry drops them.
pub trait DownstreamDeclarer<R: Run>: Send + Sync {
    fn downstream(&self, run: &R) -> Result<Vec<Option<R>>, DeclarerError>;
}

struct Registration<R: Run> {
    ordinal: i32,
    kind: RelationKind,
    declarer: Box<dyn DownstreamDeclarer<R>>,
}

/// Priority-ordered list of declarers, each tagged with a relationship kind
pub struct DeclarerRegistry<R: Run> {
    declarers: Vec<Registration<R>>,
}

impl<R: Run> DeclarerRegistry<R> {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            declarers: Vec::new(),
        }
    }

    /// Register a declarer with the default ordinal (0)
    pub fn register(
        &mut self,
        kind: RelationKind,
        declarer: impl DownstreamDeclarer<R> + 'static,
    ) -> &mut Self {
        self.register_with_ordinal(0, kind, declarer)
    }

    /// Register a declarer; higher ordinals are consulted first, ties keep
    /// registration order.
    pub fn register_with_ordinal(
        &mut self,
        ordinal: i32,
        kind: RelationKind,
        declarer: impl DownstreamDeclarer<R> + 'static,
    ) -> &mut Self {
        let at = self
            .declarers
            .iter()
            .position(|r| r.ordinal < ordinal)
            .unwrap_or(self.declarers.len());
        self.declarers.insert(
            at,
            Registration {
                ordinal,
                kind,
                declarer: Box::new(declarer),
            },
        );
        self
    }

    /// All registered declarers in priority order
    pub fn all(&self) -> impl Iterator<Item = (RelationKind, &dyn DownstreamDeclarer<R>)> {
        self.declarers.iter().map(|r| (r.kind, r.declarer.as_ref()))
    }

    /// Distinct relationship kinds, in the priority order of their first declarer
    pub fn kinds(&self) -> Vec<RelationKind> {
        let mut kinds = Vec::new();
        for registration in &self.declarers {
            if !kinds.contains(&registration.kind) {
                kinds.push(registration.kind);
            }
        }
        kinds
    }

    /// The declarer answering for `kind`; later declarers of the same kind are shadowed
    pub fn first_for(&self, kind: RelationKind) -> Option<&dyn DownstreamDeclarer<R>> {
        self.declarers
            .iter()
            .find(|r| r.kind == kind)
            .map(|r| r.declarer.as_ref())
    }

    /// Downstream runs of `run` for one relationship kind, with unresolved entries dropped
    pub fn downstream(&self, run: &R, kind: RelationKind) -> Result<Vec<R>, DeclarerError> {
        let Some(declarer) = self.first_for(kind) else {
            return Ok(Vec::new());
        };

        let declared = declarer.downstream(run)?;
        let total = declared.len();
        let runs: Vec<R> = declared.into_iter().flatten().collect();
        if runs.len() < total {
            tracing::debug!(
                run = %run,
                kind = %kind,
                skipped = total - runs.len(),
                "ignoring unresolved downstream runs"
            );
        }
        Ok(runs)
    }

    pub fn len(&self) -> usize {
        self.declarers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.declarers.is_empty()
    }
}

impl<R: Run> Default for DeclarerRegistry<R> {
    fn default() -> Self {
        Self::new()
    }
}
