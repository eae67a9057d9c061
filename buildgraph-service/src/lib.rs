// Build Graph Service Library
// Discovers the downstream execution graph of a run and lays it out as a build grid

pub mod config;
pub mod declarer;
pub mod error;
pub mod graph;
pub mod grid;
pub mod layout;
pub mod run;

// Re-export commonly used types
pub use error::{ServiceError, ServiceResult};

pub use config::{GraphConfig, OrderingBackend};

pub use run::{BuildRun, Run};

// Re-export declarer types
pub use declarer::{
    DeclarerError, DeclarerRegistry, DownstreamDeclarer, HistoryDeclarer, RelationKind,
    RunHistory,
};

// Re-export graph types
pub use graph::{all_paths, compute_graph, ExecutionGraph, GraphBuilder, GraphDescription, Vertex};

// Re-export layout types
pub use layout::{
    transform, GraphvizConfig, GraphvizOrdering, LayoutEngine, LevelOrdering, OrderingError,
    OrderingService, Position, PositionMap,
};

pub use grid::{max_columns, BuildGrid, GridBuilder, GridCell};
