// Build Grid
// Two-dimensional view of a pipeline: runs placed by stage (column) and lane (row)

use crate::declarer::DeclarerRegistry;
use crate::graph::{compute_graph, ExecutionGraph};
use crate::layout::{LayoutEngine, Position, PositionMap};
use crate::run::Run;

use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;

/// One occupied cell of the grid
#[derive(Debug, Clone, Serialize)]
pub struct GridCell<R> {
    pub run: R,
    pub position: Position,
    /// The run has at least one downstream run in this pipeline
    pub has_downstream: bool,
}

/// Cells keyed by (row, column)
#[derive(Debug, Clone)]
pub struct BuildGrid<R> {
    cells: BTreeMap<(usize, usize), GridCell<R>>,
    rows: usize,
    columns: usize,
}

impl<R: Run> BuildGrid<R> {
    pub fn empty() -> Self {
        Self {
            cells: BTreeMap::new(),
            rows: 0,
            columns: 0,
        }
    }

    /// Fill a grid from laid-out vertices
    pub fn from_layout(graph: &ExecutionGraph<R>, positions: &PositionMap) -> Self {
        let mut grid = Self::empty();

        for (&idx, &position) in positions {
            let cell = GridCell {
                run: graph.vertex(idx).run().clone(),
                position,
                has_downstream: graph.out_degree(idx) > 0,
            };

            grid.rows = grid.rows.max(position.row + 1);
            grid.columns = grid.columns.max(position.column + 1);

            if let Some(previous) = grid.cells.insert((position.row, position.column), cell) {
                tracing::warn!(
                    run = %previous.run,
                    row = position.row,
                    column = position.column,
                    "grid cell overwritten"
                );
            }
        }

        grid
    }

    pub fn get(&self, row: usize, column: usize) -> Option<&GridCell<R>> {
        self.cells.get(&(row, column))
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    /// Occupied cells, row by row
    pub fn cells(&self) -> impl Iterator<Item = &GridCell<R>> {
        self.cells.values()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// `{"rows", "columns", "cells"}` with cells in row order
    pub fn to_json(&self) -> serde_json::Value
    where
        R: Serialize,
    {
        serde_json::json!({
            "rows": self.rows,
            "columns": self.columns,
            "cells": self.cells.values().collect::<Vec<_>>(),
        })
    }
}

impl<R: Run> Default for BuildGrid<R> {
    fn default() -> Self {
        Self::empty()
    }
}

/// Widest grid in a batch, for aligning several pipelines side by side
pub fn max_columns<R: Run>(grids: &[BuildGrid<R>]) -> usize {
    grids.iter().map(BuildGrid::columns).max().unwrap_or(0)
}

/// Discovers, orders and places the pipeline of a root run
#[derive(Clone)]
pub struct GridBuilder<R: Run> {
    registry: Arc<DeclarerRegistry<R>>,
    engine: LayoutEngine,
}

impl<R: Run> GridBuilder<R> {
    pub fn new(registry: Arc<DeclarerRegistry<R>>, engine: LayoutEngine) -> Self {
        Self { registry, engine }
    }

    /// Grid for one pipeline; `None` gives an empty grid
    pub async fn grid_for(&self, root: Option<R>) -> BuildGrid<R> {
        let mut graph = compute_graph(&self.registry, root);
        let positions = self.engine.layout(&mut graph).await;
        BuildGrid::from_layout(&graph, &positions)
    }

    /// Grids for several pipelines, built concurrently, in input order
    pub async fn grids_for(&self, roots: Vec<R>) -> Vec<BuildGrid<R>> {
        let handles: Vec<_> = roots
            .into_iter()
            .map(|root| {
                let builder = self.clone();
                tokio::spawn(async move { builder.grid_for(Some(root)).await })
            })
            .collect();

        let mut grids = Vec::with_capacity(handles.len());
        for handle in handles {
            match handle.await {
                Ok(grid) => grids.push(grid),
                Err(err) => {
                    tracing::error!(error = %err, "grid task failed");
                    grids.push(BuildGrid::empty());
                }
            }
        }
        grids
    }
}
