//! Exporters for KAMI graphs: Graphviz DOT and the JSON action graph.

pub mod action_graph;
pub mod visual;

use anyhow::Result;
use kami_core::graph::KamiGraph;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Output formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Dot,
    ActionGraph,
}

impl ExportFormat {
    pub const ALL: [ExportFormat; 2] = [ExportFormat::Dot, ExportFormat::ActionGraph];

    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Dot => "dot",
            ExportFormat::ActionGraph => "json",
        }
    }

    pub fn file_name(self, graph_name: &str) -> String {
        format!("{}.{}", graph_name, self.extension())
    }
}

impl FromStr for ExportFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "dot" | "graphviz" => Ok(ExportFormat::Dot),
            "json" | "action_graph" => Ok(ExportFormat::ActionGraph),
            other => anyhow::bail!("unknown export format: {}. Use dot or json.", other),
        }
    }
}

/// Render `graph` in `format`.
pub fn export(graph: &KamiGraph, format: ExportFormat) -> Result<String> {
    match format {
        ExportFormat::Dot => Ok(visual::export_dot(graph)?),
        ExportFormat::ActionGraph => action_graph::export_action_graph(graph),
    }
}

/// Render `graph` and write it to `<dir>/<graph name>.<ext>`.
pub fn write_export(graph: &KamiGraph, format: ExportFormat, dir: &Path) -> Result<PathBuf> {
    let contents = export(graph, format)?;
    kami_core::storage::write_output(dir, &format.file_name(&graph.name), &contents)
}
