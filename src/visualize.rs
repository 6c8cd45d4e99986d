use std::fmt::Write as FmtWrite;
use std::io::Write;

use anyhow::{bail, Context};
use petgraph::prelude::EdgeRef;
use tracing::*;

use crate::{AtomKind, Bond, Molecule, MoleculeGraph};

impl Molecule {
    /// Write the molecule as a Graphviz DOT file, and render it to an image
    /// with `dot` when `output_image` is given.
    pub fn visualize(&self, output_dot: &str, output_image: Option<&str>) -> anyhow::Result<()> {
        visualize_graph(&self.to_graph(), output_dot, output_image)
    }
}

/// Exports the graph in DOT format and optionally renders it with Graphviz.
///
/// # Arguments
///
/// * `graph` - The graph to draw, as built by [`Molecule::to_graph`].
/// * `output_dot` - The path to save the DOT file.
/// * `output_image` - Optional path to save the rendered PNG. Requires the
///   Graphviz `dot` command on the `PATH`.
pub fn visualize_graph(
    graph: &MoleculeGraph,
    output_dot: &str,
    output_image: Option<&str>,
) -> anyhow::Result<()> {
    let dot_string = generate_dot(graph)?;

    let mut file = std::fs::File::create(output_dot)
        .with_context(|| format!("Failed to create DOT file {}", output_dot))?;
    file.write_all(dot_string.as_bytes())
        .with_context(|| format!("Failed to write DOT file {}", output_dot))?;
    info!("DOT file saved to {}", output_dot);

    if let Some(image_path) = output_image {
        let status = std::process::Command::new("dot")
            .args(["-Tpng", output_dot, "-o", image_path])
            .status()
            .context("Failed to execute Graphviz 'dot' command")?;
        if !status.success() {
            bail!("Graphviz 'dot' command failed with status: {}", status);
        }
        info!("Image rendered to {}", image_path);
    }

    Ok(())
}

/// One node per atom, labeled with its symbol, and one edge line per bond
/// unit so double and triple bonds are drawn as parallel lines.
pub fn generate_dot(graph: &MoleculeGraph) -> Result<String, std::fmt::Error> {
    let mut dot_output = String::new();
    writeln!(dot_output, "graph Molecule {{")?;
    writeln!(dot_output, "    layout=neato; rankdir=LR;")?;
    writeln!(dot_output, "    multiedge=true;")?;

    for node in graph.node_indices() {
        let kind = graph[node];
        writeln!(
            dot_output,
            "    {} [label=\"{}\", fontcolor={}, shape=circle, style=filled, fillcolor={}];",
            node.index(),
            kind.symbol(),
            kind_to_font_color(kind),
            kind_to_color(kind)
        )?;
    }

    for edge in graph.edge_references() {
        let bond: Bond = *edge.weight();
        for _ in 0..bond.multiplicity() {
            writeln!(
                dot_output,
                "    {} -- {} [style=solid, penwidth=2];",
                edge.source().index(),
                edge.target().index()
            )?;
        }
    }

    writeln!(dot_output, "}}")?;
    Ok(dot_output)
}

fn kind_to_color(kind: AtomKind) -> &'static str {
    match kind {
        AtomKind::Carbon => "black",
        AtomKind::Oxygen => "red",
        AtomKind::Nitrogen => "blue",
        AtomKind::Sulfur => "yellow",
    }
}

fn kind_to_font_color(kind: AtomKind) -> &'static str {
    match kind {
        AtomKind::Sulfur => "black",
        _ => "white",
    }
}
