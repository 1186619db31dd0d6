use std::{fmt::Write as _, fs, path::Path};

use crate::render::framegraph::{FrameGraph, error::GraphError};

fn escape(name: &str) -> String {
    name.replace('\\', "\\\\").replace('"', "\\\"")
}

impl FrameGraph {
    /// Renders the registered passes and resources as a graphviz `digraph`.
    ///
    /// Reference counts in the labels are the ones left by the last
    /// [`compile`](Self::compile); before that they are zero.
    pub fn to_graphviz(&self) -> String {
        let mut dot = String::new();
        self.write_graphviz(&mut dot).ok();
        dot
    }

    pub fn export_graphviz(&self, path: impl AsRef<Path>) -> Result<(), GraphError> {
        let path = path.as_ref();
        fs::write(path, self.to_graphviz()).map_err(|source| GraphError::Export {
            path: path.to_path_buf(),
            source,
        })?;
        log::debug!("exported frame graph to {}", path.display());
        Ok(())
    }

    fn write_graphviz(&self, dot: &mut String) -> std::fmt::Result {
        writeln!(dot, "digraph framegraph {{")?;
        writeln!(dot, "  rankdir=LR")?;
        writeln!(dot, "  node [fontname=\"Helvetica\"]")?;
        writeln!(dot)?;

        for (index, slot) in self.passes.iter().enumerate() {
            let node = &slot.node;
            let style = if node.cull_immune {
                "style=\"filled,bold\" fillcolor=orange"
            } else if node.is_culled() {
                "style=\"filled,dashed\" fillcolor=lightgrey fontcolor=grey40"
            } else {
                "style=filled fillcolor=orange"
            };
            writeln!(
                dot,
                "  P{} [label=\"{}\\nrefs: {}\" shape=box {}]",
                index,
                escape(&node.name),
                node.ref_count,
                style
            )?;
        }
        writeln!(dot)?;

        for (index, resource) in self.resources.iter().enumerate() {
            let style = if resource.is_transient() {
                "style=solid"
            } else {
                "style=filled fillcolor=skyblue"
            };
            writeln!(
                dot,
                "  R{} [label=\"{}\\n{}\\nid: {} refs: {}\" shape=ellipse {}]",
                index,
                escape(&resource.name),
                escape(short_type_name(resource.type_name())),
                resource.uid,
                resource.ref_count,
                style
            )?;
        }
        writeln!(dot)?;

        for (index, slot) in self.passes.iter().enumerate() {
            let node = &slot.node;
            for id in &node.creates {
                writeln!(dot, "  P{} -> R{} [color=seagreen]", index, id.index())?;
            }
            for id in &node.writes {
                writeln!(dot, "  P{} -> R{} [color=gold style=bold]", index, id.index())?;
            }
            for id in &node.reads {
                writeln!(dot, "  R{} -> P{} [color=firebrick]", id.index(), index)?;
            }
        }

        writeln!(dot, "}}")
    }
}

fn short_type_name(full: &str) -> &str {
    full.rsplit("::").next().unwrap_or(full)
}
