//! Self-contained HTML serialization of a graph.
//!
//! The file embeds one record per node, edges labelled by parent position,
//! the group tree as cluster parents, and a small inline renderer that lays
//! the nodes out by dependency depth. No external assets are required.

use std::io::Write;
use std::path::Path;

use crate::core::{NodeId, NodeKind};
use crate::graph::Graph;
use crate::ops::Op;

fn json_escape(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}

fn node_color(graph: &Graph, id: NodeId) -> &'static str {
    let node = graph.node(id);
    if matches!(node.op, Op::Shared { .. }) {
        return "#006400";
    }
    match node.kind {
        NodeKind::Input => "#00ff00",
        NodeKind::InputDerived => "#0000ff",
        NodeKind::Constant => "#ffff00",
        NodeKind::ConstantDerived => "#ffa500",
    }
}

fn node_form(graph: &Graph, id: NodeId) -> &'static str {
    let node = graph.node(id);
    if matches!(node.op, Op::Input { .. } | Op::Shared { .. }) {
        return "rect";
    }
    match node.kind {
        NodeKind::Constant => "circle",
        _ => "ellipse",
    }
}

fn display_name(graph: &Graph, id: NodeId) -> String {
    let node = graph.node(id);
    match (&node.op, node.kind) {
        (Op::Value { value, .. }, NodeKind::Constant) if node.is_scalar() => {
            format!("{}[{}]", (value * 100.0).round() / 100.0, id)
        }
        (Op::Input { .. }, _) | (Op::Shared { .. }, _) => format!("{}[{}]", node.name, id),
        _ => format!("{}[{}]", node.op.name(), id),
    }
}

impl Graph {
    /// Writes a self-contained HTML description of the graph.
    pub fn serialize_to_visual(&self, path: impl AsRef<Path>) -> std::io::Result<()> {
        let mut f = std::fs::File::create(path)?;
        writeln!(
            f,
            "<!DOCTYPE html>\n<html><head><meta charset=\"utf-8\">\n<title>{}</title>",
            json_escape(&self.name)
        )?;
        writeln!(
            f,
            "<style>\n\
             body {{ margin: 0; padding: 0; font-family: \"Helvetica Neue\", Helvetica, Arial, sans-serif; }}\n\
             svg {{ width: 100%; height: 95vh; }}\n\
             text {{ font-weight: 300; font-size: 12px; pointer-events: none; }}\n\
             .edge {{ stroke: #333; stroke-width: 1.5px; fill: none; }}\n\
             .cluster {{ fill: #d3d7e8; opacity: 0.4; }}\n\
             </style></head><body><h3>{}</h3>\n<svg></svg>\n<script>",
            json_escape(&self.name)
        )?;

        // The group tree.
        writeln!(f, "var groups = [")?;
        for (_, group) in self.groups().iter() {
            writeln!(
                f,
                "  {{name: \"{}\", parent: {}}},",
                json_escape(&group.full_name),
                group.parent.map(|p| p.0 as i64).unwrap_or(-1)
            )?;
        }
        writeln!(f, "];")?;

        // One record per node. Constant leaves are replicated once per child
        // to avoid edge crossings, so a record carries its own key.
        writeln!(f, "var nodes = [")?;
        let mut edges: Vec<(String, String, usize)> = Vec::new();
        for node in self.nodes() {
            if !node.active {
                continue;
            }
            let replicate = node.kind == NodeKind::Constant
                && node.op.ancestors().is_empty()
                && node.children.len() > 1;
            let copies = if replicate { node.children.len() } else { 1 };
            for copy in 0..copies {
                let key = if replicate {
                    format!("n{}_{}", node.id, copy)
                } else {
                    format!("n{}", node.id)
                };
                writeln!(
                    f,
                    "  {{key: \"{key}\", id: {}, name: \"{}\", label: \"{}\", op: \"{}\", \
                     group: {}, kind: \"{}\", dtype: \"{}\", shape: \"{}\", device: \"{}\", \
                     grad: {}, parents: {:?}, children: {:?}, color: \"{}\", form: \"{}\"}},",
                    node.id,
                    json_escape(&node.name),
                    json_escape(&display_name(self, node.id)),
                    node.op.name(),
                    node.group.0,
                    node.kind,
                    node.dtype,
                    node.shape,
                    node.device,
                    node.grad_level,
                    node.op.ancestors().iter().map(|a| a.0).collect::<Vec<_>>(),
                    node.children.iter().map(|c| c.0).collect::<Vec<_>>(),
                    node_color(self, node.id),
                    node_form(self, node.id),
                )?;
            }
        }
        // Update nodes, in pink.
        for (position, &(shared, update)) in
            self.updates.iter().chain(self.temporary_updates.iter()).enumerate()
        {
            writeln!(
                f,
                "  {{key: \"u{position}\", id: -1, name: \"Update\", label: \"Update[{} := {}]\", \
                 op: \"Update\", group: 0, kind: \"Update\", dtype: \"{}\", shape: \"{}\", \
                 device: \"{}\", grad: 0, parents: {:?}, children: [], color: \"#ffc0cb\", \
                 form: \"rect\"}},",
                shared,
                update,
                self.node(shared).dtype,
                self.node(shared).shape,
                self.node(shared).device,
                vec![update.0, shared.0],
            )?;
            edges.push((format!("n{}", update), format!("u{}", position), 0));
            edges.push((format!("u{}", position), format!("n{}", shared), 0));
        }
        writeln!(f, "];")?;

        // Edges, labelled by parent position. Replicated constants connect
        // one copy per consumer.
        let mut replica_used: rustc_hash::FxHashMap<NodeId, usize> = rustc_hash::FxHashMap::default();
        for node in self.nodes() {
            if !node.active {
                continue;
            }
            for (position, ancestor) in node.op.ancestors().iter().enumerate() {
                let a = self.node(*ancestor);
                let replicate = a.kind == NodeKind::Constant
                    && a.op.ancestors().is_empty()
                    && a.children.len() > 1;
                let from = if replicate {
                    let copy = replica_used.entry(*ancestor).or_insert(0);
                    let key = format!("n{}_{}", ancestor, copy);
                    *copy += 1;
                    key
                } else {
                    format!("n{}", ancestor)
                };
                edges.push((from, format!("n{}", node.id), position));
            }
        }
        writeln!(f, "var edges = [")?;
        for (from, to, label) in &edges {
            writeln!(f, "  {{from: \"{}\", to: \"{}\", label: {}}},", from, to, label)?;
        }
        writeln!(f, "];")?;

        // A small layered renderer: nodes are placed by dependency depth.
        writeln!(
            f,
            "{}",
            r##"var byKey = {};
nodes.forEach(function(n) { byKey[n.key] = n; });
var depth = {};
function nodeDepth(key) {
  if (key in depth) return depth[key];
  var d = 0;
  edges.forEach(function(e) {
    if (e.to === key && e.from in byKey) d = Math.max(d, nodeDepth(e.from) + 1);
  });
  depth[key] = d;
  return d;
}
nodes.forEach(function(n) { nodeDepth(n.key); });
var columns = {};
nodes.forEach(function(n) {
  var d = depth[n.key];
  if (!(d in columns)) columns[d] = [];
  n.x = 40 + d * 180;
  n.y = 40 + columns[d].length * 70;
  columns[d].push(n);
});
var svg = document.querySelector("svg");
var ns = "http://www.w3.org/2000/svg";
edges.forEach(function(e) {
  var a = byKey[e.from], b = byKey[e.to];
  if (!a || !b) return;
  var line = document.createElementNS(ns, "line");
  line.setAttribute("x1", a.x + 70); line.setAttribute("y1", a.y + 20);
  line.setAttribute("x2", b.x); line.setAttribute("y2", b.y + 20);
  line.setAttribute("class", "edge");
  svg.appendChild(line);
  var text = document.createElementNS(ns, "text");
  text.setAttribute("x", (a.x + 70 + b.x) / 2);
  text.setAttribute("y", (a.y + b.y) / 2 + 16);
  text.textContent = e.label;
  svg.appendChild(text);
});
nodes.forEach(function(n) {
  var g = document.createElementNS(ns, "g");
  var form;
  if (n.form === "rect") {
    form = document.createElementNS(ns, "rect");
    form.setAttribute("x", n.x); form.setAttribute("y", n.y);
    form.setAttribute("width", 70); form.setAttribute("height", 40);
    form.setAttribute("rx", 5);
  } else {
    form = document.createElementNS(ns, "ellipse");
    form.setAttribute("cx", n.x + 35); form.setAttribute("cy", n.y + 20);
    form.setAttribute("rx", 35); form.setAttribute("ry", n.form === "circle" ? 35 : 20);
  }
  form.setAttribute("fill", n.color);
  form.setAttribute("stroke", "#333");
  var title = document.createElementNS(ns, "title");
  title.textContent = "Name: " + n.name + "\nOp: " + n.op + "\nGroup: " + groups[n.group].name +
    "\nKind: " + n.kind + "\nDtype: " + n.dtype + "\nShape: " + n.shape +
    "\nDevice: " + n.device + "\nGradient level: " + n.grad +
    "\nParents: [" + n.parents + "]\nChildren: [" + n.children + "]";
  g.appendChild(form);
  g.appendChild(title);
  var text = document.createElementNS(ns, "text");
  text.setAttribute("x", n.x + 4); text.setAttribute("y", n.y + 24);
  text.textContent = n.label;
  g.appendChild(text);
  svg.appendChild(g);
});
var maxX = 0, maxY = 0;
nodes.forEach(function(n) { maxX = Math.max(maxX, n.x + 120); maxY = Math.max(maxY, n.y + 80); });
svg.setAttribute("viewBox", "0 0 " + maxX + " " + maxY);"##
        )?;
        writeln!(f, "</script></body></html>")?;
        Ok(())
    }
}
