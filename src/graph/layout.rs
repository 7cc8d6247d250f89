//! Layout and visual weights for the dependency map.
//!
//! Positions come from a layered (top-down) layout over the explicit edges
//! only. Cycles are broken on a throwaway copy first, so the graph handed in
//! is never touched. If layering fails for any reason the positions fall
//! back to a spring embedding of the whole graph.
//!
//! The output, [`MapView`], is everything a renderer needs: per-node position,
//! size and palette, per-edge style hints.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use thiserror::Error;
use tracing::{debug, warn};

use super::engine::DependencyGraph;
use super::types::{risk_score, EdgeKind};
use crate::config::LayoutConfig;

const TITLE: &str = "System Architecture (Hierarchical MRI)";
const RISK_LEGEND: &str = "(Red = High Risk / Hidden Links)";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LayoutError {
    #[error("cycle breaking did not converge after {0} removals")]
    CycleBreakLimit(usize),

    #[error("{0} modules could not be assigned a layer")]
    Unlayered(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

pub type Positions = HashMap<String, Point>;

/// Which algorithm produced the positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayoutStrategy {
    Hierarchical,
    Spring,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Layout {
    pub strategy: LayoutStrategy,
    pub positions: Positions,
}

// ─── Cycle Breaking ─────────────────────────────────────────────────────────

/// One cycle of `graph` as a list of edges, closing edge last.
pub fn find_cycle(graph: &DependencyGraph) -> Option<Vec<(String, String)>> {
    #[derive(Clone, Copy, PartialEq)]
    enum Mark {
        Active,
        Done,
    }

    let mut marks: HashMap<String, Mark> = HashMap::new();
    for start in graph.module_ids() {
        if marks.contains_key(&start) {
            continue;
        }
        marks.insert(start.clone(), Mark::Active);
        let mut stack: Vec<(String, Vec<String>, usize)> =
            vec![(start.clone(), graph.dependencies(&start), 0)];

        while let Some((node, next, cursor)) = stack.last_mut() {
            if *cursor >= next.len() {
                marks.insert(node.clone(), Mark::Done);
                stack.pop();
                continue;
            }
            let target = next[*cursor].clone();
            *cursor += 1;

            match marks.get(&target).copied() {
                Some(Mark::Active) => {
                    let from = stack
                        .iter()
                        .position(|(id, _, _)| *id == target)
                        .unwrap_or(0);
                    let path: Vec<&String> = stack[from..].iter().map(|(id, _, _)| id).collect();
                    let mut edges: Vec<(String, String)> = path
                        .windows(2)
                        .map(|w| (w[0].clone(), w[1].clone()))
                        .collect();
                    if let Some(last) = path.last() {
                        edges.push(((*last).clone(), target));
                    }
                    return Some(edges);
                }
                Some(Mark::Done) => {}
                None => {
                    marks.insert(target.clone(), Mark::Active);
                    let deps = graph.dependencies(&target);
                    stack.push((target, deps, 0));
                }
            }
        }
    }
    None
}

/// An acyclic copy of `graph`'s explicit edges.
///
/// Repeatedly finds a cycle and drops its closing edge. Each round removes
/// one edge, so more than `edge_count` rounds means something is wrong.
pub fn break_cycles(graph: &DependencyGraph) -> Result<DependencyGraph, LayoutError> {
    let mut acyclic = graph.filter_edges(EdgeKind::Explicit);
    let limit = acyclic.edge_count();

    for _ in 0..=limit {
        if !acyclic.is_cyclic() {
            return Ok(acyclic);
        }
        let Some(cycle) = find_cycle(&acyclic) else {
            return Ok(acyclic);
        };
        if let Some((source, target)) = cycle.last() {
            debug!(%source, %target, "breaking import cycle for layout");
            acyclic.remove_dependency(source, target);
        }
    }
    Err(LayoutError::CycleBreakLimit(limit))
}

// ─── Layering ───────────────────────────────────────────────────────────────

/// Topological generations: layer 0 has no incoming edges, layer k only
/// incoming edges from layers < k. Each layer is sorted by id.
pub fn topological_generations(graph: &DependencyGraph) -> Result<Vec<Vec<String>>, LayoutError> {
    let ids = graph.module_ids();
    let mut in_degree: HashMap<String, usize> =
        ids.iter().map(|id| (id.clone(), graph.in_degree(id))).collect();

    let mut layer: Vec<String> = ids
        .iter()
        .filter(|id| in_degree[id.as_str()] == 0)
        .cloned()
        .collect();
    let mut layers = Vec::new();
    let mut placed = 0;

    while !layer.is_empty() {
        layer.sort();
        let mut next = Vec::new();
        for id in &layer {
            for dep in graph.dependencies(id) {
                if let Some(count) = in_degree.get_mut(&dep) {
                    *count = count.saturating_sub(1);
                    if *count == 0 {
                        next.push(dep);
                    }
                }
            }
        }
        placed += layer.len();
        layers.push(layer);
        layer = next;
    }

    if placed < ids.len() {
        return Err(LayoutError::Unlayered(ids.len() - placed));
    }
    Ok(layers)
}

/// Layered positions: `x` centred per layer, `y = -layer * row_spacing`.
pub fn hierarchical_layout(
    graph: &DependencyGraph,
    config: &LayoutConfig,
) -> Result<Positions, LayoutError> {
    let acyclic = break_cycles(graph)?;
    let layers = topological_generations(&acyclic)?;

    let mut positions = Positions::new();
    for (i, layer) in layers.iter().enumerate() {
        let centre = (layer.len() as f64 - 1.0) / 2.0;
        for (j, id) in layer.iter().enumerate() {
            positions.insert(
                id.clone(),
                Point {
                    x: (j as f64 - centre) * config.column_spacing,
                    y: -(i as f64) * config.row_spacing,
                },
            );
        }
    }
    Ok(positions)
}

// ─── Spring Fallback ────────────────────────────────────────────────────────

/// Fruchterman-Reingold embedding over every edge, scaled into [-1, 1].
///
/// Starts from evenly spaced points on a circle, so the result is fully
/// determined by the graph.
pub fn spring_layout(graph: &DependencyGraph, config: &LayoutConfig) -> Positions {
    let ids = graph.module_ids();
    let n = ids.len();
    if n == 0 {
        return Positions::new();
    }
    if n == 1 {
        return Positions::from([(ids[0].clone(), Point { x: 0.0, y: 0.0 })]);
    }

    let slot: HashMap<&str, usize> = ids.iter().enumerate().map(|(i, id)| (id.as_str(), i)).collect();
    let mut adjacent: HashSet<(usize, usize)> = HashSet::new();
    for (source, target, _) in graph.edges() {
        let (a, b) = (slot[source], slot[target]);
        adjacent.insert((a, b));
        adjacent.insert((b, a));
    }

    let mut pos: Vec<[f64; 2]> = (0..n)
        .map(|i| {
            let angle = std::f64::consts::TAU * i as f64 / n as f64;
            [angle.cos(), angle.sin()]
        })
        .collect();

    let k = config.spring_k.max(f64::EPSILON);
    let iterations = config.spring_iterations.max(1);
    let mut temperature = 0.2;
    let cooling = temperature / (iterations as f64 + 1.0);

    for _ in 0..iterations {
        let mut moves = vec![[0.0f64; 2]; n];
        for i in 0..n {
            for j in 0..n {
                if i == j {
                    continue;
                }
                let dx = pos[i][0] - pos[j][0];
                let dy = pos[i][1] - pos[j][1];
                let distance = (dx * dx + dy * dy).sqrt().max(0.01);
                let attraction = if adjacent.contains(&(i, j)) {
                    distance / k
                } else {
                    0.0
                };
                let force = k * k / (distance * distance) - attraction;
                moves[i][0] += dx * force;
                moves[i][1] += dy * force;
            }
        }
        for i in 0..n {
            let length = (moves[i][0].powi(2) + moves[i][1].powi(2)).sqrt().max(0.01);
            pos[i][0] += moves[i][0] * temperature / length;
            pos[i][1] += moves[i][1] * temperature / length;
        }
        temperature -= cooling;
    }

    rescale(&mut pos);
    ids.iter()
        .zip(pos)
        .map(|(id, [x, y])| (id.clone(), Point { x, y }))
        .collect()
}

/// Centre on the origin and scale so the largest coordinate is 1.
fn rescale(pos: &mut [[f64; 2]]) {
    let n = pos.len() as f64;
    let mean_x = pos.iter().map(|p| p[0]).sum::<f64>() / n;
    let mean_y = pos.iter().map(|p| p[1]).sum::<f64>() / n;
    let mut extent: f64 = 0.0;
    for p in pos.iter_mut() {
        p[0] -= mean_x;
        p[1] -= mean_y;
        extent = extent.max(p[0].abs()).max(p[1].abs());
    }
    if extent > 0.0 {
        for p in pos.iter_mut() {
            p[0] /= extent;
            p[1] /= extent;
        }
    }
}

/// Hierarchical layout, or the spring layout when layering fails.
pub fn compute_layout(graph: &DependencyGraph, config: &LayoutConfig) -> Layout {
    match hierarchical_layout(graph, config) {
        Ok(positions) => Layout {
            strategy: LayoutStrategy::Hierarchical,
            positions,
        },
        Err(e) => {
            warn!(error = %e, "layout fallback triggered");
            Layout {
                strategy: LayoutStrategy::Spring,
                positions: spring_layout(graph, config),
            }
        }
    }
}

// ─── Visual Weights ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Palette {
    /// Risk palette (reds).
    Hot,
    /// Structural palette (blues).
    Cool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineStyle {
    Solid,
    Dashed,
}

/// Size and colour of one node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeWeight {
    pub centrality: f64,
    /// Externally supplied score, 1..=10.
    pub complexity: i64,
    /// `complexity * (centrality * impact_scale + 1)`.
    pub risk: f64,
    pub size: f64,
    pub palette: Palette,
    /// Position on the palette's colour ramp, 0..=1.
    pub intensity: f64,
}

pub fn node_weight(centrality: f64, complexity: i64, config: &LayoutConfig) -> NodeWeight {
    let impact = centrality * config.impact_scale + 1.0;
    let risk = complexity as f64 * impact;
    let size = config.base_node_size * (1.0 + risk / 30.0);
    let (palette, intensity) = if risk > config.hot_threshold {
        (Palette::Hot, (0.3 + risk / 50.0).min(0.8))
    } else {
        (Palette::Cool, 0.2 + (centrality * 3.0).min(0.6))
    };
    NodeWeight {
        centrality,
        complexity,
        risk,
        size,
        palette,
        intensity,
    }
}

/// Weights for every module. Modules without a centrality value count as 0.
pub fn node_weights(
    graph: &DependencyGraph,
    risk_scores: &BTreeMap<String, i64>,
    config: &LayoutConfig,
) -> Vec<(String, NodeWeight)> {
    let centrality = graph.in_degree_centrality();
    graph
        .modules()
        .map(|m| {
            let c = centrality.get(&m.id).copied().unwrap_or(0.0);
            (m.id.clone(), node_weight(c, risk_score(risk_scores, &m.id), config))
        })
        .collect()
}

/// Rendering hints for one edge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeStyle {
    pub style: LineStyle,
    pub color: String,
    pub width: f64,
    pub alpha: f64,
    pub connector: String,
    pub long_jump: bool,
}

impl EdgeStyle {
    fn new(style: LineStyle, color: &str, width: f64, alpha: f64, connector: &str) -> Self {
        Self {
            style,
            color: color.to_string(),
            width,
            alpha,
            connector: connector.to_string(),
            long_jump: false,
        }
    }
}

pub fn edge_style(
    kind: EdgeKind,
    from: Option<Point>,
    to: Option<Point>,
    config: &LayoutConfig,
) -> EdgeStyle {
    if kind == EdgeKind::Hidden {
        return EdgeStyle::new(LineStyle::Dashed, "#FF0000", 3.5, 0.9, "arc3,rad=-0.4");
    }
    let (Some(from), Some(to)) = (from, to) else {
        return EdgeStyle::new(LineStyle::Solid, "gray", 2.0, 0.8, "arc3,rad=0.0");
    };
    if (from.y - to.y).abs() > config.row_spacing * config.long_jump_factor {
        EdgeStyle {
            long_jump: true,
            ..EdgeStyle::new(
                LineStyle::Dashed,
                "#999999",
                1.5,
                0.7,
                "arc,angleA=-90,angleB=90,rad=30",
            )
        }
    } else {
        EdgeStyle::new(LineStyle::Solid, "#555555", 2.0, 0.8, "arc3,rad=0.0")
    }
}

/// Break dotted and snake_case names over several lines.
pub fn format_label(id: &str) -> String {
    id.replace('.', ".\n").replace('_', "_\n")
}

// ─── Map View ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeView {
    pub id: String,
    pub label: String,
    pub x: f64,
    pub y: f64,
    #[serde(flatten)]
    pub weight: NodeWeight,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeView {
    pub source: String,
    pub target: String,
    pub kind: EdgeKind,
    #[serde(flatten)]
    pub style: EdgeStyle,
}

/// Everything the renderer needs to draw the map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapView {
    pub title: String,
    pub layout: LayoutStrategy,
    pub node_count: usize,
    pub edge_count: usize,
    pub nodes: Vec<NodeView>,
    pub edges: Vec<EdgeView>,
}

impl MapView {
    pub fn node(&self, id: &str) -> Option<&NodeView> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn edge(&self, source: &str, target: &str) -> Option<&EdgeView> {
        self.edges
            .iter()
            .find(|e| e.source == source && e.target == target)
    }
}

/// Lay out the merged graph and attach per-node and per-edge styling.
pub fn render_map(
    graph: &DependencyGraph,
    risk_scores: &BTreeMap<String, i64>,
    config: &LayoutConfig,
) -> MapView {
    let layout = compute_layout(graph, config);
    let position = |id: &str| layout.positions.get(id).copied();

    let nodes = node_weights(graph, risk_scores, config)
        .into_iter()
        .map(|(id, weight)| {
            let point = position(&id).unwrap_or(Point { x: 0.0, y: 0.0 });
            NodeView {
                label: format_label(&id),
                x: point.x,
                y: point.y,
                id,
                weight,
            }
        })
        .collect();

    let edges = graph
        .edges()
        .into_iter()
        .map(|(source, target, kind)| EdgeView {
            style: edge_style(kind, position(source), position(target), config),
            source: source.to_string(),
            target: target.to_string(),
            kind,
        })
        .collect();

    let title = if risk_scores.is_empty() {
        TITLE.to_string()
    } else {
        format!("{}\n{}", TITLE, RISK_LEGEND)
    };

    MapView {
        title,
        layout: layout.strategy,
        node_count: graph.node_count(),
        edge_count: graph.edge_count(),
        nodes,
        edges,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::HiddenLink;

    fn graph_of(nodes: &[&str], edges: &[(&str, &str)]) -> DependencyGraph {
        let mut graph = DependencyGraph::new();
        for n in nodes {
            graph.add_module(*n, None);
        }
        for (s, t) in edges {
            graph.add_dependency(s, t, EdgeKind::Explicit);
        }
        graph
    }

    fn cfg() -> LayoutConfig {
        LayoutConfig::default()
    }

    #[test]
    fn test_find_cycle_reports_closing_edge_last() {
        let graph = graph_of(&["a", "b", "c"], &[("a", "b"), ("b", "c"), ("c", "a")]);
        let cycle = find_cycle(&graph).unwrap();
        assert_eq!(
            cycle,
            vec![
                ("a".to_string(), "b".to_string()),
                ("b".to_string(), "c".to_string()),
                ("c".to_string(), "a".to_string()),
            ]
        );
        assert!(find_cycle(&graph_of(&["a", "b"], &[("a", "b")])).is_none());
    }

    #[test]
    fn test_break_cycles_leaves_input_untouched() {
        let graph = graph_of(&["a", "b", "c"], &[("a", "b"), ("b", "c"), ("c", "a")]);
        let acyclic = break_cycles(&graph).unwrap();
        assert!(find_cycle(&acyclic).is_none());
        assert_eq!(acyclic.edge_count(), 2);
        assert_eq!(acyclic.edge_kind("c", "a"), None);
        assert_eq!(graph.edge_count(), 3);
    }

    #[test]
    fn test_break_cycles_ignores_hidden_edges() {
        let mut graph = graph_of(&["a", "b"], &[("a", "b")]);
        graph.merge_hidden_links(&[HiddenLink::new("b", "a", "Database")]);
        let acyclic = break_cycles(&graph).unwrap();
        assert_eq!(acyclic.edge_count(), 1);
        assert_eq!(acyclic.edge_kind("a", "b"), Some(EdgeKind::Explicit));
        assert_eq!(acyclic.edge_kind("b", "a"), None);
    }

    #[test]
    fn test_break_cycles_with_two_cycles() {
        let graph = graph_of(
            &["a", "b", "c", "d"],
            &[("a", "b"), ("b", "a"), ("c", "d"), ("d", "c"), ("b", "c")],
        );
        let acyclic = break_cycles(&graph).unwrap();
        assert!(find_cycle(&acyclic).is_none());
        assert_eq!(acyclic.edge_count(), 3);
    }

    #[test]
    fn test_topological_generations() {
        let graph = graph_of(
            &["main", "api", "db", "util"],
            &[("main", "api"), ("main", "db"), ("api", "db"), ("db", "util")],
        );
        let layers = topological_generations(&graph).unwrap();
        assert_eq!(
            layers,
            vec![vec!["main"], vec!["api"], vec!["db"], vec!["util"]]
        );
    }

    #[test]
    fn test_topological_generations_rejects_cycles() {
        let graph = graph_of(&["a", "b"], &[("a", "b"), ("b", "a")]);
        assert_eq!(
            topological_generations(&graph),
            Err(LayoutError::Unlayered(2))
        );
    }

    #[test]
    fn test_hierarchical_positions() {
        let graph = graph_of(&["top", "left", "right"], &[("top", "right"), ("top", "left")]);
        let positions = hierarchical_layout(&graph, &cfg()).unwrap();
        assert_eq!(positions["top"], Point { x: 0.0, y: 0.0 });
        assert_eq!(positions["left"], Point { x: -4.0, y: -10.0 });
        assert_eq!(positions["right"], Point { x: 4.0, y: -10.0 });
    }

    #[test]
    fn test_pure_cycle_gets_every_position() {
        let graph = graph_of(&["a", "b", "c"], &[("a", "b"), ("b", "c"), ("c", "a")]);
        let layout = compute_layout(&graph, &cfg());
        assert_eq!(layout.strategy, LayoutStrategy::Hierarchical);
        assert_eq!(layout.positions.len(), 3);
        assert_eq!(layout.positions["a"].y, 0.0);
        assert_eq!(layout.positions["c"].y, -20.0);
    }

    #[test]
    fn test_empty_graph_layout() {
        let layout = compute_layout(&DependencyGraph::new(), &cfg());
        assert!(layout.positions.is_empty());
    }

    #[test]
    fn test_spring_layout_is_bounded_and_deterministic() {
        let graph = graph_of(&["a", "b", "c", "d"], &[("a", "b"), ("b", "c"), ("c", "a")]);
        let first = spring_layout(&graph, &cfg());
        assert_eq!(first, spring_layout(&graph, &cfg()));
        assert_eq!(first.len(), 4);
        for point in first.values() {
            assert!(point.x.is_finite() && point.y.is_finite());
            assert!(point.x.abs() <= 1.0 + 1e-9 && point.y.abs() <= 1.0 + 1e-9);
        }
    }

    #[test]
    fn test_node_weight_palettes() {
        let cool = node_weight(0.0, 1, &cfg());
        assert_eq!(cool.risk, 1.0);
        assert_eq!(cool.palette, Palette::Cool);
        assert!((cool.intensity - 0.2).abs() < 1e-9);
        assert!((cool.size - 14000.0 * (1.0 + 1.0 / 30.0)).abs() < 1e-6);

        // complexity 5, centrality 0.5 -> impact 6, risk 30
        let hot = node_weight(0.5, 5, &cfg());
        assert_eq!(hot.risk, 30.0);
        assert_eq!(hot.palette, Palette::Hot);
        assert!((hot.intensity - 0.8).abs() < 1e-9);
        assert!(hot.size > cool.size);
    }

    #[test]
    fn test_node_weights_default_to_baseline_risk() {
        let graph = graph_of(&["a", "b"], &[("a", "b")]);
        let scores = BTreeMap::from([("b".to_string(), 3)]);
        let weights: HashMap<String, NodeWeight> =
            node_weights(&graph, &scores, &cfg()).into_iter().collect();
        assert_eq!(weights["a"].complexity, 1);
        assert_eq!(weights["a"].risk, 1.0);
        // b: centrality 1.0 -> impact 11, risk 33
        assert_eq!(weights["b"].risk, 33.0);
        assert_eq!(weights["b"].palette, Palette::Hot);
    }

    #[test]
    fn test_edge_styles() {
        let config = cfg();
        let top = Some(Point { x: 0.0, y: 0.0 });
        let next = Some(Point { x: 0.0, y: -10.0 });
        let far = Some(Point { x: 0.0, y: -20.0 });

        let hidden = edge_style(EdgeKind::Hidden, top, next, &config);
        assert_eq!(hidden.style, LineStyle::Dashed);
        assert_eq!(hidden.color, "#FF0000");
        assert_eq!(hidden.connector, "arc3,rad=-0.4");

        let adjacent = edge_style(EdgeKind::Explicit, top, next, &config);
        assert_eq!(adjacent.style, LineStyle::Solid);
        assert_eq!(adjacent.color, "#555555");
        assert!(!adjacent.long_jump);

        let jump = edge_style(EdgeKind::Explicit, top, far, &config);
        assert!(jump.long_jump);
        assert_eq!(jump.style, LineStyle::Dashed);
        assert_eq!(jump.connector, "arc,angleA=-90,angleB=90,rad=30");

        let unplaced = edge_style(EdgeKind::Explicit, top, None, &config);
        assert_eq!(unplaced.color, "gray");
    }

    #[test]
    fn test_format_label() {
        assert_eq!(format_label("pkg.db_utils"), "pkg.\ndb_\nutils");
    }

    #[test]
    fn test_render_map() {
        let mut graph = graph_of(&["app", "db", "cache"], &[("app", "db"), ("app", "cache")]);
        graph.merge_hidden_links(&[HiddenLink::new("cache", "db", "Database")]);

        let plain = render_map(&graph, &BTreeMap::new(), &cfg());
        assert_eq!(plain.title, TITLE);
        assert_eq!(plain.layout, LayoutStrategy::Hierarchical);
        assert_eq!(plain.node_count, 3);
        assert_eq!(plain.edge_count, 3);
        // The hidden edge does not influence layering.
        assert_eq!(plain.node("cache").unwrap().y, plain.node("db").unwrap().y);
        assert_eq!(plain.edge("cache", "db").unwrap().kind, EdgeKind::Hidden);

        let scores = BTreeMap::from([("db".to_string(), 9)]);
        let risky = render_map(&graph, &scores, &cfg());
        assert!(risky.title.ends_with(RISK_LEGEND));
        assert_eq!(risky.node("db").unwrap().weight.palette, Palette::Hot);

        let json = serde_json::to_value(&risky).unwrap();
        assert_eq!(json["layout"], "hierarchical");
        assert!(json["nodes"][0].get("palette").is_some());
        assert!(json["edges"][0].get("connector").is_some());
    }
}
