//! Filtergraph composition.
//!
//! ```text
//!  n == 0:  ""
//!  n == 1:  expr1
//!  n  > 1:  sws_flags=neighbor;[adj,]split=n[x1]..[xn];
//!           [x1]expr1[y1];..[xn]exprn[yn];
//!           [y1]..[yn]xstack=fill=slategray:inputs=n:layout=L
//! ```
//!
//! With fit-to-grid every branch is scaled back to the source size before
//! stacking. The graph monitor option appends a `graphmonitor` stage.

use clap::ValueEnum;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::fmt::Write;

use super::chain::MAX_SLOTS;
use super::tokens::TokenContext;

const GRAPH_MONITOR: &str = ",graphmonitor=flags=queue+pts+time+timebase+format+size+rate:m=full";

/// Spatial arrangement of the views.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LayoutMode {
    Vertical,
    Horizontal,
    #[default]
    Grid,
}

impl LayoutMode {
    /// `xstack` placements for up to six inputs.
    fn placements(self) -> [&'static str; MAX_SLOTS] {
        match self {
            LayoutMode::Vertical => ["0_0", "0_h0", "0_h0+h1", "0_h0+h1+h2", "0_h0+h1+h2+h3", "0_h0+h1+h2+h3+h4"],
            LayoutMode::Horizontal => ["0_0", "w0_0", "w0+w1_0", "w0+w1+w2_0", "w0+w1+w2+w3_0", "w0+w1+w2+w3+w4_0"],
            LayoutMode::Grid => ["0_0", "w0_0", "0_h0", "w0_h0", "0_h0+h1", "w0_h0+h1"],
        }
    }

    /// `xstack` layout for `n` inputs, `None` outside `1..=6`.
    pub fn template(self, n: usize) -> Option<String> {
        if !(1..=MAX_SLOTS).contains(&n) {
            return None;
        }
        Some(self.placements()[..n].join("|"))
    }
}

impl std::fmt::Display for LayoutMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LayoutMode::Vertical => write!(f, "vertical"),
            LayoutMode::Horizontal => write!(f, "horizontal"),
            LayoutMode::Grid => write!(f, "grid"),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphOptions {
    pub layout: LayoutMode,
    pub fit_to_grid: bool,
    pub graph_monitor: bool,
}

/// Build the filtergraph for `views` (already filtered to enabled, non-empty
/// slots, in order) and the adjustment expression (empty for none).
pub fn compose(views: &[String], adjustment: &str, options: &GraphOptions, tokens: &TokenContext) -> String {
    let views: Vec<&str> = views
        .iter()
        .map(String::as_str)
        .filter(|v| !v.is_empty())
        .collect();
    let mut n = views.len();
    if n == 0 {
        return String::new();
    }
    if n > MAX_SLOTS {
        warn!("{} views requested, composing the first {}", n, MAX_SLOTS);
        n = MAX_SLOTS;
    }

    let mut graph = String::new();
    if n == 1 {
        graph.push_str(&tokens.apply(views[0]));
    } else {
        let adjustment = tokens.apply(adjustment);
        graph.push_str("sws_flags=neighbor;");
        if !adjustment.is_empty() {
            graph.push_str(&adjustment);
            graph.push(',');
        }
        let _ = write!(graph, "split={}", n);
        for i in 1..=n {
            let _ = write!(graph, "[x{}]", i);
        }
        graph.push(';');

        for (i, view) in views[..n].iter().enumerate() {
            let view = tokens.apply(view);
            if options.fit_to_grid {
                let _ = write!(
                    graph,
                    "[x{i}]{view},scale={}:{}[y{i}];",
                    tokens.width,
                    tokens.height,
                    i = i + 1
                );
            } else {
                let _ = write!(graph, "[x{i}]{view}[y{i}];", i = i + 1);
            }
        }

        for i in 1..=n {
            let _ = write!(graph, "[y{}]", i);
        }
        let layout = options.layout.template(n).unwrap_or_default();
        let _ = write!(graph, "xstack=fill=slategray:inputs={}:layout={}", n, layout);
    }

    if options.graph_monitor {
        graph.push_str(GRAPH_MONITOR);
    }
    debug!("Composed graph ({} views, {}): {}", n, options.layout, graph);
    graph
}

#[cfg(test)]
mod tests {
    use super::*;

    fn views(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn ctx() -> TokenContext {
        TokenContext {
            width: 720,
            height: 480,
            dar: 1.5,
            window_width: 800,
            window_height: 600,
            fontfile: None,
        }
    }

    #[test]
    fn test_empty_graph_for_any_layout() {
        for layout in [LayoutMode::Vertical, LayoutMode::Horizontal, LayoutMode::Grid] {
            let options = GraphOptions {
                layout,
                fit_to_grid: true,
                graph_monitor: false,
            };
            assert_eq!(compose(&[], "eq=contrast=2", &options, &ctx()), "");
            assert_eq!(compose(&views(&["", ""]), "", &options, &ctx()), "");
        }
    }

    #[test]
    fn test_single_view_is_whole_graph() {
        let options = GraphOptions {
            fit_to_grid: true,
            ..Default::default()
        };
        assert_eq!(
            compose(&views(&["scale=${width}:${height}"]), "eq=contrast=2", &options, &ctx()),
            "scale=720:480"
        );
    }

    #[test]
    fn test_three_views_grid() {
        let graph = compose(&views(&["a", "b", "c"]), "", &GraphOptions::default(), &ctx());
        assert_eq!(
            graph,
            "sws_flags=neighbor;split=3[x1][x2][x3];[x1]a[y1];[x2]b[y2];[x3]c[y3];\
             [y1][y2][y3]xstack=fill=slategray:inputs=3:layout=0_0|w0_0|0_h0"
        );
    }

    #[test]
    fn test_adjustment_precedes_split() {
        let options = GraphOptions {
            layout: LayoutMode::Horizontal,
            ..Default::default()
        };
        let graph = compose(&views(&["a", "b"]), "eq=gamma=2", &options, &ctx());
        assert!(graph.starts_with("sws_flags=neighbor;eq=gamma=2,split=2[x1][x2];"));
        assert!(graph.ends_with("inputs=2:layout=0_0|w0_0"));
    }

    #[test]
    fn test_fit_to_grid_scales_branches() {
        let options = GraphOptions {
            fit_to_grid: true,
            ..Default::default()
        };
        let graph = compose(&views(&["a", "b"]), "", &options, &ctx());
        assert!(graph.contains("[x1]a,scale=720:480[y1];[x2]b,scale=720:480[y2];"));
    }

    #[test]
    fn test_graph_monitor_appended() {
        let options = GraphOptions {
            graph_monitor: true,
            ..Default::default()
        };
        assert_eq!(
            compose(&views(&["a"]), "", &options, &ctx()),
            format!("a{}", GRAPH_MONITOR)
        );
        assert!(compose(&views(&["a", "b"]), "", &options, &ctx()).ends_with(GRAPH_MONITOR));
    }

    #[test]
    fn test_layout_templates() {
        let expected = [
            (LayoutMode::Vertical, "0_0|0_h0|0_h0+h1|0_h0+h1+h2|0_h0+h1+h2+h3|0_h0+h1+h2+h3+h4"),
            (LayoutMode::Horizontal, "0_0|w0_0|w0+w1_0|w0+w1+w2_0|w0+w1+w2+w3_0|w0+w1+w2+w3+w4_0"),
            (LayoutMode::Grid, "0_0|w0_0|0_h0|w0_h0|0_h0+h1|w0_h0+h1"),
        ];
        for (mode, full) in expected {
            let parts: Vec<&str> = full.split('|').collect();
            for n in 1..=MAX_SLOTS {
                assert_eq!(mode.template(n), Some(parts[..n].join("|")), "{} n={}", mode, n);
            }
            assert_eq!(mode.template(0), None);
            assert_eq!(mode.template(7), None);
        }
    }

    #[test]
    fn test_six_views_all_inputs() {
        let graph = compose(&views(&["a", "b", "c", "d", "e", "f"]), "", &GraphOptions::default(), &ctx());
        assert!(graph.contains("split=6[x1][x2][x3][x4][x5][x6];"));
        assert!(graph.contains("[y1][y2][y3][y4][y5][y6]xstack=fill=slategray:inputs=6:"));
    }
}
