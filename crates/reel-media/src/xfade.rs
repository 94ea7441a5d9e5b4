//! Typed cross-fade filter graphs.
//!
//! The transition chain is represented as a sequence of nodes and serialized
//! to an FFmpeg `-filter_complex` string at the last moment, so the graph can
//! be inspected and tested without spawning an encoder.

use crate::error::{MediaError, MediaResult};
use crate::timing::{TransitionPlan, TRANSITION_SECS};

/// One node in a scene's filter graph.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterNode {
    /// Normalize input `index` to the shared resolution and pixel format,
    /// producing stream `label`.
    Scale {
        index: usize,
        filter: String,
        label: String,
    },
    /// Cross-fade `from` into `to` at `offset`, producing `out`.
    CrossFade {
        from: String,
        to: String,
        out: String,
        duration: f64,
        offset: f64,
    },
}

impl FilterNode {
    fn serialize(&self) -> String {
        match self {
            FilterNode::Scale { index, filter, label } => {
                format!("[{}:v]{}[{}]", index, filter, label)
            }
            FilterNode::CrossFade {
                from,
                to,
                out,
                duration,
                offset,
            } => {
                format!(
                    "[{}][{}]xfade=duration={}:offset={:.3}[{}]",
                    from, to, duration, offset, out
                )
            }
        }
    }
}

/// Filter graph chaining `k - 1` cross-fades over `k` normalized image streams.
#[derive(Debug, Clone)]
pub struct TransitionGraph {
    nodes: Vec<FilterNode>,
    output_label: String,
}

impl TransitionGraph {
    /// Build the graph for `input_count` image inputs.
    ///
    /// Each input is scaled with `scale_filter`, then consecutive streams are
    /// folded left through `xfade` at the planned offsets. The final fade's
    /// output is the scene's merged visual track.
    pub fn build(
        input_count: usize,
        scale_filter: &str,
        transitions: &TransitionPlan,
    ) -> MediaResult<Self> {
        if input_count < 2 {
            return Err(MediaError::render(
                format!("Transition graph needs at least two inputs, got {}", input_count),
                None,
                None,
            ));
        }
        if transitions.len() != input_count - 1 {
            return Err(MediaError::render(
                format!(
                    "Transition count {} does not match {} inputs",
                    transitions.len(),
                    input_count
                ),
                None,
                None,
            ));
        }

        let mut nodes = Vec::with_capacity(input_count * 2 - 1);
        for index in 0..input_count {
            nodes.push(FilterNode::Scale {
                index,
                filter: scale_filter.to_string(),
                label: format!("fv{}", index),
            });
        }

        let mut prev = "fv0".to_string();
        for (i, offset) in transitions.offsets().iter().enumerate() {
            let out = if i == transitions.len() - 1 {
                "vout".to_string()
            } else {
                format!("x{}", i + 1)
            };
            nodes.push(FilterNode::CrossFade {
                from: prev,
                to: format!("fv{}", i + 1),
                out: out.clone(),
                duration: TRANSITION_SECS,
                offset: *offset,
            });
            prev = out;
        }

        Ok(Self {
            nodes,
            output_label: prev,
        })
    }

    /// Graph nodes in serialization order.
    pub fn nodes(&self) -> &[FilterNode] {
        &self.nodes
    }

    /// Label of the merged visual track (mapped into the output).
    pub fn output_label(&self) -> &str {
        &self.output_label
    }

    /// Stream specifier for `-map`.
    pub fn output_map(&self) -> String {
        format!("[{}]", self.output_label)
    }

    /// Serialize to an FFmpeg `-filter_complex` string.
    pub fn to_filter_complex(&self) -> String {
        self.nodes
            .iter()
            .map(FilterNode::serialize)
            .collect::<Vec<_>>()
            .join(";")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timing::TimingPlan;

    fn graph_for(count: usize, total: f64) -> TransitionGraph {
        let timing = TimingPlan::new(count, total).unwrap();
        let transitions = TransitionPlan::from_timing(&timing);
        TransitionGraph::build(count, "scale=1280:720,format=yuv420p", &transitions).unwrap()
    }

    #[test]
    fn test_two_input_graph() {
        let graph = graph_for(2, 8.0);
        assert_eq!(graph.output_label(), "vout");
        assert_eq!(
            graph.to_filter_complex(),
            "[0:v]scale=1280:720,format=yuv420p[fv0];\
             [1:v]scale=1280:720,format=yuv420p[fv1];\
             [fv0][fv1]xfade=duration=1:offset=3.000[vout]"
        );
    }

    #[test]
    fn test_three_input_chain() {
        let graph = graph_for(3, 9.0);
        let serialized = graph.to_filter_complex();
        assert!(serialized.contains("[fv0][fv1]xfade=duration=1:offset=2.000[x1]"));
        assert!(serialized.contains("[x1][fv2]xfade=duration=1:offset=5.000[vout]"));
        assert_eq!(graph.output_map(), "[vout]");
    }

    #[test]
    fn test_node_counts() {
        let graph = graph_for(4, 12.0);
        let scales = graph
            .nodes()
            .iter()
            .filter(|n| matches!(n, FilterNode::Scale { .. }))
            .count();
        let fades = graph
            .nodes()
            .iter()
            .filter(|n| matches!(n, FilterNode::CrossFade { .. }))
            .count();
        assert_eq!(scales, 4);
        assert_eq!(fades, 3);
    }

    #[test]
    fn test_rejects_single_input() {
        let timing = TimingPlan::new(1, 5.0).unwrap();
        let transitions = TransitionPlan::from_timing(&timing);
        assert!(TransitionGraph::build(1, "scale=1280:720", &transitions).is_err());
    }

    #[test]
    fn test_rejects_mismatched_transition_count() {
        let timing = TimingPlan::new(2, 8.0).unwrap();
        let transitions = TransitionPlan::from_timing(&timing);
        assert!(TransitionGraph::build(3, "scale=1280:720", &transitions).is_err());
    }
}
