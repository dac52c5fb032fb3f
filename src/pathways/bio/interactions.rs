use std::collections::HashSet;

use indexmap::IndexMap;

use crate::constants::{EXTERNAL_MEDIATOR_MARKER, QUERIED_NODE_DEGREE};
use crate::types::{MediatorId, NodeId, PubmedId};

// SIF columns
const SOURCE_INDEX: usize = 0;
const TYPE_INDEX: usize = 1;
const TARGET_INDEX: usize = 2;
const PUBMED_IDS_INDEX: usize = 4;
const MEDIATOR_IDS_INDEX: usize = 6;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InteractionLabel {
    Binding,
    Modification,
    Expression,
    Other,
    #[serde(rename = "")]
    Unclassified,
}

impl InteractionLabel {
    pub fn from_interaction_type(interaction_type: &str) -> InteractionLabel {
        match interaction_type {
            "interacts-with" => InteractionLabel::Binding,
            "controls-state-change-of" |
            "controls-phosphorylation-of" => InteractionLabel::Modification,
            "controls-expression-of" => InteractionLabel::Expression,
            "controls-transport-of" |
            "catalysis-precedes" => InteractionLabel::Other,
            _ => InteractionLabel::Unclassified,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            InteractionLabel::Binding => "Binding",
            InteractionLabel::Modification => "Modification",
            InteractionLabel::Expression => "Expression",
            InteractionLabel::Other => "Other",
            InteractionLabel::Unclassified => "",
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct GraphNode {
    pub id: NodeId,
    pub queried: bool,
    pub degree: u64,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct GraphEdge {
    // a readable summary, eg. "TP53 interacts with MDM2"
    pub id: String,
    pub source: NodeId,
    pub target: NodeId,
    pub interaction_type: String,
    pub label: InteractionLabel,
    pub pubmed_ids: Vec<PubmedId>,
    pub mediator_ids: Vec<MediatorId>,
    // mediator ids that are Pathway Commons URIs
    pub pc_ids: Vec<MediatorId>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct InteractionGraph {
    pub nodes: IndexMap<NodeId, GraphNode>,
    pub edges: Vec<GraphEdge>,
}

fn split_multi_value(field: Option<&str>) -> Vec<String> {
    field.unwrap_or("")
        .split(';')
        .filter(|part| !part.is_empty())
        .map(String::from)
        .collect()
}

fn edge_summary(source: &str, interaction_type: &str, target: &str) -> String {
    if interaction_type == "catalysis-precedes" {
        format!("{} and {} in catalysis", source, target)
    } else {
        format!("{} {} {}", source, interaction_type.replace('-', " "), target)
    }
}

fn make_edge(source: &str, interaction_type: &str, target: &str,
             pubmed_ids_field: Option<&str>, mediator_ids_field: Option<&str>) -> GraphEdge {
    let mediator_ids = split_multi_value(mediator_ids_field);
    let pc_ids =
        mediator_ids.iter()
        .filter(|id| !id.to_uppercase().contains(EXTERNAL_MEDIATOR_MARKER))
        .cloned()
        .collect();

    GraphEdge {
        id: edge_summary(source, interaction_type, target),
        source: source.to_owned(),
        target: target.to_owned(),
        interaction_type: interaction_type.to_owned(),
        label: InteractionLabel::from_interaction_type(interaction_type),
        pubmed_ids: split_multi_value(pubmed_ids_field),
        mediator_ids,
        pc_ids,
    }
}

fn make_node(id: &str, upper_queried_ids: &HashSet<String>) -> GraphNode {
    let queried = upper_queried_ids.contains(&id.to_uppercase());

    GraphNode {
        id: id.to_owned(),
        queried,
        degree: if queried { QUERIED_NODE_DEGREE } else { 0 },
    }
}

// Parse SIF text into a graph.  Columns are:
//   source, type, target, ignored, PubMed ids, ignored, mediator ids
// Lines without a source or target are skipped.  Nodes are kept in the
// order they are first seen.
pub fn sif_to_graph(sif_text: &str, queried_ids: &[NodeId]) -> InteractionGraph {
    let upper_queried_ids: HashSet<String> =
        queried_ids.iter().map(|id| id.to_uppercase()).collect();

    let mut graph = InteractionGraph::default();

    for line in sif_text.lines() {
        let fields: Vec<&str> = line.split('\t').collect();

        let source = fields.get(SOURCE_INDEX).copied().unwrap_or("");
        let target = fields.get(TARGET_INDEX).copied().unwrap_or("");

        if source.is_empty() || target.is_empty() {
            continue;
        }

        let interaction_type = fields.get(TYPE_INDEX).copied().unwrap_or("");

        for id in [source, target] {
            let node = graph.nodes.entry(id.to_owned())
                .or_insert_with(|| make_node(id, &upper_queried_ids));
            node.degree = node.degree.saturating_add(1);
        }

        graph.edges.push(make_edge(source, interaction_type, target,
                                   fields.get(PUBMED_IDS_INDEX).copied(),
                                   fields.get(MEDIATOR_IDS_INDEX).copied()));
    }

    graph
}

// Keep the max_nodes nodes of highest degree (ties in encounter order),
// then remove nodes of degree 0 and any edge that lost an endpoint.
pub fn filter_by_degree(graph: InteractionGraph, max_nodes: usize) -> InteractionGraph {
    let mut nodes: Vec<GraphNode> = graph.nodes.into_values().collect();
    nodes.sort_by(|a, b| b.degree.cmp(&a.degree));

    let nodes: IndexMap<NodeId, GraphNode> =
        nodes.into_iter()
        .take(max_nodes)
        .filter(|node| node.degree != 0)
        .map(|node| (node.id.clone(), node))
        .collect();

    let edges =
        graph.edges.into_iter()
        .filter(|edge| nodes.contains_key(&edge.source) && nodes.contains_key(&edge.target))
        .collect();

    InteractionGraph {
        nodes,
        edges,
    }
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct CyNodeData {
    pub class: &'static str,
    pub id: NodeId,
    pub queried: bool,
    pub metric: u64,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct CyNode {
    pub data: CyNodeData,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CyEdgeData {
    pub id: String,
    #[serde(rename = "type")]
    pub interaction_type: String,
    pub source: NodeId,
    pub target: NodeId,
    pub pubmed_ids: Vec<PubmedId>,
    pub pc_ids: Vec<MediatorId>,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct CyEdge {
    pub data: CyEdgeData,
    pub classes: &'static str,
}

// the network in the element JSON format read by Cytoscape.js
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct CytoscapeNetwork {
    pub nodes: Vec<CyNode>,
    pub edges: Vec<CyEdge>,
}

impl From<&InteractionGraph> for CytoscapeNetwork {
    fn from(graph: &InteractionGraph) -> Self {
        let nodes = graph.nodes.values()
            .map(|node| CyNode {
                data: CyNodeData {
                    class: "ball",
                    id: node.id.clone(),
                    queried: node.queried,
                    metric: node.degree,
                }
            })
            .collect();

        let edges = graph.edges.iter()
            .map(|edge| CyEdge {
                data: CyEdgeData {
                    id: edge.id.clone(),
                    interaction_type: edge.interaction_type.clone(),
                    source: edge.source.clone(),
                    target: edge.target.clone(),
                    pubmed_ids: edge.pubmed_ids.clone(),
                    pc_ids: edge.pc_ids.clone(),
                },
                classes: edge.label.as_str(),
            })
            .collect();

        CytoscapeNetwork {
            nodes,
            edges,
        }
    }
}


#[test]
fn test_interaction_labels() {
    assert_eq!(InteractionLabel::from_interaction_type("interacts-with").as_str(), "Binding");
    assert_eq!(InteractionLabel::from_interaction_type("controls-phosphorylation-of"),
               InteractionLabel::Modification);
    assert_eq!(InteractionLabel::from_interaction_type("controls-expression-of"),
               InteractionLabel::Expression);
    assert_eq!(InteractionLabel::from_interaction_type("catalysis-precedes"),
               InteractionLabel::Other);
    assert_eq!(InteractionLabel::from_interaction_type("in-complex-with").as_str(), "");
}

#[test]
fn test_edge_summary() {
    assert_eq!(edge_summary("A", "controls-state-change-of", "B"), "A controls state change of B");
    assert_eq!(edge_summary("A", "catalysis-precedes", "B"), "A and B in catalysis");
}

#[test]
fn test_pc_ids() {
    let edge = make_edge("A", "interacts-with", "B", None,
                         Some("http://pathwaycommons.org/pc2/Complex_1;reactome:R-HSA-1;Reactome_2"));
    assert_eq!(edge.mediator_ids.len(), 3);
    assert_eq!(edge.pc_ids, vec!["http://pathwaycommons.org/pc2/Complex_1"]);
    assert!(edge.pubmed_ids.is_empty());
}
