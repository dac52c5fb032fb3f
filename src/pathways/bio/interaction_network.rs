use std::sync::Arc;

use itertools::Itertools;

use crate::api::pathway_commons::{PathwayCommons, SifGraphParams};
use crate::bio::interactions::{InteractionGraph, filter_by_degree, sif_to_graph};
use crate::cache::RequestCache;
use crate::errors::{Result, ServiceError};
use crate::types::NodeId;
use crate::web::config::Config;

// Interaction networks around (or between) genes, from the Pathway
// Commons SIF graph service.  Networks are cached per source list.
pub struct InteractionNetwork {
    pc: Arc<dyn PathwayCommons>,
    max_sif_nodes: usize,
    cache: RequestCache<InteractionGraph>,
}

impl InteractionNetwork {
    pub fn new(config: &Config, pc: Arc<dyn PathwayCommons>) -> InteractionNetwork {
        InteractionNetwork {
            pc,
            max_sif_nodes: config.max_sif_nodes,
            cache: RequestCache::new("interactions", config.cache_max_size),
        }
    }

    pub async fn get(&self, sources: &[NodeId]) -> Result<InteractionGraph> {
        let source_ids: Vec<NodeId> =
            sources.iter()
            .map(|source| source.trim().to_uppercase())
            .filter(|source| !source.is_empty())
            .unique()
            .collect();

        if source_ids.is_empty() {
            return Err(ServiceError::InvalidParameter("no source ids given".into()));
        }

        self.cache.fetch(&source_ids, || self.fetch_network(&source_ids)).await
    }

    async fn fetch_network(&self, source_ids: &[NodeId]) -> Result<InteractionGraph> {
        let params = SifGraphParams::new(source_ids.to_vec());
        let sif_text = self.pc.sif_graph(&params).await?;
        let graph = sif_to_graph(&sif_text, source_ids);

        tracing::debug!("interaction graph for {:?}: {} nodes, {} edges",
                        source_ids, graph.nodes.len(), graph.edges.len());

        Ok(filter_by_degree(graph, self.max_sif_nodes))
    }
}
