use crate::api::gene_search::{GeneInfo, GeneSearch};
use crate::api::pathway_commons::SearchHit;
use crate::api::search::{PathwaySearch, SearchQuery};
use crate::api::search_utils::{sanitize_query, unique_query_tokens};
use crate::constants::RAW_SEARCH_MAX_CHARS;

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct AppSearchResult {
    pub genes: Vec<GeneInfo>,
    pub pathways: Vec<SearchHit>,
}

// The search entry point of the app: genes and pathways are searched
// together and a failure of either gives an empty list for that part.
pub struct AppSearch {
    gene_search: GeneSearch,
    pathway_search: PathwaySearch,
}

impl AppSearch {
    pub fn new(gene_search: GeneSearch, pathway_search: PathwaySearch) -> AppSearch {
        AppSearch {
            gene_search,
            pathway_search,
        }
    }

    pub async fn search_genes(&self, raw_query: &str) -> Vec<GeneInfo> {
        let tokens = unique_query_tokens(raw_query);

        match self.gene_search.aggregate(&tokens).await {
            Ok(gene_info) => gene_info,
            Err(err) => {
                tracing::warn!("gene search for {:?} failed: {}", raw_query, err);
                vec![]
            }
        }
    }

    pub async fn search_pathways(&self, query: &SearchQuery) -> Vec<SearchHit> {
        let sanitized_query = SearchQuery {
            q: sanitize_query(&query.q, RAW_SEARCH_MAX_CHARS),
            ..query.clone()
        };

        match self.pathway_search.search(&sanitized_query).await {
            Ok(hits) => hits,
            Err(err) => {
                tracing::warn!("pathway search for {:?} failed: {}", query.q, err);
                vec![]
            }
        }
    }

    pub async fn search(&self, query: &SearchQuery) -> AppSearchResult {
        let (genes, pathways) =
            tokio::join!(self.search_genes(&query.q), self.search_pathways(query));

        AppSearchResult {
            genes,
            pathways,
        }
    }
}
