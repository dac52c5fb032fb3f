use async_trait::async_trait;
use indexmap::IndexMap;
use reqwest::Client;
use serde_json::{Map, Value};

use crate::cache::RequestCache;
use crate::constants::{PC_USER, SIF_PATTERNS};
use crate::errors::Result;
use crate::types::{DataSourceUri, NodeId};
use crate::web::config::Config;

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SearchHit {
    pub uri: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub biopax_class: Option<String>,
    #[serde(default)]
    pub data_source: Vec<String>,
    #[serde(default)]
    pub organism: Vec<String>,
    #[serde(default)]
    pub pathway: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub num_participants: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub num_processes: Option<u32>,
    // anything else the server sends is passed through unchanged
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SearchHit {
    // a missing participant count is treated as zero
    pub fn size(&self) -> u32 {
        self.num_participants.unwrap_or(0)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    #[serde(default)]
    pub search_hit: Vec<SearchHit>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub num_hits: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_hits_per_page: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_no: Option<u32>,
}

// parameters of a single pc2/search request
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct PcSearchParams {
    pub q: String,
    #[serde(rename = "type")]
    pub biopax_type: String,
    #[serde(default)]
    pub datasource: Vec<String>,
    #[serde(default)]
    pub organism: Vec<String>,
}

impl PcSearchParams {
    fn to_query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![("q", self.q.clone()),
                             ("type", self.biopax_type.clone()),
                             ("user", PC_USER.to_owned())];
        pairs.extend(self.datasource.iter().map(|ds| ("datasource", ds.clone())));
        pairs.extend(self.organism.iter().map(|org| ("organism", org.clone())));
        pairs
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SifGraphParams {
    pub source: Vec<NodeId>,
    pub pattern: Vec<String>,
    pub limit: u32,
}

impl SifGraphParams {
    pub fn new(source: Vec<NodeId>) -> SifGraphParams {
        SifGraphParams {
            source,
            pattern: SIF_PATTERNS.iter().map(|p| p.to_string()).collect(),
            limit: 1,
        }
    }

    // several sources: the paths between them, otherwise the neighbourhood
    // of the single source
    pub fn path_and_query(&self) -> (&'static str, Vec<(&'static str, String)>) {
        let mut pairs: Vec<(&'static str, String)> =
            self.source.iter().map(|source| ("source", source.clone())).collect();
        pairs.extend(self.pattern.iter().map(|pattern| ("pattern", pattern.clone())));
        pairs.push(("limit", self.limit.to_string()));

        if self.source.len() > 1 {
            pairs.push(("directed", "false".to_owned()));
            ("pathsbetween", pairs)
        } else {
            pairs.push(("direction", "UNDIRECTED".to_owned()));
            ("neighborhood", pairs)
        }
    }
}

#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct RawDataSource {
    pub uri: DataSourceUri,
    #[serde(default)]
    pub identifier: String,
    #[serde(default)]
    pub name: Vec<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default, rename = "type")]
    pub source_type: String,
    #[serde(default)]
    pub icon_url: Option<String>,
    #[serde(default)]
    pub not_pathway_data: bool,
    #[serde(default)]
    pub num_pathways: u32,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DataSource {
    pub id: String,
    pub uri: DataSourceUri,
    pub name: String,
    pub description: String,
    #[serde(rename = "type")]
    pub source_type: String,
    pub icon_url: Option<String>,
    pub has_pathways: bool,
}

pub type DataSourceMap = IndexMap<DataSourceUri, DataSource>;

// keep only pathway data sources, preferring the second (short) name
pub fn simplify_datasources(raw_datasources: Vec<RawDataSource>) -> DataSourceMap {
    raw_datasources.into_iter()
        .filter(|ds| !ds.not_pathway_data)
        .map(|ds| {
            let name =
                if ds.name.len() > 1 {
                    ds.name[1].clone()
                } else {
                    ds.name.first().cloned().unwrap_or_default()
                };
            let datasource = DataSource {
                id: ds.identifier,
                uri: ds.uri.clone(),
                name,
                description: ds.description,
                source_type: ds.source_type,
                icon_url: ds.icon_url,
                has_pathways: ds.num_pathways > 0,
            };
            (ds.uri, datasource)
        })
        .collect()
}

#[async_trait]
pub trait PathwayCommons: Send + Sync {
    async fn search(&self, params: &PcSearchParams) -> Result<SearchResponse>;

    // returns the SIF text
    async fn sif_graph(&self, params: &SifGraphParams) -> Result<String>;

    async fn datasources(&self) -> Result<DataSourceMap>;
}

pub struct PcClient {
    client: Client,
    pc_url: String,
    datasources_cache: RequestCache<DataSourceMap>,
}

impl PcClient {
    pub fn new(config: &Config, client: Client) -> PcClient {
        PcClient {
            client,
            pc_url: config.urls.pc_url.clone(),
            datasources_cache: RequestCache::new("datasources", 1),
        }
    }

    async fn fetch_datasources(&self) -> Result<DataSourceMap> {
        let url = self.pc_url.clone() + "pc2/metadata/datasources";
        let raw_datasources: Vec<RawDataSource> =
            self.client.get(&url)
            .header(reqwest::header::ACCEPT, "application/json")
            .send().await?
            .error_for_status()?
            .json().await?;

        Ok(simplify_datasources(raw_datasources))
    }
}

#[async_trait]
impl PathwayCommons for PcClient {
    async fn search(&self, params: &PcSearchParams) -> Result<SearchResponse> {
        let url = self.pc_url.clone() + "pc2/search";
        tracing::debug!("PC search: {}", params.q);

        let res = self.client.get(&url)
            .header(reqwest::header::ACCEPT, "application/json")
            .query(&params.to_query_pairs())
            .send().await?
            .error_for_status()?;

        Ok(res.json::<SearchResponse>().await?)
    }

    async fn sif_graph(&self, params: &SifGraphParams) -> Result<String> {
        let (path, query_pairs) = params.path_and_query();
        let url = format!("{}sifgraph/v1/{}", self.pc_url, path);

        let res = self.client.get(&url)
            .header(reqwest::header::ACCEPT, "text/plain")
            .query(&query_pairs)
            .send().await
            .and_then(|res| res.error_for_status())
            .inspect_err(|err| tracing::error!("sifGraph {:?} failed - {}", params.source, err))?;

        Ok(res.text().await?)
    }

    async fn datasources(&self) -> Result<DataSourceMap> {
        self.datasources_cache.fetch("datasources", || self.fetch_datasources()).await
    }
}


#[test]
fn test_sif_graph_path() {
    let params = SifGraphParams::new(vec!["TP53".into()]);
    let (path, pairs) = params.path_and_query();
    assert_eq!(path, "neighborhood");
    assert!(pairs.contains(&("direction", "UNDIRECTED".to_owned())));
    assert!(pairs.contains(&("limit", "1".to_owned())));
    assert_eq!(pairs.iter().filter(|(k, _)| *k == "pattern").count(), 6);

    let params = SifGraphParams::new(vec!["TP53".into(), "MDM2".into()]);
    let (path, pairs) = params.path_and_query();
    assert_eq!(path, "pathsbetween");
    assert!(pairs.contains(&("directed", "false".to_owned())));
    assert_eq!(pairs.iter().filter(|(k, _)| *k == "source").count(), 2);
}

#[test]
fn test_simplify_datasources() {
    let raw: Vec<RawDataSource> = serde_json::from_str(r#"[
      {"uri": "http://pathwaycommons.org/pc2/reactome", "identifier": "reactome",
       "name": ["Reactome", "reactome"], "description": "Reactome v77",
       "type": "BIOPAX", "iconUrl": "http://example.org/r.png",
       "notPathwayData": false, "numPathways": 2000},
      {"uri": "http://pathwaycommons.org/pc2/chebi", "identifier": "chebi",
       "name": ["ChEBI"], "notPathwayData": true}
    ]"#).unwrap();

    let datasources = simplify_datasources(raw);
    assert_eq!(datasources.len(), 1);
    let reactome = &datasources["http://pathwaycommons.org/pc2/reactome"];
    assert_eq!(reactome.name, "reactome");
    assert!(reactome.has_pathways);
}

#[test]
fn test_search_hit_size() {
    let response: SearchResponse = serde_json::from_str(r#"{
      "searchHit": [
        {"uri": "http://identifiers.org/reactome/R-HSA-1", "name": "Cell Cycle",
         "numParticipants": 300, "size": 12},
        {"uri": "http://identifiers.org/reactome/R-HSA-2"}
      ],
      "numHits": 2
    }"#).unwrap();

    assert_eq!(response.search_hit[0].size(), 300);
    assert_eq!(response.search_hit[0].extra["size"], 12);
    assert_eq!(response.search_hit[1].size(), 0);
}
