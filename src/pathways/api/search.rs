use std::sync::Arc;

use regex::Regex;

use crate::api::gconvert::{ConvertOptions, IdentifierResolver, Namespace, ResolutionResult};
use crate::api::pathway_commons::{PathwayCommons, PcSearchParams, SearchHit};
use crate::api::search_utils::escape_lucene;
use crate::cache::RequestCache;
use crate::constants::{DEFAULT_MAX_PATHWAY_SIZE, DEFAULT_MIN_PATHWAY_SIZE, DEFAULT_SEARCH_TYPE};
use crate::errors::Result;
use crate::web::config::Config;

lazy_static! {
    static ref SMPDB_ID_RE: Regex = Regex::new(r"^SMP\d{5}$").unwrap();
    static ref CHEBI_ID_RE: Regex = Regex::new(r"^CHEBI:\d{1,6}$").unwrap();
}

fn default_search_type() -> String {
    DEFAULT_SEARCH_TYPE.to_owned()
}

// A pathway search request.  gt and lt bound the number of participants
// of the returned pathways (both exclusive).
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SearchQuery {
    pub q: String,
    #[serde(rename = "type", default = "default_search_type")]
    pub biopax_type: String,
    #[serde(default)]
    pub gt: Option<u32>,
    #[serde(default)]
    pub lt: Option<u32>,
    #[serde(default)]
    pub datasource: Vec<String>,
}

impl SearchQuery {
    pub fn new(q: &str) -> SearchQuery {
        SearchQuery {
            q: q.to_owned(),
            biopax_type: default_search_type(),
            gt: None,
            lt: None,
            datasource: vec![],
        }
    }

    pub fn min_size(&self) -> u32 {
        self.gt.unwrap_or(DEFAULT_MIN_PATHWAY_SIZE)
    }

    pub fn max_size(&self) -> u32 {
        self.lt.unwrap_or(DEFAULT_MAX_PATHWAY_SIZE)
    }
}

// SMPDB and short ChEBI ids can be matched exactly
fn is_structured_id(upper_token: &str) -> bool {
    SMPDB_ID_RE.is_match(upper_token) || CHEBI_ID_RE.is_match(upper_token)
}

// Lucene clauses for the tokens of a query: exact xref matches for
// recognised genes and database ids, fuzzy name matches for the rest
pub fn query_keywords(resolution: &ResolutionResult) -> Vec<String> {
    let gene_keywords =
        resolution.recognized_tokens()
        .into_iter()
        .map(|token| format!("xrefid:{}", escape_lucene(&token.to_uppercase())));

    let other_keywords =
        resolution.unrecognized.iter()
        .map(|token| {
            let upper_token = token.to_uppercase();
            let escaped = escape_lucene(&upper_token);
            if is_structured_id(&upper_token) {
                format!("xrefid:{}", escaped)
            } else {
                format!("name:*{}*", escaped)
            }
        });

    gene_keywords.chain(other_keywords).collect()
}

// The candidate queries, most precise (and fastest) first.  The last is
// the input as typed, without escaping.
pub fn candidate_queries(input: &str, keywords: &[String]) -> Vec<String> {
    let phrase = escape_lucene(input);

    vec![
        format!("(name:{}) OR (name:*{}*) OR ({})", phrase, phrase, keywords.join(" AND ")),
        format!("({})", keywords.join(" OR ")),
        input.to_owned(),
    ]
}

pub fn filter_by_size(hits: Vec<SearchHit>, min_size: u32, max_size: u32) -> Vec<SearchHit> {
    hits.into_iter()
        .filter(|hit| {
            let size = hit.size();
            min_size < size && size < max_size
        })
        .collect()
}

// Try each candidate in order and return the first non-empty, size
// filtered result.  A failed request counts as no result unless every
// request failed, then the last error is returned.
pub async fn run_search_cascade(pc: &dyn PathwayCommons, candidates: Vec<String>,
                                query: &SearchQuery)
    -> Result<Vec<SearchHit>>
{
    let mut last_error = None;
    let mut had_response = false;

    for candidate in candidates {
        let params = PcSearchParams {
            q: candidate,
            biopax_type: query.biopax_type.clone(),
            datasource: query.datasource.clone(),
            organism: vec![],
        };

        let response = match pc.search(&params).await {
            Ok(response) => response,
            Err(err) => {
                tracing::warn!("query {} failed - {}", params.q, err);
                last_error = Some(err);
                continue;
            }
        };

        had_response = true;

        if response.search_hit.is_empty() {
            continue;
        }

        let filtered = filter_by_size(response.search_hit, query.min_size(), query.max_size());

        if !filtered.is_empty() {
            return Ok(filtered);
        }
    }

    match last_error {
        Some(err) if !had_response => Err(err),
        _ => Ok(vec![]),
    }
}

// Full-text pathway search with progressively looser queries
pub struct PathwaySearch {
    resolver: Arc<IdentifierResolver>,
    pc: Arc<dyn PathwayCommons>,
    cache: RequestCache<Vec<SearchHit>>,
}

impl PathwaySearch {
    pub fn new(config: &Config, resolver: Arc<IdentifierResolver>, pc: Arc<dyn PathwayCommons>)
        -> PathwaySearch
    {
        PathwaySearch {
            resolver,
            pc,
            cache: RequestCache::new("pathway search", config.cache_max_size),
        }
    }

    pub async fn search(&self, query: &SearchQuery) -> Result<Vec<SearchHit>> {
        self.cache.fetch(query, || self.search_uncached(query)).await
    }

    async fn search_uncached(&self, query: &SearchQuery) -> Result<Vec<SearchHit>> {
        let input = query.q.trim();

        if input.is_empty() {
            return Ok(vec![]);
        }

        let tokens: Vec<String> = input.split_whitespace().map(String::from).collect();
        let resolution =
            self.resolver.resolve(&tokens, Namespace::Hgnc, &ConvertOptions::default()).await?;

        let keywords = query_keywords(&resolution);
        let candidates = candidate_queries(input, &keywords);

        run_search_cascade(self.pc.as_ref(), candidates, query).await
    }
}


#[test]
fn test_query_keywords() {
    let mut resolution = ResolutionResult::default();
    resolution.alias.insert("TP53".into(), "HGNC:11998".into());
    resolution.duplicate.insert("HGNC:11998".into(), vec!["P53".into()]);
    resolution.unrecognized.insert("smp00001".into());
    resolution.unrecognized.insert("CHEBI:15422".into());
    resolution.unrecognized.insert("CHEBI:1234567".into());
    resolution.unrecognized.insert("apoptosis".into());

    assert_eq!(query_keywords(&resolution),
               vec!["xrefid:TP53", "xrefid:P53", "xrefid:SMP00001",
                    r"xrefid:CHEBI\:15422", r"name:*CHEBI\:1234567*",
                    "name:*APOPTOSIS*"]);
}

#[test]
fn test_candidate_queries() {
    let keywords = vec!["xrefid:TP53".to_owned(), "name:*APOPTOSIS*".to_owned()];
    let candidates = candidate_queries("TP53 apoptosis", &keywords);

    assert_eq!(candidates.len(), 3);
    assert_eq!(candidates[0],
               r"(name:TP53\ apoptosis) OR (name:*TP53\ apoptosis*) OR (xrefid:TP53 AND name:*APOPTOSIS*)");
    assert_eq!(candidates[1], "(xrefid:TP53 OR name:*APOPTOSIS*)");
    assert_eq!(candidates[2], "TP53 apoptosis");
}

#[test]
fn test_filter_by_size() {
    let hit = |uri: &str, size: Option<u32>| SearchHit {
        uri: uri.into(),
        num_participants: size,
        ..SearchHit::default()
    };
    let hits = vec![hit("a", Some(300)), hit("b", Some(10)), hit("c", None),
                    hit("d", Some(250)), hit("e", Some(249))];

    let uris: Vec<String> =
        filter_by_size(hits, 0, 250).into_iter().map(|hit| hit.uri).collect();
    assert_eq!(uris, vec!["b", "e"]);
}
