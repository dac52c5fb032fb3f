use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use pathways::api::entity_summary::{EntitySummary, SummaryService, XrefLink, xref_link};
use pathways::api::gconvert::{ConversionService, ConvertForm, IdentifierResolver, Namespace};
use pathways::api::pathway_commons::{DataSourceMap, PathwayCommons, PcSearchParams,
                                     SearchHit, SearchResponse, SifGraphParams};
use pathways::errors::{Result, ServiceError};
use pathways::web::config::Config;

pub const IDENTIFIERS_URL: &str = "https://identifiers.org";

// Stands in for gconvert: answers from a table of target code -> token
// -> converted alias, in the "mini" output format
#[derive(Default)]
pub struct FakeGConvert {
    aliases: HashMap<String, HashMap<String, String>>,
    pub calls: AtomicUsize,
    pub failures_remaining: AtomicUsize,
    failing_targets: Vec<String>,
    delay: Option<Duration>,
}

#[allow(dead_code)]
impl FakeGConvert {
    pub fn new() -> FakeGConvert {
        FakeGConvert::default()
    }

    pub fn with_alias(mut self, target_code: &str, token: &str, converted: &str) -> Self {
        self.aliases.entry(target_code.to_owned()).or_default()
            .insert(token.to_uppercase(), converted.to_owned());
        self
    }

    pub fn with_failing_target(mut self, target_code: &str) -> Self {
        self.failing_targets.push(target_code.to_owned());
        self
    }

    pub fn with_failures(self, count: usize) -> Self {
        self.failures_remaining.store(count, Ordering::SeqCst);
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ConversionService for FakeGConvert {
    async fn convert(&self, form: &ConvertForm) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let failures_remaining = self.failures_remaining.load(Ordering::SeqCst);
        if failures_remaining > 0 {
            self.failures_remaining.store(failures_remaining - 1, Ordering::SeqCst);
            return Err(ServiceError::Transport("connection refused".into()));
        }

        if self.failing_targets.contains(&form.target) {
            return Err(ServiceError::Transport(format!("{} unavailable", form.target)));
        }

        let empty = HashMap::new();
        let target_aliases = self.aliases.get(&form.target).unwrap_or(&empty);

        let mut body = String::new();

        for (i, token) in form.query.split_whitespace().enumerate() {
            let upper_token = token.to_uppercase();
            let converted =
                target_aliases.get(&upper_token).map(String::as_str).unwrap_or("N/A");
            let initial_alias =
                if upper_token.chars().all(|c| c.is_ascii_digit()) {
                    format!("ENTREZGENE_ACC:{}", upper_token)
                } else {
                    upper_token
                };
            body += &format!("{}\t{}\t1\t{}\tdescription\n", i + 1, initial_alias, converted);
        }

        Ok(body)
    }
}

// Answers searches from a list of responses, one per call in order
#[derive(Default)]
pub struct FakePc {
    search_responses: Mutex<Vec<Result<SearchResponse>>>,
    pub search_queries: Mutex<Vec<String>>,
    sif_text: String,
    pub sif_requests: Mutex<Vec<SifGraphParams>>,
}

#[allow(dead_code)]
impl FakePc {
    pub fn new() -> FakePc {
        FakePc::default()
    }

    pub fn with_search_response(self, response: Result<SearchResponse>) -> Self {
        self.search_responses.lock().unwrap().push(response);
        self
    }

    pub fn with_sif_text(mut self, sif_text: &str) -> Self {
        self.sif_text = sif_text.to_owned();
        self
    }

    pub fn issued_queries(&self) -> Vec<String> {
        self.search_queries.lock().unwrap().clone()
    }

    pub fn sif_request_count(&self) -> usize {
        self.sif_requests.lock().unwrap().len()
    }
}

#[async_trait]
impl PathwayCommons for FakePc {
    async fn search(&self, params: &PcSearchParams) -> Result<SearchResponse> {
        self.search_queries.lock().unwrap().push(params.q.clone());

        let mut responses = self.search_responses.lock().unwrap();
        if responses.is_empty() {
            Ok(SearchResponse::default())
        } else {
            responses.remove(0)
        }
    }

    async fn sif_graph(&self, params: &SifGraphParams) -> Result<String> {
        self.sif_requests.lock().unwrap().push(params.clone());
        Ok(self.sif_text.clone())
    }

    async fn datasources(&self) -> Result<DataSourceMap> {
        Ok(DataSourceMap::new())
    }
}

#[derive(Default)]
pub struct FakeSummaries {
    summaries: HashMap<String, EntitySummary>,
    pub calls: AtomicUsize,
}

#[allow(dead_code)]
impl FakeSummaries {
    pub fn new() -> FakeSummaries {
        FakeSummaries::default()
    }

    pub fn with_gene(mut self, ncbi_id: &str, symbol: &str) -> Self {
        self.summaries.insert(ncbi_id.to_owned(), make_summary(ncbi_id, symbol));
        self
    }
}

#[async_trait]
impl SummaryService for FakeSummaries {
    async fn gene_summaries(&self, gene_ids: &[String]) -> Result<Vec<EntitySummary>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(gene_ids.iter().filter_map(|id| self.summaries.get(id).cloned()).collect())
    }

    fn xref_link(&self, namespace: Namespace, id: &str) -> XrefLink {
        xref_link(IDENTIFIERS_URL, namespace, id)
    }
}

pub fn make_summary(ncbi_id: &str, symbol: &str) -> EntitySummary {
    EntitySummary {
        data_source: "ncbigene".into(),
        display_name: format!("{} protein", symbol),
        local_id: ncbi_id.into(),
        description: String::new(),
        aliases: vec![],
        alias_ids: vec![symbol.into()],
        xref_links: vec![xref_link(IDENTIFIERS_URL, Namespace::NcbiGene, ncbi_id),
                         xref_link(IDENTIFIERS_URL, Namespace::HgncSymbol, symbol)],
    }
}

#[allow(dead_code)]
pub fn make_hit(uri: &str, num_participants: Option<u32>) -> SearchHit {
    SearchHit {
        uri: uri.into(),
        num_participants,
        ..SearchHit::default()
    }
}

#[allow(dead_code)]
pub fn make_response(hits: Vec<SearchHit>) -> SearchResponse {
    SearchResponse {
        num_hits: Some(hits.len() as u64),
        search_hit: hits,
        ..SearchResponse::default()
    }
}

#[allow(dead_code)]
pub fn make_resolver(gconvert: Arc<FakeGConvert>) -> Arc<IdentifierResolver> {
    Arc::new(IdentifierResolver::new(&Config::default(), gconvert))
}

#[allow(dead_code)]
pub fn tokens(strs: &[&str]) -> Vec<String> {
    strs.iter().map(|s| s.to_string()).collect()
}
