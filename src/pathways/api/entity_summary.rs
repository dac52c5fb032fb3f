use std::collections::HashMap;

use async_trait::async_trait;
use reqwest::Client;

use crate::api::gconvert::Namespace;
use crate::errors::Result;
use crate::types::{CanonicalId, NamespaceName};
use crate::web::config::Config;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct XrefLink {
    pub namespace: NamespaceName,
    pub uri: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EntitySummary {
    pub data_source: NamespaceName,
    pub display_name: String,
    pub local_id: CanonicalId,
    pub description: String,
    pub aliases: Vec<String>,
    pub alias_ids: Vec<String>,
    pub xref_links: Vec<XrefLink>,
}

pub fn xref_link(identifiers_url: &str, namespace: Namespace, id: &str) -> XrefLink {
    XrefLink {
        namespace: namespace.name().into(),
        uri: format!("{}/{}:{}", identifiers_url.trim_end_matches('/'), namespace.name(), id),
    }
}

// Fetches summaries for a batch of identifiers in one request
#[async_trait]
pub trait SummaryService: Send + Sync {
    async fn gene_summaries(&self, gene_ids: &[CanonicalId]) -> Result<Vec<EntitySummary>>;

    // a link to a record in another database, eg. UniProt
    fn xref_link(&self, namespace: Namespace, id: &str) -> XrefLink;
}

#[derive(Deserialize, Debug)]
struct NcbiGeneDoc {
    uid: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    summary: String,
    #[serde(default)]
    otheraliases: String,
    #[serde(default)]
    otherdesignations: String,
    #[serde(default)]
    nomenclaturesymbol: String,
    error: Option<String>,
}

#[derive(Deserialize, Debug)]
struct NcbiESummaryResult {
    #[serde(default)]
    uids: Vec<String>,
    #[serde(flatten)]
    docs: HashMap<String, serde_json::Value>,
}

#[derive(Deserialize, Debug)]
struct NcbiESummaryResponse {
    result: Option<NcbiESummaryResult>,
}

fn split_non_empty(s: &str, separator: char) -> Vec<String> {
    s.split(separator)
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(String::from)
        .collect()
}

fn summary_from_doc(identifiers_url: &str, doc: NcbiGeneDoc) -> EntitySummary {
    let mut xref_links = vec![xref_link(identifiers_url, Namespace::NcbiGene, &doc.uid)];

    if !doc.nomenclaturesymbol.is_empty() {
        xref_links.push(xref_link(identifiers_url, Namespace::HgncSymbol,
                                  &doc.nomenclaturesymbol));
    }

    let mut alias_ids = vec![];
    if !doc.name.is_empty() {
        alias_ids.push(doc.name.clone());
    }
    alias_ids.extend(split_non_empty(&doc.otheraliases, ','));

    EntitySummary {
        data_source: Namespace::NcbiGene.name().into(),
        display_name: doc.description,
        local_id: doc.uid,
        description: doc.summary,
        aliases: split_non_empty(&doc.otherdesignations, '|'),
        alias_ids,
        xref_links,
    }
}

// Parse an NCBI esummary JSON response.  Summaries are returned in the
// order of the "uids" list; records with an "error" are skipped.
pub fn summaries_from_esummary(identifiers_url: &str, body: &str)
    -> Result<Vec<EntitySummary>>
{
    let response: NcbiESummaryResponse = serde_json::from_str(body)?;

    let Some(mut result) = response.result
    else {
        return Ok(vec![]);
    };

    let mut summaries = vec![];

    for uid in &result.uids {
        let Some(value) = result.docs.remove(uid)
        else {
            continue;
        };

        let doc: NcbiGeneDoc = serde_json::from_value(value)?;

        if let Some(ref err) = doc.error {
            tracing::warn!("no gene summary for {}: {}", uid, err);
            continue;
        }

        summaries.push(summary_from_doc(identifiers_url, doc));
    }

    Ok(summaries)
}

pub struct NcbiGeneClient {
    client: Client,
    esummary_url: String,
    identifiers_url: String,
}

impl NcbiGeneClient {
    pub fn new(config: &Config, client: Client) -> NcbiGeneClient {
        NcbiGeneClient {
            client,
            esummary_url: config.urls.ncbi_eutils_url.clone() + "/esummary.fcgi",
            identifiers_url: config.urls.identifiers_url.clone(),
        }
    }
}

#[async_trait]
impl SummaryService for NcbiGeneClient {
    async fn gene_summaries(&self, gene_ids: &[CanonicalId]) -> Result<Vec<EntitySummary>> {
        if gene_ids.is_empty() {
            return Ok(vec![]);
        }

        let ids = gene_ids.join(",");
        tracing::debug!("esummary request for: {}", ids);

        let params = [("db", "gene"), ("retmode", "json"), ("id", ids.as_str())];
        let body = self.client.post(&self.esummary_url)
            .form(&params)
            .send().await?
            .error_for_status()?
            .text().await?;

        summaries_from_esummary(&self.identifiers_url, &body)
    }

    fn xref_link(&self, namespace: Namespace, id: &str) -> XrefLink {
        xref_link(&self.identifiers_url, namespace, id)
    }
}


#[test]
fn test_summaries_from_esummary() {
    let body = r#"{
      "header": {"type": "esummary", "version": "0.3"},
      "result": {
        "uids": ["7157", "999999999"],
        "7157": {
          "uid": "7157",
          "name": "TP53",
          "description": "tumor protein p53",
          "summary": "This gene encodes a tumor suppressor protein.",
          "otheraliases": "BCC7, LFS1, P53",
          "otherdesignations": "cellular tumor antigen p53|mutant tumor protein 53",
          "nomenclaturesymbol": "TP53"
        },
        "999999999": {"uid": "999999999", "error": "cannot get document summary"}
      }
    }"#;

    let summaries = summaries_from_esummary("https://identifiers.org/", body).unwrap();
    assert_eq!(summaries.len(), 1);

    let summary = &summaries[0];
    assert_eq!(summary.local_id, "7157");
    assert_eq!(summary.display_name, "tumor protein p53");
    assert_eq!(summary.alias_ids, vec!["TP53", "BCC7", "LFS1", "P53"]);
    assert_eq!(summary.aliases.len(), 2);
    assert_eq!(summary.xref_links[0].uri, "https://identifiers.org/ncbigene:7157");
    assert_eq!(summary.xref_links[1],
               XrefLink {
                   namespace: "hgnc.symbol".into(),
                   uri: "https://identifiers.org/hgnc.symbol:TP53".into(),
               });
}
