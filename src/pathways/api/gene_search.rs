use std::collections::HashMap;
use std::sync::Arc;

use indexmap::IndexMap;
use itertools::Itertools;

use crate::api::entity_summary::{EntitySummary, SummaryService};
use crate::api::gconvert::{ConvertOptions, IdentifierResolver, Namespace};
use crate::errors::Result;
use crate::types::{CanonicalId, Token};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GeneInfo {
    // the token as the user typed it
    pub query: Token,
    // NCBI Gene id
    pub canonical_id: CanonicalId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gene_symbol: Option<String>,
    pub summary: EntitySummary,
}

// the HGNC symbol from the last part of a summary's hgnc.symbol link
pub fn hgnc_symbol_from_xrefs(summary: &EntitySummary) -> Option<String> {
    let xref_link = summary.xref_links.iter()
        .find(|link| link.namespace == Namespace::HgncSymbol.name())?;

    xref_link.uri.rsplit(['/', ':'])
        .find(|part| !part.is_empty())
        .map(String::from)
}

// Add a UniProt link to the summary of each gene whose token also
// resolved to a UniProt accession
fn fill_in_xrefs(summaries: &mut [EntitySummary],
                 ncbi_alias: &IndexMap<Token, CanonicalId>,
                 uniprot_alias: &IndexMap<Token, CanonicalId>,
                 summary_service: &dyn SummaryService) {
    let ncbi_by_upper_token: HashMap<String, &CanonicalId> =
        ncbi_alias.iter()
        .map(|(token, ncbi_id)| (token.to_uppercase(), ncbi_id))
        .collect();

    for (token, uniprot_accession) in uniprot_alias {
        let Some(ncbi_id) = ncbi_by_upper_token.get(&token.to_uppercase())
        else {
            continue;
        };

        if let Some(summary) = summaries.iter_mut().find(|s| &s.local_id == *ncbi_id) {
            let xref = summary_service.xref_link(Namespace::Uniprot, uniprot_accession);
            summary.xref_links.push(xref);
        }
    }
}

// Combines NCBI Gene and UniProt resolution of query tokens with NCBI
// gene summaries
pub struct GeneSearch {
    resolver: Arc<IdentifierResolver>,
    summary_service: Arc<dyn SummaryService>,
}

impl GeneSearch {
    pub fn new(resolver: Arc<IdentifierResolver>, summary_service: Arc<dyn SummaryService>)
        -> GeneSearch
    {
        GeneSearch {
            resolver,
            summary_service,
        }
    }

    // One GeneInfo per token that resolved to an NCBI Gene id, in
    // resolution order.  Tokens that don't resolve are left out.
    pub async fn aggregate(&self, tokens: &[Token]) -> Result<Vec<GeneInfo>> {
        let unique_tokens: Vec<Token> =
            tokens.iter()
            .filter(|token| !token.trim().is_empty())
            .unique()
            .cloned()
            .collect();

        if unique_tokens.is_empty() {
            return Ok(vec![]);
        }

        let options = ConvertOptions::default();

        let (ncbi_result, uniprot_result) =
            tokio::try_join!(
                self.resolver.resolve(&unique_tokens, Namespace::NcbiGene, &options),
                self.resolver.resolve(&unique_tokens, Namespace::Uniprot, &options)
            )?;

        let ncbi_alias = ncbi_result.alias;

        let ncbi_ids: Vec<CanonicalId> = ncbi_alias.values().cloned().collect();
        let mut summaries = self.summary_service.gene_summaries(&ncbi_ids).await?;

        fill_in_xrefs(&mut summaries, &ncbi_alias, &uniprot_result.alias,
                      self.summary_service.as_ref());

        let mut gene_info = vec![];

        for (alias_token, ncbi_id) in ncbi_alias {
            let upper_alias = alias_token.to_uppercase();
            let query =
                unique_tokens.iter()
                .find(|token| token.to_uppercase() == upper_alias)
                .cloned()
                .unwrap_or(alias_token);

            let Some(summary) = summaries.iter().find(|s| s.local_id == ncbi_id)
            else {
                tracing::warn!("no summary returned for gene {} ({})", query, ncbi_id);
                continue;
            };

            gene_info.push(GeneInfo {
                query,
                canonical_id: ncbi_id,
                gene_symbol: hgnc_symbol_from_xrefs(summary),
                summary: summary.clone(),
            });
        }

        Ok(gene_info)
    }
}


#[test]
fn test_hgnc_symbol_from_xrefs() {
    use crate::api::entity_summary::{XrefLink, xref_link};

    let mut summary = EntitySummary {
        data_source: "ncbigene".into(),
        display_name: "tumor protein p53".into(),
        local_id: "7157".into(),
        description: "".into(),
        aliases: vec![],
        alias_ids: vec![],
        xref_links: vec![xref_link("https://identifiers.org", Namespace::NcbiGene, "7157")],
    };
    assert_eq!(hgnc_symbol_from_xrefs(&summary), None);

    summary.xref_links.push(xref_link("https://identifiers.org", Namespace::HgncSymbol, "TP53"));
    assert_eq!(hgnc_symbol_from_xrefs(&summary), Some("TP53".to_owned()));

    summary.xref_links[1] = XrefLink {
        namespace: "hgnc.symbol".into(),
        uri: "http://identifiers.org/hgnc.symbol/MDM2/".into(),
    };
    assert_eq!(hgnc_symbol_from_xrefs(&summary), Some("MDM2".to_owned()));
}
