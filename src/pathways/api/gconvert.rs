use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use indexmap::{IndexMap, IndexSet};
use reqwest::Client;

use crate::cache::RequestCache;
use crate::constants::{ENTREZ_PREFIX, GCONVERT_NOT_APPLICABLE};
use crate::errors::{Result, ServiceError};
use crate::types::{CanonicalId, NamespaceCode, NamespaceName, Token};
use crate::web::config::Config;

const INITIAL_ALIAS_INDEX: usize = 1;
const CONVERTED_ALIAS_INDEX: usize = 3;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Namespace {
    #[serde(rename = "hgnc")]
    Hgnc,
    #[serde(rename = "hgnc.symbol")]
    HgncSymbol,
    #[serde(rename = "uniprot")]
    Uniprot,
    #[serde(rename = "ncbigene")]
    NcbiGene,
    #[serde(rename = "ensembl")]
    Ensembl,
}

impl Namespace {
    pub fn name(&self) -> &'static str {
        match self {
            Namespace::Hgnc => "hgnc",
            Namespace::HgncSymbol => "hgnc.symbol",
            Namespace::Uniprot => "uniprot",
            Namespace::NcbiGene => "ncbigene",
            Namespace::Ensembl => "ensembl",
        }
    }
}

impl TryFrom<&str> for Namespace {
    type Error = ServiceError;

    fn try_from(name: &str) -> Result<Self> {
        match name.to_lowercase().as_str() {
            "hgnc" => Ok(Namespace::Hgnc),
            "hgnc.symbol" => Ok(Namespace::HgncSymbol),
            "uniprot" => Ok(Namespace::Uniprot),
            "ncbigene" => Ok(Namespace::NcbiGene),
            "ensembl" => Ok(Namespace::Ensembl),
            _ => Err(ServiceError::InvalidParameter(format!("Unrecognized targetDb: {}", name))),
        }
    }
}

// caller overrides for the conversion request
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct ConvertOptions {
    pub output: Option<String>,
    pub organism: Option<String>,
    pub prefix: Option<String>,
}

// the form POSTed to gconvert
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ConvertForm {
    pub output: String,
    pub organism: String,
    pub target: NamespaceCode,
    pub prefix: String,
    pub query: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct ResolutionResult {
    // token to converted alias, only for the first token seen for each
    // converted alias
    pub alias: IndexMap<Token, CanonicalId>,
    pub unrecognized: IndexSet<Token>,
    // converted alias to the tokens seen after the canonical one
    pub duplicate: IndexMap<CanonicalId, Vec<Token>>,
}

impl ResolutionResult {
    // every token that mapped to something, canonical ones first
    pub fn recognized_tokens(&self) -> Vec<&Token> {
        self.alias.keys()
            .chain(self.duplicate.values().flatten())
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.alias.is_empty() && self.duplicate.is_empty()
    }
}

#[async_trait]
pub trait ConversionService: Send + Sync {
    // send the form and return the raw tab-delimited response body
    async fn convert(&self, form: &ConvertForm) -> Result<String>;
}

pub struct GConvertClient {
    client: Client,
    url: String,
}

impl GConvertClient {
    pub fn new(config: &Config, client: Client) -> GConvertClient {
        GConvertClient {
            client,
            url: config.urls.gprofiler_url.clone() + "gconvert.cgi",
        }
    }
}

#[async_trait]
impl ConversionService for GConvertClient {
    async fn convert(&self, form: &ConvertForm) -> Result<String> {
        tracing::debug!("gconvert request: {} -> {}", form.query, form.target);

        let res = self.client.post(&self.url)
            .form(form)
            .send().await?
            .error_for_status()?;

        Ok(res.text().await?)
    }
}

// remove the database prefix that gconvert adds to numeric (Entrez)
// queries, eg. "ENTREZGENE_ACC:7157" -> "7157"
pub fn clean_up_entrez(alias: &str) -> String {
    if let Some(prefix) = alias.get(..ENTREZ_PREFIX.len())
        && prefix.eq_ignore_ascii_case(ENTREZ_PREFIX) {
            return alias[ENTREZ_PREFIX.len()..].to_owned();
        }

    alias.to_owned()
}

pub fn make_form(tokens: &[Token], target: Namespace, options: &ConvertOptions,
                 default_organism: &str,
                 namespace_codes: &BTreeMap<NamespaceName, NamespaceCode>)
    -> Result<ConvertForm>
{
    let query_tokens: Vec<&str> =
        tokens.iter()
        .map(|token| token.trim())
        .filter(|token| !token.is_empty())
        .collect();

    if query_tokens.is_empty() {
        return Err(ServiceError::InvalidParameter("Invalid query format".into()));
    }

    let Some(target_code) = namespace_codes.get(target.name())
    else {
        return Err(ServiceError::InvalidParameter(format!("Unrecognized targetDb: {}",
                                                          target.name())));
    };

    Ok(ConvertForm {
        output: options.output.clone().unwrap_or_else(|| "mini".into()),
        organism: options.organism.clone().unwrap_or_else(|| default_organism.into()),
        target: target_code.clone(),
        prefix: options.prefix.clone().unwrap_or_else(|| "ENTREZGENE_ACC".into()),
        query: query_tokens.join(" "),
    })
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Placement {
    Resolved,
    Duplicate,
    Unrecognized,
}

// Parse the gconvert "mini" output.  Columns are:
//   ignored, initial alias, ignored, converted alias, ...
// Queried tokens missing from the response are returned as unrecognized.
pub fn parse_gconvert_response(body: &str, queried_tokens: &[&str])
    -> Result<ResolutionResult>
{
    let mut result = ResolutionResult::default();
    let mut placements: HashMap<String, Placement> = HashMap::new();
    let mut canonical_tokens: HashMap<CanonicalId, Token> = HashMap::new();

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .delimiter(b'\t')
        .flexible(true)
        .quoting(false)
        .from_reader(body.as_bytes());

    for record in reader.records() {
        let record = record?;

        let (Some(initial_alias), Some(converted_alias)) =
            (record.get(INITIAL_ALIAS_INDEX), record.get(CONVERTED_ALIAS_INDEX))
        else {
            continue;
        };

        let initial_alias = clean_up_entrez(initial_alias.trim());
        let converted_alias = converted_alias.trim();

        if initial_alias.is_empty() || converted_alias.is_empty() {
            continue;
        }

        let upper_alias = initial_alias.to_uppercase();

        if converted_alias == GCONVERT_NOT_APPLICABLE {
            if !placements.contains_key(&upper_alias) {
                placements.insert(upper_alias, Placement::Unrecognized);
                result.unrecognized.insert(initial_alias);
            }
            continue;
        }

        match placements.get(&upper_alias) {
            Some(Placement::Resolved) | Some(Placement::Duplicate) => continue,
            Some(Placement::Unrecognized) => {
                result.unrecognized.retain(|token| token.to_uppercase() != upper_alias);
            },
            None => (),
        }

        if canonical_tokens.contains_key(converted_alias) {
            result.duplicate.entry(converted_alias.to_owned())
                .or_default()
                .push(initial_alias);
            placements.insert(upper_alias, Placement::Duplicate);
        } else {
            canonical_tokens.insert(converted_alias.to_owned(), initial_alias.clone());
            result.alias.insert(initial_alias, converted_alias.to_owned());
            placements.insert(upper_alias, Placement::Resolved);
        }
    }

    for token in queried_tokens {
        let upper_token = token.to_uppercase();
        if !placements.contains_key(&upper_token) {
            placements.insert(upper_token, Placement::Unrecognized);
            result.unrecognized.insert((*token).to_owned());
        }
    }

    Ok(result)
}

// Resolves tokens to identifiers in a target namespace using gconvert.
// Results are cached per request form.
pub struct IdentifierResolver {
    service: Arc<dyn ConversionService>,
    organism: String,
    namespace_codes: BTreeMap<NamespaceName, NamespaceCode>,
    cache: RequestCache<ResolutionResult>,
}

impl IdentifierResolver {
    pub fn new(config: &Config, service: Arc<dyn ConversionService>) -> IdentifierResolver {
        IdentifierResolver {
            service,
            organism: config.organism.clone(),
            namespace_codes: config.namespace_codes.clone(),
            cache: RequestCache::new("gconvert", config.cache_max_size),
        }
    }

    pub async fn resolve(&self, tokens: &[Token], target: Namespace,
                         options: &ConvertOptions)
        -> Result<ResolutionResult>
    {
        let form = make_form(tokens, target, options, &self.organism,
                             &self.namespace_codes)?;

        self.cache.fetch(&form, || self.convert(&form)).await
    }

    async fn convert(&self, form: &ConvertForm) -> Result<ResolutionResult> {
        let body = self.service.convert(form).await
            .inspect_err(|err| tracing::error!("Error in gconvert: {}", err))?;
        let queried_tokens: Vec<&str> = form.query.split_whitespace().collect();
        parse_gconvert_response(&body, &queried_tokens)
    }
}


#[test]
fn test_clean_up_entrez() {
    assert_eq!(clean_up_entrez("ENTREZGENE_ACC:7157"), "7157");
    assert_eq!(clean_up_entrez("entrezgene_acc:7157"), "7157");
    assert_eq!(clean_up_entrez("TP53"), "TP53");
    assert_eq!(clean_up_entrez("ENTREZ"), "ENTREZ");
}

#[test]
fn test_make_form() {
    let codes = crate::web::config::default_namespace_codes();
    let tokens = vec!["TP53".to_owned(), " ".to_owned(), "MDM2".to_owned()];
    let options = ConvertOptions {
        organism: Some("mmusculus".into()),
        ..ConvertOptions::default()
    };

    let form = make_form(&tokens, Namespace::Uniprot, &options, "hsapiens", &codes).unwrap();
    assert_eq!(form.query, "TP53 MDM2");
    assert_eq!(form.target, "UNIPROTSWISSPROT");
    assert_eq!(form.organism, "mmusculus");
    assert_eq!(form.output, "mini");
    assert_eq!(form.prefix, "ENTREZGENE_ACC");

    let err = make_form(&[], Namespace::Uniprot, &options, "hsapiens", &codes).unwrap_err();
    assert!(matches!(err, ServiceError::InvalidParameter(_)));

    let mut codes_without_ensembl = codes.clone();
    codes_without_ensembl.remove("ensembl");
    let err = make_form(&tokens, Namespace::Ensembl, &options, "hsapiens",
                        &codes_without_ensembl).unwrap_err();
    assert_eq!(err, ServiceError::InvalidParameter("Unrecognized targetDb: ensembl".into()));
}

#[test]
fn test_namespace_names() {
    assert_eq!(Namespace::try_from("NCBIGENE").unwrap(), Namespace::NcbiGene);
    assert_eq!(Namespace::try_from("hgnc.symbol").unwrap().name(), "hgnc.symbol");
    assert!(Namespace::try_from("chebi").is_err());
}

#[test]
fn test_parse_duplicates() {
    let body = "1\tA\t1\tX\tdesc\n2\tB\t1\tX\tdesc\n";
    let result = parse_gconvert_response(body, &["A", "B"]).unwrap();

    assert_eq!(result.alias.len(), 1);
    assert_eq!(result.alias["A"], "X");
    assert_eq!(result.duplicate["X"], vec!["B".to_owned()]);
    assert!(result.unrecognized.is_empty());
}

#[test]
fn test_parse_unrecognized_and_missing() {
    let body = "1\tTP53\t1\tHGNC:11998\tTP53\n\
                2\tFOO\t1\tN/A\tN/A\n\
                3\tENTREZGENE_ACC:4193\t1\tHGNC:6973\tMDM2\n\
                \n";
    let result = parse_gconvert_response(body, &["tp53", "foo", "4193", "bar"]).unwrap();

    assert_eq!(result.alias.get("TP53").map(String::as_str), Some("HGNC:11998"));
    assert_eq!(result.alias.get("4193").map(String::as_str), Some("HGNC:6973"));
    let unrecognized: Vec<&str> = result.unrecognized.iter().map(String::as_str).collect();
    assert_eq!(unrecognized, vec!["FOO", "bar"]);
    assert!(result.duplicate.is_empty());
}

#[test]
fn test_parse_repeated_token() {
    // a token that maps to two converted aliases keeps the first one
    let body = "1\tABC1\t1\tX1\n1\tABC1\t1\tX2\n";
    let result = parse_gconvert_response(body, &["ABC1"]).unwrap();
    assert_eq!(result.alias.len(), 1);
    assert_eq!(result.alias["ABC1"], "X1");
    assert!(result.duplicate.is_empty());
}
