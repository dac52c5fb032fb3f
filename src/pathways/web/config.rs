use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufReader;

use anyhow::{Context, Result};

use crate::constants::{DEFAULT_CACHE_MAX_SIZE, DEFAULT_MAX_SIF_NODES};
use crate::types::{NamespaceCode, NamespaceName};

// base URLs of the remote services
#[derive(Deserialize, Serialize, Clone, Debug)]
#[serde(default)]
pub struct ServiceUrls {
    // g:Profiler, used for gconvert
    pub gprofiler_url: String,
    // Pathway Commons web service, with a trailing slash
    pub pc_url: String,
    // NCBI E-utilities for gene summaries
    pub ncbi_eutils_url: String,
    // resolver used to make external reference links
    pub identifiers_url: String,
}

impl Default for ServiceUrls {
    fn default() -> Self {
        ServiceUrls {
            gprofiler_url: "https://biit.cs.ut.ee/gprofiler_archive3/r1741_e90_eg37/web/".into(),
            pc_url: "https://www.pathwaycommons.org/".into(),
            ncbi_eutils_url: "https://eutils.ncbi.nlm.nih.gov/entrez/eutils".into(),
            identifiers_url: "https://identifiers.org".into(),
        }
    }
}

#[derive(Deserialize, Serialize, Clone, Debug)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_address_and_port: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            bind_address_and_port: "0.0.0.0:3000".into(),
        }
    }
}

#[derive(Deserialize, Serialize, Clone, Debug)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub urls: ServiceUrls,
    // maximum entries in each request cache
    pub cache_max_size: u64,
    // maximum nodes in an interaction network after degree filtering
    pub max_sif_nodes: usize,
    pub organism: String,
    // namespace name (eg. "hgnc.symbol") to the conversion service's
    // target code (eg. "HGNC")
    pub namespace_codes: BTreeMap<NamespaceName, NamespaceCode>,
}

pub fn default_namespace_codes() -> BTreeMap<NamespaceName, NamespaceCode> {
    // "hgnc" has been sent upstream as both HGNC_ACC and HGNC; HGNC_ACC
    // is the default here and can be overridden in the config file
    [("hgnc", "HGNC_ACC"),
     ("hgnc.symbol", "HGNC"),
     ("uniprot", "UNIPROTSWISSPROT"),
     ("ncbigene", "ENTREZGENE_ACC"),
     ("ensembl", "ENSG")]
        .iter()
        .map(|(name, code)| (name.to_string(), code.to_string()))
        .collect()
}

impl Default for Config {
    fn default() -> Self {
        Config {
            server: ServerConfig::default(),
            urls: ServiceUrls::default(),
            cache_max_size: DEFAULT_CACHE_MAX_SIZE,
            max_sif_nodes: DEFAULT_MAX_SIF_NODES,
            organism: "hsapiens".into(),
            namespace_codes: default_namespace_codes(),
        }
    }
}

impl Config {
    pub fn read(config_file_name: &str) -> Result<Config> {
        let file = File::open(config_file_name)
            .with_context(|| format!("Failed to read {}", config_file_name))?;
        let reader = BufReader::new(file);

        let config: Config = serde_json::from_reader(reader)
            .with_context(|| format!("failed to parse {}", config_file_name))?;

        Ok(config)
    }
}


#[test]
fn test_partial_config() {
    let config: Config =
        serde_json::from_str(r#"{"max_sif_nodes": 20, "namespace_codes": {"hgnc": "HGNC"}}"#)
        .unwrap();

    assert_eq!(config.max_sif_nodes, 20);
    assert_eq!(config.cache_max_size, DEFAULT_CACHE_MAX_SIZE);
    assert_eq!(config.namespace_codes.get("hgnc").map(String::as_str), Some("HGNC"));
    // a namespace table in the file replaces the defaults
    assert_eq!(config.namespace_codes.get("uniprot").map(String::as_str), None);
    assert_eq!(config.urls.pc_url, "https://www.pathwaycommons.org/");
}

#[test]
fn test_default_namespace_codes() {
    let config = Config::default();
    assert_eq!(config.namespace_codes.get("hgnc").map(String::as_str), Some("HGNC_ACC"));
    assert_eq!(config.namespace_codes.get("hgnc.symbol").map(String::as_str), Some("HGNC"));
    assert_eq!(config.namespace_codes.get("ncbigene").map(String::as_str), Some("ENTREZGENE_ACC"));
    assert_eq!(config.namespace_codes.get("chebi").map(String::as_str), None);
}
