pub const DEFAULT_CACHE_MAX_SIZE: u64 = 1000;

// the number of nodes kept in an interaction network
pub const DEFAULT_MAX_SIF_NODES: usize = 50;

// starting degree of nodes the user asked for, so that they always rank
// first when the network is pruned
pub const QUERIED_NODE_DEGREE: u64 = (1 << 53) - 1;

// the conversion service's "not applicable" marker
pub const GCONVERT_NOT_APPLICABLE: &str = "N/A";

pub const ENTREZ_PREFIX: &str = "ENTREZGENE_ACC:";

// mediators from this source aren't Pathway Commons ids
pub const EXTERNAL_MEDIATOR_MARKER: &str = "REACTOME";

pub const QUERY_MAX_CHARS: usize = 5000;
pub const QUERY_MAX_TOKENS: usize = 100;
pub const RAW_SEARCH_MAX_CHARS: usize = 250;

pub const DEFAULT_MIN_PATHWAY_SIZE: u32 = 0;
pub const DEFAULT_MAX_PATHWAY_SIZE: u32 = 250;

pub const DEFAULT_SEARCH_TYPE: &str = "pathway";

pub const PC_USER: &str = "app-ui";

pub const SIF_PATTERNS: &[&str; 6] =
    &["CONTROLS_STATE_CHANGE_OF", "CONTROLS_PHOSPHORYLATION_OF",
      "CONTROLS_TRANSPORT_OF", "CONTROLS_EXPRESSION_OF",
      "CATALYSIS_PRECEDES", "INTERACTS_WITH"];
