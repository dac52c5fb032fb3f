pub mod search_utils;
pub mod gconvert;
pub mod entity_summary;
pub mod pathway_commons;
pub mod search;
pub mod gene_search;
pub mod app_search;
