use std::{process, sync::Arc};

use axum::{
    extract::{Query, Request, State}, http::StatusCode, response::{IntoResponse, Response},
    routing::get, Json, Router, ServiceExt
};
use getopts::Options;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use tower::layer::Layer;
use tower_http::normalize_path::NormalizePathLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use pathways::api::app_search::AppSearch;
use pathways::api::entity_summary::NcbiGeneClient;
use pathways::api::gconvert::{ConvertOptions, GConvertClient, IdentifierResolver, Namespace};
use pathways::api::gene_search::GeneSearch;
use pathways::api::pathway_commons::{PathwayCommons, PcClient};
use pathways::api::search::{PathwaySearch, SearchQuery};
use pathways::api::search_utils::unique_query_tokens;
use pathways::bio::interaction_network::InteractionNetwork;
use pathways::bio::interactions::CytoscapeNetwork;
use pathways::errors::ServiceError;
use pathways::web::config::Config;

const PKG_NAME: &str = env!("CARGO_PKG_NAME");
const VERSION: &str = env!("CARGO_PKG_VERSION");

struct AllState {
    app_search: AppSearch,
    interaction_network: InteractionNetwork,
    resolver: Arc<IdentifierResolver>,
    pc: Arc<dyn PathwayCommons>,
}

#[derive(Deserialize, Debug)]
struct SearchParams {
    q: String,
    #[serde(rename = "type")]
    biopax_type: Option<String>,
    gt: Option<u32>,
    lt: Option<u32>,
    // comma separated
    datasource: Option<String>,
}

impl From<SearchParams> for SearchQuery {
    fn from(params: SearchParams) -> Self {
        let mut query = SearchQuery::new(&params.q);
        if let Some(biopax_type) = params.biopax_type {
            query.biopax_type = biopax_type;
        }
        query.gt = params.gt;
        query.lt = params.lt;
        query.datasource = split_list(params.datasource.as_deref());
        query
    }
}

#[derive(Deserialize, Debug)]
struct InteractionsParams {
    // comma separated gene ids
    source: String,
}

#[derive(Deserialize, Debug)]
struct ResolveParams {
    q: String,
    target: Option<String>,
    organism: Option<String>,
}

fn split_list(list: Option<&str>) -> Vec<String> {
    list.unwrap_or("")
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

fn error_response(err: ServiceError) -> Response {
    let status = match err {
        ServiceError::InvalidParameter(_) => StatusCode::BAD_REQUEST,
        ServiceError::Transport(_) => StatusCode::BAD_GATEWAY,
    };

    (status, Json(json!({ "status": "error", "reason": err.to_string() }))).into_response()
}

async fn search(Query(params): Query<SearchParams>, State(all_state): State<Arc<AllState>>)
    -> impl IntoResponse
{
    Json(all_state.app_search.search(&params.into()).await)
}

async fn search_pathways(Query(params): Query<SearchParams>,
                         State(all_state): State<Arc<AllState>>)
    -> impl IntoResponse
{
    Json(all_state.app_search.search_pathways(&params.into()).await)
}

async fn search_genes(Query(params): Query<SearchParams>,
                      State(all_state): State<Arc<AllState>>)
    -> impl IntoResponse
{
    Json(all_state.app_search.search_genes(&params.q).await)
}

async fn interactions(Query(params): Query<InteractionsParams>,
                      State(all_state): State<Arc<AllState>>)
    -> Response
{
    let sources = split_list(Some(&params.source));

    match all_state.interaction_network.get(&sources).await {
        Ok(graph) => {
            Json(json!({ "network": CytoscapeNetwork::from(&graph) })).into_response()
        },
        Err(err) => {
            tracing::error!("interactions for {:?} failed: {}", sources, err);
            error_response(err)
        },
    }
}

async fn resolve(Query(params): Query<ResolveParams>,
                 State(all_state): State<Arc<AllState>>)
    -> Response
{
    let target =
        match Namespace::try_from(params.target.as_deref().unwrap_or("hgnc")) {
            Ok(target) => target,
            Err(err) => return error_response(err),
        };
    let options = ConvertOptions {
        organism: params.organism,
        ..ConvertOptions::default()
    };
    let tokens = unique_query_tokens(&params.q);

    match all_state.resolver.resolve(&tokens, target, &options).await {
        Ok(result) => Json(result).into_response(),
        Err(err) => error_response(err),
    }
}

async fn datasources(State(all_state): State<Arc<AllState>>) -> Response {
    match all_state.pc.datasources().await {
        Ok(datasources) => Json(datasources).into_response(),
        Err(err) => error_response(err),
    }
}

async fn ping() -> String {
    String::from("OK") + " " + PKG_NAME + " " + VERSION
}

async fn not_found() -> Json<Value> {
    json!({
        "status": "error",
        "reason": "Resource was not found."
    }).into()
}

fn print_usage(program: &str, opts: Options) {
    let brief = format!("Usage: {} [options]", program);
    print!("{}", opts.usage(&brief));
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    println!("{} v{}", PKG_NAME, VERSION);

    let args: Vec<String> = std::env::args().collect();
    let mut opts = Options::new();

    opts.optflag("h", "help", "print this help message");
    opts.optopt("c", "config-file", "Configuration file name", "CONFIG");
    opts.optopt("b", "bind-address-and-port", "The address:port to bind to", "BIND_ADDRESS_AND_PORT");

    let matches = opts.parse(&args[1..])?;

    let program = args[0].clone();

    if matches.opt_present("help") {
        print_usage(&program, opts);
        process::exit(0);
    }

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .or_else(|_| EnvFilter::try_new("pathways_search=info,pathways=info,tower_http=warn"))?,
        )
        .init();

    let config =
        if let Some(config_file_name) = matches.opt_str("config-file") {
            Config::read(&config_file_name)?
        } else {
            tracing::warn!("no -c|--config-file option, using default configuration");
            Config::default()
        };

    let bind_address_and_port =
        matches.opt_str("bind-address-and-port")
        .unwrap_or_else(|| config.server.bind_address_and_port.clone());
    let listener = tokio::net::TcpListener::bind(&bind_address_and_port).await?;

    let client = Client::new();

    let pc: Arc<dyn PathwayCommons> = Arc::new(PcClient::new(&config, client.clone()));
    let gconvert = Arc::new(GConvertClient::new(&config, client.clone()));
    let resolver = Arc::new(IdentifierResolver::new(&config, gconvert));
    let summary_service = Arc::new(NcbiGeneClient::new(&config, client));

    let gene_search = GeneSearch::new(resolver.clone(), summary_service);
    let pathway_search = PathwaySearch::new(&config, resolver.clone(), pc.clone());

    let all_state = AllState {
        app_search: AppSearch::new(gene_search, pathway_search),
        interaction_network: InteractionNetwork::new(&config, pc.clone()),
        resolver,
        pc,
    };

    tracing::info!("Starting server on {} ...", bind_address_and_port);

    let app = Router::new()
        .route("/api/search", get(search))
        .route("/api/search/pathways", get(search_pathways))
        .route("/api/search/genes", get(search_genes))
        .route("/api/interactions", get(interactions))
        .route("/api/resolve", get(resolve))
        .route("/api/datasources", get(datasources))
        .route("/ping", get(ping))
        .fallback(not_found)
        .with_state(Arc::new(all_state))
        .layer(TraceLayer::new_for_http());

    let app = NormalizePathLayer::trim_trailing_slash().layer(app);

    axum::serve(listener, ServiceExt::<Request>::into_make_service(app)).await?;

    Ok(())
}
