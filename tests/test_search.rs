mod util;

use std::sync::Arc;

use pathways::api::search::{PathwaySearch, SearchQuery};
use pathways::errors::ServiceError;
use pathways::web::config::Config;

use util::{FakeGConvert, FakePc, make_hit, make_resolver, make_response};

fn make_search(gconvert: Arc<FakeGConvert>, pc: Arc<FakePc>) -> PathwaySearch {
    PathwaySearch::new(&Config::default(), make_resolver(gconvert), pc)
}

fn tp53_gconvert() -> Arc<FakeGConvert> {
    Arc::new(FakeGConvert::new().with_alias("HGNC_ACC", "TP53", "HGNC:11998"))
}

fn hit_uris(hits: &[pathways::api::pathway_commons::SearchHit]) -> Vec<&str> {
    hits.iter().map(|hit| hit.uri.as_str()).collect()
}

#[tokio::test]
async fn test_cascade_stops_at_first_result() {
    let pc = Arc::new(FakePc::new()
                      .with_search_response(Ok(make_response(vec![make_hit("too_big", Some(300))])))
                      .with_search_response(Ok(make_response(vec![make_hit("p53_pathway", Some(40)),
                                                                  make_hit("huge", Some(1000))])))
                      .with_search_response(Ok(make_response(vec![make_hit("never", Some(10))]))));
    let search = make_search(tp53_gconvert(), pc.clone());

    let hits = search.search(&SearchQuery::new("TP53")).await.unwrap();
    assert_eq!(hit_uris(&hits), vec!["p53_pathway"]);

    let issued = pc.issued_queries();
    assert_eq!(issued, vec!["(name:TP53) OR (name:*TP53*) OR (xrefid:TP53)",
                            "(xrefid:TP53)"]);
}

#[tokio::test]
async fn test_cascade_with_no_results() {
    let pc = Arc::new(FakePc::new());
    let search = make_search(tp53_gconvert(), pc.clone());

    let hits = search.search(&SearchQuery::new(" TP53  apoptosis ")).await.unwrap();
    assert!(hits.is_empty());

    let issued = pc.issued_queries();
    assert_eq!(issued.len(), 3);
    assert_eq!(issued[0],
               r"(name:TP53\ \ apoptosis) OR (name:*TP53\ \ apoptosis*) OR (xrefid:TP53 AND name:*APOPTOSIS*)");
    assert_eq!(issued[1], "(xrefid:TP53 OR name:*APOPTOSIS*)");
    assert_eq!(issued[2], "TP53  apoptosis");
}

#[tokio::test]
async fn test_size_bounds() {
    let response = make_response(vec![make_hit("small", Some(3)), make_hit("medium", Some(10)),
                                      make_hit("edge", Some(20)), make_hit("unknown", None)]);
    let pc = Arc::new(FakePc::new().with_search_response(Ok(response)));
    let search = make_search(tp53_gconvert(), pc.clone());

    let query = SearchQuery {
        gt: Some(5),
        lt: Some(20),
        ..SearchQuery::new("TP53")
    };
    let hits = search.search(&query).await.unwrap();
    assert_eq!(hit_uris(&hits), vec!["medium"]);
    assert_eq!(pc.issued_queries().len(), 1);
}

#[tokio::test]
async fn test_failed_candidate_is_skipped() {
    let pc = Arc::new(FakePc::new()
                      .with_search_response(Err(ServiceError::Transport("timed out".into())))
                      .with_search_response(Ok(make_response(vec![make_hit("found", Some(12))]))));
    let search = make_search(tp53_gconvert(), pc.clone());

    let hits = search.search(&SearchQuery::new("TP53")).await.unwrap();
    assert_eq!(hit_uris(&hits), vec!["found"]);
    assert_eq!(pc.issued_queries().len(), 2);
}

#[tokio::test]
async fn test_resolver_failure() {
    let gconvert = Arc::new(FakeGConvert::new().with_failures(1));
    let pc = Arc::new(FakePc::new());
    let search = make_search(gconvert, pc.clone());

    let err = search.search(&SearchQuery::new("TP53")).await.unwrap_err();
    assert!(matches!(err, ServiceError::Transport(_)));
    assert!(pc.issued_queries().is_empty());
}

#[tokio::test]
async fn test_empty_query() {
    let gconvert = tp53_gconvert();
    let pc = Arc::new(FakePc::new());
    let search = make_search(gconvert.clone(), pc.clone());

    let hits = search.search(&SearchQuery::new("   ")).await.unwrap();
    assert!(hits.is_empty());
    assert_eq!(gconvert.call_count(), 0);
    assert!(pc.issued_queries().is_empty());
}

#[tokio::test]
async fn test_search_results_are_cached() {
    let gconvert = tp53_gconvert();
    let pc = Arc::new(FakePc::new()
                      .with_search_response(Ok(make_response(vec![make_hit("p53", Some(12))]))));
    let search = make_search(gconvert.clone(), pc.clone());

    let first = search.search(&SearchQuery::new("TP53")).await.unwrap();
    let second = search.search(&SearchQuery::new("TP53")).await.unwrap();
    assert_eq!(first, second);
    assert_eq!(pc.issued_queries().len(), 1);
    assert_eq!(gconvert.call_count(), 1);

    // different bounds are a different search, the resolution is reused
    let bounded = SearchQuery {
        lt: Some(10),
        ..SearchQuery::new("TP53")
    };
    let hits = search.search(&bounded).await.unwrap();
    assert!(hits.is_empty());
    assert_eq!(pc.issued_queries().len(), 4);
    assert_eq!(gconvert.call_count(), 1);
}

#[tokio::test]
async fn test_outage_is_not_cached() {
    let outage = || Err(ServiceError::Transport("service unavailable".into()));
    let pc = Arc::new(FakePc::new()
                      .with_search_response(outage())
                      .with_search_response(outage())
                      .with_search_response(outage())
                      .with_search_response(Ok(make_response(vec![make_hit("p53", Some(12))]))));
    let search = make_search(tp53_gconvert(), pc.clone());

    let err = search.search(&SearchQuery::new("TP53")).await.unwrap_err();
    assert!(matches!(err, ServiceError::Transport(_)));
    assert_eq!(pc.issued_queries().len(), 3);

    // the service is back
    let hits = search.search(&SearchQuery::new("TP53")).await.unwrap();
    assert_eq!(hit_uris(&hits), vec!["p53"]);
    assert_eq!(pc.issued_queries().len(), 4);
}

#[tokio::test]
async fn test_partial_failure_with_no_hits_is_empty() {
    let pc = Arc::new(FakePc::new()
                      .with_search_response(Err(ServiceError::Transport("timed out".into()))));
    let search = make_search(tp53_gconvert(), pc.clone());

    let hits = search.search(&SearchQuery::new("TP53")).await.unwrap();
    assert!(hits.is_empty());
    assert_eq!(pc.issued_queries().len(), 3);
}
