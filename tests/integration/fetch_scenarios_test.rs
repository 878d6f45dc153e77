// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::helpers::{fast_http_chain, governor_over};
use harvestrs::extract::{self, RuleRegistry};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn article_page(title: &str) -> String {
    format!(
        r#"<html><head>
            <meta itemprop="headline" content="{title}">
            <meta itemprop="datePublished" content="2024-03-01">
        </head><body><div itemprop="text">Body of {title}.</div></body></html>"#
    )
}

/// 三URL混合场景：A立即成功，B瞬时失败三次后成功，C持续失败。
/// 期望：A与B各产出一条完整记录，C只留下失败结果，批次不中止。
#[tokio::test]
async fn test_mixed_batch_produces_records_for_recoverable_urls_only() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/a"))
        .respond_with(ResponseTemplate::new(200).set_body_string(article_page("Steady")))
        .mount(&server)
        .await;

    // B: three transient errors, then success
    Mock::given(method("GET"))
        .and(path("/b"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(3)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/b"))
        .respond_with(ResponseTemplate::new(200).set_body_string(article_page("Recovered")))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/c"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let chain = fast_http_chain(5);
    let governor = governor_over(chain, 3);

    let urls = vec![
        format!("{}/a", server.uri()),
        format!("{}/b", server.uri()),
        format!("{}/c", server.uri()),
    ];
    let outcomes = governor.submit(urls.clone()).await;

    // 每个提交的URL恰好一个结果
    assert_eq!(outcomes.len(), 3);

    let registry = RuleRegistry::default();
    let records: Vec<_> = outcomes
        .iter()
        .filter(|o| o.succeeded)
        .map(|o| {
            extract::extract(
                &o.url,
                o.markup.as_deref().unwrap(),
                registry.default_rules(),
            )
        })
        .collect();

    assert_eq!(records.len(), 2);

    let by_url = |suffix: &str| {
        records
            .iter()
            .find(|r| r.url.ends_with(suffix))
            .unwrap_or_else(|| panic!("missing record for {suffix}"))
    };
    assert_eq!(by_url("/a").field("title").unwrap().as_text(), Some("Steady"));
    // B的记录反映的是最终成功的响应内容
    assert_eq!(
        by_url("/b").field("title").unwrap().as_text(),
        Some("Recovered")
    );

    let failed = outcomes.iter().find(|o| o.url.ends_with("/c")).unwrap();
    assert!(!failed.succeeded);
    assert!(failed.markup.is_none());
}

/// 空响应体按失败处理，重试后有内容则成功
#[tokio::test]
async fn test_empty_body_is_retried_until_content_appears() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(200).set_body_string(""))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(200).set_body_string(article_page("Filled")))
        .mount(&server)
        .await;

    let chain = fast_http_chain(3);
    let governor = governor_over(chain, 1);

    let outcomes = governor.submit(vec![format!("{}/flaky", server.uri())]).await;
    assert_eq!(outcomes.len(), 1);
    assert!(outcomes[0].succeeded);
    assert!(outcomes[0].markup.as_deref().unwrap().contains("Filled"));
}

/// 大批量提交下结果数与提交数一致，且并发不超过准入上限
#[tokio::test]
async fn test_outcome_count_matches_submission_count() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string(article_page("Bulk")))
        .mount(&server)
        .await;

    let chain = fast_http_chain(2);
    let governor = governor_over(chain.clone(), 4);

    let urls: Vec<String> = (0..12).map(|i| format!("{}/doc/{i}", server.uri())).collect();
    let outcomes = governor.submit(urls).await;

    assert_eq!(outcomes.len(), 12);
    assert!(outcomes.iter().all(|o| o.succeeded));

    let stats = chain.tier_stats();
    let http = stats.get("http").expect("http tier stats present");
    assert_eq!(http.successes, 12);
}
