// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::helpers::{fast_http_chain, governor_over};
use chrono::NaiveDate;
use harvestrs::archive::walker::{ArchiveWalker, DateWindow};
use harvestrs::config::settings::ArchiveSettings;
use harvestrs::extract::rulesets;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn listing_page(entries: &[(&str, &str, &str)], max_page: Option<u32>) -> String {
    let anchors: String = entries
        .iter()
        .map(|(href, headline, date)| {
            format!(r#"<a href="{href}"><h3>{headline}</h3><div class="date">{date}</div></a>"#)
        })
        .collect();
    let pagination = match max_page {
        Some(max) => {
            let links: String = (1..=max)
                .map(|p| format!(r#"<li><a href="?page={p}">{p}</a></li>"#))
                .collect();
            format!(r#"<ul class="pagination">{links}<li><a href="?page=2">...</a></li></ul>"#)
        }
        None => String::new(),
    };
    format!("<html><body>{anchors}{pagination}</body></html>")
}

fn fast_archive_settings() -> ArchiveSettings {
    ArchiveSettings {
        max_pages_fallback: 30,
        pause_every_pages: 25,
        pause_min_secs: 0.01,
        pause_max_secs: 0.02,
    }
}

/// 首页分页控件决定遍历范围；所有页的列表条目展开为单条目记录
#[tokio::test]
async fn test_walk_expands_every_discovered_page() {
    let server = MockServer::start().await;
    let root = format!("{}/archive/202401", server.uri());

    Mock::given(method("GET"))
        .and(path("/archive/202401"))
        .and(query_param("page", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_string(listing_page(
            &[("/news/one", "One", "Jan 5, 2024")],
            Some(3),
        )))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/archive/202401"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_string(listing_page(
            &[("/news/two", "Two", "Jan 12, 2024")],
            None,
        )))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/archive/202401"))
        .and(query_param("page", "3"))
        .respond_with(ResponseTemplate::new(200).set_body_string(listing_page(
            &[("/news/three", "Three", "Jan 20, 2024")],
            None,
        )))
        .mount(&server)
        .await;

    let governor = governor_over(fast_http_chain(2), 2);
    let walker = ArchiveWalker::new(governor, fast_archive_settings());

    let records = walker
        .walk(&[root.clone()], &rulesets::archive_listing(), None)
        .await;

    assert_eq!(records.len(), 3);
    let mut headlines: Vec<&str> = records
        .iter()
        .filter_map(|r| r.field("headline").and_then(|f| f.as_text()))
        .collect();
    headlines.sort_unstable();
    assert_eq!(headlines, vec!["One", "Three", "Two"]);
    // 相对链接基于根URL补全
    assert!(records.iter().any(|r| r.url == format!("{}/news/one", server.uri())));
}

/// 无分页控件的归档按单页处理
#[tokio::test]
async fn test_walk_without_pagination_control_stays_on_page_one() {
    let server = MockServer::start().await;
    let root = format!("{}/archive/202402", server.uri());

    Mock::given(method("GET"))
        .and(path("/archive/202402"))
        .and(query_param("page", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_string(listing_page(
            &[("/news/solo", "Solo", "Feb 2, 2024")],
            None,
        )))
        .expect(1)
        .mount(&server)
        .await;

    let governor = governor_over(fast_http_chain(2), 2);
    let walker = ArchiveWalker::new(governor, fast_archive_settings());

    let records = walker
        .walk(&[root], &rulesets::archive_listing(), None)
        .await;

    assert_eq!(records.len(), 1);
    assert_eq!(
        records[0].field("headline").and_then(|f| f.as_text()),
        Some("Solo")
    );
}

/// 首页探测失败时放弃该根而不是中止整个遍历
#[tokio::test]
async fn test_failed_probe_skips_root_but_walk_continues() {
    let server = MockServer::start().await;
    let dead_root = format!("{}/archive/dead", server.uri());
    let live_root = format!("{}/archive/live", server.uri());

    Mock::given(method("GET"))
        .and(path("/archive/dead"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/archive/live"))
        .and(query_param("page", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_string(listing_page(
            &[("/news/alive", "Alive", "Mar 3, 2024")],
            None,
        )))
        .mount(&server)
        .await;

    let governor = governor_over(fast_http_chain(2), 2);
    let walker = ArchiveWalker::new(governor, fast_archive_settings());

    let records = walker
        .walk(&[dead_root, live_root], &rulesets::archive_listing(), None)
        .await;

    assert_eq!(records.len(), 1);
    assert_eq!(
        records[0].field("headline").and_then(|f| f.as_text()),
        Some("Alive")
    );
}

/// 日期窗口剔除窗口外条目，保留解析失败的条目
#[tokio::test]
async fn test_walk_applies_date_window() {
    let server = MockServer::start().await;
    let root = format!("{}/archive/202403", server.uri());

    Mock::given(method("GET"))
        .and(path("/archive/202403"))
        .and(query_param("page", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_string(listing_page(
            &[
                ("/news/in", "InWindow", "Mar 10, 2024"),
                ("/news/out", "OutOfWindow", "Jun 1, 2019"),
                ("/news/odd", "OddDate", "sometime in spring"),
            ],
            None,
        )))
        .mount(&server)
        .await;

    let window = DateWindow::new(
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        NaiveDate::from_ymd_opt(2024, 12, 31).unwrap(),
    );

    let governor = governor_over(fast_http_chain(2), 2);
    let walker = ArchiveWalker::new(governor, fast_archive_settings());

    let records = walker
        .walk(&[root], &rulesets::archive_listing(), Some(window))
        .await;

    let headlines: Vec<&str> = records
        .iter()
        .filter_map(|r| r.field("headline").and_then(|f| f.as_text()))
        .collect();
    assert!(headlines.contains(&"InWindow"));
    assert!(headlines.contains(&"OddDate"));
    assert!(!headlines.contains(&"OutOfWindow"));
}
