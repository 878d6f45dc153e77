// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::archive::pagination;
use crate::config::settings::ArchiveSettings;
use crate::domain::models::{FieldValue, ScrapeRecord};
use crate::extract::{self, RuleSet};
use crate::governor::scheduler::Governor;
use crate::utils::url_utils;
use chrono::NaiveDate;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use url::Url;

/// 日期过滤窗口（含两端）
///
/// 日期解析失败的记录保留，宁多勿漏，下游再做清洗。
#[derive(Debug, Clone, Copy)]
pub struct DateWindow {
    /// 窗口起始日
    pub start: NaiveDate,
    /// 窗口结束日
    pub end: NaiveDate,
}

impl DateWindow {
    /// 创建日期窗口（自动纠正颠倒的端点）
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        if start <= end {
            Self { start, end }
        } else {
            Self { start: end, end: start }
        }
    }

    /// 记录是否应当保留
    ///
    /// `date`字段解析成功且落在窗口外才剔除；字段缺失、
    /// 为空或解析失败时保留。
    pub fn keeps(&self, record: &ScrapeRecord) -> bool {
        let raw = match record.field("date").and_then(FieldValue::as_text) {
            Some(text) if !text.is_empty() => text,
            _ => return true,
        };
        match parse_flexible_date(raw) {
            Some(date) => self.start <= date && date <= self.end,
            None => true,
        }
    }
}

/// 宽松的日期解析：ISO日期、ISO时间戳以及列表页常见的英文月份格式
fn parse_flexible_date(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    for format in ["%Y-%m-%d", "%b %d, %Y", "%B %d, %Y", "%m/%d/%Y"] {
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, format) {
            return Some(date);
        }
    }
    // timestamp forms keep the date part
    chrono::DateTime::parse_from_rfc3339(trimmed)
        .map(|dt| dt.date_naive())
        .ok()
}

/// 归档遍历器
///
/// 首页是唯一权威探测：只走第一层抓取且不升级，失败即放弃该根。
/// 首页成功后按分页计划并发展开其余页面，每处理一批插入
/// 随机礼貌性暂停。
pub struct ArchiveWalker {
    /// 并发调度器
    governor: Arc<Governor>,
    /// 归档遍历配置
    settings: ArchiveSettings,
}

impl ArchiveWalker {
    /// 创建新的遍历器
    ///
    /// # 参数
    ///
    /// * `governor` - 并发调度器
    /// * `settings` - 归档遍历配置
    pub fn new(governor: Arc<Governor>, settings: ArchiveSettings) -> Self {
        Self { governor, settings }
    }

    /// 遍历一组归档根并提取所有列表条目
    ///
    /// # 参数
    ///
    /// * `roots` - 归档根URL集合
    /// * `rules` - 激活的规则集
    /// * `window` - 可选的日期过滤窗口
    ///
    /// # 返回值
    ///
    /// 所有根的提取记录；列表页记录展开为单条目记录
    pub async fn walk(
        &self,
        roots: &[String],
        rules: &RuleSet,
        window: Option<DateWindow>,
    ) -> Vec<ScrapeRecord> {
        let mut records = Vec::new();
        for root in roots {
            records.extend(self.walk_root(root, rules, window).await);
        }
        records
    }

    async fn walk_root(
        &self,
        root: &str,
        rules: &RuleSet,
        window: Option<DateWindow>,
    ) -> Vec<ScrapeRecord> {
        let first_page = url_utils::page_url(root, 1);
        let probe = self.governor.probe(&first_page).await;
        let markup = match probe.markup {
            Some(markup) if probe.succeeded => markup,
            _ => {
                warn!(root = %root, "archive probe failed, skipping root");
                return Vec::new();
            }
        };

        let plan = pagination::discover(root, &markup, self.settings.max_pages_fallback);
        info!(root = %root, total_pages = plan.total_pages, "archive walk planned");

        let mut records = self.collect_page(root, &first_page, &markup, rules, window);

        let remaining = plan.remaining_page_urls();
        let mut processed: u32 = 1;
        for batch in remaining.chunks(self.settings.pause_every_pages.max(1) as usize) {
            for outcome in self.governor.submit(batch.to_vec()).await {
                let markup = match outcome.markup {
                    Some(markup) if outcome.succeeded => markup,
                    _ => continue,
                };
                records.extend(self.collect_page(root, &outcome.url, &markup, rules, window));
            }
            processed += batch.len() as u32;
            if processed < plan.total_pages {
                let pause = Duration::from_secs_f64(rand::random_range(
                    self.settings.pause_min_secs..self.settings.pause_max_secs,
                ));
                info!(root = %root, processed, "politeness pause between archive batches");
                tokio::time::sleep(pause).await;
            }
        }
        records
    }

    fn collect_page(
        &self,
        root: &str,
        page_url: &str,
        markup: &str,
        rules: &RuleSet,
        window: Option<DateWindow>,
    ) -> Vec<ScrapeRecord> {
        let page_record = extract::extract(page_url, markup, rules);
        let mut records = expand_listing(&page_record, root);
        if let Some(window) = window {
            records.retain(|record| window.keeps(record));
        }
        records
    }
}

/// 把列表页记录展开为单条目记录
///
/// `headlines`/`dates`/`links`三个对齐列表合并成每条目一条记录，
/// 相对链接基于根URL补全。没有列表结构的记录原样返回。
pub fn expand_listing(page_record: &ScrapeRecord, base_url: &str) -> Vec<ScrapeRecord> {
    let lists = (
        page_record.field("headlines"),
        page_record.field("dates"),
        page_record.field("links"),
    );
    let (headlines, dates, links) = match lists {
        (
            Some(FieldValue::List(headlines)),
            Some(FieldValue::List(dates)),
            Some(FieldValue::List(links)),
        ) => (headlines, dates, links),
        _ => return vec![page_record.clone()],
    };

    headlines
        .iter()
        .zip(dates.iter())
        .zip(links.iter())
        .map(|((headline, date), link)| {
            let url = resolve_link(base_url, link);
            let mut fields = BTreeMap::new();
            fields.insert("headline".to_string(), FieldValue::Text(headline.clone()));
            fields.insert("date".to_string(), FieldValue::Text(date.clone()));
            ScrapeRecord::new(url, fields)
        })
        .collect()
}

fn resolve_link(base_url: &str, link: &str) -> String {
    match Url::parse(base_url).and_then(|base| base.join(link)) {
        Ok(url) => url.to_string(),
        Err(_) => link.to_string(),
    }
}
