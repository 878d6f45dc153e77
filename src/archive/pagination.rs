// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::PaginationPlan;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Selector};
use tracing::debug;

static TOTAL_RESULTS_RE: Lazy<Regex> = Lazy::new(|| {
    // compiled once; the pattern is a literal and cannot fail
    Regex::new(r"(\d+)\s*results").unwrap()
});

/// 从归档首页发现遍历计划
///
/// 分页控件`ul.pagination`里带`?page=`的数字链接取最大值，
/// 省略号等非数字链接跳过。控件缺失视为单页归档。
/// 发现的页数以配置上限封顶，防止异常控件放大遍历量。
///
/// # 参数
///
/// * `base_url` - 归档根URL
/// * `markup` - 首页标记
/// * `ceiling` - 页数上限
pub fn discover(base_url: &str, markup: &str, ceiling: u32) -> PaginationPlan {
    let doc = Html::parse_document(markup);
    let link_sel = Selector::parse("ul.pagination a[href*='?page=']").unwrap();

    let max_page = doc
        .select(&link_sel)
        .filter_map(|a| {
            a.text()
                .collect::<String>()
                .trim()
                .parse::<u32>()
                .ok()
        })
        .max();

    let total_pages = match max_page {
        Some(found) => {
            if found > ceiling {
                debug!(base_url = %base_url, found, ceiling, "pagination control exceeds ceiling, clamping");
            }
            found.min(ceiling)
        }
        None => 1,
    };

    PaginationPlan::new(base_url, total_pages)
}

/// 从结果计数文本解析总结果数
///
/// 先去掉千位分隔逗号和不换行空格，再匹配紧邻"results"前的数字。
/// 未命中返回None。
pub fn parse_total_results(count_text: &str) -> Option<u64> {
    let cleaned = count_text.replace('\u{a0}', "").replace(',', "");
    TOTAL_RESULTS_RE
        .captures(&cleaned)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse::<u64>().ok())
}

/// 按结果总数与每页条目数推算遍历计划
///
/// 专利检索类列表没有分页控件，只报告结果总数；
/// 用`ceil(total / per_page)`推算页数并以上限封顶。
pub fn plan_for_result_count(
    base_url: &str,
    total_results: u64,
    per_page: u64,
    ceiling: u32,
) -> PaginationPlan {
    let per_page = per_page.max(1);
    let pages = total_results.div_ceil(per_page).min(u64::from(ceiling)) as u32;
    PaginationPlan::new(base_url, pages)
}
