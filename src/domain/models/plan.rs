// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::utils::url_utils;

/// 归档遍历计划
///
/// 对首页探测结果的总结：根URL与应当遍历的总页数。
/// 总页数以首页分页控件为唯一权威来源，遍历中途不再修正。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaginationPlan {
    /// 归档根URL
    pub base_url: String,
    /// 总页数（至少为1）
    pub total_pages: u32,
}

impl PaginationPlan {
    /// 创建遍历计划，页数下限为1
    pub fn new(base_url: impl Into<String>, total_pages: u32) -> Self {
        Self {
            base_url: base_url.into(),
            total_pages: total_pages.max(1),
        }
    }

    /// 第2页起的后续页URL（首页已在探测时抓取）
    pub fn remaining_page_urls(&self) -> Vec<String> {
        (2..=self.total_pages)
            .map(|page| url_utils::page_url(&self.base_url, page))
            .collect()
    }
}
