// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::{FieldValue, ScrapeRecord};
use crate::extract::rules::RuleSet;
use scraper::Html;
use std::collections::BTreeMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use tracing::warn;

/// 按规则集从页面标记提取一条记录
///
/// 文档只解析一次，规则集的每个提取器依次作用于同一棵树。
/// 字段级隔离：单个提取器panic或未命中只让该字段为`Empty`，
/// 不影响同一记录的其余字段。`scrape_time`在提取时刻盖章。
///
/// # 参数
///
/// * `url` - 记录来源URL
/// * `markup` - 抓取到的页面标记
/// * `rules` - 激活的规则集
///
/// # 返回值
///
/// 字段名到提取值的完整记录（规则集每个字段都出现）
pub fn extract(url: &str, markup: &str, rules: &RuleSet) -> ScrapeRecord {
    let doc = Html::parse_document(markup);
    let mut fields = BTreeMap::new();

    for (name, extractor) in rules.iter() {
        let value = match catch_unwind(AssertUnwindSafe(|| extractor(&doc))) {
            Ok(value) => value,
            Err(_) => {
                warn!(url = %url, field = name, rule_set = rules.name, "field extractor panicked");
                FieldValue::Empty
            }
        };
        fields.insert(name.to_string(), value);
    }

    ScrapeRecord::new(url, fields)
}
