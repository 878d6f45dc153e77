// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// 提取字段值
///
/// 单个提取器的输出：文本、文本列表或空值。
/// 选择器未命中或提取器内部出错时退化为`Empty`。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// 文本值
    Text(String),
    /// 文本列表
    List(Vec<String>),
    /// 空值
    Empty,
}

impl FieldValue {
    /// 是否为空值
    pub fn is_empty(&self) -> bool {
        match self {
            FieldValue::Text(s) => s.is_empty(),
            FieldValue::List(v) => v.is_empty(),
            FieldValue::Empty => true,
        }
    }

    /// 取文本内容（列表和空值返回None）
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::Text(s)
    }
}

impl From<Vec<String>> for FieldValue {
    fn from(v: Vec<String>) -> Self {
        FieldValue::List(v)
    }
}

/// 抓取记录
///
/// 引擎的标准输出单元，每个成功处理的URL对应一条。
/// 创建后追加到结果集合，不再修改。下游持久化协作方
/// 负责按标识去重，引擎本身跨运行无状态。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrapeRecord {
    /// 来源URL
    pub url: String,
    /// 字段名到提取值的映射
    pub fields: BTreeMap<String, FieldValue>,
    /// 提取时刻的时间戳（非抓取时刻）
    pub scrape_time: DateTime<Utc>,
}

impl ScrapeRecord {
    /// 创建新的抓取记录，`scrape_time`取当前时刻
    pub fn new(url: impl Into<String>, fields: BTreeMap<String, FieldValue>) -> Self {
        Self {
            url: url.into(),
            fields,
            scrape_time: Utc::now(),
        }
    }

    /// 按名称取字段值
    pub fn field(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }
}
