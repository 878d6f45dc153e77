// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::FieldValue;
use crate::extract::rulesets;
use scraper::Html;
use std::collections::HashMap;
use tracing::debug;

/// 字段提取器
///
/// 作用于已解析文档树的纯函数，返回单个字段值。
/// 选择器未命中时返回`FieldValue::Empty`，不得panic传播。
pub type Extractor = fn(&Html) -> FieldValue;

/// 提取规则集
///
/// 命名的字段名→提取器有序表。提取时每个文档恰好激活一个规则集，
/// 绝不在文档中途混用。
#[derive(Clone)]
pub struct RuleSet {
    /// 规则集名称
    pub name: &'static str,
    /// 字段表（保持注册顺序）
    fields: Vec<(&'static str, Extractor)>,
}

impl RuleSet {
    /// 创建空规则集
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            fields: Vec::new(),
        }
    }

    /// 注册一个字段提取器
    pub fn field(mut self, name: &'static str, extractor: Extractor) -> Self {
        self.fields.push((name, extractor));
        self
    }

    /// 遍历字段表
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, Extractor)> + '_ {
        self.fields.iter().copied()
    }

    /// 字段数量
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// 规则注册表
///
/// 封闭的`{主机名 → 规则集}`分发表。新增站点只需注册一个命名规则集，
/// 无需改动引擎或分发逻辑。未注册的主机回退到通用文章规则集。
pub struct RuleRegistry {
    /// 主机分发表
    by_host: HashMap<&'static str, RuleSet>,
    /// 命名查找表（显式指定规则集时使用）
    by_name: HashMap<&'static str, RuleSet>,
    /// 默认规则集
    default: RuleSet,
}

impl Default for RuleRegistry {
    /// 构建内置注册表：通用文章、oedigital、谷歌专利
    fn default() -> Self {
        let mut registry = Self {
            by_host: HashMap::new(),
            by_name: HashMap::new(),
            default: rulesets::basic_article(),
        };
        registry.register("www.marinelink.com", rulesets::basic_article());
        registry.register("www.oedigital.com", rulesets::oedigital());
        registry.register("patents.google.com", rulesets::google_patents());
        registry.register_named(rulesets::archive_listing());
        registry
    }
}

impl RuleRegistry {
    /// 注册主机专属规则集
    ///
    /// # 参数
    ///
    /// * `host` - 主机名（小写）
    /// * `rule_set` - 规则集
    pub fn register(&mut self, host: &'static str, rule_set: RuleSet) {
        self.by_name.insert(rule_set.name, rule_set.clone());
        self.by_host.insert(host, rule_set);
    }

    /// 注册仅按名称查找的规则集（不绑定主机）
    pub fn register_named(&mut self, rule_set: RuleSet) {
        self.by_name.insert(rule_set.name, rule_set);
    }

    /// 按主机选择规则集，未注册时回退默认
    ///
    /// # 参数
    ///
    /// * `host` - 主机名
    ///
    /// # 返回值
    ///
    /// 激活的规则集引用
    pub fn select(&self, host: &str) -> &RuleSet {
        match self.by_host.get(host) {
            Some(rules) => rules,
            None => {
                debug!(host = %host, "no host-specific rules, using basic article rules");
                &self.default
            }
        }
    }

    /// 按名称取规则集
    pub fn get(&self, name: &str) -> Option<&RuleSet> {
        self.by_name.get(name)
    }

    /// 默认规则集
    pub fn default_rules(&self) -> &RuleSet {
        &self.default
    }
}
