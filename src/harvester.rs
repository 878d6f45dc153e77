// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::archive::walker::{ArchiveWalker, DateWindow};
use crate::config::settings::Settings;
use crate::domain::models::ScrapeRecord;
use crate::engines::chain::{StrategyChain, TierStats};
use crate::extract::{self, RuleRegistry, RuleSet};
use crate::governor::cooldown::CooldownGate;
use crate::governor::pacer::LongHorizonPacer;
use crate::governor::scheduler::Governor;
use crate::pdf::{PdfAcquirer, PdfDocument};
use crate::utils::url_utils;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};

/// 文档采集门面
///
/// 把闸门、节奏控制、策略链、调度器、规则注册表和PDF获取器
/// 装配成一个入口。跨运行无状态：去重、持久化与富化
/// 均由调用方负责。
pub struct Harvester {
    settings: Settings,
    registry: RuleRegistry,
    /// 显式指定的规则集名称（None时按主机分发）
    rule_set: Option<String>,
    chain: Arc<StrategyChain>,
    pacer: Arc<LongHorizonPacer>,
    governor: Arc<Governor>,
}

impl Harvester {
    /// 按配置装配采集器
    ///
    /// # 参数
    ///
    /// * `settings` - 完整配置
    pub fn new(settings: Settings) -> Self {
        let gate = Arc::new(CooldownGate::with_window(
            settings.pacing.cooldown_min_secs,
            settings.pacing.cooldown_max_secs,
        ));
        let pacer = Arc::new(LongHorizonPacer::new(gate.clone(), settings.pacing.clone()));
        let chain = Arc::new(StrategyChain::new(settings.engine.clone(), gate));
        let governor = Arc::new(Governor::new(
            settings.engine.concurrency,
            chain.clone(),
            pacer.clone(),
        ));

        Self {
            settings,
            registry: RuleRegistry::default(),
            rule_set: None,
            chain,
            pacer,
            governor,
        }
    }

    /// 固定使用命名规则集，关闭按主机分发
    pub fn with_rule_set(mut self, name: impl Into<String>) -> Self {
        self.rule_set = Some(name.into());
        self
    }

    /// 覆盖并发上限
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.settings.engine.concurrency = concurrency;
        self.governor = Arc::new(Governor::new(
            concurrency,
            self.chain.clone(),
            self.pacer.clone(),
        ));
        self
    }

    /// 选择记录的激活规则集
    fn rules_for(&self, url: &str) -> &RuleSet {
        if let Some(name) = &self.rule_set {
            match self.registry.get(name) {
                Some(rules) => return rules,
                None => {
                    warn!(rule_set = %name, "unknown rule set, falling back to host dispatch")
                }
            }
        }
        let host = url_utils::host_of(url).unwrap_or_default();
        self.registry.select(&host)
    }

    /// 抓取并提取一批URL
    ///
    /// # 参数
    ///
    /// * `urls` - 待采集的URL集合
    ///
    /// # 返回值
    ///
    /// 成功文档的记录，按完成顺序；失败的URL只留下日志与计数。
    /// 调用方以请求数与记录数之差判断完整度。
    pub async fn scrape(&self, urls: Vec<String>) -> Vec<ScrapeRecord> {
        let requested = urls.len();
        let outcomes = self.governor.submit(urls).await;

        let mut records = Vec::new();
        for outcome in outcomes {
            let markup = match outcome.markup {
                Some(markup) if outcome.succeeded => markup,
                _ => continue,
            };
            let rules = self.rules_for(&outcome.url);
            records.push(extract::extract(&outcome.url, &markup, rules));
        }

        info!(
            requested,
            extracted = records.len(),
            "scrape batch complete"
        );
        records
    }

    /// 遍历归档根并展开所有列表条目
    ///
    /// # 参数
    ///
    /// * `roots` - 归档根URL集合
    /// * `window` - 可选的日期过滤窗口
    pub async fn walk_archives(
        &self,
        roots: &[String],
        window: Option<DateWindow>,
    ) -> Vec<ScrapeRecord> {
        let rules = match &self.rule_set {
            Some(name) => self.registry.get(name),
            None => self.registry.get("archive_listing"),
        };
        let rules = match rules {
            Some(rules) => rules,
            None => self.registry.default_rules(),
        };

        let walker = ArchiveWalker::new(self.governor.clone(), self.settings.archive.clone());
        walker.walk(roots, rules, window).await
    }

    /// 获取一批PDF文档的全文与章节
    ///
    /// 非`.pdf`的URL先抓取宿主页面定位嵌入的PDF来源。
    /// 获取串行执行：交互式回退独占渲染上下文，且本身
    /// 就是批次里最昂贵的一步。
    ///
    /// # 参数
    ///
    /// * `urls` - 文档URL集合
    ///
    /// # 返回值
    ///
    /// 成功获取的文档；低于长度阈值或两种策略均失败的URL被剔除
    pub async fn acquire_pdfs(&self, urls: Vec<String>) -> Vec<PdfDocument> {
        let acquirer = PdfAcquirer::new(
            self.settings.pdf.clone(),
            self.settings.engine.request_timeout(),
        );

        let mut documents = Vec::new();
        for url in urls {
            let page_markup = if url.split('?').next().unwrap_or(&url).ends_with(".pdf") {
                None
            } else {
                let outcome = self.governor.probe(&url).await;
                if outcome.succeeded {
                    outcome.markup
                } else {
                    None
                }
            };

            match acquirer.acquire(&url, page_markup.as_deref()).await {
                Ok(document) => documents.push(document),
                Err(e) => warn!(url = %url, error = %e, "pdf acquisition failed"),
            }
        }
        documents
    }

    /// 各抓取层的成功/失败统计
    pub fn tier_stats(&self) -> HashMap<&'static str, TierStats> {
        self.chain.tier_stats()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::settings::Settings;

    #[test]
    fn test_host_dispatch_by_default() {
        let harvester = Harvester::new(Settings::default());
        assert_eq!(
            harvester
                .rules_for("https://patents.google.com/patent/US1A")
                .name,
            "google_patents"
        );
        assert_eq!(
            harvester.rules_for("https://unknown.example.org/x").name,
            "basic_article"
        );
    }

    #[test]
    fn test_explicit_rule_set_overrides_host() {
        let harvester = Harvester::new(Settings::default()).with_rule_set("oedigital");
        assert_eq!(
            harvester
                .rules_for("https://patents.google.com/patent/US1A")
                .name,
            "oedigital"
        );
    }

    #[test]
    fn test_unknown_explicit_rule_set_falls_back_to_host() {
        let harvester = Harvester::new(Settings::default()).with_rule_set("no_such_set");
        assert_eq!(
            harvester
                .rules_for("https://www.oedigital.com/news/1")
                .name,
            "oedigital"
        );
    }
}
