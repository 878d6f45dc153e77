// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::config::settings::EngineSettings;
use crate::domain::models::{FetchOutcome, FetchTask};
use crate::engines::browser_engine::BrowserEngine;
use crate::engines::http_engine::HttpEngine;
use crate::engines::traits::{FetchEngine, FetchRequest};
use crate::governor::cooldown::CooldownGate;
use crate::utils::retry_policy::RetryPolicy;
use metrics::counter;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// 引擎层性能统计
#[derive(Debug, Clone, Default)]
pub struct TierStats {
    /// 成功次数
    pub successes: u64,
    /// 失败次数（重试耗尽或结构性升级）
    pub failures: u64,
    /// 累计耗时
    pub total_elapsed: Duration,
}

/// 分层抓取策略链
///
/// 按成本升序持有引擎列表，逐个URL解释每层的失败标签：
/// 瞬时失败同层退避重试，结构性失败立即升级，
/// 末层耗尽产生终态失败结果。升级是单调且惰性的：
/// 第一层成功的URL永远不会触碰第二层。
pub struct StrategyChain {
    /// 引擎列表（按层级升序）
    engines: Vec<Arc<dyn FetchEngine>>,
    /// 各层的重试策略
    policies: Vec<RetryPolicy>,
    /// 进程级冷却闸门
    gate: Arc<CooldownGate>,
    /// 请求超时与静置配置
    settings: EngineSettings,
    /// 各层统计信息
    stats: Arc<parking_lot::RwLock<HashMap<&'static str, TierStats>>>,
}

impl StrategyChain {
    /// 创建标准两层链：HTTP → 浏览器渲染
    ///
    /// # 参数
    ///
    /// * `settings` - 引擎配置
    /// * `gate` - 进程级冷却闸门
    ///
    /// # 返回值
    ///
    /// 返回新的策略链实例
    pub fn new(settings: EngineSettings, gate: Arc<CooldownGate>) -> Self {
        let mut http_policy = RetryPolicy::http();
        http_policy.max_retries = settings.http_retries;
        let mut browser_policy = RetryPolicy::browser();
        browser_policy.max_retries = settings.browser_retries;

        Self::with_engines(
            vec![Arc::new(HttpEngine), Arc::new(BrowserEngine)],
            vec![http_policy, browser_policy],
            settings,
            gate,
        )
    }

    /// 使用指定引擎与策略创建链（测试接缝）
    ///
    /// # 参数
    ///
    /// * `engines` - 引擎列表，按层级升序
    /// * `policies` - 与引擎一一对应的重试策略
    /// * `settings` - 引擎配置
    /// * `gate` - 进程级冷却闸门
    pub fn with_engines(
        engines: Vec<Arc<dyn FetchEngine>>,
        policies: Vec<RetryPolicy>,
        settings: EngineSettings,
        gate: Arc<CooldownGate>,
    ) -> Self {
        debug_assert_eq!(engines.len(), policies.len());
        let mut stats = HashMap::new();
        for engine in &engines {
            stats.insert(engine.name(), TierStats::default());
        }

        Self {
            engines,
            policies,
            gate,
            settings,
            stats: Arc::new(parking_lot::RwLock::new(stats)),
        }
    }

    /// 构造单次抓取请求
    fn request_for(&self, url: &str, tier_index: usize) -> FetchRequest {
        let mut request = FetchRequest::new(url);
        request.timeout = if tier_index == 0 {
            self.settings.request_timeout()
        } else {
            self.settings.render_timeout()
        };
        request.settle = Duration::from_millis(self.settings.render_settle_ms);
        request
    }

    /// 驱动任务穿过整条链，产出恰好一个结果
    ///
    /// # 参数
    ///
    /// * `task` - 抓取任务（记录层级与尝试计数）
    ///
    /// # 返回值
    ///
    /// 成功或终态失败的抓取结果；本方法不会panic也不会丢弃任务
    pub async fn run(&self, task: &mut FetchTask) -> FetchOutcome {
        let mut tier_index = 0usize;

        while tier_index < self.engines.len() {
            let engine = &self.engines[tier_index];
            let policy = &self.policies[tier_index];

            loop {
                // 最后一次尝试前先协商进程级冷却，
                // 其余在途任务在闸门上等待而非各自休眠
                if policy.is_final_attempt(task.attempt) {
                    self.gate.negotiate_cooldown().await;
                }

                self.gate.wait_open().await;

                // 请求间的微小随机间隔，避免齐步走的请求节奏
                let pre_jitter = Duration::from_secs_f64(0.1 + rand::random_range(0.2..0.8));
                tokio::time::sleep(pre_jitter).await;

                let request = self.request_for(&task.url, tier_index);
                let started = Instant::now();

                match engine.fetch(&request).await {
                    Ok(markup) => {
                        self.record(engine.name(), true, started.elapsed());
                        counter!("harvest_fetch_success_total", "tier" => engine.name())
                            .increment(1);
                        info!(url = %task.url, tier = engine.name(), "fetch succeeded");
                        return FetchOutcome::success(task.url.clone(), markup);
                    }
                    Err(e) if e.is_structural() && tier_index + 1 < self.engines.len() => {
                        self.record(engine.name(), false, started.elapsed());
                        counter!("harvest_tier_escalations_total", "from" => engine.name())
                            .increment(1);
                        warn!(
                            url = %task.url,
                            tier = engine.name(),
                            error = %e,
                            "structural failure, escalating to next tier"
                        );
                        task.escalate(self.engines[tier_index + 1].tier());
                        break;
                    }
                    Err(e) => {
                        task.attempt += 1;
                        if policy.should_retry(task.attempt) {
                            let backoff = policy.calculate_backoff(task.attempt - 1);
                            warn!(
                                url = %task.url,
                                tier = engine.name(),
                                attempt = task.attempt,
                                error = %e,
                                "attempt failed, backing off {:?}",
                                backoff
                            );
                            tokio::time::sleep(backoff).await;
                            continue;
                        }

                        // 当前层重试耗尽
                        self.record(engine.name(), false, started.elapsed());
                        if tier_index + 1 < self.engines.len() {
                            warn!(
                                url = %task.url,
                                tier = engine.name(),
                                "retries exhausted, escalating to next tier"
                            );
                            task.escalate(self.engines[tier_index + 1].tier());
                            break;
                        }

                        counter!("harvest_fetch_exhausted_total").increment(1);
                        warn!(url = %task.url, "all tiers exhausted, giving up");
                        return FetchOutcome::failure(task.url.clone());
                    }
                }
            }

            tier_index += 1;
        }

        FetchOutcome::failure(task.url.clone())
    }

    /// 仅用第一层执行单次权威探测（归档遍历的第1页）
    ///
    /// 不做层级升级；瞬时失败按第一层策略重试。
    pub async fn probe(&self, url: &str) -> FetchOutcome {
        let engine = &self.engines[0];
        let policy = &self.policies[0];
        let mut attempt = 0u32;

        loop {
            self.gate.wait_open().await;
            let request = self.request_for(url, 0);

            match engine.fetch(&request).await {
                Ok(markup) => return FetchOutcome::success(url, markup),
                Err(e) => {
                    attempt += 1;
                    if !policy.should_retry(attempt) {
                        warn!(url = %url, error = %e, "archive probe failed");
                        return FetchOutcome::failure(url);
                    }
                    tokio::time::sleep(policy.calculate_backoff(attempt - 1)).await;
                }
            }
        }
    }

    /// 更新层级统计信息
    fn record(&self, name: &'static str, success: bool, elapsed: Duration) {
        let mut stats = self.stats.write();
        let entry = stats.entry(name).or_default();
        if success {
            entry.successes += 1;
        } else {
            entry.failures += 1;
        }
        entry.total_elapsed += elapsed;
    }

    /// 获取各层统计信息
    pub fn tier_stats(&self) -> HashMap<&'static str, TierStats> {
        self.stats.read().clone()
    }
}
