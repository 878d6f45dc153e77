// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use harvestrs::config::settings::Settings;
use harvestrs::engines::chain::StrategyChain;
use harvestrs::engines::http_engine::HttpEngine;
use harvestrs::governor::cooldown::CooldownGate;
use harvestrs::governor::pacer::LongHorizonPacer;
use harvestrs::governor::scheduler::Governor;
use harvestrs::utils::retry_policy::RetryPolicy;
use std::sync::Arc;
use std::time::Duration;

/// 只含HTTP层的快速测试链
///
/// 退避压到毫秒级、冷却窗口压到几十毫秒，
/// 让真实的wiremock场景在秒级内跑完。
pub fn fast_http_chain(max_retries: u32) -> Arc<StrategyChain> {
    let policy = RetryPolicy {
        max_retries,
        initial_backoff: Duration::from_millis(5),
        max_backoff: Duration::from_millis(20),
        backoff_multiplier: 1.2,
        jitter_secs: 0.0,
        enable_jitter: false,
    };

    let mut engine_settings = Settings::default().engine;
    engine_settings.request_timeout_secs = 5;

    Arc::new(StrategyChain::with_engines(
        vec![Arc::new(HttpEngine)],
        vec![policy],
        engine_settings,
        Arc::new(CooldownGate::with_window(0.02, 0.05)),
    ))
}

/// 测试用调度器：给定链、并发度，长暂停阈值保持默认（不会触发）
pub fn governor_over(chain: Arc<StrategyChain>, concurrency: usize) -> Arc<Governor> {
    let settings = Settings::default();
    let gate = Arc::new(CooldownGate::with_window(0.02, 0.05));
    let pacer = Arc::new(LongHorizonPacer::new(gate, settings.pacing));
    Arc::new(Governor::new(concurrency, chain, pacer))
}
