// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::{FetchOutcome, FetchTask};
use crate::engines::chain::StrategyChain;
use crate::governor::pacer::LongHorizonPacer;
use futures::stream::FuturesUnordered;
use futures::StreamExt;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{info, warn};

/// 并发调度器
///
/// 固定容量的准入闸（默认10个并发抓取），超额任务阻塞等待空位。
/// 输出不保证与输入顺序对应——结果按完成顺序收集；
/// 但每个提交的URL保证恰好产生一个结果（成功或终态失败）。
pub struct Governor {
    /// 准入信号量
    semaphore: Arc<Semaphore>,
    /// 策略链
    chain: Arc<StrategyChain>,
    /// 长周期节奏控制器
    pacer: Arc<LongHorizonPacer>,
}

impl Governor {
    /// 创建新的调度器
    ///
    /// # 参数
    ///
    /// * `concurrency` - 并发抓取上限
    /// * `chain` - 策略链
    /// * `pacer` - 长周期节奏控制器
    pub fn new(concurrency: usize, chain: Arc<StrategyChain>, pacer: Arc<LongHorizonPacer>) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(concurrency.max(1))),
            chain,
            pacer,
        }
    }

    /// 提交一批URL，返回按完成顺序收集的结果
    ///
    /// # 参数
    ///
    /// * `urls` - 待抓取的URL集合
    ///
    /// # 返回值
    ///
    /// 每个输入URL恰好对应一个`FetchOutcome`；单个文档的失败
    /// 不会中止整批，调用方以请求数与成功数之差判断完整度
    pub async fn submit(&self, urls: Vec<String>) -> Vec<FetchOutcome> {
        let total = urls.len();
        let mut in_flight = FuturesUnordered::new();
        for url in urls {
            in_flight.push(self.run_one(url));
        }

        let mut outcomes = Vec::with_capacity(total);
        while let Some(outcome) = in_flight.next().await {
            outcomes.push(outcome);
            if outcomes.len() % 100 == 0 || outcomes.len() == total {
                info!("processed {}/{} urls", outcomes.len(), total);
            }
        }
        outcomes
    }

    /// 驱动单个URL穿过准入闸与策略链
    async fn run_one(&self, url: String) -> FetchOutcome {
        let permit = match self.semaphore.acquire().await {
            Ok(p) => p,
            Err(_) => {
                // Semaphore is never closed while the governor is alive
                warn!(url = %url, "admission gate closed unexpectedly");
                return FetchOutcome::failure(url);
            }
        };

        self.pacer.maybe_pause().await;

        let mut task = FetchTask::new(url);
        let outcome = self.chain.run(&mut task).await;
        drop(permit);
        outcome
    }

    /// 仅用第一层探测单个URL（归档遍历的权威探测）
    pub async fn probe(&self, url: &str) -> FetchOutcome {
        let _permit = self.semaphore.acquire().await;
        self.chain.probe(url).await
    }
}
