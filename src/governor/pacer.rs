// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::config::settings::PacingSettings;
use crate::governor::cooldown::CooldownGate;
use metrics::counter;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::info;

/// 长周期节奏控制器
///
/// 独立于失败率：自上次长暂停起经过随机化阈值（约700–1100秒）后，
/// 关闭闸门一个较长的随机窗口（约30–60秒），模拟人类浏览节奏。
/// 关闭动作复用冷却闸门的单协商者纪律。
pub struct LongHorizonPacer {
    /// 进程级冷却闸门
    gate: Arc<CooldownGate>,
    /// 上次长暂停时刻与当前随机阈值
    state: parking_lot::Mutex<PacerState>,
    /// 节奏配置
    settings: PacingSettings,
}

struct PacerState {
    last_pause: Instant,
    threshold: Duration,
}

impl LongHorizonPacer {
    /// 创建新的节奏控制器
    ///
    /// # 参数
    ///
    /// * `gate` - 进程级冷却闸门
    /// * `settings` - 节奏配置
    pub fn new(gate: Arc<CooldownGate>, settings: PacingSettings) -> Self {
        let threshold = Self::random_threshold(&settings);
        Self {
            gate,
            state: parking_lot::Mutex::new(PacerState {
                last_pause: Instant::now(),
                threshold,
            }),
            settings,
        }
    }

    fn random_threshold(settings: &PacingSettings) -> Duration {
        Duration::from_secs(rand::random_range(
            settings.long_pause_after_min_secs..=settings.long_pause_after_max_secs,
        ))
    }

    fn random_window(settings: &PacingSettings) -> Duration {
        Duration::from_secs(rand::random_range(
            settings.long_pause_min_secs..=settings.long_pause_max_secs,
        ))
    }

    /// 距下次长暂停的剩余时间（测试可观测）
    pub fn remaining(&self) -> Duration {
        let state = self.state.lock();
        state.threshold.saturating_sub(state.last_pause.elapsed())
    }

    /// 若已到随机阈值则执行一次长暂停
    ///
    /// 并发调用时仅一个任务实际持闸，其余等待重新开启。
    pub async fn maybe_pause(&self) {
        let due = {
            let state = self.state.lock();
            state.last_pause.elapsed() >= state.threshold
        };
        if !due {
            return;
        }

        let window = Self::random_window(&self.settings);
        if self.gate.negotiate(window).await {
            counter!("harvest_long_pauses_total").increment(1);
            info!("long-horizon pause complete, resuming after {:?}", window);
            let mut state = self.state.lock();
            state.last_pause = Instant::now();
            state.threshold = Self::random_threshold(&self.settings);
        }
    }
}
