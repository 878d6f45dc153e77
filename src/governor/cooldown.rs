// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use metrics::{counter, gauge};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::{watch, Mutex};
use tracing::info;

/// 冷却窗口（秒）
const COOLDOWN_MIN_SECS: f64 = 4.0;
const COOLDOWN_MAX_SECS: f64 = 6.0;

/// 进程级冷却闸门
///
/// 开/关标志加单一互斥令牌。疑似触发限流时，
/// 任一时刻至多一个任务充当协商者：关闭闸门、休眠冷却窗口、
/// 重新开启；其余在途任务在闸门上等待而非各自休眠，
/// 避免惊群式的重复请求。
pub struct CooldownGate {
    /// 闸门开关（true=开）
    open_tx: watch::Sender<bool>,
    /// 协商者互斥令牌
    negotiator: Mutex<()>,
    /// 当前持有协商权的任务数（不变量：至多1）
    holders: AtomicUsize,
    /// 冷却窗口下限（秒）
    min_secs: f64,
    /// 冷却窗口上限（秒）
    max_secs: f64,
}

impl Default for CooldownGate {
    fn default() -> Self {
        Self::new()
    }
}

impl CooldownGate {
    /// 创建开启状态的闸门
    pub fn new() -> Self {
        Self::with_window(COOLDOWN_MIN_SECS, COOLDOWN_MAX_SECS)
    }

    /// 使用指定冷却窗口创建闸门
    ///
    /// # 参数
    ///
    /// * `min_secs` - 冷却窗口下限（秒）
    /// * `max_secs` - 冷却窗口上限（秒）
    pub fn with_window(min_secs: f64, max_secs: f64) -> Self {
        let (open_tx, _) = watch::channel(true);
        Self {
            open_tx,
            negotiator: Mutex::new(()),
            holders: AtomicUsize::new(0),
            min_secs,
            max_secs,
        }
    }

    /// 闸门是否开启
    pub fn is_open(&self) -> bool {
        *self.open_tx.borrow()
    }

    /// 当前协商者数量（测试用于验证互斥不变量）
    pub fn holder_count(&self) -> usize {
        self.holders.load(Ordering::SeqCst)
    }

    /// 等待闸门开启；已开启时立即返回
    pub async fn wait_open(&self) {
        let mut rx = self.open_tx.subscribe();
        // wait_for returns as soon as the predicate holds, including immediately
        let _ = rx.wait_for(|open| *open).await;
    }

    /// 协商一次冷却暂停
    ///
    /// 若无其他任务持有协商权，则本任务关闭闸门、休眠随机冷却窗口
    /// 后重新开启，并返回true；否则仅等待闸门重新开启并返回false。
    ///
    /// # 返回值
    ///
    /// 本任务是否为实际执行冷却的协商者
    pub async fn negotiate_cooldown(&self) -> bool {
        let window = Duration::from_secs_f64(rand::random_range(self.min_secs..self.max_secs));
        self.negotiate(window).await
    }

    /// 以指定窗口协商关闭闸门（长周期节奏控制也走同一纪律）
    ///
    /// # 参数
    ///
    /// * `window` - 闸门保持关闭的时长
    ///
    /// # 返回值
    ///
    /// 本任务是否为实际执行关闭的协商者
    pub async fn negotiate(&self, window: Duration) -> bool {
        match self.negotiator.try_lock() {
            Ok(_guard) => {
                self.holders.fetch_add(1, Ordering::SeqCst);
                counter!("harvest_cooldown_events_total").increment(1);
                gauge!("harvest_gate_open").set(0.0);
                info!("pausing all in-flight tasks for {:?} to cool down", window);

                let _ = self.open_tx.send(false);
                tokio::time::sleep(window).await;
                let _ = self.open_tx.send(true);

                gauge!("harvest_gate_open").set(1.0);
                self.holders.fetch_sub(1, Ordering::SeqCst);
                true
            }
            Err(_) => {
                // 已有协商者在冷却，等它重新开闸即可
                self.wait_open().await;
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_gate_starts_open() {
        let gate = CooldownGate::new();
        assert!(gate.is_open());
        // 开启状态下wait_open立即返回
        tokio::time::timeout(Duration::from_millis(50), gate.wait_open())
            .await
            .expect("wait_open should not block on an open gate");
    }

    #[tokio::test(start_paused = true)]
    async fn test_negotiate_closes_then_reopens() {
        let gate = Arc::new(CooldownGate::with_window(0.01, 0.02));

        let held = gate.negotiate(Duration::from_millis(10)).await;
        assert!(held);
        assert!(gate.is_open());
        assert_eq!(gate.holder_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_single_negotiator_invariant_under_stress() {
        let gate = Arc::new(CooldownGate::with_window(0.01, 0.02));
        let max_seen = Arc::new(AtomicUsize::new(0));
        let negotiated = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..32 {
            let gate = gate.clone();
            let max_seen = max_seen.clone();
            let negotiated = negotiated.clone();
            handles.push(tokio::spawn(async move {
                let observed = gate.holder_count();
                max_seen.fetch_max(observed, Ordering::SeqCst);
                if gate.negotiate(Duration::from_millis(20)).await {
                    negotiated.fetch_add(1, Ordering::SeqCst);
                }
                max_seen.fetch_max(gate.holder_count(), Ordering::SeqCst);
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        // 任一时刻至多一个协商者
        assert!(max_seen.load(Ordering::SeqCst) <= 1);
        // 所有任务最终都从闸门恢复
        assert!(gate.is_open());
        assert!(negotiated.load(Ordering::SeqCst) >= 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_waiters_resume_after_reopen() {
        let gate = Arc::new(CooldownGate::with_window(0.01, 0.02));

        let holder = {
            let gate = gate.clone();
            tokio::spawn(async move { gate.negotiate(Duration::from_millis(50)).await })
        };
        // 让协商者先拿到闸门
        tokio::task::yield_now().await;

        let waiter = {
            let gate = gate.clone();
            tokio::spawn(async move {
                gate.wait_open().await;
                true
            })
        };

        assert!(holder.await.unwrap());
        assert!(waiter.await.unwrap());
        assert!(gate.is_open());
    }
}
