// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

//! 交互式拷贝循环
//!
//! 轮询循环与动作选择解耦：循环只负责截止时间与成功判定，
//! 每轮执行什么动作由`HumanAction`随机挑选，具体执行方式
//! 由调用方注入的闭包决定。

use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

/// 拟人化交互动作
///
/// 每轮拷贝前随机执行一种，打散固定的操作节拍。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HumanAction {
    /// 随机幅度滚动
    Scroll,
    /// 页面空白处点击
    Click,
    /// 指针随机移动
    PointerMove,
}

impl HumanAction {
    /// 随机挑选一种动作
    pub fn random() -> Self {
        match rand::random_range(0..3u8) {
            0 => HumanAction::Scroll,
            1 => HumanAction::Click,
            _ => HumanAction::PointerMove,
        }
    }

    /// 在渲染上下文中执行该动作的脚本
    pub fn script(&self) -> &'static str {
        match self {
            HumanAction::Scroll => {
                "window.scrollBy(0, 200 + Math.floor(Math.random() * 400))"
            }
            HumanAction::Click => {
                "document.body && document.body.click()"
            }
            HumanAction::PointerMove => {
                "document.dispatchEvent(new MouseEvent('mousemove', \
                 { clientX: Math.random() * 800, clientY: Math.random() * 600 }))"
            }
        }
    }
}

/// 有界拷贝轮询循环
///
/// 每轮：随机动作 → 注入的拷贝闭包 → 长度判定。
/// 达到最小长度立即返回；墙钟截止后返回None，
/// 单个文档不会无限期占用批次。
///
/// # 参数
///
/// * `deadline` - 墙钟上限
/// * `min_length` - 成功判定的最小文本长度
/// * `cycle` - 执行一轮动作加拷贝的闭包，返回本轮读到的文本
pub async fn run_copy_loop<F, Fut>(
    deadline: Duration,
    min_length: usize,
    mut cycle: F,
) -> Option<String>
where
    F: FnMut(HumanAction) -> Fut,
    Fut: Future<Output = Option<String>>,
{
    let started = Instant::now();
    let mut rounds: u32 = 0;

    while started.elapsed() < deadline {
        rounds += 1;
        let action = HumanAction::random();
        if let Some(text) = cycle(action).await {
            if text.len() >= min_length {
                debug!(rounds, length = text.len(), "copy loop met length threshold");
                return Some(text);
            }
        }
        tokio::time::sleep(Duration::from_millis(500)).await;
    }
    debug!(rounds, "copy loop hit wall-clock deadline");
    None
}
