// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use serde::{Deserialize, Serialize};

/// 抓取层级
///
/// 引擎链中的一个策略层，按成本严格升序排列
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Tier {
    /// 普通HTTP请求
    Http,
    /// 无头浏览器渲染
    Browser,
}

impl Tier {
    /// 层级名称
    pub fn name(&self) -> &'static str {
        match self {
            Tier::Http => "http",
            Tier::Browser => "browser",
        }
    }
}

/// 抓取任务
///
/// URL进入引擎时创建，终态成功或重试耗尽后销毁。
/// 生命周期内由引擎独占持有。
#[derive(Debug, Clone)]
pub struct FetchTask {
    /// 目标URL
    pub url: String,
    /// 当前层级内的尝试次数
    pub attempt: u32,
    /// 已到达的策略层级
    pub tier: Tier,
}

impl FetchTask {
    /// 创建新的抓取任务
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            attempt: 0,
            tier: Tier::Http,
        }
    }

    /// 升级到下一层级并重置尝试计数
    pub fn escalate(&mut self, tier: Tier) {
        self.tier = tier;
        self.attempt = 0;
    }
}

/// 抓取结果
///
/// 每个提交的URL恰好产生一个结果。生成后不可变，
/// 由提取阶段消费恰好一次。
#[derive(Debug, Clone)]
pub struct FetchOutcome {
    /// 目标URL
    pub url: String,
    /// 原始标记文本（成功时存在）
    pub markup: Option<String>,
    /// 是否成功
    pub succeeded: bool,
}

impl FetchOutcome {
    /// 成功结果
    pub fn success(url: impl Into<String>, markup: String) -> Self {
        Self {
            url: url.into(),
            markup: Some(markup),
            succeeded: true,
        }
    }

    /// 终态失败结果
    pub fn failure(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            markup: None,
            succeeded: false,
        }
    }
}
