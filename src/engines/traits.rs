// Copyright 2025 Kirky.X
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use crate::domain::models::Tier;
use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// 引擎错误类型
#[derive(Error, Debug)]
pub enum FetchError {
    /// 请求失败
    #[error("Request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),
    /// 非2xx状态码
    #[error("HTTP status {0}")]
    BadStatus(u16),
    /// 响应体为空
    #[error("Empty response body")]
    EmptyBody,
    /// 响应头超限（目标站点的反爬特征之一）
    #[error("Oversized response headers")]
    HeaderOverflow,
    /// 超时
    #[error("Timeout")]
    Timeout,
    /// 浏览器错误
    #[error("Browser error: {0}")]
    Browser(String),
    /// 所有层级都失败
    #[error("All tiers exhausted")]
    AllTiersExhausted,
}

impl FetchError {
    /// 判断错误是否为结构性失败
    ///
    /// 结构性失败意味着当前层级从根本上无法取回内容，
    /// 应立即升级到下一层级而非同层重试。
    ///
    /// # 返回值
    ///
    /// 如果错误是结构性的则返回true，否则返回false
    pub fn is_structural(&self) -> bool {
        match self {
            FetchError::HeaderOverflow => true,
            FetchError::RequestFailed(e) => {
                // hyper surfaces oversized headers as a parse error; the two
                // failure domains must not be conflated with plain transport errors
                let text = format!("{:?}", e).to_lowercase();
                text.contains("message head is too large") || text.contains("header overflow")
            }
            _ => false,
        }
    }

    /// 判断错误是否可在同层重试
    ///
    /// # 返回值
    ///
    /// 如果错误是可重试的则返回true，否则返回false
    pub fn is_retryable(&self) -> bool {
        match self {
            FetchError::RequestFailed(e) => {
                e.is_timeout() || e.is_connect() || e.status().is_some_and(|s| s.is_server_error())
            }
            FetchError::BadStatus(_) => true,
            FetchError::EmptyBody => true,
            FetchError::Timeout => true,
            FetchError::Browser(_) => true,
            _ => false,
        }
    }
}

/// 抓取请求
#[derive(Debug, Clone)]
pub struct FetchRequest {
    /// 目标URL
    pub url: String,
    /// 单次请求/渲染超时
    pub timeout: Duration,
    /// 渲染后的静置等待（仅浏览器层使用）
    pub settle: Duration,
}

impl FetchRequest {
    /// 创建新的抓取请求
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            timeout: Duration::from_secs(10),
            settle: Duration::from_secs(1),
        }
    }
}

/// 抓取引擎特质
///
/// 链中的每一层实现该特质。接受标准：2xx状态且响应体非空。
#[async_trait]
pub trait FetchEngine: Send + Sync {
    /// 执行抓取，返回可渲染的标记文本
    async fn fetch(&self, request: &FetchRequest) -> Result<String, FetchError>;

    /// 引擎所处层级
    fn tier(&self) -> Tier;

    /// 引擎名称
    fn name(&self) -> &'static str {
        self.tier().name()
    }
}
