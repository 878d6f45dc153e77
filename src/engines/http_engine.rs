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
use crate::engines::traits::{FetchEngine, FetchError, FetchRequest};
use async_trait::async_trait;
use rand::seq::IndexedRandom;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT_LANGUAGE, REFERER};
use tracing::debug;

/// 桌面与移动端混合的UA池，每次尝试随机轮换
const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) Chrome/124.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) Firefox/114.0",
    "Mozilla/5.0 (Linux; Android 10; SM-G975F) Chrome/118.0.0.0 Mobile Safari/537.36",
];

const ACCEPT_LANGUAGES: &[&str] = &["en-US,en;q=0.9", "en-GB,en;q=0.8", "fi-FI,fi;q=0.7"];

/// HTTP抓取引擎
///
/// 链中的第一层：廉价、无状态的普通GET请求。
/// 每次尝试随机化UA与Accept-Language，降低被识别为机器流量的概率。
pub struct HttpEngine;

#[async_trait]
impl FetchEngine for HttpEngine {
    /// 执行HTTP抓取
    ///
    /// # 参数
    ///
    /// * `request` - 抓取请求
    ///
    /// # 返回值
    ///
    /// * `Ok(String)` - 响应标记文本（仅2xx且非空）
    /// * `Err(FetchError)` - 抓取过程中出现的错误
    async fn fetch(&self, request: &FetchRequest) -> Result<String, FetchError> {
        let mut headers = HeaderMap::new();
        {
            let mut rng = rand::rng();
            if let Some(lang) = ACCEPT_LANGUAGES.choose(&mut rng) {
                if let Ok(v) = HeaderValue::from_str(lang) {
                    headers.insert(ACCEPT_LANGUAGE, v);
                }
            }
        }
        headers.insert(REFERER, HeaderValue::from_static("https://www.google.com/"));

        let user_agent = {
            let mut rng = rand::rng();
            USER_AGENTS
                .choose(&mut rng)
                .copied()
                .unwrap_or(USER_AGENTS[0])
        };

        // Each request gets a fresh client for cookie isolation
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(request.timeout)
            .cookie_store(true)
            .build()?;

        let response = match client.get(&request.url).headers(headers).send().await {
            Ok(r) => r,
            Err(e) => {
                // Distinguish the oversized-header signature from ordinary
                // transport failures before it gets retried to exhaustion
                let wrapped = FetchError::RequestFailed(e);
                if wrapped.is_structural() {
                    return Err(FetchError::HeaderOverflow);
                }
                return Err(wrapped);
            }
        };

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::BadStatus(status.as_u16()));
        }

        let body = response.text().await?;
        if body.trim().is_empty() {
            return Err(FetchError::EmptyBody);
        }

        debug!(url = %request.url, length = body.len(), "http fetch succeeded");
        Ok(body)
    }

    fn tier(&self) -> Tier {
        Tier::Http
    }
}
