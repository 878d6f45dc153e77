// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::Tier;
use crate::engines::traits::{FetchEngine, FetchError, FetchRequest};
use async_trait::async_trait;
use chromiumoxide::{Browser, BrowserConfig};
use futures::StreamExt;
use rand::seq::IndexedRandom;
use std::time::{Duration, Instant};
use tracing::debug;

const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) Chrome/124.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) Firefox/114.0",
    "Mozilla/5.0 (Linux; Android 10; SM-G975F) Chrome/118.0.0.0 Mobile Safari/537.36",
];

/// 浏览器渲染引擎
///
/// 链中的第二层：无头浏览器完整渲染。用于纯JS页面，
/// 或第一层命中响应头超限特征的站点。
///
/// 每次尝试启动独立的浏览器实例（全新cookie与指纹），
/// 昂贵但与之前的尝试不共享任何可被关联的状态。
pub struct BrowserEngine;

impl BrowserEngine {
    /// 启动一次性浏览器实例
    async fn launch(timeout: Duration) -> Result<Browser, FetchError> {
        let config = BrowserConfig::builder()
            .no_sandbox()
            .request_timeout(timeout)
            .arg("--disable-gpu")
            .arg("--disable-dev-shm-usage")
            .build()
            .map_err(FetchError::Browser)?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| FetchError::Browser(e.to_string()))?;

        // Spawn a handler to process browser events
        tokio::spawn(async move {
            while let Some(h) = handler.next().await {
                if h.is_err() {
                    break;
                }
            }
        });

        Ok(browser)
    }

    /// 等待文档body出现且非空
    async fn wait_for_body(
        page: &chromiumoxide::Page,
        deadline: Instant,
    ) -> Result<(), FetchError> {
        loop {
            let has_body = page
                .evaluate("document.body !== null && document.body.innerText.trim().length > 0")
                .await
                .ok()
                .and_then(|v| v.into_value::<bool>().ok())
                .unwrap_or(false);

            if has_body {
                return Ok(());
            }
            if Instant::now() >= deadline {
                return Err(FetchError::Timeout);
            }
            tokio::time::sleep(Duration::from_millis(200)).await;
        }
    }
}

#[async_trait]
impl FetchEngine for BrowserEngine {
    /// 执行浏览器渲染抓取
    ///
    /// # 参数
    ///
    /// * `request` - 抓取请求
    ///
    /// # 返回值
    ///
    /// * `Ok(String)` - 渲染完成后的完整标记文本
    /// * `Err(FetchError)` - 抓取过程中出现的错误
    async fn fetch(&self, request: &FetchRequest) -> Result<String, FetchError> {
        let user_agent = {
            let mut rng = rand::rng();
            USER_AGENTS
                .choose(&mut rng)
                .copied()
                .unwrap_or(USER_AGENTS[0])
        };
        let settle = request.settle;

        // Wrap the entire operation in a timeout
        let result = tokio::time::timeout(request.timeout, async {
            let mut browser = Self::launch(request.timeout).await?;

            let page = browser
                .new_page("about:blank")
                .await
                .map_err(|e| FetchError::Browser(e.to_string()))?;

            page.set_user_agent(user_agent)
                .await
                .map_err(|e| FetchError::Browser(e.to_string()))?;

            page.goto(&request.url)
                .await
                .map_err(|e| FetchError::Browser(e.to_string()))?;

            // 等待客户端渲染出正文，再静置片刻让延迟加载的内容落位
            let deadline = Instant::now() + request.timeout;
            Self::wait_for_body(&page, deadline).await?;
            tokio::time::sleep(settle).await;

            let content = page
                .content()
                .await
                .map_err(|e| FetchError::Browser(e.to_string()))?;

            if content.trim().is_empty() {
                return Err(FetchError::EmptyBody);
            }

            // The instance is disposable; close it so fingerprints never accumulate
            let _ = browser.close().await;

            debug!(url = %request.url, length = content.len(), "browser render succeeded");
            Ok(content)
        })
        .await;

        match result {
            Ok(inner) => inner,
            Err(_) => Err(FetchError::Timeout),
        }
    }

    fn tier(&self) -> Tier {
        Tier::Browser
    }
}
