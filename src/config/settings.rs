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

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::time::Duration;

/// 引擎配置设置
///
/// 包含抓取引擎、节奏控制、归档遍历和PDF获取的所有配置项。
/// 阈值均为针对目标站点经验调优的值，不应视为正式契约。
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// 抓取引擎配置
    pub engine: EngineSettings,
    /// 节奏控制配置
    pub pacing: PacingSettings,
    /// 归档遍历配置
    pub archive: ArchiveSettings,
    /// PDF获取配置
    pub pdf: PdfSettings,
}

/// 抓取引擎配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct EngineSettings {
    /// 并发抓取上限
    pub concurrency: usize,
    /// HTTP层最大重试次数
    pub http_retries: u32,
    /// 浏览器层最大重试次数
    pub browser_retries: u32,
    /// 单次HTTP请求超时（秒）
    pub request_timeout_secs: u64,
    /// 单次浏览器渲染超时（秒）
    pub render_timeout_secs: u64,
    /// 浏览器渲染后的静置等待（毫秒）
    pub render_settle_ms: u64,
}

/// 节奏控制配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct PacingSettings {
    /// 冷却窗口下限（秒）
    pub cooldown_min_secs: f64,
    /// 冷却窗口上限（秒）
    pub cooldown_max_secs: f64,
    /// 长暂停触发阈值下限（秒）
    pub long_pause_after_min_secs: u64,
    /// 长暂停触发阈值上限（秒）
    pub long_pause_after_max_secs: u64,
    /// 长暂停窗口下限（秒）
    pub long_pause_min_secs: u64,
    /// 长暂停窗口上限（秒）
    pub long_pause_max_secs: u64,
}

/// 归档遍历配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct ArchiveSettings {
    /// 未发现分页控件时的页数上限
    pub max_pages_fallback: u32,
    /// 每处理多少页后插入礼貌性暂停
    pub pause_every_pages: u32,
    /// 礼貌性暂停下限（秒）
    pub pause_min_secs: f64,
    /// 礼貌性暂停上限（秒）
    pub pause_max_secs: f64,
}

/// PDF获取配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct PdfSettings {
    /// 视为渲染就绪的canvas节点数
    pub canvas_ready_count: usize,
    /// 等待canvas渲染的上限（秒）
    pub canvas_wait_secs: u64,
    /// 判定获取成功的最小文本长度
    pub min_text_length: usize,
    /// 交互式剪贴板回退的硬性墙钟上限（秒）
    pub interactive_deadline_secs: u64,
}

impl EngineSettings {
    /// HTTP请求超时
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// 浏览器渲染超时
    pub fn render_timeout(&self) -> Duration {
        Duration::from_secs(self.render_timeout_secs)
    }
}

impl Settings {
    /// 创建新的配置实例
    ///
    /// 从环境变量加载配置，支持默认值
    ///
    /// # Returns
    ///
    /// * `Ok(Settings)` - 成功加载的配置
    /// * `Err(ConfigError)` - 配置加载失败
    pub fn new() -> Result<Self, ConfigError> {
        let env = std::env::var("APP_ENVIRONMENT").unwrap_or_else(|_| "default".to_string());
        let builder = Config::builder()
            // Default engine settings
            .set_default("engine.concurrency", 10)?
            .set_default("engine.http_retries", 5)?
            .set_default("engine.browser_retries", 8)?
            .set_default("engine.request_timeout_secs", 10)?
            .set_default("engine.render_timeout_secs", 15)?
            .set_default("engine.render_settle_ms", 1000)?
            // Default pacing settings
            .set_default("pacing.cooldown_min_secs", 4.0)?
            .set_default("pacing.cooldown_max_secs", 6.0)?
            .set_default("pacing.long_pause_after_min_secs", 700)?
            .set_default("pacing.long_pause_after_max_secs", 1100)?
            .set_default("pacing.long_pause_min_secs", 30)?
            .set_default("pacing.long_pause_max_secs", 60)?
            // Default archive settings
            .set_default("archive.max_pages_fallback", 30)?
            .set_default("archive.pause_every_pages", 25)?
            .set_default("archive.pause_min_secs", 4.0)?
            .set_default("archive.pause_max_secs", 10.0)?
            // Default pdf settings
            .set_default("pdf.canvas_ready_count", 5)?
            .set_default("pdf.canvas_wait_secs", 30)?
            .set_default("pdf.min_text_length", 500)?
            .set_default("pdf.interactive_deadline_secs", 120)?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            .add_source(Environment::with_prefix("HARVESTRS").separator("__"));

        builder.build()?.try_deserialize()
    }
}

impl Default for Settings {
    /// 与`new()`的默认值保持一致，供测试和纯库调用方使用
    fn default() -> Self {
        Self {
            engine: EngineSettings {
                concurrency: 10,
                http_retries: 5,
                browser_retries: 8,
                request_timeout_secs: 10,
                render_timeout_secs: 15,
                render_settle_ms: 1000,
            },
            pacing: PacingSettings {
                cooldown_min_secs: 4.0,
                cooldown_max_secs: 6.0,
                long_pause_after_min_secs: 700,
                long_pause_after_max_secs: 1100,
                long_pause_min_secs: 30,
                long_pause_max_secs: 60,
            },
            archive: ArchiveSettings {
                max_pages_fallback: 30,
                pause_every_pages: 25,
                pause_min_secs: 4.0,
                pause_max_secs: 10.0,
            },
            pdf: PdfSettings {
                canvas_ready_count: 5,
                canvas_wait_secs: 30,
                min_text_length: 500,
                interactive_deadline_secs: 120,
            },
        }
    }
}

#[cfg(test)]
#[path = "settings_test.rs"]
mod tests;
