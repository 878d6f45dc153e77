// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

pub mod acquire;
pub mod interactive;
pub mod sections;

pub use acquire::PdfAcquirer;
pub use interactive::{run_copy_loop, HumanAction};
pub use sections::{split_sections, Sections};

use thiserror::Error;

/// PDF获取错误
#[derive(Error, Debug)]
pub enum PdfError {
    /// 页面上找不到任何PDF来源
    #[error("no pdf source found on page")]
    NoSource,

    /// 下载失败
    #[error("pdf download failed: {0}")]
    Download(#[from] reqwest::Error),

    /// PDF解析失败
    #[error("pdf parse failed: {0}")]
    Parse(String),

    /// 文本长度不足判定阈值
    #[error("acquired text too short: {length} < {minimum}")]
    BelowThreshold {
        /// 实际获取长度
        length: usize,
        /// 判定阈值
        minimum: usize,
    },

    /// 浏览器操作失败
    #[error("browser error: {0}")]
    Browser(String),

    /// 交互式回退超出墙钟上限
    #[error("interactive fallback exceeded wall-clock deadline")]
    Deadline,

    /// 交互式回退未编译启用
    #[error("interactive fallback not enabled (build with the `interactive` feature)")]
    InteractiveDisabled,
}

/// 获取完成的PDF文档
///
/// 全文加三个启发式切分出的章节。缺失的章节为空串，
/// 全文本身保证达到配置的最小长度。
#[derive(Debug, Clone)]
pub struct PdfDocument {
    /// 来源URL
    pub url: String,
    /// 全文文本
    pub text: String,
    /// 摘要章节
    pub abstract_text: String,
    /// 结论章节
    pub conclusion: String,
    /// 参考文献章节
    pub references: String,
}
