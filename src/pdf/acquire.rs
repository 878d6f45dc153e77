// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::config::settings::PdfSettings;
use crate::pdf::sections;
use crate::pdf::{PdfDocument, PdfError};
use scraper::{Html, Selector};
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

/// PDF获取器
///
/// 严格升级的两段式策略：先尝试直接下载（结构化端点或页面内
/// 嵌入的PDF链接），失败再走交互式渲染拷贝回退。短于阈值的
/// 输出一律按该文档完全失败处理，绝不产出截断的"成功"。
pub struct PdfAcquirer {
    /// PDF获取配置
    settings: PdfSettings,
    /// 单次下载超时
    timeout: Duration,
}

/// 载荷分类结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Payload {
    /// 真PDF字节流
    Pdf,
    /// 已是纯文本
    Text,
}

/// 按魔数分类载荷：`%PDF`前缀为真PDF，其余视为已提取的文本
pub fn classify(bytes: &[u8]) -> Payload {
    if bytes.starts_with(b"%PDF") {
        Payload::Pdf
    } else {
        Payload::Text
    }
}

/// 从页面标记里找出PDF来源URL
///
/// 依次检查：URL本身以`.pdf`结尾、`citation_pdf_url`元数据、
/// 嵌入的PDF iframe、指向`.pdf`的链接。相对地址基于页面URL补全。
pub fn find_pdf_url(page_url: &str, markup: Option<&str>) -> Option<String> {
    if page_url.split('?').next().unwrap_or(page_url).ends_with(".pdf") {
        return Some(page_url.to_string());
    }
    let markup = markup?;
    let doc = Html::parse_document(markup);

    let meta_sel = Selector::parse(r#"meta[name="citation_pdf_url"]"#).unwrap();
    if let Some(content) = doc
        .select(&meta_sel)
        .next()
        .and_then(|n| n.value().attr("content"))
    {
        return resolve(page_url, content);
    }

    let iframe_sel = Selector::parse(r#"iframe[src*=".pdf"]"#).unwrap();
    if let Some(src) = doc
        .select(&iframe_sel)
        .next()
        .and_then(|n| n.value().attr("src"))
    {
        return resolve(page_url, src);
    }

    let anchor_sel = Selector::parse(r#"a[href$=".pdf"]"#).unwrap();
    doc.select(&anchor_sel)
        .next()
        .and_then(|n| n.value().attr("href"))
        .and_then(|href| resolve(page_url, href))
}

fn resolve(page_url: &str, candidate: &str) -> Option<String> {
    Url::parse(page_url)
        .and_then(|base| base.join(candidate))
        .map(|u| u.to_string())
        .ok()
}

/// lopdf逐页提取PDF文本
pub fn extract_pdf_text(bytes: &[u8]) -> Result<String, PdfError> {
    let doc = lopdf::Document::load_mem(bytes).map_err(|e| PdfError::Parse(e.to_string()))?;
    let mut pages_text = Vec::new();
    for page_number in doc.get_pages().keys() {
        // a single corrupt page should not void the rest of the document
        match doc.extract_text(&[*page_number]) {
            Ok(text) => pages_text.push(text),
            Err(e) => debug!(page = page_number, error = %e, "skipping unreadable pdf page"),
        }
    }
    Ok(pages_text.join("\n"))
}

impl PdfAcquirer {
    /// 创建新的获取器
    ///
    /// # 参数
    ///
    /// * `settings` - PDF获取配置
    /// * `timeout` - 单次下载超时
    pub fn new(settings: PdfSettings, timeout: Duration) -> Self {
        Self { settings, timeout }
    }

    /// 获取单个文档的全文并切分章节
    ///
    /// # 参数
    ///
    /// * `url` - 文档URL
    /// * `page_markup` - 已抓取的宿主页面标记（用于定位嵌入的PDF）
    ///
    /// # 返回值
    ///
    /// * `Ok(PdfDocument)` - 达到最小长度的全文与章节
    /// * `Err(PdfError)` - 两种策略均失败或文本过短
    pub async fn acquire(
        &self,
        url: &str,
        page_markup: Option<&str>,
    ) -> Result<PdfDocument, PdfError> {
        let text = match self.try_direct(url, page_markup).await {
            Ok(text) if text.len() >= self.settings.min_text_length => text,
            Ok(text) => {
                warn!(url = %url, length = text.len(), "direct pdf text below threshold, escalating");
                self.try_interactive(url).await?
            }
            Err(err) => {
                warn!(url = %url, error = %err, "direct pdf acquisition failed, escalating");
                self.try_interactive(url).await?
            }
        };

        if text.len() < self.settings.min_text_length {
            return Err(PdfError::BelowThreshold {
                length: text.len(),
                minimum: self.settings.min_text_length,
            });
        }

        let split = sections::split_sections(&text);
        info!(url = %url, length = text.len(), "pdf acquisition complete");
        Ok(PdfDocument {
            url: url.to_string(),
            text,
            abstract_text: split.abstract_text,
            conclusion: split.conclusion,
            references: split.references,
        })
    }

    /// 第一策略：定位PDF来源并直接下载
    async fn try_direct(&self, url: &str, page_markup: Option<&str>) -> Result<String, PdfError> {
        let pdf_url = find_pdf_url(url, page_markup).ok_or(PdfError::NoSource)?;
        debug!(url = %url, pdf_url = %pdf_url, "direct pdf download");

        // fresh client per download, same isolation discipline as the fetch tiers
        let client = reqwest::Client::builder()
            .timeout(self.timeout)
            .build()?;
        let bytes = client
            .get(&pdf_url)
            .send()
            .await?
            .error_for_status()?
            .bytes()
            .await?;

        match classify(&bytes) {
            Payload::Pdf => extract_pdf_text(&bytes),
            Payload::Text => Ok(String::from_utf8_lossy(&bytes).into_owned()),
        }
    }

    /// 第二策略：有头渲染上下文里的拷贝循环
    #[cfg(feature = "interactive")]
    async fn try_interactive(&self, url: &str) -> Result<String, PdfError> {
        use crate::pdf::interactive::run_copy_loop;
        use chromiumoxide::{Browser, BrowserConfig};
        use futures::StreamExt;
        use tokio::time::Instant;

        let config = BrowserConfig::builder()
            .with_head()
            .no_sandbox()
            .arg("--disable-dev-shm-usage")
            .build()
            .map_err(PdfError::Browser)?;
        let (mut browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| PdfError::Browser(e.to_string()))?;
        tokio::spawn(async move {
            while let Some(h) = handler.next().await {
                if h.is_err() {
                    break;
                }
            }
        });

        let page = browser
            .new_page(url)
            .await
            .map_err(|e| PdfError::Browser(e.to_string()))?;

        // 查看器渲染出足够的canvas节点才值得开始拷贝
        let canvas_deadline = Instant::now() + Duration::from_secs(self.settings.canvas_wait_secs);
        loop {
            let rendered = page
                .evaluate("document.querySelectorAll('canvas').length")
                .await
                .ok()
                .and_then(|v| v.into_value::<usize>().ok())
                .unwrap_or(0);
            if rendered >= self.settings.canvas_ready_count {
                debug!(url = %url, rendered, "pdf viewer canvases ready");
                break;
            }
            if Instant::now() >= canvas_deadline {
                warn!(url = %url, rendered, "canvas wait capped, copying anyway");
                break;
            }
            tokio::time::sleep(Duration::from_millis(500)).await;
        }

        let deadline = Duration::from_secs(self.settings.interactive_deadline_secs);
        let result = run_copy_loop(deadline, self.settings.min_text_length, |action| {
            let page = page.clone();
            async move {
                let _ = page.evaluate(action.script()).await;
                page.evaluate(
                    "(async () => { \
                       document.execCommand('selectAll'); \
                       document.execCommand('copy'); \
                       try { return await navigator.clipboard.readText(); } \
                       catch (e) { return window.getSelection().toString(); } \
                     })()",
                )
                .await
                .ok()
                .and_then(|v| v.into_value::<String>().ok())
            }
        })
        .await;

        let _ = browser.close().await;
        result.ok_or(PdfError::Deadline)
    }

    #[cfg(not(feature = "interactive"))]
    async fn try_interactive(&self, _url: &str) -> Result<String, PdfError> {
        Err(PdfError::InteractiveDisabled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_by_magic_bytes() {
        assert_eq!(classify(b"%PDF-1.7 rest of stream"), Payload::Pdf);
        assert_eq!(classify(b"plain extracted text"), Payload::Text);
        assert_eq!(classify(b""), Payload::Text);
    }

    #[test]
    fn test_find_pdf_url_direct_suffix() {
        assert_eq!(
            find_pdf_url("https://example.com/paper.pdf", None),
            Some("https://example.com/paper.pdf".to_string())
        );
        assert_eq!(
            find_pdf_url("https://example.com/paper.pdf?download=1", None),
            Some("https://example.com/paper.pdf?download=1".to_string())
        );
    }

    #[test]
    fn test_find_pdf_url_prefers_citation_meta() {
        let markup = r#"
            <head><meta name="citation_pdf_url" content="/files/paper.pdf"></head>
            <body><a href="/other.pdf">other</a></body>"#;
        assert_eq!(
            find_pdf_url("https://example.com/abs/1", Some(markup)),
            Some("https://example.com/files/paper.pdf".to_string())
        );
    }

    #[test]
    fn test_find_pdf_url_embedded_frame_and_anchor() {
        let frame = r#"<iframe src="https://cdn.example.com/doc.pdf#view"></iframe>"#;
        assert_eq!(
            find_pdf_url("https://example.com/view", Some(frame)),
            Some("https://cdn.example.com/doc.pdf#view".to_string())
        );

        let anchor = r#"<a href="paper.pdf">download</a>"#;
        assert_eq!(
            find_pdf_url("https://example.com/docs/view", Some(anchor)),
            Some("https://example.com/docs/paper.pdf".to_string())
        );
    }

    #[test]
    fn test_find_pdf_url_none_when_page_has_no_source() {
        assert_eq!(
            find_pdf_url("https://example.com/abs/1", Some("<html><body>no pdf</body></html>")),
            None
        );
        assert_eq!(find_pdf_url("https://example.com/abs/1", None), None);
    }
}
