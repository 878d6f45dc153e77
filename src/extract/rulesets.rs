// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

//! 内置提取规则集
//!
//! 每个站点族一个命名规则集。选择器为编译期常量字符串，
//! 解析失败属于编程错误，由分发器的字段级隔离兜底。

use crate::domain::models::FieldValue;
use crate::extract::rules::RuleSet;
use scraper::{Html, Selector};

/// 首个匹配节点的文本（去首尾空白），未命中返回空串
fn first_text(doc: &Html, selector: &str) -> String {
    let sel = Selector::parse(selector).unwrap();
    doc.select(&sel)
        .next()
        .map(|node| collapse(node.text()))
        .unwrap_or_default()
}

/// 首个匹配节点的属性值，未命中返回空串
fn first_attr(doc: &Html, selector: &str, attr: &str) -> String {
    let sel = Selector::parse(selector).unwrap();
    doc.select(&sel)
        .next()
        .and_then(|node| node.value().attr(attr))
        .unwrap_or_default()
        .to_string()
}

/// 所有匹配节点的文本以空格连接
fn all_text_joined(doc: &Html, selector: &str) -> String {
    let sel = Selector::parse(selector).unwrap();
    doc.select(&sel)
        .map(|node| collapse(node.text()))
        .filter(|text| !text.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// 所有匹配节点的文本列表
fn all_texts(doc: &Html, selector: &str) -> Vec<String> {
    let sel = Selector::parse(selector).unwrap();
    doc.select(&sel)
        .map(|node| collapse(node.text()))
        .filter(|text| !text.is_empty())
        .collect()
}

/// 把文本迭代器折叠成单个去重空白的字符串
fn collapse<'a>(parts: impl Iterator<Item = &'a str>) -> String {
    parts
        .flat_map(|part| part.split_whitespace())
        .collect::<Vec<_>>()
        .join(" ")
}

/// 在专利事件时间线里按事件标题取日期
///
/// `dd[itemprop='events']`节点下同时匹配标题span与时间time时，
/// 返回time的datetime属性。
fn event_date_by_title(doc: &Html, title_text: &str) -> String {
    let event_sel = Selector::parse("dd[itemprop='events']").unwrap();
    let title_sel = Selector::parse("span[itemprop='title']").unwrap();
    let date_sel = Selector::parse("time[itemprop='date']").unwrap();

    for event in doc.select(&event_sel) {
        let title = event.select(&title_sel).next().map(|n| collapse(n.text()));
        if title.as_deref() != Some(title_text) {
            continue;
        }
        if let Some(datetime) = event
            .select(&date_sel)
            .next()
            .and_then(|n| n.value().attr("datetime"))
        {
            return datetime.to_string();
        }
    }
    String::new()
}

fn text_or_empty(value: String) -> FieldValue {
    if value.is_empty() {
        FieldValue::Empty
    } else {
        FieldValue::Text(value)
    }
}

/// 通用文章规则集：itemprop元数据驱动的标题/日期/正文/配图
pub fn basic_article() -> RuleSet {
    RuleSet::new("basic_article")
        .field("title", |doc| {
            text_or_empty(first_attr(doc, r#"meta[itemprop="headline"]"#, "content"))
        })
        .field("date", |doc| {
            text_or_empty(first_attr(doc, r#"meta[itemprop="datePublished"]"#, "content"))
        })
        .field("text", |doc| {
            text_or_empty(first_text(doc, r#"[itemprop="text"]"#))
        })
        .field("image", |doc| {
            text_or_empty(first_attr(doc, r#"meta[itemprop="image"]"#, "content"))
        })
}

/// oedigital规则集：标题取title标签，日期取time的datetime属性
pub fn oedigital() -> RuleSet {
    RuleSet::new("oedigital")
        .field("title", |doc| text_or_empty(first_text(doc, "title")))
        .field("date", |doc| {
            text_or_empty(first_attr(doc, r#"time[itemprop="datePublished"]"#, "datetime"))
        })
        .field("text", |doc| {
            text_or_empty(first_text(doc, r#"[property="articleBody"]"#))
        })
        .field("image", |doc| {
            text_or_empty(first_attr(doc, ".images-wrapper img", "src"))
        })
}

/// 谷歌专利规则集
///
/// 标题来自`<title>`按" - "切分后的第二段；引用关系与相似文献为列表；
/// 授权与预计过期日期从事件时间线按事件标题匹配。
pub fn google_patents() -> RuleSet {
    RuleSet::new("google_patents")
        .field("title", |doc| {
            let raw = first_text(doc, "title");
            match raw.split_once(" - ") {
                Some((_, rest)) => {
                    // "US1234567A - Widget - Google Patents" keeps the middle segment
                    let middle = rest.rsplit_once(" - ").map(|(m, _)| m).unwrap_or(rest);
                    text_or_empty(middle.trim().to_string())
                }
                None => FieldValue::Empty,
            }
        })
        .field("abstract", |doc| {
            let joined = all_text_joined(
                doc,
                "section[itemprop='abstract'] div[itemprop='content'] .abstract",
            );
            if !joined.is_empty() {
                return FieldValue::Text(joined);
            }
            text_or_empty(first_text(
                doc,
                "section[itemprop='abstract'] div[itemprop='content']",
            ))
        })
        .field("claims", |doc| {
            text_or_empty(all_text_joined(doc, "claim-text, div.claim-text"))
        })
        .field("description", |doc| {
            text_or_empty(all_text_joined(
                doc,
                "div[itemprop='content'] .description-paragraph",
            ))
        })
        .field("cited_by", |doc| {
            FieldValue::List(all_texts(
                doc,
                "tr[itemprop='forwardReferencesOrig'] span[itemprop='publicationNumber']",
            ))
        })
        .field("citations", |doc| {
            FieldValue::List(all_texts(
                doc,
                "tr[itemprop='backwardReferencesOrig'] span[itemprop='publicationNumber']",
            ))
        })
        .field("similar_documents", |doc| {
            FieldValue::List(all_texts(
                doc,
                "tr[itemprop='similarDocuments'] span[itemprop='publicationNumber']",
            ))
        })
        .field("priority_date", |doc| {
            text_or_empty(first_attr(doc, "time[itemprop='priorityDate']", "datetime"))
        })
        .field("publication_date", |doc| {
            text_or_empty(first_attr(
                doc,
                "time[itemprop='publicationDate']",
                "datetime",
            ))
        })
        .field("application_granted", |doc| {
            text_or_empty(event_date_by_title(doc, "Application granted"))
        })
        .field("approx_expiration", |doc| {
            text_or_empty(event_date_by_title(doc, "Anticipated expiration"))
        })
        .field("status", |doc| {
            text_or_empty(first_text(doc, "span[itemprop='status']"))
        })
}

/// 归档列表页规则集
///
/// 列表页同一锚点同时携带标题与日期，三个字段用同一过滤条件遍历，
/// 保证列表按下标对齐。链接保留原始href，由遍历器基于根URL补全。
pub fn archive_listing() -> RuleSet {
    RuleSet::new("archive_listing")
        .field("headlines", |doc| {
            FieldValue::List(listing_entries(doc, ListingPart::Headline))
        })
        .field("dates", |doc| {
            FieldValue::List(listing_entries(doc, ListingPart::Date))
        })
        .field("links", |doc| {
            FieldValue::List(listing_entries(doc, ListingPart::Href))
        })
}

#[derive(Clone, Copy)]
enum ListingPart {
    Headline,
    Date,
    Href,
}

fn listing_entries(doc: &Html, part: ListingPart) -> Vec<String> {
    let anchor_sel = Selector::parse("a[href^='/news/']").unwrap();
    let headline_sel = Selector::parse("h3").unwrap();
    let date_sel = Selector::parse("div.date").unwrap();

    let mut entries = Vec::new();
    for anchor in doc.select(&anchor_sel) {
        let headline = anchor.select(&headline_sel).next();
        let date = anchor.select(&date_sel).next();
        // entries missing either part are skipped in every pass, keeping indices aligned
        let (headline, date) = match (headline, date) {
            (Some(h), Some(d)) => (h, d),
            _ => continue,
        };
        let value = match part {
            ListingPart::Headline => collapse(headline.text()),
            ListingPart::Date => collapse(date.text()),
            ListingPart::Href => anchor.value().attr("href").unwrap_or_default().to_string(),
        };
        entries.push(value);
    }
    entries
}
