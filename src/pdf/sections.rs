// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

//! 章节切分
//!
//! 对提取出的全文做三次互不依赖的扫描：摘要、结论、参考文献。
//! 每个章节从其标题行延伸到下一个标题样式的行或文末。
//! 纯启发式，针对论文类PDF的常见排版，不保证对任意文档成立。

use once_cell::sync::Lazy;
use regex::Regex;

static ABSTRACT_RE: Lazy<Regex> =
    Lazy::new(|| header_pattern("ABSTRACT|Abstract"));
static CONCLUSION_RE: Lazy<Regex> =
    Lazy::new(|| header_pattern("CONCLUSIONS?|Conclusions?"));
static REFERENCES_RE: Lazy<Regex> =
    Lazy::new(|| header_pattern("REFERENCES|References|BIBLIOGRAPHY|Bibliography"));

/// 标题行匹配：可选编号前缀 + 关键字 + 可选冒号/句点 + 同行余文
fn header_pattern(keywords: &str) -> Regex {
    // the pattern is built from literal fragments and cannot fail
    Regex::new(&format!(r"^\s*(?:\d+\.?\s*)?(?:{keywords})\s*[:.]?\s*(.*)$")).unwrap()
}

/// 切分出的章节集合
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Sections {
    /// 摘要（未找到则为空串）
    pub abstract_text: String,
    /// 结论（未找到则为空串）
    pub conclusion: String,
    /// 参考文献（未找到则为空串）
    pub references: String,
}

/// 从全文切分摘要/结论/参考文献
pub fn split_sections(text: &str) -> Sections {
    Sections {
        abstract_text: capture_section(text, &ABSTRACT_RE),
        conclusion: capture_section(text, &CONCLUSION_RE),
        references: capture_section(text, &REFERENCES_RE),
    }
}

/// 从标题行收集到下一个标题样式的行
fn capture_section(text: &str, header: &Regex) -> String {
    let mut lines = text.lines();
    let mut collected: Vec<&str> = Vec::new();
    let mut inside = false;

    for line in &mut lines {
        if !inside {
            if let Some(caps) = header.captures(line) {
                inside = true;
                if let Some(rest) = caps.get(1) {
                    let rest = rest.as_str().trim();
                    if !rest.is_empty() {
                        collected.push(rest);
                    }
                }
            }
            continue;
        }
        if looks_like_heading(line) {
            break;
        }
        collected.push(line.trim());
    }

    collected
        .into_iter()
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// 标题样式判定：短行、词数少、大写或数字开头、无终止标点
fn looks_like_heading(line: &str) -> bool {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.len() > 60 {
        return false;
    }
    if trimmed.ends_with(['.', ',', ';', ':', '?', '!']) {
        return false;
    }
    let mut chars = trimmed.chars();
    let leads_upper = matches!(chars.next(), Some(c) if c.is_ascii_uppercase() || c.is_ascii_digit());
    leads_upper && trimmed.split_whitespace().count() <= 6
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAPER: &str = "\
Resilient Mooring Systems\n\
\n\
Abstract\n\
We study mooring line fatigue under cyclic loading.\n\
Results generalize to floating wind platforms.\n\
\n\
1. Introduction\n\
Mooring failures are costly. The rest of this paper describes them.\n\
\n\
5. Conclusions\n\
Fatigue life doubles with the proposed damper.\n\
\n\
References\n\
[1] A. Author, Fatigue of chains, 2019.\n\
[2] B. Writer, Mooring dynamics, 2021.\n";

    #[test]
    fn test_all_three_sections_found() {
        let sections = split_sections(PAPER);
        assert!(sections.abstract_text.contains("mooring line fatigue"));
        assert!(sections.abstract_text.contains("floating wind platforms"));
        assert!(!sections.abstract_text.contains("Introduction"));
        assert!(sections.conclusion.contains("Fatigue life doubles"));
        assert!(sections.references.contains("[1] A. Author"));
        assert!(sections.references.contains("[2] B. Writer"));
    }

    #[test]
    fn test_missing_references_yields_empty_string_only_for_references() {
        let truncated = PAPER.split("References").next().unwrap();
        let sections = split_sections(truncated);
        assert!(sections.references.is_empty());
        assert!(!sections.abstract_text.is_empty());
        assert!(!sections.conclusion.is_empty());
    }

    #[test]
    fn test_inline_header_content_is_kept() {
        let text = "Abstract: This one-line abstract sits on the header line.\n\nIntroduction\nBody.";
        let sections = split_sections(text);
        assert_eq!(
            sections.abstract_text,
            "This one-line abstract sits on the header line."
        );
    }

    #[test]
    fn test_section_stops_at_numbered_heading() {
        let text = "Conclusion\nShort summary.\n2 Future Work\nNot part of it.";
        let sections = split_sections(text);
        assert_eq!(sections.conclusion, "Short summary.");
    }

    #[test]
    fn test_no_headers_at_all() {
        assert_eq!(split_sections("just some flat text"), Sections::default());
    }
}
