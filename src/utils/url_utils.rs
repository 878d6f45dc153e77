// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use url::Url;

/// 提取URL的主机名（小写），供规则分发使用
pub fn host_of(url: &str) -> Option<String> {
    Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(|h| h.to_ascii_lowercase()))
}

/// 合成归档分页URL：`{base}?page={n}`
pub fn page_url(base_url: &str, page: u32) -> String {
    format!("{}?page={}", base_url.trim_end_matches('/'), page)
}
