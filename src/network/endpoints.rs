//! CORS 透传端点
//!
//! 四个第三方透传服务组成固定的回退序列，顺序即优先级。
//! 每个端点是一条 `{id, build}` 记录：把目标 URL 变换为可抓取的透传 URL
//! 的纯函数，不携带任何状态。

use percent_encoding::{utf8_percent_encode, AsciiSet};

/// 与 JS `encodeURIComponent` 等价的编码集：
/// 字母数字以及 `-_.!~*'()` 之外的字符全部转义
const COMPONENT_ENCODE_SET: &AsciiSet = &percent_encoding::NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// 按 encodeURIComponent 规则编码 URL
fn encode_component(value: &str) -> String {
    utf8_percent_encode(value, COMPONENT_ENCODE_SET).to_string()
}

/// 一个透传端点：标识加 URL 变换
pub struct ProxyEndpoint {
    /// 统计与日志中使用的端点标识
    pub id: &'static str,
    build: fn(&str) -> String,
}

impl ProxyEndpoint {
    /// 把目标 URL 变换为该端点的透传 URL
    pub fn build_url(&self, target: &str) -> String {
        (self.build)(target)
    }
}

/// 固定的端点序列，顺序定义回退优先级
pub fn default_endpoints() -> Vec<ProxyEndpoint> {
    vec![
        ProxyEndpoint {
            id: "allorigins",
            build: |url| format!("https://api.allorigins.win/raw?url={}", encode_component(url)),
        },
        ProxyEndpoint {
            id: "corsproxy-io",
            build: |url| format!("https://corsproxy.io/?{}", encode_component(url)),
        },
        ProxyEndpoint {
            id: "cors-anywhere",
            build: |url| format!("https://cors-anywhere.herokuapp.com/{}", url),
        },
        ProxyEndpoint {
            id: "bridged-cors",
            build: |url| format!("https://cors.bridged.cc/{}", url),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_order_is_fixed() {
        let ids: Vec<&str> = default_endpoints().iter().map(|e| e.id).collect();
        assert_eq!(
            ids,
            vec!["allorigins", "corsproxy-io", "cors-anywhere", "bridged-cors"]
        );
    }

    #[test]
    fn query_embedded_endpoints_encode_the_target() {
        let endpoints = default_endpoints();
        let target = "https://example.com/page?q=1&x=2";

        assert_eq!(
            endpoints[0].build_url(target),
            "https://api.allorigins.win/raw?url=https%3A%2F%2Fexample.com%2Fpage%3Fq%3D1%26x%3D2"
        );
        assert_eq!(
            endpoints[1].build_url(target),
            "https://corsproxy.io/?https%3A%2F%2Fexample.com%2Fpage%3Fq%3D1%26x%3D2"
        );
    }

    #[test]
    fn path_suffix_endpoints_keep_the_target_verbatim() {
        let endpoints = default_endpoints();
        let target = "https://example.com/page";

        assert_eq!(
            endpoints[2].build_url(target),
            "https://cors-anywhere.herokuapp.com/https://example.com/page"
        );
        assert_eq!(
            endpoints[3].build_url(target),
            "https://cors.bridged.cc/https://example.com/page"
        );
    }

    #[test]
    fn component_encoding_keeps_unreserved_marks() {
        assert_eq!(encode_component("a-b_c.d!e~f*g'h(i)j"), "a-b_c.d!e~f*g'h(i)j");
        assert_eq!(encode_component("a b/c"), "a%20b%2Fc");
    }
}
