//! URL 解析与绝对化工具
//!
//! 捕获到的页面里充满相对引用，重写阶段需要把它们全部换算成绝对 URL。
//! 这里的换算刻意采用纯前缀拼接策略（见 [`to_absolute`]），
//! 而不是完整的 RFC 3986 解析。

use crate::core::CaptureError;

pub use url::Url;

/// 被视为"已经绝对"的引用前缀
const ABSOLUTE_PREFIXES: &[&str] = &["http://", "https://", "data:", "#", "javascript:"];

/// 源 URL 解析一次后得到的各组成部分
///
/// 整个重写过程只解析一次源 URL，之后所有相对引用都基于这份结果换算。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedUrl {
    /// 协议，含冒号（如 `https:`）
    pub protocol: String,
    /// 主机，含端口（如果有）
    pub host: String,
    /// 源：`protocol + "//" + host`
    pub origin: String,
    /// 基础路径：原始 URL 截至最后一个 `/`（含）
    pub base_path: String,
    /// 基础 URL，与 `origin` 相同，供只需要主机前缀的调用方使用
    pub base_url: String,
}

/// 解析源 URL
///
/// 失败时返回 [`CaptureError::InvalidUrl`]。`base_path` 在原始字符串上计算
/// （截至最后一个 `/`），与浏览器端 `url.substring(0, lastIndexOf('/') + 1)`
/// 的行为保持一致。
pub fn parse_resolved(source_url: &str) -> Result<ResolvedUrl, CaptureError> {
    let parsed =
        Url::parse(source_url).map_err(|_| CaptureError::InvalidUrl(source_url.to_string()))?;

    let host = match (parsed.host_str(), parsed.port()) {
        (Some(host), Some(port)) => format!("{host}:{port}"),
        (Some(host), None) => host.to_string(),
        _ => return Err(CaptureError::InvalidUrl(source_url.to_string())),
    };

    let protocol = format!("{}:", parsed.scheme());
    let origin = format!("{protocol}//{host}");
    let base_path = match source_url.rfind('/') {
        Some(index) => source_url[..=index].to_string(),
        None => format!("{source_url}/"),
    };

    Ok(ResolvedUrl {
        base_url: origin.clone(),
        protocol,
        host,
        origin,
        base_path,
    })
}

/// 判断引用是否已经是绝对形式（含锚点与 javascript: 伪协议）
pub fn is_absolute_ref(reference: &str) -> bool {
    ABSOLUTE_PREFIXES
        .iter()
        .any(|prefix| reference.starts_with(prefix))
}

/// 将相对引用换算为绝对 URL
///
/// 规则：绝对引用原样返回；以 `/` 开头的引用拼接 `origin`；
/// 其余拼接 `base_path`。
///
/// 纯前缀拼接：不折叠 `..` 片段，也不去除重复斜杠。这是刻意保留的
/// 已知限制，下游的重写和测试都假定这种拼接语义。
pub fn to_absolute(reference: &str, resolved: &ResolvedUrl) -> String {
    if is_absolute_ref(reference) {
        reference.to_string()
    } else if reference.starts_with('/') {
        format!("{}{}", resolved.origin, reference)
    } else {
        format!("{}{}", resolved.base_path, reference)
    }
}

/// 调度前的协议检查：目标必须以 `http://` 或 `https://` 开头
pub fn is_url_and_has_protocol(value: &str) -> bool {
    value.starts_with("http://") || value.starts_with("https://")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_resolved_components() {
        let resolved = parse_resolved("https://example.com/dir/page.html").unwrap();

        assert_eq!(resolved.protocol, "https:");
        assert_eq!(resolved.host, "example.com");
        assert_eq!(resolved.origin, "https://example.com");
        assert_eq!(resolved.base_url, "https://example.com");
        assert_eq!(resolved.base_path, "https://example.com/dir/");
    }

    #[test]
    fn parse_resolved_keeps_port() {
        let resolved = parse_resolved("http://localhost:8080/a/b.html").unwrap();

        assert_eq!(resolved.host, "localhost:8080");
        assert_eq!(resolved.origin, "http://localhost:8080");
        assert_eq!(resolved.base_path, "http://localhost:8080/a/");
    }

    #[test]
    fn parse_resolved_host_only() {
        // 没有路径部分时最后一个 '/' 是 "//" 的第二个斜杠
        let resolved = parse_resolved("https://example.com").unwrap();

        assert_eq!(resolved.base_path, "https://");
    }

    #[test]
    fn parse_resolved_rejects_garbage() {
        assert!(matches!(
            parse_resolved("not a url"),
            Err(CaptureError::InvalidUrl(_))
        ));
    }

    #[test]
    fn absolute_ref_detection() {
        assert!(is_absolute_ref("http://example.com/x"));
        assert!(is_absolute_ref("https://example.com/x"));
        assert!(is_absolute_ref("data:image/png;base64,xyz"));
        assert!(is_absolute_ref("#top"));
        assert!(is_absolute_ref("javascript:void(0)"));

        assert!(!is_absolute_ref("pic.png"));
        assert!(!is_absolute_ref("/assets/pic.png"));
        assert!(!is_absolute_ref("../pic.png"));
        assert!(!is_absolute_ref("ftp://example.com/x"));
    }

    #[test]
    fn to_absolute_prefix_rules() {
        let resolved = parse_resolved("https://example.com/dir/page.html").unwrap();

        assert_eq!(
            to_absolute("pic.png", &resolved),
            "https://example.com/dir/pic.png"
        );
        assert_eq!(
            to_absolute("/assets/pic.png", &resolved),
            "https://example.com/assets/pic.png"
        );
        assert_eq!(
            to_absolute("https://cdn.example.com/pic.png", &resolved),
            "https://cdn.example.com/pic.png"
        );
    }

    #[test]
    fn to_absolute_is_idempotent_on_absolute_output() {
        let resolved = parse_resolved("https://example.com/dir/page.html").unwrap();

        let first = to_absolute("pic.png", &resolved);
        let second = to_absolute(&first, &resolved);
        assert_eq!(first, second);
    }

    #[test]
    fn to_absolute_does_not_collapse_dot_segments() {
        let resolved = parse_resolved("https://example.com/dir/page.html").unwrap();

        // 前缀拼接语义：`..` 原样保留
        assert_eq!(
            to_absolute("../pic.png", &resolved),
            "https://example.com/dir/../pic.png"
        );
    }

    #[test]
    fn protocol_check() {
        assert!(is_url_and_has_protocol("https://example.com"));
        assert!(is_url_and_has_protocol("http://example.com"));
        assert!(!is_url_and_has_protocol("example.com"));
        assert!(!is_url_and_has_protocol("file:///tmp/page.html"));
    }
}
