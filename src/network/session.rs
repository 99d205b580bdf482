//! 代理回退抓取会话
//!
//! 捕获页面时按固定顺序依次尝试各透传端点，直到拿到非空响应为止。
//! 每次尝试都会记入按端点统计的 [`ProxyStats`]；统计只用于诊断，
//! 不会改变端点顺序。请求严格串行，同一时刻最多一个在途请求。

use std::collections::{BTreeMap, HashMap, HashSet};
use std::time::Duration;

use chrono::{DateTime, SecondsFormat, Utc};
use encoding_rs::Encoding;
use reqwest::blocking::Client;
use reqwest::header::{self, HeaderMap, HeaderValue};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};

use crate::core::{CaptureError, CaptureOptions};

use super::endpoints::{default_endpoints, ProxyEndpoint};

/// 模拟浏览器的 User-Agent，随请求头一同发送
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// 传输层的原始响应
pub struct TransportResponse {
    /// HTTP 状态码
    pub status: u16,
    /// Content-Type 头，用于字符集探测
    pub content_type: Option<String>,
    /// 未解码的响应体
    pub body: Vec<u8>,
}

impl TransportResponse {
    /// 状态码是否表示成功（2xx）
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// 传输层错误：超时与其他网络错误分开计
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("request timed out")]
    Timeout,
    #[error("{0}")]
    Network(String),
}

/// 代理会话的 HTTP 传输接口
///
/// 构造注入的接缝：生产环境用 [`HttpTransport`]，测试用脚本化实现。
pub trait Transport {
    fn fetch(&self, url: &str) -> Result<TransportResponse, TransportError>;
}

/// 基于 reqwest 阻塞客户端的传输实现
///
/// 客户端只构造一次：固定请求头、单请求超时、不转发任何凭据。
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new(options: &CaptureOptions) -> Result<Self, CaptureError> {
        let user_agent = options
            .user_agent
            .clone()
            .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string());

        let mut headers = HeaderMap::new();
        headers.insert(
            header::USER_AGENT,
            HeaderValue::from_str(&user_agent).map_err(|_| {
                CaptureError::DependencyMissing("http transport: invalid user agent".to_string())
            })?,
        );
        headers.insert(
            header::ACCEPT,
            HeaderValue::from_static(
                "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
            ),
        );
        headers.insert(
            header::ACCEPT_LANGUAGE,
            HeaderValue::from_static("en-US,en;q=0.5"),
        );
        // Accept-Encoding 由 reqwest 的 gzip/brotli/deflate 特性自动携带，
        // 手工设置会关闭自动解压
        headers.insert(header::DNT, HeaderValue::from_static("1"));
        headers.insert(header::CONNECTION, HeaderValue::from_static("keep-alive"));
        headers.insert(header::PRAGMA, HeaderValue::from_static("no-cache"));
        headers.insert(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-cache"),
        );

        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(options.timeout))
            .build()
            .map_err(|e| {
                CaptureError::DependencyMissing(format!("http transport: {e}"))
            })?;

        Ok(HttpTransport { client })
    }
}

impl Transport for HttpTransport {
    fn fetch(&self, url: &str) -> Result<TransportResponse, TransportError> {
        let response = self.client.get(url).send().map_err(|e| {
            if e.is_timeout() {
                TransportError::Timeout
            } else {
                TransportError::Network(e.to_string())
            }
        })?;

        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(|value| value.to_string());
        let body = response
            .bytes()
            .map_err(|e| {
                if e.is_timeout() {
                    TransportError::Timeout
                } else {
                    TransportError::Network(e.to_string())
                }
            })?
            .to_vec();

        Ok(TransportResponse {
            status,
            content_type,
            body,
        })
    }
}

/// 单个端点的累积统计
///
/// 首次尝试时惰性创建，只增不减；除显式重置外不会清零。
#[derive(Debug, Clone, Default)]
pub struct ProxyStats {
    pub attempts: u64,
    pub successes: u64,
    pub failures: u64,
    pub last_used: Option<DateTime<Utc>>,
}

/// 统计的只读视图，含派生成功率，可直接序列化输出
#[derive(Debug, Clone, Serialize)]
pub struct ProxyStatsView {
    pub attempts: u64,
    pub successes: u64,
    pub failures: u64,
    pub last_used: Option<String>,
    pub success_rate: f64,
}

/// 最近一次失败的种类，决定耗尽时向上层报告什么
enum LastFailure {
    Timeout,
    Other(String),
}

/// 代理抓取会话
pub struct ProxySession {
    endpoints: Vec<ProxyEndpoint>,
    transport: Box<dyn Transport>,
    stats: HashMap<&'static str, ProxyStats>,
    ever_succeeded: HashSet<&'static str>,
    ever_failed: HashSet<&'static str>,
    options: CaptureOptions,
}

impl ProxySession {
    /// 用默认端点序列和真实 HTTP 传输构造会话
    pub fn new(options: CaptureOptions) -> Result<Self, CaptureError> {
        let transport = Box::new(HttpTransport::new(&options)?);
        Ok(Self::with_transport(default_endpoints(), transport, options))
    }

    /// 注入自定义端点与传输（测试用）
    pub fn with_transport(
        endpoints: Vec<ProxyEndpoint>,
        transport: Box<dyn Transport>,
        options: CaptureOptions,
    ) -> Self {
        ProxySession {
            endpoints,
            transport,
            stats: HashMap::new(),
            ever_succeeded: HashSet::new(),
            ever_failed: HashSet::new(),
            options,
        }
    }

    /// 依序尝试各端点抓取目标页面
    ///
    /// 成功条件：2xx 状态且响应体去除空白后非空。任一端点失败即换下一个；
    /// 全部失败时返回 [`CaptureError::ProxyExhausted`]（携带最后一次失败的
    /// 消息），最后一次失败是超时时返回 [`CaptureError::Timeout`]。
    pub fn fetch_through_proxies(&mut self, target: &str) -> Result<String, CaptureError> {
        let mut last_failure: Option<LastFailure> = None;

        for index in 0..self.endpoints.len() {
            let (endpoint_id, proxy_url) = {
                let endpoint = &self.endpoints[index];
                (endpoint.id, endpoint.build_url(target))
            };

            debug!(endpoint = endpoint_id, url = %proxy_url, "trying proxy endpoint");
            self.record_attempt(endpoint_id);

            match self.transport.fetch(&proxy_url) {
                Ok(response) if response.is_success() => {
                    let text = decode_body(&response);
                    if text.trim().is_empty() {
                        warn!(endpoint = endpoint_id, "empty response body");
                        self.record_failure(endpoint_id);
                        last_failure =
                            Some(LastFailure::Other("empty response received".to_string()));
                        continue;
                    }

                    debug!(endpoint = endpoint_id, "fetched content via proxy");
                    self.record_success(endpoint_id);
                    return Ok(text);
                }
                Ok(response) => {
                    warn!(
                        endpoint = endpoint_id,
                        status = response.status,
                        "proxy endpoint returned error status"
                    );
                    self.record_failure(endpoint_id);
                    last_failure = Some(LastFailure::Other(format!("HTTP {}", response.status)));
                }
                Err(TransportError::Timeout) => {
                    warn!(endpoint = endpoint_id, "proxy request timed out");
                    self.record_failure(endpoint_id);
                    last_failure = Some(LastFailure::Timeout);
                }
                Err(TransportError::Network(message)) => {
                    warn!(endpoint = endpoint_id, error = %message, "proxy request failed");
                    self.record_failure(endpoint_id);
                    last_failure = Some(LastFailure::Other(message));
                }
            }
        }

        match last_failure {
            Some(LastFailure::Timeout) => Err(CaptureError::Timeout(self.options.timeout)),
            Some(LastFailure::Other(message)) => {
                Err(CaptureError::ProxyExhausted { last_error: message })
            }
            None => Err(CaptureError::ProxyExhausted {
                last_error: "no proxy endpoints configured".to_string(),
            }),
        }
    }

    /// 读取累积统计，不产生任何修改
    pub fn stats(&self) -> BTreeMap<&'static str, ProxyStatsView> {
        self.stats
            .iter()
            .map(|(id, stats)| {
                let success_rate = if stats.attempts > 0 {
                    stats.successes as f64 / stats.attempts as f64
                } else {
                    0.0
                };
                (
                    *id,
                    ProxyStatsView {
                        attempts: stats.attempts,
                        successes: stats.successes,
                        failures: stats.failures,
                        last_used: stats
                            .last_used
                            .map(|t| t.to_rfc3339_opts(SecondsFormat::Secs, true)),
                        success_rate,
                    },
                )
            })
            .collect()
    }

    /// 曾经成功过的端点（仅诊断用）
    pub fn ever_succeeded(&self) -> &HashSet<&'static str> {
        &self.ever_succeeded
    }

    /// 曾经失败过的端点（仅诊断用）
    pub fn ever_failed(&self) -> &HashSet<&'static str> {
        &self.ever_failed
    }

    fn record_attempt(&mut self, id: &'static str) {
        let stats = self.stats.entry(id).or_default();
        stats.attempts += 1;
        stats.last_used = Some(Utc::now());
    }

    fn record_success(&mut self, id: &'static str) {
        let stats = self.stats.entry(id).or_default();
        stats.successes += 1;
        self.ever_succeeded.insert(id);
    }

    fn record_failure(&mut self, id: &'static str) {
        let stats = self.stats.entry(id).or_default();
        stats.failures += 1;
        self.ever_failed.insert(id);
    }
}

/// 按 Content-Type 声明的字符集解码响应体，缺省回退 UTF-8
fn decode_body(response: &TransportResponse) -> String {
    if let Some(charset) = response
        .content_type
        .as_deref()
        .and_then(charset_from_content_type)
    {
        if let Some(encoding) = Encoding::for_label(charset.as_bytes()) {
            let (text, _, _) = encoding.decode(&response.body);
            return text.into_owned();
        }
    }

    String::from_utf8_lossy(&response.body).into_owned()
}

/// 从 Content-Type 头里取出 charset 参数
fn charset_from_content_type(value: &str) -> Option<String> {
    for part in value.split(';').skip(1) {
        let part = part.trim();
        if let Some(charset) = part.strip_prefix("charset=") {
            return Some(charset.trim_matches('"').to_string());
        }
    }
    None
}
