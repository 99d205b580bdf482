//! # 核心模块
//!
//! 捕获管线的数据模型、错误分类与调度器：
//!
//! - [`CaptureMode`] / [`CaptureRequest`] / [`CaptureOptions`] - 请求模型
//! - [`CaptureError`] - 统一的错误分类
//! - [`DisplaySink`] / [`FrameSource`] - 宿主协作方接口
//! - [`CaptureDispatcher`] - 按模式路由到代理抓取或交互捕获
//!
//! 协作方一律通过构造注入，不存在运行期的全局查找。

use std::collections::BTreeMap;
use std::str::FromStr;

use thiserror::Error;
use tracing::debug;

use crate::builders::{build_capture_surface, EditorBuilder};
use crate::network::session::{ProxySession, ProxyStatsView};
use crate::parsers::html::rewrite_document;
use crate::utils::url::is_url_and_has_protocol;

/// 单个代理请求的默认超时（秒）
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 30;
/// 动态捕获默认的额外等待秒数
pub const DEFAULT_WAIT_SECONDS: u64 = 2;
/// 额外等待秒数的上限，超出部分被收拢
pub const MAX_WAIT_SECONDS: u64 = 30;

/// 捕获管线的错误分类
///
/// 单个端点的失败不会出现在这里：它们在抓取会话内部转化为下一次
/// 回退尝试，只有全部耗尽才以 [`CaptureError::ProxyExhausted`] 浮出。
/// `CrossOriginBlocked`、`DisplaySinkBlocked`、`SaveFailed` 由宿主的
/// 协作方实现返回。任何错误都不是致命的：失败后会话状态保持一致，
/// 换个模式或 URL 即可重试。
#[derive(Debug, Error)]
pub enum CaptureError {
    /// 目标不是以 http(s) 开头的格式良好的绝对 URL
    #[error("invalid URL: {0}")]
    InvalidUrl(String),
    /// 抓到的内容无法解析出可用的文档骨架
    #[error("could not parse the webpage HTML: {0}")]
    Parse(String),
    /// 所有透传端点都失败了
    #[error("failed to fetch the webpage content through any available proxy (last error: {last_error})")]
    ProxyExhausted { last_error: String },
    /// 最后一次尝试因超时失败
    #[error("request timed out after {0} seconds")]
    Timeout(u64),
    /// 宿主无法读取 frame 文档（跨源限制）；不自动重试
    #[error("cannot access frame content due to cross-origin restrictions")]
    CrossOriginBlocked,
    /// 无法识别的捕获模式字符串
    #[error("unknown capture mode: {0}")]
    UnknownCaptureMode(String),
    /// 编辑器文档装配失败（启动/集成故障）
    #[error("failed to build the editor document: {0}")]
    EditorBuild(String),
    /// 显示面无法打开（例如弹窗被拦截）
    #[error("could not open a display surface: {0}")]
    DisplaySinkBlocked(String),
    /// 导出序列化阶段失败
    #[error("failed to save the page: {0}")]
    SaveFailed(String),
    /// 构造期缺少必需的协作方
    #[error("required collaborator missing: {0}")]
    DependencyMissing(String),
}

/// 捕获模式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureMode {
    /// 同窗直读：live iframe 的 DOM，不走网络抓取
    Iframe,
    /// 代理抓取，立即可编辑
    Static,
    /// 代理抓取，延迟进入可编辑状态以等待脚本安定
    Dynamic,
}

impl CaptureMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            CaptureMode::Iframe => "iframe",
            CaptureMode::Static => "static",
            CaptureMode::Dynamic => "dynamic",
        }
    }
}

impl FromStr for CaptureMode {
    type Err = CaptureError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_lowercase().as_str() {
            "iframe" => Ok(CaptureMode::Iframe),
            "static" => Ok(CaptureMode::Static),
            "dynamic" => Ok(CaptureMode::Dynamic),
            _ => Err(CaptureError::UnknownCaptureMode(value.to_string())),
        }
    }
}

/// 运行配置
///
/// 覆盖网络抓取与输出装配共享的少量参数。
#[derive(Debug, Clone)]
pub struct CaptureOptions {
    /// 单个代理请求的超时（秒）
    pub timeout: u64,
    /// 自定义 User-Agent，缺省用内置的浏览器模拟值
    pub user_agent: Option<String>,
    /// 安静模式：抑制非错误输出
    pub silent: bool,
}

impl Default for CaptureOptions {
    fn default() -> Self {
        CaptureOptions {
            timeout: DEFAULT_TIMEOUT_SECONDS,
            user_agent: None,
            silent: false,
        }
    }
}

/// 一次捕获请求；构造校验后不再变化
#[derive(Debug, Clone)]
pub struct CaptureRequest {
    url: String,
    mode: CaptureMode,
    wait_seconds: u64,
}

impl CaptureRequest {
    /// 构造请求：目标必须以 http(s) 开头，等待秒数收拢到上限以内
    pub fn new(url: &str, mode: CaptureMode, wait_seconds: u64) -> Result<Self, CaptureError> {
        if !is_url_and_has_protocol(url) {
            return Err(CaptureError::InvalidUrl(url.to_string()));
        }

        Ok(CaptureRequest {
            url: url.to_string(),
            mode,
            wait_seconds: wait_seconds.min(MAX_WAIT_SECONDS),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn mode(&self) -> CaptureMode {
        self.mode
    }

    pub fn wait_seconds(&self) -> u64 {
        self.wait_seconds
    }
}

/// 显示面协作方：打开一个新的显示面并写入完整的 HTML 文档
///
/// 实现方用 [`CaptureError::DisplaySinkBlocked`] 表示显示面无法打开，
/// 用 [`CaptureError::SaveFailed`] 表示写入/导出失败。
pub trait DisplaySink {
    fn open(&mut self) -> Result<(), CaptureError>;
    fn write_document(&mut self, html: &str) -> Result<(), CaptureError>;
}

/// live frame 协作方：交互模式下直接读取 frame 的当前文档
///
/// frame 文档与宿主不同源时实现方返回
/// [`CaptureError::CrossOriginBlocked`]；调度器不会自动重试，
/// 用户需要换成代理抓取模式。
pub trait FrameSource {
    fn document_html(&mut self) -> Result<String, CaptureError>;
}

/// 捕获调度器
///
/// 持有构造注入的抓取会话与文档构建器，按请求的模式路由：
/// 交互模式产出捕获面，静态/动态模式走代理抓取加重写加装配。
pub struct CaptureDispatcher {
    session: ProxySession,
    builder: EditorBuilder,
}

impl CaptureDispatcher {
    /// 用默认协作方构造调度器
    pub fn new(options: CaptureOptions) -> Result<Self, CaptureError> {
        let session = ProxySession::new(options)?;
        Ok(CaptureDispatcher {
            session,
            builder: EditorBuilder::new(),
        })
    }

    /// 注入自定义协作方（测试用）
    pub fn with_collaborators(session: ProxySession, builder: EditorBuilder) -> Self {
        CaptureDispatcher { session, builder }
    }

    /// 按请求产出要显示的完整 HTML 文档
    ///
    /// 交互模式不访问网络；静态与动态模式串行走完
    /// 抓取、重写、装配三步，失败立即向上传播。
    pub fn capture(&mut self, request: &CaptureRequest) -> Result<String, CaptureError> {
        debug!(url = request.url(), mode = request.mode().as_str(), "capture requested");

        match request.mode() {
            CaptureMode::Iframe => Ok(build_capture_surface(
                request.url(),
                request.wait_seconds(),
            )),
            CaptureMode::Static | CaptureMode::Dynamic => {
                let raw_html = self.session.fetch_through_proxies(request.url())?;
                let rewritten = rewrite_document(&raw_html, request.url())?;
                self.builder.build(
                    request.url(),
                    rewritten,
                    request.mode(),
                    request.wait_seconds(),
                )
            }
        }
    }

    /// 从宿主提供的 live frame 直接捕获（交互模式的直读路径）
    ///
    /// 不经过代理抓取；frame 读取失败（含跨源）原样向上传播。
    pub fn capture_from_frame(
        &self,
        request: &CaptureRequest,
        frame: &mut dyn FrameSource,
    ) -> Result<String, CaptureError> {
        let raw_html = frame.document_html()?;
        let rewritten = rewrite_document(&raw_html, request.url())?;
        self.builder.build(
            request.url(),
            rewritten,
            CaptureMode::Iframe,
            request.wait_seconds(),
        )
    }

    /// 捕获并送入显示面
    pub fn dispatch(
        &mut self,
        request: &CaptureRequest,
        sink: &mut dyn DisplaySink,
    ) -> Result<(), CaptureError> {
        let html = self.capture(request)?;
        sink.open()?;
        sink.write_document(&html)
    }

    /// 代理统计的只读视图
    pub fn proxy_stats(&self) -> BTreeMap<&'static str, ProxyStatsView> {
        self.session.stats()
    }
}
