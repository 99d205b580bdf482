//! # 工具模块
//!
//! 捕获管线使用的工具函数：
//!
//! - URL 解析与相对引用绝对化
//! - 调度前的协议检查
//!
//! # 模块组织
//!
//! - `url` - URL 解析、绝对化等工具函数

pub mod url;

// Re-export commonly used items for convenience
pub use url::{
    is_absolute_ref, is_url_and_has_protocol, parse_resolved, to_absolute, ResolvedUrl, Url,
};
