//! # 解析器模块
//!
//! 捕获管线的解析与重写功能：
//!
//! - `html` - HTML 解析、DOM 操作与文档重写
//! - `css` - 样式文本中 url() 引用的重写
//!
//! 两者都不访问网络，网络部分见 `network` 模块。

pub mod css;
pub mod html;

// Re-export commonly used items for convenience
pub use css::rewrite_inline_css;
pub use html::{rewrite_document, RewrittenDocument};
