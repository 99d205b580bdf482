//! # HTML 解析与重写模块
//!
//! - `dom` - DOM 构建与节点级辅助函数
//! - `rewrite` - 捕获文档的 URL 规范化与 head/body 抽取

pub mod dom;
pub mod rewrite;

pub use dom::{
    doctype_string, get_child_node_by_name, get_node_attr, get_node_name, html_to_dom,
    inner_markup, set_node_attr,
};
pub use rewrite::{rewrite_document, RewrittenDocument};
