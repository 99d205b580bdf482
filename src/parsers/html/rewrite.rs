//! 文档重写器
//!
//! 把抓取到的 HTML 解析成 DOM，将固定属性表内的相对引用全部换算为
//! 绝对 URL，重写内联样式，并在 `<head>` 首位补上 `<base>` 指令。
//! 输出为可编辑文档构建器消费的 [`RewrittenDocument`]。

use html5ever::interface::{Attribute, QualName};
use html5ever::tendril::format_tendril;
use html5ever::tree_builder::create_element;
use html5ever::{namespace_url, ns, LocalName};
use markup5ever_rcdom::{Handle, NodeData};

use crate::core::CaptureError;
use crate::parsers::css::rewrite_inline_css;
use crate::utils::url::{is_absolute_ref, parse_resolved, to_absolute, ResolvedUrl};

use super::dom::{
    doctype_string, get_child_node_by_name, get_node_attr, html_to_dom, inner_markup,
    set_node_attr,
};

/// 标签到 URL 属性的固定映射表
///
/// 只有表内的属性会被绝对化，顺序无关紧要。
const URL_ATTRIBUTES: &[(&str, &str)] = &[
    ("img", "src"),
    ("script", "src"),
    ("link", "href"),
    ("a", "href"),
    ("video", "src"),
    ("audio", "src"),
    ("source", "src"),
    ("iframe", "src"),
    ("embed", "src"),
    ("object", "data"),
    ("form", "action"),
];

/// 解析并 URL 规范化后的页面表示
///
/// 每个成功的捕获请求恰好产生一份，由可编辑文档构建器一次性消费。
#[derive(Debug, Clone)]
pub struct RewrittenDocument {
    /// `<head>` 的内部标记（含插入的 `<base>`）
    pub head_markup: String,
    /// `<body>` 的内部标记
    pub body_markup: String,
    /// 源 URL 的基础路径
    pub base_path: String,
    /// 重建出的 doctype 声明
    pub doctype: String,
}

/// 重写抓取到的 HTML 文本
///
/// 步骤顺序固定：解析、解析源 URL、按属性表绝对化、重写样式、
/// 插入 `<base>`、重建 doctype、抽取 head/body 标记。
pub fn rewrite_document(html: &str, source_url: &str) -> Result<RewrittenDocument, CaptureError> {
    let resolved = parse_resolved(source_url)?;
    let dom = html_to_dom(html.as_bytes(), "utf-8".to_string());

    // html5ever 会为残缺输入补全骨架，这里只是兜底
    let html_node = get_child_node_by_name(&dom.document, "html")
        .ok_or_else(|| CaptureError::Parse("document has no <html> element".to_string()))?;
    let head = get_child_node_by_name(&html_node, "head")
        .ok_or_else(|| CaptureError::Parse("document has no <head> element".to_string()))?;
    let body = get_child_node_by_name(&html_node, "body")
        .ok_or_else(|| CaptureError::Parse("document has no <body> element".to_string()))?;

    walk_and_rewrite(&dom.document, &resolved);

    if get_child_node_by_name(&head, "base").is_none() {
        // 已存在的 <base> 优先，否则把基础路径作为 head 的第一个子节点插入
        let base_node = create_element(
            &dom,
            QualName::new(None, ns!(), LocalName::from("base")),
            vec![Attribute {
                name: QualName::new(None, ns!(), LocalName::from("href")),
                value: format_tendril!("{}", resolved.base_path),
            }],
        );
        head.children.borrow_mut().insert(0, base_node);
    }

    Ok(RewrittenDocument {
        head_markup: inner_markup(&head),
        body_markup: inner_markup(&body),
        base_path: resolved.base_path.clone(),
        doctype: doctype_string(&dom.document),
    })
}

/// 递归遍历 DOM，重写 URL 属性和样式
fn walk_and_rewrite(node: &Handle, resolved: &ResolvedUrl) {
    match node.data {
        NodeData::Document => {
            for child_node in node.children.borrow().iter() {
                walk_and_rewrite(child_node, resolved);
            }
        }
        NodeData::Element { ref name, .. } => {
            let tag = name.local.as_ref();

            for (mapped_tag, attr_name) in URL_ATTRIBUTES {
                if *mapped_tag == tag {
                    if let Some(attr_value) = get_node_attr(node, attr_name) {
                        if !attr_value.is_empty() && !is_absolute_ref(&attr_value) {
                            set_node_attr(
                                node,
                                attr_name,
                                Some(to_absolute(&attr_value, resolved)),
                            );
                        }
                    }
                }
            }

            if tag == "style" {
                rewrite_style_text(node, &resolved.base_path);
            }
            if let Some(style_attr) = get_node_attr(node, "style") {
                set_node_attr(
                    node,
                    "style",
                    Some(rewrite_inline_css(&style_attr, &resolved.base_path)),
                );
            }

            for child_node in node.children.borrow().iter() {
                walk_and_rewrite(child_node, resolved);
            }
        }
        _ => {}
    }
}

/// 重写 `<style>` 块的文本内容
fn rewrite_style_text(node: &Handle, base_path: &str) {
    for child in node.children.borrow().iter() {
        if let NodeData::Text { ref contents } = child.data {
            let mut tendril = contents.borrow_mut();
            let rewritten = rewrite_inline_css(&tendril, base_path);
            tendril.clear();
            tendril.push_slice(&rewritten);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SOURCE: &str = "https://example.com/dir/page.html";

    #[test]
    fn rewrites_img_src_against_base_path() {
        let doc = rewrite_document("<html><body><img src=\"pic.png\"></body></html>", SOURCE)
            .unwrap();

        assert!(doc
            .body_markup
            .contains("src=\"https://example.com/dir/pic.png\""));
    }

    #[test]
    fn rewrites_root_relative_against_origin() {
        let doc = rewrite_document(
            "<html><body><a href=\"/about\">about</a></body></html>",
            SOURCE,
        )
        .unwrap();

        assert!(doc
            .body_markup
            .contains("href=\"https://example.com/about\""));
    }

    #[test]
    fn leaves_absolute_and_fragment_refs_alone() {
        let doc = rewrite_document(
            "<html><body><a href=\"https://other.example/x\">x</a><a href=\"#top\">top</a></body></html>",
            SOURCE,
        )
        .unwrap();

        assert!(doc.body_markup.contains("href=\"https://other.example/x\""));
        assert!(doc.body_markup.contains("href=\"#top\""));
    }

    #[test]
    fn rewrites_every_mapped_tag() {
        let html = "<html><body>\
            <script src=\"app.js\"></script>\
            <video src=\"clip.mp4\"></video>\
            <form action=\"submit.php\"></form>\
            <object data=\"movie.swf\"></object>\
            </body></html>";
        let doc = rewrite_document(html, SOURCE).unwrap();

        assert!(doc.body_markup.contains("https://example.com/dir/app.js"));
        assert!(doc.body_markup.contains("https://example.com/dir/clip.mp4"));
        assert!(doc
            .body_markup
            .contains("https://example.com/dir/submit.php"));
        assert!(doc
            .body_markup
            .contains("https://example.com/dir/movie.swf"));
    }

    #[test]
    fn inserts_base_as_first_head_child() {
        let doc = rewrite_document(
            "<html><head><title>t</title></head><body></body></html>",
            SOURCE,
        )
        .unwrap();

        let base_pos = doc
            .head_markup
            .find("<base href=\"https://example.com/dir/\">")
            .unwrap();
        let title_pos = doc.head_markup.find("<title>").unwrap();
        assert!(base_pos < title_pos);
    }

    #[test]
    fn keeps_existing_base_untouched() {
        let doc = rewrite_document(
            "<html><head><base href=\"https://kept.example/\"></head><body></body></html>",
            SOURCE,
        )
        .unwrap();

        assert!(doc.head_markup.contains("https://kept.example/"));
        assert_eq!(doc.head_markup.matches("<base").count(), 1);
    }

    #[test]
    fn rewrites_style_blocks_and_attributes() {
        let html = "<html><head><style>body { background: url(bg.png); }</style></head>\
            <body><div style=\"background-image: url('tile.gif')\">x</div></body></html>";
        let doc = rewrite_document(html, SOURCE).unwrap();

        assert!(doc
            .head_markup
            .contains("https://example.com/dir/bg.png"));
        assert!(doc
            .body_markup
            .contains("https://example.com/dir/tile.gif"));
    }

    #[test]
    fn reports_base_path_and_doctype() {
        let doc =
            rewrite_document("<!DOCTYPE html><html><body></body></html>", SOURCE).unwrap();

        assert_eq!(doc.base_path, "https://example.com/dir/");
        assert_eq!(doc.doctype, "<!DOCTYPE html>");
    }
}
