//! 文档重写管线的集成测试
//!
//! 用一个接近真实页面的 fixture 验证属性绝对化、样式重写、
//! `<base>` 插入与 doctype 重建，并确认二次重写不会产生双重前缀。

use pagedit::parsers::html::rewrite_document;

const SOURCE: &str = "https://example.com/dir/page.html";

const FIXTURE: &str = r#"<!DOCTYPE html>
<html>
<head>
  <title>Fixture</title>
  <link rel="stylesheet" href="css/site.css">
  <style>body { background: url(bg.png); } .hero { border-image: url('/edge.png'); }</style>
</head>
<body>
  <img src="pic.png">
  <a href="/about">about</a>
  <a href="https://other.example/x">external</a>
  <script src="js/app.js"></script>
  <iframe src="widget.html"></iframe>
  <form action="search.php"><input name="q"></form>
  <div style="background-image: url('tile.gif')">styled</div>
</body>
</html>"#;

#[test]
fn rewrites_relative_references_to_absolute() {
    let doc = rewrite_document(FIXTURE, SOURCE).unwrap();

    assert!(doc.body_markup.contains("src=\"https://example.com/dir/pic.png\""));
    assert!(doc.body_markup.contains("src=\"https://example.com/dir/js/app.js\""));
    assert!(doc.body_markup.contains("src=\"https://example.com/dir/widget.html\""));
    assert!(doc.body_markup.contains("action=\"https://example.com/dir/search.php\""));
    assert!(doc.head_markup.contains("href=\"https://example.com/dir/css/site.css\""));
}

#[test]
fn root_relative_and_absolute_references_follow_their_rules() {
    let doc = rewrite_document(FIXTURE, SOURCE).unwrap();

    // 根相对引用拼接 origin
    assert!(doc.body_markup.contains("href=\"https://example.com/about\""));
    // 绝对引用原样通过
    assert!(doc.body_markup.contains("href=\"https://other.example/x\""));
}

#[test]
fn style_blocks_and_style_attributes_are_rewritten_independently() {
    let doc = rewrite_document(FIXTURE, SOURCE).unwrap();

    assert!(doc.head_markup.contains("https://example.com/dir/bg.png"));
    // 样式里的根相对引用留给 <base> 解析
    assert!(doc.head_markup.contains("/edge.png"));
    assert!(!doc.head_markup.contains("example.com/edge.png"));
    assert!(doc.body_markup.contains("https://example.com/dir/tile.gif"));
}

#[test]
fn base_directive_and_doctype_are_produced() {
    let doc = rewrite_document(FIXTURE, SOURCE).unwrap();

    assert!(doc
        .head_markup
        .starts_with("<base href=\"https://example.com/dir/\">"));
    assert_eq!(doc.base_path, "https://example.com/dir/");
    assert_eq!(doc.doctype, "<!DOCTYPE html>");
}

#[test]
fn second_rewrite_pass_is_stable() {
    let first = rewrite_document(FIXTURE, SOURCE).unwrap();

    let reassembled = format!(
        "{}\n<html><head>{}</head><body>{}</body></html>",
        first.doctype, first.head_markup, first.body_markup
    );
    let second = rewrite_document(&reassembled, SOURCE).unwrap();

    // 所有属性已是绝对形式，第二遍不得再加前缀
    assert_eq!(first.head_markup, second.head_markup);
    assert_eq!(first.body_markup, second.body_markup);
}

#[test]
fn exactly_one_rewritten_document_per_capture() {
    // 同一输入重复调用得到独立且一致的结果
    let a = rewrite_document(FIXTURE, SOURCE).unwrap();
    let b = rewrite_document(FIXTURE, SOURCE).unwrap();

    assert_eq!(a.head_markup, b.head_markup);
    assert_eq!(a.body_markup, b.body_markup);
}

#[test]
fn invalid_source_url_is_rejected() {
    let result = rewrite_document(FIXTURE, "not a url");
    assert!(result.is_err());
}
