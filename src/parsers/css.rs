//! CSS 样式重写器
//!
//! 扫描样式文本中的 `url(...)` 引用，把相对引用换算到捕获页面的基础路径下。
//! 与资源嵌入不同，这里不访问网络：重写后的样式仍然引用远程资源，
//! 只是引用全部变成了绝对形式。
//!
//! 使用 cssparser 逐 token 处理并原样回写其余内容，适用于：
//!
//! - `<style>` 块的文本内容
//! - 元素的 `style` 属性值
//!
//! 两者彼此独立，由文档重写器分别调用。

use cssparser::{serialize_identifier, serialize_string, ParseError, Parser, ParserInput, Token};

use crate::utils::url::is_absolute_ref;

/// 重写一段样式文本中的 `url(...)` 引用
///
/// 非绝对且不以 `/` 开头的引用被替换为 `base_path + 引用`；
/// 绝对引用和根相对引用原样通过。语法无法解析时返回原文本。
pub fn rewrite_inline_css(css: &str, base_path: &str) -> String {
    let mut input = ParserInput::new(css);
    let mut parser = Parser::new(&mut input);

    process_css_tokens(&mut parser, base_path, "").unwrap_or_else(|_| css.to_string())
}

/// 格式化CSS标识符
pub fn format_ident(ident: &str) -> String {
    let mut res: String = "".to_string();
    let _ = serialize_identifier(ident, &mut res);
    res = res.trim_end().to_string();
    res
}

/// 格式化带引号的CSS字符串
pub fn format_quoted_string(string: &str) -> String {
    let mut res: String = "".to_string();
    let _ = serialize_string(string, &mut res);
    res
}

/// 判断 url() 内部的引用是否需要重写，需要时返回拼接结果
///
/// 根相对引用（以 `/` 开头）留给浏览器基于 `<base>` 解析，原样通过。
fn rewrite_css_ref(value: &str, base_path: &str) -> Option<String> {
    if value.is_empty() || is_absolute_ref(value) || value.starts_with('/') {
        None
    } else {
        Some(format!("{base_path}{value}"))
    }
}

/// 逐 token 处理样式文本，重建输出字符串
///
/// `func_name` 是当前所在的 CSS 函数名，只有 `url` 函数内的字符串会被重写。
fn process_css_tokens(
    parser: &mut Parser,
    base_path: &str,
    func_name: &str,
) -> Result<String, ParseError<'static, String>> {
    let mut result = String::new();

    loop {
        let token_offset = parser.position();
        let token = match parser.next_including_whitespace_and_comments() {
            Ok(token) => token,
            Err(_) => break,
        };

        let token_result = match &token {
            // 注释原样保留
            Token::Comment(_) => parser.slice_from(token_offset).to_string(),
            Token::Semicolon => ";".to_string(),
            Token::Colon => ":".to_string(),
            Token::Comma => ",".to_string(),
            Token::CloseParenthesis => ")".to_string(),
            Token::CloseSquareBracket => "]".to_string(),
            Token::CloseCurlyBracket => "}".to_string(),
            Token::IncludeMatch => "~=".to_string(),
            Token::DashMatch => "|=".to_string(),
            Token::PrefixMatch => "^=".to_string(),
            Token::SuffixMatch => "$=".to_string(),
            Token::SubstringMatch => "*=".to_string(),
            Token::CDO => "<!--".to_string(),
            Token::CDC => "-->".to_string(),
            Token::WhiteSpace(value) => value.to_string(),
            Token::Ident(value) => format_ident(value),
            Token::AtKeyword(value) => format!("@{}", value),
            Token::Hash(value) => format!("#{}", value),
            Token::IDHash(value) => format!("#{}", format_ident(value)),
            // 带引号的字符串只在 url() 函数内才可能是资源引用
            Token::QuotedString(value) => {
                if func_name.eq_ignore_ascii_case("url") {
                    match rewrite_css_ref(value, base_path) {
                        Some(rewritten) => format_quoted_string(&rewritten),
                        None => format_quoted_string(value),
                    }
                } else {
                    format_quoted_string(value)
                }
            }
            Token::Number {
                has_sign, value, ..
            } => {
                let mut result = String::new();
                if *has_sign && *value >= 0.0 {
                    result.push('+');
                }
                result.push_str(&value.to_string());
                result
            }
            Token::Percentage {
                has_sign,
                unit_value,
                ..
            } => {
                let mut result = String::new();
                if *has_sign && *unit_value >= 0.0 {
                    result.push('+');
                }
                result.push_str(&(unit_value * 100.0).to_string());
                result.push('%');
                result
            }
            Token::Dimension {
                has_sign,
                value,
                unit,
                ..
            } => {
                let mut result = String::new();
                if *has_sign && *value >= 0.0 {
                    result.push('+');
                }
                result.push_str(&value.to_string());
                result.push_str(unit);
                result
            }
            // url(xxx) 不带引号的形式
            Token::UnquotedUrl(value) => match rewrite_css_ref(value, base_path) {
                Some(rewritten) => format!("url({})", format_quoted_string(&rewritten)),
                None => format!("url({})", value),
            },
            Token::Delim(value) => value.to_string(),
            Token::ParenthesisBlock | Token::SquareBracketBlock | Token::CurlyBracketBlock => {
                let (open_char, close_char) = match token {
                    Token::ParenthesisBlock => ('(', ')'),
                    Token::SquareBracketBlock => ('[', ']'),
                    Token::CurlyBracketBlock => ('{', '}'),
                    _ => ('(', ')'), // fallback
                };

                let mut result = String::new();
                result.push(open_char);

                let block_css = parser
                    .parse_nested_block(|parser| {
                        process_css_tokens(parser, base_path, func_name)
                    })
                    .unwrap();
                result.push_str(&block_css);

                result.push(close_char);
                result
            }
            Token::Function(name) => {
                let function_name = name.to_string();
                let mut result = String::new();
                result.push_str(&function_name);
                result.push('(');

                let block_css = parser
                    .parse_nested_block(|parser| {
                        process_css_tokens(parser, base_path, &function_name)
                    })
                    .unwrap();
                result.push_str(&block_css);

                result.push(')');
                result
            }
            Token::BadUrl(_) | Token::BadString(_) => String::new(),
        };

        result.push_str(&token_result);
    }

    Ok(result)
}
