//! Inline asset minification.
//!
//! Uses oxc for JavaScript and lightningcss for CSS. Every function returns
//! `None` when the input does not parse; callers keep the original text.

use lightningcss::stylesheet::{MinifyOptions, ParserOptions, PrinterOptions, StyleSheet};
use oxc::allocator::Allocator;
use oxc::codegen::{Codegen, CodegenOptions, CommentOptions};
use oxc::minifier::{CompressOptions, Minifier, MinifierOptions};
use oxc::parser::Parser;
use oxc::span::SourceType;

/// Selector wrapped around a declaration list to parse it as a stylesheet.
const DECL_PREFIX: &str = "_{";
const DECL_SUFFIX: &str = "}";

/// Minify a classic (non-module) script.
///
/// Parsed as a script, so top-level declarations stay page globals and are
/// never dropped as unused. Names are not mangled for the same reason.
pub fn minify_js(source: &str) -> Option<String> {
    minify_program(source, SourceType::script())
}

/// Minify an inline `type="module"` script.
pub fn minify_module_js(source: &str) -> Option<String> {
    minify_program(source, SourceType::mjs())
}

fn minify_program(source: &str, source_type: SourceType) -> Option<String> {
    let allocator = Allocator::default();
    let ret = Parser::new(&allocator, source, source_type).parse();
    if ret.panicked || !ret.errors.is_empty() {
        return None;
    }
    let mut program = ret.program;
    let options = MinifierOptions {
        mangle: None,
        compress: Some(CompressOptions::default()),
    };
    let ret = Minifier::new(options).minify(&allocator, &mut program);
    let code = Codegen::new()
        .with_options(CodegenOptions {
            minify: true,
            comments: CommentOptions::disabled(),
            ..CodegenOptions::default()
        })
        .with_scoping(ret.scoping)
        .build(&program)
        .code;
    Some(escape_closing_tag(code.trim_end_matches(['\n', ';'])))
}

/// Minify a stylesheet.
pub fn minify_css(source: &str) -> Option<String> {
    let mut stylesheet = StyleSheet::parse(source, ParserOptions::default()).ok()?;
    stylesheet.minify(MinifyOptions::default()).ok()?;
    let result = stylesheet
        .to_css(PrinterOptions {
            minify: true,
            ..PrinterOptions::default()
        })
        .ok()?;
    Some(result.code)
}

/// Minify the declaration list of a `style` attribute.
pub fn minify_style_attr(declarations: &str) -> Option<String> {
    let wrapped = format!("{DECL_PREFIX}{declarations}{DECL_SUFFIX}");
    let code = minify_css(&wrapped)?;
    code.strip_prefix(DECL_PREFIX)?
        .strip_suffix(DECL_SUFFIX)
        .map(str::to_string)
}

/// Re-serialize JSON without insignificant whitespace. Key order is kept.
pub fn minify_json(source: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(source).ok()?;
    serde_json::to_string(&value)
        .ok()
        .map(|json| escape_closing_tag(&json))
}

/// Keep `</script` sequences produced by re-serialization from closing the
/// element early.
fn escape_closing_tag(code: &str) -> String {
    let mut out = String::with_capacity(code.len());
    let mut rest = code;
    while let Some(pos) = rest.find("</") {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos + 2..];
        if tail
            .get(..6)
            .is_some_and(|t| t.eq_ignore_ascii_case("script"))
        {
            out.push_str("<\\/");
        } else {
            out.push_str("</");
        }
        rest = tail;
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minify_js() {
        let out = minify_js("var  answer = 40 + 2;\n// note\nconsole.log( answer );").unwrap();
        assert!(out.len() < 40);
        assert!(out.contains("answer"));
        assert!(!out.contains("note"));
    }

    #[test]
    fn test_minify_js_keeps_unreferenced_globals() {
        // called from markup, invisible to the script itself
        let out = minify_js("function greet() { alert(1) }\nvar counter = 0;").unwrap();
        assert!(out.contains("function greet()"));
        assert!(out.contains("counter"));
    }

    #[test]
    fn test_minify_module_js() {
        let out = minify_module_js("import { a } from './a.js';\nconsole.log( a );").unwrap();
        assert!(out.contains("./a.js"));
        assert!(!out.contains("( a )"));
        assert_eq!(minify_js("import { a } from './a.js';"), None);
    }

    #[test]
    fn test_minify_js_invalid() {
        assert_eq!(minify_js("function ("), None);
    }

    #[test]
    fn test_minify_css() {
        let out = minify_css("body {\n  color: #ff0000;\n  margin: 0px;\n}\n").unwrap();
        assert_eq!(out, "body{color:red;margin:0}");
    }

    #[test]
    fn test_minify_style_attr() {
        let out = minify_style_attr("color: #ff0000; background-image: url(a.png)").unwrap();
        assert!(out.starts_with("color:red"));
        assert!(out.contains("url(a.png)"));
        assert!(!out.contains('{'));
    }

    #[test]
    fn test_escape_closing_tag() {
        assert_eq!(
            escape_closing_tag(r#"{"a":"</script>","b":"</p>"}"#),
            r#"{"a":"<\/script>","b":"</p>"}"#
        );
        let json = minify_json(r#"{"a": "<\/SCRIPT>"}"#).unwrap();
        assert_eq!(json, r#"{"a":"<\/SCRIPT>"}"#);
    }

    #[test]
    fn test_minify_json() {
        let out = minify_json("{\n  \"b\": 1,\n  \"a\": [1, 2]\n}").unwrap();
        assert_eq!(out, r#"{"b":1,"a":[1,2]}"#);
        assert_eq!(minify_json("{oops"), None);
    }
}
