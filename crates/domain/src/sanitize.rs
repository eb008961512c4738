use once_cell::sync::Lazy;
use regex::{Captures, Regex};

// 与原始净化配置一致的 iframe 白名单：仅允许两类视频嵌入源
static SAFE_IFRAME_SRC: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(https?:)?//(www\.youtube(?:-nocookie)?\.com/embed/|player\.vimeo\.com/video/)")
        .unwrap()
});

static IFRAME_TAG: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?is)<iframe\b[^>]*\bsrc\s*=\s*["']([^"']+)["'][^>]*>(?:\s*</iframe\s*>)?"#)
        .unwrap()
});

static BARE_URL: Lazy<Regex> =
    Lazy::new(|| Regex::new("https?://[^\\s<>\"'\u{E000}]+").unwrap());

static TOKEN: Lazy<Regex> = Lazy::new(|| Regex::new("\u{E000}(\\d+)\u{E000}").unwrap());

// 占位符用私有区字符包裹，转义前把白名单片段换出来，转义后再放回去
const TOKEN_CHAR: char = '\u{E000}';

fn token(index: usize) -> String {
    format!("{TOKEN_CHAR}{index}{TOKEN_CHAR}")
}

/// 把原始输入净化为 HTML 安全子集：
/// 白名单内的 iframe 保留（归一化属性），其余标签整体转义，
/// 裸露的 http(s) 链接自动转为 `<a>`。
pub fn sanitize_html(raw: &str) -> String {
    // 输入里的占位字符先剥掉，防止伪造占位符
    let raw = raw.replace(TOKEN_CHAR, "");
    let mut kept: Vec<String> = Vec::new();

    let masked = IFRAME_TAG.replace_all(&raw, |caps: &Captures| {
        let src = &caps[1];
        if SAFE_IFRAME_SRC.is_match(src) {
            kept.push(format!(
                r#"<iframe src="{}" frameborder="0" allowfullscreen></iframe>"#,
                escape_html(src)
            ));
            token(kept.len() - 1)
        } else {
            String::new()
        }
    });

    let masked = BARE_URL.replace_all(&masked, |caps: &Captures| {
        let full = &caps[0];
        let trimmed = full.trim_end_matches(&['.', ',', ';', ':', '!', '?', ')'][..]);
        let rest = &full[trimmed.len()..];
        let url = escape_html(trimmed);
        kept.push(format!(
            r#"<a href="{url}" rel="nofollow" target="_blank">{url}</a>"#
        ));
        format!("{}{}", token(kept.len() - 1), rest)
    });

    let escaped = escape_html(&masked);

    TOKEN
        .replace_all(&escaped, |caps: &Captures| {
            caps[1]
                .parse::<usize>()
                .ok()
                .and_then(|i| kept.get(i).cloned())
                .unwrap_or_default()
        })
        .into_owned()
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
