//! Minimal markup scanning for forum thread pages.
//!
//! Searches run on an ASCII-lowercased copy so byte offsets stay valid for the
//! original text.

/// A post as found on a thread page, before its link is made absolute
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawPost {
    pub href: String,
    pub author: String,
    pub body: String,
}

/// Byte offsets of one element
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Element {
    start: usize,
    open_end: usize,
    close_start: usize,
    end: usize,
}

/// Page links from the thread pager, in page order
pub fn page_links(html: &str) -> Vec<String> {
    let lc = html.to_ascii_lowercase();
    let Some(pager) = find_element(html, &lc, 0, "div", |tag| has_class(tag, "pager")) else {
        return Vec::new();
    };

    let mut links = Vec::new();
    let mut pos = pager.open_end;
    while let Some(item) = find_element(html, &lc, pos, "li", |tag| has_class(tag, "page")) {
        if item.start >= pager.close_start {
            break;
        }
        if let Some(href) = first_href(html, &lc, item.open_end, item.close_start) {
            links.push(href);
        }
        pos = item.end;
    }
    links
}

/// All posts of a thread page
pub fn extract_posts(html: &str) -> Vec<RawPost> {
    let lc = html.to_ascii_lowercase();
    let Some(list) = find_element(html, &lc, 0, "div", |tag| {
        attr(tag, "id").is_some_and(|id| id.to_ascii_lowercase().contains("postlist"))
    }) else {
        return Vec::new();
    };
    let Some(items) = find_element(html, &lc, list.open_end, "div", |tag| has_class(tag, "items"))
    else {
        return Vec::new();
    };

    let mut posts = Vec::new();
    let mut pos = items.open_end;
    while let Some(node) = find_element(html, &lc, pos, "div", |_| true) {
        if node.start >= items.close_start {
            break;
        }
        if let Some(post) = read_post(&html[node.start..node.end]) {
            posts.push(post);
        }
        pos = node.end;
    }
    posts
}

fn read_post(node: &str) -> Option<RawPost> {
    let lc = node.to_ascii_lowercase();

    let link = find_element(node, &lc, 0, "span", |tag| has_class(tag, "link-zum-post"))?;
    let href = first_href(node, &lc, link.open_end, link.close_start)?;

    let user = find_element(node, &lc, 0, "a", |tag| has_class(tag, "forum-user"))?;
    let author = html_to_text(&node[user.open_end..user.close_start]);

    let data = find_element(node, &lc, 0, "div", |tag| has_class(tag, "forum-post-data"))?;
    let mut content = node[data.open_end..data.close_start].to_string();
    content = remove_elements(&content, |_, tag| has_class(tag, "forum-signatur"));
    content = remove_elements(&content, |_, tag| has_class(tag, "quote"));
    content = remove_last_element(&content, "code");

    Some(RawPost {
        href,
        author: author.trim().to_string(),
        body: html_to_text(&content),
    })
}

/// Turn a markup fragment into plain text lines
pub fn html_to_text(fragment: &str) -> String {
    let mut marked = String::with_capacity(fragment.len());
    let mut in_tag = false;
    let mut tag = String::new();

    for ch in fragment.chars() {
        match ch {
            '<' => {
                in_tag = true;
                tag.clear();
            }
            '>' if in_tag => {
                in_tag = false;
                if breaks_line(&tag) {
                    marked.push('\n');
                }
            }
            _ if in_tag => tag.push(ch),
            _ => marked.push(ch),
        }
    }

    // Markup breaks and source newlines both end a line; blank lines carry nothing
    decode_entities(&marked)
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

fn breaks_line(tag: &str) -> bool {
    let name: String = tag
        .trim()
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric() || *c == '/')
        .collect::<String>()
        .to_ascii_lowercase();

    matches!(
        name.as_str(),
        "br" | "br/" | "/p" | "/div" | "/li" | "/tr" | "/h1" | "/h2" | "/h3"
    )
}

/// Decode character references: numeric (`&#228;`, `&#xE4;`) and the named
/// ones forum posts use. Unknown references are kept as written.
fn decode_entities(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut rest = s;

    while let Some(at) = rest.find('&') {
        out.push_str(&rest[..at]);
        rest = &rest[at..];

        let name_len = rest[1..]
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '#'))
            .unwrap_or(rest.len() - 1);
        let decoded = if rest[1 + name_len..].starts_with(';') {
            decode_entity(&rest[1..1 + name_len]).map(|ch| (ch, name_len + 2))
        } else {
            None
        };

        match decoded {
            Some((ch, len)) => {
                out.push(ch);
                rest = &rest[len..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn decode_entity(name: &str) -> Option<char> {
    if let Some(num) = name.strip_prefix('#') {
        let code = match num.strip_prefix(['x', 'X']) {
            Some(hex) => u32::from_str_radix(hex, 16).ok()?,
            None => num.parse().ok()?,
        };
        return char::from_u32(code);
    }

    Some(match name {
        "nbsp" => ' ',
        "amp" => '&',
        "lt" => '<',
        "gt" => '>',
        "quot" => '"',
        "apos" => '\'',
        "auml" => 'ä',
        "ouml" => 'ö',
        "uuml" => 'ü',
        "Auml" => 'Ä',
        "Ouml" => 'Ö',
        "Uuml" => 'Ü',
        "szlig" => 'ß',
        "eacute" => 'é',
        "raquo" => '»',
        "laquo" => '«',
        "ndash" => '–',
        "mdash" => '—',
        "hellip" => '…',
        "euro" => '€',
        _ => return None,
    })
}

/// Next `<tag ...>` at or after `from` whose open tag satisfies `pred`
fn find_element(
    html: &str,
    lc: &str,
    from: usize,
    tag: &str,
    pred: impl Fn(&str) -> bool,
) -> Option<Element> {
    let mut pos = from;
    loop {
        let start = find_open(lc, pos, tag)?;
        let open_end = lc[start..].find('>')? + start + 1;
        if pred(&html[start..open_end]) {
            let (close_start, end) = find_close(lc, open_end, tag)?;
            return Some(Element {
                start,
                open_end,
                close_start,
                end,
            });
        }
        pos = open_end;
    }
}

fn find_open(lc: &str, from: usize, tag: &str) -> Option<usize> {
    let needle = format!("<{}", tag);
    let mut pos = from;
    loop {
        let at = lc.get(pos..)?.find(&needle)? + pos;
        let after = lc[at + needle.len()..].chars().next();
        if matches!(after, Some(c) if c.is_ascii_whitespace() || c == '>' || c == '/') {
            return Some(at);
        }
        pos = at + needle.len();
    }
}

/// Matching close tag for an element opened right before `from`
fn find_close(lc: &str, from: usize, tag: &str) -> Option<(usize, usize)> {
    let close = format!("</{}", tag);
    let mut depth = 1usize;
    let mut pos = from;
    loop {
        let next_close = lc.get(pos..)?.find(&close)? + pos;
        match find_open(lc, pos, tag) {
            Some(open) if open < next_close => {
                depth += 1;
                pos = open + tag.len() + 1;
            }
            _ => {
                depth -= 1;
                let end = lc[next_close..].find('>')? + next_close + 1;
                if depth == 0 {
                    return Some((next_close, end));
                }
                pos = end;
            }
        }
    }
}

fn first_href(html: &str, lc: &str, from: usize, to: usize) -> Option<String> {
    let anchor = find_element(html, lc, from, "a", |_| true)?;
    if anchor.start >= to {
        return None;
    }
    attr(&html[anchor.start..anchor.open_end], "href").map(|h| decode_entities(&h))
}

/// Value of an attribute in an open tag
fn attr(open_tag: &str, name: &str) -> Option<String> {
    let lc = open_tag.to_ascii_lowercase();
    let mut pos = 0;
    loop {
        let at = lc.get(pos..)?.find(name)? + pos;
        let preceded = lc[..at].chars().last().is_some_and(|c| c.is_ascii_whitespace());
        let rest = lc[at + name.len()..].trim_start();
        if preceded && rest.starts_with('=') {
            let value_at = open_tag.len() - rest.len() + 1;
            let value = open_tag[value_at..].trim_start();
            return Some(match value.chars().next()? {
                quote @ ('"' | '\'') => value[1..].split(quote).next()?.to_string(),
                _ => value
                    .split(|c: char| c.is_ascii_whitespace() || c == '>')
                    .next()?
                    .to_string(),
            });
        }
        pos = at + name.len();
    }
}

fn has_class(open_tag: &str, class: &str) -> bool {
    attr(open_tag, "class").is_some_and(|value| value.split_whitespace().any(|c| c == class))
}

/// Cut every element whose open tag satisfies `pred(tag_name, open_tag)`
fn remove_elements(fragment: &str, pred: impl Fn(&str, &str) -> bool) -> String {
    let mut out = fragment.to_string();
    let mut pos = 0;
    loop {
        let lc = out.to_ascii_lowercase();
        let Some(start) = lc.get(pos..).and_then(|s| s.find('<')).map(|i| i + pos) else {
            return out;
        };
        let name: String = lc[start + 1..]
            .chars()
            .take_while(|c| c.is_ascii_alphanumeric())
            .collect();
        let Some(open_end) = lc[start..].find('>').map(|i| i + start + 1) else {
            return out;
        };

        if !name.is_empty() && pred(&name, &out[start..open_end]) {
            if let Some((_, end)) = find_close(&lc, open_end, &name) {
                out.replace_range(start..end, "");
                pos = start;
                continue;
            }
        }
        pos = start + 1;
    }
}

fn remove_last_element(fragment: &str, tag: &str) -> String {
    let lc = fragment.to_ascii_lowercase();
    let mut last = None;
    let mut pos = 0;
    while let Some(el) = find_element(fragment, &lc, pos, tag, |_| true) {
        pos = el.end;
        last = Some(el);
    }

    match last {
        Some(el) => format!("{}{}", &fragment[..el.start], &fragment[el.end..]),
        None => fragment.to_string(),
    }
}
