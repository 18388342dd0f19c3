//! Pull structured payloads out of free-form model replies.

use std::sync::LazyLock;

use regex::Regex;

static FENCE_LINE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^ {0,3}(`{3,})[ \t]*([A-Za-z0-9_+.-]*)[^`]*$").expect("valid fence regex")
});

/// A fenced block: info string (language tag) and body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fence<'a> {
    pub info: &'a str,
    pub body: &'a str,
}

/// An open fence: backtick count, info string, body start offset and the
/// number of nested tagged fences still open inside it.
struct OpenFence<'a> {
    ticks: usize,
    info: &'a str,
    body_start: usize,
    depth: usize,
}

fn fence_line(line: &str) -> Option<(usize, &str)> {
    let caps = FENCE_LINE_RE.captures(line.trim_end_matches(['\n', '\r']))?;
    Some((caps.get(1)?.len(), caps.get(2).map_or("", |m| m.as_str())))
}

/// All top-level fenced code blocks in order of appearance.
///
/// Fence markers must sit on their own line. Inside a block, a tagged fence
/// line at least as long as the opener starts a nested block and a bare one
/// closes the innermost block, so a file that itself contains fenced
/// examples is returned whole. A block left open runs to the end of the text.
pub fn fences(text: &str) -> Vec<Fence<'_>> {
    let mut blocks = Vec::new();
    let mut open: Option<OpenFence<'_>> = None;
    let mut offset = 0;

    for line in text.split_inclusive('\n') {
        let line_start = offset;
        offset += line.len();
        let Some((ticks, info)) = fence_line(line) else {
            continue;
        };
        match open.as_mut() {
            None => {
                open = Some(OpenFence {
                    ticks,
                    info,
                    body_start: offset,
                    depth: 0,
                });
            }
            Some(current) if ticks < current.ticks => {}
            Some(current) if !info.is_empty() => current.depth += 1,
            Some(current) if current.depth > 0 => current.depth -= 1,
            Some(current) => {
                blocks.push(Fence {
                    info: current.info,
                    body: &text[current.body_start..line_start],
                });
                open = None;
            }
        }
    }

    if let Some(current) = open {
        blocks.push(Fence {
            info: current.info,
            body: &text[current.body_start..],
        });
    }
    blocks
}

/// Locate the JSON payload of a reply.
///
/// Preference order: a ```json fence, any fence whose body starts with `{`
/// or `[`, then the span from the first opening bracket to the last matching
/// closing bracket of the bare text.
pub fn extract_json(text: &str) -> Option<&str> {
    let blocks = fences(text);
    if let Some(block) = blocks
        .iter()
        .find(|block| block.info.eq_ignore_ascii_case("json"))
    {
        return Some(block.body.trim());
    }
    if let Some(block) = blocks.iter().find(|block| {
        let body = block.body.trim_start();
        body.starts_with('{') || body.starts_with('[')
    }) {
        return Some(block.body.trim());
    }
    bare_json_span(text)
}

fn bare_json_span(text: &str) -> Option<&str> {
    let start = text.find(['{', '['])?;
    let close = if text[start..].starts_with('{') { '}' } else { ']' };
    let end = text.rfind(close)?;
    (end > start).then(|| text[start..=end].trim())
}

/// Extract file content from a generation reply.
///
/// Takes the first fenced block when one exists, otherwise the trimmed reply.
/// The result always ends with a single newline unless empty.
pub fn extract_content(text: &str) -> String {
    let body = match fences(text).first() {
        Some(block) => block.body,
        None => text.trim(),
    };
    let mut content = body.trim_end_matches(['\n', '\r']).to_string();
    if !content.is_empty() {
        content.push('\n');
    }
    content
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefers_json_fence() {
        let reply = "Here:\n```python\nx = {1: 2}\n```\n```json\n{\"plan\": []}\n```\n";
        assert_eq!(extract_json(reply), Some("{\"plan\": []}"));
    }

    #[test]
    fn falls_back_to_untagged_fence_then_bare_span() {
        let fenced = "```\n[\"a.py\"]\n```";
        assert_eq!(extract_json(fenced), Some("[\"a.py\"]"));

        let bare = "Relevant files are {\"x\": [1]} as requested.";
        assert_eq!(extract_json(bare), Some("{\"x\": [1]}"));

        assert_eq!(extract_json("no payload here"), None);
    }

    #[test]
    fn content_comes_from_first_fence() {
        let reply = "Sure.\n```python\nprint('hi')\n```\nAnd a note:\n```\nignored\n```";
        assert_eq!(extract_content(reply), "print('hi')\n");
    }

    #[test]
    fn nested_fences_stay_inside_the_outer_block() {
        let reply = "```markdown\n# Tool\n\nUsage:\n\n```bash\nrun --x\n```\n\nEnd.\n```";
        assert_eq!(
            extract_content(reply),
            "# Tool\n\nUsage:\n\n```bash\nrun --x\n```\n\nEnd.\n"
        );
    }

    #[test]
    fn longer_opener_treats_shorter_fences_as_content() {
        let reply = "````python\ndef f():\n    \"\"\"\n    ```\n    \"\"\"\n````\n";
        assert_eq!(extract_content(reply), "def f():\n    \"\"\"\n    ```\n    \"\"\"\n");
    }

    #[test]
    fn unterminated_fence_runs_to_end() {
        assert_eq!(extract_content("```python\nx = 1\n"), "x = 1\n");
    }

    #[test]
    fn content_without_fence_is_trimmed_reply() {
        assert_eq!(extract_content("\n  def f():\n    pass\n\n"), "def f():\n    pass\n");
        assert_eq!(extract_content("   "), "");
    }
}
