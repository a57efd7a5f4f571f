//! Docstring to Markdown conversion.
//!
//! Docstrings follow the Keras convention: indented prose, fenced code
//! snippets, and `# Title` section markers followed by an indented
//! `key: description` list. Sphinx-style `:param x:` and `:return:` fields
//! are also recognized.
//!
//! Conversion is best-effort. Text that doesn't match any pattern passes
//! through with only its leading indentation removed.

use std::sync::LazyLock;

use regex::{Captures, Regex};

static SECTION_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n( +)# (.*)\n").unwrap());

static LIST_ITEM_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^    ([^\s\\(]+):(.*)").unwrap());

static PARAM_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r":param[ \t]+([^:\n]*?)[ \t]*:").unwrap());

static RETURN_LOWERCASE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r":return: ([a-z])").unwrap());

static RETURN_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r":return:[ \t]*").unwrap());

const FENCE: &str = "```";

fn code_marker(index: usize) -> String {
    format!("$CODE_BLOCK_{index}$")
}

fn section_marker(index: usize) -> String {
    format!("$SECTION_{index}$")
}

/// Convert a raw docstring into Markdown.
pub fn process_docstring(docstring: &str) -> String {
    let (text, code_blocks) = extract_code_blocks(docstring);
    let (text, sections) = extract_sections(text);

    let text = SECTION_PATTERN.replace_all(&text, "\n${1}**${2}**\n\n");

    let mut text = text
        .split('\n')
        .map(|line| line.trim_start_matches(' '))
        .collect::<Vec<_>>()
        .join("\n");

    for (index, section) in sections.iter().enumerate() {
        text = text.replace(&section_marker(index), section);
    }

    let mut text = apply_field_lists(&text);

    for (index, block) in code_blocks.iter().enumerate() {
        text = text.replace(&code_marker(index), block);
    }

    text
}

/// Replace every fenced code block with a marker, returning the de-indented blocks.
///
/// An unterminated fence runs to the end of the docstring.
fn extract_code_blocks(docstring: &str) -> (String, Vec<String>) {
    let mut text = String::with_capacity(docstring.len());
    let mut blocks = Vec::new();
    let mut rest = docstring;

    while let Some(start) = rest.find(FENCE) {
        text.push_str(&rest[..start]);
        let body_start = start + FENCE.len();
        let end = rest[body_start..]
            .find(FENCE)
            .map_or(rest.len(), |idx| body_start + idx + FENCE.len());

        text.push_str(&code_marker(blocks.len()));
        blocks.push(dedent_code_block(&rest[start..end]));
        rest = &rest[end..];
    }
    text.push_str(rest);

    (text, blocks)
}

/// Align a fenced snippet to column zero.
///
/// Lines after the opening fence lose the closing fence's indentation, then
/// interior lines lose their common indentation.
fn dedent_code_block(snippet: &str) -> String {
    let lines: Vec<&str> = snippet.split('\n').collect();
    let Some((first, rest)) = lines.split_first() else {
        return snippet.to_owned();
    };

    let closing_indent = rest.last().map_or(0, |last| leading_spaces(last));
    let mut rest: Vec<&str> = rest
        .iter()
        .map(|line| strip_indent(line, closing_indent))
        .collect();

    if rest.len() > 1 {
        let inner_end = rest.len() - 1;
        let common = rest[..inner_end]
            .iter()
            .filter(|line| !line.trim().is_empty())
            .map(|line| leading_spaces(line))
            .min()
            .unwrap_or(0);
        if common > 0 {
            for line in &mut rest[..inner_end] {
                *line = strip_indent(*line, common);
            }
        }
    }

    std::iter::once(*first)
        .chain(rest)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Replace the list block after each `# Title` marker with a placeholder.
///
/// Returns the rewritten text and the formatted blocks in marker order.
fn extract_sections(mut text: String) -> (String, Vec<String>) {
    let mut sections = Vec::new();
    let mut shift = 0;

    while let Some(caps) = SECTION_PATTERN.captures(&text[shift..]) {
        if caps[2].is_empty() {
            break;
        }
        let indent = caps[1].len();
        shift += caps.get(0).map_or(0, |m| m.end());

        // A blank line right after the marker means the section has no list
        let end = if text[shift..].starts_with('\n') {
            shift
        } else {
            text[shift..]
                .find("\n\n")
                .map_or(text.len(), |idx| shift + idx)
        };

        let block = format_list_block(&text[shift..end], indent);
        text.replace_range(shift..end, &section_marker(sections.len()));
        sections.push(block);
    }

    (text, sections)
}

/// Format a section body as a Markdown list.
///
/// `key: description` lines one level below the marker become bullets, deeper
/// lines keep their relative indentation, and a line that falls back left of
/// the current list starts a new paragraph.
fn format_list_block(block: &str, marker_indent: usize) -> String {
    let mut lines: Vec<String> = block
        .split('\n')
        .map(|line| {
            let line = strip_exact_indent(line, marker_indent);
            let line = LIST_ITEM_PATTERN.replace(line, "- **${1}**:${2}");
            line.strip_prefix("    ").unwrap_or(&*line).to_owned()
        })
        .collect();

    let mut list_indent = 0;
    let mut in_text = false;
    for line in &mut lines {
        match line.find(|c: char| !c.is_whitespace()) {
            Some(pos) if line[pos..].starts_with('-') => {
                list_indent = pos + 1;
                if in_text {
                    in_text = false;
                    line.insert(0, '\n');
                }
            }
            Some(pos) if pos < list_indent => {
                in_text = true;
                list_indent = pos;
                line.insert(0, '\n');
            }
            Some(_) => {}
            None => {
                in_text = false;
                list_indent = 0;
            }
        }
    }

    lines.join("\n")
}

/// Rewrite Sphinx-style `:param:` and `:return:` fields.
fn apply_field_lists(text: &str) -> String {
    let mut text = text.to_owned();
    if let Some(pos) = text.find(":param") {
        text.insert_str(pos, "\n**Arguments**  \n");
    }

    let text = PARAM_PATTERN.replace_all(&text, "\n- `${1}`:");
    let text = RETURN_LOWERCASE_PATTERN.replace_all(&text, |caps: &Captures<'_>| {
        format!(":return: {}", caps[1].to_uppercase())
    });
    RETURN_PATTERN
        .replace_all(&text, "\n**Return**  \n")
        .into_owned()
}

fn leading_spaces(line: &str) -> usize {
    line.len() - line.trim_start_matches(' ').len()
}

/// Remove up to `count` leading spaces.
fn strip_indent(line: &str, count: usize) -> &str {
    let strip = leading_spaces(line).min(count);
    &line[strip..]
}

/// Remove exactly `count` leading spaces, or nothing if the line has fewer.
fn strip_exact_indent(line: &str, count: usize) -> &str {
    if leading_spaces(line) >= count {
        &line[count..]
    } else {
        line
    }
}
