//! Built-in render engine on top of pulldown-cmark
//!
//! Works on the event stream rather than on rendered HTML: heading ids are set
//! on the heading tags, mermaid fences become `div.mermaid` blocks for the
//! diagram script, math stays visible as delimited text for offline
//! typesetting, and link and image destinations pass through the local
//! resource policy before the HTML writer sees them. The written HTML is then
//! cleaned against a tag and attribute allowlist, which drops raw scripts,
//! event handlers and `<base>` elements embedded in the Markdown.

use super::{Diagnostic, EngineError, EngineResponse, RenderEngine, RenderRequest, TocEntry};
use crate::link_policy::EXTERNAL_SCHEMES;
use crate::location::normalize_path;
use crate::shell::escape_html;
use ammonia::{Builder, UrlRelative};
use percent_encoding::percent_decode_str;
use pulldown_cmark::{html, CodeBlockKind, CowStr, Event, HeadingLevel, Options, Parser, Tag, TagEnd};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use url::Url;

/// Replacement destination for links that leave the sandbox root
const BLOCKED_LINK_TARGET: &str = "#blocked-resource";

/// Fence languages rendered as diagrams
const DIAGRAM_LANGUAGES: &[&str] = &["mermaid"];

/// Markdown engine used when no external engine is configured
#[derive(Debug, Default, Clone, Copy)]
pub struct MarkdownEngine;

impl MarkdownEngine {
    pub fn new() -> Self {
        Self
    }
}

impl RenderEngine for MarkdownEngine {
    fn render(&self, request: &RenderRequest) -> Result<EngineResponse, EngineError> {
        let events: Vec<Event<'_>> = Parser::new_ext(&request.text, parser_options(request)).collect();

        let headings = collect_headings(&events);
        let policy = ResourcePolicy::new(&request.base_directory, &request.sandbox_root_directory);
        let mut diagnostics = Vec::new();
        let events = rewrite_events(events, &headings, request, &policy, &mut diagnostics);

        let mut html_fragment = String::with_capacity(request.text.len() * 3 / 2);
        html::push_html(&mut html_fragment, events.into_iter());
        let html_fragment = sanitize_html(&html_fragment);

        let table_of_contents = headings
            .into_iter()
            .filter(|heading| !heading.title.is_empty())
            .collect();

        Ok(EngineResponse {
            html: html_fragment,
            table_of_contents,
            diagnostics,
        })
    }
}

fn parser_options(request: &RenderRequest) -> Options {
    let mut options = Options::ENABLE_HEADING_ATTRIBUTES;
    if request.enable_gfm {
        options.insert(Options::ENABLE_TABLES);
        options.insert(Options::ENABLE_TASKLISTS);
        options.insert(Options::ENABLE_STRIKETHROUGH);
        options.insert(Options::ENABLE_FOOTNOTES);
        options.insert(Options::ENABLE_GFM);
    }
    if request.enable_math {
        options.insert(Options::ENABLE_MATH);
    }
    options
}

/// Lowercase ASCII slug with single hyphens between words
///
/// Returns `section` when nothing survives.
pub fn slugify(value: &str) -> String {
    let mut slug = String::new();
    for ch in value.chars() {
        if ch.is_ascii_alphanumeric() {
            slug.push(ch.to_ascii_lowercase());
        } else if (ch.is_whitespace() || ch == '-' || ch == '_') && !slug.ends_with('-') {
            slug.push('-');
        }
    }

    let slug = slug.trim_matches('-');
    if slug.is_empty() {
        "section".to_string()
    } else {
        slug.to_string()
    }
}

/// Hands out unique anchors, suffixing repeats with `-1`, `-2`, ...
#[derive(Default)]
struct AnchorRegistry {
    seen: HashMap<String, usize>,
}

impl AnchorRegistry {
    fn unique(&mut self, base: String) -> String {
        let mut candidate = base.clone();
        while let Some(count) = self.seen.get_mut(&base) {
            *count += 1;
            candidate = format!("{}-{}", base, count);
            if !self.seen.contains_key(&candidate) {
                break;
            }
        }
        self.seen.entry(base).or_insert(0);
        self.seen.insert(candidate.clone(), 0);
        candidate
    }
}

/// One entry per heading in document order, including untitled headings
fn collect_headings(events: &[Event<'_>]) -> Vec<TocEntry> {
    let mut registry = AnchorRegistry::default();
    let mut entries = Vec::new();
    let mut open: Option<(HeadingLevel, Option<String>, String)> = None;

    for event in events {
        match event {
            Event::Start(Tag::Heading { level, id, .. }) => {
                open = Some((*level, id.as_ref().map(|id| id.to_string()), String::new()));
            }
            Event::Text(text) | Event::Code(text) | Event::InlineMath(text) => {
                if let Some((_, _, title)) = open.as_mut() {
                    title.push_str(text);
                }
            }
            Event::End(TagEnd::Heading(_)) => {
                if let Some((level, explicit_id, title)) = open.take() {
                    let title = title.trim().to_string();
                    let base = explicit_id.unwrap_or_else(|| slugify(&title));
                    entries.push(TocEntry {
                        level: level as u8,
                        title,
                        anchor: registry.unique(base),
                    });
                }
            }
            _ => {}
        }
    }

    entries
}

fn rewrite_events<'a>(
    events: Vec<Event<'a>>,
    headings: &[TocEntry],
    request: &RenderRequest,
    policy: &ResourcePolicy,
    diagnostics: &mut Vec<Diagnostic>,
) -> Vec<Event<'a>> {
    let mut output = Vec::with_capacity(events.len());
    let mut heading_index = 0;
    let mut in_diagram = false;

    for event in events {
        match event {
            Event::Start(Tag::Heading {
                level,
                classes,
                attrs,
                ..
            }) => {
                let id = headings
                    .get(heading_index)
                    .map(|heading| CowStr::from(heading.anchor.clone()));
                heading_index += 1;
                output.push(Event::Start(Tag::Heading {
                    level,
                    id,
                    classes,
                    attrs,
                }));
            }
            Event::Start(Tag::CodeBlock(CodeBlockKind::Fenced(ref language)))
                if request.enable_diagrams && is_diagram_language(language) =>
            {
                in_diagram = true;
                output.push(Event::Html(CowStr::Borrowed("<div class=\"mermaid\">")));
            }
            Event::Text(text) if in_diagram => {
                output.push(Event::Html(escape_html(&text).into()));
            }
            Event::End(TagEnd::CodeBlock) if in_diagram => {
                in_diagram = false;
                output.push(Event::Html(CowStr::Borrowed("</div>\n")));
            }
            Event::InlineMath(math) => {
                output.push(Event::InlineHtml(
                    format!("<span class=\"math math-inline\">\\({}\\)</span>", escape_html(&math)).into(),
                ));
            }
            Event::DisplayMath(math) => {
                output.push(Event::InlineHtml(
                    format!("<span class=\"math math-display\">\\[{}\\]</span>", escape_html(&math)).into(),
                ));
            }
            Event::Start(Tag::Link {
                link_type,
                dest_url,
                title,
                id,
            }) => {
                let dest_url = match policy.check(&dest_url, ResourceKind::Link) {
                    ResourceCheck::Blocked => {
                        diagnostics.push(
                            Diagnostic::new("blocked_resource", "Link blocked by local resource policy")
                                .with_resource(dest_url.to_string()),
                        );
                        CowStr::Borrowed(BLOCKED_LINK_TARGET)
                    }
                    _ => dest_url,
                };
                output.push(Event::Start(Tag::Link {
                    link_type,
                    dest_url,
                    title,
                    id,
                }));
            }
            Event::Start(Tag::Image {
                link_type,
                dest_url,
                title,
                id,
            }) => {
                let dest_url = match policy.check(&dest_url, ResourceKind::Image) {
                    ResourceCheck::Allowed => dest_url,
                    ResourceCheck::Missing => {
                        diagnostics.push(
                            Diagnostic::new("missing_resource", "Image file does not exist")
                                .with_resource(dest_url.to_string()),
                        );
                        dest_url
                    }
                    ResourceCheck::Blocked => {
                        diagnostics.push(
                            Diagnostic::new("blocked_resource", "Image blocked by local resource policy")
                                .with_resource(dest_url.to_string()),
                        );
                        CowStr::Borrowed("")
                    }
                };
                output.push(Event::Start(Tag::Image {
                    link_type,
                    dest_url,
                    title,
                    id,
                }));
            }
            Event::Html(raw) | Event::InlineHtml(raw) if contains_script_tag(&raw) => {
                diagnostics.push(Diagnostic::new(
                    "inline_script",
                    "Embedded script removed from the rendered document",
                ));
                output.push(Event::Html(raw));
            }
            other => output.push(other),
        }
    }

    output
}

/// Strip everything outside the allowlist from rendered HTML
///
/// Keeps the markup the engine itself emits: heading ids, diagram and math
/// classes, task-list checkboxes and table alignment.
fn sanitize_html(html: &str) -> String {
    let mut builder = Builder::default();
    builder
        .add_tags(["input"])
        .add_generic_attributes(["class", "id", "role", "aria-hidden"])
        .add_tag_attributes("a", ["title"])
        .add_tag_attributes("img", ["title"])
        .add_tag_attributes("input", ["type", "checked", "disabled"])
        .add_tag_attributes("th", ["style"])
        .add_tag_attributes("td", ["style"])
        .filter_style_properties(["text-align"].into())
        .url_schemes(["http", "https", "mailto", "tel", "file", "data"].into())
        .url_relative(UrlRelative::PassThrough)
        .link_rel(None);
    builder.clean(html).to_string()
}

fn is_diagram_language(info: &str) -> bool {
    let language = info.split_whitespace().next().unwrap_or_default();
    DIAGRAM_LANGUAGES
        .iter()
        .any(|known| known.eq_ignore_ascii_case(language))
}

fn contains_script_tag(raw: &str) -> bool {
    raw.to_ascii_lowercase().contains("<script")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ResourceKind {
    Link,
    Image,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ResourceCheck {
    Allowed,
    Missing,
    Blocked,
}

/// Keeps relative resources inside the sandbox root
struct ResourcePolicy {
    base_directory: PathBuf,
    root: PathBuf,
}

impl ResourcePolicy {
    fn new(base_directory: &Path, root: &Path) -> Self {
        Self {
            base_directory: normalize_path(base_directory),
            root: normalize_path(root),
        }
    }

    fn check(&self, destination: &str, kind: ResourceKind) -> ResourceCheck {
        let destination = destination.trim();
        if destination.is_empty() || destination.starts_with('#') {
            return ResourceCheck::Allowed;
        }

        match Url::parse(destination) {
            Ok(url) if url.scheme() == "file" => match url.to_file_path() {
                Ok(path) => self.check_local(&path, kind),
                Err(()) => ResourceCheck::Blocked,
            },
            Ok(url) => {
                let permitted = match kind {
                    ResourceKind::Link => EXTERNAL_SCHEMES.contains(&url.scheme()),
                    ResourceKind::Image => url.scheme() == "data",
                };
                if permitted {
                    ResourceCheck::Allowed
                } else {
                    ResourceCheck::Blocked
                }
            }
            Err(url::ParseError::RelativeUrlWithoutBase) => self.check_relative(destination, kind),
            Err(e) => {
                log::debug!("Unparseable resource {}: {}", destination, e);
                ResourceCheck::Blocked
            }
        }
    }

    fn check_relative(&self, destination: &str, kind: ResourceKind) -> ResourceCheck {
        if destination.starts_with('/') || destination.starts_with('\\') {
            return ResourceCheck::Blocked;
        }

        let local_part = destination
            .split(['?', '#'])
            .next()
            .unwrap_or_default();
        let local_part = percent_decode_str(local_part).decode_utf8_lossy();
        self.check_local(&self.base_directory.join(local_part.as_ref()), kind)
    }

    /// `file:` URLs and relative references both end up here
    fn check_local(&self, path: &Path, kind: ResourceKind) -> ResourceCheck {
        let target = normalize_path(path);
        if !target.starts_with(&self.root) {
            return ResourceCheck::Blocked;
        }

        if kind == ResourceKind::Image && !target.exists() {
            return ResourceCheck::Missing;
        }

        ResourceCheck::Allowed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn request(text: &str, base: &Path, root: &Path) -> RenderRequest {
        RenderRequest {
            text: text.to_string(),
            enable_gfm: true,
            enable_diagrams: true,
            enable_math: true,
            base_directory: base.to_path_buf(),
            sandbox_root_directory: root.to_path_buf(),
            theme: "github-light".to_string(),
        }
    }

    fn render(text: &str) -> EngineResponse {
        let root = Path::new("/repo");
        MarkdownEngine::new()
            .render(&request(text, &root.join("docs"), root))
            .unwrap()
    }

    #[test]
    fn test_renders_tables_and_task_lists() {
        let output = render("| a | b |\n|---|---|\n| 1 | 2 |\n\n- [x] done\n- [ ] todo\n");
        assert!(output.html.contains("<table>"));
        assert!(output.html.contains("type=\"checkbox\""));
    }

    #[test]
    fn test_heading_ids_are_unique() {
        let output = render("# Same\n## Same\n### Same\n");

        let anchors: Vec<_> = output.table_of_contents.iter().map(|t| t.anchor.as_str()).collect();
        assert_eq!(anchors, vec!["same", "same-1", "same-2"]);
        assert!(output.html.contains("<h2 id=\"same-1\">"));
    }

    #[test]
    fn test_generated_suffix_does_not_collide_with_literal_heading() {
        let output = render("# Same\n# Same 1\n# Same\n");
        let anchors: Vec<_> = output.table_of_contents.iter().map(|t| t.anchor.as_str()).collect();
        assert_eq!(anchors, vec!["same", "same-1", "same-2"]);
    }

    #[test]
    fn test_toc_levels_and_titles() {
        let output = render("# Intro\n\ntext\n\n## Section 2\n\n### `code` title\n");
        assert_eq!(output.table_of_contents[0].level, 1);
        assert_eq!(output.table_of_contents[1].title, "Section 2");
        assert_eq!(output.table_of_contents[1].anchor, "section-2");
        assert_eq!(output.table_of_contents[2].title, "code title");
    }

    #[test]
    fn test_explicit_heading_id_is_respected() {
        let output = render("# Getting started {#start}\n");
        assert_eq!(output.table_of_contents[0].anchor, "start");
        assert!(output.html.contains("id=\"start\""));
    }

    #[test]
    fn test_rewrites_mermaid_code_blocks() {
        let output = render("```mermaid\nflowchart TD\n  A-->B\n```\n");
        assert!(output.html.contains("<div class=\"mermaid\">"));
        assert!(output.html.contains("flowchart TD"));
        assert!(output.html.contains("A--&gt;B"));
        assert!(!output.html.contains("<pre>"));
    }

    #[test]
    fn test_mermaid_stays_code_when_diagrams_disabled() {
        let root = Path::new("/repo");
        let mut req = request("```mermaid\ngraph LR\n```\n", root, root);
        req.enable_diagrams = false;
        let output = MarkdownEngine.render(&req).unwrap();
        assert!(output.html.contains("<pre><code class=\"language-mermaid\">"));
    }

    #[test]
    fn test_keeps_math_text_visible() {
        let output = render("Inline $E=mc^2$ and block:\n\n$$a^2 + b^2 = c^2$$\n");
        assert!(output.html.contains("\\(E=mc^2\\)"));
        assert!(output.html.contains("\\[a^2 + b^2 = c^2\\]"));
    }

    #[test]
    fn test_blocks_resources_outside_root() {
        let output = render("[ok](../guide/topic.md)\n[out](../../outside.md)\n![x](/etc/passwd)\n");

        assert!(output.html.contains("href=\"../guide/topic.md\""));
        assert!(output.html.contains("href=\"#blocked-resource\""));
        let blocked: Vec<_> = output
            .diagnostics
            .iter()
            .filter(|d| d.code == "blocked_resource")
            .filter_map(|d| d.resource.as_deref())
            .collect();
        assert_eq!(blocked, vec!["../../outside.md", "/etc/passwd"]);
    }

    #[test]
    fn test_external_links_and_file_urls() {
        let output = render("[web](https://example.com) [file](file:///etc/hosts)\n");
        assert!(output.html.contains("href=\"https://example.com\""));
        assert_eq!(output.diagnostics.len(), 1);
        assert_eq!(output.diagnostics[0].resource.as_deref(), Some("file:///etc/hosts"));
    }

    #[test]
    fn test_relative_image_kept_and_missing_flagged() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("figures")).unwrap();
        fs::write(dir.path().join("figures/chart.png"), b"png").unwrap();

        let text = "![chart](figures/chart.png)\n![gone](figures/gone.png)\n";
        let output = MarkdownEngine
            .render(&request(text, dir.path(), dir.path()))
            .unwrap();

        assert!(output.html.contains("src=\"figures/chart.png\""));
        assert_eq!(output.diagnostics.len(), 1);
        assert_eq!(output.diagnostics[0].code, "missing_resource");
        assert_eq!(output.diagnostics[0].resource.as_deref(), Some("figures/gone.png"));
    }

    #[test]
    fn test_colon_in_relative_path_is_not_a_scheme() {
        let output = render("[note](notes/a:b.md) [web](HTTPS://example.com/x)\n");
        assert!(output.html.contains("href=\"notes/a:b.md\""));
        assert!(output.diagnostics.is_empty());
    }

    #[test]
    fn test_file_urls_inside_root_are_kept() {
        let output = render("[guide](file:///repo/docs/guide.md) [script](javascript:alert(1))\n");
        assert!(output.html.contains("href=\"file:///repo/docs/guide.md\""));
        let blocked: Vec<_> = output
            .diagnostics
            .iter()
            .filter_map(|d| d.resource.as_deref())
            .collect();
        assert_eq!(blocked, vec!["javascript:alert(1)"]);
    }

    #[test]
    fn test_inline_script_is_reported() {
        let output = render("<script>alert('x')</script>\n\n# Header\n");
        assert!(output.diagnostics.iter().any(|d| d.code == "inline_script"));
        assert!(!output.html.contains("alert"));
        assert!(output.html.contains("<h1 id=\"header\">Header</h1>"));
    }

    #[test]
    fn test_raw_html_is_sanitized() {
        let text = "<img src=\"x.png\" onerror=\"alert(1)\">\n\n\
                    <base href=\"https://evil.example/\">\n\n\
                    <a href=\"javascript:alert(1)\" onclick=\"steal()\">click</a>\n\n\
                    | left | center |\n|:--|:--:|\n| 1 | 2 |\n\n\
                    ```mermaid\ngraph LR\n```\n";
        let output = render(text);

        assert!(!output.html.contains("onerror"));
        assert!(!output.html.contains("<base"));
        assert!(!output.html.contains("evil.example"));
        assert!(!output.html.contains("javascript:"));
        assert!(!output.html.contains("onclick"));
        assert!(output.html.contains("<img src=\"x.png\">"));
        assert!(output.html.contains("text-align"));
        assert!(output.html.contains("<div class=\"mermaid\">"));
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Hello, World!"), "hello-world");
        assert_eq!(slugify("  spaced -- out  "), "spaced-out");
        assert_eq!(slugify("snake_case name"), "snake-case-name");
        assert_eq!(slugify("???"), "section");
    }
}
