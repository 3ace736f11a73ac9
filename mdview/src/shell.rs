//! HTML shell around a rendered Markdown fragment
//!
//! The shell is a complete document: a content security policy that only
//! lets nonce-tagged scripts run, the stylesheet, the rendered fragment and
//! the diagram, math and interaction scripts.

use crate::assets::{ResourceLoader, ShellAsset};
use crate::config::{DiagramConfig, RenderConfig};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use uuid::Uuid;

/// Per-render options for the shell
#[derive(Debug, Clone, Copy)]
pub struct ShellOptions<'a> {
    pub title: &'a str,
    pub theme: &'a str,
    pub render: &'a RenderConfig,
    pub diagrams: &'a DiagramConfig,
}

/// A fresh random nonce for the script-src policy
pub fn new_nonce() -> String {
    STANDARD.encode(Uuid::new_v4().as_bytes())
}

/// Content security policy allowing only scripts tagged with `nonce`
pub fn content_security_policy(nonce: &str) -> String {
    format!(
        "default-src 'none'; img-src file: data:; style-src 'unsafe-inline'; script-src 'nonce-{}'",
        nonce
    )
}

/// Build the complete HTML document for a rendered fragment
///
/// # Parameters
/// * `fragment` - HTML produced by the render engine
/// * `nonce` - Nonce placed in the policy and on every script tag
/// * `options` - Title, theme and feature switches
/// * `assets` - Source of the stylesheet and scripts
///
/// # Returns
/// The document as a string
pub fn build_document(
    fragment: &str,
    nonce: &str,
    options: &ShellOptions<'_>,
    assets: &dyn ResourceLoader,
) -> String {
    let mut output = String::with_capacity(fragment.len() + 16 * 1024);

    write_html_header(&mut output, options.title, nonce, &assets.load_asset(ShellAsset::Stylesheet));
    write_body_open(&mut output, options);

    output.push_str("<article class=\"markdown-body\">\n");
    output.push_str(fragment);
    output.push_str("</article>\n");

    for asset in ShellAsset::SCRIPTS {
        write_script(&mut output, nonce, &assets.load_asset(asset));
    }

    output.push_str("</body>\n");
    output.push_str("</html>\n");
    output
}

fn write_html_header(output: &mut String, title: &str, nonce: &str, stylesheet: &str) {
    output.push_str("<!DOCTYPE html>\n");
    output.push_str("<html lang=\"en\">\n");
    output.push_str("<head>\n");
    output.push_str("<meta charset=\"UTF-8\">\n");
    output.push_str(&format!(
        "<meta http-equiv=\"Content-Security-Policy\" content=\"{}\">\n",
        escape_html(&content_security_policy(nonce))
    ));
    output.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">\n");
    output.push_str(&format!("<title>{}</title>\n", escape_html(title)));
    output.push_str("<style>\n");
    output.push_str(stylesheet);
    output.push_str("</style>\n");
    output.push_str("</head>\n");
}

fn write_body_open(output: &mut String, options: &ShellOptions<'_>) {
    let diagrams = options.diagrams;
    output.push_str(&format!(
        "<body class=\"{}\" data-enable-diagrams=\"{}\" data-enable-math=\"{}\" \
         data-min-scale=\"{}\" data-max-scale=\"{}\" data-pan-step=\"{}\" data-fit-padding=\"{}\">\n",
        escape_html(options.theme),
        options.render.enable_diagrams,
        options.render.enable_math,
        diagrams.min_scale,
        diagrams.max_scale,
        diagrams.pan_step,
        diagrams.fit_padding,
    ));
}

fn write_script(output: &mut String, nonce: &str, source: &str) {
    if source.trim().is_empty() {
        return;
    }

    output.push_str(&format!("<script nonce=\"{}\">\n", escape_html(nonce)));
    // A literal closing tag inside the source would end the element early
    output.push_str(&source.replace("</script", "<\\/script"));
    output.push_str("\n</script>\n");
}

/// Escape HTML special characters
pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}
