pub mod template;
pub mod text;

use scraper::{ElementRef, Html};

#[cfg(test)]
mod tests;

/// Elements serialized without a closing tag
pub const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

/// Elements whose text children are written verbatim
pub const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style"];

/// Returns true if `tag` never has a closing tag
pub fn is_void_element(tag: &str) -> bool {
    VOID_ELEMENTS.contains(&tag)
}

/// Writes `<tag attr="value" ...>` for the given attributes
pub fn write_start_tag<'a, I>(out: &mut String, tag: &str, attributes: I)
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    out.push('<');
    out.push_str(tag);
    for (name, value) in attributes {
        out.push(' ');
        out.push_str(name);
        out.push_str("=\"");
        out.push_str(&text::escape_attribute(value));
        out.push('"');
    }
    out.push('>');
}

/// Writes `</tag>` unless the tag is void
pub fn write_end_tag(out: &mut String, tag: &str) {
    if is_void_element(tag) {
        return;
    }
    out.push_str("</");
    out.push_str(tag);
    out.push('>');
}

/// Writes a text node, escaping unless its parent holds raw text
pub fn write_text(out: &mut String, parent_tag: &str, content: &str) {
    if RAW_TEXT_ELEMENTS.contains(&parent_tag) {
        out.push_str(content);
    } else {
        out.push_str(&text::escape_text(content));
    }
}

/// Markup parsed in a context where its leading element survives
///
/// A body-context parse discards table parts and `option`s that appear
/// outside their required ancestors, so those are parsed inside a wrapper.
pub struct Fragment {
    html: Html,
    wrapped_tag: Option<String>,
}

impl Fragment {
    pub fn parse(markup: &str) -> Self {
        let tag = leading_tag(markup);
        match tag.as_deref().and_then(context_wrapper) {
            Some((open, close)) => Self {
                html: Html::parse_fragment(&format!("{open}{markup}{close}")),
                wrapped_tag: tag,
            },
            None => Self {
                html: Html::parse_fragment(markup),
                wrapped_tag: None,
            },
        }
    }

    /// The leading element, when it needed a wrapper to parse
    pub fn unwrapped(&self) -> Option<ElementRef<'_>> {
        let tag = self.wrapped_tag.as_deref()?;
        self.html
            .root_element()
            .descendants()
            .filter_map(ElementRef::wrap)
            .find(|element| element.value().name() == tag)
    }

    /// Parent of the top-level nodes of an unwrapped parse
    pub fn root(&self) -> ElementRef<'_> {
        self.html.root_element()
    }

    /// First top-level element of the markup
    pub fn first_element(&self) -> Option<ElementRef<'_>> {
        self.unwrapped()
            .or_else(|| self.root().children().find_map(ElementRef::wrap))
    }
}

/// Lowercased name of the first start tag, if the markup opens with one
pub fn leading_tag(markup: &str) -> Option<String> {
    let rest = markup.trim_start().strip_prefix('<')?;
    let name = rest
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric() || *c == '-')
        .collect::<String>()
        .to_ascii_lowercase();
    (!name.is_empty()).then_some(name)
}

fn context_wrapper(tag: &str) -> Option<(&'static str, &'static str)> {
    match tag {
        "tr" | "tbody" | "thead" | "tfoot" | "caption" | "colgroup" => {
            Some(("<table>", "</table>"))
        }
        "col" => Some(("<table><colgroup>", "</colgroup></table>")),
        "td" | "th" => Some(("<table><tbody><tr>", "</tr></tbody></table>")),
        "option" | "optgroup" => Some(("<select>", "</select>")),
        _ => None,
    }
}
