//! Small helpers for the fixed `<track>` schema.

// Use 3rd party
use log::warn;
use xmltree::{Element, XMLNode};

// Use built-in library
use std::str::FromStr;

/// Appends `<name>text</name>` to `parent`, unless `text` is empty.
pub fn append_text_element(parent: &mut Element, name: &str, text: &str) {
    if text.is_empty() {
        return;
    }
    parent.children.push(XMLNode::Element(text_element(name, text)));
}

pub fn text_element(name: &str, text: &str) -> Element {
    let mut element = Element::new(name);
    if !text.is_empty() {
        element.children.push(XMLNode::Text(text.to_owned()));
    }
    element
}

/// Text of the direct child `name`, empty when there is no such child.
pub fn child_text(parent: &Element, name: &str) -> String {
    parent
        .get_child(name)
        .and_then(Element::get_text)
        .map(|text| text.into_owned())
        .unwrap_or_default()
}

/// Parses the text of the direct child `name`, falling back to `default` when it is missing or
/// not a number.
pub fn child_number<T: FromStr>(parent: &Element, name: &str, default: T) -> T {
    let text = child_text(parent, name);
    let text = text.trim();
    if text.is_empty() {
        return default;
    }
    text.parse().unwrap_or_else(|_| {
        warn!("ignoring unparsable <{}>: {:?}", name, text);
        default
    })
}

pub fn child_elements(parent: &Element) -> impl Iterator<Item = &Element> {
    parent.children.iter().filter_map(|node| match node {
        XMLNode::Element(child) => Some(child),
        _ => None,
    })
}
