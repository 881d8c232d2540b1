//! Read-only queries over an `<lfm status="...">` response document.

// Use 3rd party
use xmltree::{Element, XMLNode};

use crate::model::ImageSize;
use crate::ws::{WsError, WsResult};

#[derive(Clone, Debug)]
pub struct Lfm {
    root: Element,
}

impl Lfm {
    pub fn parse(body: &str) -> WsResult<Self> {
        let root = Element::parse(body.as_bytes())?;
        Ok(Self { root })
    }

    /// The `status` attribute of the root element, empty if absent.
    pub fn status(&self) -> &str {
        self.root
            .attributes
            .get("status")
            .map(String::as_str)
            .unwrap_or_default()
    }

    pub fn is_ok(&self) -> bool {
        self.status() == "ok"
    }

    /// The `<error code="..">message</error>` of a failed response.
    pub fn error(&self) -> Option<WsError> {
        let error = find(&self.root, &|e| e.name == "error")?;
        let code = error
            .attributes
            .get("code")
            .and_then(|code| code.trim().parse().ok())
            .unwrap_or_default();
        Some(WsError::Api {
            code,
            message: text(error),
        })
    }

    /// Text of the first element named `name` anywhere in the document, empty if there is none.
    pub fn text(&self, name: &str) -> String {
        find(&self.root, &|e| e.name == name)
            .map(text)
            .unwrap_or_default()
    }

    /// Text of the first `<image size="..">` matching `size`.
    pub fn image(&self, size: ImageSize) -> String {
        find(&self.root, &|e| {
            e.name == "image" && e.attributes.get("size").map(String::as_str) == Some(size.name())
        })
        .map(text)
        .unwrap_or_default()
    }
}

fn find<'a>(element: &'a Element, matches: &dyn Fn(&Element) -> bool) -> Option<&'a Element> {
    element.children.iter().find_map(|node| match node {
        XMLNode::Element(child) if matches(child) => Some(child),
        XMLNode::Element(child) => find(child, matches),
        _ => None,
    })
}

fn text(element: &Element) -> String {
    element
        .get_text()
        .map(|text| text.trim().to_owned())
        .unwrap_or_default()
}
