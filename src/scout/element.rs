use serde::{Deserialize, Serialize};

/// Viewport coordinates at capture time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

/// One visible, interactable element found by a scan.
///
/// `ordinal` is the handle shown on the page badge and in the prompt
/// ("element #7"); it is serialized as `id` to keep the report format
/// readable by existing tooling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InteractiveElement {
    #[serde(rename = "id")]
    pub ordinal: u32,
    pub tag_name: String,
    pub selector: String,
    pub text: String,
    #[serde(rename = "isVisible")]
    pub visible: bool,
    pub center: Point,
}

/// Bounding rectangle as reported by `getBoundingClientRect()`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn center(&self) -> Point {
        Point {
            x: self.x + self.width / 2.0,
            y: self.y + self.height / 2.0,
        }
    }
}

/// A node matched by the candidate selector set, before filtering.
///
/// `index` is the node's position in the full candidate list; the page
/// carries it as a data attribute so marking can find the node again.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawCandidate {
    pub index: usize,
    pub tag: String,
    pub id: Option<String>,
    pub class_name: Option<String>,
    pub name: Option<String>,
    pub inner_text: Option<String>,
    pub placeholder: Option<String>,
    pub rect: Rect,
    pub visibility: String,
}
