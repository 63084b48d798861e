use std::collections::HashMap;

use serde::Serialize;
use tracing::debug;

use crate::browser::driver::PageDriver;
use crate::error::{ForgeError, Result};
use crate::scout::element::{InteractiveElement, RawCandidate};

/// Tags and roles that count as interactive.
pub const CANDIDATE_SELECTOR: &str =
    r#"button, a, input, select, textarea, [role="button"], [onclick]"#;

/// Elements narrower or shorter than this (px) are not interactable.
pub const MIN_DIMENSION: f64 = 5.0;

const INDEX_ATTR: &str = "data-testforge-idx";

// ============================================================================
// Pure filtering and selector synthesis
// ============================================================================

/// Whether a candidate passes the visibility gate.
pub fn is_visible(candidate: &RawCandidate) -> bool {
    candidate.rect.width >= MIN_DIMENSION
        && candidate.rect.height >= MIN_DIMENSION
        && candidate.visibility != "hidden"
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

/// Build a best-effort CSS locator.
///
/// `tag#id` when an id exists, otherwise `tag.firstClass` when a class
/// exists, otherwise the bare tag. A `[name="..."]` clause is appended
/// in every case where the element has a name.
///
/// Only the first class token is used, so siblings sharing a leading
/// class get the same selector. See `duplicate_selectors`.
pub fn synthesize_selector(
    tag: &str,
    id: Option<&str>,
    class_name: Option<&str>,
    name: Option<&str>,
) -> String {
    let mut selector = tag.to_lowercase();

    match (id.filter(|v| !v.is_empty()), class_name) {
        (Some(id), _) => {
            selector.push('#');
            selector.push_str(id);
        }
        (None, Some(classes)) => {
            if let Some(first) = classes.split_whitespace().next() {
                selector.push('.');
                selector.push_str(first);
            }
        }
        (None, None) => {}
    }

    if let Some(name) = name.filter(|v| !v.is_empty()) {
        selector.push_str(&format!("[name=\"{}\"]", name));
    }

    selector
}

/// Visible label: inner text, then placeholder, then empty.
pub fn visible_text(candidate: &RawCandidate) -> String {
    non_empty(&candidate.inner_text)
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .or_else(|| non_empty(&candidate.placeholder))
        .unwrap_or("")
        .to_string()
}

/// A retained element together with the candidate index used to mark it.
#[derive(Debug, Clone, PartialEq)]
pub struct Retained {
    pub candidate_index: usize,
    pub element: InteractiveElement,
}

/// Filter candidates by visibility and assign contiguous 1-based ordinals
/// in encounter order.
pub fn select_interactive(candidates: &[RawCandidate]) -> Vec<Retained> {
    candidates
        .iter()
        .filter(|c| is_visible(c))
        .enumerate()
        .map(|(i, c)| Retained {
            candidate_index: c.index,
            element: InteractiveElement {
                ordinal: (i + 1) as u32,
                tag_name: c.tag.to_lowercase(),
                selector: synthesize_selector(
                    &c.tag,
                    c.id.as_deref(),
                    non_empty(&c.class_name),
                    c.name.as_deref(),
                ),
                text: visible_text(c),
                visible: true,
                center: c.rect.center(),
            },
        })
        .collect()
}

/// Selectors that more than one element resolved to, in first-seen order,
/// with the ordinals sharing each one.
pub fn duplicate_selectors(elements: &[InteractiveElement]) -> Vec<(String, Vec<u32>)> {
    let mut order: Vec<&str> = Vec::new();
    let mut groups: HashMap<&str, Vec<u32>> = HashMap::new();

    for el in elements {
        let entry = groups.entry(el.selector.as_str()).or_default();
        if entry.is_empty() {
            order.push(el.selector.as_str());
        }
        entry.push(el.ordinal);
    }

    order
        .into_iter()
        .filter_map(|sel| {
            let ordinals = groups.remove(sel)?;
            (ordinals.len() > 1).then(|| (sel.to_string(), ordinals))
        })
        .collect()
}

// ============================================================================
// In-page scripts
// ============================================================================

/// Script returning every candidate in document order, tagging each node
/// with its candidate index.
pub fn collect_script() -> String {
    format!(
        r#"(() => {{
  const nodes = document.querySelectorAll({selector});
  const out = [];
  nodes.forEach((el, index) => {{
    el.setAttribute('{attr}', String(index));
    const rect = el.getBoundingClientRect();
    const cls = typeof el.className === 'string' ? el.className : (el.getAttribute('class') || '');
    out.push({{
      index,
      tag: el.tagName.toLowerCase(),
      id: el.id || null,
      className: cls || null,
      name: el.getAttribute('name'),
      innerText: el.innerText || null,
      placeholder: el.getAttribute('placeholder'),
      rect: {{ x: rect.left, y: rect.top, width: rect.width, height: rect.height }},
      visibility: window.getComputedStyle(el).visibility
    }});
  }});
  return out;
}})()"#,
        selector = serde_json::Value::String(CANDIDATE_SELECTOR.to_string()),
        attr = INDEX_ATTR,
    )
}

#[derive(Serialize)]
struct MarkTarget {
    index: usize,
    ordinal: u32,
}

/// Script drawing a numbered badge at each retained element's top-left
/// corner and outlining it. Returns the number of elements marked.
pub fn mark_script(retained: &[Retained]) -> Result<String> {
    let targets: Vec<MarkTarget> = retained
        .iter()
        .map(|r| MarkTarget {
            index: r.candidate_index,
            ordinal: r.element.ordinal,
        })
        .collect();

    let json = serde_json::to_string(&targets).map_err(|e| ForgeError::JsonSerialize {
        context: "mark targets".into(),
        source: e,
    })?;

    Ok(format!(
        r#"(() => {{
  const targets = {json};
  let marked = 0;
  for (const t of targets) {{
    const el = document.querySelector('[{attr}="' + t.index + '"]');
    if (!el) continue;
    const rect = el.getBoundingClientRect();
    const badge = document.createElement('div');
    badge.textContent = String(t.ordinal);
    Object.assign(badge.style, {{
      position: 'absolute', zIndex: '99999', backgroundColor: '#ff0000',
      color: '#ffffff', fontWeight: 'bold', fontSize: '12px',
      padding: '2px 6px', borderRadius: '10px',
      top: (window.scrollY + rect.top - 10) + 'px',
      left: (window.scrollX + rect.left - 10) + 'px'
    }});
    document.body.appendChild(badge);
    el.style.border = '2px solid #ff0000';
    marked++;
  }}
  return marked;
}})()"#,
        json = json,
        attr = INDEX_ATTR,
    ))
}

// ============================================================================
// Live discovery
// ============================================================================

/// Enumerate, filter and mark the interactive elements of a loaded page.
///
/// The marks stay on the page; a fresh navigation is needed before
/// scanning the same page again.
pub fn discover(page: &mut dyn PageDriver) -> Result<Vec<InteractiveElement>> {
    let raw = page.evaluate(&collect_script())?;
    let candidates: Vec<RawCandidate> = if raw.is_null() {
        Vec::new()
    } else {
        serde_json::from_value(raw).map_err(|e| ForgeError::JsonParse {
            context: "candidate elements".into(),
            source: e,
        })?
    };

    let retained = select_interactive(&candidates);
    debug!(
        candidates = candidates.len(),
        retained = retained.len(),
        "visibility filter applied"
    );

    if !retained.is_empty() {
        page.evaluate(&mark_script(&retained)?)?;
    }

    Ok(retained.into_iter().map(|r| r.element).collect())
}
