use std::path::Path;

use tracing::{info, warn};

use crate::architect::inference::TextInference;
use crate::error::{ForgeError, Result};

/// HTML beyond this many characters is cut from the healing prompt.
pub const MAX_HTML_CHARS: usize = 15_000;

#[derive(Debug, Clone, PartialEq)]
pub enum HealOutcome {
    /// The file was rewritten; `replacements` occurrences changed
    Applied { replacements: usize },
    /// The broken selector does not occur in the file
    NotFound,
}

pub fn build_heal_prompt(broken_selector: &str, page_html: &str) -> String {
    let short_html: String = page_html.chars().take(MAX_HTML_CHARS).collect();
    format!(
        r##"You are a Self-Healing QA Robot.

Problem:
The test failed because it could not find this selector: "{broken}"

Here is the HTML of the page right now:
```html
{html}
```

TASK:
Find the NEW, CORRECT selector for the element that corresponds to "{broken}".
Look for similar ID, class, or text.

OUTPUT:
Return ONLY the new selector string. (e.g. "#new-id" or "text=Add to Cart")."##,
        broken = broken_selector,
        html = short_html,
    )
}

/// Reduce a model reply to a bare selector: drop code fences and one
/// layer of surrounding quotes or backticks.
pub fn clean_selector_reply(reply: &str) -> Option<String> {
    let line = reply
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty() && !l.starts_with("```"))?;

    let unquoted = ['"', '\'', '`']
        .iter()
        .find_map(|q| line.strip_prefix(*q).and_then(|s| s.strip_suffix(*q)))
        .unwrap_or(line)
        .trim();

    (!unquoted.is_empty()).then(|| unquoted.to_string())
}

/// Ask the model for a replacement for `broken_selector` given the page's
/// current HTML.
pub fn heal_selector(
    backend: &dyn TextInference,
    broken_selector: &str,
    page_html: &str,
) -> Result<String> {
    info!(selector = broken_selector, "asking model to heal selector");
    let reply = backend.infer_text(&build_heal_prompt(broken_selector, page_html))?;
    clean_selector_reply(&reply)
        .ok_or_else(|| ForgeError::MalformedResponse("no selector in healing reply".into()))
}

/// Replace every occurrence of `old_selector` in the file at `path`.
pub fn apply_fix(path: &Path, old_selector: &str, new_selector: &str) -> Result<HealOutcome> {
    let content = std::fs::read_to_string(path).map_err(|e| ForgeError::io(path, e))?;

    let replacements = content.matches(old_selector).count();
    if old_selector.is_empty() || replacements == 0 {
        warn!(
            selector = old_selector,
            file = %path.display(),
            "selector not found in file; manual check required"
        );
        return Ok(HealOutcome::NotFound);
    }

    let updated = content.replace(old_selector, new_selector);
    std::fs::write(path, updated).map_err(|e| ForgeError::io(path, e))?;

    info!(
        file = %path.display(),
        old = old_selector,
        new = new_selector,
        replacements,
        "fix applied"
    );
    Ok(HealOutcome::Applied { replacements })
}
