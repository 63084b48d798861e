use serde::Serialize;

use crate::error::{ForgeError, Result};
use crate::intel::report::IntelligenceReport;
use crate::pipeline::context::{DEFAULT_PAGE_CLASS, RunContext};

/// Most elements ever placed in a prompt.
pub const MAX_PROMPT_ELEMENTS: usize = 50;

pub const DEFAULT_GOAL: &str = "Login Flow";

/// What the generated code should do.
#[derive(Debug, Clone, PartialEq)]
pub struct SynthesisRequest {
    pub goal: String,
    pub page_class: String,
}

impl Default for SynthesisRequest {
    fn default() -> Self {
        Self {
            goal: DEFAULT_GOAL.to_string(),
            page_class: DEFAULT_PAGE_CLASS.to_string(),
        }
    }
}

impl SynthesisRequest {
    /// Request naming the page class the context will write.
    pub fn for_context(ctx: &RunContext, goal: &str) -> Self {
        Self {
            goal: if goal.trim().is_empty() {
                DEFAULT_GOAL.to_string()
            } else {
                goal.trim().to_string()
            },
            page_class: ctx.page_class().to_string(),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PromptElement<'a> {
    id: u32,
    tag_name: &'a str,
    selector: &'a str,
    text: &'a str,
}

/// Element list as it appears in the prompt: the first
/// `MAX_PROMPT_ELEMENTS` entries in discovery order.
pub fn elements_json(report: &IntelligenceReport) -> Result<String> {
    let elements: Vec<PromptElement<'_>> = report
        .element_prefix(MAX_PROMPT_ELEMENTS)
        .iter()
        .map(|e| PromptElement {
            id: e.ordinal,
            tag_name: &e.tag_name,
            selector: &e.selector,
            text: &e.text,
        })
        .collect();

    serde_json::to_string(&elements).map_err(|e| ForgeError::JsonSerialize {
        context: "prompt elements".into(),
        source: e,
    })
}

pub fn build_synthesis_prompt(
    report: &IntelligenceReport,
    request: &SynthesisRequest,
) -> Result<String> {
    let elements = elements_json(report)?;
    let shown = report.elements.len().min(MAX_PROMPT_ELEMENTS);

    Ok(format!(
        r#"You are a Senior QA Automation Architect.
I have mapped the web page at {url}. The attached screenshot shows every
interactive element outlined in red with a numbered badge; the number is
the element's "id" in this list (id, tagName, selector, text):
{elements}
({shown} of {total} elements shown.)

YOUR GOAL:
Generate a Playwright (TypeScript) Page Object Model framework for: "{goal}".

REQUIREMENTS:
1. Return ONLY valid JSON. No markdown, no backticks.
2. The JSON must have exactly two keys: "pageObjectCode" and "testSpecCode".
3. Use the 'selector' values from the list. Prefer selectors containing an id.
4. The Page Object class name must be '{class}', exported from '../pages/{class}'.
5. The test must use the Page Object to navigate to {url}, carry out the goal,
   and assert success."#,
        url = report.url,
        elements = elements,
        shown = shown,
        total = report.elements.len(),
        goal = request.goal,
        class = request.page_class,
    ))
}
