use tracing::{info, warn};

use crate::architect::artifacts::{GeneratedArtifactPair, WrittenArtifacts, write_artifacts};
use crate::architect::inference::{InlineImage, VisionInference};
use crate::architect::prompt::{SynthesisRequest, build_synthesis_prompt};
use crate::architect::response::decode_artifacts;
use crate::error::{ForgeError, Result};
use crate::intel::report::load;
use crate::pipeline::context::RunContext;

/// A decoded artifact pair and where it was written.
#[derive(Debug, Clone, PartialEq)]
pub struct Synthesis {
    pub artifacts: GeneratedArtifactPair,
    pub written: WrittenArtifacts,
}

/// Turn the current intelligence report into a page object and test spec.
///
/// Nothing is sent to the model unless both the report and its screenshot
/// are readable, and nothing is written unless the reply decodes into a
/// complete pair.
pub fn synthesize(
    ctx: &RunContext,
    backend: &dyn VisionInference,
    request: &SynthesisRequest,
) -> Result<Synthesis> {
    let report = load(ctx)?.ok_or(ForgeError::MissingIntelligence)?;

    let image = std::fs::read(&report.screenshot_path)
        .map(InlineImage::png)
        .map_err(|_| ForgeError::MissingScreenshot {
            path: report.screenshot_path.clone(),
        })?;

    let prompt = build_synthesis_prompt(&report, request)?;

    info!(
        elements = report.elements.len(),
        goal = %request.goal,
        "sending visual data to model"
    );
    let response = backend.generate(&prompt, &image)?;

    let artifacts = decode_artifacts(&response).inspect_err(|e| {
        warn!(error = %e, "model response rejected");
    })?;

    let written = write_artifacts(ctx, &artifacts)?;
    info!(
        page_object = %written.page_object.path.display(),
        test_spec = %written.test_spec.path.display(),
        "framework generated"
    );

    Ok(Synthesis { artifacts, written })
}
