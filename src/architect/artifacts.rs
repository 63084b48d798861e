use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{ForgeError, Result};
use crate::intel::report::sha1_hex;
use crate::pipeline::context::RunContext;

/// Page object and test spec sources returned by one synthesis call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedArtifactPair {
    #[serde(rename = "pageObjectCode")]
    pub page_object_source: String,
    #[serde(rename = "testSpecCode")]
    pub test_spec_source: String,
}

impl GeneratedArtifactPair {
    pub fn is_valid(&self) -> bool {
        !self.page_object_source.trim().is_empty() && !self.test_spec_source.trim().is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct WrittenFile {
    pub path: PathBuf,
    pub sha1: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WrittenArtifacts {
    pub page_object: WrittenFile,
    pub test_spec: WrittenFile,
}

fn save_code(path: &Path, code: &str) -> Result<WrittenFile> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(|e| ForgeError::io(dir, e))?;
    }
    let content = code.trim();
    std::fs::write(path, content).map_err(|e| ForgeError::io(path, e))?;
    info!(path = %path.display(), "generated file written");
    Ok(WrittenFile {
        path: path.to_path_buf(),
        sha1: sha1_hex(content.as_bytes()),
    })
}

/// Write both sources to the context's fixed paths, replacing whatever a
/// previous generation left there.
pub fn write_artifacts(ctx: &RunContext, pair: &GeneratedArtifactPair) -> Result<WrittenArtifacts> {
    if !pair.is_valid() {
        return Err(ForgeError::MalformedResponse(
            "refusing to write an incomplete artifact pair".into(),
        ));
    }

    Ok(WrittenArtifacts {
        page_object: save_code(&ctx.page_object_path(), &pair.page_object_source)?,
        test_spec: save_code(&ctx.test_spec_path(), &pair.test_spec_source)?,
    })
}
