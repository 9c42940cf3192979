use anyhow::Result;
use rmcp::{
    ServerHandler, ServiceExt,
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::{ServerCapabilities, ServerInfo},
    schemars, tool, tool_router,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::error::UploadError;
use crate::pipeline::Orchestrator;
use crate::upload::{read_merge_batch, Upload};

// Request structs for tools

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct PdfExtractRequest {
    #[schemars(description = "Path to the source PDF file")]
    pub path: String,
    #[schemars(description = "Pages to keep, e.g. '1-3,5 7-9'. Order and duplicates don't matter; pages past the end are ignored.")]
    pub pages: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct PdfMergeRequest {
    #[schemars(description = "Paths of the PDF files to merge, in order")]
    pub paths: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct PdfServer {
    #[allow(dead_code)]
    tool_router: ToolRouter<Self>,
    orchestrator: Arc<Orchestrator>,
}

impl PdfServer {
    pub fn new(orchestrator: Orchestrator) -> Self {
        Self {
            tool_router: Self::tool_router(),
            orchestrator: Arc::new(orchestrator),
        }
    }

    fn upload(&self, path: &str) -> Result<Upload, UploadError> {
        Upload::from_path(path, self.orchestrator.config().max_upload_bytes)
    }
}

#[tool_router]
impl PdfServer {
    #[tool(description = "Extract specific pages from a PDF into a new PDF. Returns the output path and page count.")]
    fn pdf_extract(&self, Parameters(req): Parameters<PdfExtractRequest>) -> String {
        let upload = match self.upload(&req.path) {
            Ok(u) => u,
            Err(e) => return format!("Error: {}", e),
        };

        match self.orchestrator.extract(Some(upload), &req.pages) {
            Ok(report) => {
                serde_json::to_string_pretty(&report).unwrap_or_else(|e| format!("Error: {}", e))
            }
            Err(e) => format!("Error: {}", e),
        }
    }

    #[tool(description = "Concatenate several PDFs, in the given order, into one new PDF. Unreadable PDFs are skipped and listed in the result.")]
    fn pdf_merge(&self, Parameters(req): Parameters<PdfMergeRequest>) -> String {
        let max_bytes = self.orchestrator.config().max_upload_bytes;
        let uploads = match read_merge_batch(&req.paths, max_bytes) {
            Ok(u) => u,
            Err(e) => return format!("Error: {}", e),
        };

        match self.orchestrator.merge(uploads) {
            Ok(report) => {
                serde_json::to_string_pretty(&report).unwrap_or_else(|e| format!("Error: {}", e))
            }
            Err(e) => format!("Error: {}", e),
        }
    }
}

impl ServerHandler for PdfServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "PDF page extraction and merging. Use pdf_extract to build a new PDF from page \
                 ranges of one file, and pdf_merge to concatenate several files into one."
                    .to_string(),
            ),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}

pub async fn run_server(orchestrator: Orchestrator) -> Result<()> {
    let server = PdfServer::new(orchestrator);

    // Serve using stdin/stdout as a tuple
    let service = server.serve((tokio::io::stdin(), tokio::io::stdout())).await?;

    service.waiting().await?;

    Ok(())
}
