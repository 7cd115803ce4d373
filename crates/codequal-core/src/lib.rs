pub mod audit;
pub mod extract;
pub mod llm;
pub mod report;

pub use audit::{
    file_scanner::FileScanner, pipeline::Auditor, AnalysisResult, FailureKind, FileFailure,
    ProjectReport, TechEntry,
};
pub use extract::{parse_response, ExtractError, ResponseExtractor};
pub use llm::{ChatMessage, ChatRequest, GatewayError, GatewaySettings, ModelGateway, Role};
pub use report::{render_report, OutputFormat};
