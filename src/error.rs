use thiserror::Error;

/// The failure kinds a pipeline stage can report.
///
/// Every stage traps its own faults and returns one of these; no panic or
/// foreign error type crosses a stage boundary. The orchestrator
/// short-circuits the remaining stages on the first failure it sees.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("source file not found: {0}")]
    SourceNotFound(String),

    #[error("failed to load sales data: {0}")]
    LoadFailure(String),

    #[error("no valid sales records to analyse")]
    EmptyInput,

    #[error("failed to render chart: {0}")]
    RenderFailure(String),

    #[error("failed to compose report: {0}")]
    CompositionFailure(String),

    #[error("report attachment not found: {0}")]
    AttachmentNotFound(String),

    #[error("mail relay rejected credentials: {0}")]
    AuthenticationFailure(String),

    #[error("failed to deliver report: {0}")]
    DeliveryFailure(String),
}
