#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestStage {
    Storing,
    Chunking,
    Extracting,
    SavingRules,
    Completed,
}

#[derive(Debug, Clone)]
pub struct IngestProgressEvent {
    pub stage: IngestStage,
    pub elapsed_wall_s: f64,
    pub message: Option<String>,
}

impl IngestProgressEvent {
    pub fn stage(stage: IngestStage, elapsed_wall_s: f64, message: Option<String>) -> Self {
        Self {
            stage,
            elapsed_wall_s,
            message,
        }
    }
}
