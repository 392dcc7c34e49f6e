mod ai_provider;
mod audio_format;
mod file_result;
mod file_spec;
mod job;
mod job_id;
mod job_status;
mod report_section;
mod storage_path;
mod template_type;

pub use ai_provider::AiProvider;
pub use audio_format::AudioFormat;
pub use file_result::FileResult;
pub use file_spec::FileSpec;
pub use job::{Job, JobTransitionError};
pub use job_id::JobId;
pub use job_status::JobStatus;
pub use report_section::{ReportSection, format_analysis_items};
pub use storage_path::StoragePath;
pub use template_type::TemplateType;
