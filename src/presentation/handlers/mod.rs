mod batch;
mod error;
mod health;
mod job_status;
mod stats;
mod uploads;

pub use batch::{start_batch_handler, submit_batch_handler};
pub use error::{ApiError, ErrorResponse};
pub use health::health_handler;
pub use job_status::{job_results_handler, job_status_handler};
pub use stats::model_stats_handler;
pub use uploads::{upload_get_handler, upload_put_handler};
