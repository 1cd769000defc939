/// Lifecycle of a DataSync task execution as seen by the poller.
///
/// Any status other than `SUCCESS` or `ERROR` keeps the job polling, including
/// statuses DataSync may introduce later.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    Running,
    Success,
    Failed,
}

impl TaskState {
    pub fn from_remote(status: &str) -> Self {
        match status {
            "SUCCESS" => Self::Success,
            "ERROR" => Self::Failed,
            _ => Self::Running,
        }
    }

    /// Value stored in `emr_job_details.jobstatus`, only defined for terminal states.
    pub fn job_status(&self) -> Option<&'static str> {
        match self {
            Self::Running => None,
            Self::Success => Some("SUCCESS"),
            Self::Failed => Some("FAILED"),
        }
    }
}
