//! Process exit codes reported by top-level workflows

/// Exit codes surfaced by vmlink error paths
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum ExitCode {
    Success = 0,
    GeneralError = 1,
    ParameterError = 2,
    ConnectionError = 3,
    AuthenticationError = 4,
    ResourceNotFound = 5,
    OperationFailed = 6,
    TaskFailed = 7,
    ConfigurationError = 8,
    PreconditionError = 9,
    UserCancelled = 10,
}

impl ExitCode {
    /// Numeric process exit status
    pub fn code(self) -> i32 {
        self as i32
    }

    /// Upper-case name used in log lines
    pub fn name(self) -> &'static str {
        match self {
            ExitCode::Success => "SUCCESS",
            ExitCode::GeneralError => "GENERAL_ERROR",
            ExitCode::ParameterError => "PARAMETER_ERROR",
            ExitCode::ConnectionError => "CONNECTION_ERROR",
            ExitCode::AuthenticationError => "AUTHENTICATION_ERROR",
            ExitCode::ResourceNotFound => "RESOURCE_NOT_FOUND",
            ExitCode::OperationFailed => "OPERATION_FAILED",
            ExitCode::TaskFailed => "TASK_FAILED",
            ExitCode::ConfigurationError => "CONFIGURATION_ERROR",
            ExitCode::PreconditionError => "PRECONDITION_ERROR",
            ExitCode::UserCancelled => "USER_CANCELLED",
        }
    }
}

impl std::fmt::Display for ExitCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.name(), self.code())
    }
}
