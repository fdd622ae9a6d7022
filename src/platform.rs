use std::process;

use logtally::ProcessError;

/// Standard Unix exit codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    Success = 0,
    GeneralError = 1,
    InvalidUsage = 2,
}

impl ExitCode {
    pub fn exit(self) -> ! {
        process::exit(self as i32)
    }

    /// Configuration mistakes are usage errors; everything else is general
    pub fn for_error(err: &anyhow::Error) -> Self {
        match err.downcast_ref::<ProcessError>() {
            Some(e) if e.is_usage_error() => ExitCode::InvalidUsage,
            _ => ExitCode::GeneralError,
        }
    }
}

/// Print `logtally: Error: ...` to stderr and exit with the matching code
pub fn fail(err: &anyhow::Error) -> ! {
    eprintln!("logtally: Error: {:#}", err);
    ExitCode::for_error(err).exit()
}
