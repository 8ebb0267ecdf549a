use std::fmt;
use std::io;

use commprims_frame::FrameError;
use commprims_pipeline::TaskError;

// Exit code constants aligned with rsfulmen/DDR-0002 semantics.
pub const SUCCESS: i32 = 0;
pub const FAILURE: i32 = 1;
pub const PERMISSION_DENIED: i32 = 50;
pub const DATA_INVALID: i32 = 60;
pub const USAGE: i32 = 64;
pub const NOT_FOUND: i32 = 66;
pub const INTERNAL: i32 = 125;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug)]
pub struct CliError {
    pub code: i32,
    pub message: String,
}

impl CliError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

fn io_code(kind: io::ErrorKind) -> i32 {
    match kind {
        io::ErrorKind::PermissionDenied => PERMISSION_DENIED,
        io::ErrorKind::NotFound => NOT_FOUND,
        io::ErrorKind::BrokenPipe | io::ErrorKind::UnexpectedEof => FAILURE,
        _ => INTERNAL,
    }
}

pub fn io_error(context: &str, err: io::Error) -> CliError {
    CliError::new(io_code(err.kind()), format!("{context}: {err}"))
}

pub fn frame_error(context: &str, err: FrameError) -> CliError {
    let code = match &err {
        FrameError::InvalidLayout(_)
        | FrameError::WindowTooSmall { .. }
        | FrameError::OddBuffer { .. } => USAGE,
        FrameError::LengthMismatch { .. } | FrameError::PayloadSizeMismatch { .. } => DATA_INVALID,
        FrameError::DestinationTooSmall { .. } => INTERNAL,
    };
    CliError::new(code, format!("{context}: {err}"))
}

pub fn task_error(context: &str, err: &TaskError) -> CliError {
    let code = match err {
        TaskError::Read(source) | TaskError::Write(source) => io_code(source.kind()),
        TaskError::Unpack(_) => DATA_INVALID,
        TaskError::SourceClosed | TaskError::NoFrame | TaskError::SourceEmpty => FAILURE,
    };
    CliError::new(code, format!("{context}: {err}"))
}
