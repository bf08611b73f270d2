use thiserror::Error;

/// Error type shared by the planar crates.
///
/// Wraps a boxed [`ErrorKind`] so that `Result<T>` stays a single word wide.
#[derive(Debug, Error)]
#[error(transparent)]
pub struct Error(Box<ErrorKind>);

impl Error {
    pub fn kind(&self) -> &ErrorKind {
        self.0.as_ref()
    }

    pub fn into_kind(self) -> ErrorKind {
        *self.0
    }

    pub fn invalid_arg(name: impl Into<String>, message: impl Into<String>) -> Error {
        Error(
            ErrorKind::InvalidArgument {
                name: name.into(),
                message: message.into(),
            }
            .into(),
        )
    }

    pub fn region_out_of_bounds(
        x: usize,
        y: usize,
        width: usize,
        height: usize,
        cols: usize,
        rows: usize,
    ) -> Error {
        Error(
            ErrorKind::RegionOutOfBounds {
                x,
                y,
                width,
                height,
                cols,
                rows,
            }
            .into(),
        )
    }
}

#[derive(Debug, Error)]
pub enum ErrorKind {
    #[error("invalid argument {name}: {message}")]
    InvalidArgument { name: String, message: String },

    #[error("region ({x}, {y}) {width}x{height} exceeds the {cols}x{rows} surface extent")]
    RegionOutOfBounds {
        x: usize,
        y: usize,
        width: usize,
        height: usize,
        cols: usize,
        rows: usize,
    },
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Error {
        Error(Box::new(kind))
    }
}
