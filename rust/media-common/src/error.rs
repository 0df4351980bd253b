use thiserror::Error;

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

    /// Returns `true` if this error was raised by a rejected argument.
    pub fn is_invalid_arg(&self) -> bool {
        matches!(self.kind(), ErrorKind::InvalidArgument { .. })
    }
}

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ErrorKind {
    #[error("invalid argument {name}: {message}")]
    InvalidArgument { name: String, message: String },
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Self {
        Error(kind.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_arg_display() {
        let e = Error::invalid_arg("data", "data.is_some() || size == 0");
        assert!(e.is_invalid_arg());
        assert_eq!(
            e.to_string(),
            "invalid argument data: data.is_some() || size == 0"
        );
    }

    #[test]
    fn test_into_kind() {
        let e: Error = ErrorKind::InvalidArgument {
            name: "side_data".into(),
            message: "4 bytes declared, no data".into(),
        }
        .into();
        let ErrorKind::InvalidArgument { name, message } = e.into_kind();
        assert_eq!(name, "side_data");
        assert_eq!(message, "4 bytes declared, no data");
    }
}
