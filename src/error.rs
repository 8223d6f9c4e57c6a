/// Broad failure category, mirrored by the process exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Input missing, malformed, too short, or an invalid option value.
    DataLoad,
    /// All intensities equal: normalization has no dynamic range.
    DegenerateNormalization,
    /// The least-squares solver failed to produce a usable fit.
    FitConvergence,
    /// Aperture extraction or magnitude derivation failed.
    Photometry,
}

impl ErrorKind {
    pub fn exit_code(self) -> u8 {
        match self {
            ErrorKind::DataLoad => 2,
            ErrorKind::DegenerateNormalization => 3,
            ErrorKind::FitConvergence => 4,
            ErrorKind::Photometry => 5,
        }
    }
}

#[derive(Clone)]
pub struct AppError {
    kind: ErrorKind,
    message: String,
}

impl AppError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn data_load(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::DataLoad, message)
    }

    pub fn degenerate(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::DegenerateNormalization, message)
    }

    pub fn fit(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::FitConvergence, message)
    }

    pub fn photometry(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Photometry, message)
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn exit_code(&self) -> u8 {
        self.kind.exit_code()
    }

    /// Prefix the message with context (e.g. the file being processed).
    pub fn context(self, ctx: impl std::fmt::Display) -> Self {
        Self {
            kind: self.kind,
            message: format!("{ctx}: {}", self.message),
        }
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("kind", &self.kind)
            .field("exit_code", &self.exit_code())
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}

impl From<crate::math::LmError> for AppError {
    fn from(err: crate::math::LmError) -> Self {
        AppError::fit(format!("Gaussian fit failed: {err}"))
    }
}
