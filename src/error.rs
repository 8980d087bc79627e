//! Error taxonomy for maze construction and stepping.

use crate::engine::Phase;
use crate::maze::MazeKind;

#[derive(Debug, thiserror::Error)]
pub enum MazeError {
    /// A maze kind was requested that has no generator.
    #[error("unsupported maze kind: {0}")]
    UnsupportedMazeKind(MazeKind),

    /// Action value outside the four cardinal directions.
    #[error("invalid action: {0}")]
    InvalidAction(String),

    /// `step` was called in a phase that does not accept moves.
    #[error("invalid state: cannot step while {0}; call reset first")]
    InvalidState(Phase),

    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("human render mode requested but no renderer is attached")]
    NoRenderer,

    #[error("config parse error: {0}")]
    ConfigParse(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, MazeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_offending_value() {
        let e = MazeError::InvalidAction("7".to_string());
        assert_eq!(e.to_string(), "invalid action: 7");

        let e = MazeError::UnsupportedMazeKind(MazeKind::Random);
        assert_eq!(e.to_string(), "unsupported maze kind: random");

        let e = MazeError::InvalidState(Phase::Terminated);
        assert!(e.to_string().contains("terminated"));
    }

    #[test]
    fn json_errors_convert() {
        let parse: std::result::Result<serde_json::Value, _> = serde_json::from_str("{");
        let e: MazeError = parse.unwrap_err().into();
        assert!(matches!(e, MazeError::ConfigParse(_)));
    }
}
