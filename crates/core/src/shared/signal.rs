use serde::Serialize;

/// What a detector concluded about one image.
///
/// `Negative` still carries the measured score so diagnostics can show how
/// close the image came; `Absent` means the detector produced nothing usable
/// (degenerate input or an internal failure) and must never be read as a
/// zero-strength finding.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "signal", content = "score", rename_all = "lowercase")]
pub enum Signal<S> {
    Positive(S),
    Negative(S),
    Absent,
}

impl<S> Signal<S> {
    pub fn from_decision(positive: bool, score: S) -> Self {
        if positive {
            Signal::Positive(score)
        } else {
            Signal::Negative(score)
        }
    }

    pub fn is_positive(&self) -> bool {
        matches!(self, Signal::Positive(_))
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, Signal::Absent)
    }

    pub fn score(&self) -> Option<&S> {
        match self {
            Signal::Positive(s) | Signal::Negative(s) => Some(s),
            Signal::Absent => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_decision() {
        assert_eq!(Signal::from_decision(true, 3), Signal::Positive(3));
        assert_eq!(Signal::from_decision(false, 3), Signal::Negative(3));
    }

    #[test]
    fn test_negative_keeps_score() {
        let signal = Signal::Negative(0.0);
        assert!(!signal.is_positive());
        assert!(!signal.is_absent());
        assert_eq!(signal.score(), Some(&0.0));
    }

    #[test]
    fn test_absent_has_no_score() {
        let signal: Signal<f64> = Signal::Absent;
        assert!(signal.is_absent());
        assert!(signal.score().is_none());
    }

    #[test]
    fn test_serialized_shape() {
        let json = serde_json::to_string(&Signal::Positive(1)).unwrap();
        assert_eq!(json, r#"{"signal":"positive","score":1}"#);
        let json = serde_json::to_string(&Signal::<u8>::Absent).unwrap();
        assert_eq!(json, r#"{"signal":"absent"}"#);
    }
}
