// ABOUTME: Diagnostics accumulator for non-fatal warnings during a command.
// ABOUTME: Collects warnings that shouldn't fail a deploy or bootstrap but should be shown to users.

/// Collects non-fatal warnings during deployment and bootstrap operations.
#[derive(Debug, Default)]
pub struct Diagnostics {
    warnings: Vec<Warning>,
}

impl Diagnostics {
    /// Record a warning, auto-logging it via tracing.
    pub fn warn(&mut self, warning: Warning) {
        tracing::warn!("{}", warning.message);
        self.warnings.push(warning);
    }

    /// Get all collected warnings.
    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    /// Check if any warnings were collected.
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}

/// A non-fatal warning collected during a command.
#[derive(Debug, Clone)]
pub struct Warning {
    pub kind: WarningKind,
    pub message: String,
}

impl Warning {
    /// A phase status could not be recorded while handling another failure.
    pub fn phase_status(message: impl Into<String>) -> Self {
        Self {
            kind: WarningKind::PhaseStatus,
            message: message.into(),
        }
    }

    /// Host tags were supplied but no network provider will consume them.
    pub fn ignored_tags(message: impl Into<String>) -> Self {
        Self {
            kind: WarningKind::IgnoredTags,
            message: message.into(),
        }
    }
}

/// Categories of warnings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarningKind {
    /// Failed to persist a failed/skipped phase status; state may show `running`/`pending`.
    PhaseStatus,
    /// Host tags have no effect without a network provider.
    IgnoredTags,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diagnostics_starts_empty() {
        let diag = Diagnostics::default();
        assert!(!diag.has_warnings());
        assert!(diag.warnings().is_empty());
    }

    #[test]
    fn diagnostics_collects_warnings() {
        let mut diag = Diagnostics::default();

        diag.warn(Warning::phase_status("could not mark rollout skipped"));
        diag.warn(Warning::ignored_tags("host app-1 has tags"));

        assert!(diag.has_warnings());
        assert_eq!(diag.warnings().len(), 2);
    }

    #[test]
    fn warning_constructors_set_correct_kind() {
        assert_eq!(Warning::phase_status("x").kind, WarningKind::PhaseStatus);
        assert_eq!(Warning::ignored_tags("x").kind, WarningKind::IgnoredTags);
    }
}
