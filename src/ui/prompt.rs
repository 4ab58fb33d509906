use crate::exchange::Format;
use crossterm::event::KeyCode;

/// Which filter bound a numeric prompt edits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    Area,
    Volume,
    Height,
}

impl Metric {
    pub const ALL: [Self; 3] = [Self::Area, Self::Volume, Self::Height];

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Area => "Area (m²)",
            Self::Volume => "Volume (m³)",
            Self::Height => "Height (m)",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptKind {
    Upload,
    Import,
    Export(Format),
    Bound { metric: Metric, max: bool },
    CustomFilter(String),
    ConfirmReset,
}

impl PromptKind {
    #[must_use]
    pub fn label(&self) -> String {
        match self {
            Self::Upload => "IFC file to upload".to_string(),
            Self::Import => "File to import (.csv, .json, .xlsx)".to_string(),
            Self::Export(format) => format!("{} export path", format.label()),
            Self::Bound { metric, max } => {
                format!("{} {} (empty clears)", if *max { "Max" } else { "Min" }, metric.label())
            }
            Self::CustomFilter(key) => format!("Value of '{key}' (empty clears)"),
            Self::ConfirmReset => "Start a new project? Current data is discarded (y/n)".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub kind: PromptKind,
    pub input: String,
}

/// Outcome of a key press inside a prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptOutcome {
    Editing,
    Cancelled,
    Submitted(String),
}

impl Prompt {
    #[must_use]
    pub fn new(kind: PromptKind) -> Self {
        Self {
            kind,
            input: String::new(),
        }
    }

    #[must_use]
    pub fn with_input(kind: PromptKind, input: impl Into<String>) -> Self {
        Self {
            kind,
            input: input.into(),
        }
    }

    pub fn handle_key(&mut self, code: KeyCode) -> PromptOutcome {
        if self.kind == PromptKind::ConfirmReset {
            return match code {
                KeyCode::Char('y' | 'Y') => PromptOutcome::Submitted("y".to_string()),
                _ => PromptOutcome::Cancelled,
            };
        }

        match code {
            KeyCode::Esc => PromptOutcome::Cancelled,
            KeyCode::Enter => PromptOutcome::Submitted(self.input.trim().to_string()),
            KeyCode::Backspace => {
                self.input.pop();
                PromptOutcome::Editing
            }
            KeyCode::Char(c) => {
                self.input.push(c);
                PromptOutcome::Editing
            }
            _ => PromptOutcome::Editing,
        }
    }
}

/// Parses an optional bound; empty input clears it.
pub fn parse_bound(input: &str) -> Result<Option<f64>, String> {
    let input = input.trim();
    if input.is_empty() {
        return Ok(None);
    }
    input
        .parse::<f64>()
        .ok()
        .filter(|n| n.is_finite())
        .map(Some)
        .ok_or_else(|| format!("'{input}' is not a number"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn typing_and_submitting() {
        let mut prompt = Prompt::new(PromptKind::Upload);
        for c in "a.ifcx".chars() {
            assert_eq!(prompt.handle_key(KeyCode::Char(c)), PromptOutcome::Editing);
        }
        prompt.handle_key(KeyCode::Backspace);
        assert_eq!(
            prompt.handle_key(KeyCode::Enter),
            PromptOutcome::Submitted("a.ifc".to_string())
        );
        assert_eq!(prompt.handle_key(KeyCode::Esc), PromptOutcome::Cancelled);
    }

    #[test]
    fn confirmation_needs_yes() {
        let mut prompt = Prompt::new(PromptKind::ConfirmReset);
        assert_eq!(prompt.handle_key(KeyCode::Char('n')), PromptOutcome::Cancelled);
        assert_eq!(
            prompt.handle_key(KeyCode::Char('y')),
            PromptOutcome::Submitted("y".to_string())
        );
    }

    #[test]
    fn bounds() {
        assert_eq!(parse_bound(" 50 "), Ok(Some(50.0)));
        assert_eq!(parse_bound(""), Ok(None));
        assert!(parse_bound("fifty").is_err());
        assert!(parse_bound("inf").is_err());
    }
}
