//! Suggestion chips: what a click does depends on the active field.
//!
//! Command chips always send immediately. Otherwise the policy is picked per
//! field: `skills` accumulates a multi-select, `summary` strips the option
//! label before sending, everything else sends the chip text as-is.

use crate::resume::fields::Field;

/// Literal chips that are always commands to the backend.
pub const COMMAND_CHIPS: &[&str] = &[
    "Generate Options",
    "Show Example",
    "Suggest Skills",
    "Critique",
    "Submit",
    "Check ATS Score",
];

/// Chips longer than this are displayed truncated; clicks still use the full text.
const CHIP_DISPLAY_LIMIT: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuggestionPolicy {
    AutoSend,
    MultiSelect,
    StripPrefixThenSend,
}

impl SuggestionPolicy {
    pub fn for_field(field: Option<Field>) -> Self {
        match field {
            Some(Field::Skills) => SuggestionPolicy::MultiSelect,
            Some(Field::Summary) => SuggestionPolicy::StripPrefixThenSend,
            _ => SuggestionPolicy::AutoSend,
        }
    }
}

/// Result of clicking a chip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChipAction {
    /// Send this text as the user's message now.
    Send(String),
    /// Replace the pending input with this value; nothing is sent.
    SetInput(String),
}

pub fn is_command(text: &str) -> bool {
    COMMAND_CHIPS.contains(&text.trim())
}

/// Toggle-able picks accumulated while the `skills` field is active.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChipSelection {
    picked: Vec<String>,
}

impl ChipSelection {
    /// Adds the chip if absent, removes it if already picked.
    pub fn toggle(&mut self, chip: &str) {
        let chip = chip.trim();
        if let Some(pos) = self.picked.iter().position(|p| p == chip) {
            self.picked.remove(pos);
        } else {
            self.picked.push(chip.to_string());
        }
    }

    pub fn contains(&self, chip: &str) -> bool {
        self.picked.iter().any(|p| p == chip.trim())
    }

    pub fn input_value(&self) -> String {
        self.picked.join(", ")
    }

    pub fn clear(&mut self) {
        self.picked.clear();
    }
}

/// Decides what clicking `chip` does while `field` is active.
pub fn click(chip: &str, field: Option<Field>, selection: &mut ChipSelection) -> ChipAction {
    if is_command(chip) {
        selection.clear();
        return ChipAction::Send(chip.trim().to_string());
    }
    match SuggestionPolicy::for_field(field) {
        SuggestionPolicy::AutoSend => ChipAction::Send(chip.to_string()),
        SuggestionPolicy::StripPrefixThenSend => ChipAction::Send(strip_option_label(chip)),
        SuggestionPolicy::MultiSelect => {
            selection.toggle(chip);
            ChipAction::SetInput(selection.input_value())
        }
    }
}

/// Removes a leading option label: `1.` / `2)` / `3:` / `4 -` numbering, or
/// `Option N:` / `Summary N:` (case-insensitive, optionally wrapped in `**`).
pub fn strip_option_label(text: &str) -> String {
    let trimmed = text.trim();
    let body = trimmed.trim_start_matches("**");

    let after_label = ["option", "summary"]
        .iter()
        .find_map(|word| strip_word_prefix(body, word))
        .unwrap_or(body);

    match strip_numbering(after_label) {
        Some(rest) => rest.trim_start_matches("**").trim().to_string(),
        None => trimmed.to_string(),
    }
}

fn strip_word_prefix<'a>(text: &'a str, word: &str) -> Option<&'a str> {
    let head = text.get(..word.len())?;
    if head.eq_ignore_ascii_case(word) {
        Some(text[word.len()..].trim_start())
    } else {
        None
    }
}

/// Strips `N` followed by one of `.`, `)`, `:`, `-`, returning the remainder.
fn strip_numbering(text: &str) -> Option<&str> {
    let digits = text.chars().take_while(|c| c.is_ascii_digit()).count();
    if digits == 0 {
        return None;
    }
    let rest = text[digits..].trim_start_matches("**").trim_start();
    let mut chars = rest.chars();
    match chars.next() {
        Some('.' | ')' | ':' | '-') => Some(chars.as_str()),
        _ => None,
    }
}

/// Display form of a chip.
pub fn chip_label(text: &str) -> String {
    if text.chars().count() > CHIP_DISPLAY_LIMIT {
        let head: String = text.chars().take(CHIP_DISPLAY_LIMIT).collect();
        format!("{head}...")
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_chips_send_on_any_field() {
        for field in [None, Some(Field::Skills), Some(Field::Summary), Some(Field::Email)] {
            let mut sel = ChipSelection::default();
            assert_eq!(
                click("Suggest Skills", field, &mut sel),
                ChipAction::Send("Suggest Skills".to_string())
            );
        }
    }

    #[test]
    fn test_skills_chips_accumulate_without_sending() {
        let mut sel = ChipSelection::default();
        assert_eq!(
            click("Python", Some(Field::Skills), &mut sel),
            ChipAction::SetInput("Python".to_string())
        );
        assert_eq!(
            click("Go", Some(Field::Skills), &mut sel),
            ChipAction::SetInput("Python, Go".to_string())
        );
    }

    #[test]
    fn test_skills_chip_click_twice_deselects() {
        let mut sel = ChipSelection::default();
        click("Python", Some(Field::Skills), &mut sel);
        click("Go", Some(Field::Skills), &mut sel);
        assert_eq!(
            click("Python", Some(Field::Skills), &mut sel),
            ChipAction::SetInput("Go".to_string())
        );
        assert!(!sel.contains("Python"));
    }

    #[test]
    fn test_summary_chip_strips_label() {
        let mut sel = ChipSelection::default();
        assert_eq!(
            click(
                "Option 2: Backend engineer with 5 years of Rust",
                Some(Field::Summary),
                &mut sel
            ),
            ChipAction::Send("Backend engineer with 5 years of Rust".to_string())
        );
    }

    #[test]
    fn test_other_fields_send_raw_text() {
        let mut sel = ChipSelection::default();
        assert_eq!(
            click("1. Senior", Some(Field::ExperienceLevel), &mut sel),
            ChipAction::Send("1. Senior".to_string())
        );
    }

    #[test]
    fn test_strip_option_label_variants() {
        assert_eq!(strip_option_label("1. Seasoned engineer"), "Seasoned engineer");
        assert_eq!(strip_option_label("2) Seasoned engineer"), "Seasoned engineer");
        assert_eq!(strip_option_label("Summary 3: Seasoned engineer"), "Seasoned engineer");
        assert_eq!(strip_option_label("option 1 - Seasoned engineer"), "Seasoned engineer");
        assert_eq!(strip_option_label("**Option 1:** Seasoned engineer"), "Seasoned engineer");
    }

    #[test]
    fn test_strip_option_label_leaves_unlabelled_text() {
        assert_eq!(strip_option_label("Seasoned engineer"), "Seasoned engineer");
        assert_eq!(strip_option_label("10x engineer"), "10x engineer");
        assert_eq!(strip_option_label("Optional remote work"), "Optional remote work");
    }

    #[test]
    fn test_chip_label_truncates_long_text() {
        let long = "a".repeat(60);
        assert_eq!(chip_label(&long), format!("{}...", "a".repeat(50)));
        assert_eq!(chip_label("Go"), "Go");
    }
}
