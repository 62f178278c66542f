use thiserror::Error;

/// Parsed press argument: whitespace-separated key combinations, each run in
/// order by the press automation.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct KeyCombinations {
    pub combinations: Vec<String>,
}

impl KeyCombinations {
    pub fn len(&self) -> usize {
        self.combinations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.combinations.is_empty()
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("can not parse key sequence '{sequence}'")]
pub struct KeyParseError {
    pub sequence: String,
}

/// Validates and splits a press sequence like `"ctrl+a backspace"`.
pub trait KeySequenceParser: Send + Sync {
    fn parse(&self, sequence: &str) -> Result<KeyCombinations, KeyParseError>;
}

const NAMED_KEYS: &[&str] = &[
    "ctrl", "alt", "shift", "meta", "enter", "tab", "esc", "space", "backspace", "delete", "ins",
    "home", "end", "left", "right", "up", "down", "pagedown", "pageup", "capslock",
];

fn is_valid_key(key: &str) -> bool {
    key.chars().count() == 1 || NAMED_KEYS.contains(&key)
}

/// Parser accepting single printable characters plus the named special keys.
#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultKeyParser;

impl KeySequenceParser for DefaultKeyParser {
    fn parse(&self, sequence: &str) -> Result<KeyCombinations, KeyParseError> {
        let trimmed = sequence.trim();
        if trimmed.is_empty() {
            return Err(KeyParseError {
                sequence: sequence.to_string(),
            });
        }
        let mut combinations = Vec::new();
        for combo in trimmed.split_whitespace() {
            let valid = combo
                .split('+')
                .all(|part| !part.is_empty() && is_valid_key(&part.to_ascii_lowercase()));
            if !valid {
                return Err(KeyParseError {
                    sequence: sequence.to_string(),
                });
            }
            combinations.push(combo.to_string());
        }
        Ok(KeyCombinations { combinations })
    }
}
