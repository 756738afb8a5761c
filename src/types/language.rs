//! Answer and UI language

/// Language used for UI labels and for the answer instruction in the prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Language {
    #[default]
    Italian,
    English,
}

impl Language {
    /// Parse a settings code; anything other than `en` is Italian
    pub fn from_code(code: &str) -> Self {
        match code {
            "en" => Language::English,
            _ => Language::Italian,
        }
    }

    pub fn code(self) -> &'static str {
        match self {
            Language::Italian => "it",
            Language::English => "en",
        }
    }

    /// Closing line of the prompt asking the model to answer in this language
    pub fn answer_instruction(self) -> &'static str {
        match self {
            Language::Italian => "Rispondi in italiano:",
            Language::English => "Answer in English:",
        }
    }

    pub fn is_en(self) -> bool {
        self == Language::English
    }
}
