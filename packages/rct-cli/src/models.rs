use clap::ValueEnum;
use std::fmt;

/// Local models served through Ollama.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LanguageModel {
    #[value(name = "qwen:0.5b")]
    QwenSmall,
    #[value(name = "qwen:latest")]
    Qwen,
    #[value(name = "meditron:7b")]
    Meditron,
    #[value(name = "mistral:v0.2")]
    Mistral,
    #[value(name = "mixtral:latest")]
    Mixtral,
    #[value(name = "command-r:latest")]
    CommandR,
    #[value(name = "meditron:70b")]
    MeditronLarge,
}

impl LanguageModel {
    /// Model tag as Ollama knows it.
    pub fn as_str(&self) -> &'static str {
        match self {
            LanguageModel::QwenSmall => "qwen:0.5b",
            LanguageModel::Qwen => "qwen:latest",
            LanguageModel::Meditron => "meditron:7b",
            LanguageModel::Mistral => "mistral:v0.2",
            LanguageModel::Mixtral => "mixtral:latest",
            LanguageModel::CommandR => "command-r:latest",
            LanguageModel::MeditronLarge => "meditron:70b",
        }
    }
}

impl fmt::Display for LanguageModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
