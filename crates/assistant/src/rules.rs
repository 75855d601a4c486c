use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AssistantError {
    #[error("failed to read assistant rules {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse assistant rules {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Keyword predicate evaluated against a lowercased query by substring containment.
/// （以子字串比對小寫查詢的關鍵字條件。）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Matcher {
    AllOf(Vec<String>),
    AnyOf(Vec<String>),
}

impl Matcher {
    pub fn all_of<const N: usize>(keywords: [&str; N]) -> Self {
        Matcher::AllOf(keywords.iter().map(|k| k.to_string()).collect())
    }

    pub fn any_of<const N: usize>(keywords: [&str; N]) -> Self {
        Matcher::AnyOf(keywords.iter().map(|k| k.to_string()).collect())
    }

    fn matches(&self, lowered: &str) -> bool {
        let hit = |keyword: &String| lowered.contains(&keyword.to_lowercase());
        match self {
            Matcher::AllOf(keywords) => !keywords.is_empty() && keywords.iter().all(hit),
            Matcher::AnyOf(keywords) => keywords.iter().any(hit),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    pub matcher: Matcher,
    pub response: String,
}

impl Rule {
    pub fn new(matcher: Matcher, response: impl Into<String>) -> Self {
        Self {
            matcher,
            response: response.into(),
        }
    }
}

/// Ordered rules; the first matching rule answers, otherwise the fallback does.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssistantTable {
    #[serde(default)]
    pub rules: Vec<Rule>,
    pub fallback: String,
}

impl Default for AssistantTable {
    fn default() -> Self {
        Self {
            rules: vec![
                Rule::new(
                    Matcher::all_of(["array", "js"]),
                    "In JavaScript an array is created like this: `let arr = [1, 2, 3];` or `let arr = new Array(1, 2, 3);`",
                ),
                Rule::new(
                    Matcher::all_of(["loop", "js"]),
                    "Loop example: `for (let i = 0; i < 10; i++) { console.log(i); }`",
                ),
                Rule::new(
                    Matcher::all_of(["function", "js"]),
                    "A JS function: `function myFunc() { return \"Hello\"; }` or an arrow function: `const myFunc = () => \"Hello\";`",
                ),
                Rule::new(
                    Matcher::all_of(["html", "tag"]),
                    "HTML example: `<div><p>Text</p></div>`, where `div` and `p` are tags.",
                ),
                Rule::new(
                    Matcher::all_of(["css", "style"]),
                    "CSS: `p { color: red; font-size: 14px; }` sets the text color and size.",
                ),
                Rule::new(
                    Matcher::any_of(["bye", "thank"]),
                    "Any time! I'm always here to help with code.",
                ),
            ],
            fallback: "I didn't quite get the question. Try rephrasing it, for example: \"How do I create a function in JS?\"".to_string(),
        }
    }
}

/// Stateless responder over an [`AssistantTable`].
#[derive(Debug, Clone, Default)]
pub struct Assistant {
    table: AssistantTable,
}

impl Assistant {
    pub fn new(table: AssistantTable) -> Self {
        Self { table }
    }

    /// Loads a rule table from a JSON file.
    /// （從 JSON 檔案載入規則表。）
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, AssistantError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| AssistantError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let table = serde_json::from_str(&contents).map_err(|source| AssistantError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::new(table))
    }

    pub fn table(&self) -> &AssistantTable {
        &self.table
    }

    pub fn respond(&self, query: &str) -> &str {
        let lowered = query.to_lowercase();
        self.table
            .rules
            .iter()
            .find(|rule| rule.matcher.matches(&lowered))
            .map(|rule| rule.response.as_str())
            .unwrap_or(self.table.fallback.as_str())
    }
}
