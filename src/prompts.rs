/*!
 * Prompt templates for file translation.
 *
 * The system prompt only depends on the language pair and direction, so it is
 * identical across runs and eligible for provider-side prompt caching.
 */

use crate::language_utils::{LanguagePair, LanguageSide};

/// System prompt template for translating one file.
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    /// The template string with placeholders
    template: String,
}

impl PromptTemplate {
    /// The default system prompt for translating a module.
    pub const FILE_TRANSLATOR: &'static str = r#"You are an expert programmer translating a codebase from {from_language} to {to_language}.

## Input
You receive the {from_language} files that the file being translated depends on, each followed by its existing {to_language} translation. Then you receive the {from_language} file to translate, followed by its {to_language} counterpart, which is either a draft or missing.

## Your Task
- If the counterpart is a draft, review it against the {from_language} file and correct it
- If the counterpart is missing, write it from scratch
- Use the dependency translations for every name, type and signature you reference
- Never invent definitions that are not present in the given files
- Keep the structure, ordering and naming of the {from_language} file where {to_language} allows it

## Output Format
Answer with the complete {to_language} file only, in exactly this format:

# path/to/File.{to_extension}

```{to_fence}
complete file content
```

Do not output any other file. Do not abbreviate or elide parts of the file."#;

    /// Create a new prompt template.
    pub fn new(template: &str) -> Self {
        Self {
            template: template.to_string(),
        }
    }

    /// Create the default file translator template.
    pub fn file_translator() -> Self {
        Self::new(Self::FILE_TRANSLATOR)
    }

    /// Render the template for translating from `from` into its counterpart.
    pub fn render(&self, languages: &LanguagePair, from: LanguageSide) -> String {
        let from_profile = languages.profile(from);
        let to_profile = languages.profile(from.counterpart());
        self.template
            .replace("{from_language}", &from_profile.name)
            .replace("{to_language}", &to_profile.name)
            .replace("{to_extension}", &to_profile.extension)
            .replace("{to_fence}", &to_profile.fence_tag)
    }
}

impl Default for PromptTemplate {
    fn default() -> Self {
        Self::file_translator()
    }
}
