//! Prompts that ask a generator for the structured response format
//!
//! Everything [`super::parse_strict`] accepts is described here, so the
//! template and the parser have to move together.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// System prompt for structured code generation
pub const CODE_GENERATION_SYSTEM_PROMPT: &str = r#"You are an expert software engineer. Generate code following these rules:

1. ALWAYS answer in the tagged response format below
2. Follow the conventions of the surrounding codebase
3. Handle errors explicitly and keep types precise
4. Comment only the non-obvious parts

Your response MUST follow this exact structure:"#;

/// Shape of the expected response
pub const RESPONSE_FORMAT: &str = r#"<response>
  <summary>
    What will be implemented, in one or two sentences
  </summary>

  <metadata>
    <estimatedTime>time estimate</estimatedTime>
    <complexity>simple|medium|complex</complexity>
    <dependencies>
      <dependency>package-name@version</dependency>
    </dependencies>
  </metadata>

  <files>
    <file>
      <operation>CREATE|UPDATE|DELETE|RENAME</operation>
      <path>relative/path/to/file.ts</path>
      <oldPath>previous/path (RENAME only)</oldPath>
      <description>What this file does</description>
      <content><![CDATA[
full file content
]]></content>
    </file>
  </files>

  <commands>
    <command>npm install package-name</command>
  </commands>

  <warnings>
    <warning>Anything the user must know before applying</warning>
  </warnings>
</response>"#;

/// Worked example included in generation prompts
pub const RESPONSE_EXAMPLE: &str = r#"Example request: "Add a password hashing helper"

Example response:
<response>
  <summary>
    Add a PasswordHasher service built on bcrypt
  </summary>

  <metadata>
    <estimatedTime>10 minutes</estimatedTime>
    <complexity>simple</complexity>
    <dependencies>
      <dependency>bcrypt@5.1.0</dependency>
    </dependencies>
  </metadata>

  <files>
    <file>
      <operation>CREATE</operation>
      <path>src/services/PasswordHasher.ts</path>
      <description>Hashes and verifies passwords</description>
      <content><![CDATA[
import bcrypt from 'bcrypt';

export class PasswordHasher {
  constructor(private readonly rounds = 10) {}

  hash(password: string): Promise<string> {
    return bcrypt.hash(password, this.rounds);
  }

  verify(password: string, hash: string): Promise<boolean> {
    return bcrypt.compare(password, hash);
  }
}
]]></content>
    </file>
  </files>

  <commands>
    <command>npm install bcrypt @types/bcrypt</command>
  </commands>

  <warnings>
    <warning>Never log plaintext passwords</warning>
  </warnings>
</response>"#;

/// Closing instruction appended after the user request
const RESPOND_ONLY_INSTRUCTION: &str =
    "Remember: Respond ONLY with the structure shown above. Do not add any text before or after it.";

/// The pieces a generation prompt is assembled from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptTemplate {
    pub system_prompt: String,
    pub response_format: String,
    #[serde(default)]
    pub examples: Vec<String>,
}

/// Template for structured code generation
pub fn code_generation_template() -> PromptTemplate {
    PromptTemplate {
        system_prompt: CODE_GENERATION_SYSTEM_PROMPT.to_string(),
        response_format: RESPONSE_FORMAT.to_string(),
        examples: vec![RESPONSE_EXAMPLE.to_string()],
    }
}

/// Build a complete generation prompt for a user request
///
/// # Arguments
/// * `request` - What the user asked for
/// * `context` - Optional project context (open files, conventions)
pub fn build_prompt(request: &str, context: Option<&str>) -> String {
    let template = code_generation_template();

    let mut prompt = format!("{}\n\n{}\n\n", template.system_prompt, template.response_format);

    if !template.examples.is_empty() {
        prompt.push_str(&format!("\n## Examples:\n{}\n\n", template.examples.join("\n\n")));
    }

    if let Some(context) = context.filter(|c| !c.trim().is_empty()) {
        prompt.push_str(&format!("\n## Context:\n{}\n\n", context));
    }

    prompt.push_str(&format!("\n## User Request:\n{}\n\n", request));
    prompt.push_str(RESPOND_ONLY_INSTRUCTION);

    prompt
}

/// Build a review prompt whose suggestions come back as UPDATE actions
pub fn build_review_prompt(code: &str, path: Option<&str>) -> String {
    format!(
        r#"Review the following code and answer in the same tagged response format.

File: {}

Code:
```
{}
```

The response should contain:
- a summary of the code quality
- suggested improvements as UPDATE operations
- warnings about potential issues"#,
        path.unwrap_or("unknown"),
        code
    )
}

/// Kind of refactoring requested from the generator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RefactorKind {
    Extract,
    Rename,
    Optimize,
    Modernize,
}

impl RefactorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RefactorKind::Extract => "extract",
            RefactorKind::Rename => "rename",
            RefactorKind::Optimize => "optimize",
            RefactorKind::Modernize => "modernize",
        }
    }
}

impl fmt::Display for RefactorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RefactorKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "extract" => Ok(RefactorKind::Extract),
            "rename" => Ok(RefactorKind::Rename),
            "optimize" => Ok(RefactorKind::Optimize),
            "modernize" => Ok(RefactorKind::Modernize),
            other => Err(format!("unknown refactor kind: {}", other)),
        }
    }
}

/// Build a refactoring prompt
pub fn build_refactor_prompt(code: &str, kind: RefactorKind, details: &str) -> String {
    format!(
        r#"Refactor the following code ({}):

Details: {}

Code:
```
{}
```

Answer in the tagged response format.
Use UPDATE for the original file and CREATE for any new files."#,
        kind, details, code
    )
}
