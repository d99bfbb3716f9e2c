//! Structured response protocol
//!
//! The strict counterpart of [`crate::extract`]: a tagged container whose
//! file actions carry explicit operations, validated as a whole before
//! anything touches the filesystem.

pub mod error;
pub mod markup;
pub mod parser;
pub mod prompt;
pub mod validate;

pub use error::ProtocolError;
pub use parser::parse_strict;
pub use prompt::{
    build_prompt, build_refactor_prompt, build_review_prompt, code_generation_template,
    PromptTemplate, RefactorKind,
};
pub use validate::validate_response;
