//! Model-service integration for toolforge.
//!
//! Everything that talks to the code-generation model lives here: the client
//! ([`client::ModelClient`]), the instruction templates ([`prompts`]), the
//! reply parser ([`extract`]), and the stage-facing API ([`generate`]).

pub mod client;
pub mod error;
pub mod extract;
pub mod generate;
pub mod prompts;

pub use client::{HttpModelClient, ModelClient, ModelConfig};
pub use error::{CodegenError, Result};
pub use extract::extract_json;
pub use generate::{CodeGenerator, DocsAnalysis, GenerationOutput, RepoAnalysis};
pub use prompts::SourceFile;
