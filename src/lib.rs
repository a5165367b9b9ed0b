pub mod ast;
pub mod cli;
pub mod codegen;
pub mod config;
pub mod diagram;
pub mod error;
pub mod output;
pub mod parser;
pub mod resolver;

pub use ast::*;
pub use config::GeneratorConfig;
pub use diagram::generate_plantuml;
pub use error::{GeneratorError, Result};
pub use output::{generate, write_output, GenerationOutput, OutputFile, WriteMode, WriteReport};
pub use parser::parse_entities;
pub use resolver::resolve_relations;
