//! Shared error type for the whole pipeline.

use std::fmt;

/// Every fatal condition the compiler can surface, from lexing through codegen.
///
/// There is no recovery: the first `CompileError` aborts the run. `main` is the
/// only place that turns one of these into a process exit.
#[derive(Debug)]
pub enum CompileError {
    /// Lexer could not tokenize the input at the given line/column.
    Lex { line: usize, col: usize, message: String },
    /// Parser found a token sequence that does not match the grammar.
    Parse { line: usize, col: usize, message: String },
    /// Same identifier defined twice in one scope.
    DuplicateDefinition(String),
    /// Identifier used but never declared in any enclosing scope.
    UndeclaredIdentifier(String),
    /// Assignment target names a `const`.
    AssignToConst(String),
    /// An array initializer disagreed with its declared shape.
    InitializerShape(String),
    /// The IR object graph contained a kind tag the backend does not expect.
    /// Also covers a global's initializer not being a literal, zero-init, or
    /// aggregate — the backend reports that case through this variant too.
    InvalidIrKind(String),
    /// Generic lowering/codegen logic error, analogous to the original's assertions.
    Logic(String),
    Format(fmt::Error),
    Io(std::io::Error),
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompileError::Lex { line, col, message } => {
                write!(f, "lex error at {}:{}: {}", line, col, message)
            }
            CompileError::Parse { line, col, message } => {
                write!(f, "parse error at {}:{}: {}", line, col, message)
            }
            CompileError::DuplicateDefinition(name) => {
                write!(f, "duplicate definition of '{}' in this scope", name)
            }
            CompileError::UndeclaredIdentifier(name) => {
                write!(f, "use of undeclared identifier '{}'", name)
            }
            CompileError::AssignToConst(name) => {
                write!(f, "cannot assign to const '{}'", name)
            }
            CompileError::InitializerShape(message) => {
                write!(f, "invalid initializer: {}", message)
            }
            CompileError::InvalidIrKind(message) => {
                write!(f, "invalid IR value kind: {}", message)
            }
            CompileError::Logic(message) => write!(f, "{}", message),
            CompileError::Format(e) => write!(f, "formatting error: {}", e),
            CompileError::Io(e) => write!(f, "I/O error: {}", e),
        }
    }
}

impl std::error::Error for CompileError {}

impl From<fmt::Error> for CompileError {
    fn from(e: fmt::Error) -> Self {
        CompileError::Format(e)
    }
}

impl From<std::io::Error> for CompileError {
    fn from(e: std::io::Error) -> Self {
        CompileError::Io(e)
    }
}

impl From<String> for CompileError {
    fn from(s: String) -> Self {
        CompileError::Logic(s)
    }
}

pub type CompileResult<T> = Result<T, CompileError>;
