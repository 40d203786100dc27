//! Erreurs de la VM.
//!
//! - [`VmError`] : la faute brute levée par la boucle de dispatch
//! - [`RuntimeError`] : la même faute localisée sur une ligne source
//! - [`InterpretError`] : ce que retient `Vm::last_error()` après un appel

use std::io;

use lox_lexer::LexError;
use thiserror::Error;

/// Faute détectée pendant l'exécution d'un chunk.
#[derive(Debug, Error)]
pub enum VmError {
    /// Octet qui ne correspond à aucun opcode.
    #[error("Unknown opcode {0}.")]
    UnknownOpcode(u8),

    /// `pop` sur une pile vide.
    #[error("Stack underflow.")]
    StackUnderflow,

    /// `push` au-delà de la capacité.
    #[error("Stack overflow (capacity {capacity}).")]
    StackOverflow {
        /// Capacité configurée.
        capacity: usize,
    },

    /// Opérande de `OP_CONSTANT` hors du pool.
    #[error("Constant index {index} out of range (pool has {pool_len}).")]
    InvalidConstant {
        /// Index lu dans le code.
        index: u8,
        /// Taille du pool.
        pool_len: usize,
    },

    /// Code épuisé sans `OP_RETURN`, ou opérande tronqué.
    #[error("Unexpected end of bytecode.")]
    UnexpectedEnd,

    /// Échec d'écriture sur la sortie du programme.
    #[error("output error: {0}")]
    Output(#[from] io::Error),
}

/// Faute runtime avec la ligne de l'instruction fautive.
#[derive(Debug, Error)]
#[error("{error}\n[line {line}] in script")]
pub struct RuntimeError {
    /// Cause.
    #[source]
    pub error: VmError,
    /// Ligne source de l'instruction (0 si le chunk est vide).
    pub line: u32,
}

/// Erreur retenue par le dernier appel d'interprétation.
#[derive(Debug, Error)]
pub enum InterpretError {
    /// Diagnostics lexicaux, dans l'ordre de la source.
    #[error("{}", render_lex_errors(.0))]
    Compile(Vec<LexError>),

    /// Faute d'exécution.
    #[error(transparent)]
    Runtime(#[from] RuntimeError),
}

fn render_lex_errors(errors: &[LexError]) -> String {
    errors.iter().map(ToString::to_string).collect::<Vec<_>>().join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn runtime_error_names_the_line() {
        let err = RuntimeError { error: VmError::StackUnderflow, line: 3 };
        assert_eq!(err.to_string(), "Stack underflow.\n[line 3] in script");
    }

    #[test]
    fn compile_error_lists_every_diagnostic() {
        let err = InterpretError::Compile(vec![
            LexError { line: 1, message: "Unexpected character.".into() },
            LexError { line: 4, message: "Unterminated string.".into() },
        ]);
        assert_eq!(
            err.to_string(),
            "[line 1] Error: Unexpected character.\n[line 4] Error: Unterminated string."
        );
    }
}
