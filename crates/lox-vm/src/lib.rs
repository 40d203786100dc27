//! lox-vm: interpréteur à pile pour les chunks lox
//!
//! - `Vm` : boucle fetch/dispatch sur un [`Chunk`](lox_core::Chunk) emprunté
//! - `Stack` : pile d'opérandes bornée (`STACK_MAX` = 256 par défaut)
//! - `VmConfig` : capacité de pile, trace d'exécution
//! - erreurs typées (`VmError`, `RuntimeError`, `InterpretError`) via `thiserror`
//!
//! Toute faute (opcode inconnu, pile vide ou pleine, constante hors pool,
//! code épuisé) termine l'appel en `RuntimeError` ; rien n'est lu hors bornes.
//!
//! ```
//! use lox_core::asm::assemble;
//! use lox_vm::{InterpretResult, Vm, VmConfig};
//!
//! let chunk = assemble("CONSTANT 1.5\nNEGATE\nRETURN").unwrap();
//! let mut vm = Vm::with_output(VmConfig::default(), Vec::new());
//! assert_eq!(vm.interpret(&chunk), InterpretResult::Ok);
//! assert_eq!(vm.output(), b"-1.5\n");
//! ```

#![deny(missing_docs)]

pub mod config;
pub mod error;
pub mod stack;
mod vm;

pub use config::{VmConfig, STACK_MAX};
pub use error::{InterpretError, RuntimeError, VmError};
pub use stack::Stack;
pub use vm::Vm;

/* ─────────────────────────── Issue d'un appel ─────────────────────────── */

/// Issue fermée d'un appel `interpret`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InterpretResult {
    /// Terminé normalement.
    Ok,
    /// Erreur de compilation (aujourd'hui : erreurs lexicales).
    CompileError,
    /// Faute à l'exécution.
    RuntimeError,
}

impl InterpretResult {
    /// Code de sortie processus (sysexits : 0, 65 `EX_DATAERR`, 70 `EX_SOFTWARE`).
    pub const fn exit_code(self) -> i32 {
        match self {
            Self::Ok => 0,
            Self::CompileError => 65,
            Self::RuntimeError => 70,
        }
    }

    /// Vrai pour `Ok`.
    pub const fn is_ok(self) -> bool { matches!(self, Self::Ok) }
}
