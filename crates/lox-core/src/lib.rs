//! lox-core: primitives partagées du bytecode lox (no_std-ready)
//!
//! Fournit :
//! - `Value` (valeur runtime, union étiquetée extensible)
//! - `bytecode::chunk` : `Chunk`, `ConstPool`, `LineTable`, image binaire `LOXC`
//! - `bytecode::opcode` : `OpCode` (encodage un octet)
//! - `bytecode::disasm` : désassembleur textuel
//! - `bytecode::asm` : assembleur texte minimal (programmes écrits à la main)
//! - `bytecode::helpers` : validation structurelle, bornes d'instructions
//! - `crc32_ieee` (compact, sans table)
//! - Erreurs `CoreError` + alias `CoreResult<T>`
//!
//! Features :
//! - `std` (par défaut) : impl `std::error::Error`
//! - `serde` : derive (dé)sérialisation sur `Value` et `OpCode`

#![deny(missing_docs)]
#![cfg_attr(not(feature = "std"), no_std)]

/* ─────────────────────────── Imports ─────────────────────────── */

use core::fmt;

#[cfg(feature = "std")]
use std::borrow::Cow;

#[cfg(not(feature = "std"))]
use alloc::borrow::Cow;

#[cfg(not(feature = "std"))]
extern crate alloc;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/* ─────────────────────────── Modules publics ─────────────────────────── */

/// Primitives de bytecode (chunk, opcodes, assembleur, désassembleur, helpers).
pub mod bytecode;

/// Raccourci : le désassembleur textuel.
pub use bytecode::disasm;
/// Raccourci : l'assembleur texte.
pub use bytecode::asm;
/// Raccourci : les validations structurelles.
pub use bytecode::helpers;

pub use bytecode::chunk::{Chunk, ChunkError, ConstPool, LineTable, MAX_CONSTANTS};
pub use bytecode::opcode::OpCode;

/* ─────────────────────────── Résultat commun ─────────────────────────── */

/// Alias résultat commun au core.
pub type CoreResult<T> = core::result::Result<T, CoreError>;

/* ─────────────────────────── Valeurs ─────────────────────────── */

/// Valeur manipulée par la VM et stockée dans le pool de constantes.
///
/// Un seul variant aujourd'hui ; les booléens, `nil` et les références tas
/// viendront s'ajouter ici sans changer le contrat pile/pool.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Value {
    /// Flottant double précision.
    Number(f64),
}

impl Value {
    /// Renvoie le nombre porté par la valeur.
    pub const fn as_number(self) -> f64 {
        match self {
            Value::Number(n) => n,
        }
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self { Value::Number(n) }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(n) => write!(f, "{n}"),
        }
    }
}

/* ─────────────────────────── CRC32 IEEE ─────────────────────────── */

/// CRC32 (IEEE 802.3), implémentation compacte sans table.
pub fn crc32_ieee(data: &[u8]) -> u32 {
    let mut crc: u32 = 0xFFFF_FFFF;
    for &b in data {
        crc ^= u32::from(b);
        // 8 itérations (bitwise), polynôme réfléchi 0xEDB88320
        for _ in 0..8 {
            let mask = (crc & 1).wrapping_neg() & 0xEDB8_8320;
            crc = (crc >> 1) ^ mask;
        }
    }
    !crc
}

/* ─────────────────────────── Erreurs ─────────────────────────── */

/// Erreurs de bas niveau communes.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum CoreError {
    /// Le pool de constantes est plein (opérande d'un octet).
    TooManyConstants {
        /// Nombre maximal de constantes adressables.
        limit: usize,
    },
    /// Ligne d'assembleur invalide.
    Assembly {
        /// Ligne (1-based) du texte assemblé.
        line: u32,
        /// Détail.
        message: Cow<'static, str>,
    },
    /// Chunk incohérent (opérande tronqué, index hors pool…).
    Corrupted(Cow<'static, str>),
}

impl CoreError {
    /// Construit une erreur « corrompu ».
    pub fn corrupted(msg: impl Into<Cow<'static, str>>) -> Self { CoreError::Corrupted(msg.into()) }

    /// Construit une erreur d'assemblage.
    pub fn assembly(line: u32, msg: impl Into<Cow<'static, str>>) -> Self {
        CoreError::Assembly { line, message: msg.into() }
    }
}

impl fmt::Display for CoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoreError::TooManyConstants { limit } => write!(f, "too many constants in one chunk (limit {limit})"),
            CoreError::Assembly { line, message } => write!(f, "[line {line}] assembly error: {message}"),
            CoreError::Corrupted(msg) => write!(f, "corrupted chunk: {msg}"),
        }
    }
}

/// Implémente `std::error::Error` uniquement avec la feature `std`.
#[cfg(feature = "std")]
impl std::error::Error for CoreError {}

/* ─────────────────────────── Tests ─────────────────────────── */
