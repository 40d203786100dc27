//! Pile d'opérandes bornée.

use lox_core::Value;

use crate::error::VmError;

/// Pile de valeurs à capacité fixe ; débordement et sous-débordement sont des erreurs.
#[derive(Debug, Clone)]
pub struct Stack {
    values: Vec<Value>,
    capacity: usize,
}

impl Stack {
    /// Pile vide de capacité `capacity`.
    pub fn new(capacity: usize) -> Self {
        Self { values: Vec::with_capacity(capacity), capacity }
    }

    /// Empile `value`.
    pub fn push(&mut self, value: Value) -> Result<(), VmError> {
        if self.values.len() >= self.capacity {
            return Err(VmError::StackOverflow { capacity: self.capacity });
        }
        self.values.push(value);
        Ok(())
    }

    /// Dépile le sommet.
    pub fn pop(&mut self) -> Result<Value, VmError> {
        self.values.pop().ok_or(VmError::StackUnderflow)
    }

    /// Lit le sommet sans le retirer.
    pub fn peek(&self) -> Result<Value, VmError> {
        self.values.last().copied().ok_or(VmError::StackUnderflow)
    }

    /// Nombre de valeurs présentes.
    pub fn len(&self) -> usize { self.values.len() }

    /// Vrai si la pile est vide.
    pub fn is_empty(&self) -> bool { self.values.is_empty() }

    /// Ramène le curseur à la base.
    pub fn clear(&mut self) { self.values.clear(); }

    /// Parcours de la base vers le sommet.
    pub fn iter(&self) -> impl Iterator<Item = &Value> + '_ { self.values.iter() }
}
