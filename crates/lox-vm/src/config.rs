//! Limites et options d'exécution de la VM.

/// Capacité par défaut de la pile d'opérandes.
pub const STACK_MAX: usize = 256;

/// Configuration d'une instance de [`Vm`](crate::Vm).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VmConfig {
    /// Nombre maximal de valeurs sur la pile.
    pub stack_capacity: usize,

    /// Émet un événement `trace` (pile + instruction) avant chaque dispatch.
    pub trace_execution: bool,
}

impl Default for VmConfig {
    fn default() -> Self {
        Self { stack_capacity: STACK_MAX, trace_execution: false }
    }
}

impl VmConfig {
    /// Configuration par défaut.
    pub fn new() -> Self { Self::default() }

    /// Fixe la capacité de la pile.
    #[must_use]
    pub const fn with_stack_capacity(mut self, capacity: usize) -> Self {
        self.stack_capacity = capacity;
        self
    }

    /// Active ou coupe la trace d'exécution.
    #[must_use]
    pub const fn with_trace(mut self, on: bool) -> Self {
        self.trace_execution = on;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_256_slots() {
        let cfg = VmConfig::new();
        assert_eq!(cfg.stack_capacity, 256);
        assert!(!cfg.trace_execution);
        assert_eq!(cfg.with_stack_capacity(4).with_trace(true), VmConfig { stack_capacity: 4, trace_execution: true });
    }
}
