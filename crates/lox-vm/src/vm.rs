//! Boucle de dispatch.

use std::io::{self, Stdout, Write};

use lox_core::{disasm::disassemble_instruction, Chunk, OpCode, Value};
use lox_lexer::scan_all;

use crate::config::VmConfig;
use crate::error::{InterpretError, RuntimeError, VmError};
use crate::stack::Stack;
use crate::InterpretResult;

/// Machine à pile. Possède sa pile et son curseur d'instruction ; emprunte le
/// chunk le temps d'un appel sans jamais le modifier.
#[derive(Debug)]
pub struct Vm<W: Write = Stdout> {
    config: VmConfig,
    stack: Stack,
    /// Prochain octet à lire.
    ip: usize,
    /// Début de l'instruction en cours (pour la ligne des erreurs).
    op_start: usize,
    out: W,
    last_error: Option<InterpretError>,
}

impl Vm<Stdout> {
    /// VM qui écrit ses résultats sur la sortie standard.
    pub fn new(config: VmConfig) -> Self { Self::with_output(config, io::stdout()) }
}

impl Default for Vm<Stdout> {
    fn default() -> Self { Self::new(VmConfig::default()) }
}

impl<W: Write> Vm<W> {
    /// VM qui écrit ses résultats dans `out`.
    pub fn with_output(config: VmConfig, out: W) -> Self {
        let stack = Stack::new(config.stack_capacity);
        Self { config, stack, ip: 0, op_start: 0, out, last_error: None }
    }

    /// Pile d'opérandes (état après le dernier appel).
    pub fn stack(&self) -> &Stack { &self.stack }

    /// Canal de sortie.
    pub fn output(&self) -> &W { &self.out }

    /// Canal de sortie, mutable (pour intercaler des dumps).
    pub fn output_mut(&mut self) -> &mut W { &mut self.out }

    /// Erreur du dernier appel, s'il a échoué.
    pub fn last_error(&self) -> Option<&InterpretError> { self.last_error.as_ref() }

    /// Exécute `chunk` jusqu'à `OP_RETURN` et rend la valeur retournée.
    pub fn execute(&mut self, chunk: &Chunk) -> Result<Value, RuntimeError> {
        self.reset();
        self.run(chunk).map_err(|error| RuntimeError { error, line: self.current_line(chunk) })
    }

    /// Exécute `chunk` et réduit l'issue à un [`InterpretResult`].
    pub fn interpret(&mut self, chunk: &Chunk) -> InterpretResult {
        match self.execute(chunk) {
            Ok(_) => {
                self.last_error = None;
                InterpretResult::Ok
            }
            Err(err) => {
                tracing::debug!(line = err.line, "runtime error: {}", err.error);
                self.last_error = Some(InterpretError::Runtime(err));
                InterpretResult::RuntimeError
            }
        }
    }

    /// Analyse lexicalement `source`. Toute erreur lexicale donne
    /// `CompileError` ; sans compilateur, rien n'est exécuté.
    pub fn interpret_source(&mut self, source: &str) -> InterpretResult {
        self.reset();
        match scan_all(source) {
            Ok(tokens) => {
                tracing::debug!(tokens = tokens.len(), "source scanned");
                self.last_error = None;
                InterpretResult::Ok
            }
            Err(errors) => {
                self.last_error = Some(InterpretError::Compile(errors));
                InterpretResult::CompileError
            }
        }
    }

    fn reset(&mut self) {
        self.stack.clear();
        self.ip = 0;
        self.op_start = 0;
    }

    fn run(&mut self, chunk: &Chunk) -> Result<Value, VmError> {
        loop {
            if let Some(value) = self.step(chunk)? {
                return Ok(value);
            }
        }
    }

    /// Exécute une instruction ; `Some(v)` quand `OP_RETURN` termine l'appel.
    fn step(&mut self, chunk: &Chunk) -> Result<Option<Value>, VmError> {
        self.op_start = self.ip;
        if self.config.trace_execution {
            self.trace(chunk);
        }

        let byte = self.read_byte(chunk)?;
        match OpCode::try_from(byte).map_err(VmError::UnknownOpcode)? {
            OpCode::Constant => {
                let index = self.read_byte(chunk)?;
                let value = chunk
                    .constants()
                    .get(usize::from(index))
                    .ok_or(VmError::InvalidConstant { index, pool_len: chunk.constants().len() })?;
                self.stack.push(value)?;
            }
            OpCode::Add => self.binary(|a, b| a + b)?,
            OpCode::Subtract => self.binary(|a, b| a - b)?,
            OpCode::Multiply => self.binary(|a, b| a * b)?,
            OpCode::Divide => self.binary(|a, b| a / b)?,
            OpCode::Negate => {
                let value = self.stack.pop()?;
                self.stack.push(Value::Number(-value.as_number()))?;
            }
            OpCode::Return => {
                let value = self.stack.pop()?;
                writeln!(self.out, "{value}")?;
                self.out.flush()?;
                return Ok(Some(value));
            }
        }
        Ok(None)
    }

    #[inline]
    fn read_byte(&mut self, chunk: &Chunk) -> Result<u8, VmError> {
        let byte = *chunk.code().get(self.ip).ok_or(VmError::UnexpectedEnd)?;
        self.ip += 1;
        Ok(byte)
    }

    /// Dépile la droite puis la gauche.
    #[inline]
    fn binary(&mut self, op: impl FnOnce(f64, f64) -> f64) -> Result<(), VmError> {
        let right = self.stack.pop()?.as_number();
        let left = self.stack.pop()?.as_number();
        self.stack.push(Value::Number(op(left, right)))
    }

    fn current_line(&self, chunk: &Chunk) -> u32 {
        let lines = chunk.lines();
        lines
            .line_for_offset(self.op_start)
            .or_else(|| lines.as_slice().last().copied())
            .unwrap_or_default()
    }

    fn trace(&self, chunk: &Chunk) {
        let stack: String = self.stack.iter().map(|v| format!("[ {v} ]")).collect();
        let mut instruction = String::new();
        disassemble_instruction(chunk, self.ip, &mut instruction);
        tracing::trace!(target: "lox_vm::exec", "          {stack}\n{}", instruction.trim_end());
    }
}
