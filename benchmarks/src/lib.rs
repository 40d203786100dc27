//! Fixtures partagées par les benches (sources et chunks générés).

use std::fmt::Write as _;

use lox_core::{Chunk, CoreResult, OpCode, Value};

/// Programme `-((1.2 + 3.4) / 5.6)` en assembleur texte.
pub const ARITHMETIC: &str = "CONSTANT 1.2\nCONSTANT 3.4\nADD\nCONSTANT 5.6\nDIVIDE\nNEGATE\nRETURN\n";

/// Source lox d'au moins `kib` KiB (déclarations, chaînes, commentaires).
pub fn synthetic_source(kib: usize) -> String {
    let mut s = String::with_capacity(kib * 1024);
    let mut i = 0usize;
    while s.len() < kib * 1024 {
        let _ = writeln!(
            s,
            "var v{i} = {i}.5 * (v{} + 3) / 7; // step {i}\nprint \"value {i}\";",
            i.saturating_sub(1)
        );
        i += 1;
    }
    s
}

/// Chaîne `c0 op c1 op …` sur `len` constantes ; la pile ne dépasse jamais 2.
pub fn long_chain(len: usize) -> CoreResult<Chunk> {
    const OPS: [OpCode; 4] = [OpCode::Add, OpCode::Multiply, OpCode::Subtract, OpCode::Divide];
    let mut chunk = Chunk::new();
    chunk.write_constant(Value::Number(1.0), 1)?;
    let mut line = 1u32;
    for i in 1..len {
        line += 1;
        chunk.write_constant(Value::Number(f64::from(line) + 0.5), line)?;
        chunk.write_op(OPS[i % OPS.len()], line);
        chunk.write_op(OpCode::Negate, line);
    }
    chunk.write_op(OpCode::Return, line + 1);
    Ok(chunk)
}

/// `depth` chargements de la même constante, réduits par des `ADD`.
pub fn deep_stack(depth: usize) -> CoreResult<Chunk> {
    let mut chunk = Chunk::new();
    let one = chunk.add_constant(Value::Number(1.0))?;
    for _ in 0..depth {
        chunk.write_op(OpCode::Constant, 1);
        chunk.write(one, 1);
    }
    for _ in 1..depth {
        chunk.write_op(OpCode::Add, 2);
    }
    chunk.write_op(OpCode::Return, 3);
    Ok(chunk)
}
