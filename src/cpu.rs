// src/cpu.rs
//! CPU stand-in for the print buffer and the generated GLSL.
//!
//! `HostPrintBuffer::execute` performs exactly what one rewritten call does on
//! the device: an atomic reservation on word 0, then the record's words only if
//! all of them fit. Used as the oracle for decoder tests and to drive many
//! concurrent "invocations" through rayon.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::{
    decode::{DecodedReport, decode_buffer},
    error::{PrintfError, Result},
    format::{EmitOp, Family, FormatProgram},
};

/// A shader value passed to a print call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Float(f32),
    Int(i32),
    Uint(u32),
    /// `vecN`/`ivecN`/`uvecN`, components in `x y z w` order.
    Vector(Vec<Value>),
}

static ZERO: Value = Value::Uint(0);

impl Value {
    fn component(&self, c: Option<u8>) -> &Value {
        match (self, c) {
            (Value::Vector(v), Some(i)) => v.get(i as usize).unwrap_or(&ZERO),
            (Value::Vector(v), None) => v.first().unwrap_or(&ZERO),
            (scalar, _) => scalar,
        }
    }

    /// `floatBitsToUint(x)`, with GLSL's implicit int to float conversion.
    fn float_bits(&self) -> u32 {
        match *self {
            Value::Float(f) => f.to_bits(),
            Value::Int(i) => (i as f32).to_bits(),
            Value::Uint(u) => (u as f32).to_bits(),
            Value::Vector(_) => self.component(None).float_bits(),
        }
    }

    /// `uint(x)`.
    fn uint_bits(&self) -> u32 {
        match *self {
            Value::Float(f) => f as u32,
            Value::Int(i) => i as u32,
            Value::Uint(u) => u,
            Value::Vector(_) => self.component(None).uint_bits(),
        }
    }
}

/// The words one execution of `program` writes, given its value arguments.
pub fn encode_record(program: &FormatProgram, values: &[Value]) -> Result<Vec<u32>> {
    if values.len() != program.args_consumed {
        return Err(PrintfError::ArgumentCountMismatch {
            offset: 0,
            expected: program.args_consumed,
            supplied: values.len(),
            call: String::new(),
        });
    }
    Ok(program
        .ops
        .iter()
        .map(|op| match op {
            EmitOp::Literal(c) => *c,
            EmitOp::Field(f) => {
                let v = values[f.argument].component(f.component);
                match f.family() {
                    Family::Float => v.float_bits(),
                    Family::Integer => v.uint_bits(),
                }
            }
        })
        .collect())
}

/// The generated guard, `cur<=len&&len-cur>=n`, in the same `u32` arithmetic.
fn fits(cur: u32, n: u32, len: u32) -> bool {
    cur <= len && len - cur >= n
}

/// Host-memory print buffer: word 0 is the reservation counter, the rest is
/// the payload.
pub struct HostPrintBuffer {
    words: Vec<AtomicU32>,
    enabled: AtomicBool,
}

impl HostPrintBuffer {
    /// A reset buffer of `capacity_words` words (at least one, the counter).
    pub fn new(capacity_words: usize) -> Self {
        let words = (0..capacity_words.max(1)).map(|_| AtomicU32::new(0)).collect();
        let buf = Self {
            words,
            enabled: AtomicBool::new(true),
        };
        buf.reset();
        buf
    }

    pub fn capacity_words(&self) -> usize {
        self.words.len()
    }

    /// `uint(buf.length())` as the shader sees it.
    fn len_u32(&self) -> u32 {
        u32::try_from(self.words.len()).unwrap_or(u32::MAX)
    }

    /// Zeroes the payload and sets the counter to its empty value of 1.
    pub fn reset(&self) {
        for w in &self.words[1..] {
            w.store(0, Ordering::Relaxed);
        }
        self.words[0].store(1, Ordering::Release);
    }

    pub fn enable(&self) {
        self.enabled.store(true, Ordering::Relaxed);
    }

    pub fn disable(&self) {
        self.enabled.store(false, Ordering::Relaxed);
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }

    /// Runs one call. Returns whether the record was written; a disabled
    /// buffer or a record that does not fit is skipped silently.
    ///
    /// The counter is a `u32` that wraps like the device's `atomicAdd`.
    pub fn execute(&self, program: &FormatProgram, values: &[Value]) -> Result<bool> {
        let record = encode_record(program, values)?;
        if !self.is_enabled() {
            return Ok(false);
        }
        let n = u32::try_from(record.len()).unwrap_or(u32::MAX);
        let start = self.words[0].fetch_add(n, Ordering::AcqRel);
        if !fits(start, n, self.len_u32()) {
            return Ok(false);
        }
        let start = start as usize;
        for (slot, w) in self.words[start..start + record.len()].iter().zip(record) {
            slot.store(w, Ordering::Relaxed);
        }
        Ok(true)
    }

    /// Runs `program` once per entry of `invocations`, in parallel. Returns
    /// how many records were written.
    pub fn dispatch(&self, program: &FormatProgram, invocations: &[Vec<Value>]) -> Result<usize> {
        let written = invocations
            .par_iter()
            .map(|values| self.execute(program, values))
            .collect::<Result<Vec<bool>>>()?;
        Ok(written.into_iter().filter(|&w| w).count())
    }

    pub fn snapshot(&self) -> Vec<u32> {
        self.words.iter().map(|w| w.load(Ordering::Acquire)).collect()
    }

    pub fn read_report(&self) -> DecodedReport {
        decode_buffer(&self.snapshot())
    }

    pub fn read_string(&self) -> String {
        self.read_report().text
    }
}
