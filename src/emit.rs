use crate::error::Error;
use crate::instr::{encode, to_bit_string, Instruction};
use std::fs;
use std::path::Path;
use tracing::{info, trace};

/// An encoded program. Instruction `i` is word `i`; execution starts at 0.
#[derive(Debug)]
pub struct Artifact {
    instructions: Vec<Instruction>,
    words: Vec<u32>,
}

/// Encodes every instruction up front, so a failure leaves nothing behind.
pub fn emit(instrs: &[Instruction]) -> Result<Artifact, Error> {
    let words = instrs.iter().map(encode).collect::<Result<Vec<u32>, Error>>()?;
    for (i, (instr, word)) in instrs.iter().zip(&words).enumerate() {
        trace!(index = i, word = %to_bit_string(*word), "{}", instr);
    }
    Ok(Artifact {
        instructions: instrs.to_vec(),
        words,
    })
}

impl Artifact {
    #[cfg(test)]
    pub fn words(&self) -> &[u32] {
        &self.words
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Big-endian words, back to back, no header.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.words.len() * 4);
        for word in &self.words {
            bytes.extend_from_slice(&word.to_be_bytes());
        }
        bytes
    }

    pub fn to_text(&self) -> String {
        self.words
            .iter()
            .map(|w| to_bit_string(*w))
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn listing(&self) -> String {
        let mut out = String::new();
        for (i, (instr, word)) in self.instructions.iter().zip(&self.words).enumerate() {
            out.push_str(&format!("{:4}  {:08x}  {}\n", i, word, instr));
        }
        out
    }

    pub fn write<P: AsRef<Path>, Q: AsRef<Path>>(&self, binary: P, text: Q) -> Result<(), Error> {
        fs::write(&binary, self.to_bytes())?;
        if let Err(e) = fs::write(&text, self.to_text()) {
            // Both files or neither.
            let _ = fs::remove_file(&binary);
            return Err(Error::IO(e));
        }
        info!(
            instructions = self.len(),
            binary = %binary.as_ref().display(),
            text = %text.as_ref().display(),
            "wrote artifacts"
        );
        Ok(())
    }
}
