use crate::error::Error;
use std::collections::HashMap;

/// Size in bytes of one variable slot in the frame.
pub const SLOT_SIZE: u32 = 4;

/// Flat variable table for one compilation unit. Offsets are handed out in
/// first-declaration order, starting at 0 and growing by `SLOT_SIZE`.
#[derive(Debug, Default)]
pub struct SymbolTable {
    names: Vec<String>,
    offsets: HashMap<String, u32>,
}

impl SymbolTable {
    pub fn new() -> SymbolTable {
        SymbolTable::default()
    }

    pub fn declare(&mut self, name: &str) -> Result<u32, Error> {
        if self.offsets.contains_key(name) {
            return Err(Error::DuplicateDeclaration(name.to_string()));
        }
        let offset = self.names.len() as u32 * SLOT_SIZE;
        self.names.push(name.to_string());
        self.offsets.insert(name.to_string(), offset);
        Ok(offset)
    }

    pub fn lookup(&self, name: &str) -> Result<u32, Error> {
        self.offsets
            .get(name)
            .cloned()
            .ok_or_else(|| Error::UndeclaredVariable(name.to_string()))
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Variables with their offsets, in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, u32)> + '_ {
        self.names
            .iter()
            .enumerate()
            .map(|(i, name)| (name.as_str(), i as u32 * SLOT_SIZE))
    }
}
