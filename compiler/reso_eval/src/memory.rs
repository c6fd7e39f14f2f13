//! Byte-addressed allocation table.

use crate::{EvalError, EvalResult};

const OFFSET_BITS: u32 = 32;
const OFFSET_MASK: u64 = (1 << OFFSET_BITS) - 1;

/// Heap and stack storage of one interpreter run.
pub(crate) struct Memory {
    /// Slot 0 stands for `null` and is never allocated.
    blocks: Vec<Option<Vec<u8>>>,
}

impl Memory {
    pub(crate) fn new() -> Self {
        Memory { blocks: vec![None] }
    }

    /// Allocate `size` zeroed bytes.
    pub(crate) fn allocate(&mut self, size: u64) -> EvalResult<u64> {
        if size > OFFSET_MASK {
            return Err(EvalError::AllocationTooLarge(size));
        }
        let len = usize::try_from(size).map_err(|_| EvalError::AllocationTooLarge(size))?;
        let id = self.blocks.len() as u64;
        self.blocks.push(Some(vec![0; len]));
        Ok(id << OFFSET_BITS)
    }

    /// Release the allocation `addr` points into. Later accesses fail.
    pub(crate) fn release(&mut self, addr: u64) {
        if let Some(slot) = self.blocks.get_mut(block_index(addr)) {
            *slot = None;
        }
    }

    pub(crate) fn live_allocations(&self) -> usize {
        self.blocks.iter().filter(|b| b.is_some()).count()
    }

    fn locate(&self, addr: u64, len: u64) -> EvalResult<(usize, usize, usize)> {
        let index = block_index(addr);
        if index == 0 {
            return Err(EvalError::NullDereference);
        }
        let invalid = || EvalError::InvalidAccess { addr, len };
        let block = self
            .blocks
            .get(index)
            .and_then(Option::as_ref)
            .ok_or_else(invalid)?;
        let start = usize::try_from(addr & OFFSET_MASK).map_err(|_| invalid())?;
        let end = usize::try_from(len)
            .ok()
            .and_then(|len| start.checked_add(len))
            .filter(|end| *end <= block.len())
            .ok_or_else(invalid)?;
        Ok((index, start, end))
    }

    pub(crate) fn read(&self, addr: u64, len: u64) -> EvalResult<&[u8]> {
        let (index, start, end) = self.locate(addr, len)?;
        match &self.blocks[index] {
            Some(block) => Ok(&block[start..end]),
            None => Err(EvalError::InvalidAccess { addr, len }),
        }
    }

    pub(crate) fn write(&mut self, addr: u64, bytes: &[u8]) -> EvalResult<()> {
        let (index, start, end) = self.locate(addr, bytes.len() as u64)?;
        match &mut self.blocks[index] {
            Some(block) => {
                block[start..end].copy_from_slice(bytes);
                Ok(())
            }
            None => Err(EvalError::InvalidAccess {
                addr,
                len: bytes.len() as u64,
            }),
        }
    }

    /// Little-endian unsigned integer of `size` bytes.
    pub(crate) fn read_uint(&self, addr: u64, size: u64) -> EvalResult<u64> {
        let bytes = self.read(addr, size)?;
        Ok(bytes
            .iter()
            .rev()
            .fold(0u64, |acc, byte| (acc << 8) | u64::from(*byte)))
    }

    pub(crate) fn write_uint(&mut self, addr: u64, size: u64, value: u64) -> EvalResult<()> {
        let bytes = value.to_le_bytes();
        let len = usize::try_from(size)
            .ok()
            .filter(|len| *len <= bytes.len())
            .ok_or(EvalError::InvalidAccess { addr, len: size })?;
        self.write(addr, &bytes[..len])
    }

    /// Copy `len` bytes; overlapping ranges behave like `memmove`.
    pub(crate) fn copy(&mut self, dst: u64, src: u64, len: u64) -> EvalResult<()> {
        if len == 0 {
            return Ok(());
        }
        let bytes = self.read(src, len)?.to_vec();
        self.write(dst, &bytes)
    }

    /// NUL-terminated byte string starting at `addr`.
    pub(crate) fn read_c_string(&self, addr: u64) -> EvalResult<String> {
        let mut bytes = Vec::new();
        let mut cursor = addr;
        loop {
            let byte = self.read(cursor, 1)?[0];
            if byte == 0 {
                break;
            }
            bytes.push(byte);
            cursor = cursor.wrapping_add(1);
        }
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

#[inline]
fn block_index(addr: u64) -> usize {
    (addr >> OFFSET_BITS) as usize
}
