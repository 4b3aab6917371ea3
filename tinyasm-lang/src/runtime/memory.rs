//! Fixed-size cell memory
use super::executor::ExecError;

pub const DEFAULT_MEMORY_SIZE: usize = 32;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Memory {
    cells: Vec<i64>,
}

impl Memory {
    pub fn new(size: usize) -> Self {
        Self {
            cells: vec![0; size],
        }
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    fn check(&self, addr: i64) -> Result<usize, ExecError> {
        usize::try_from(addr)
            .ok()
            .filter(|&a| a < self.cells.len())
            .ok_or(ExecError::AddressOutOfRange {
                addr,
                size: self.cells.len(),
            })
    }

    pub fn read(&self, addr: i64) -> Result<i64, ExecError> {
        let idx = self.check(addr)?;
        Ok(self.cells[idx])
    }

    pub fn write(&mut self, addr: i64, value: i64) -> Result<(), ExecError> {
        let idx = self.check(addr)?;
        self.cells[idx] = value;
        Ok(())
    }

    pub fn clear(&mut self) {
        self.cells.fill(0);
    }

    pub fn cells(&self) -> &[i64] {
        &self.cells
    }

    /// Export the cells as a little-endian byte stream, two bytes per cell.
    ///
    /// Only the low 16 bits of each cell survive, which is what a 16-bit word
    /// view of the stream shows.
    pub fn to_le_bytes(&self) -> Vec<u8> {
        self.cells
            .iter()
            .flat_map(|&cell| (cell as u16).to_le_bytes())
            .collect()
    }
}

impl Default for Memory {
    fn default() -> Self {
        Self::new(DEFAULT_MEMORY_SIZE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_zeroed() {
        let mem = Memory::default();
        assert_eq!(mem.len(), DEFAULT_MEMORY_SIZE);
        assert!(mem.cells().iter().all(|&c| c == 0));
    }

    #[test]
    fn write_then_read() {
        let mut mem = Memory::new(4);
        mem.write(3, -9).unwrap();
        assert_eq!(mem.read(3).unwrap(), -9);
    }

    #[test]
    fn out_of_range_is_a_diagnostic() {
        let mut mem = Memory::new(4);
        assert_eq!(
            mem.write(4, 1).unwrap_err(),
            ExecError::AddressOutOfRange { addr: 4, size: 4 }
        );
        assert_eq!(
            mem.read(-1).unwrap_err(),
            ExecError::AddressOutOfRange { addr: -1, size: 4 }
        );
        assert!(mem.cells().iter().all(|&c| c == 0));
    }

    #[test]
    fn byte_export_is_little_endian() {
        let mut mem = Memory::new(2);
        mem.write(0, 0x1234).unwrap();
        mem.write(1, -1).unwrap();
        assert_eq!(mem.to_le_bytes(), vec![0x34, 0x12, 0xFF, 0xFF]);
    }
}
