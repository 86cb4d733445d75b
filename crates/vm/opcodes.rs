//! The opcode values the code stream needs to know by name.

pub const STOP: u8 = 0x00;
pub const JUMPDEST: u8 = 0x5b;
pub const PUSH1: u8 = 0x60;
pub const PUSH32: u8 = 0x7f;

/// Number of trailing data bytes a PUSHn opcode carries, if `opcode` is one.
pub fn push_data_size(opcode: u8) -> Option<usize> {
    (PUSH1..=PUSH32)
        .contains(&opcode)
        .then(|| (opcode - PUSH1 + 1) as usize)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_data_sizes() {
        assert_eq!(push_data_size(PUSH1), Some(1));
        assert_eq!(push_data_size(PUSH32), Some(32));
        assert_eq!(push_data_size(JUMPDEST), None);
        assert_eq!(push_data_size(STOP), None);
    }
}
