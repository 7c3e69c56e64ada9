use bytes::BufMut;

/// Length-encoded integer operation.
///
/// <https://dev.mysql.com/doc/dev/mysql-server/latest/page_protocol_basic_dt_integers.html>
pub trait LenEncExt {
    /// Number of bytes the length-encoded form of `self` occupies.
    fn lenenc_len(self) -> usize;
}

/// Length-encoded operation in [`BufMut`].
pub trait BufMutExt {
    /// Write a length-encoded integer.
    fn put_lenenc_int(&mut self, value: u64);

    /// Write length-encoded integer followed by the bytes themselves.
    fn put_lenenc_bytes(&mut self, bytes: &[u8]);
}

impl LenEncExt for u64 {
    fn lenenc_len(self) -> usize {
        match self {
            ..251 => 1,
            251..0x1_0000 => 3,
            0x1_0000..0x100_0000 => 4,
            _ => 9,
        }
    }
}

impl LenEncExt for usize {
    fn lenenc_len(self) -> usize {
        (self as u64).lenenc_len()
    }
}

impl<B: BufMut> BufMutExt for B {
    fn put_lenenc_int(&mut self, value: u64) {
        match value {
            ..251 => self.put_u8(value as u8),
            251..0x1_0000 => {
                self.put_u8(0xfc);
                self.put_u16_le(value as u16);
            }
            0x1_0000..0x100_0000 => {
                self.put_u8(0xfd);
                self.put_uint_le(value, 3);
            }
            _ => {
                self.put_u8(0xfe);
                self.put_u64_le(value);
            }
        }
    }

    fn put_lenenc_bytes(&mut self, bytes: &[u8]) {
        self.put_lenenc_int(bytes.len() as u64);
        self.put_slice(bytes);
    }
}
