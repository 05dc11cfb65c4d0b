//! Deferred-write wire-format writer.

use protowire_longbits::LongBits;

use crate::op::Op;
use crate::types::WireType;
use crate::utf8;

/// Frame saved by [`Writer::fork`], innermost last on the stack.
#[derive(Debug, Clone, Copy)]
struct State {
    /// Index of the first op belonging to the forked sub-message.
    ops_start: usize,
    /// Queued byte length of the surrounding message.
    len: usize,
}

/// A Protocol Buffers wire-format writer.
///
/// Write calls queue operations instead of mutating bytes: each records its
/// value and exact byte width, and [`finish`](Writer::finish) makes a single
/// allocation of the accumulated length and emits the queue into it in one
/// pass. Separating width computation from emission is what makes nested
/// messages cheap — [`fork`](Writer::fork) opens a sub-message whose length
/// prefix is unknown, and [`ldelim`](Writer::ldelim_field) closes it by
/// inserting the tag and varint length in front of the queued children.
///
/// All write methods return the writer for chaining.
///
/// # Example
///
/// ```
/// use protowire::{WireType, Writer};
///
/// let mut writer = Writer::new();
/// writer.tag(1, WireType::Varint).uint32(150);
/// assert_eq!(writer.finish(), [0x08, 0x96, 0x01]);
/// ```
#[derive(Debug, Default)]
pub struct Writer {
    /// Queued operations, in emission order.
    ops: Vec<Op>,
    /// Byte length queued in the current frame.
    len: usize,
    /// Open fork frames.
    states: Vec<State>,
}

impl Writer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Byte length the next [`finish`](Writer::finish) will allocate.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    fn push(&mut self, op: Op) -> &mut Self {
        self.len += op.width();
        self.ops.push(op);
        self
    }

    // ------------------------------------------------------------- varint

    /// Writes an unsigned 32-bit varint, 1 through 5 bytes.
    pub fn uint32(&mut self, value: u32) -> &mut Self {
        self.push(Op::Varint32(value))
    }

    /// Writes a signed 32-bit varint.
    ///
    /// Negative values widen to a sign-extended 64-bit varint and always
    /// take ten bytes, per the wire format.
    pub fn int32(&mut self, value: i32) -> &mut Self {
        if value < 0 {
            self.push(Op::Varint64(LongBits::from_i64(value as i64)))
        } else {
            self.uint32(value as u32)
        }
    }

    /// Writes a zig-zag-encoded signed 32-bit varint.
    pub fn sint32(&mut self, value: i32) -> &mut Self {
        self.uint32(((value << 1) ^ (value >> 31)) as u32)
    }

    /// Writes an unsigned 64-bit varint, 1 through 10 bytes.
    pub fn uint64(&mut self, value: u64) -> &mut Self {
        self.push(Op::Varint64(LongBits::from_u64(value)))
    }

    /// Writes a signed 64-bit varint.
    ///
    /// Identical to [`uint64`](Writer::uint64) on the wire: two's complement
    /// already sign-extends inside [`LongBits`].
    pub fn int64(&mut self, value: i64) -> &mut Self {
        self.push(Op::Varint64(LongBits::from_i64(value)))
    }

    /// Writes a zig-zag-encoded signed 64-bit varint.
    pub fn sint64(&mut self, value: i64) -> &mut Self {
        let mut bits = LongBits::from_i64(value);
        bits.zz_encode();
        self.push(Op::Varint64(bits))
    }

    /// Writes a single byte, `0x01` or `0x00`.
    pub fn bool(&mut self, value: bool) -> &mut Self {
        self.push(Op::Byte(value as u8))
    }

    // ------------------------------------------------------------- fixed

    /// Writes four little-endian bytes.
    pub fn fixed32(&mut self, value: u32) -> &mut Self {
        self.push(Op::Fixed32(value))
    }

    /// Writes four little-endian bytes after a zig-zag transform.
    pub fn sfixed32(&mut self, value: i32) -> &mut Self {
        self.fixed32(((value << 1) ^ (value >> 31)) as u32)
    }

    /// Writes eight little-endian bytes, low word first.
    pub fn fixed64(&mut self, value: u64) -> &mut Self {
        self.push(Op::Fixed64(LongBits::from_u64(value)))
    }

    /// Writes eight little-endian bytes after a zig-zag transform.
    pub fn sfixed64(&mut self, value: i64) -> &mut Self {
        let mut bits = LongBits::from_i64(value);
        bits.zz_encode();
        self.push(Op::Fixed64(bits))
    }

    /// Writes an IEEE-754 binary32, little-endian.
    ///
    /// The bit pattern is preserved, so negative zero, infinities and NaNs
    /// round-trip bitwise.
    pub fn float(&mut self, value: f32) -> &mut Self {
        self.push(Op::Fixed32(value.to_bits()))
    }

    /// Writes an IEEE-754 binary64, little-endian.
    pub fn double(&mut self, value: f64) -> &mut Self {
        self.push(Op::Fixed64(LongBits::from_u64(value.to_bits())))
    }

    // ------------------------------------------------- length-delimited

    /// Writes a varint length prefix followed by the raw bytes.
    ///
    /// Empty input emits the single byte `0x00`. The bytes are copied on
    /// enqueue, so the caller's buffer is free immediately.
    pub fn bytes(&mut self, data: &[u8]) -> &mut Self {
        if data.is_empty() {
            return self.push(Op::Byte(0));
        }
        self.uint32(data.len() as u32);
        self.push(Op::Bytes(data.to_vec()))
    }

    /// Writes a varint length prefix followed by the UTF-8 bytes.
    ///
    /// Rust strings are already UTF-8, so the stored bytes go to the wire
    /// verbatim; see [`string_utf16`](Writer::string_utf16) for raw code
    /// units.
    pub fn string(&mut self, value: &str) -> &mut Self {
        if value.is_empty() {
            return self.push(Op::Byte(0));
        }
        self.uint32(value.len() as u32);
        self.push(Op::Bytes(value.as_bytes().to_vec()))
    }

    /// Writes a length-prefixed string from raw UTF-16 code units.
    ///
    /// Surrogate pairs combine into 4-byte sequences; an unpaired surrogate
    /// is emitted as a raw 3-byte sequence. The length prefix comes from a
    /// pre-scan that matches the emission byte-for-byte.
    pub fn string_utf16(&mut self, units: &[u16]) -> &mut Self {
        let length = utf8::utf16_length(units);
        if length == 0 {
            return self.push(Op::Byte(0));
        }
        self.uint32(length as u32);
        self.push(Op::Utf16(units.to_vec()))
    }

    /// Appends pre-encoded bytes with no length prefix.
    pub fn raw(&mut self, data: &[u8]) -> &mut Self {
        if data.is_empty() {
            return self;
        }
        self.push(Op::Bytes(data.to_vec()))
    }

    // ------------------------------------------------------------- tags

    /// Writes a field tag, `(field_id << 3) | wire_type`, as a varint.
    ///
    /// Field ids of 15 and below fit in one byte; larger ids take the
    /// multi-byte varint form.
    pub fn tag(&mut self, field_id: u32, wire_type: WireType) -> &mut Self {
        self.uint32(wire_type.tag(field_id))
    }

    // ---------------------------------------------------- fork / ldelim

    /// Opens a sub-message: saves the current frame and starts counting a
    /// fresh length from zero.
    ///
    /// Every `fork` must be closed by exactly one [`reset`](Writer::reset),
    /// [`ldelim`](Writer::ldelim) or [`ldelim_field`](Writer::ldelim_field).
    pub fn fork(&mut self) -> &mut Self {
        self.states.push(State {
            ops_start: self.ops.len(),
            len: self.len,
        });
        self.len = 0;
        self
    }

    /// Drops everything queued since the last [`fork`](Writer::fork) and
    /// restores the surrounding frame; with no fork open, clears the writer.
    pub fn reset(&mut self) -> &mut Self {
        match self.states.pop() {
            Some(frame) => {
                self.ops.truncate(frame.ops_start);
                self.len = frame.len;
            }
            None => {
                self.ops.clear();
                self.len = 0;
            }
        }
        self
    }

    /// Closes the innermost fork: restores the surrounding frame and leaves
    /// the sub-message in place behind its varint length prefix.
    pub fn ldelim(&mut self) -> &mut Self {
        self.close_fork(None)
    }

    /// Like [`ldelim`](Writer::ldelim), but also emits
    /// `tag(field_id, LengthDelimited)` in front of the length prefix.
    pub fn ldelim_field(&mut self, field_id: u32) -> &mut Self {
        self.close_fork(Some(field_id))
    }

    fn close_fork(&mut self, field_id: Option<u32>) -> &mut Self {
        let frame = match self.states.pop() {
            Some(frame) => frame,
            // Unbalanced ldelim; there is no sub-message to close.
            None => return self,
        };
        let inner_len = self.len;
        let mut at = frame.ops_start;
        self.len = frame.len;
        if let Some(id) = field_id {
            let tag = Op::Varint32(WireType::LengthDelimited.tag(id));
            self.len += tag.width();
            self.ops.insert(at, tag);
            at += 1;
        }
        let prefix = Op::Varint32(inner_len as u32);
        self.len += prefix.width();
        self.ops.insert(at, prefix);
        self.len += inner_len;
        self
    }

    // ------------------------------------------------------------ finish

    /// Allocates a buffer of exactly [`len`](Writer::len) bytes, emits every
    /// queued operation into it in order, and resets the writer for reuse.
    ///
    /// Calling this with an open fork is a bug in the caller; debug builds
    /// assert, release builds discard the open sub-messages and finalize
    /// the outermost frame.
    pub fn finish(&mut self) -> Vec<u8> {
        debug_assert!(self.states.is_empty(), "finish called with an open fork");
        while let Some(frame) = self.states.pop() {
            self.ops.truncate(frame.ops_start);
            self.len = frame.len;
        }
        let mut buf = vec![0u8; self.len];
        let mut pos = 0usize;
        for op in &self.ops {
            pos = op.emit(&mut buf, pos);
        }
        debug_assert_eq!(pos, buf.len());
        self.ops.clear();
        self.len = 0;
        buf
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_len_tracks_queued_widths() {
        let mut writer = Writer::new();
        assert_eq!(writer.len(), 0);
        assert!(writer.is_empty());
        writer.uint32(1);
        assert_eq!(writer.len(), 1);
        writer.uint32(300);
        assert_eq!(writer.len(), 3);
        writer.fixed64(7);
        assert_eq!(writer.len(), 11);
        writer.string("abc");
        assert_eq!(writer.len(), 15);
        let buf = writer.finish();
        assert_eq!(buf.len(), 15);
        assert!(writer.is_empty());
    }

    #[test]
    fn test_finish_resets_for_reuse() {
        let mut writer = Writer::new();
        writer.uint32(150);
        assert_eq!(writer.finish(), [0x96, 0x01]);
        writer.uint32(1);
        assert_eq!(writer.finish(), [0x01]);
        assert_eq!(writer.finish(), Vec::<u8>::new());
    }

    #[test]
    fn test_int32_negative_is_ten_bytes() {
        let mut writer = Writer::new();
        writer.int32(-1);
        assert_eq!(writer.len(), 10);
        assert_eq!(
            writer.finish(),
            [0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0x01]
        );
    }

    #[test]
    fn test_bool_bytes() {
        let mut writer = Writer::new();
        writer.bool(true).bool(false);
        assert_eq!(writer.finish(), [0x01, 0x00]);
    }

    #[test]
    fn test_empty_bytes_and_string_emit_zero_length() {
        let mut writer = Writer::new();
        writer.bytes(&[]).string("").string_utf16(&[]);
        assert_eq!(writer.finish(), [0x00, 0x00, 0x00]);
    }

    #[test]
    fn test_raw_has_no_length_prefix() {
        let mut writer = Writer::new();
        writer.raw(&[0xde, 0xad]).raw(&[]);
        assert_eq!(writer.len(), 2);
        assert_eq!(writer.finish(), [0xde, 0xad]);
    }

    #[test]
    fn test_fork_ldelim_prefixes_inner_length() {
        let mut writer = Writer::new();
        writer.fork();
        writer.uint32(150);
        writer.ldelim();
        assert_eq!(writer.finish(), [0x02, 0x96, 0x01]);
    }

    #[test]
    fn test_ldelim_field_emits_tag_first() {
        let mut writer = Writer::new();
        writer.fork();
        writer.ldelim_field(1);
        assert_eq!(writer.finish(), [0x0a, 0x00]);
    }

    #[test]
    fn test_nested_forks() {
        // outer { inner { leaf: 1 } }, both messages at field 1
        let mut writer = Writer::new();
        writer.fork();
        writer.fork();
        writer.tag(1, WireType::Varint).uint32(1);
        writer.ldelim_field(1);
        writer.ldelim_field(1);
        assert_eq!(writer.finish(), [0x0a, 0x04, 0x0a, 0x02, 0x08, 0x01]);
    }

    #[test]
    fn test_reset_discards_fork_frame() {
        let mut writer = Writer::new();
        writer.uint32(7);
        writer.fork();
        writer.string("discarded");
        writer.reset();
        assert_eq!(writer.len(), 1);
        assert_eq!(writer.finish(), [0x07]);
    }

    #[test]
    fn test_reset_without_fork_clears_writer() {
        let mut writer = Writer::new();
        writer.uint32(7).string("x");
        writer.reset();
        assert!(writer.is_empty());
        assert_eq!(writer.finish(), Vec::<u8>::new());
    }

    #[test]
    fn test_writes_after_ldelim_stay_in_outer_frame() {
        let mut writer = Writer::new();
        writer.tag(1, WireType::Varint).uint32(5);
        writer.fork();
        writer.tag(1, WireType::Varint).uint32(6);
        writer.ldelim_field(2);
        writer.tag(3, WireType::Varint).uint32(7);
        assert_eq!(
            writer.finish(),
            [0x08, 0x05, 0x12, 0x02, 0x08, 0x06, 0x18, 0x07]
        );
    }

    #[test]
    fn test_large_field_id_takes_multi_byte_tag() {
        let mut writer = Writer::new();
        writer.tag(16, WireType::Varint).uint32(1);
        // (16 << 3) | 0 = 128 -> two-byte varint
        assert_eq!(writer.finish(), [0x80, 0x01, 0x01]);
    }
}
