//! LZW decoder (decompression).
//!
//! A push-style state machine: compressed bytes are fed in arbitrary chunks,
//! codes are pulled off an LSB-first bit accumulator as soon as enough bits
//! are pending, and each decoded string goes straight to the output sink.
//! All state lives in [`LzwDecoder`], so a session can be suspended between
//! chunks for as long as the caller likes.

use crate::config::{
    self, Dialect, HeaderStyle, LzwConfig, SHRINK_MAX_CODE_SIZE, UNIX_COMPRESS_MAGIC,
};
use crate::table::{Code, CodeTable, EntryKind, SlotPolicy};
use unlzw_core::bitstream::BitAccumulator;
use unlzw_core::error::{LzwError, Result};
use unlzw_core::sink::{ByteSink, OutputSink};
use unlzw_core::traits::{DecodeStatus, StreamDecoder};

/// The ZIP Shrink escape code.
const SHRINK_ESCAPE: Code = 256;

/// Where a decode session is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecoderState {
    /// Nothing fed yet.
    Init,
    /// Collecting header bytes.
    ReadingHeader,
    /// Decoding codes.
    ReadingCodes,
    /// Session ended; further input is ignored.
    Done,
    /// Session failed; the first error is kept.
    Failed,
}

/// Streaming LZW decoder for one compressed stream.
#[derive(Debug)]
pub struct LzwDecoder<S: ByteSink> {
    config: LzwConfig,
    state: DecoderState,

    header: [u8; 3],
    header_len: usize,

    /// Allocated once the code size is known.
    table: Option<CodeTable>,
    /// Holds one code's string while it is rebuilt back to front.
    scratch: Vec<u8>,
    reader: BitAccumulator,

    min_code_size: u8,
    max_code_size: u8,
    curr_code_size: u8,
    has_clear_code: bool,

    /// Last fully decoded code; `None` at the start and after a clear.
    old_code: Option<Code>,
    /// First byte of the most recently emitted string.
    last_value: u8,
    escape_pending: bool,

    /// Bits consumed since the code width last changed (Unix compress).
    bits_in_group: u64,
    /// Padding bytes still to drop before the next code (Unix compress).
    skip_bytes: u64,

    output: OutputSink<S>,
    bytes_consumed: u64,
    error: Option<LzwError>,
}

impl<S: ByteSink> LzwDecoder<S> {
    /// Create a decoder writing to `sink`.
    ///
    /// `expected_len`, when known, caps the output: decoding stops once that
    /// many bytes have been produced and anything beyond is dropped.
    pub fn new(config: LzwConfig, sink: S, expected_len: Option<u64>) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            config,
            state: DecoderState::Init,
            header: [0; 3],
            header_len: 0,
            table: None,
            scratch: Vec::new(),
            reader: BitAccumulator::new(),
            min_code_size: config.min_code_size(),
            max_code_size: 0,
            curr_code_size: config.min_code_size(),
            has_clear_code: false,
            old_code: None,
            last_value: 0,
            escape_pending: false,
            bits_in_group: 0,
            skip_bytes: 0,
            output: OutputSink::new(sink, expected_len),
            bytes_consumed: 0,
            error: None,
        })
    }

    /// The configuration this decoder was built with.
    pub fn config(&self) -> &LzwConfig {
        &self.config
    }

    /// Current session state.
    pub fn state(&self) -> DecoderState {
        self.state
    }

    /// Width in bits of the next code to be read.
    pub fn curr_code_size(&self) -> u8 {
        self.curr_code_size
    }

    /// Maximum code width, once known from the header or configuration.
    pub fn max_code_size(&self) -> Option<u8> {
        self.table.as_ref().map(|_| self.max_code_size)
    }

    /// Whether code 256 is a clear code, once known.
    pub fn has_clear_code(&self) -> Option<bool> {
        self.table.as_ref().map(|_| self.has_clear_code)
    }

    /// The code table, once allocated.
    pub fn table(&self) -> Option<&CodeTable> {
        self.table.as_ref()
    }

    /// Compressed bytes consumed so far, header included.
    pub fn bytes_consumed(&self) -> u64 {
        self.bytes_consumed
    }

    /// Decompressed bytes delivered to the sink so far.
    pub fn bytes_written(&self) -> u64 {
        self.output.bytes_written()
    }

    /// The first error of this session, if any.
    pub fn error(&self) -> Option<&LzwError> {
        self.error.as_ref()
    }

    /// Get a reference to the sink.
    pub fn get_ref(&self) -> &S {
        self.output.get_ref()
    }

    /// Consume the decoder and return the sink.
    ///
    /// Call [`finish`](StreamDecoder::finish) first, or staged bytes are lost.
    pub fn into_sink(self) -> S {
        self.output.into_inner()
    }

    fn status(&self) -> DecodeStatus {
        if self.is_finished() {
            DecodeStatus::Done
        } else {
            DecodeStatus::NeedsInput
        }
    }

    fn fail(&mut self, err: LzwError) -> LzwError {
        tracing::debug!("lzw: {err}");
        self.state = DecoderState::Failed;
        self.error.get_or_insert(err).clone()
    }

    fn start(&mut self) -> Result<()> {
        if self.config.header_size() > 0 {
            self.state = DecoderState::ReadingHeader;
            return Ok(());
        }
        self.after_header(self.config.max_code_size, self.config.has_clear_code)
    }

    fn process_header(&mut self) -> Result<()> {
        let (max_code_size, has_clear_code) = match self.config.header_style {
            HeaderStyle::ThreeByte => {
                if self.header[..2] != UNIX_COMPRESS_MAGIC {
                    return Err(LzwError::format("Not in compress format"));
                }
                let mode = self.header[2];
                tracing::debug!("lzw mode: 0x{mode:02x}");
                (mode & 0x1f, mode & 0x80 != 0)
            }
            HeaderStyle::OneByte => {
                let mode = self.header[0];
                tracing::debug!("lzw mode: 0x{mode:02x}");
                (mode & 0x1f, true)
            }
            HeaderStyle::None => (self.config.max_code_size, self.config.has_clear_code),
        };
        tracing::debug!("lzw maxbits: {max_code_size}, clear code: {has_clear_code}");
        config::check_code_size(max_code_size)?;

        self.after_header(max_code_size, has_clear_code)
    }

    fn after_header(&mut self, max_code_size: u8, has_clear_code: bool) -> Result<()> {
        let table = match self.config.dialect {
            Dialect::UnixCompress => {
                self.max_code_size = max_code_size;
                self.has_clear_code = has_clear_code;
                let controls: &[EntryKind] = if has_clear_code {
                    &[EntryKind::Clear]
                } else {
                    &[]
                };
                CodeTable::new(max_code_size, controls, SlotPolicy::Append)?
            }
            Dialect::ZipShrink => {
                self.max_code_size = SHRINK_MAX_CODE_SIZE;
                self.has_clear_code = false;
                CodeTable::new(
                    SHRINK_MAX_CODE_SIZE,
                    &[EntryKind::Special],
                    SlotPolicy::FirstUnused,
                )?
            }
        };

        self.curr_code_size = self.min_code_size;
        self.scratch = vec![0u8; table.capacity()];
        self.table = Some(table);
        self.state = DecoderState::ReadingCodes;
        Ok(())
    }

    fn process_byte(&mut self, byte: u8) -> Result<()> {
        if self.state == DecoderState::Init {
            self.start()?;
        }

        match self.state {
            DecoderState::ReadingHeader => {
                self.header[self.header_len] = byte;
                self.header_len += 1;
                if self.header_len >= self.config.header_size() {
                    self.process_header()?;
                }
            }
            DecoderState::ReadingCodes => {
                if self.skip_bytes > 0 {
                    self.skip_bytes -= 1;
                    return Ok(());
                }

                self.reader.add_byte(byte);
                while self.reader.bits_available() >= self.curr_code_size {
                    let code = self.reader.take_code(self.curr_code_size);
                    self.bits_in_group += u64::from(self.curr_code_size);
                    self.process_code(code)?;

                    if self.skip_bytes > 0 || self.state != DecoderState::ReadingCodes {
                        break;
                    }
                }
            }
            DecoderState::Init | DecoderState::Done | DecoderState::Failed => {}
        }
        Ok(())
    }

    fn process_code(&mut self, code: Code) -> Result<()> {
        if self.escape_pending {
            self.escape_pending = false;
            return self.process_escape(code);
        }

        let kind = self
            .table
            .as_ref()
            .ok_or_else(|| LzwError::protocol("code table not initialised"))?
            .kind(code)
            .ok_or_else(|| LzwError::protocol(format!("code {code} is out of range")))?;

        match kind {
            EntryKind::Static | EntryKind::DynamicUsed | EntryKind::Unused => {
                self.process_data_code(code)
            }
            EntryKind::Clear => self.clear(),
            EntryKind::Special => {
                if self.config.dialect == Dialect::ZipShrink && code == SHRINK_ESCAPE {
                    self.escape_pending = true;
                }
                Ok(())
            }
            EntryKind::Stop => {
                self.state = DecoderState::Done;
                Ok(())
            }
        }
    }

    fn process_escape(&mut self, subcode: Code) -> Result<()> {
        match subcode {
            1 => {
                if self.curr_code_size < self.max_code_size {
                    self.curr_code_size += 1;
                    tracing::trace!("increased code size to {}", self.curr_code_size);
                }
                Ok(())
            }
            2 => {
                tracing::debug!("partial clear");
                self.table_mut()?.partial_clear();
                Ok(())
            }
            other => Err(LzwError::protocol(format!(
                "unknown escape sequence 256,{other}"
            ))),
        }
    }

    fn process_data_code(&mut self, code: Code) -> Result<()> {
        let Some(old_code) = self.old_code else {
            // First code of the stream or after a clear: a literal.
            if !self.table_ref()?.resolves(code) {
                return Err(LzwError::protocol(format!(
                    "first code {code} is not a literal"
                )));
            }
            self.emit(code)?;
            self.old_code = Some(code);
            return Ok(());
        };

        if self.table_ref()?.resolves(code) {
            self.emit(code)?;
            self.add_to_dict(old_code, self.last_value)?;
        } else {
            // KwK: the code names the entry this very step defines, i.e.
            // the string of old_code plus its own first byte.
            let next = self.table_ref()?.next_free_slot();
            if next != Some(code) {
                return Err(LzwError::protocol(format!("code {code} is not defined")));
            }
            self.add_to_dict(old_code, self.last_value)?;
            self.emit(code)?;
        }

        self.old_code = Some(code);
        Ok(())
    }

    /// Write the string of `code` and remember its first byte.
    fn emit(&mut self, code: Code) -> Result<()> {
        let table = self
            .table
            .as_ref()
            .ok_or_else(|| LzwError::protocol("code table not initialised"))?;
        let string = table.expand(code, &mut self.scratch)?;
        if let Some(&first) = string.first() {
            self.last_value = first;
        }
        self.output.write(string)
    }

    fn add_to_dict(&mut self, parent: Code, value: u8) -> Result<()> {
        let dynamic_growth = self.config.dialect == Dialect::UnixCompress;
        let table = self.table_mut()?;
        let added = table.add_entry(parent, value)?;
        let free_cursor = table.free_cursor();

        if added.is_some()
            && dynamic_growth
            && self.curr_code_size < self.max_code_size
            && free_cursor > max_code_for(self.curr_code_size)
        {
            self.increase_code_size()?;
        }
        Ok(())
    }

    fn increase_code_size(&mut self) -> Result<()> {
        if self.config.dialect == Dialect::UnixCompress {
            self.end_bitgroup()?;
        }
        if self.curr_code_size < self.max_code_size {
            self.curr_code_size += 1;
            tracing::trace!("increased code size to {}", self.curr_code_size);
        }
        Ok(())
    }

    /// Skip to the end of the current bitgroup.
    ///
    /// `compress` writes codes in groups of eight, so whenever the code width
    /// changes the stream is padded to a multiple of `8 * width` bits counted
    /// from the start of the group. Right after a code has been taken at most
    /// seven bits are pending; they are dropped and the rest of the padding
    /// is skipped as whole input bytes.
    fn end_bitgroup(&mut self) -> Result<()> {
        let group_bits = 8 * u64::from(self.curr_code_size);
        let padded = self.bits_in_group.div_ceil(group_bits) * group_bits;
        let mut skip_bits = padded - self.bits_in_group;
        self.bits_in_group = 0;

        let pending = u64::from(self.reader.bits_available());
        if pending > 7 || pending > skip_bits {
            return Err(LzwError::protocol(format!(
                "bitgroup padding of {skip_bits} bits with {pending} bits pending"
            )));
        }
        skip_bits -= pending;
        if skip_bits % 8 != 0 {
            return Err(LzwError::protocol("bitgroup padding is not byte aligned"));
        }

        self.reader.clear();
        self.skip_bytes = skip_bits / 8;
        tracing::trace!("end of bitgroup: skipping {} bytes", self.skip_bytes);
        Ok(())
    }

    fn clear(&mut self) -> Result<()> {
        tracing::debug!("clear");
        if self.config.dialect == Dialect::UnixCompress {
            self.end_bitgroup()?;
        }

        self.curr_code_size = self.min_code_size;
        self.old_code = None;
        self.table_mut()?.full_clear();
        Ok(())
    }

    fn table_ref(&self) -> Result<&CodeTable> {
        self.table
            .as_ref()
            .ok_or_else(|| LzwError::protocol("code table not initialised"))
    }

    fn table_mut(&mut self) -> Result<&mut CodeTable> {
        self.table
            .as_mut()
            .ok_or_else(|| LzwError::protocol("code table not initialised"))
    }
}

impl<S: ByteSink> StreamDecoder for LzwDecoder<S> {
    fn feed(&mut self, input: &[u8]) -> Result<DecodeStatus> {
        if let Some(err) = &self.error {
            return Err(err.clone());
        }

        for &byte in input {
            if self.is_finished() {
                break;
            }
            if let Err(err) = self.process_byte(byte) {
                return Err(self.fail(err));
            }
            self.bytes_consumed += 1;
        }

        Ok(self.status())
    }

    fn finish(&mut self) -> Result<u64> {
        if let Some(err) = &self.error {
            return Err(err.clone());
        }

        let header_missing = matches!(
            self.state,
            DecoderState::Init | DecoderState::ReadingHeader
        ) && self.config.header_size() > 0;
        if header_missing && !self.output.is_full() {
            return Err(self.fail(LzwError::format("truncated header")));
        }
        if let Err(err) = self.output.flush() {
            return Err(self.fail(err));
        }

        if self.state != DecoderState::Failed {
            self.state = DecoderState::Done;
        }
        tracing::debug!(
            "lzw: {} bytes in, {} bytes out",
            self.bytes_consumed,
            self.output.bytes_written()
        );
        Ok(self.output.bytes_written())
    }

    fn is_finished(&self) -> bool {
        matches!(self.state, DecoderState::Done | DecoderState::Failed) || self.output.is_full()
    }
}

/// Largest code representable in `nbits` bits.
fn max_code_for(nbits: u8) -> usize {
    (1usize << nbits) - 1
}
