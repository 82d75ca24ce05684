//! Shared helpers for the integration tests: a bit packer and two small
//! reference compressors that follow the decoder's width and padding rules.

#![allow(dead_code)]

use std::collections::HashMap;

pub const WORDS: &[u8] = include_bytes!("../data/words.txt");
pub const WORDS_Z: &[u8] = include_bytes!("../data/words.Z");
pub const WORDS_CLEAR12_Z: &[u8] = include_bytes!("../data/words_clear12.Z");
pub const WORDS_SHR: &[u8] = include_bytes!("../data/words.shr");
pub const WORDS_NOCLEAR_SHR: &[u8] = include_bytes!("../data/words_noclear.shr");

/// LSB-first code packer.
#[derive(Debug, Default)]
pub struct CodeWriter {
    out: Vec<u8>,
    acc: u64,
    nbits: u32,
    position: u64,
}

impl CodeWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn write(&mut self, code: u32, width: u8) {
        self.acc |= u64::from(code) << self.nbits;
        self.nbits += u32::from(width);
        self.position += u64::from(width);
        while self.nbits >= 8 {
            self.out.push(self.acc as u8);
            self.acc >>= 8;
            self.nbits -= 8;
        }
    }

    /// Bits written so far.
    pub fn position(&self) -> u64 {
        self.position
    }

    pub fn finish(mut self) -> Vec<u8> {
        if self.nbits > 0 {
            self.out.push(self.acc as u8);
        }
        self.out
    }
}

/// Pack `(code, width)` pairs.
pub fn pack(codes: &[(u16, u8)]) -> Vec<u8> {
    let mut w = CodeWriter::new();
    for &(code, width) in codes {
        w.write(u32::from(code), width);
    }
    w.finish()
}

/// Unix `compress` encoder producing a headerless code stream.
///
/// `clear_after` emits a clear code every that many codes (requires a
/// clear code). The decoder's table lags one code behind the encoder's, so
/// the width schedule is driven by a model of the decoder's free cursor.
pub fn compress_unix_raw(
    data: &[u8],
    max_bits: u8,
    has_clear_code: bool,
    clear_after: Option<usize>,
) -> Vec<u8> {
    assert!(has_clear_code || clear_after.is_none());
    let first = if has_clear_code { 257 } else { 256 };
    let capacity = 1usize << max_bits;

    let mut enc = UnixEncoder {
        w: CodeWriter::new(),
        width: 9,
        max_bits,
        group_start: 0,
        decoder_free: first,
        since_clear: 0,
        capacity,
    };
    let mut dict: HashMap<(u32, u8), u32> = HashMap::new();
    let mut encoder_free = first;

    let mut current: Option<u32> = None;
    for &byte in data {
        let Some(cur) = current else {
            current = Some(u32::from(byte));
            continue;
        };
        if let Some(&code) = dict.get(&(cur, byte)) {
            current = Some(code);
            continue;
        }
        enc.emit(cur);
        if encoder_free < capacity {
            dict.insert((cur, byte), encoder_free as u32);
            encoder_free += 1;
        }
        current = Some(u32::from(byte));

        if let Some(every) = clear_after
            && enc.since_clear >= every
        {
            enc.clear(first);
            dict.clear();
            encoder_free = first;
        }
    }
    if let Some(cur) = current {
        enc.emit(cur);
    }
    enc.w.finish()
}

/// A complete `.Z` file: `1f 9d` magic, mode byte, then the code stream.
pub fn compress_unix(data: &[u8], max_bits: u8, clear_after: Option<usize>) -> Vec<u8> {
    let mut out = vec![0x1f, 0x9d, 0x80 | max_bits];
    out.extend(compress_unix_raw(data, max_bits, true, clear_after));
    out
}

struct UnixEncoder {
    w: CodeWriter,
    width: u8,
    max_bits: u8,
    group_start: u64,
    decoder_free: usize,
    since_clear: usize,
    capacity: usize,
}

impl UnixEncoder {
    fn emit(&mut self, code: u32) {
        assert!(code < 1 << self.width, "code {code} does not fit");
        self.w.write(code, self.width);
        self.since_clear += 1;
        if self.since_clear >= 2 && self.decoder_free < self.capacity {
            self.decoder_free += 1;
            if self.width < self.max_bits && self.decoder_free > (1 << self.width) - 1 {
                self.pad();
                self.width += 1;
            }
        }
    }

    fn clear(&mut self, first: usize) {
        self.w.write(256, self.width);
        self.pad();
        self.width = 9;
        self.decoder_free = first;
        self.since_clear = 0;
    }

    fn pad(&mut self) {
        let group = 8 * u64::from(self.width);
        let used = self.w.position() - self.group_start;
        let padded = used.div_ceil(group) * group;
        for _ in used..padded {
            self.w.write(0, 1);
        }
        self.group_start = self.w.position();
    }
}

const SHRINK_CAPACITY: usize = 1 << 13;

/// ZIP Shrink encoder.
///
/// Widens on demand with `256,1`. With `partial_clear_every` set, a
/// partial clear `256,2` follows the first literal emitted once that many
/// codes have gone by, so the pending parent always survives the clear
/// (the decoder rejects an entry whose parent was reclaimed).
pub fn shrink(data: &[u8], partial_clear_every: Option<usize>) -> Vec<u8> {
    let mut enc = ShrinkEncoder {
        w: CodeWriter::new(),
        width: 9,
        used: vec![false; SHRINK_CAPACITY],
        parent: vec![0; SHRINK_CAPACITY],
        value: vec![0; SHRINK_CAPACITY],
        cursor: 257,
        dict: HashMap::new(),
    };
    let mut since = 0usize;

    let mut current: Option<u32> = None;
    for &byte in data {
        let Some(cur) = current else {
            current = Some(u32::from(byte));
            continue;
        };
        if let Some(&code) = enc.dict.get(&(cur, byte)) {
            current = Some(code);
            continue;
        }
        enc.emit(cur);
        since += 1;
        if let Some(every) = partial_clear_every
            && since >= every
            && cur < 256
        {
            enc.partial_clear();
            since = 0;
        }
        enc.add(cur, byte);
        current = Some(u32::from(byte));
    }
    if let Some(cur) = current {
        enc.emit(cur);
    }
    enc.w.finish()
}

struct ShrinkEncoder {
    w: CodeWriter,
    width: u8,
    used: Vec<bool>,
    parent: Vec<u32>,
    value: Vec<u8>,
    cursor: usize,
    dict: HashMap<(u32, u8), u32>,
}

impl ShrinkEncoder {
    fn emit(&mut self, code: u32) {
        while code >= 1 << self.width {
            self.w.write(256, self.width);
            self.w.write(1, self.width);
            self.width += 1;
        }
        self.w.write(code, self.width);
    }

    fn add(&mut self, parent: u32, value: u8) {
        let slot = (self.cursor..SHRINK_CAPACITY)
            .find(|&i| !self.used[i])
            .expect("shrink table full");
        self.used[slot] = true;
        self.parent[slot] = parent;
        self.value[slot] = value;
        self.dict.insert((parent, value), slot as u32);
        self.cursor = slot + 1;
    }

    fn partial_clear(&mut self) {
        self.w.write(256, self.width);
        self.w.write(2, self.width);

        let mut has_child = vec![false; SHRINK_CAPACITY];
        for i in 257..SHRINK_CAPACITY {
            if self.used[i] && self.parent[i] >= 257 {
                has_child[self.parent[i] as usize] = true;
            }
        }
        for i in 257..SHRINK_CAPACITY {
            if self.used[i] && !has_child[i] {
                self.used[i] = false;
                self.dict.remove(&(self.parent[i], self.value[i]));
            }
        }
        self.cursor = 257;
    }
}

/// Deterministic pseudo-random bytes (64-bit LCG).
pub struct Lcg(u64);

impl Lcg {
    pub fn new(seed: u64) -> Self {
        Self(seed)
    }

    pub fn next_u32(&mut self) -> u32 {
        self.0 = self
            .0
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        (self.0 >> 33) as u32
    }

    pub fn below(&mut self, n: usize) -> usize {
        self.next_u32() as usize % n
    }

    pub fn bytes(&mut self, len: usize) -> Vec<u8> {
        (0..len).map(|_| self.next_u32() as u8).collect()
    }
}

/// Text-like sample: words drawn from a small vocabulary.
pub fn sample_text(seed: u64, words: usize) -> Vec<u8> {
    let mut rng = Lcg::new(seed);
    let vocab: Vec<Vec<u8>> = (0..200)
        .map(|_| {
            let len = 2 + rng.below(8);
            (0..len).map(|_| b'a' + rng.below(16) as u8).collect()
        })
        .collect();

    let mut out = Vec::new();
    for i in 0..words {
        if i > 0 {
            out.push(b' ');
        }
        out.extend_from_slice(&vocab[rng.below(vocab.len())]);
    }
    out
}
