//! Bit-level stream для update пакетов
//!
//! Флаги занимают 1 бит, float — 32 бита без выравнивания по байтам.
//! Порядок бит: младший бит первым (LSB-first) внутри каждого байта.

use std::fmt;

use crate::error::{ReplicationError, ReplicationResult};

pub struct BitStream {
    data: Vec<u8>,
    /// Текущая позиция (бит) для read и write
    bit_pos: usize,
    /// Количество валидных бит (записанных или загруженных)
    bit_len: usize,
}

impl BitStream {
    /// 1500 байт — большинство пакетов <= MTU
    pub const DEFAULT_CAPACITY: usize = 1500;

    pub fn new() -> Self {
        Self {
            data: Vec::with_capacity(Self::DEFAULT_CAPACITY),
            bit_pos: 0,
            bit_len: 0,
        }
    }

    /// Поток для чтения полученного пакета
    pub fn from_bytes(data: Vec<u8>) -> Self {
        let bit_len = data.len() * 8;
        Self {
            data,
            bit_pos: 0,
            bit_len,
        }
    }

    pub fn bit_len(&self) -> usize {
        self.bit_len
    }

    pub fn remaining_bits(&self) -> usize {
        self.bit_len.saturating_sub(self.bit_pos)
    }

    /// Размер payload в байтах (последний байт может быть неполным)
    pub fn byte_len(&self) -> usize {
        self.bit_len.div_ceil(8)
    }

    /// Перемотка на начало (данные сохраняются — можно читать записанное)
    pub fn rewind(&mut self) {
        self.bit_pos = 0;
    }

    /// Откат записи до `bits` (например запись не влезла в пакет)
    ///
    /// Хвост последнего байта обнуляется, позиция ставится на новый конец.
    pub fn truncate_bits(&mut self, bits: usize) {
        if bits >= self.bit_len {
            return;
        }

        self.bit_len = bits;
        self.bit_pos = bits;
        self.data.truncate(bits.div_ceil(8));

        let tail = bits % 8;
        if tail != 0 {
            if let Some(last) = self.data.last_mut() {
                *last &= (1u8 << tail) - 1;
            }
        }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        self.data[..self.byte_len()].to_vec()
    }

    pub fn into_bytes(mut self) -> Vec<u8> {
        let len = self.byte_len();
        self.data.truncate(len);
        self.data
    }

    fn write_bit(&mut self, bit: bool) {
        let byte = self.bit_pos / 8;
        if byte >= self.data.len() {
            self.data.resize(byte + 1, 0);
        }

        let mask = 1u8 << (self.bit_pos % 8);
        if bit {
            self.data[byte] |= mask;
        } else {
            self.data[byte] &= !mask;
        }

        self.bit_pos += 1;
        self.bit_len = self.bit_len.max(self.bit_pos);
    }

    fn read_bit(&mut self) -> bool {
        let bit = self.data[self.bit_pos / 8] & (1u8 << (self.bit_pos % 8)) != 0;
        self.bit_pos += 1;
        bit
    }

    fn ensure_readable(&self, bits: usize) -> ReplicationResult<()> {
        if self.remaining_bits() < bits {
            return Err(ReplicationError::StreamUnderflow {
                needed: bits,
                available: self.remaining_bits(),
            });
        }
        Ok(())
    }

    /// Пишет флаг и возвращает его же — удобно для `if stream.write_flag(..) { .. }`
    pub fn write_flag(&mut self, value: bool) -> bool {
        self.write_bit(value);
        value
    }

    pub fn read_flag(&mut self) -> ReplicationResult<bool> {
        self.ensure_readable(1)?;
        Ok(self.read_bit())
    }

    /// Пишет младшие `bits` бит значения (bits <= 32)
    pub fn write_u32_bits(&mut self, value: u32, bits: u32) {
        debug_assert!(bits <= 32);
        for i in 0..bits {
            self.write_bit((value >> i) & 1 != 0);
        }
    }

    pub fn read_u32_bits(&mut self, bits: u32) -> ReplicationResult<u32> {
        debug_assert!(bits <= 32);
        self.ensure_readable(bits as usize)?;

        let mut value = 0u32;
        for i in 0..bits {
            if self.read_bit() {
                value |= 1 << i;
            }
        }
        Ok(value)
    }

    /// IEEE-754 биты как есть — round trip побитово точный (включая NaN payload)
    pub fn write_f32(&mut self, value: f32) {
        self.write_u32_bits(value.to_bits(), 32);
    }

    pub fn read_f32(&mut self) -> ReplicationResult<f32> {
        self.read_u32_bits(32).map(f32::from_bits)
    }
}

impl Default for BitStream {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for BitStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hex_string = self.data[..self.byte_len()]
            .iter()
            .map(|byte| format!("{:02X}", byte))
            .collect::<String>();
        write!(f, "[{} @ {}/{} bits]", hex_string, self.bit_pos, self.bit_len)
    }
}
