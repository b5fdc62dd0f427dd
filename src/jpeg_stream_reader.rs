//! JPEG Codestream Reader utilities.
//!
//! This module provides the `JpegStreamReader` which handles the sequential
//! reading of JPEG markers and segments (DQT, DHT, SOF, SOS, etc.) for
//! baseline and progressive JPEG streams.

use crate::FrameInfo;
use crate::error::CodecError;
use crate::jpeg_marker_code::{JPEG_MARKER_START_BYTE, JpegMarkerCode};
use std::convert::TryFrom;

/// Metadata for an individual image component (e.g. Y, Cb, Cr).
#[derive(Debug, Clone, Default)]
pub struct JpegComponent {
    /// Component ID (typically 1, 2, 3).
    pub id: u8,
    /// Horizontal sampling factor (1-4).
    pub h_samp_factor: u8,
    /// Vertical sampling factor (1-4).
    pub v_samp_factor: u8,
    /// Quantization table destination selector (0-3).
    pub quant_table_dest: u8,
    /// DC Huffman table destination selector (0-3).
    pub dc_table_dest: u8,
    /// AC Huffman table destination selector (0-3).
    pub ac_table_dest: u8,
    /// DC prediction state (used during scan decoding).
    pub dc_pred: i16,
}

/// Internal state of the stream reader.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JpegStreamReaderState {
    BeforeStartOfImage,
    HeaderSection,
    ScanSection,
    EndOfImage,
}

/// A reader for baseline/progressive JPEG codestreams that manages marker
/// parsing and segment state.
pub struct JpegStreamReader<'a> {
    source: &'a [u8],
    position: usize,
    state: JpegStreamReaderState,
    frame_info: FrameInfo,
    pub quantization_tables: [[u8; 64]; 4],
    pub huffman_tables_dc: [Option<crate::jpeg1::huffman::HuffmanTable>; 4],
    pub huffman_tables_ac: [Option<crate::jpeg1::huffman::HuffmanTable>; 4],
    pub components: Vec<JpegComponent>,
    pub restart_interval: u16,
    pub scan_component_indices: Vec<usize>,
    pub is_progressive: bool,
    pub ss: u8,
    pub se: u8,
    pub ah: u8,
    pub al: u8,
}

impl<'a> JpegStreamReader<'a> {
    pub fn new(source: &'a [u8]) -> Self {
        Self {
            source,
            position: 0,
            state: JpegStreamReaderState::BeforeStartOfImage,
            frame_info: FrameInfo::default(),
            quantization_tables: [[0u8; 64]; 4],
            huffman_tables_dc: [const { None }; 4],
            huffman_tables_ac: [const { None }; 4],
            components: Vec::new(),
            restart_interval: 0,
            scan_component_indices: Vec::new(),
            is_progressive: false,
            ss: 0,
            se: 63,
            ah: 0,
            al: 0,
        }
    }

    pub fn frame_info(&self) -> FrameInfo {
        self.frame_info
    }

    pub fn remaining_data(&self) -> &[u8] {
        &self.source[self.position..]
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn read_header(&mut self) -> Result<(), CodecError> {
        self.read_start_of_image()?;

        loop {
            let marker = self.read_marker()?;
            match marker {
                JpegMarkerCode::StartOfFrameBaseline => {
                    self.read_sof0_segment()?;
                }
                JpegMarkerCode::StartOfFrameProgressive => {
                    self.read_sof2_segment()?;
                }
                JpegMarkerCode::DefineQuantizationTable => {
                    self.read_dqt_segment()?;
                }
                JpegMarkerCode::DefineHuffmanTable => {
                    self.read_dht_segment()?;
                }
                JpegMarkerCode::DefineRestartInterval => {
                    self.read_dri_segment()?;
                }
                JpegMarkerCode::StartOfScan => {
                    self.position -= 2;
                    self.state = JpegStreamReaderState::HeaderSection;
                    break;
                }
                _ => {
                    self.skip_segment()?;
                }
            }
        }
        Ok(())
    }

    pub fn read_u8(&mut self) -> Result<u8, CodecError> {
        if self.position >= self.source.len() {
            return Err(CodecError::InvalidData);
        }
        let b = self.source[self.position];
        self.position += 1;
        Ok(b)
    }

    pub fn read_u16(&mut self) -> Result<u16, CodecError> {
        let b1 = self.read_u8()? as u16;
        let b2 = self.read_u8()? as u16;
        Ok((b1 << 8) | b2)
    }

    pub fn peek_marker(&self) -> Result<JpegMarkerCode, CodecError> {
        if self.position + 1 >= self.source.len() {
            return Err(CodecError::InvalidData);
        }
        if self.source[self.position] != JPEG_MARKER_START_BYTE {
            return Err(CodecError::JpegMarkerStartByteNotFound);
        }
        JpegMarkerCode::try_from(self.source[self.position + 1])
    }

    pub fn read_marker(&mut self) -> Result<JpegMarkerCode, CodecError> {
        if self.read_u8()? != JPEG_MARKER_START_BYTE {
            return Err(CodecError::JpegMarkerStartByteNotFound);
        }
        let marker_byte = self.read_u8()?;
        JpegMarkerCode::try_from(marker_byte)
    }

    fn read_start_of_image(&mut self) -> Result<(), CodecError> {
        if self.read_marker()? != JpegMarkerCode::StartOfImage {
            return Err(CodecError::StartOfImageMarkerNotFound);
        }
        self.state = JpegStreamReaderState::HeaderSection;
        Ok(())
    }

    pub fn read_start_of_scan_segment(&mut self) -> Result<(), CodecError> {
        if self.read_marker()? != JpegMarkerCode::StartOfScan {
            return Err(CodecError::InvalidData);
        }
        let _length = self.read_u16()?;
        let components_in_scan = self.read_u8()? as i32;
        self.scan_component_indices.clear();

        for _ in 0..components_in_scan {
            let id = self.read_u8()?;
            let selector = self.read_u8()?;
            let dc_dest = selector >> 4;
            let ac_dest = selector & 0x0F;

            for (idx, component) in self.components.iter_mut().enumerate() {
                if component.id == id {
                    component.dc_table_dest = dc_dest;
                    component.ac_table_dest = ac_dest;
                    self.scan_component_indices.push(idx);
                    break;
                }
            }
        }
        let ss = self.read_u8()?;
        let se = self.read_u8()?;
        let ah_al = self.read_u8()?;

        self.ss = ss;
        self.se = se;
        self.ah = ah_al >> 4;
        self.al = ah_al & 0x0F;

        self.state = JpegStreamReaderState::ScanSection;
        Ok(())
    }

    pub fn skip_segment(&mut self) -> Result<(), CodecError> {
        let length = self.read_u16()?;
        if length < 2 {
            return Err(CodecError::InvalidMarkerSegmentSize);
        }
        self.position += (length as usize) - 2;
        Ok(())
    }

    pub fn advance(&mut self, count: usize) {
        self.position += count;
    }

    fn read_sof0_segment(&mut self) -> Result<(), CodecError> {
        let _length = self.read_u16()?;
        self.frame_info.bits_per_sample = self.read_u8()? as i32;
        self.frame_info.height = self.read_u16()? as u32;
        self.frame_info.width = self.read_u16()? as u32;
        self.frame_info.component_count = self.read_u8()? as i32;

        self.components.clear();
        for _ in 0..self.frame_info.component_count {
            let id = self.read_u8()?;
            let sampling = self.read_u8()?;
            let tq = self.read_u8()?;
            self.components.push(JpegComponent {
                id,
                h_samp_factor: sampling >> 4,
                v_samp_factor: sampling & 0x0F,
                quant_table_dest: tq,
                dc_table_dest: 0,
                ac_table_dest: 0,
                dc_pred: 0,
            });
        }
        Ok(())
    }

    fn read_sof2_segment(&mut self) -> Result<(), CodecError> {
        self.is_progressive = true;
        self.read_sof0_segment()
    }

    pub fn read_dqt_segment(&mut self) -> Result<(), CodecError> {
        let length = self.read_u16()? as usize;
        if length < 2 {
            return Err(CodecError::InvalidMarkerSegmentSize);
        }
        let mut remaining = length - 2;
        while remaining >= 65 {
            let pq_tq = self.read_u8()?;
            let precision = pq_tq >> 4;
            let id = (pq_tq & 0x0F) as usize;
            if id >= 4 || precision != 0 {
                return Err(CodecError::ParameterValueNotSupported);
            }
            for i in 0..64 {
                self.quantization_tables[id][i] = self.read_u8()?;
            }
            remaining -= 65;
        }
        Ok(())
    }

    pub fn read_dht_segment(&mut self) -> Result<(), CodecError> {
        let length = self.read_u16()? as usize;
        if length < 2 {
            return Err(CodecError::InvalidMarkerSegmentSize);
        }
        let mut remaining = length - 2;
        while remaining >= 17 {
            let tc_th = self.read_u8()?;
            let class = tc_th >> 4;
            let id = (tc_th & 0x0F) as usize;
            if id >= 4 {
                return Err(CodecError::ParameterValueNotSupported);
            }

            let mut lengths = [0u8; 16];
            let mut total_values = 0usize;
            for item in &mut lengths {
                *item = self.read_u8()?;
                total_values += *item as usize;
            }
            remaining -= 17;

            if remaining < total_values {
                return Err(CodecError::InvalidData);
            }

            let mut values = vec![0u8; total_values];
            for item in &mut values {
                *item = self.read_u8()?;
            }
            remaining -= total_values;

            let table = crate::jpeg1::huffman::HuffmanTable::build_from_dht(&lengths, &values);
            if class == 0 {
                self.huffman_tables_dc[id] = Some(table);
            } else {
                self.huffman_tables_ac[id] = Some(table);
            }
        }
        Ok(())
    }

    pub fn read_dri_segment(&mut self) -> Result<(), CodecError> {
        let length = self.read_u16()?;
        if length != 4 {
            return Err(CodecError::InvalidMarkerSegmentSize);
        }
        self.restart_interval = self.read_u16()?;
        Ok(())
    }
}
