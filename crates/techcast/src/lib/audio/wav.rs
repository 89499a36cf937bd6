/// Size of a canonical RIFF/WAVE PCM header
pub const WAV_HEADER_LEN: usize = 44;

/// Format parameters of a headerless PCM stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WavDescriptor {
    pub num_channels: u16,
    pub sample_rate: u32,
    pub bits_per_sample: u16,
}

impl WavDescriptor {
    /// Bytes per second, `None` if it does not fit the header field
    pub fn checked_byte_rate(&self) -> Option<u32> {
        self.sample_rate
            .checked_mul(u32::from(self.num_channels))?
            .checked_mul(u32::from(self.bits_per_sample))
            .map(|bits| bits / 8)
    }

    /// Bytes per sample frame, `None` if it does not fit the header field
    pub fn checked_block_align(&self) -> Option<u16> {
        self.num_channels
            .checked_mul(self.bits_per_sample)
            .map(|bits| bits / 8)
    }

    /// Assumes a descriptor accepted by `parse_wav_descriptor`; saturates
    /// otherwise.
    pub fn byte_rate(&self) -> u32 {
        self.checked_byte_rate().unwrap_or(u32::MAX)
    }

    /// Assumes a descriptor accepted by `parse_wav_descriptor`; saturates
    /// otherwise.
    pub fn block_align(&self) -> u16 {
        self.checked_block_align().unwrap_or(u16::MAX)
    }
}

/// Builds the 44 byte header that turns `data_len` bytes of PCM described by
/// `desc` into a playable WAV file.
///
/// Layout per http://soundfile.sapp.org/doc/WaveFormat; all integers are
/// little endian.
pub fn wav_header(data_len: u32, desc: &WavDescriptor) -> [u8; WAV_HEADER_LEN] {
    let mut header = [0u8; WAV_HEADER_LEN];

    header[0..4].copy_from_slice(b"RIFF");
    header[4..8].copy_from_slice(&(36 + data_len).to_le_bytes());
    header[8..12].copy_from_slice(b"WAVE");

    header[12..16].copy_from_slice(b"fmt ");
    header[16..20].copy_from_slice(&16u32.to_le_bytes());
    header[20..22].copy_from_slice(&1u16.to_le_bytes()); // PCM
    header[22..24].copy_from_slice(&desc.num_channels.to_le_bytes());
    header[24..28].copy_from_slice(&desc.sample_rate.to_le_bytes());
    header[28..32].copy_from_slice(&desc.byte_rate().to_le_bytes());
    header[32..34].copy_from_slice(&desc.block_align().to_le_bytes());
    header[34..36].copy_from_slice(&desc.bits_per_sample.to_le_bytes());

    header[36..40].copy_from_slice(b"data");
    header[40..44].copy_from_slice(&data_len.to_le_bytes());

    header
}
