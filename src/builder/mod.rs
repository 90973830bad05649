pub(crate) mod qr;

pub use qr::QRCode;

use std::ops::Deref;

use crate::common::bitstream::BitStream;
use crate::common::codec::encode;
use crate::common::ec::ecc;
use crate::common::error::{QRError, QRResult};
use crate::common::mask::{apply_best_mask, MaskPattern};
use crate::common::metadata::{ECLevel, Version};

pub struct QRBuilder<'a> {
    data: &'a [u8],
    ec_level: ECLevel,
    min_version: usize,
    mask: Option<MaskPattern>,
}

impl<'a> QRBuilder<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, ec_level: ECLevel::M, min_version: 1, mask: None }
    }

    pub fn data(&mut self, data: &'a [u8]) -> &mut Self {
        self.data = data;
        self
    }

    pub fn ec_level(&mut self, ec_level: ECLevel) -> &mut Self {
        self.ec_level = ec_level;
        self
    }

    /// Lower bound for version selection; the smallest version at or above
    /// this that fits the payload is used.
    pub fn min_version(&mut self, min_version: usize) -> &mut Self {
        self.min_version = min_version;
        self
    }

    /// Forces a masking pattern instead of selecting one by penalty score.
    pub fn mask(&mut self, mask: MaskPattern) -> &mut Self {
        self.mask = Some(mask);
        self
    }
}

impl QRBuilder<'_> {
    pub fn build(&self) -> QRResult<QRCode> {
        if self.data.is_empty() {
            return Err(QRError::EmptyValue);
        }
        std::str::from_utf8(self.data).map_err(|_| QRError::InvalidUtf8Encoding)?;

        // Mode detection, version selection and payload encoding
        let (encoded, version) = encode(self.data, self.ec_level, self.min_version)?;

        // Error correction and interleaving
        let (data_blocks, ecc_blocks) = Self::compute_ecc(encoded.data(), version, self.ec_level);
        let mut payload = BitStream::new(version.total_codewords(self.ec_level) << 3);
        payload.extend(&Self::interleave(&data_blocks));
        payload.extend(&Self::interleave(&ecc_blocks));

        // Matrix construction and masking
        let mut qr = QRCode::new(version, self.ec_level);
        qr.draw_all_function_patterns();
        qr.draw_encoding_region(payload.data());
        match self.mask {
            Some(mask) => qr.apply_mask(mask),
            None => {
                apply_best_mask(&mut qr);
            }
        }

        Ok(qr)
    }

    fn compute_ecc<'b>(
        data: &'b [u8],
        version: Version,
        ec_level: ECLevel,
    ) -> (Vec<&'b [u8]>, Vec<Vec<u8>>) {
        let data_blocks = Self::blockify(data, version, ec_level);

        let ecc_size_per_block = version.ecc_per_block(ec_level);
        let ecc_blocks =
            data_blocks.iter().map(|b| ecc(b, ecc_size_per_block)).collect::<Vec<_>>();

        (data_blocks, ecc_blocks)
    }

    fn blockify(data: &[u8], version: Version, ec_level: ECLevel) -> Vec<&[u8]> {
        let (block1_size, block1_count, block2_size, block2_count) =
            version.data_codewords_per_block(ec_level);

        let total_blocks = block1_count + block2_count;
        let total_block1_size = block1_size * block1_count;
        let total_size = total_block1_size + block2_size * block2_count;

        debug_assert!(
            total_size == data.len(),
            "Data len doesn't match total size of blocks: Data len {}, Total block size {}",
            data.len(),
            total_size
        );

        let mut data_blocks = Vec::with_capacity(total_blocks);
        data_blocks.extend(data[..total_block1_size].chunks(block1_size));
        if block2_size > 0 {
            data_blocks.extend(data[total_block1_size..].chunks(block2_size));
        }
        data_blocks
    }

    fn interleave<T: Copy, V: Deref<Target = [T]>>(blocks: &[V]) -> Vec<T> {
        let max_block_size = blocks.iter().map(|b| b.len()).max().expect("Blocks is empty");
        let total_size = blocks.iter().map(|b| b.len()).sum::<usize>();
        let mut res = Vec::with_capacity(total_size);
        for i in 0..max_block_size {
            for block in blocks {
                if i < block.len() {
                    res.push(block[i]);
                }
            }
        }
        res
    }
}
