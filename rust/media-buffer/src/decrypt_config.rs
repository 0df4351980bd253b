//! Encryption parameters attached to an encrypted media buffer.

use media_common::{Result, verify_arg};

/// Common Encryption protection scheme of an encrypted buffer.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum EncryptionScheme {
    /// AES-CTR, full-sample or subsample encryption.
    Cenc,
    /// AES-CBC with a crypt/skip block pattern.
    Cbcs,
}

impl std::fmt::Display for EncryptionScheme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EncryptionScheme::Cenc => f.write_str("cenc"),
            EncryptionScheme::Cbcs => f.write_str("cbcs"),
        }
    }
}

/// A run of clear bytes followed by a run of encrypted bytes.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
pub struct SubsampleEntry {
    pub clear_bytes: u32,
    pub cypher_bytes: u32,
}

impl SubsampleEntry {
    pub const fn new(clear_bytes: u32, cypher_bytes: u32) -> SubsampleEntry {
        SubsampleEntry {
            clear_bytes,
            cypher_bytes,
        }
    }
}

/// `cbcs` block pattern: out of every `crypt_byte_block + skip_byte_block`
/// 16-byte blocks, the first `crypt_byte_block` are encrypted.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
pub struct EncryptionPattern {
    pub crypt_byte_block: u32,
    pub skip_byte_block: u32,
}

impl EncryptionPattern {
    pub const fn new(crypt_byte_block: u32, skip_byte_block: u32) -> EncryptionPattern {
        EncryptionPattern {
            crypt_byte_block,
            skip_byte_block,
        }
    }
}

/// Everything a decryptor needs to know to decrypt a single buffer.
///
/// An empty subsample list means the whole buffer is encrypted.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct DecryptConfig {
    scheme: EncryptionScheme,
    key_id: [u8; DecryptConfig::KEY_ID_SIZE],
    iv: [u8; DecryptConfig::IV_SIZE],
    subsamples: Vec<SubsampleEntry>,
    pattern: Option<EncryptionPattern>,
}

impl DecryptConfig {
    pub const KEY_ID_SIZE: usize = 16;
    pub const IV_SIZE: usize = 16;

    /// Creates a `cenc` configuration.
    ///
    /// Fails with `InvalidArgument` unless `key_id` and `iv` are exactly
    /// [`Self::KEY_ID_SIZE`] and [`Self::IV_SIZE`] bytes long.
    pub fn cenc(key_id: &[u8], iv: &[u8], subsamples: Vec<SubsampleEntry>) -> Result<DecryptConfig> {
        Self::new(EncryptionScheme::Cenc, key_id, iv, subsamples, None)
    }

    /// Creates a `cbcs` configuration. A `None` pattern means every block is
    /// encrypted.
    pub fn cbcs(
        key_id: &[u8],
        iv: &[u8],
        subsamples: Vec<SubsampleEntry>,
        pattern: Option<EncryptionPattern>,
    ) -> Result<DecryptConfig> {
        Self::new(EncryptionScheme::Cbcs, key_id, iv, subsamples, pattern)
    }

    fn new(
        scheme: EncryptionScheme,
        key_id: &[u8],
        iv: &[u8],
        subsamples: Vec<SubsampleEntry>,
        pattern: Option<EncryptionPattern>,
    ) -> Result<DecryptConfig> {
        verify_arg!(key_id, key_id.len() == DecryptConfig::KEY_ID_SIZE);
        verify_arg!(iv, iv.len() == DecryptConfig::IV_SIZE);
        let mut config = DecryptConfig {
            scheme,
            key_id: [0; Self::KEY_ID_SIZE],
            iv: [0; Self::IV_SIZE],
            subsamples,
            pattern,
        };
        config.key_id.copy_from_slice(key_id);
        config.iv.copy_from_slice(iv);
        Ok(config)
    }

    pub fn scheme(&self) -> EncryptionScheme {
        self.scheme
    }

    pub fn key_id(&self) -> &[u8] {
        &self.key_id
    }

    pub fn iv(&self) -> &[u8] {
        &self.iv
    }

    pub fn subsamples(&self) -> &[SubsampleEntry] {
        &self.subsamples
    }

    pub fn pattern(&self) -> Option<EncryptionPattern> {
        self.pattern
    }

    pub fn has_pattern(&self) -> bool {
        self.pattern.is_some()
    }

    /// Returns `true` if both configurations describe the same decryption.
    pub fn matches(&self, other: &DecryptConfig) -> bool {
        self == other
    }

    /// Returns `true` if the subsamples cover exactly `size` bytes. An empty
    /// subsample list covers any size.
    pub fn subsamples_match_size(&self, size: usize) -> bool {
        if self.subsamples.is_empty() {
            return true;
        }
        let total = self.subsamples.iter().try_fold(0usize, |total, entry| {
            total
                .checked_add(entry.clear_bytes as usize)?
                .checked_add(entry.cypher_bytes as usize)
        });
        total == Some(size)
    }
}

impl std::fmt::Display for DecryptConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "(encryption_scheme: {}, key_id: 0x{}, iv: 0x{}, subsamples: [",
            self.scheme,
            hex::encode_upper(self.key_id),
            hex::encode_upper(self.iv),
        )?;
        for (i, entry) in self.subsamples.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "({}, {})", entry.clear_bytes, entry.cypher_bytes)?;
        }
        f.write_str("], pattern: ")?;
        match self.pattern {
            Some(p) => write!(f, "{}:{})", p.crypt_byte_block, p.skip_byte_block),
            None => f.write_str("none)"),
        }
    }
}
