use crate::AssetPath;

/**
 * A method of receiving bytes from files.
 * IE: file, raw, etc.
 */
pub trait Protocol: 'static {
    /**
     * Name of the protocol. IE: file, raw etc.
     * Should not change across invocations.
     */
    fn name(&self) -> &str;
    /**
     * Retrieves raw bytes from the path specified.
     */
    fn read(&self, path: &AssetPath) -> anyhow::Result<Vec<u8>>;
}

/**
 * An implementation of [`Protocol`] that fetches bytes from the file system.
 */
#[derive(Copy, Clone, Debug)]
pub struct FileProtocol;
impl Protocol for FileProtocol {
    fn name(&self) -> &str { "file" }
    fn read(&self, path: &AssetPath) -> anyhow::Result<Vec<u8>> {
        let file_path = path.without_protocol();
        let bytes = std::fs::read(&file_path)
            .map_err(|err| anyhow::anyhow!("Failed to read '{file_path}': {err}"))?;
        Ok(bytes)
    }
}

/**
 * An implementation of [`Protocol`] that serves files from an in-memory table keyed by path.
 * Useful for testing purposes.
 */
#[derive(Clone, Default, Debug)]
pub struct RawProtocol {
    files: Vec<(String, &'static [u8])>,
}

impl RawProtocol {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the contents served for a path, without protocol.
    pub fn with_file(mut self, path: impl Into<String>, contents: &'static str) -> Self {
        self.files.push((path.into(), contents.as_bytes()));
        self
    }
}

impl Protocol for RawProtocol {
    fn name(&self) -> &str { "raw" }
    fn read(&self, path: &AssetPath) -> anyhow::Result<Vec<u8>> {
        let file_path = path.without_protocol();
        self.files
            .iter()
            .find(|(stored_path, _)| *stored_path == file_path)
            .map(|(_, bytes)| bytes.to_vec())
            .ok_or_else(|| anyhow::anyhow!("No raw file registered at '{file_path}'"))
    }
}
