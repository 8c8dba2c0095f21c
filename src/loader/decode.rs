/// Decodes a raw byte payload into a domain resource.
///
/// Returning `None` marks the payload undecodable; the loader folds that
/// into its `Failure` phase, indistinguishable from a transport failure.
pub trait DecodeResource: Sized + Send + Sync + 'static {
    fn decode(bytes: &[u8]) -> Option<Self>;
}

/// Identity decode: the payload itself is the resource.
impl DecodeResource for Vec<u8> {
    fn decode(bytes: &[u8]) -> Option<Self> {
        Some(bytes.to_vec())
    }
}

/// UTF-8 decode; invalid byte sequences fail.
impl DecodeResource for String {
    fn decode(bytes: &[u8]) -> Option<Self> {
        String::from_utf8(bytes.to_vec()).ok()
    }
}
