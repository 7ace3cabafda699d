/// Name and size of a file directly under the storage root, read from filesystem metadata.
///
/// The file name is the only identity a stored file has.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFile {
    pub name: String,
    pub size_bytes: u64,
}
