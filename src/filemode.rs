/// The mode recorded for a tree entry. Formatted in octal, without leading zeros.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct FileMode(pub u32);

impl std::fmt::Octal for FileMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Octal::fmt(&self.0, f)
    }
}

impl FileMode {
    pub const DIRECTORY: FileMode = FileMode(0o040000);
    pub const EXECUTABLE: FileMode = FileMode(0o100755);
    pub const REGULAR: FileMode = FileMode(0o100644);
    pub const SYMLINK: FileMode = FileMode(0o120000);

    pub fn is_directory(self) -> bool {
        self == Self::DIRECTORY
    }
}
