mod cancel;
mod entry;
mod walk;

pub use cancel::CancelToken;
pub use entry::FileEntry;
pub use walk::{list_directory, DirectoryScanner};
