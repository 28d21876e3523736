pub mod error;
pub mod extract;
pub mod result;
pub mod scanner;

pub use error::ScanError;
pub use extract::extract_links;
pub use result::{LinkKind, LoadedPage, RawLink};
pub use scanner::Scanner;
