pub mod error;
pub mod model;
pub mod template;
pub mod validation;

pub use error::{FetchError, ValidationError};
pub use model::{ContentType, DownloadRequest, DownloadResult, FormatPreference};
pub use template::OutputTemplate;
pub use validation::validate;
