pub mod caller;
pub mod local;
pub mod record;
pub mod store;

pub use caller::CallerId;
pub use local::LocalLibrary;
pub use record::UploadRecord;
pub use store::{HistoryStore, UploadStore};
