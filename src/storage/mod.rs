pub mod layout;
pub mod record_file;
pub mod posting_file;
pub mod file_lock;
