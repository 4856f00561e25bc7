mod ask;
mod ingest;
mod reset;
mod serve;
mod status;

pub use ask::AskArgs;
pub use ingest::IngestArgs;
pub use reset::ResetArgs;
pub use serve::ServeArgs;

pub use ask::handle_ask;
pub use ingest::handle_ingest;
pub use reset::handle_reset;
pub use serve::handle_serve;
pub use status::handle_status;
