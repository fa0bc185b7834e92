// Resume upload: extraction → extract_profile → typed profile → store.

pub mod handlers;
pub mod ingest;
