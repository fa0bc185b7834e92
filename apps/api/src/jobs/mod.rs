// Job postings are entered directly, never derived from model output.

pub mod handlers;
