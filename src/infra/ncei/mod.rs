mod client;

pub use client::{CDO_BASE_URL, DATASET_ID, NceiClient};
