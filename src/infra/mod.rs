pub mod ncei;
