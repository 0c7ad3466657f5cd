// Survey input: record types and Item construction.

pub mod items;
pub mod models;
