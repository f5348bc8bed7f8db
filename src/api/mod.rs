// Serializable views of flowtrace's graphs.

pub mod dto;
