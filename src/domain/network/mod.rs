pub mod link;
pub mod shortest_path_cache;
pub mod topology;
