pub mod path_locks;
