//! Filesystem locations used by configuration and storage.

pub mod xdg_root;
