//! Project folder hierarchy

pub mod provisioner;

pub use provisioner::DirectoryProvisioner;
