pub mod local_disk;
pub mod s3;
