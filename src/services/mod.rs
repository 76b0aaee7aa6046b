pub mod cloud_providers;
pub mod multipart;
