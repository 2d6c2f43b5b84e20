use super::types::ArchiveCompression;

pub(super) fn default_transfer_program() -> String {
    "rclone".to_string()
}

pub(super) fn default_transfer_remote() -> String {
    "mygdrive".to_string()
}

pub(super) fn default_compression_method() -> ArchiveCompression {
    ArchiveCompression::Zstd
}

pub(super) fn default_compression_level() -> i32 {
    19
}

pub(super) fn default_smtp_host() -> String {
    "smtp.gmail.com".to_string()
}

pub(super) fn default_smtp_port() -> u16 {
    587
}
