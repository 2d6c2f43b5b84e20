/// Expand a leading `~` or `~/` to the user's home directory.
pub fn expand_tilde(path: &str) -> String {
    if path == "~" {
        if let Some(home) = dirs::home_dir() {
            return home.to_string_lossy().to_string();
        }
    }
    if let Some(suffix) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(suffix).to_string_lossy().to_string();
        }
    }
    path.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expand_tilde_prefix() {
        let home = dirs::home_dir().unwrap();
        assert_eq!(
            expand_tilde("~/backups"),
            home.join("backups").to_string_lossy().to_string()
        );
    }

    #[test]
    fn plain_paths_pass_through() {
        assert_eq!(expand_tilde("/var/backups"), "/var/backups");
    }
}
