// src/scan.rs

use std::path::Path;

/// Certificate and key material extensions.
const SENSITIVE_EXTENSIONS: &[&str] = &[
    "cer", "crt", "pem", "key", "p12", "pfx", "jks", "keystore", "ppk",
];

/// Credential-shaped filenames flagged regardless of extension.
const SENSITIVE_NAMES: &[&str] = &[
    ".env",
    ".netrc",
    ".htpasswd",
    ".npmrc",
    ".pypirc",
    "id_rsa",
    "id_dsa",
    "id_ecdsa",
    "id_ed25519",
    "credentials.json",
    "credentials",
];

/// Advisory check of one historical path. Returns a human-readable warning
/// when the name suggests certificates, keys, or credentials; never blocks
/// migration.
pub fn scan_path(path: &str) -> Option<String> {
    let name = Path::new(path).file_name()?.to_str()?;

    let flagged = SENSITIVE_NAMES.iter().any(|n| name.eq_ignore_ascii_case(n))
        || Path::new(name)
            .extension()
            .and_then(|e| e.to_str())
            .map(|ext| {
                SENSITIVE_EXTENSIONS
                    .iter()
                    .any(|s| ext.eq_ignore_ascii_case(s))
            })
            .unwrap_or(false);

    if flagged {
        Some(format!("File can contain sensitive info: {path}"))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn certificate_extensions_are_flagged() {
        assert_eq!(
            scan_path("deploy/server.cer").as_deref(),
            Some("File can contain sensitive info: deploy/server.cer")
        );
        assert!(scan_path("tls/ca.PEM").is_some());
        assert!(scan_path("signing.p12").is_some());
    }

    #[test]
    fn credential_shaped_names_are_flagged() {
        assert!(scan_path(".env").is_some());
        assert!(scan_path("home/.ssh/id_rsa").is_some());
        assert!(scan_path("gcp/credentials.json").is_some());
    }

    #[test]
    fn ordinary_files_pass() {
        assert!(scan_path("src/main.rs").is_none());
        assert!(scan_path("docs/keyboard.md").is_none());
        assert!(scan_path("env/setup.sh").is_none());
    }
}
