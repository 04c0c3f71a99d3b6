use crate::window::Tz;
use chrono::{Local, SecondsFormat, TimeZone, Utc};
use std::path::{Path, PathBuf};

/// Fixed-length short identifier derived from a full commit SHA.
pub fn short_sha(full: &str) -> String {
    full.chars().take(12).collect()
}

pub fn canonicalize_lossy<P: AsRef<Path>>(p: P) -> String {
    let p = p.as_ref();
    let pb: PathBuf = match std::fs::canonicalize(p) {
        Ok(abs) => abs,
        Err(_) => match std::env::current_dir() {
            Ok(cwd) => cwd.join(p),
            Err(_) => PathBuf::from(p),
        },
    };
    pb.to_string_lossy().to_string()
}

/// Render a Unix epoch as RFC3339 in the configured timezone mode.
pub fn iso_in_tz(epoch: i64, tz: Tz) -> String {
    match tz {
        Tz::Local => Local
            .timestamp_opt(epoch, 0)
            .single()
            .unwrap_or_else(|| Local.timestamp_opt(0, 0).single().unwrap())
            .to_rfc3339_opts(SecondsFormat::Secs, true),
        Tz::Utc => Utc
            .timestamp_opt(epoch, 0)
            .single()
            .unwrap_or_else(|| Utc.timestamp_opt(0, 0).single().unwrap())
            .to_rfc3339_opts(SecondsFormat::Secs, true),
    }
}

/// Shard file name for a commit: tz-relative timestamp plus short SHA,
/// so a directory listing sorts chronologically.
pub fn format_shard_name(epoch: i64, short_sha: &str, tz: Tz) -> String {
    match tz {
        Tz::Local => {
            let dt = Local.timestamp_opt(epoch, 0).single().unwrap_or_else(|| {
                Local.timestamp_opt(0, 0).single().unwrap()
            });
            format!("{}-{}.json", dt.format("%Y.%m.%d-%H.%M"), short_sha)
        }
        Tz::Utc => {
            let dt = Utc.timestamp_opt(epoch, 0).single().unwrap_or_else(|| {
                Utc.timestamp_opt(0, 0).single().unwrap()
            });
            format!("{}-{}.json", dt.format("%Y.%m.%d-%H.%M"), short_sha)
        }
    }
}

/// Clip patch text to `max_bytes` (0 = unlimited) without splitting a
/// UTF-8 sequence. Returns the kept text and whether clipping happened.
pub fn clip_patch(patch_text: String, max_bytes: usize) -> (String, bool) {
    if max_bytes == 0 || patch_text.len() <= max_bytes {
        return (patch_text, false);
    }

    let bytes = patch_text.as_bytes();
    let mut end = max_bytes;
    // Back off any trailing continuation bytes of a split code point.
    while end > 0 && (bytes[end] & 0xC0) == 0x80 {
        end -= 1;
    }

    (String::from_utf8_lossy(&bytes[..end]).to_string(), true)
}

/// Branch names become directory names; slashes would nest them.
pub fn sanitize_branch(name: &str) -> String {
    name.replace('/', "__")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn short_sha_truncates_to_twelve() {
        assert_eq!(short_sha("abcdef1234567890abcdef"), "abcdef123456");
        assert_eq!(short_sha("abc"), "abc");
    }

    #[test]
    fn iso_utc_ends_with_z() {
        let s = iso_in_tz(1_726_101_000, Tz::Utc);
        assert_eq!(s, "2024-09-12T00:30:00Z");
    }

    #[test]
    fn shard_name_utc_has_stable_pattern() {
        let name = format_shard_name(1_726_101_000, "abcdef123456", Tz::Utc);
        assert_eq!(name, "2024.09.12-00.30-abcdef123456.json");
    }

    #[test]
    fn shard_names_sort_chronologically_across_midnight() {
        // 2024-09-12T23:59 vs 2024-09-13T00:01 vs 2024-10-01T00:00
        let a = format_shard_name(1_726_185_540, "aaaaaaaaaaaa", Tz::Utc);
        let b = format_shard_name(1_726_185_660, "bbbbbbbbbbbb", Tz::Utc);
        let c = format_shard_name(1_727_740_800, "cccccccccccc", Tz::Utc);
        assert!(a < b);
        assert!(b < c);
    }

    #[test]
    fn clip_patch_respects_byte_cap() {
        let text = "x".repeat(1000);
        let (kept, clipped) = clip_patch(text, 500);
        assert!(kept.len() <= 500);
        assert!(clipped);
    }

    #[test]
    fn clip_patch_zero_means_unlimited() {
        let text = "x".repeat(1000);
        let (kept, clipped) = clip_patch(text.clone(), 0);
        assert_eq!(kept, text);
        assert!(!clipped);
    }

    #[test]
    fn clip_patch_never_splits_utf8() {
        let (kept, clipped) = clip_patch("ééé".to_string(), 3);
        assert!(clipped);
        assert!(kept.is_char_boundary(kept.len()));
        assert!(kept.len() <= 3);
    }

    #[test]
    fn sanitize_branch_flattens_slashes() {
        assert_eq!(sanitize_branch("feature/login"), "feature__login");
        assert_eq!(sanitize_branch("main"), "main");
    }
}
