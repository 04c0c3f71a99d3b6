use crate::error::{GactError, Result};
use crate::window::{Tz, WindowSpec};
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "gact")]
#[command(about = "Export git commit activity for a time window as JSON")]
#[command(version)]
pub struct Cli {
    #[arg(long, help = "Path to git repository")]
    pub repo: Option<PathBuf>,

    #[arg(long, help = "Calendar month to export (YYYY-MM)")]
    pub month: Option<String>,

    #[arg(
        long = "for",
        value_name = "PHRASE",
        help = "Natural-language window, e.g. \"last week\" or \"every month for the last 6 months\""
    )]
    pub for_phrase: Option<String>,

    #[arg(long, requires = "until", help = "Start of an explicit window (passed to git verbatim)")]
    pub since: Option<String>,

    #[arg(long, requires = "since", help = "End of an explicit window (passed to git verbatim)")]
    pub until: Option<String>,

    #[arg(long, help = "Shard each commit into its own file under an output directory")]
    pub full: bool,

    #[arg(long, help = "Shorthand for --full --include-patch --github-prs --include-unmerged")]
    pub detailed: bool,

    #[arg(long, help = "Include merge commits", default_value_t = false)]
    pub include_merges: bool,

    #[arg(long, help = "Embed each commit's patch text in its record")]
    pub include_patch: bool,

    #[arg(
        long,
        default_value_t = 0,
        help = "Byte cap for embedded patches (0 = unlimited)"
    )]
    pub max_patch_bytes: usize,

    #[arg(long, value_name = "DIR", help = "Also write raw .patch files under this directory")]
    pub save_patches: Option<PathBuf>,

    #[arg(long, default_value = "-", help = "Output file or directory (\"-\" for stdout)")]
    pub out: String,

    #[arg(long, help = "Attach pull request info from GitHub (best effort)")]
    pub github_prs: bool,

    #[arg(long, help = "Scan local branches for commits not merged into HEAD")]
    pub include_unmerged: bool,

    #[arg(long, value_enum, default_value = "local", help = "Timezone for formatted timestamps")]
    pub tz: Tz,

    #[arg(long, hide = true)]
    pub now_override: Option<String>,
}

/// Fully resolved run configuration, after flag implications and window
/// validation. This is the only shape the report pipeline sees.
#[derive(Debug)]
pub struct ExportConfig {
    pub repo: Option<PathBuf>,
    pub window: WindowSpec,
    pub full: bool,
    pub include_merges: bool,
    pub include_patch: bool,
    pub max_patch_bytes: usize,
    pub save_patches: Option<PathBuf>,
    pub out: String,
    pub github_prs: bool,
    pub include_unmerged: bool,
    pub tz: Tz,
    pub now_override: Option<String>,
}

impl Cli {
    pub fn parse() -> Self {
        <Self as Parser>::parse()
    }

    pub fn execute(self) -> anyhow::Result<()> {
        let cfg = self.normalize()?;
        crate::report::execute(cfg)
    }

    pub fn normalize(self) -> Result<ExportConfig> {
        let window = match (&self.month, &self.for_phrase, &self.since, &self.until) {
            (Some(ym), None, None, None) => WindowSpec::Month(ym.clone()),
            (None, Some(phrase), None, None) => WindowSpec::Phrase(phrase.clone()),
            (None, None, Some(since), Some(until)) => WindowSpec::SinceUntil {
                since: since.clone(),
                until: until.clone(),
            },
            (None, None, None, None) => {
                return Err(GactError::InvalidWindow(
                    "no window given; use --month, --for, or --since/--until".to_string(),
                ))
            }
            _ => {
                return Err(GactError::InvalidWindow(
                    "--month, --for, and --since/--until are mutually exclusive".to_string(),
                ))
            }
        };

        Ok(ExportConfig {
            repo: self.repo,
            window,
            full: self.full || self.detailed,
            include_merges: self.include_merges,
            include_patch: self.include_patch || self.detailed,
            max_patch_bytes: self.max_patch_bytes,
            save_patches: self.save_patches,
            out: self.out,
            github_prs: self.github_prs || self.detailed,
            include_unmerged: self.include_unmerged || self.detailed,
            tz: self.tz,
            now_override: self.now_override,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("gact").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn month_window_normalizes() {
        let cfg = parse(&["--month", "2024-03"]).normalize().unwrap();
        assert!(matches!(cfg.window, WindowSpec::Month(ref ym) if ym == "2024-03"));
        assert!(!cfg.full);
    }

    #[test]
    fn missing_window_is_rejected() {
        let err = parse(&[]).normalize().unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn conflicting_windows_are_rejected() {
        let err = parse(&["--month", "2024-03", "--for", "last week"])
            .normalize()
            .unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn since_without_until_fails_at_parse() {
        let res = Cli::try_parse_from(["gact", "--since", "2024-01-01"]);
        assert!(res.is_err());
    }

    #[test]
    fn detailed_implies_enrichment_flags() {
        let cfg = parse(&["--month", "2024-03", "--detailed"]).normalize().unwrap();
        assert!(cfg.full);
        assert!(cfg.include_patch);
        assert!(cfg.github_prs);
        assert!(cfg.include_unmerged);
    }
}
