use crate::git::GitRepo;
use crate::model::PullRequest;
use regex::Regex;

/// Pull requests that reference `sha`, looked up through the GitHub
/// commits→pulls endpoint. Best-effort by contract: any transport, auth,
/// or shape problem yields an empty list, never an error.
pub fn find_pull_requests(repo: &GitRepo, sha: &str) -> Vec<PullRequest> {
    let (owner, name) = match origin_github(repo) {
        Some(pair) => pair,
        None => return Vec::new(),
    };

    let token = match discover_token() {
        Some(t) => t,
        None => return Vec::new(),
    };

    let url = format!("https://api.github.com/repos/{owner}/{name}/commits/{sha}/pulls");
    let parsed = match get_json(&url, &token) {
        Some(v) => v,
        None => return Vec::new(),
    };

    let arr = match parsed.as_array() {
        Some(a) => a,
        None => return Vec::new(),
    };

    arr.iter().map(pull_from_json).collect()
}

/// `(owner, repo)` when the origin remote points at GitHub over https
/// or ssh.
pub fn origin_github(repo: &GitRepo) -> Option<(String, String)> {
    let url = repo.origin_url()?;
    let re = Regex::new(r"^(?:git@github\.com:|https?://github\.com/)([^/]+)/([^/]+?)(?:\.git)?$").ok()?;
    let caps = re.captures(&url)?;
    Some((caps.get(1)?.as_str().to_string(), caps.get(2)?.as_str().to_string()))
}

/// GITHUB_TOKEN, then GH_TOKEN, then `gh auth token`.
fn discover_token() -> Option<String> {
    for var in ["GITHUB_TOKEN", "GH_TOKEN"] {
        if let Ok(t) = std::env::var(var) {
            if !t.trim().is_empty() {
                return Some(t);
            }
        }
    }

    if let Ok(out) = std::process::Command::new("gh").args(["auth", "token"]).output() {
        if out.status.success() {
            let t = String::from_utf8_lossy(&out.stdout).trim().to_string();
            if !t.is_empty() {
                return Some(t);
            }
        }
    }

    None
}

fn get_json(url: &str, token: &str) -> Option<serde_json::Value> {
    // Test hook: lets integration tests inject a canned response without
    // touching the network.
    if let Ok(raw) = std::env::var("GACT_FAKE_PR_JSON") {
        return serde_json::from_str(&raw).ok();
    }

    let resp = ureq::AgentBuilder::new()
        .build()
        .get(url)
        .set("Accept", "application/vnd.github+json")
        .set("User-Agent", "gact")
        .set("Authorization", &format!("Bearer {token}"))
        .call();

    match resp {
        Ok(r) => r.into_json().ok(),
        Err(_) => None,
    }
}

fn pull_from_json(v: &serde_json::Value) -> PullRequest {
    let str_at = |path: &[&str]| -> Option<String> {
        let mut cur = v;
        for key in path {
            cur = cur.get(key)?;
        }
        cur.as_str().map(String::from)
    };

    let html_url = str_at(&["html_url"]).unwrap_or_default();
    let (diff_url, patch_url) = if html_url.is_empty() {
        (None, None)
    } else {
        (Some(format!("{html_url}.diff")), Some(format!("{html_url}.patch")))
    };

    PullRequest {
        number: v.get("number").and_then(|n| n.as_i64()).unwrap_or(0),
        title: str_at(&["title"]).unwrap_or_default(),
        state: str_at(&["state"]).unwrap_or_default(),
        created_at: str_at(&["created_at"]),
        merged_at: str_at(&["merged_at"]),
        html_url,
        diff_url,
        patch_url,
        author: str_at(&["user", "login"]),
        head: str_at(&["head", "ref"]),
        base: str_at(&["base", "ref"]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn pull_from_json_extracts_urls_and_refs() {
        let v = serde_json::json!({
            "html_url": "https://github.com/acme/widgets/pull/7",
            "number": 7,
            "title": "Add widget",
            "state": "open",
            "user": { "login": "octo" },
            "head": { "ref": "feature/w" },
            "base": { "ref": "main" },
            "created_at": "2024-01-01T00:00:00Z",
            "merged_at": null
        });
        let pr = pull_from_json(&v);
        assert_eq!(pr.number, 7);
        assert_eq!(pr.title, "Add widget");
        assert_eq!(pr.author.as_deref(), Some("octo"));
        assert_eq!(pr.head.as_deref(), Some("feature/w"));
        assert_eq!(pr.base.as_deref(), Some("main"));
        assert_eq!(pr.diff_url.as_deref(), Some("https://github.com/acme/widgets/pull/7.diff"));
        assert_eq!(pr.patch_url.as_deref(), Some("https://github.com/acme/widgets/pull/7.patch"));
        assert!(pr.merged_at.is_none());
    }

    #[test]
    fn pull_from_json_tolerates_missing_fields() {
        let pr = pull_from_json(&serde_json::json!({}));
        assert_eq!(pr.number, 0);
        assert!(pr.html_url.is_empty());
        assert!(pr.diff_url.is_none());
        assert!(pr.patch_url.is_none());
    }
}
